//! PayLater CLI - a terminal client for the PayLater buy-now-pay-later service.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the password is read without echo)
//! paylater login --email alice@example.com
//!
//! # Credit position and recent purchases
//! paylater dashboard
//!
//! # Buy something on credit, then pay part of it back
//! paylater transactions new --merchant Amazon --amount 250
//! paylater payback --amount 100
//!
//! # Reports
//! paylater reports total-dues
//! ```
//!
//! Set `RUST_LOG=debug` to see request logs on stderr, or pass `--log-dir`
//! to write them to a daily log file instead.

#![cfg_attr(not(test), forbid(unsafe_code))]

mod app;
mod pages;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use paylater_core::Config;

use app::{App, AppOptions, Redirect, Route};
use pages::transactions::ListFilter;

/// Log file name prefix inside `--log-dir`
const LOG_FILE_PREFIX: &str = "paylater.log";

/// Shown when a command needs a session and no prompt can be shown
const SIGN_IN_HINT: &str = "Run `paylater login` to sign in.";

/// How a command run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Failed,
    /// No usable session and no way to prompt; the hint was printed
    SignInRequired,
}

impl Outcome {
    fn from_page(ok: bool) -> Self {
        if ok {
            Outcome::Completed
        } else {
            Outcome::Failed
        }
    }

    fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Completed => ExitCode::SUCCESS,
            Outcome::Failed | Outcome::SignInRequired => ExitCode::FAILURE,
        }
    }
}

#[derive(Parser)]
#[command(name = "paylater")]
#[command(author, version, about = "Terminal client for the PayLater service")]
struct Cli {
    /// Service base URL (overrides PAYLATER_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Keep the session in memory only; nothing is written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Print raw service responses as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        /// Credit limit to request; the service default applies when omitted
        #[arg(short, long)]
        credit_limit: Option<f64>,
    },
    /// Sign out and forget the stored credential
    Logout,
    /// Show who is signed in
    Whoami,
    /// Credit limit, dues and recent transactions
    Dashboard,
    /// Manage merchants
    Merchants {
        #[command(subcommand)]
        action: MerchantAction,
    },
    /// List and create transactions
    Transactions {
        #[command(subcommand)]
        action: TransactionAction,
    },
    /// Pay back dues
    Payback {
        #[arg(short, long)]
        amount: f64,

        /// User paying back (defaults to you)
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Fee and dues reports
    Reports {
        #[command(subcommand)]
        report: ReportKind,
    },
    /// List users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Check the service and the local session
    Status,
}

#[derive(Subcommand, Clone)]
enum MerchantAction {
    /// List merchants
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Onboard a merchant
    Add { name: String, fee_percentage: f64 },
    /// Change a merchant's fee percentage
    SetFee { name: String, fee_percentage: f64 },
}

#[derive(Subcommand, Clone)]
enum TransactionAction {
    /// List transactions
    List {
        /// Only your own transactions
        #[arg(long)]
        mine: bool,

        /// `success` or `rejected`
        #[arg(long)]
        status: Option<String>,

        /// Match merchant name or rejection reason
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Buy on credit
    New {
        #[arg(short, long)]
        merchant: String,

        #[arg(short, long)]
        amount: f64,

        /// Buyer (defaults to you)
        #[arg(short, long)]
        user: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
enum ReportKind {
    /// Fees collected from a merchant
    Fee { merchant: String },
    /// Outstanding dues of a user
    Dues { user: String },
    /// Users who have reached their credit limit
    AtLimit,
    /// Total dues with a per-user breakdown
    TotalDues,
}

#[derive(Subcommand, Clone)]
enum UserAction {
    /// List users
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
}

impl Commands {
    /// Commands that are themselves the sign-in flow
    fn is_auth_flow(&self) -> bool {
        matches!(
            self,
            Commands::Login { .. } | Commands::Register { .. } | Commands::Logout
        )
    }
}

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the log file and must live until exit.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_dir.as_deref());
    info!("PayLater client starting");

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });
    let options = AppOptions {
        api_url: cli.api_url,
        ephemeral: cli.ephemeral,
        json: cli.json,
    };
    let mut app = match App::new(config, options) {
        Ok(app) => app,
        Err(e) => {
            ui::danger(&format!("{:#}", e));
            return ExitCode::FAILURE;
        }
    };

    execute(&mut app, cli.command).await.exit_code()
}

/// Run a command, following a redirect to sign-in at most once.
async fn execute(app: &mut App, command: Commands) -> Outcome {
    let ok = run_page(app, command.clone()).await;
    if command.is_auth_flow() || app.route != Route::SignIn {
        return Outcome::from_page(ok);
    }

    // The page did not render: no session, or it expired mid-command
    if !app.is_interactive() {
        ui::notice(SIGN_IN_HINT);
        return Outcome::SignInRequired;
    }
    if !run_page(app, Commands::Login { email: None }).await || app.route == Route::SignIn {
        return Outcome::Failed;
    }
    Outcome::from_page(run_page(app, command).await && app.route != Route::SignIn)
}

/// Run one page and let the root react to what happened to the session.
async fn run_page(app: &mut App, command: Commands) -> bool {
    let result = dispatch(app, command).await;
    let redirect = app.handle_session_events();

    match result {
        Ok(()) => redirect == Redirect::None,
        Err(e) => {
            app.report_error(&e);
            false
        }
    }
}

async fn dispatch(app: &mut App, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email } => pages::auth::sign_in(app, email).await,
        Commands::Register {
            name,
            email,
            credit_limit,
        } => pages::auth::sign_up(app, name, email, credit_limit).await,
        Commands::Logout => pages::auth::sign_out(app).await,
        Commands::Whoami => pages::auth::whoami(app).await,
        Commands::Dashboard => pages::dashboard::run(app).await,
        Commands::Merchants { action } => match action {
            MerchantAction::List { search } => pages::merchants::list(app, search).await,
            MerchantAction::Add {
                name,
                fee_percentage,
            } => pages::merchants::add(app, name, fee_percentage).await,
            MerchantAction::SetFee {
                name,
                fee_percentage,
            } => pages::merchants::set_fee(app, name, fee_percentage).await,
        },
        Commands::Transactions { action } => match action {
            TransactionAction::List {
                mine,
                status,
                search,
            } => {
                let filter = ListFilter::new(mine, status.as_deref(), search)?;
                pages::transactions::list(app, filter).await
            }
            TransactionAction::New {
                merchant,
                amount,
                user,
            } => pages::transactions::create(app, user, merchant, amount).await,
        },
        Commands::Payback { amount, user } => pages::paybacks::run(app, user, amount).await,
        Commands::Reports { report } => match report {
            ReportKind::Fee { merchant } => pages::reports::fee(app, merchant).await,
            ReportKind::Dues { user } => pages::reports::dues(app, user).await,
            ReportKind::AtLimit => pages::reports::at_limit(app).await,
            ReportKind::TotalDues => pages::reports::total_dues(app).await,
        },
        Commands::Users { action } => match action {
            UserAction::List { search } => pages::users::list(app, search).await,
        },
        Commands::Status => pages::status::run(app).await,
    }
}
