//! Application root for the PayLater client.
//!
//! This module owns the session, the API client and the current route. It
//! is the single place that reacts to session expiry: pages never see
//! `ApiError::AuthenticationExpired`, the root drains session events after
//! each page and routes to sign-in.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use paylater_core::api::ApiError;
use paylater_core::auth::{CredentialStore, MemoryCredentialStore};
use paylater_core::config::Config;
use paylater_core::{ApiClient, Session, SessionEvent};

use crate::ui;

/// Message for failures where no response arrived
const NETWORK_MESSAGE: &str =
    "Could not reach the PayLater service. Check your connection and try again.";

/// Message for 5xx responses
const SERVER_MESSAGE: &str = "The PayLater service ran into a problem. Please try again later.";

/// Message for responses that could not be understood
const INVALID_RESPONSE_MESSAGE: &str =
    "The PayLater service sent a response this client could not read.";

// ============================================================================
// Routes
// ============================================================================

/// Views of the client, mirroring the pages of the service's web client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    SignIn,
    SignUp,
    Dashboard,
    Merchants,
    Transactions,
    Paybacks,
    Reports,
    Users,
}

impl Route {
    /// Protected routes need a signed-in session to render
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Landing | Route::SignIn | Route::SignUp)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Landing => "PayLater",
            Route::SignIn => "Sign in",
            Route::SignUp => "Sign up",
            Route::Dashboard => "Dashboard",
            Route::Merchants => "Merchants",
            Route::Transactions => "Transactions",
            Route::Paybacks => "Paybacks",
            Route::Reports => "Reports",
            Route::Users => "Users",
        }
    }
}

/// Startup options taken from the command line
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub api_url: Option<String>,
    /// Keep the credential in memory only
    pub ephemeral: bool,
    /// Print raw service payloads instead of tables
    pub json: bool,
}

/// What the root did about a redirect to sign-in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    None,
    /// Session expired or missing; the user was told to sign in
    SignInRequired,
}

pub struct App {
    pub config: Config,
    pub session: Arc<Session>,
    pub api: ApiClient,
    pub route: Route,
    pub json: bool,
    events: broadcast::Receiver<SessionEvent>,
    /// An expiry notice was already shown for this run
    expiry_notified: bool,
}

impl App {
    /// Create the application: load the session from the configured store.
    pub fn new(config: Config, options: AppOptions) -> Result<Self> {
        let store: Arc<dyn CredentialStore> = if options.ephemeral {
            Arc::new(MemoryCredentialStore::new())
        } else {
            config.credential_store()?
        };
        ui::styles::set_color_enabled(!options.json);
        let session = Session::init(store);
        let events = session.subscribe();

        let base_url = options
            .api_url
            .clone()
            .unwrap_or_else(|| config.api_base_url());
        debug!(base_url = %base_url, "API base URL configured");
        let api = ApiClient::with_timeout(&base_url, config.request_timeout(), session.clone())?;

        Ok(Self {
            config,
            session,
            api,
            route: Route::Landing,
            json: options.json,
            events,
            expiry_notified: false,
        })
    }

    pub fn navigate(&mut self, route: Route) {
        if self.route != route {
            debug!(from = ?self.route, to = ?route, "Navigating");
            self.route = route;
        }
    }

    /// Guard for protected pages. Routes to sign-in and returns false when
    /// there is no session; the page must not render.
    pub async fn require_session(&mut self) -> bool {
        if !self.route.is_protected() || self.session.is_authenticated().await {
            true
        } else {
            info!(route = ?self.route, "Protected page requested without a session");
            ui::notice(&format!("Sign in to view {}.", self.route.title()));
            self.navigate(Route::SignIn);
            false
        }
    }

    /// Drain session events. An expiry routes to sign-in and is announced
    /// once, however many requests observed it.
    pub fn handle_session_events(&mut self) -> Redirect {
        let mut redirect = Redirect::None;
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::Expired) => {
                    if !self.expiry_notified {
                        ui::notice("Your session has expired. Please sign in again.");
                        self.expiry_notified = true;
                    }
                    self.navigate(Route::SignIn);
                    redirect = Redirect::SignInRequired;
                }
                Ok(SessionEvent::SignedIn) => self.expiry_notified = false,
                Ok(SessionEvent::SignedOut) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed session events");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        redirect
    }

    /// Whether a sign-in prompt can be shown
    pub fn is_interactive(&self) -> bool {
        !self.json && std::io::stdin().is_terminal()
    }

    /// Show a page failure to the user.
    pub fn report_error(&self, err: &anyhow::Error) {
        match err.downcast_ref::<ApiError>() {
            // Handled by the session event path
            Some(ApiError::AuthenticationExpired) => {}
            Some(api_error) => ui::danger(&Self::user_message(api_error)),
            None => ui::danger(&format!("{:#}", err)),
        }
    }

    /// The text shown for an API failure
    pub fn user_message(err: &ApiError) -> String {
        match err {
            ApiError::ValidationRejected { message, .. } => message.clone(),
            ApiError::NetworkUnavailable(_) => NETWORK_MESSAGE.to_string(),
            ApiError::ServerFault { .. } => SERVER_MESSAGE.to_string(),
            ApiError::InvalidResponse(_) => INVALID_RESPONSE_MESSAGE.to_string(),
            ApiError::InvalidRequest(detail) => format!("Invalid request: {}", detail),
            ApiError::AuthenticationExpired => err.to_string(),
        }
    }

    /// In `--json` mode print the payload and return true; pages skip their
    /// table rendering when it does.
    pub fn emit_json<T: Serialize>(&self, value: &T) -> Result<bool> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Remember the email for the next sign-in prompt.
    pub fn remember_email(&mut self, email: &str) {
        if self.config.last_email.as_deref() == Some(email) {
            return;
        }
        self.config.last_email = Some(email.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }
}


#[cfg(test)]
mod tests {
    use paylater_core::auth::Credential;
    use paylater_core::models::UserIdentity;

    use super::test_support::{app_against, app_with_revoked_session};
    use super::*;

    fn app() -> App {
        // Reserve a port, then close it so nothing is listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        app_against(format!("http://{}", addr), false)
    }

    #[test]
    fn test_route_protection() {
        assert!(!Route::Landing.is_protected());
        assert!(!Route::SignIn.is_protected());
        assert!(!Route::SignUp.is_protected());
        assert!(Route::Dashboard.is_protected());
        assert!(Route::Reports.is_protected());
    }

    #[tokio::test]
    async fn test_protected_page_without_session_routes_to_sign_in() {
        let mut app = app();
        app.navigate(Route::Merchants);
        assert!(!app.require_session().await);
        assert_eq!(app.route, Route::SignIn);
    }

    #[tokio::test]
    async fn test_protected_page_with_session_renders() {
        let mut app = app();
        app.session
            .login_user(Credential::new("tok", UserIdentity::from_email("a@b.com")))
            .await
            .expect("login");
        app.navigate(Route::Merchants);
        assert!(app.require_session().await);
        assert_eq!(app.route, Route::Merchants);
    }

    #[tokio::test]
    async fn test_sign_out_does_not_redirect() {
        let mut app = app();
        app.session
            .login_user(Credential::new("tok", UserIdentity::from_email("a@b.com")))
            .await
            .expect("login");
        app.session.logout_user().await.expect("logout");
        app.navigate(Route::Dashboard);
        assert_eq!(app.handle_session_events(), Redirect::None);
        assert_eq!(app.route, Route::Dashboard);
    }

    #[tokio::test]
    async fn test_expiry_redirects_once() {
        let mut app = app_with_revoked_session(false).await;
        app.navigate(Route::Dashboard);
        // Sign-in event from the setup
        assert_eq!(app.handle_session_events(), Redirect::None);

        let (merchants, me, users) = tokio::join!(
            app.api.list_merchants(),
            app.api.me(),
            app.api.list_users()
        );
        assert!(matches!(merchants, Err(ApiError::AuthenticationExpired)));
        assert!(matches!(me, Err(ApiError::AuthenticationExpired)));
        assert!(matches!(users, Err(ApiError::AuthenticationExpired)));

        assert_eq!(app.handle_session_events(), Redirect::SignInRequired);
        assert_eq!(app.route, Route::SignIn);
        assert!(app.expiry_notified);
        assert!(!app.session.is_authenticated().await);

        assert_eq!(app.handle_session_events(), Redirect::None);
    }

    #[tokio::test]
    async fn test_expiry_notice_rearms_after_sign_in() {
        let mut app = app_with_revoked_session(false).await;
        let _ = app.api.me().await;
        assert_eq!(app.handle_session_events(), Redirect::SignInRequired);
        assert!(app.expiry_notified);

        app.session
            .login_user(Credential::new("again", UserIdentity::from_email("a@b.com")))
            .await
            .expect("login");
        assert_eq!(app.handle_session_events(), Redirect::None);
        assert!(!app.expiry_notified);
    }

    #[tokio::test]
    async fn test_network_failure_message() {
        let app = app();
        let err = app.api.list_merchants().await.expect_err("nothing listening");
        assert_eq!(App::user_message(&err), NETWORK_MESSAGE);
        assert!(app.session.current_user().await.is_none());
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = ApiError::ValidationRejected {
            status: 400,
            message: "No outstanding dues".to_string(),
        };
        assert_eq!(App::user_message(&err), "No outstanding dues");

        let err = ApiError::ServerFault {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(App::user_message(&err), SERVER_MESSAGE);
    }
}
