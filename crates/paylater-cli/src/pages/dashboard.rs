//! Dashboard: credit position and recent activity of the signed-in user.

use anyhow::Result;
use serde_json::json;

use paylater_core::dashboard::{recent_transactions, DashboardSummary, RECENT_TRANSACTIONS};
use paylater_core::models::Transaction;
use paylater_core::utils::{format_currency, format_date};

use crate::app::{App, Route};
use crate::ui::{self, styles::progress_bar, Align, Table};

const USAGE_BAR_WIDTH: usize = 30;

pub async fn run(app: &mut App) -> Result<()> {
    app.navigate(Route::Dashboard);
    if !app.require_session().await {
        return Ok(());
    }

    let profile = app.api.me().await?;
    app.session.refresh_identity(profile.identity()).await?;

    // Dues are looked up by name, so they wait for the profile
    let (transactions, dues) = futures::try_join!(
        app.api.my_transactions(),
        app.api.user_dues_report(&profile.name),
    )?;

    let summary = DashboardSummary::new(&profile, dues.dues, &transactions);
    if app.emit_json(&json!({
        "profile": profile,
        "dues": dues.dues,
        "available_credit": summary.available_credit,
        "transactions": transactions,
    }))? {
        return Ok(());
    }

    ui::heading(&format!("Welcome back, {}", profile.name));
    ui::stat("Credit limit", &format_currency(summary.credit_limit));
    ui::stat("Dues owed", &format_currency(summary.dues));
    ui::stat("Available credit", &format_currency(summary.available_credit));
    ui::stat(
        "Transactions",
        &format!(
            "{} ({} success · {} rejected)",
            transactions.len(),
            summary.successful,
            summary.rejected
        ),
    );
    println!(
        "\n  Credit usage {} {:.0}%",
        progress_bar(summary.utilization(), USAGE_BAR_WIDTH),
        summary.utilization() * 100.0
    );

    println!();
    let recent = recent_transactions(&transactions, RECENT_TRANSACTIONS);
    if recent.is_empty() {
        ui::notice("No transactions yet.");
    } else {
        println!("Recent transactions");
        recent_table(&recent).print();
    }
    Ok(())
}

fn recent_table(transactions: &[&Transaction]) -> Table {
    let mut table = Table::new(&["#", "Merchant", "Amount", "Status", "Date"])
        .align(2, Align::Right);
    for t in transactions {
        table.row(vec![
            t.id.to_string(),
            format!("Merchant #{}", t.merchant_id),
            format_currency(t.amount),
            t.status.label().to_string(),
            format_date(&t.created_at),
        ]);
    }
    table
}
