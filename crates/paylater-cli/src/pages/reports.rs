//! Reports: merchant fees, user dues, users at their limit, total dues.

use anyhow::Result;

use paylater_core::utils::format_currency;

use crate::app::{App, Route};
use crate::ui::{self, Align, Table};

/// Fees collected from one merchant.
pub async fn fee(app: &mut App, merchant: String) -> Result<()> {
    app.navigate(Route::Reports);
    if !app.require_session().await {
        return Ok(());
    }

    let report = app.api.merchant_fee_report(&merchant).await?;
    if !app.emit_json(&report)? {
        ui::stat(
            &format!("Fees from {}", merchant),
            &format_currency(report.fee_collected),
        );
    }
    Ok(())
}

/// Outstanding dues of one user.
pub async fn dues(app: &mut App, user: String) -> Result<()> {
    app.navigate(Route::Reports);
    if !app.require_session().await {
        return Ok(());
    }

    let report = app.api.user_dues_report(&user).await?;
    if !app.emit_json(&report)? {
        ui::stat(&format!("Dues of {}", user), &format_currency(report.dues));
    }
    Ok(())
}

pub async fn at_limit(app: &mut App) -> Result<()> {
    app.navigate(Route::Reports);
    if !app.require_session().await {
        return Ok(());
    }

    let users = app.api.users_at_credit_limit().await?;
    if app.emit_json(&users)? {
        return Ok(());
    }

    ui::heading("Users at credit limit");
    if users.is_empty() {
        ui::success("No users at their credit limit.");
    } else {
        for name in &users {
            println!("  • {}", name);
        }
    }
    Ok(())
}

/// Total dues, with each user's share largest first.
pub async fn total_dues(app: &mut App) -> Result<()> {
    app.navigate(Route::Reports);
    if !app.require_session().await {
        return Ok(());
    }

    let report = app.api.total_dues_report().await?;
    if app.emit_json(&report)? {
        return Ok(());
    }

    ui::heading("Total dues");
    ui::stat("Total", &format_currency(report.total));
    let ranked = report.ranked();
    if !ranked.is_empty() {
        println!();
        let mut table = Table::new(&["User", "Dues"]).align(1, Align::Right);
        for (name, dues) in ranked {
            table.row(vec![name.to_string(), format_currency(dues)]);
        }
        table.print();
    }
    Ok(())
}
