use anyhow::Result;

use paylater_core::utils::format_currency;

use super::{default_user_name, ensure_positive};
use crate::app::{App, Route};
use crate::ui;

/// Pay back part or all of a user's dues.
pub async fn run(app: &mut App, user: Option<String>, amount: f64) -> Result<()> {
    app.navigate(Route::Paybacks);
    ensure_positive("Amount", amount)?;
    if !app.require_session().await {
        return Ok(());
    }

    let user_name = default_user_name(app, user).await?;
    let receipt = app.api.create_payback(&user_name, amount).await?;
    if app.emit_json(&receipt)? {
        return Ok(());
    }

    ui::success(&format!(
        "Payment of {} recorded successfully!",
        format_currency(amount)
    ));
    ui::stat("User", &receipt.user_name);
    ui::stat("Remaining dues", &format_currency(receipt.remaining_dues));
    Ok(())
}
