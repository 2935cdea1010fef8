use anyhow::{bail, Result};

use paylater_core::models::Merchant;
use paylater_core::utils::{cmp_ignore_case, contains_ignore_case, format_date, format_percentage};

use crate::app::{App, Route};
use crate::ui::{self, Align, Table};

fn check_fee(fee_percentage: f64) -> Result<()> {
    if !fee_percentage.is_finite() || !(0.0..=100.0).contains(&fee_percentage) {
        bail!("Fee percentage must be between 0 and 100");
    }
    Ok(())
}

/// Merchants whose name contains `search`, sorted by name.
fn filter_merchants(mut merchants: Vec<Merchant>, search: Option<&str>) -> Vec<Merchant> {
    if let Some(needle) = search.filter(|s| !s.is_empty()) {
        merchants.retain(|m| contains_ignore_case(&m.name, needle));
    }
    merchants.sort_by(|a, b| cmp_ignore_case(&a.name, &b.name));
    merchants
}

pub async fn list(app: &mut App, search: Option<String>) -> Result<()> {
    app.navigate(Route::Merchants);
    if !app.require_session().await {
        return Ok(());
    }

    let merchants = filter_merchants(app.api.list_merchants().await?, search.as_deref());
    if app.emit_json(&merchants)? {
        return Ok(());
    }

    ui::heading(Route::Merchants.title());
    if merchants.is_empty() {
        ui::notice("No merchants found.");
        return Ok(());
    }
    let mut table = Table::new(&["#", "Name", "Fee", "Onboarded"]).align(2, Align::Right);
    for m in &merchants {
        table.row(vec![
            m.id.to_string(),
            m.name.clone(),
            format_percentage(m.fee_percentage),
            format_date(&m.created_at),
        ]);
    }
    table.print();
    Ok(())
}

pub async fn add(app: &mut App, name: String, fee_percentage: f64) -> Result<()> {
    app.navigate(Route::Merchants);
    check_fee(fee_percentage)?;
    if !app.require_session().await {
        return Ok(());
    }

    let created = app.api.create_merchant(name.trim(), fee_percentage).await?;
    if !app.emit_json(&created)? {
        ui::success(&format!("Merchant \"{}\" added successfully!", created.name));
    }
    Ok(())
}

pub async fn set_fee(app: &mut App, name: String, fee_percentage: f64) -> Result<()> {
    app.navigate(Route::Merchants);
    check_fee(fee_percentage)?;
    if !app.require_session().await {
        return Ok(());
    }

    let updated = app.api.update_merchant_fee(&name, fee_percentage).await?;
    if !app.emit_json(&updated)? {
        ui::success(&format!(
            "Fee updated for \"{}\": {}",
            updated.name,
            format_percentage(updated.fee_percentage)
        ));
    }
    Ok(())
}
