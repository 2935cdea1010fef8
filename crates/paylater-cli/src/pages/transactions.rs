use std::collections::HashMap;

use anyhow::{anyhow, Result};

use paylater_core::models::{Merchant, Transaction, TransactionStatus};
use paylater_core::utils::{contains_ignore_case, format_currency, format_date};

use super::{default_user_name, ensure_positive};
use crate::app::{App, Route};
use crate::ui::{self, Align, Table};

/// Filters for the transaction list
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Only the signed-in user's transactions
    pub mine: bool,
    pub status: Option<TransactionStatus>,
    pub search: Option<String>,
}

impl ListFilter {
    pub fn new(mine: bool, status: Option<&str>, search: Option<String>) -> Result<Self> {
        let status = status
            .map(|s| {
                TransactionStatus::parse(s)
                    .ok_or_else(|| anyhow!("Unknown status '{}'; use success or rejected", s))
            })
            .transpose()?;
        Ok(Self {
            mine,
            status,
            search: search.filter(|s| !s.trim().is_empty()),
        })
    }

    fn matches(&self, transaction: &Transaction, merchant_name: &str) -> bool {
        if let Some(status) = self.status {
            if transaction.status != status {
                return false;
            }
        }
        match &self.search {
            Some(needle) => {
                contains_ignore_case(merchant_name, needle)
                    || transaction
                        .rejection_reason
                        .as_deref()
                        .is_some_and(|r| contains_ignore_case(r, needle))
            }
            None => true,
        }
    }
}

/// Display name for each merchant id; unknown ids show as "Merchant #id".
fn merchant_names(merchants: &[Merchant]) -> HashMap<i64, String> {
    merchants.iter().map(|m| (m.id, m.name.clone())).collect()
}

fn merchant_label(names: &HashMap<i64, String>, id: i64) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| format!("Merchant #{}", id))
}

pub async fn list(app: &mut App, filter: ListFilter) -> Result<()> {
    app.navigate(Route::Transactions);
    if !app.require_session().await {
        return Ok(());
    }

    let api = &app.api;
    let (transactions, merchants) = if filter.mine {
        futures::try_join!(api.my_transactions(), api.list_merchants())?
    } else {
        futures::try_join!(api.all_transactions(), api.list_merchants())?
    };

    let names = merchant_names(&merchants);
    let shown: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| filter.matches(t, &merchant_label(&names, t.merchant_id)))
        .collect();
    if app.emit_json(&shown)? {
        return Ok(());
    }

    ui::heading(Route::Transactions.title());
    if shown.is_empty() {
        ui::notice("No transactions found.");
        return Ok(());
    }

    let mut table = Table::new(&[
        "#", "User", "Merchant", "Amount", "Fee", "Payout", "Status", "Date",
    ])
    .align(3, Align::Right)
    .align(4, Align::Right)
    .align(5, Align::Right);
    for (i, t) in shown.iter().enumerate() {
        table.row(vec![
            (i + 1).to_string(),
            format!("User #{}", t.user_id),
            merchant_label(&names, t.merchant_id),
            format_currency(t.amount),
            format_currency(t.fee_amount),
            format_currency(t.merchant_payout),
            t.status.label().to_string(),
            format_date(&t.created_at),
        ]);
    }
    table.print();
    Ok(())
}

/// Record a purchase. A rejection is a normal outcome, shown with its reason.
pub async fn create(
    app: &mut App,
    user: Option<String>,
    merchant: String,
    amount: f64,
) -> Result<()> {
    app.navigate(Route::Transactions);
    ensure_positive("Amount", amount)?;
    if !app.require_session().await {
        return Ok(());
    }

    let user_name = default_user_name(app, user).await?;
    let outcome = app
        .api
        .create_transaction(&user_name, &merchant, amount)
        .await?;
    if app.emit_json(&outcome)? {
        return Ok(());
    }

    if outcome.is_success() {
        ui::success("Transaction successful!");
    } else {
        let reason = outcome.reason.as_deref().unwrap_or("no reason given");
        ui::warning(&format!("Transaction rejected: {}", reason));
    }
    Ok(())
}
