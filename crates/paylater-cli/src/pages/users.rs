use anyhow::Result;

use paylater_core::models::User;
use paylater_core::utils::{contains_ignore_case, format_currency, format_date};

use crate::app::{App, Route};
use crate::ui::{self, Align, Table};

/// Users whose name or email contains `search`.
fn filter_users(mut users: Vec<User>, search: Option<&str>) -> Vec<User> {
    if let Some(needle) = search.filter(|s| !s.is_empty()) {
        users.retain(|u| contains_ignore_case(&u.name, needle) || contains_ignore_case(&u.email, needle));
    }
    users
}

pub async fn list(app: &mut App, search: Option<String>) -> Result<()> {
    app.navigate(Route::Users);
    if !app.require_session().await {
        return Ok(());
    }

    let users = filter_users(app.api.list_users().await?, search.as_deref());
    if app.emit_json(&users)? {
        return Ok(());
    }

    ui::heading(Route::Users.title());
    if users.is_empty() {
        ui::notice("No users found.");
        return Ok(());
    }
    let mut table =
        Table::new(&["#", "Name", "Email", "Credit limit", "Joined"]).align(3, Align::Right);
    for u in &users {
        table.row(vec![
            u.id.to_string(),
            u.name.clone(),
            u.email.clone(),
            format_currency(u.credit_limit),
            format_date(&u.created_at),
        ]);
    }
    table.print();
    Ok(())
}
