//! One module per view. Every page takes the `App` and runs to completion;
//! failures propagate to the root, which shows them.

pub mod auth;
pub mod dashboard;
pub mod merchants;
pub mod paybacks;
pub mod reports;
pub mod status;
pub mod transactions;
pub mod users;

use anyhow::{anyhow, Result};

use crate::app::App;

/// Name of the signed-in user, for commands where `--user` is optional.
pub(crate) async fn default_user_name(app: &App, explicit: Option<String>) -> Result<String> {
    if let Some(name) = explicit.filter(|n| !n.trim().is_empty()) {
        return Ok(name);
    }
    match app.session.current_user().await {
        Some(identity) if !identity.name.is_empty() => Ok(identity.name),
        _ => Err(anyhow!(
            "Your user name is not known yet. Pass --user or open the dashboard once."
        )),
    }
}

/// Reject amounts the service would refuse anyway.
pub(crate) fn ensure_positive(label: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(anyhow!("{} must be greater than zero", label))
    }
}
