use anyhow::Result;
use serde_json::json;

use crate::app::{App, Route};
use crate::ui;

/// Service reachability and the local session.
pub async fn run(app: &mut App) -> Result<()> {
    app.navigate(Route::Landing);

    let info = app.api.health().await?;
    let identity = app.session.state().await.identity().cloned();

    if app.emit_json(&json!({
        "service": info,
        "api_url": app.api.base_url().as_str(),
        "signed_in_as": identity,
    }))? {
        return Ok(());
    }

    ui::heading(Route::Landing.title());
    ui::stat("Service", &info.message);
    if let Some(version) = &info.version {
        ui::stat("Version", version);
    }
    ui::stat("API URL", app.api.base_url().as_str());
    match identity {
        Some(identity) => ui::stat("Signed in as", identity.display_name()),
        None => ui::stat("Signed in as", "nobody (run `paylater login`)"),
    }
    Ok(())
}
