//! Sign-in, sign-up and session commands.

use anyhow::{bail, Result};
use serde_json::json;
use tracing::info;

use paylater_core::models::{NewUser, UserIdentity};

use crate::app::{App, Route};
use crate::ui::{self, prompt};

/// Environment variable pre-filling the sign-in email
const EMAIL_ENV: &str = "PAYLATER_EMAIL";

/// Email to sign in with: flag, environment, then a prompt that offers the
/// last email used.
fn resolve_email(app: &App, explicit: Option<String>) -> Result<String> {
    let env_email = std::env::var(EMAIL_ENV).ok();
    if let Some(email) = pick_email(explicit, env_email) {
        return Ok(email);
    }
    if !app.is_interactive() {
        bail!("No email given. Pass --email or set {}.", EMAIL_ENV);
    }
    let email = prompt::line("Email", app.config.last_email.as_deref())?;
    if email.is_empty() {
        bail!("Email is required");
    }
    Ok(email)
}

fn pick_email(explicit: Option<String>, env_email: Option<String>) -> Option<String> {
    explicit
        .into_iter()
        .chain(env_email)
        .map(|e| e.trim().to_string())
        .find(|e| !e.is_empty())
}

/// Sign in and store the credential.
pub async fn sign_in(app: &mut App, email: Option<String>) -> Result<()> {
    app.navigate(Route::SignIn);
    if !app.json {
        ui::heading("Sign in to PayLater");
    }

    let email = resolve_email(app, email)?;
    let password = prompt::password("Password")?;
    if password.is_empty() {
        bail!("Password is required");
    }

    let credential = app.api.authenticate(&email, &password).await?;
    let identity = credential.identity.clone();
    app.session.login_user(credential).await?;
    app.remember_email(&email);
    info!("Signed in");

    if !app.emit_json(&identity)? {
        ui::success(&format!("Signed in as {}", identity.display_name()));
    }
    app.navigate(Route::Dashboard);
    Ok(())
}

/// Create an account, then sign in with it.
pub async fn sign_up(
    app: &mut App,
    name: String,
    email: String,
    credit_limit: Option<f64>,
) -> Result<()> {
    app.navigate(Route::SignUp);
    if let Some(limit) = credit_limit {
        if !limit.is_finite() || limit < 0.0 {
            bail!("Credit limit cannot be negative");
        }
    }
    if !app.json {
        ui::heading("Create your account");
    }

    let password = prompt::password("Password")?;
    if password.is_empty() {
        bail!("Password is required");
    }
    if app.is_interactive() && prompt::password("Confirm password")? != password {
        bail!("Passwords do not match");
    }

    let new_user = NewUser {
        name,
        email: email.clone(),
        password: password.clone(),
        credit_limit,
    };
    let user = app.api.register(&new_user).await?;
    info!(user_id = user.id, "Registered");

    let credential = app.api.authenticate(&email, &password).await?;
    app.session.login_user(credential).await?;
    app.remember_email(&email);

    if !app.emit_json(&user)? {
        ui::success(&format!("Account created. Welcome, {}!", user.name));
    }
    app.navigate(Route::Dashboard);
    Ok(())
}

pub async fn sign_out(app: &mut App) -> Result<()> {
    let was_signed_in = app.session.is_authenticated().await;
    app.session.logout_user().await?;
    app.navigate(Route::Landing);

    if !app.emit_json(&json!({ "signed_out": was_signed_in }))? {
        if was_signed_in {
            ui::success("Signed out");
        } else {
            ui::notice("Not signed in.");
        }
    }
    Ok(())
}

/// Print the identity stored with the credential, without a request.
pub async fn whoami(app: &mut App) -> Result<()> {
    let identity: Option<UserIdentity> = app.session.current_user().await;
    if app.emit_json(&identity)? {
        return Ok(());
    }
    match identity {
        Some(identity) => {
            if !identity.name.is_empty() {
                ui::stat("Name", &identity.name);
            }
            ui::stat("Email", &identity.email);
            if let Some(limit) = identity.credit_limit {
                ui::stat("Credit limit", &paylater_core::utils::format_currency(limit));
            }
        }
        None => ui::notice("Not signed in."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_email_precedence() {
        assert_eq!(
            pick_email(Some("flag@x.com".into()), Some("env@x.com".into())),
            Some("flag@x.com".to_string())
        );
        assert_eq!(
            pick_email(None, Some(" env@x.com ".into())),
            Some("env@x.com".to_string())
        );
        assert_eq!(pick_email(Some("  ".into()), None), None);
        assert_eq!(pick_email(None, None), None);
    }
}
