use serde::{Deserialize, Serialize};

/// Account as returned by `/users/me`, `/users/` and `/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub credit_limit: f64,
    pub created_at: String,
}

impl User {
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            name: self.name.clone(),
            email: self.email.clone(),
            credit_limit: Some(self.credit_limit),
        }
    }
}

/// Identity snapshot stored alongside the bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub credit_limit: Option<f64>,
}

impl UserIdentity {
    /// Identity known only by the email used to sign in.
    pub fn from_email(email: &str) -> Self {
        Self {
            name: String::new(),
            email: email.to_string(),
            credit_limit: None,
        }
    }

    /// Name to show in headers, falling back to the email.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Registration form.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Left out of the request when absent so the service applies its own default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_limit: Option<f64>,
}
