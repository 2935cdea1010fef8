use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The service rejected the session credential. Already handled
    /// centrally: the session has been cleared and subscribers notified.
    #[error("Session expired - please sign in again")]
    AuthenticationExpired,

    #[error("{message}")]
    ValidationRejected { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkUnavailable(#[from] reqwest::Error),

    #[error("Server error ({status}): {message}")]
    ServerFault { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be built (bad base URL or unusable token)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// FastAPI error body: `detail` is a string, or a list of validation errors
#[derive(Deserialize)]
struct ErrorBody {
    detail: Value,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Extract the human-readable message the service put in an error body.
    pub fn server_message(body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            match parsed.detail {
                Value::String(message) => return message,
                Value::Array(items) => {
                    let messages: Vec<String> = items
                        .iter()
                        .filter_map(|item| item.get("msg").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect();
                    if !messages.is_empty() {
                        return messages.join("; ");
                    }
                }
                _ => {}
            }
        }
        Self::truncate_body(body.trim())
    }

    /// Map a non-success status to an error. A 401 here means the request
    /// carried no session to expire, so it is reported like any other rejection.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::server_message(body);
        let message = if message.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        } else {
            message
        };

        if status.is_server_error() {
            ApiError::ServerFault {
                status: status.as_u16(),
                message,
            }
        } else {
            ApiError::ValidationRejected {
                status: status.as_u16(),
                message,
            }
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthenticationExpired => Some(401),
            ApiError::ValidationRejected { status, .. } | ApiError::ServerFault { status, .. } => {
                Some(*status)
            }
            ApiError::NetworkUnavailable(e) => e.status().map(|s| s.as_u16()),
            ApiError::InvalidResponse(_) | ApiError::InvalidRequest(_) => None,
        }
    }
}
