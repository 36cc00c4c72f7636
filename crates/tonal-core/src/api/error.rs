use std::fmt;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Which identity exchange produced an authentication failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    Login,
    Refresh,
}

impl fmt::Display for AuthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthStage::Login => write!(f, "Authentication"),
            AuthStage::Refresh => write!(f, "Token refresh"),
        }
    }
}

/// Every failure the client surfaces.
///
/// `Clone` so a single refresh outcome can be handed to every caller that
/// was waiting on it.
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    #[error("{stage} failed ({status}): {message}")]
    Authentication {
        stage: AuthStage,
        status: u16,
        message: String,
        body: Value,
    },

    #[error("Session error: {0}")]
    Session(String),

    #[error("API request failed ({status}): {message}")]
    Http {
        status: u16,
        message: String,
        body: Value,
    },

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Maximum length for raw response text carried in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Message used when a session has no credential and no way to renew one.
pub(crate) const SESSION_EXPIRED: &str = "token expired, must authenticate first";

impl ClientError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Parse an error response body, falling back to `{"error": <raw text>}`.
    ///
    /// Never fails: a body that is not JSON must not mask the HTTP failure.
    /// JSON that is not an object is kept under `body` and carries no message.
    pub fn parse_body(text: &str) -> Value {
        match serde_json::from_str::<Value>(text) {
            Ok(value @ Value::Object(_)) => value,
            Ok(other) => serde_json::json!({ "body": other }),
            Err(_) => serde_json::json!({ "error": Self::truncate_body(text) }),
        }
    }

    /// Prefer `error_description`, then `error`, then the fallback.
    pub fn message_from_body(body: &Value, fallback: impl Into<String>) -> String {
        for key in ["error_description", "error"] {
            if let Some(Value::String(s)) = body.get(key) {
                if !s.is_empty() {
                    return s.clone();
                }
            }
        }
        fallback.into()
    }

    /// Build an API error from a non-2xx status and its raw body text.
    pub fn from_status(status: u16, text: &str) -> Self {
        let body = Self::parse_body(text);
        let message = Self::message_from_body(&body, format!("HTTP {}", status));
        ClientError::Http {
            status,
            message,
            body,
        }
    }

    /// Build an identity-provider error from a non-2xx status and raw body.
    pub fn from_auth_status(stage: AuthStage, status: u16, text: &str) -> Self {
        let body = Self::parse_body(text);
        let fallback = match stage {
            AuthStage::Login => "Authentication failed",
            AuthStage::Refresh => "Token refresh failed",
        };
        let message = Self::message_from_body(&body, fallback);
        ClientError::Authentication {
            stage,
            status,
            message,
            body,
        }
    }

    /// Map a transport failure. Timeouts keep their own kind; everything
    /// else becomes `Unknown`.
    pub fn from_transport(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(timeout)
        } else {
            ClientError::Unknown(format!(
                "Request failed ({}): {}",
                transport_error_kind(err),
                err
            ))
        }
    }

    pub fn session_expired() -> Self {
        ClientError::Session(SESSION_EXPIRED.to_string())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Authentication { status, .. } | ClientError::Http { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Server errors and status-less transport failures may succeed on a
    /// later attempt. Client errors, session loss and bad input never do.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Session(_) | ClientError::InvalidInput(_) => false,
            ClientError::Timeout(_) | ClientError::Unknown(_) => true,
            ClientError::Authentication { status, .. } | ClientError::Http { status, .. } => {
                *status >= 500
            }
        }
    }

    /// The API rejected the bearer credential.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ClientError::Http { status: 401 | 403, .. })
    }

    /// Human-readable message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Authentication {
                stage: AuthStage::Login,
                status: 403,
                ..
            } => "Invalid username or password. Check your credentials and try again.".to_string(),
            ClientError::Authentication {
                stage: AuthStage::Refresh,
                ..
            }
            | ClientError::Session(_) => {
                "Your session has expired. Please log in again.".to_string()
            }
            ClientError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub(crate) fn transport_error_kind(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connection_failed"
    } else if err.is_request() {
        "request_error"
    } else if err.is_body() {
        "body_error"
    } else if err.is_decode() {
        "decode_error"
    } else {
        "unknown"
    }
}
