use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Shown whenever no HTTP response could be obtained at all.
pub const TRANSPORT_ERROR_MESSAGE: &str = "Cannot reach backend. Check that the server is running.";

/// Used when a rejected login carries no `detail`.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Rejected locally before any request was sent
    #[error("{0}")]
    Validation(String),

    /// `/login` answered with a non-success status
    #[error("{message}")]
    Credential { status: StatusCode, message: String },

    /// `/predict` answered with a non-success status
    #[error("{message}")]
    Analysis { status: StatusCode, message: String },

    #[error("Cannot reach backend. Check that the server is running.")]
    Transport,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Error payload the backend sends with non-success statuses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    message: Option<serde_json::Value>,
}

impl ErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn detail(&self) -> Option<String> {
        self.detail.as_ref().and_then(Self::field_text)
    }

    fn message(&self) -> Option<String> {
        self.message.as_ref().and_then(Self::field_text)
    }

    /// Strings are used as-is; other JSON (e.g. validation error lists) is
    /// rendered compactly. Empty strings and nulls count as absent.
    fn field_text(value: &serde_json::Value) -> Option<String> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(truncate_body(&other.to_string())),
        }
    }
}

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

impl ApiError {
    /// Build the error for a rejected `/login`: `detail`, else a generic message.
    pub fn from_login_failure(status: StatusCode, body: &str) -> Self {
        let message = ErrorBody::parse(body)
            .detail()
            .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string());
        ApiError::Credential { status, message }
    }

    /// Build the error for a rejected `/predict`: `detail`, then `message`,
    /// then `HTTP <status>`.
    pub fn from_analysis_failure(status: StatusCode, body: &str) -> Self {
        let parsed = ErrorBody::parse(body);
        let message = parsed
            .detail()
            .or_else(|| parsed.message())
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        ApiError::Analysis { status, message }
    }

    /// HTTP status of a backend rejection, if this error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Credential { status, .. } | ApiError::Analysis { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a `/predict` rejection means the credential is no longer
    /// accepted. Matches on the status code, and on a "401" in the message
    /// for backends that report it only in text.
    pub fn is_session_expired(&self) -> bool {
        match self {
            ApiError::Analysis { status, message } => {
                *status == StatusCode::UNAUTHORIZED || message.contains("401")
            }
            _ => false,
        }
    }
}
