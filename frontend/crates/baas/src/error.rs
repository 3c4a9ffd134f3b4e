//! BaaS Error Types
//!
//! Transport and backend failures, mapped onto `kernel::AppError` for the
//! layers above.

use kernel::{AppError, ErrorKind};
use serde::Deserialize;
use thiserror::Error;

pub type BaasResult<T> = Result<T, BaasError>;

#[derive(Debug, Error)]
pub enum BaasError {
    /// Missing or malformed client configuration
    #[error("BaaS configuration error: {0}")]
    Config(String),

    /// Request never produced a response (DNS, TLS, timeout)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Request refused before it was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Operation needs a signed-in session
    #[error("Not signed in")]
    NotAuthenticated,
}

impl BaasError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BaasError::Config(_) => ErrorKind::InternalServerError,
            BaasError::Transport(e) if e.is_timeout() => ErrorKind::RequestTimeout,
            BaasError::Transport(_) => ErrorKind::ServiceUnavailable,
            BaasError::Api { status, .. } => ErrorKind::from_status(*status),
            BaasError::Decode(_) => ErrorKind::BadGateway,
            BaasError::InvalidRequest(_) => ErrorKind::BadRequest,
            BaasError::NotAuthenticated => ErrorKind::Unauthorized,
        }
    }

    /// HTTP status reported by the backend, if it answered
    pub fn status(&self) -> Option<u16> {
        match self {
            BaasError::Api { status, .. } => Some(*status),
            BaasError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn log(&self) {
        match self {
            BaasError::Config(msg) => tracing::error!(message = %msg, "BaaS misconfigured"),
            BaasError::Transport(e) => tracing::error!(error = %e, "BaaS unreachable"),
            BaasError::Api { status, .. } if *status >= 500 => {
                tracing::error!(status, error = %self, "BaaS server error")
            }
            BaasError::Api {
                status: 401 | 403, ..
            } => tracing::warn!(error = %self, "BaaS rejected credentials"),
            BaasError::Decode(msg) => tracing::error!(message = %msg, "BaaS payload mismatch"),
            _ => tracing::debug!(error = %self, "BaaS error"),
        }
    }

    /// Build from a non-success response body
    ///
    /// The auth, REST and storage services each name their message field
    /// differently; the first one present wins.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize, Default)]
        struct ErrorBody {
            message: Option<String>,
            msg: Option<String>,
            error_description: Option<String>,
            error: Option<String>,
            code: Option<serde_json::Value>,
            error_code: Option<String>,
        }

        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let code = parsed.error_code.or(match parsed.code {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        });
        let message = parsed
            .message
            .or(parsed.msg)
            .or(parsed.error_description)
            .or(parsed.error)
            .unwrap_or_else(|| format!("Request failed with status {}", status));

        BaasError::Api {
            status,
            code,
            message,
        }
    }
}

impl From<BaasError> for AppError {
    fn from(err: BaasError) -> Self {
        err.log();
        let kind = err.kind();
        let message = match &err {
            BaasError::Api { message, .. } if kind.is_client_error() => message.clone(),
            BaasError::NotAuthenticated => "Please sign in to continue".to_string(),
            BaasError::InvalidRequest(msg) => msg.clone(),
            _ => "The service is unavailable right now".to_string(),
        };
        AppError::new(kind, message).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_picks_known_fields() {
        let err = BaasError::from_response(
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let err = BaasError::from_response(409, r#"{"code":"23505","message":"duplicate key"}"#);
        match err {
            BaasError::Api { code, message, .. } => {
                assert_eq!(code.as_deref(), Some("23505"));
                assert_eq!(message, "duplicate key");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_from_response_without_body() {
        let err = BaasError::from_response(503, "<html>bad gateway</html>");
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(err.to_string(), "Request failed with status 503");
    }

    #[test]
    fn test_app_error_hides_server_details() {
        let app: AppError = BaasError::from_response(500, r#"{"message":"relation missing"}"#).into();
        assert_eq!(app.message(), "The service is unavailable right now");

        let app: AppError = BaasError::from_response(422, r#"{"msg":"Password too short"}"#).into();
        assert_eq!(app.message(), "Password too short");
        assert_eq!(app.kind(), ErrorKind::UnprocessableEntity);
    }
}
