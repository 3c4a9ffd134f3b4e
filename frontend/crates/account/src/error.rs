//! Account Error Types
//!
//! Account-specific error variants that integrate with the unified
//! `kernel::AppError` system.

use baas::BaasError;
use kernel::{AppError, ErrorKind};
use platform::password::PasswordPolicyError;
use thiserror::Error;

pub type AccountResult<T> = Result<T, AccountError>;

#[derive(Debug, Error)]
pub enum AccountError {
    /// Input rejected before any request
    #[error("{0}")]
    Validation(String),

    /// Password composition rules
    #[error(transparent)]
    Password(#[from] PasswordPolicyError),

    /// Password found in a public breach corpus
    #[error("This password has appeared in {count} data breaches")]
    LeakedPassword { count: u64 },

    /// CAPTCHA explicitly rejected
    #[error("CAPTCHA verification failed")]
    CaptchaFailed,

    /// CAPTCHA token missing where one is required
    #[error("Please complete the CAPTCHA")]
    CaptchaRequired,

    #[error("Too many attempts")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email address has not been confirmed")]
    EmailNotConfirmed,

    #[error("Invalid two-factor authentication code")]
    InvalidTwoFactorCode,

    #[error("Two-factor authentication is not enabled")]
    TwoFactorNotEnabled,

    #[error("Two-factor authentication is already enabled")]
    TwoFactorAlreadyEnabled,

    #[error("Not signed in")]
    NotSignedIn,

    /// OAuth callback without a matching start
    #[error("No sign-in is in progress for this callback")]
    OAuthFlowMissing,

    /// Backend call failed
    #[error(transparent)]
    Remote(#[from] BaasError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::Validation(_)
            | AccountError::Password(_)
            | AccountError::LeakedPassword { .. }
            | AccountError::CaptchaRequired
            | AccountError::OAuthFlowMissing => ErrorKind::BadRequest,
            AccountError::CaptchaFailed | AccountError::EmailNotConfirmed => ErrorKind::Forbidden,
            AccountError::RateLimited { .. } => ErrorKind::TooManyRequests,
            AccountError::InvalidCredentials
            | AccountError::InvalidTwoFactorCode
            | AccountError::NotSignedIn => ErrorKind::Unauthorized,
            AccountError::TwoFactorNotEnabled => ErrorKind::UnprocessableEntity,
            AccountError::TwoFactorAlreadyEnabled => ErrorKind::Conflict,
            AccountError::Remote(e) => e.kind(),
            AccountError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Suggested next step shown under the message
    fn action(&self) -> Option<String> {
        match self {
            AccountError::RateLimited {
                retry_after_secs: Some(secs),
            } => Some(format!("Try again in {} seconds.", secs)),
            AccountError::RateLimited { .. } => Some("Try again later.".to_string()),
            AccountError::LeakedPassword { .. } => {
                Some("Choose a password you have not used elsewhere.".to_string())
            }
            AccountError::EmailNotConfirmed => {
                Some("Follow the link in your confirmation email.".to_string())
            }
            AccountError::NotSignedIn => Some("Run `microintern login` first.".to_string()),
            _ => None,
        }
    }

    pub fn log(&self) {
        match self {
            AccountError::Remote(e) => e.log(),
            AccountError::Internal(msg) => {
                tracing::error!(message = %msg, "Account internal error");
            }
            AccountError::InvalidCredentials => {
                tracing::warn!("Invalid sign-in attempt");
            }
            AccountError::InvalidTwoFactorCode => {
                tracing::warn!("Invalid two-factor code");
            }
            AccountError::CaptchaFailed => {
                tracing::warn!("CAPTCHA rejected");
            }
            AccountError::RateLimited { retry_after_secs } => {
                tracing::warn!(?retry_after_secs, "Rate limited");
            }
            _ => {
                tracing::debug!(error = %self, "Account error");
            }
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        if let AccountError::Remote(remote) = err {
            return remote.into();
        }
        err.log();
        let mut app = AppError::new(err.kind(), err.to_string());
        if let Some(action) = err.action() {
            app = app.with_action(action);
        }
        app
    }
}

impl From<AppError> for AccountError {
    fn from(err: AppError) -> Self {
        AccountError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_carries_retry_hint() {
        let app: AppError = AccountError::RateLimited {
            retry_after_secs: Some(42),
        }
        .into();
        assert_eq!(app.kind(), ErrorKind::TooManyRequests);
        assert_eq!(app.action(), Some("Try again in 42 seconds."));
    }

    #[test]
    fn test_password_policy_is_a_validation_error() {
        let err: AccountError = PasswordPolicyError::Mismatch.into();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[test]
    fn test_remote_errors_keep_their_kind() {
        let err = AccountError::Remote(BaasError::NotAuthenticated);
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        let app: AppError = err.into();
        assert_eq!(app.message(), "Please sign in to continue");
    }
}
