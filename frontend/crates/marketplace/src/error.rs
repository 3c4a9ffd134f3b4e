//! Marketplace Error Types

use baas::BaasError;
use kernel::{AppError, ErrorKind};
use thiserror::Error;

use crate::domain::entity::ApplicationStatus;

pub type MarketResult<T> = Result<T, MarketError>;

#[derive(Debug, Error)]
pub enum MarketError {
    /// Input rejected before any request
    #[error("{0}")]
    Validation(String),

    #[error("Only PDF files are accepted for resumes")]
    ResumeNotPdf,

    #[error("Resume must be 5 MB or smaller (got {size} bytes)")]
    ResumeTooLarge { size: u64 },

    #[error("Cannot move an application from {from} to {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error("You have already applied to this opportunity")]
    AlreadyApplied,

    #[error("This opportunity is no longer accepting applications")]
    OpportunityClosed,

    /// Role or ownership check failed
    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Not signed in")]
    NotSignedIn,

    /// Backend call failed
    #[error(transparent)]
    Remote(#[from] BaasError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MarketError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketError::Validation(_) => ErrorKind::BadRequest,
            MarketError::ResumeNotPdf => ErrorKind::UnsupportedMediaType,
            MarketError::ResumeTooLarge { .. } => ErrorKind::PayloadTooLarge,
            MarketError::InvalidTransition { .. } | MarketError::OpportunityClosed => {
                ErrorKind::UnprocessableEntity
            }
            MarketError::AlreadyApplied => ErrorKind::Conflict,
            MarketError::Forbidden(_) => ErrorKind::Forbidden,
            MarketError::NotFound(_) => ErrorKind::NotFound,
            MarketError::NotSignedIn => ErrorKind::Unauthorized,
            MarketError::Remote(e) => e.kind(),
            MarketError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn log(&self) {
        match self {
            MarketError::Remote(e) => e.log(),
            MarketError::Internal(msg) => {
                tracing::error!(message = %msg, "Marketplace internal error");
            }
            MarketError::Forbidden(msg) => {
                tracing::warn!(message = %msg, "Marketplace action refused");
            }
            _ => {
                tracing::debug!(error = %self, "Marketplace error");
            }
        }
    }
}

impl From<MarketError> for AppError {
    fn from(err: MarketError) -> Self {
        if let MarketError::Remote(remote) = err {
            return remote.into();
        }
        err.log();
        let app = AppError::new(err.kind(), err.to_string());
        match err {
            MarketError::NotSignedIn => app.with_action("Run `microintern login` first."),
            MarketError::ResumeNotPdf | MarketError::ResumeTooLarge { .. } => {
                app.with_action("Export your resume as a PDF under 5 MB.")
            }
            _ => app,
        }
    }
}

impl From<AppError> for MarketError {
    fn from(err: AppError) -> Self {
        MarketError::Internal(err.to_string())
    }
}

impl From<account::AccountError> for MarketError {
    fn from(err: account::AccountError) -> Self {
        match err {
            account::AccountError::NotSignedIn => MarketError::NotSignedIn,
            account::AccountError::Remote(e) => MarketError::Remote(e),
            account::AccountError::Validation(msg) => MarketError::Validation(msg),
            other => MarketError::Internal(other.to_string()),
        }
    }
}
