//! Application Error - Unified error type for the client
//!
//! Every crate converts its own error enum into [`AppError`] at the point
//! where the CLI reports it. What reaches the terminal is the message and,
//! when there is one, a suggested next step; the cause only goes to logs.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use super::kind::ErrorKind;

type Cause = Box<dyn Error + Send + Sync + 'static>;

/// Unified client error
///
/// ## Examples
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::new(ErrorKind::UnsupportedMediaType, "Only PDF files are allowed")
///     .with_action("Export your resume as PDF and try again");
/// assert!(!err.is_server_error());
/// assert_eq!(err.action(), Some("Export your resume as PDF and try again"));
/// ```
#[derive(Debug)]
pub struct AppError {
    kind: ErrorKind,
    message: Cow<'static, str>,
    action: Option<Cow<'static, str>>,
    cause: Option<Cause>,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            action: None,
            cause: None,
        }
    }

    /// Input the client rejected before anything was sent
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    /// Local failure the user cannot fix
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InternalServerError, message)
    }

    pub fn with_action(mut self, action: impl Into<Cow<'static, str>>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Keep `cause` for logs; it is never shown to the user
    pub fn with_source<E>(mut self, cause: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// What the user could try next
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// Server-side and unexpected failures get a generic message at the boundary
    pub fn is_server_error(&self) -> bool {
        self.kind.is_server_error()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        match &self.action {
            Some(action) => write!(f, " ({}; {})", self.kind, action),
            None => write!(f, " ({})", self.kind),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}
