//! Account Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, session timeout, gateway traits
//! - `application/` - Use cases, session store, guards, timeout coordinator
//! - `infra/` - Gateway implementations over the hosted backend
//!
//! ## Features
//! - Email + password sign-in/up, OAuth sign-in (PKCE), password reset
//! - TOTP two-factor enrollment and sign-in challenge
//! - Session persistence, refresh and change events
//! - Inactivity sign-out with a warning countdown
//! - Personal data export
//!
//! ## Security Model
//! - CAPTCHA and rate-limit guards fail open; an explicit rejection blocks
//! - Passwords checked against breach corpora via k-anonymity
//! - Tokens and passwords zeroized on drop and redacted in Debug output
//! - Sessions with two-factor enabled are withheld until a code verifies

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::config::AccountConfig;
pub use error::{AccountError, AccountResult};
pub use infra::rest::BaasAccountGateway;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
    pub use crate::domain::session_timeout::SessionTimeoutConfig;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
}

pub mod use_cases {
    pub use crate::application::*;
}

#[cfg(test)]
mod tests;
