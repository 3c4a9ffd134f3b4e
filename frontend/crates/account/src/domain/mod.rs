//! Domain Layer
//!
//! Entities, value objects, the session-timeout state machine, and the
//! gateway traits the application layer depends on.

pub mod entity;
pub mod repository;
pub mod session_timeout;
pub mod value_object;

// Re-exports
pub use entity::{Profile, TwoFactorStatus};
pub use repository::{
    AuthGateway, CaptchaVerdict, CaptchaVerifier, DataExporter, ProfileRepository, Registration,
    TwoFactorGateway,
};
pub use session_timeout::{SessionTimeout, SessionTimeoutConfig, TimeoutState};
