//! Application Layer
//!
//! Use cases orchestrating the domain gateways, plus the session store and
//! the inactivity coordinator.

pub mod config;
pub mod data_export;
pub mod guard;
pub mod oauth;
pub mod password_reset;
pub mod profile;
pub mod session;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod timeout_coordinator;
pub mod two_factor;

// Re-exports
pub use config::AccountConfig;
pub use data_export::{DataExport, DataExportUseCase};
pub use guard::{GuardedAction, Guards};
pub use oauth::OAuthFlowUseCase;
pub use password_reset::PasswordResetUseCase;
pub use profile::CurrentProfileUseCase;
pub use session::{AuthEvent, ResumeSessionUseCase, SessionStore};
pub use sign_in::{PendingSignIn, SignInInput, SignInOutcome, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
pub use timeout_coordinator::{SessionTimeoutHandle, SignOutHandler, TimeoutSnapshot};
pub use two_factor::TwoFactorUseCase;
