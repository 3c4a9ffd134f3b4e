pub mod profile;
pub mod two_factor;

pub use profile::Profile;
pub use two_factor::TwoFactorStatus;
