pub mod email;
pub mod full_name;
pub mod totp_code;
pub mod totp_enrollment;
pub mod user_role;

pub use email::Email;
pub use full_name::FullName;
pub use totp_code::TotpCode;
pub use totp_enrollment::TotpEnrollment;
pub use user_role::UserRole;
