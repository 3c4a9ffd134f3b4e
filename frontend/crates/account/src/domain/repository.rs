//! Gateway Traits
//!
//! Interfaces to the hosted backend. Implementation is in the infra layer.

use baas::{OAuthProvider, Session, SignUpOutcome};
use kernel::id::UserId;
use platform::password::ClearTextPassword;
use serde_json::Value;

use crate::domain::entity::{Profile, TwoFactorStatus};
use crate::domain::value_object::{Email, FullName, TotpCode, TotpEnrollment, UserRole};
use crate::error::AccountResult;

/// Validated sign-up form
#[derive(Debug)]
pub struct Registration {
    pub email: Email,
    pub password: ClearTextPassword,
    pub full_name: FullName,
    pub role: UserRole,
    pub captcha_token: Option<String>,
}

/// Authentication service
#[trait_variant::make(AuthGateway: Send)]
pub trait LocalAuthGateway {
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
        captcha_token: Option<&str>,
    ) -> AccountResult<Session>;

    async fn sign_up(&self, registration: &Registration) -> AccountResult<SignUpOutcome>;

    /// Revoke the session server-side
    async fn sign_out(&self, session: &Session) -> AccountResult<()>;

    async fn request_password_reset(
        &self,
        email: &Email,
        redirect_to: Option<&str>,
    ) -> AccountResult<()>;

    /// Change the signed-in user's password
    async fn update_password(&self, password: &ClearTextPassword) -> AccountResult<()>;

    async fn refresh(&self, refresh_token: &str) -> AccountResult<Session>;

    /// Provider redirect URL carrying the PKCE challenge
    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        code_challenge: &str,
    ) -> AccountResult<String>;

    async fn exchange_code(&self, auth_code: &str, code_verifier: &str) -> AccountResult<Session>;

    /// Authorize subsequent backend calls as this session (`None` = anonymous)
    fn use_session(&self, session: Option<&Session>);
}

/// `profiles` table
#[trait_variant::make(ProfileRepository: Send)]
pub trait LocalProfileRepository {
    async fn find_by_id(&self, user_id: &UserId) -> AccountResult<Option<Profile>>;
}

/// TOTP functions and status
#[trait_variant::make(TwoFactorGateway: Send)]
pub trait LocalTwoFactorGateway {
    async fn status(&self, user_id: &UserId) -> AccountResult<TwoFactorStatus>;

    /// Start enrollment; not active until a code is verified
    async fn setup(&self) -> AccountResult<TotpEnrollment>;

    /// Whether `code` is valid for the signed-in user; the first valid code
    /// after setup activates two-factor
    async fn verify(&self, code: &TotpCode) -> AccountResult<bool>;

    /// Returns whether the code was accepted and two-factor turned off
    async fn disable(&self, code: &TotpCode) -> AccountResult<bool>;
}

/// CAPTCHA verification answer
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CaptchaVerdict {
    pub success: bool,
    #[serde(default, rename = "error-codes", alias = "errorCodes")]
    pub error_codes: Vec<String>,
}

#[trait_variant::make(CaptchaVerifier: Send)]
pub trait LocalCaptchaVerifier {
    async fn verify(&self, token: &str) -> AccountResult<CaptchaVerdict>;
}

/// Bulk export of everything stored about the signed-in user
#[trait_variant::make(DataExporter: Send)]
pub trait LocalDataExporter {
    async fn export(&self) -> AccountResult<Value>;
}
