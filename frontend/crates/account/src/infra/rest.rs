//! Backend Gateway
//!
//! Implements every account gateway trait over [`BaasClient`].

use baas::functions::names;
use baas::{BaasClient, BaasError, OAuthProvider, Query, Session, SignUpOutcome, UserAttributes};
use kernel::id::UserId;
use platform::password::ClearTextPassword;
use platform::rate_limit::{LimiterError, RateLimitConfig, RateLimitDecision, RateLimiter};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::entity::{Profile, TwoFactorStatus};
use crate::domain::repository::{
    AuthGateway, CaptchaVerdict, CaptchaVerifier, DataExporter, ProfileRepository, Registration,
    TwoFactorGateway,
};
use crate::domain::value_object::{Email, TotpCode, TotpEnrollment};
use crate::error::{AccountError, AccountResult};

const PROFILES: &str = "profiles";
const TWO_FACTOR: &str = "user_two_factor";

#[derive(Clone)]
pub struct BaasAccountGateway {
    client: BaasClient,
    /// Where confirmation mails link back to
    redirect_url: String,
}

impl BaasAccountGateway {
    pub fn new(client: BaasClient, redirect_url: impl Into<String>) -> Self {
        Self {
            client,
            redirect_url: redirect_url.into(),
        }
    }

    pub fn client(&self) -> &BaasClient {
        &self.client
    }
}

/// Translate the auth service's password-grant rejections
fn sign_in_error(err: BaasError) -> AccountError {
    if let BaasError::Api {
        status: 400 | 401,
        code,
        message,
    } = &err
    {
        let code = code.as_deref().unwrap_or_default();
        let message = message.to_ascii_lowercase();
        if matches!(code, "invalid_credentials" | "invalid_grant")
            || message.contains("invalid login credentials")
        {
            return AccountError::InvalidCredentials;
        }
        if code == "email_not_confirmed" || message.contains("email not confirmed") {
            return AccountError::EmailNotConfirmed;
        }
    }
    AccountError::Remote(err)
}

impl AuthGateway for BaasAccountGateway {
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
        captcha_token: Option<&str>,
    ) -> AccountResult<Session> {
        self.client
            .auth()
            .sign_in_with_password(email.as_str(), password, captcha_token)
            .await
            .map_err(sign_in_error)
    }

    async fn sign_up(&self, registration: &Registration) -> AccountResult<SignUpOutcome> {
        let metadata = json!({
            "full_name": registration.full_name.as_str(),
            "role": registration.role.code(),
        });
        let outcome = self
            .client
            .auth()
            .sign_up(
                registration.email.as_str(),
                registration.password.expose(),
                metadata,
                Some(&self.redirect_url),
            )
            .await?;
        Ok(outcome)
    }

    async fn sign_out(&self, session: &Session) -> AccountResult<()> {
        self.client.auth().sign_out(&session.access_token).await?;
        Ok(())
    }

    async fn request_password_reset(
        &self,
        email: &Email,
        redirect_to: Option<&str>,
    ) -> AccountResult<()> {
        self.client
            .auth()
            .reset_password_for_email(email.as_str(), redirect_to)
            .await?;
        Ok(())
    }

    async fn update_password(&self, password: &ClearTextPassword) -> AccountResult<()> {
        let attributes = UserAttributes {
            password: Some(password.expose().to_string()),
            ..Default::default()
        };
        self.client.auth().update_user(&attributes).await?;
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> AccountResult<Session> {
        Ok(self.client.auth().refresh_session(refresh_token).await?)
    }

    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        code_challenge: &str,
    ) -> AccountResult<String> {
        let url = self
            .client
            .auth()
            .authorize_url(provider, redirect_to, code_challenge)?;
        Ok(url.to_string())
    }

    async fn exchange_code(&self, auth_code: &str, code_verifier: &str) -> AccountResult<Session> {
        Ok(self
            .client
            .auth()
            .exchange_code_for_session(auth_code, code_verifier)
            .await?)
    }

    fn use_session(&self, session: Option<&Session>) {
        self.client
            .set_access_token(session.map(|s| s.access_token.clone()));
    }
}

impl ProfileRepository for BaasAccountGateway {
    async fn find_by_id(&self, user_id: &UserId) -> AccountResult<Option<Profile>> {
        let query = Query::table(PROFILES).eq("id", user_id);
        Ok(self.client.select_maybe(&query).await?)
    }
}

#[derive(Serialize)]
struct CodeBody<'a> {
    code: &'a str,
}

#[derive(Deserialize)]
struct VerifyAnswer {
    valid: bool,
}

#[derive(Deserialize)]
struct DisableAnswer {
    success: bool,
}

impl TwoFactorGateway for BaasAccountGateway {
    async fn status(&self, user_id: &UserId) -> AccountResult<TwoFactorStatus> {
        let query = Query::table(TWO_FACTOR)
            .select("enabled,enrolled_at")
            .eq("user_id", user_id);
        let status: Option<TwoFactorStatus> = self.client.select_maybe(&query).await?;
        Ok(status.unwrap_or_else(TwoFactorStatus::disabled))
    }

    async fn setup(&self) -> AccountResult<TotpEnrollment> {
        Ok(self.client.invoke(names::TOTP_SETUP, &json!({})).await?)
    }

    async fn verify(&self, code: &TotpCode) -> AccountResult<bool> {
        let body = CodeBody {
            code: code.as_str(),
        };
        let answer: VerifyAnswer = self.client.invoke(names::TOTP_VERIFY, &body).await?;
        Ok(answer.valid)
    }

    async fn disable(&self, code: &TotpCode) -> AccountResult<bool> {
        let body = CodeBody {
            code: code.as_str(),
        };
        let answer: DisableAnswer = self.client.invoke(names::TOTP_DISABLE, &body).await?;
        Ok(answer.success)
    }
}

impl CaptchaVerifier for BaasAccountGateway {
    async fn verify(&self, token: &str) -> AccountResult<CaptchaVerdict> {
        Ok(self
            .client
            .invoke(names::VERIFY_CAPTCHA, &json!({ "token": token }))
            .await?)
    }
}

impl DataExporter for BaasAccountGateway {
    async fn export(&self) -> AccountResult<Value> {
        if !self.client.has_access_token() {
            return Err(AccountError::NotSignedIn);
        }
        Ok(self
            .client
            .invoke(names::EXPORT_USER_DATA, &json!({}))
            .await?)
    }
}

#[derive(Serialize)]
struct RateLimitBody<'a> {
    key: &'a str,
    #[serde(flatten)]
    config: &'a RateLimitConfig,
}

impl RateLimiter for BaasAccountGateway {
    async fn check(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitDecision, LimiterError> {
        let body = RateLimitBody { key, config };
        let decision: RateLimitDecision = self.client.invoke(names::CHECK_RATE_LIMIT, &body).await?;
        Ok(decision)
    }
}
