//! Abuse Guards
//!
//! CAPTCHA and rate-limit checks run before sensitive actions. Both fail
//! open: when the checking service cannot answer, the action proceeds and
//! the backend's own limits still apply. An explicit "no" always blocks.

use std::sync::Arc;

use chrono::Utc;
use platform::password::{BreachRangeSource, ClearTextPassword, check_leaked};
use platform::rate_limit::{RateLimitConfig, RateLimiter, check_or_allow};

use crate::application::config::AccountConfig;
use crate::domain::repository::CaptchaVerifier;
use crate::error::{AccountError, AccountResult};

/// Actions that are rate limited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedAction {
    SignIn,
    SignUp,
    PasswordReset,
}

impl GuardedAction {
    pub const fn code(&self) -> &'static str {
        match self {
            GuardedAction::SignIn => "login",
            GuardedAction::SignUp => "signup",
            GuardedAction::PasswordReset => "password_reset",
        }
    }

    fn limit<'a>(&self, config: &'a AccountConfig) -> &'a RateLimitConfig {
        match self {
            GuardedAction::SignIn => &config.sign_in_limit,
            GuardedAction::SignUp => &config.sign_up_limit,
            GuardedAction::PasswordReset => &config.password_reset_limit,
        }
    }
}

pub struct Guards<C, L>
where
    C: CaptchaVerifier,
    L: RateLimiter,
{
    captcha: Arc<C>,
    limiter: Arc<L>,
    config: Arc<AccountConfig>,
}

impl<C, L> Guards<C, L>
where
    C: CaptchaVerifier,
    L: RateLimiter,
{
    pub fn new(captcha: Arc<C>, limiter: Arc<L>, config: Arc<AccountConfig>) -> Self {
        Self {
            captcha,
            limiter,
            config,
        }
    }

    /// CAPTCHA first, then the rate limit for `action` keyed by `identifier`
    pub async fn check(
        &self,
        action: GuardedAction,
        identifier: &str,
        captcha_token: Option<&str>,
    ) -> AccountResult<()> {
        verify_captcha(
            self.captcha.as_ref(),
            captcha_token,
            self.config.require_captcha,
        )
        .await?;
        self.check_rate_limit(action, identifier).await
    }

    pub async fn check_rate_limit(
        &self,
        action: GuardedAction,
        identifier: &str,
    ) -> AccountResult<()> {
        let key = format!("{}:{}", action.code(), identifier);
        let decision = check_or_allow(self.limiter.as_ref(), &key, action.limit(&self.config)).await;
        if decision.allowed {
            return Ok(());
        }
        Err(AccountError::RateLimited {
            retry_after_secs: decision.retry_after_secs(Utc::now().timestamp_millis()),
        })
    }
}

/// Verify a CAPTCHA token, failing open when the verifier is unavailable
pub async fn verify_captcha<C: CaptchaVerifier>(
    verifier: &C,
    token: Option<&str>,
    required: bool,
) -> AccountResult<()> {
    let token = match token.map(str::trim) {
        Some(token) if !token.is_empty() => token,
        _ if required => return Err(AccountError::CaptchaRequired),
        _ => return Ok(()),
    };

    match verifier.verify(token).await {
        Ok(verdict) if verdict.success => Ok(()),
        Ok(verdict) => {
            tracing::warn!(error_codes = ?verdict.error_codes, "CAPTCHA rejected");
            Err(AccountError::CaptchaFailed)
        }
        Err(e) => {
            tracing::warn!(error = %e, "CAPTCHA verification unavailable, failing open");
            Ok(())
        }
    }
}

/// Refuse a password that shows up in a public breach corpus
///
/// The lookup itself fails open (see [`check_leaked`]).
pub async fn reject_leaked_password<B: BreachRangeSource>(
    breach: &B,
    password: &ClearTextPassword,
    enabled: bool,
) -> AccountResult<()> {
    if !enabled {
        return Ok(());
    }
    let check = check_leaked(breach, password.expose()).await;
    if check.leaked {
        return Err(AccountError::LeakedPassword { count: check.count });
    }
    Ok(())
}
