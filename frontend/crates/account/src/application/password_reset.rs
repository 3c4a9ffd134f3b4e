//! Password Reset and Change
//!
//! Reset is a two-step flow: a mail with a recovery link, then the tokens
//! the link lands with are turned into a session in which the new password
//! is set.

use std::sync::Arc;

use platform::password::{BreachRangeSource, ClearTextPassword};
use platform::rate_limit::RateLimiter;
use platform::storage::KeyValueStore;

use crate::application::config::AccountConfig;
use crate::application::guard::{GuardedAction, Guards, reject_leaked_password};
use crate::application::session::{AuthEvent, SessionStore};
use crate::domain::repository::{AuthGateway, CaptchaVerifier};
use crate::domain::value_object::Email;
use crate::error::{AccountError, AccountResult};

pub struct PasswordResetUseCase<A, B, C, L, K>
where
    A: AuthGateway,
    B: BreachRangeSource,
    C: CaptchaVerifier,
    L: RateLimiter,
    K: KeyValueStore,
{
    auth: Arc<A>,
    breach: Arc<B>,
    guards: Arc<Guards<C, L>>,
    store: Arc<SessionStore<K>>,
    config: Arc<AccountConfig>,
}

impl<A, B, C, L, K> PasswordResetUseCase<A, B, C, L, K>
where
    A: AuthGateway,
    B: BreachRangeSource,
    C: CaptchaVerifier,
    L: RateLimiter,
    K: KeyValueStore,
{
    pub fn new(
        auth: Arc<A>,
        breach: Arc<B>,
        guards: Arc<Guards<C, L>>,
        store: Arc<SessionStore<K>>,
        config: Arc<AccountConfig>,
    ) -> Self {
        Self {
            auth,
            breach,
            guards,
            store,
            config,
        }
    }

    /// Mail a recovery link
    ///
    /// Succeeds for unknown addresses too, so the response does not reveal
    /// which emails have accounts.
    pub async fn request(&self, email: &str, captcha_token: Option<&str>) -> AccountResult<()> {
        let email = Email::parse(email)?;
        self.guards
            .check(GuardedAction::PasswordReset, email.as_str(), captcha_token)
            .await?;
        self.auth
            .request_password_reset(&email, Some(&self.config.redirect_url))
            .await?;
        tracing::info!(email = %email.masked(), "Password reset requested");
        Ok(())
    }

    /// Sign in from the URL the recovery link redirected to
    ///
    /// The fragment carries `refresh_token` and `type=recovery`; the refresh
    /// token is traded for a full session.
    pub async fn complete_recovery(&self, callback_url: &str) -> AccountResult<()> {
        let params = RecoveryParams::parse(callback_url)?;
        let session = self.auth.refresh(&params.refresh_token).await?;
        let user_id = session.user_id();
        self.auth.use_session(Some(&session));
        self.store.set(session, AuthEvent::PasswordRecovery(user_id))?;
        tracing::info!(user_id = %user_id, "Signed in for password recovery");
        Ok(())
    }

    /// Set a new password for the signed-in user
    pub async fn update_password(&self, password: String, confirm: &str) -> AccountResult<()> {
        let session = self.store.require()?;
        let password = ClearTextPassword::with_confirmation(password, confirm)?;
        reject_leaked_password(
            self.breach.as_ref(),
            &password,
            self.config.reject_leaked_passwords,
        )
        .await?;

        self.auth.use_session(Some(&session));
        self.auth.update_password(&password).await?;
        self.store.emit(AuthEvent::UserUpdated);
        tracing::info!(user_id = %session.user_id(), "Password updated");
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
struct RecoveryParams {
    refresh_token: String,
}

impl RecoveryParams {
    fn parse(callback_url: &str) -> AccountResult<Self> {
        let invalid = || AccountError::Validation("That is not a password recovery link".into());
        let (_, fragment) = callback_url.split_once('#').ok_or_else(invalid)?;

        let mut refresh_token = None;
        let mut is_recovery = false;
        for (key, value) in fragment.split('&').filter_map(|pair| pair.split_once('=')) {
            match key {
                "refresh_token" if !value.is_empty() => refresh_token = Some(value.to_string()),
                "type" => is_recovery = value == "recovery",
                "error_description" => {
                    return Err(AccountError::Validation(value.replace('+', " ")));
                }
                _ => {}
            }
        }

        match refresh_token {
            Some(refresh_token) if is_recovery => Ok(Self { refresh_token }),
            _ => Err(invalid()),
        }
    }
}
