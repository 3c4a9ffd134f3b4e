//! Sign In Use Case
//!
//! CAPTCHA → rate limit → password grant → two-factor check.
//!
//! When the account has two-factor enabled, the password grant yields a
//! [`PendingSignIn`] instead of a published session: the tokens are held
//! back until a valid code arrives.

use std::sync::Arc;

use baas::Session;
use platform::rate_limit::RateLimiter;
use platform::storage::KeyValueStore;

use crate::application::guard::{GuardedAction, Guards};
use crate::application::session::{AuthEvent, SessionStore};
use crate::domain::repository::{AuthGateway, CaptchaVerifier, TwoFactorGateway};
use crate::domain::value_object::{Email, TotpCode};
use crate::error::{AccountError, AccountResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
    pub captcha_token: Option<String>,
    /// Code supplied up front (skips the second prompt)
    pub totp_code: Option<String>,
}

/// Password accepted, second factor outstanding
pub struct PendingSignIn {
    session: Session,
}

impl std::fmt::Debug for PendingSignIn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSignIn")
            .field("user_id", &self.session.user_id())
            .finish()
    }
}

/// Sign in output
#[derive(Debug)]
pub enum SignInOutcome {
    SignedIn(Session),
    TwoFactorRequired(PendingSignIn),
}

/// Sign in use case
pub struct SignInUseCase<A, T, C, L, K>
where
    A: AuthGateway,
    T: TwoFactorGateway,
    C: CaptchaVerifier,
    L: RateLimiter,
    K: KeyValueStore,
{
    auth: Arc<A>,
    two_factor: Arc<T>,
    guards: Arc<Guards<C, L>>,
    store: Arc<SessionStore<K>>,
}

impl<A, T, C, L, K> SignInUseCase<A, T, C, L, K>
where
    A: AuthGateway,
    T: TwoFactorGateway,
    C: CaptchaVerifier,
    L: RateLimiter,
    K: KeyValueStore,
{
    pub fn new(
        auth: Arc<A>,
        two_factor: Arc<T>,
        guards: Arc<Guards<C, L>>,
        store: Arc<SessionStore<K>>,
    ) -> Self {
        Self {
            auth,
            two_factor,
            guards,
            store,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AccountResult<SignInOutcome> {
        let email = Email::parse(&input.email)?;
        if input.password.is_empty() {
            return Err(AccountError::Validation("Password is required".into()));
        }
        // Validate the code shape before spending a request on the password
        let totp_code = input.totp_code.as_deref().map(TotpCode::parse).transpose()?;

        self.guards
            .check(
                GuardedAction::SignIn,
                email.as_str(),
                input.captcha_token.as_deref(),
            )
            .await?;

        let session = self
            .auth
            .sign_in_with_password(&email, &input.password, input.captcha_token.as_deref())
            .await?;
        self.auth.use_session(Some(&session));

        let status = match self.two_factor.status(&session.user_id()).await {
            Ok(status) => status,
            Err(e) => {
                // Unknown two-factor state must not grant access
                self.abandon(PendingSignIn { session }).await;
                return Err(e);
            }
        };

        if !status.enabled {
            self.publish(session.clone())?;
            return Ok(SignInOutcome::SignedIn(session));
        }

        let pending = PendingSignIn { session };
        match totp_code {
            Some(code) => self.complete(pending, &code).await.map(SignInOutcome::SignedIn),
            None => {
                tracing::info!(
                    user_id = %pending.session.user_id(),
                    "Two-factor code required"
                );
                Ok(SignInOutcome::TwoFactorRequired(pending))
            }
        }
    }

    /// Finish a pending sign-in with an authenticator code
    ///
    /// A wrong code signs the pending session out; the user starts over.
    pub async fn complete(&self, pending: PendingSignIn, code: &TotpCode) -> AccountResult<Session> {
        match self.two_factor.verify(code).await {
            Ok(true) => {
                let session = pending.session.clone();
                self.publish(session.clone())?;
                Ok(session)
            }
            Ok(false) => {
                self.abandon(pending).await;
                Err(AccountError::InvalidTwoFactorCode)
            }
            Err(e) => {
                self.abandon(pending).await;
                Err(e)
            }
        }
    }

    /// Give up on a pending sign-in and revoke its tokens
    pub async fn abandon(&self, pending: PendingSignIn) {
        if let Err(e) = self.auth.sign_out(&pending.session).await {
            tracing::warn!(error = %e, "Failed to revoke pending session");
        }
        self.auth.use_session(None);
    }

    fn publish(&self, session: Session) -> AccountResult<()> {
        let user_id = session.user_id();
        self.store.set(session, AuthEvent::SignedIn(user_id))?;
        tracing::info!(user_id = %user_id, "User signed in");
        Ok(())
    }
}
