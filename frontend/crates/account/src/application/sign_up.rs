//! Sign Up Use Case

use std::sync::Arc;

use kernel::id::UserId;
use platform::password::{BreachRangeSource, ClearTextPassword};
use platform::rate_limit::RateLimiter;
use platform::storage::KeyValueStore;

use crate::application::config::AccountConfig;
use crate::application::guard::{GuardedAction, Guards, reject_leaked_password};
use crate::application::session::{AuthEvent, SessionStore};
use crate::domain::repository::{AuthGateway, CaptchaVerifier, Registration};
use crate::domain::value_object::{Email, FullName, UserRole};
use crate::error::{AccountError, AccountResult};

/// Sign up input, as typed into the form
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub role: UserRole,
    pub captcha_token: Option<String>,
}

/// Sign up output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutput {
    pub user_id: UserId,
    /// The backend mailed a confirmation link and no session was issued
    pub confirmation_required: bool,
}

pub struct SignUpUseCase<A, B, C, L, K>
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

impl<A, B, C, L, K> SignUpUseCase<A, B, C, L, K>
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

    pub async fn execute(&self, input: SignUpInput) -> AccountResult<SignUpOutput> {
        let SignUpInput {
            email,
            password,
            confirm_password,
            full_name,
            role,
            captcha_token,
        } = input;

        let email = Email::parse(&email)?;
        let full_name = FullName::parse(&full_name)?;
        if !role.is_self_service() {
            return Err(AccountError::Validation(format!(
                "Accounts cannot be registered as {}",
                role
            )));
        }
        let password = ClearTextPassword::with_confirmation(password, &confirm_password)?;

        self.guards
            .check(GuardedAction::SignUp, email.as_str(), captcha_token.as_deref())
            .await?;
        reject_leaked_password(
            self.breach.as_ref(),
            &password,
            self.config.reject_leaked_passwords,
        )
        .await?;

        let registration = Registration {
            email,
            password,
            full_name,
            role,
            captcha_token,
        };
        let outcome = self.auth.sign_up(&registration).await?;
        let user_id = outcome.user.id;

        let confirmation_required = match outcome.session {
            Some(session) => {
                self.auth.use_session(Some(&session));
                self.store.set(session, AuthEvent::SignedIn(user_id))?;
                false
            }
            None => true,
        };

        tracing::info!(
            user_id = %user_id,
            role = %registration.role,
            confirmation_required,
            "User signed up"
        );

        Ok(SignUpOutput {
            user_id,
            confirmation_required,
        })
    }
}
