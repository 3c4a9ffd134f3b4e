//! OAuth Redirect Flow (PKCE)
//!
//! `start` remembers a verifier and hands out the provider URL; `complete`
//! trades the callback code plus that verifier for a session. The verifier is
//! single use and removed whichever way the exchange goes.

use std::sync::Arc;

use baas::OAuthProvider;
use platform::crypto::{random_token, sha256, to_base64_url};
use platform::storage::KeyValueStore;

use crate::application::config::AccountConfig;
use crate::application::session::{AuthEvent, SessionStore};
use crate::domain::repository::AuthGateway;
use crate::error::{AccountError, AccountResult};

const VERIFIER_KEY: &str = "oauth_pkce_verifier";
const VERIFIER_LENGTH: usize = 64;

/// S256 code challenge for a verifier
pub fn code_challenge(verifier: &str) -> String {
    to_base64_url(&sha256(verifier.as_bytes()))
}

pub struct OAuthFlowUseCase<A, K>
where
    A: AuthGateway,
    K: KeyValueStore,
{
    auth: Arc<A>,
    storage: Arc<K>,
    store: Arc<SessionStore<K>>,
    config: Arc<AccountConfig>,
}

impl<A, K> OAuthFlowUseCase<A, K>
where
    A: AuthGateway,
    K: KeyValueStore,
{
    pub fn new(
        auth: Arc<A>,
        storage: Arc<K>,
        store: Arc<SessionStore<K>>,
        config: Arc<AccountConfig>,
    ) -> Self {
        Self {
            auth,
            storage,
            store,
            config,
        }
    }

    /// URL to send the user to; replaces any unfinished flow
    pub fn start(&self, provider: OAuthProvider) -> AccountResult<String> {
        let verifier = random_token(VERIFIER_LENGTH);
        let url = self.auth.authorize_url(
            provider,
            &self.config.redirect_url,
            &code_challenge(&verifier),
        )?;
        self.storage.set(VERIFIER_KEY, &verifier)?;
        tracing::debug!(provider = provider.code(), "OAuth flow started");
        Ok(url)
    }

    /// Finish the flow with the `code` query parameter of the callback
    pub async fn complete(&self, auth_code: &str) -> AccountResult<()> {
        let auth_code = auth_code.trim();
        if auth_code.is_empty() {
            return Err(AccountError::Validation("Missing authorization code".into()));
        }
        let verifier = self
            .storage
            .get(VERIFIER_KEY)?
            .ok_or(AccountError::OAuthFlowMissing)?;
        self.storage.remove(VERIFIER_KEY)?;

        let session = self.auth.exchange_code(auth_code, &verifier).await?;
        let user_id = session.user_id();
        self.auth.use_session(Some(&session));
        self.store.set(session, AuthEvent::SignedIn(user_id))?;
        tracing::info!(user_id = %user_id, "User signed in with OAuth");
        Ok(())
    }
}
