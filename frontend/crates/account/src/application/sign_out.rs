//! Sign Out Use Case

use std::sync::Arc;

use platform::storage::KeyValueStore;

use crate::application::session::SessionStore;
use crate::domain::repository::AuthGateway;
use crate::error::AccountResult;

pub struct SignOutUseCase<A, K>
where
    A: AuthGateway,
    K: KeyValueStore,
{
    auth: Arc<A>,
    store: Arc<SessionStore<K>>,
}

impl<A, K> SignOutUseCase<A, K>
where
    A: AuthGateway,
    K: KeyValueStore,
{
    pub fn new(auth: Arc<A>, store: Arc<SessionStore<K>>) -> Self {
        Self { auth, store }
    }

    /// Revoke the session and forget it locally
    ///
    /// The local session is dropped even when revocation fails; a stale
    /// refresh token then simply expires on the backend.
    pub async fn execute(&self) -> AccountResult<()> {
        let Some(session) = self.store.current() else {
            return Ok(());
        };
        let user_id = session.user_id();

        if let Err(e) = self.auth.sign_out(&session).await {
            tracing::warn!(user_id = %user_id, error = %e, "Server-side sign-out failed");
        }
        self.auth.use_session(None);
        self.store.clear()?;

        tracing::info!(user_id = %user_id, "User signed out");
        Ok(())
    }
}
