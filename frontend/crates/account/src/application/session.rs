//! Session State and Auth Events
//!
//! The current session lives here and is mirrored to durable storage so the
//! CLI stays signed in between runs. Every change is broadcast as an
//! [`AuthEvent`] to whoever subscribed.

use std::sync::{Arc, RwLock};

use baas::Session;
use chrono::{Duration as ChronoDuration, Utc};
use kernel::id::UserId;
use platform::storage::KeyValueStore;
use tokio::sync::broadcast;

use crate::domain::repository::AuthGateway;
use crate::error::{AccountError, AccountResult};

const SESSION_KEY: &str = "auth_session";
const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(UserId),
    SignedOut,
    TokenRefreshed,
    /// Signed in through a password recovery link
    PasswordRecovery(UserId),
    UserUpdated,
}

pub struct SessionStore<K: KeyValueStore> {
    storage: Arc<K>,
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl<K: KeyValueStore> SessionStore<K> {
    pub fn new(storage: Arc<K>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            storage,
            current: RwLock::new(None),
            events,
        }
    }

    /// Load the session persisted by a previous run, if any
    ///
    /// A corrupted entry is discarded rather than reported.
    pub fn restore(&self) -> AccountResult<Option<Session>> {
        let Some(raw) = self.storage.get(SESSION_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => {
                *self.write() = Some(session.clone());
                Ok(Some(session))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable stored session");
                self.storage.remove(SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.read().as_ref().map(Session::user_id)
    }

    pub fn require(&self) -> AccountResult<Session> {
        self.current().ok_or(AccountError::NotSignedIn)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Replace the current session and announce `event`
    pub fn set(&self, session: Session, event: AuthEvent) -> AccountResult<()> {
        let raw = serde_json::to_string(&session)
            .map_err(|e| AccountError::Internal(format!("Session serialization failed: {}", e)))?;
        self.storage.set(SESSION_KEY, &raw)?;
        *self.write() = Some(session);
        self.emit(event);
        Ok(())
    }

    /// Forget the session locally and announce sign-out
    pub fn clear(&self) -> AccountResult<()> {
        self.storage.remove(SESSION_KEY)?;
        let had_session = self.write().take().is_some();
        if had_session {
            self.emit(AuthEvent::SignedOut);
        }
        Ok(())
    }

    pub fn emit(&self, event: AuthEvent) {
        tracing::debug!(?event, "Auth event");
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        match self.current.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Restore the stored session and make sure its access token is usable
pub struct ResumeSessionUseCase<G, K>
where
    G: AuthGateway,
    K: KeyValueStore,
{
    gateway: Arc<G>,
    store: Arc<SessionStore<K>>,
    refresh_margin: ChronoDuration,
}

impl<G, K> ResumeSessionUseCase<G, K>
where
    G: AuthGateway,
    K: KeyValueStore,
{
    pub fn new(gateway: Arc<G>, store: Arc<SessionStore<K>>, refresh_margin_secs: i64) -> Self {
        Self {
            gateway,
            store,
            refresh_margin: ChronoDuration::seconds(refresh_margin_secs),
        }
    }

    /// `None` when nobody is signed in or the refresh token was rejected
    pub async fn execute(&self) -> AccountResult<Option<Session>> {
        let session = match self.store.current() {
            Some(session) => session,
            None => match self.store.restore()? {
                Some(session) => session,
                None => return Ok(None),
            },
        };

        if !session.needs_refresh(Utc::now(), self.refresh_margin) {
            self.gateway.use_session(Some(&session));
            return Ok(Some(session));
        }

        match self.gateway.refresh(&session.refresh_token).await {
            Ok(refreshed) => {
                self.gateway.use_session(Some(&refreshed));
                self.store.set(refreshed.clone(), AuthEvent::TokenRefreshed)?;
                tracing::info!(user_id = %refreshed.user_id(), "Session refreshed");
                Ok(Some(refreshed))
            }
            Err(AccountError::Remote(e)) if e.kind().is_client_error() => {
                tracing::info!(error = %e, "Stored session no longer valid");
                self.gateway.use_session(None);
                self.store.clear()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
