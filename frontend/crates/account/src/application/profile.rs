//! Current Profile

use std::sync::Arc;

use platform::storage::KeyValueStore;

use crate::application::session::SessionStore;
use crate::domain::entity::Profile;
use crate::domain::repository::ProfileRepository;
use crate::error::{AccountError, AccountResult};

pub struct CurrentProfileUseCase<P, K>
where
    P: ProfileRepository,
    K: KeyValueStore,
{
    profiles: Arc<P>,
    store: Arc<SessionStore<K>>,
}

impl<P, K> CurrentProfileUseCase<P, K>
where
    P: ProfileRepository,
    K: KeyValueStore,
{
    pub fn new(profiles: Arc<P>, store: Arc<SessionStore<K>>) -> Self {
        Self { profiles, store }
    }

    /// Profile of the signed-in user
    ///
    /// The row is created by a backend trigger at sign-up; a missing row
    /// means that trigger has not run yet.
    pub async fn execute(&self) -> AccountResult<Profile> {
        let session = self.store.require()?;
        self.profiles
            .find_by_id(&session.user_id())
            .await?
            .ok_or_else(|| AccountError::Internal("Profile row is missing".into()))
    }
}
