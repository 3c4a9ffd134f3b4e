//! Two-Factor Management
//!
//! Enrollment is setup → scan the QR code → verify a first code. Until the
//! first code verifies, two-factor stays off and sign-in is unaffected.

use std::sync::Arc;

use platform::storage::KeyValueStore;

use crate::application::session::SessionStore;
use crate::domain::entity::TwoFactorStatus;
use crate::domain::repository::TwoFactorGateway;
use crate::domain::value_object::{TotpCode, TotpEnrollment};
use crate::error::{AccountError, AccountResult};

pub struct TwoFactorUseCase<T, K>
where
    T: TwoFactorGateway,
    K: KeyValueStore,
{
    gateway: Arc<T>,
    store: Arc<SessionStore<K>>,
}

impl<T, K> TwoFactorUseCase<T, K>
where
    T: TwoFactorGateway,
    K: KeyValueStore,
{
    pub fn new(gateway: Arc<T>, store: Arc<SessionStore<K>>) -> Self {
        Self { gateway, store }
    }

    pub async fn status(&self) -> AccountResult<TwoFactorStatus> {
        let session = self.store.require()?;
        self.gateway.status(&session.user_id()).await
    }

    /// Begin enrollment and return the secret to show the user
    pub async fn setup(&self) -> AccountResult<TotpEnrollment> {
        let session = self.store.require()?;
        let user_id = session.user_id();
        if self.gateway.status(&user_id).await?.enabled {
            return Err(AccountError::TwoFactorAlreadyEnabled);
        }
        let enrollment = self.gateway.setup().await?;
        tracing::info!(user_id = %user_id, "Two-factor enrollment started");
        Ok(enrollment)
    }

    /// Confirm enrollment with the first code from the authenticator app
    pub async fn enable(&self, code: &str) -> AccountResult<()> {
        let code = TotpCode::parse(code)?;
        let session = self.store.require()?;
        if !self.gateway.verify(&code).await? {
            return Err(AccountError::InvalidTwoFactorCode);
        }
        tracing::info!(user_id = %session.user_id(), "Two-factor enabled");
        Ok(())
    }

    /// Turn two-factor off; requires a current code
    pub async fn disable(&self, code: &str) -> AccountResult<()> {
        let code = TotpCode::parse(code)?;
        let session = self.store.require()?;
        let user_id = session.user_id();
        if !self.gateway.status(&user_id).await?.enabled {
            return Err(AccountError::TwoFactorNotEnabled);
        }
        if !self.gateway.disable(&code).await? {
            return Err(AccountError::InvalidTwoFactorCode);
        }
        tracing::warn!(user_id = %user_id, "Two-factor disabled");
        Ok(())
    }
}
