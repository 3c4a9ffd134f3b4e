//! Resume Upload

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::MarketConfig;
use crate::application::viewer::Viewer;
use crate::domain::repository::ResumeStorage;
use crate::domain::value_object::ResumeFile;
use crate::domain::value_object::resume::is_owned_by;
use crate::error::{MarketError, MarketResult};

pub struct ResumeUseCase<S>
where
    S: ResumeStorage,
{
    storage: Arc<S>,
    config: Arc<MarketConfig>,
}

impl<S> ResumeUseCase<S>
where
    S: ResumeStorage,
{
    pub fn new(storage: Arc<S>, config: Arc<MarketConfig>) -> Self {
        Self { storage, config }
    }

    /// Validate and store a resume; returns its storage path
    pub async fn upload(&self, viewer: &Viewer, file_name: &str, bytes: Vec<u8>) -> MarketResult<String> {
        viewer.require_student()?;
        let file = ResumeFile::new(file_name, bytes)?;
        let path = file.storage_path(&viewer.user_id, Utc::now());
        let size = file.size();

        let key = self.storage.upload(&path, file.into_bytes()).await?;
        tracing::info!(user_id = %viewer.user_id, path = %path, size, "Resume uploaded");
        Ok(key)
    }

    pub async fn remove(&self, viewer: &Viewer, path: &str) -> MarketResult<()> {
        self.ensure_owner(viewer, path)?;
        self.storage.remove(path).await?;
        tracing::info!(user_id = %viewer.user_id, path = %path, "Resume removed");
        Ok(())
    }

    /// Download link; recruiters may open resumes attached to applications
    pub async fn link(&self, viewer: &Viewer, path: &str) -> MarketResult<String> {
        if !viewer.role.can_manage_opportunities() {
            self.ensure_owner(viewer, path)?;
        }
        self.storage
            .signed_url(path, self.config.resume_link_ttl.as_secs())
            .await
    }

    fn ensure_owner(&self, viewer: &Viewer, path: &str) -> MarketResult<()> {
        if !is_owned_by(path, &viewer.user_id) {
            return Err(MarketError::Forbidden("That resume belongs to someone else".into()));
        }
        Ok(())
    }
}
