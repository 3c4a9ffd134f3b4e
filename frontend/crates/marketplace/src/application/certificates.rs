//! Certificate Use Case

use std::sync::Arc;

use platform::cache::QueryCache;

use crate::application::keys;
use crate::application::viewer::Viewer;
use crate::domain::entity::Certificate;
use crate::domain::repository::CertificateRepository;
use crate::error::MarketResult;

pub struct CertificateUseCase<R>
where
    R: CertificateRepository,
{
    repo: Arc<R>,
    cache: Arc<QueryCache>,
}

impl<R> CertificateUseCase<R>
where
    R: CertificateRepository,
{
    pub fn new(repo: Arc<R>, cache: Arc<QueryCache>) -> Self {
        Self { repo, cache }
    }

    /// Certificates earned by the viewer, newest first
    pub async fn list_mine(&self, viewer: &Viewer) -> MarketResult<Vec<Certificate>> {
        viewer.require_student()?;
        let mut certificates: Vec<Certificate> = self
            .cache
            .get_or_fetch(&keys::student_certificates(&viewer.user_id), || {
                self.repo.list_for_student(&viewer.user_id)
            })
            .await?;
        certificates.sort_by_key(|c| std::cmp::Reverse(c.issued_at));
        Ok(certificates)
    }
}
