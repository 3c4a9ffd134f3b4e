//! Dashboard and Analytics Use Cases
//!
//! Both read through the same cached lists the other use cases fill, so a
//! dashboard opened right after browsing costs no extra requests.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::OpportunityId;
use platform::cache::QueryCache;

use crate::application::config::MarketConfig;
use crate::application::keys;
use crate::application::viewer::Viewer;
use crate::domain::entity::{Application, Certificate, Opportunity};
use crate::domain::repository::{ApplicationRepository, CertificateRepository, OpportunityRepository};
use crate::domain::stats::{Analytics, RecruiterDashboard, StudentDashboard};
use crate::error::MarketResult;

/// Role-specific dashboard
#[derive(Debug, Clone, PartialEq)]
pub enum Dashboard {
    Student(StudentDashboard),
    Recruiter(RecruiterDashboard),
}

pub struct DashboardUseCase<O, A, C>
where
    O: OpportunityRepository,
    A: ApplicationRepository,
    C: CertificateRepository,
{
    opportunities: Arc<O>,
    applications: Arc<A>,
    certificates: Arc<C>,
    cache: Arc<QueryCache>,
    config: Arc<MarketConfig>,
}

impl<O, A, C> DashboardUseCase<O, A, C>
where
    O: OpportunityRepository,
    A: ApplicationRepository,
    C: CertificateRepository,
{
    pub fn new(
        opportunities: Arc<O>,
        applications: Arc<A>,
        certificates: Arc<C>,
        cache: Arc<QueryCache>,
        config: Arc<MarketConfig>,
    ) -> Self {
        Self {
            opportunities,
            applications,
            certificates,
            cache,
            config,
        }
    }

    pub async fn execute(&self, viewer: &Viewer) -> MarketResult<Dashboard> {
        if viewer.role.can_manage_opportunities() {
            let (opportunities, applications) = self.recruiter_rows(viewer).await?;
            return Ok(Dashboard::Recruiter(RecruiterDashboard::compute(
                &opportunities,
                &applications,
            )));
        }

        viewer.require_student()?;
        let applications: Vec<Application> = self
            .cache
            .get_or_fetch(&keys::student_applications(&viewer.user_id), || {
                self.applications.list_for_student(&viewer.user_id)
            })
            .await?;
        let certificates: Vec<Certificate> = self
            .cache
            .get_or_fetch(&keys::student_certificates(&viewer.user_id), || {
                self.certificates.list_for_student(&viewer.user_id)
            })
            .await?;
        Ok(Dashboard::Student(StudentDashboard::compute(
            &applications,
            certificates.len(),
        )))
    }

    /// Recruiter analytics over the configured trailing window
    pub async fn analytics(&self, viewer: &Viewer) -> MarketResult<Analytics> {
        viewer.require_recruiter()?;
        let (opportunities, applications) = self.recruiter_rows(viewer).await?;
        let analytics = Analytics::compute(
            &opportunities,
            &applications,
            Utc::now().date_naive(),
            self.config.analytics_days,
        );
        tracing::debug!(
            user_id = %viewer.user_id,
            applications = analytics.total_applications,
            "Analytics computed"
        );
        Ok(analytics)
    }

    async fn recruiter_rows(&self, viewer: &Viewer) -> MarketResult<(Vec<Opportunity>, Vec<Application>)> {
        let opportunities: Vec<Opportunity> = self
            .cache
            .get_or_fetch(&keys::recruiter_opportunities(&viewer.user_id), || {
                self.opportunities.list_by_recruiter(&viewer.user_id)
            })
            .await?;
        let ids: Vec<OpportunityId> = opportunities.iter().map(|o| o.id).collect();
        let applications: Vec<Application> = self
            .cache
            .get_or_fetch(&keys::recruiter_applications(&viewer.user_id), || async {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                self.applications.list_for_opportunities(&ids).await
            })
            .await?;
        Ok((opportunities, applications))
    }
}
