//! Application Use Cases
//!
//! Every lifecycle move is checked locally before a request is made:
//! the transition must exist and the viewer must be the party allowed to
//! make it.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::{ApplicationId, OpportunityId};
use platform::cache::QueryCache;

use crate::application::keys;
use crate::application::viewer::Viewer;
use crate::domain::entity::{Actor, Application, ApplicationStatus, NewApplication};
use crate::domain::repository::{ApplicationRepository, OpportunityRepository};
use crate::domain::value_object::CoverLetter;
use crate::domain::value_object::resume::is_owned_by;
use crate::error::{MarketError, MarketResult};

#[derive(Debug, Clone)]
pub struct ApplyInput {
    pub opportunity_id: OpportunityId,
    pub cover_letter: Option<String>,
    /// Key returned by a prior resume upload
    pub resume_path: Option<String>,
}

pub struct ApplicationUseCase<A, O>
where
    A: ApplicationRepository,
    O: OpportunityRepository,
{
    applications: Arc<A>,
    opportunities: Arc<O>,
    cache: Arc<QueryCache>,
}

impl<A, O> ApplicationUseCase<A, O>
where
    A: ApplicationRepository,
    O: OpportunityRepository,
{
    pub fn new(applications: Arc<A>, opportunities: Arc<O>, cache: Arc<QueryCache>) -> Self {
        Self {
            applications,
            opportunities,
            cache,
        }
    }

    pub async fn apply(&self, viewer: &Viewer, input: ApplyInput) -> MarketResult<Application> {
        viewer.require_student()?;
        let cover_letter = match input.cover_letter.as_deref() {
            Some(raw) => CoverLetter::parse(raw)?,
            None => None,
        };
        if let Some(path) = &input.resume_path {
            if !is_owned_by(path, &viewer.user_id) {
                return Err(MarketError::Forbidden("That resume belongs to someone else".into()));
            }
        }

        let opportunity = self
            .opportunities
            .find_by_id(&input.opportunity_id)
            .await?
            .ok_or(MarketError::NotFound("Opportunity"))?;
        if !opportunity.accepts_applications(Utc::now().date_naive()) {
            return Err(MarketError::OpportunityClosed);
        }
        if self
            .applications
            .find_existing(&viewer.user_id, &opportunity.id)
            .await?
            .is_some()
        {
            return Err(MarketError::AlreadyApplied);
        }

        let created = self
            .applications
            .create(&NewApplication {
                opportunity_id: opportunity.id,
                student_id: viewer.user_id,
                status: ApplicationStatus::Pending,
                cover_letter: cover_letter.map(CoverLetter::into_inner),
                resume_path: input.resume_path,
            })
            .await?;

        self.cache.invalidate_prefix(keys::APPLICATIONS);
        tracing::info!(
            application_id = %created.id,
            opportunity_id = %opportunity.id,
            student_id = %viewer.user_id,
            "Application submitted"
        );
        Ok(created)
    }

    /// The student's applications, newest first
    pub async fn list_mine(&self, viewer: &Viewer) -> MarketResult<Vec<Application>> {
        viewer.require_student()?;
        self.cache
            .get_or_fetch(&keys::student_applications(&viewer.user_id), || {
                self.applications.list_for_student(&viewer.user_id)
            })
            .await
    }

    /// Applications to any of the recruiter's postings
    pub async fn list_received(&self, viewer: &Viewer) -> MarketResult<Vec<Application>> {
        viewer.require_recruiter()?;
        self.cache
            .get_or_fetch(&keys::recruiter_applications(&viewer.user_id), || async {
                let ids: Vec<OpportunityId> = self
                    .opportunities
                    .list_by_recruiter(&viewer.user_id)
                    .await?
                    .into_iter()
                    .map(|o| o.id)
                    .collect();
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                self.applications.list_for_opportunities(&ids).await
            })
            .await
    }

    pub async fn withdraw(&self, viewer: &Viewer, id: &ApplicationId) -> MarketResult<Application> {
        viewer.require_student()?;
        self.change_status(viewer, id, ApplicationStatus::Withdrawn).await
    }

    /// Load an application and move it along its lifecycle
    pub async fn change_status(
        &self,
        viewer: &Viewer,
        id: &ApplicationId,
        next: ApplicationStatus,
    ) -> MarketResult<Application> {
        let application = self
            .applications
            .find_by_id(id)
            .await?
            .ok_or(MarketError::NotFound("Application"))?;
        self.transition(viewer, &application, next).await
    }

    /// Move an already loaded application along its lifecycle
    ///
    /// Moves outside the lifecycle fail before any request is made.
    pub async fn transition(
        &self,
        viewer: &Viewer,
        application: &Application,
        next: ApplicationStatus,
    ) -> MarketResult<Application> {
        let id = &application.id;
        let current = application.status;
        if !current.can_transition_to(next) {
            return Err(MarketError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        if !current.allows(next, viewer.actor()) {
            return Err(MarketError::Forbidden(format!(
                "You cannot mark this application as {}",
                next
            )));
        }
        self.ensure_party(viewer, application).await?;

        let updated = self.applications.update_status(id, next).await?;
        self.cache.invalidate_prefix(keys::APPLICATIONS);
        if next == ApplicationStatus::Completed {
            // A certificate is issued by the backend on completion
            self.cache.invalidate_prefix(keys::CERTIFICATES);
        }
        tracing::info!(
            application_id = %id,
            from = %current,
            to = %next,
            "Application status changed"
        );
        Ok(updated)
    }

    async fn ensure_party(&self, viewer: &Viewer, application: &Application) -> MarketResult<()> {
        if viewer.is_admin() {
            return Ok(());
        }
        let owns = match viewer.actor() {
            Actor::Student => application.student_id == viewer.user_id,
            Actor::Recruiter => self
                .opportunities
                .find_by_id(&application.opportunity_id)
                .await?
                .is_some_and(|o| o.recruiter_id == viewer.user_id),
        };
        if !owns {
            return Err(MarketError::Forbidden("This application is not yours".into()));
        }
        Ok(())
    }
}
