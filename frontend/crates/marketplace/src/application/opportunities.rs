//! Opportunity Use Cases
//!
//! Browsing reads through the query cache and filters locally; posting and
//! closing invalidate every cached opportunity list.

use std::sync::Arc;

use kernel::id::OpportunityId;
use platform::cache::QueryCache;

use crate::application::keys;
use crate::application::viewer::Viewer;
use crate::domain::entity::{
    ExperienceLevel, LocationType, NewOpportunity, Opportunity, OpportunityStatus,
};
use crate::domain::filter::{OpportunityFilter, filter_opportunities};
use crate::domain::repository::OpportunityRepository;
use crate::error::{MarketError, MarketResult};

const TITLE_MAX_CHARS: usize = 120;
const MAX_DURATION_WEEKS: u32 = 26;

/// Posting form
#[derive(Debug, Clone)]
pub struct PostOpportunityInput {
    pub title: String,
    pub company: String,
    pub description: String,
    pub skills: Vec<String>,
    pub duration_weeks: u32,
    pub level: ExperienceLevel,
    pub location_type: LocationType,
    pub stipend: Option<u32>,
    pub deadline: Option<chrono::NaiveDate>,
    /// Save as draft instead of publishing
    pub draft: bool,
}

pub struct OpportunityUseCase<R>
where
    R: OpportunityRepository,
{
    repo: Arc<R>,
    cache: Arc<QueryCache>,
}

impl<R> OpportunityUseCase<R>
where
    R: OpportunityRepository,
{
    pub fn new(repo: Arc<R>, cache: Arc<QueryCache>) -> Self {
        Self { repo, cache }
    }

    /// Open postings narrowed by `filter`
    pub async fn browse(&self, filter: &OpportunityFilter) -> MarketResult<Vec<Opportunity>> {
        let all: Vec<Opportunity> = self
            .cache
            .get_or_fetch(&keys::open_opportunities(), || self.repo.list_open())
            .await?;
        let matching = filter_opportunities(&all, filter);
        tracing::debug!(total = all.len(), shown = matching.len(), "Opportunities filtered");
        Ok(matching)
    }

    pub async fn get(&self, id: &OpportunityId) -> MarketResult<Opportunity> {
        let found: Option<Opportunity> = self
            .cache
            .get_or_fetch(&keys::opportunity(id), || self.repo.find_by_id(id))
            .await?;
        found.ok_or(MarketError::NotFound("Opportunity"))
    }

    /// The recruiter's own postings, drafts included
    pub async fn list_mine(&self, viewer: &Viewer) -> MarketResult<Vec<Opportunity>> {
        viewer.require_recruiter()?;
        self.cache
            .get_or_fetch(&keys::recruiter_opportunities(&viewer.user_id), || {
                self.repo.list_by_recruiter(&viewer.user_id)
            })
            .await
    }

    pub async fn post(&self, viewer: &Viewer, input: PostOpportunityInput) -> MarketResult<Opportunity> {
        viewer.require_recruiter()?;
        let new = validate_posting(viewer, input)?;
        let created = self.repo.create(&new).await?;
        self.cache.invalidate_prefix(keys::OPPORTUNITIES);
        tracing::info!(
            opportunity_id = %created.id,
            recruiter_id = %viewer.user_id,
            status = %created.status,
            "Opportunity posted"
        );
        Ok(created)
    }

    /// Stop accepting applications
    pub async fn close(&self, viewer: &Viewer, id: &OpportunityId) -> MarketResult<Opportunity> {
        viewer.require_recruiter()?;
        let opportunity = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(MarketError::NotFound("Opportunity"))?;
        if opportunity.recruiter_id != viewer.user_id && !viewer.is_admin() {
            return Err(MarketError::Forbidden(
                "You can only close your own opportunities".into(),
            ));
        }
        if opportunity.status == OpportunityStatus::Closed {
            return Ok(opportunity);
        }

        let closed = self.repo.set_status(id, OpportunityStatus::Closed).await?;
        self.cache.invalidate_prefix(keys::OPPORTUNITIES);
        tracing::info!(opportunity_id = %id, "Opportunity closed");
        Ok(closed)
    }
}

fn validate_posting(viewer: &Viewer, input: PostOpportunityInput) -> MarketResult<NewOpportunity> {
    let title = input.title.trim().to_string();
    if title.is_empty() || title.chars().count() > TITLE_MAX_CHARS {
        return Err(MarketError::Validation(format!(
            "Title must be 1 to {} characters",
            TITLE_MAX_CHARS
        )));
    }
    let company = input.company.trim().to_string();
    if company.is_empty() {
        return Err(MarketError::Validation("Company is required".into()));
    }
    if !(1..=MAX_DURATION_WEEKS).contains(&input.duration_weeks) {
        return Err(MarketError::Validation(format!(
            "Duration must be between 1 and {} weeks",
            MAX_DURATION_WEEKS
        )));
    }

    let mut skills: Vec<String> = Vec::new();
    for skill in input.skills.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if !skills.iter().any(|known| known.eq_ignore_ascii_case(skill)) {
            skills.push(skill.to_string());
        }
    }

    Ok(NewOpportunity {
        recruiter_id: viewer.user_id,
        title,
        company,
        description: input.description.trim().to_string(),
        skills,
        duration_weeks: input.duration_weeks,
        level: input.level,
        location_type: input.location_type,
        stipend: input.stipend.filter(|amount| *amount > 0),
        deadline: input.deadline,
        status: if input.draft {
            OpportunityStatus::Draft
        } else {
            OpportunityStatus::Open
        },
    })
}
