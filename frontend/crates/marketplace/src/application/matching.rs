//! AI Matching Use Case

use std::sync::Arc;

use kernel::id::OpportunityId;

use crate::application::config::MarketConfig;
use crate::application::viewer::Viewer;
use crate::domain::matching::{CandidateMatch, OpportunityMatch, rank};
use crate::domain::repository::{MatchingService, OpportunityRepository};
use crate::error::{MarketError, MarketResult};

pub struct MatchingUseCase<M, O>
where
    M: MatchingService,
    O: OpportunityRepository,
{
    matcher: Arc<M>,
    opportunities: Arc<O>,
    config: Arc<MarketConfig>,
}

impl<M, O> MatchingUseCase<M, O>
where
    M: MatchingService,
    O: OpportunityRepository,
{
    pub fn new(matcher: Arc<M>, opportunities: Arc<O>, config: Arc<MarketConfig>) -> Self {
        Self {
            matcher,
            opportunities,
            config,
        }
    }

    /// Best opportunities for the signed-in student
    pub async fn for_student(&self, viewer: &Viewer) -> MarketResult<Vec<OpportunityMatch>> {
        viewer.require_student()?;
        let matches = self.matcher.match_opportunities(&viewer.user_id).await?;
        tracing::debug!(user_id = %viewer.user_id, found = matches.len(), "Opportunity matches");
        Ok(rank(matches, self.config.match_limit))
    }

    /// Best candidates for one of the recruiter's opportunities
    pub async fn for_opportunity(
        &self,
        viewer: &Viewer,
        id: &OpportunityId,
    ) -> MarketResult<Vec<CandidateMatch>> {
        viewer.require_recruiter()?;
        let opportunity = self
            .opportunities
            .find_by_id(id)
            .await?
            .ok_or(MarketError::NotFound("Opportunity"))?;
        if opportunity.recruiter_id != viewer.user_id && !viewer.is_admin() {
            return Err(MarketError::Forbidden(
                "You can only match candidates for your own opportunities".into(),
            ));
        }
        let matches = self.matcher.match_candidates(id).await?;
        tracing::debug!(opportunity_id = %id, found = matches.len(), "Candidate matches");
        Ok(rank(matches, self.config.match_limit))
    }
}
