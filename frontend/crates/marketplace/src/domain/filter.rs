//! Client-side Opportunity Filtering
//!
//! Applied to the cached list so that narrowing the view never costs a
//! request. Criteria combine with AND; an unset criterion matches
//! everything. The input order is preserved.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::entity::{ExperienceLevel, LocationType, Opportunity};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunityFilter {
    /// Case-insensitive substring of title, company, description or a skill
    pub search: Option<String>,
    /// Every listed skill must be present
    pub skills: Vec<String>,
    pub level: Option<ExperienceLevel>,
    pub location_type: Option<LocationType>,
    pub min_weeks: Option<u32>,
    pub max_weeks: Option<u32>,
    pub paid_only: bool,
    /// Hide closed, draft and past-deadline postings as of this day
    pub open_on: Option<NaiveDate>,
}

impl OpportunityFilter {
    pub fn is_empty(&self) -> bool {
        self.search_term().is_none()
            && self.skills.iter().all(|s| s.trim().is_empty())
            && self.level.is_none()
            && self.location_type.is_none()
            && self.min_weeks.is_none()
            && self.max_weeks.is_none()
            && !self.paid_only
            && self.open_on.is_none()
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, opportunity: &Opportunity) -> bool {
        if let Some(term) = self.search_term() {
            let hit = opportunity.title.to_lowercase().contains(&term)
                || opportunity.company.to_lowercase().contains(&term)
                || opportunity.description.to_lowercase().contains(&term)
                || opportunity
                    .skills
                    .iter()
                    .any(|skill| skill.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }

        let skills_ok = self
            .skills
            .iter()
            .filter(|skill| !skill.trim().is_empty())
            .all(|skill| opportunity.has_skill(skill));

        skills_ok
            && self.level.is_none_or(|level| opportunity.level == level)
            && self
                .location_type
                .is_none_or(|location| opportunity.location_type == location)
            && self
                .min_weeks
                .is_none_or(|min| opportunity.duration_weeks >= min)
            && self
                .max_weeks
                .is_none_or(|max| opportunity.duration_weeks <= max)
            && (!self.paid_only || opportunity.is_paid())
            && self
                .open_on
                .is_none_or(|today| opportunity.accepts_applications(today))
    }
}

pub fn filter_opportunities(
    opportunities: &[Opportunity],
    filter: &OpportunityFilter,
) -> Vec<Opportunity> {
    if filter.is_empty() {
        return opportunities.to_vec();
    }
    opportunities
        .iter()
        .filter(|opportunity| filter.matches(opportunity))
        .cloned()
        .collect()
}
