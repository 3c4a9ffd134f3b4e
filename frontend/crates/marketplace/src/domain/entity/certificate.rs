//! Completion Certificate
//!
//! Issued by the backend when an application reaches `completed`.

use chrono::{DateTime, Utc};
use kernel::id::{ApplicationId, CertificateId, OpportunityId, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::entity::Opportunity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub application_id: ApplicationId,
    pub student_id: UserId,
    pub opportunity_id: OpportunityId,
    pub issued_at: DateTime<Utc>,
    /// Public verification page, once rendered
    #[serde(default)]
    pub certificate_url: Option<String>,
    #[serde(default, rename = "opportunities", alias = "opportunity")]
    pub opportunity: Option<Opportunity>,
}

impl Certificate {
    /// "Title at Company", or the opportunity id when the join is missing
    pub fn headline(&self) -> String {
        match &self.opportunity {
            Some(opp) => format!("{} at {}", opp.title, opp.company),
            None => self.opportunity_id.to_string(),
        }
    }
}
