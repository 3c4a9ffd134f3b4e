//! Application Entity
//!
//! ```text
//!   pending ──▶ accepted ──▶ in_progress ──▶ completed
//!      │           │              │
//!      ├──▶ rejected              │
//!      └───────────┴──────────────┴──▶ withdrawn (student)
//! ```

use chrono::{DateTime, Utc};
use derive_more::Display;
use kernel::id::{ApplicationId, OpportunityId, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::entity::Opportunity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    #[display("pending")]
    Pending,
    #[display("accepted")]
    Accepted,
    #[display("rejected")]
    Rejected,
    #[display("in_progress")]
    InProgress,
    #[display("completed")]
    Completed,
    #[display("withdrawn")]
    Withdrawn,
}

/// Who is asking for a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Student,
    Recruiter,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::InProgress,
        ApplicationStatus::Completed,
        ApplicationStatus::Withdrawn,
    ];

    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Rejected | ApplicationStatus::Completed | ApplicationStatus::Withdrawn
        )
    }

    /// Still occupying the student (counts toward "active" on dashboards)
    pub const fn is_active(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Pending | ApplicationStatus::Accepted | ApplicationStatus::InProgress
        )
    }

    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Rejected)
                | (Accepted, InProgress)
                | (InProgress, Completed)
                | (Pending | Accepted | InProgress, Withdrawn)
        )
    }

    /// Whether `actor` may request this move
    pub fn allows(&self, next: ApplicationStatus, actor: Actor) -> bool {
        if !self.can_transition_to(next) {
            return false;
        }
        match next {
            ApplicationStatus::Withdrawn => actor == Actor::Student,
            _ => actor == Actor::Recruiter,
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.to_string() == wanted)
            .ok_or_else(|| format!("Unknown application status: {}", s.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub opportunity_id: OpportunityId,
    pub student_id: UserId,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub cover_letter: Option<String>,
    /// Storage key in the resume bucket
    #[serde(default)]
    pub resume_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Joined row, present when selected with `opportunities(*)`
    #[serde(default, rename = "opportunities", alias = "opportunity")]
    pub opportunity: Option<Opportunity>,
}

/// Row inserted when a student applies
#[derive(Debug, Clone, Serialize)]
pub struct NewApplication {
    pub opportunity_id: OpportunityId,
    pub student_id: UserId,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_path: Option<String>,
}
