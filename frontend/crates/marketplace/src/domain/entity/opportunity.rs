//! Opportunity Entity
//!
//! A short, paid (or unpaid) project a recruiter posts for students.

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use kernel::id::{OpportunityId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    #[display("beginner")]
    Beginner,
    #[display("intermediate")]
    Intermediate,
    #[display("advanced")]
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    #[display("remote")]
    Remote,
    #[display("onsite")]
    Onsite,
    #[display("hybrid")]
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStatus {
    #[default]
    #[display("open")]
    Open,
    #[display("closed")]
    Closed,
    #[display("draft")]
    Draft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: OpportunityId,
    pub recruiter_id: UserId,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub duration_weeks: u32,
    pub level: ExperienceLevel,
    pub location_type: LocationType,
    /// Total payment in whole currency units
    #[serde(default)]
    pub stipend: Option<u32>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub status: OpportunityStatus,
    pub created_at: DateTime<Utc>,
}

impl Opportunity {
    /// Open and not past its deadline
    pub fn accepts_applications(&self, today: NaiveDate) -> bool {
        self.status == OpportunityStatus::Open
            && self.deadline.is_none_or(|deadline| deadline >= today)
    }

    pub fn is_paid(&self) -> bool {
        self.stipend.is_some_and(|amount| amount > 0)
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(skill.trim()))
    }
}

/// Fields a recruiter fills in to post an opportunity
#[derive(Debug, Clone, Serialize)]
pub struct NewOpportunity {
    pub recruiter_id: UserId,
    pub title: String,
    pub company: String,
    pub description: String,
    pub skills: Vec<String>,
    pub duration_weeks: u32,
    pub level: ExperienceLevel,
    pub location_type: LocationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stipend: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    pub status: OpportunityStatus,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use serde_json::json;

    pub(crate) fn opportunity(title: &str, skills: &[&str]) -> Opportunity {
        serde_json::from_value(json!({
            "id": OpportunityId::new(),
            "recruiter_id": UserId::new(),
            "title": title,
            "company": "Acme",
            "description": format!("{} for a small team", title),
            "skills": skills,
            "duration_weeks": 4,
            "level": "beginner",
            "location_type": "remote",
            "created_at": "2025-04-01T09:00:00Z"
        }))
        .unwrap()
    }
}
