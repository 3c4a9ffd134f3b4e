//! AI Matching Results
//!
//! Scores come from the matching functions; the client only orders and
//! trims them.

use kernel::id::{OpportunityId, UserId};
use serde::{Deserialize, Serialize};

/// An opportunity suggested to a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityMatch {
    #[serde(alias = "opportunity_id")]
    pub opportunity_id: OpportunityId,
    #[serde(default)]
    pub title: Option<String>,
    /// 0-100
    pub score: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// A student suggested for a recruiter's opportunity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMatch {
    #[serde(alias = "student_id", alias = "candidateId")]
    pub student_id: UserId,
    #[serde(default, alias = "full_name")]
    pub full_name: Option<String>,
    pub score: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default, alias = "matched_skills")]
    pub matched_skills: Vec<String>,
}

pub trait Scored {
    fn score(&self) -> f64;
}

impl Scored for OpportunityMatch {
    fn score(&self) -> f64 {
        self.score
    }
}

impl Scored for CandidateMatch {
    fn score(&self) -> f64 {
        self.score
    }
}

/// Best first, clamped to 0-100, at most `limit`, dropping non-finite scores
pub fn rank<T: Scored>(mut matches: Vec<T>, limit: usize) -> Vec<T> {
    matches.retain(|m| m.score().is_finite());
    matches.sort_by(|a, b| b.score().clamp(0.0, 100.0).total_cmp(&a.score().clamp(0.0, 100.0)));
    matches.truncate(limit);
    matches
}
