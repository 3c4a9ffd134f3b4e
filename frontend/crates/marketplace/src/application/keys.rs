//! Query Cache Keys
//!
//! Mutations invalidate by prefix, so every key of one resource starts with
//! that resource's name.

use kernel::id::{OpportunityId, UserId};

pub const OPPORTUNITIES: &str = "opportunities:";
pub const APPLICATIONS: &str = "applications:";
pub const CERTIFICATES: &str = "certificates:";

pub fn open_opportunities() -> String {
    format!("{}open", OPPORTUNITIES)
}

pub fn opportunity(id: &OpportunityId) -> String {
    format!("{}{}", OPPORTUNITIES, id)
}

pub fn recruiter_opportunities(recruiter_id: &UserId) -> String {
    format!("{}recruiter:{}", OPPORTUNITIES, recruiter_id)
}

pub fn student_applications(student_id: &UserId) -> String {
    format!("{}student:{}", APPLICATIONS, student_id)
}

pub fn recruiter_applications(recruiter_id: &UserId) -> String {
    format!("{}recruiter:{}", APPLICATIONS, recruiter_id)
}

pub fn student_certificates(student_id: &UserId) -> String {
    format!("{}student:{}", CERTIFICATES, student_id)
}
