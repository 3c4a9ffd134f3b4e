//! Domain Layer
//!
//! Marketplace entities, input value objects, filtering, aggregates and the
//! repository traits the application layer depends on.

pub mod entity;
pub mod filter;
pub mod matching;
pub mod repository;
pub mod stats;
pub mod value_object;

// Re-exports
pub use filter::{OpportunityFilter, filter_opportunities};
pub use matching::{CandidateMatch, OpportunityMatch, rank};
pub use repository::{
    ApplicationRepository, CertificateRepository, ConversationRepository, MatchingService,
    OpportunityRepository, ResumeStorage,
};
pub use stats::{Analytics, OpportunityStats, RecruiterDashboard, StudentDashboard};
