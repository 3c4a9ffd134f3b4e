//! Marketplace Module
//!
//! Clean Architecture structure:
//! - `domain/` - Opportunities, applications, messaging, certificates, filters, stats
//! - `application/` - Use cases for students and recruiters, query cache keys
//! - `infra/` - Repository implementations over the hosted backend
//!
//! ## Features
//! - Browse and filter open opportunities; recruiters post and close them
//! - Apply with a cover letter and PDF resume; withdraw; review pipeline
//! - Per-application conversations with live updates
//! - Role-specific dashboards, recruiter analytics, AI matching
//! - Completion certificates
//!
//! ## Access Model
//! - Role and ownership are checked before any request is made
//! - Lifecycle moves outside the application state machine never reach the backend
//! - Resumes live under the owner's folder in a private bucket

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::config::MarketConfig;
pub use application::viewer::Viewer;
pub use error::{MarketError, MarketResult};
pub use infra::rest::BaasMarketGateway;

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::filter::OpportunityFilter;
    pub use crate::domain::matching::{CandidateMatch, OpportunityMatch};
    pub use crate::domain::stats::*;
    pub use crate::domain::value_object::*;
}

pub mod use_cases {
    pub use crate::application::*;
}

#[cfg(test)]
mod tests;
