//! Application Layer
//!
//! Use cases over the marketplace repositories. Each takes the signed-in
//! [`Viewer`] and checks role and ownership before touching the backend.

pub mod applications;
pub mod certificates;
pub mod config;
pub mod dashboard;
pub mod keys;
pub mod matching;
pub mod messaging;
pub mod opportunities;
pub mod resume;
pub mod viewer;

// Re-exports
pub use applications::{ApplicationUseCase, ApplyInput};
pub use certificates::CertificateUseCase;
pub use config::MarketConfig;
pub use dashboard::{Dashboard, DashboardUseCase};
pub use matching::MatchingUseCase;
pub use messaging::{ConversationSummary, ConversationWatch, MessagingUseCase};
pub use opportunities::{OpportunityUseCase, PostOpportunityInput};
pub use resume::ResumeUseCase;
pub use viewer::Viewer;
