pub mod application;
pub mod certificate;
pub mod conversation;
pub mod opportunity;

pub use application::{Actor, Application, ApplicationStatus, NewApplication};
pub use certificate::Certificate;
pub use conversation::{Conversation, Message, NewMessage, merge_messages};
pub use opportunity::{
    ExperienceLevel, LocationType, NewOpportunity, Opportunity, OpportunityStatus,
};
