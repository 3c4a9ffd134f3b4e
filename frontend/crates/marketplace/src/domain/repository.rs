//! Repository Traits
//!
//! Interfaces to the marketplace tables, the resume bucket and the
//! matching functions. Implementation is in the infra layer.

use kernel::id::{ApplicationId, ConversationId, OpportunityId, UserId};

use crate::domain::entity::{
    Application, ApplicationStatus, Certificate, Conversation, Message, NewApplication,
    NewMessage, NewOpportunity, Opportunity, OpportunityStatus,
};
use crate::domain::matching::{CandidateMatch, OpportunityMatch};
use crate::error::MarketResult;

/// `opportunities` table
#[trait_variant::make(OpportunityRepository: Send)]
pub trait LocalOpportunityRepository {
    /// Open postings, newest first
    async fn list_open(&self) -> MarketResult<Vec<Opportunity>>;

    /// Every posting of one recruiter, drafts included
    async fn list_by_recruiter(&self, recruiter_id: &UserId) -> MarketResult<Vec<Opportunity>>;

    async fn find_by_id(&self, id: &OpportunityId) -> MarketResult<Option<Opportunity>>;

    async fn create(&self, opportunity: &NewOpportunity) -> MarketResult<Opportunity>;

    async fn set_status(
        &self,
        id: &OpportunityId,
        status: OpportunityStatus,
    ) -> MarketResult<Opportunity>;
}

/// `applications` table
#[trait_variant::make(ApplicationRepository: Send)]
pub trait LocalApplicationRepository {
    /// A student's applications with the opportunity joined
    async fn list_for_student(&self, student_id: &UserId) -> MarketResult<Vec<Application>>;

    async fn list_for_opportunities(
        &self,
        opportunity_ids: &[OpportunityId],
    ) -> MarketResult<Vec<Application>>;

    async fn find_by_id(&self, id: &ApplicationId) -> MarketResult<Option<Application>>;

    async fn find_existing(
        &self,
        student_id: &UserId,
        opportunity_id: &OpportunityId,
    ) -> MarketResult<Option<Application>>;

    async fn create(&self, application: &NewApplication) -> MarketResult<Application>;

    async fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> MarketResult<Application>;
}

/// Resume bucket
#[trait_variant::make(ResumeStorage: Send)]
pub trait LocalResumeStorage {
    /// Store the file and return its path inside the bucket
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> MarketResult<String>;

    async fn remove(&self, path: &str) -> MarketResult<()>;

    /// Time-limited download link
    async fn signed_url(&self, path: &str, expires_in_secs: u64) -> MarketResult<String>;
}

/// `conversations` and `messages` tables
#[trait_variant::make(ConversationRepository: Send)]
pub trait LocalConversationRepository {
    async fn list_for_user(&self, user_id: &UserId) -> MarketResult<Vec<Conversation>>;

    async fn find_by_id(&self, id: &ConversationId) -> MarketResult<Option<Conversation>>;

    /// Oldest first
    async fn messages(&self, conversation_id: &ConversationId) -> MarketResult<Vec<Message>>;

    async fn send(&self, message: &NewMessage) -> MarketResult<Message>;

    /// Stamp `read_at` on messages the reader received
    async fn mark_read(&self, conversation_id: &ConversationId, reader: &UserId) -> MarketResult<()>;
}

/// `certificates` table
#[trait_variant::make(CertificateRepository: Send)]
pub trait LocalCertificateRepository {
    async fn list_for_student(&self, student_id: &UserId) -> MarketResult<Vec<Certificate>>;
}

/// Matching functions
#[trait_variant::make(MatchingService: Send)]
pub trait LocalMatchingService {
    async fn match_opportunities(&self, student_id: &UserId) -> MarketResult<Vec<OpportunityMatch>>;

    async fn match_candidates(
        &self,
        opportunity_id: &OpportunityId,
    ) -> MarketResult<Vec<CandidateMatch>>;
}
