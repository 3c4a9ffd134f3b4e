//! Backend Gateway
//!
//! Implements the marketplace repositories over [`BaasClient`]. Row level
//! security on the backend decides what each query may return; these
//! queries only narrow it down.

use baas::functions::names;
use baas::{BaasClient, Order, Query};
use chrono::Utc;
use kernel::id::{ApplicationId, ConversationId, OpportunityId, UserId};
use serde::Serialize;
use serde_json::json;

use crate::domain::entity::{
    Application, ApplicationStatus, Certificate, Conversation, Message, NewApplication,
    NewMessage, NewOpportunity, Opportunity, OpportunityStatus,
};
use crate::domain::matching::{CandidateMatch, OpportunityMatch};
use crate::domain::repository::{
    ApplicationRepository, CertificateRepository, ConversationRepository, MatchingService,
    OpportunityRepository, ResumeStorage,
};
use crate::domain::value_object::resume::{RESUME_BUCKET, RESUME_CONTENT_TYPE};
use crate::error::{MarketError, MarketResult};

const OPPORTUNITIES: &str = "opportunities";
const APPLICATIONS: &str = "applications";
const CONVERSATIONS: &str = "conversations";
const MESSAGES: &str = "messages";
const CERTIFICATES: &str = "certificates";

/// Applications come back with their opportunity embedded
const APPLICATION_COLUMNS: &str = "*,opportunities(*)";
const CERTIFICATE_COLUMNS: &str = "*,opportunities(*)";

#[derive(Clone)]
pub struct BaasMarketGateway {
    client: BaasClient,
}

impl BaasMarketGateway {
    pub fn new(client: BaasClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &BaasClient {
        &self.client
    }

    /// First row of a write that returns the representation
    fn first<T>(rows: Vec<T>, what: &'static str) -> MarketResult<T> {
        rows.into_iter().next().ok_or(MarketError::NotFound(what))
    }
}

impl OpportunityRepository for BaasMarketGateway {
    async fn list_open(&self) -> MarketResult<Vec<Opportunity>> {
        let query = Query::table(OPPORTUNITIES)
            .eq("status", OpportunityStatus::Open)
            .order("created_at", Order::Desc);
        Ok(self.client.select(&query).await?)
    }

    async fn list_by_recruiter(&self, recruiter_id: &UserId) -> MarketResult<Vec<Opportunity>> {
        let query = Query::table(OPPORTUNITIES)
            .eq("recruiter_id", recruiter_id)
            .order("created_at", Order::Desc);
        Ok(self.client.select(&query).await?)
    }

    async fn find_by_id(&self, id: &OpportunityId) -> MarketResult<Option<Opportunity>> {
        let query = Query::table(OPPORTUNITIES).eq("id", id);
        Ok(self.client.select_maybe(&query).await?)
    }

    async fn create(&self, opportunity: &NewOpportunity) -> MarketResult<Opportunity> {
        Ok(self.client.insert(OPPORTUNITIES, opportunity).await?)
    }

    async fn set_status(
        &self,
        id: &OpportunityId,
        status: OpportunityStatus,
    ) -> MarketResult<Opportunity> {
        let query = Query::table(OPPORTUNITIES).eq("id", id);
        let rows = self.client.update(&query, &json!({ "status": status })).await?;
        Self::first(rows, "Opportunity")
    }
}

#[derive(Serialize)]
struct StatusPatch {
    status: ApplicationStatus,
    updated_at: String,
}

impl ApplicationRepository for BaasMarketGateway {
    async fn list_for_student(&self, student_id: &UserId) -> MarketResult<Vec<Application>> {
        let query = Query::table(APPLICATIONS)
            .select(APPLICATION_COLUMNS)
            .eq("student_id", student_id)
            .order("created_at", Order::Desc);
        Ok(self.client.select(&query).await?)
    }

    async fn list_for_opportunities(
        &self,
        opportunity_ids: &[OpportunityId],
    ) -> MarketResult<Vec<Application>> {
        let query = Query::table(APPLICATIONS)
            .select(APPLICATION_COLUMNS)
            .is_in("opportunity_id", opportunity_ids)
            .order("created_at", Order::Desc);
        Ok(self.client.select(&query).await?)
    }

    async fn find_by_id(&self, id: &ApplicationId) -> MarketResult<Option<Application>> {
        let query = Query::table(APPLICATIONS)
            .select(APPLICATION_COLUMNS)
            .eq("id", id);
        Ok(self.client.select_maybe(&query).await?)
    }

    async fn find_existing(
        &self,
        student_id: &UserId,
        opportunity_id: &OpportunityId,
    ) -> MarketResult<Option<Application>> {
        let query = Query::table(APPLICATIONS)
            .eq("student_id", student_id)
            .eq("opportunity_id", opportunity_id)
            .limit(1);
        let rows: Vec<Application> = self.client.select(&query).await?;
        Ok(rows.into_iter().next())
    }

    async fn create(&self, application: &NewApplication) -> MarketResult<Application> {
        Ok(self.client.insert(APPLICATIONS, application).await?)
    }

    async fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> MarketResult<Application> {
        let query = Query::table(APPLICATIONS).eq("id", id);
        let patch = StatusPatch {
            status,
            updated_at: Utc::now().to_rfc3339(),
        };
        let rows = self.client.update(&query, &patch).await?;
        Self::first(rows, "Application")
    }
}

impl ResumeStorage for BaasMarketGateway {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> MarketResult<String> {
        let key = self
            .client
            .storage(RESUME_BUCKET)
            .upload(path, bytes, RESUME_CONTENT_TYPE, false)
            .await?;
        tracing::debug!(key = %key, "Resume stored");
        Ok(path.to_string())
    }

    async fn remove(&self, path: &str) -> MarketResult<()> {
        self.client
            .storage(RESUME_BUCKET)
            .remove(&[path.to_string()])
            .await?;
        Ok(())
    }

    async fn signed_url(&self, path: &str, expires_in_secs: u64) -> MarketResult<String> {
        let url = self
            .client
            .storage(RESUME_BUCKET)
            .create_signed_url(path, expires_in_secs)
            .await?;
        Ok(url.to_string())
    }
}

impl ConversationRepository for BaasMarketGateway {
    async fn list_for_user(&self, user_id: &UserId) -> MarketResult<Vec<Conversation>> {
        let as_student = Query::table(CONVERSATIONS).eq("student_id", user_id);
        let as_recruiter = Query::table(CONVERSATIONS).eq("recruiter_id", user_id);
        let mut conversations: Vec<Conversation> = self.client.select(&as_student).await?;
        let more: Vec<Conversation> = self.client.select(&as_recruiter).await?;
        for conversation in more {
            if !conversations.iter().any(|c| c.id == conversation.id) {
                conversations.push(conversation);
            }
        }
        Ok(conversations)
    }

    async fn find_by_id(&self, id: &ConversationId) -> MarketResult<Option<Conversation>> {
        let query = Query::table(CONVERSATIONS).eq("id", id);
        Ok(self.client.select_maybe(&query).await?)
    }

    async fn messages(&self, conversation_id: &ConversationId) -> MarketResult<Vec<Message>> {
        let query = Query::table(MESSAGES)
            .eq("conversation_id", conversation_id)
            .order("created_at", Order::Asc);
        Ok(self.client.select(&query).await?)
    }

    async fn send(&self, message: &NewMessage) -> MarketResult<Message> {
        let sent: Message = self.client.insert(MESSAGES, message).await?;
        let touch = Query::table(CONVERSATIONS).eq("id", message.conversation_id);
        let stamped: Result<Vec<Conversation>, _> = self
            .client
            .update(&touch, &json!({ "last_message_at": sent.created_at }))
            .await;
        if let Err(e) = stamped {
            tracing::warn!(conversation_id = %message.conversation_id, error = %e, "Failed to stamp conversation");
        }
        Ok(sent)
    }

    async fn mark_read(&self, conversation_id: &ConversationId, reader: &UserId) -> MarketResult<()> {
        let query = Query::table(MESSAGES)
            .eq("conversation_id", conversation_id)
            .neq("sender_id", reader)
            .is_null("read_at");
        let _: Vec<Message> = self
            .client
            .update(&query, &json!({ "read_at": Utc::now() }))
            .await?;
        Ok(())
    }
}

impl CertificateRepository for BaasMarketGateway {
    async fn list_for_student(&self, student_id: &UserId) -> MarketResult<Vec<Certificate>> {
        let query = Query::table(CERTIFICATES)
            .select(CERTIFICATE_COLUMNS)
            .eq("student_id", student_id)
            .order("issued_at", Order::Desc);
        Ok(self.client.select(&query).await?)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StudentBody<'a> {
    student_id: &'a UserId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OpportunityBody<'a> {
    opportunity_id: &'a OpportunityId,
}

impl MatchingService for BaasMarketGateway {
    async fn match_opportunities(&self, student_id: &UserId) -> MarketResult<Vec<OpportunityMatch>> {
        let body = StudentBody { student_id };
        Ok(self.client.invoke(names::MATCH_OPPORTUNITIES, &body).await?)
    }

    async fn match_candidates(
        &self,
        opportunity_id: &OpportunityId,
    ) -> MarketResult<Vec<CandidateMatch>> {
        let body = OpportunityBody { opportunity_id };
        Ok(self.client.invoke(names::MATCH_CANDIDATES, &body).await?)
    }
}
