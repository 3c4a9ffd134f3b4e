//! Cross-layer tests for the marketplace crate
//! Use cases run against an in-memory backend.

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use baas::{BaasResult, ColumnFilter, RowSource};
    use chrono::{DateTime, Utc};
    use kernel::id::{ApplicationId, ConversationId, MessageId, OpportunityId, UserId};
    use serde_json::Value;

    use crate::domain::entity::{
        Application, ApplicationStatus, Certificate, Conversation, Message, NewApplication,
        NewMessage, NewOpportunity, Opportunity, OpportunityStatus,
    };
    use crate::domain::matching::{CandidateMatch, OpportunityMatch};
    use crate::domain::repository::{
        ApplicationRepository, CertificateRepository, ConversationRepository, MatchingService,
        OpportunityRepository, ResumeStorage,
    };
    use crate::error::{MarketError, MarketResult};

    pub(crate) const COVER_LETTER: &str =
        "I have shipped two small Rust services and would love to learn from your team.";

    #[derive(Default)]
    pub(crate) struct FakeMarket {
        pub opportunities: Mutex<Vec<Opportunity>>,
        pub applications: Mutex<Vec<Application>>,
        pub conversations: Mutex<Vec<Conversation>>,
        pub messages: Mutex<Vec<Message>>,
        pub certificates: Mutex<Vec<Certificate>>,
        pub files: Mutex<Vec<String>>,
        pub opportunity_matches: Mutex<Vec<OpportunityMatch>>,
        pub list_open_calls: AtomicUsize,
        pub status_updates: AtomicUsize,
        pub marked_read: AtomicUsize,
    }

    impl FakeMarket {
        pub(crate) fn add_opportunity(&self, opportunity: Opportunity) -> Opportunity {
            self.opportunities.lock().unwrap().push(opportunity.clone());
            opportunity
        }

        pub(crate) fn add_conversation(&self, student_id: UserId, recruiter_id: UserId) -> Conversation {
            let conversation = Conversation {
                id: ConversationId::new(),
                application_id: ApplicationId::new(),
                student_id,
                recruiter_id,
                created_at: Utc::now(),
                last_message_at: None,
            };
            self.conversations.lock().unwrap().push(conversation.clone());
            conversation
        }

        pub(crate) fn add_message(&self, conversation: &Conversation, sender_id: UserId, at: DateTime<Utc>) -> Message {
            let message = Message {
                id: MessageId::new(),
                conversation_id: conversation.id,
                sender_id,
                content: "hello".into(),
                created_at: at,
                read_at: None,
            };
            self.messages.lock().unwrap().push(message.clone());
            message
        }

        pub(crate) fn status_updates(&self) -> usize {
            self.status_updates.load(Ordering::SeqCst)
        }
    }

    impl OpportunityRepository for FakeMarket {
        async fn list_open(&self) -> MarketResult<Vec<Opportunity>> {
            self.list_open_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .opportunities
                .lock()
                .unwrap()
                .iter()
                .filter(|o| o.status == OpportunityStatus::Open)
                .cloned()
                .collect())
        }

        async fn list_by_recruiter(&self, recruiter_id: &UserId) -> MarketResult<Vec<Opportunity>> {
            Ok(self
                .opportunities
                .lock()
                .unwrap()
                .iter()
                .filter(|o| o.recruiter_id == *recruiter_id)
                .cloned()
                .collect())
        }

        async fn find_by_id(&self, id: &OpportunityId) -> MarketResult<Option<Opportunity>> {
            Ok(self
                .opportunities
                .lock()
                .unwrap()
                .iter()
                .find(|o| o.id == *id)
                .cloned())
        }

        async fn create(&self, new: &NewOpportunity) -> MarketResult<Opportunity> {
            let opportunity = Opportunity {
                id: OpportunityId::new(),
                recruiter_id: new.recruiter_id,
                title: new.title.clone(),
                company: new.company.clone(),
                description: new.description.clone(),
                skills: new.skills.clone(),
                duration_weeks: new.duration_weeks,
                level: new.level,
                location_type: new.location_type,
                stipend: new.stipend,
                deadline: new.deadline,
                status: new.status,
                created_at: Utc::now(),
            };
            Ok(self.add_opportunity(opportunity))
        }

        async fn set_status(
            &self,
            id: &OpportunityId,
            status: OpportunityStatus,
        ) -> MarketResult<Opportunity> {
            let mut rows = self.opportunities.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|o| o.id == *id)
                .ok_or(MarketError::NotFound("Opportunity"))?;
            row.status = status;
            Ok(row.clone())
        }
    }

    impl ApplicationRepository for FakeMarket {
        async fn list_for_student(&self, student_id: &UserId) -> MarketResult<Vec<Application>> {
            Ok(self
                .applications
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.student_id == *student_id)
                .cloned()
                .collect())
        }

        async fn list_for_opportunities(
            &self,
            opportunity_ids: &[OpportunityId],
        ) -> MarketResult<Vec<Application>> {
            Ok(self
                .applications
                .lock()
                .unwrap()
                .iter()
                .filter(|a| opportunity_ids.contains(&a.opportunity_id))
                .cloned()
                .collect())
        }

        async fn find_by_id(&self, id: &ApplicationId) -> MarketResult<Option<Application>> {
            Ok(self
                .applications
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == *id)
                .cloned())
        }

        async fn find_existing(
            &self,
            student_id: &UserId,
            opportunity_id: &OpportunityId,
        ) -> MarketResult<Option<Application>> {
            Ok(self
                .applications
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.student_id == *student_id && a.opportunity_id == *opportunity_id)
                .cloned())
        }

        async fn create(&self, new: &NewApplication) -> MarketResult<Application> {
            let now = Utc::now();
            let application = Application {
                id: ApplicationId::new(),
                opportunity_id: new.opportunity_id,
                student_id: new.student_id,
                status: new.status,
                cover_letter: new.cover_letter.clone(),
                resume_path: new.resume_path.clone(),
                created_at: now,
                updated_at: now,
                opportunity: None,
            };
            self.applications.lock().unwrap().push(application.clone());
            Ok(application)
        }

        async fn update_status(
            &self,
            id: &ApplicationId,
            status: ApplicationStatus,
        ) -> MarketResult<Application> {
            self.status_updates.fetch_add(1, Ordering::SeqCst);
            let mut rows = self.applications.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|a| a.id == *id)
                .ok_or(MarketError::NotFound("Application"))?;
            row.status = status;
            row.updated_at = Utc::now();
            Ok(row.clone())
        }
    }

    impl ResumeStorage for FakeMarket {
        async fn upload(&self, path: &str, _bytes: Vec<u8>) -> MarketResult<String> {
            self.files.lock().unwrap().push(path.to_string());
            Ok(path.to_string())
        }

        async fn remove(&self, path: &str) -> MarketResult<()> {
            self.files.lock().unwrap().retain(|p| p != path);
            Ok(())
        }

        async fn signed_url(&self, path: &str, expires_in_secs: u64) -> MarketResult<String> {
            Ok(format!(
                "https://files.test/resumes/{}?expires={}",
                path, expires_in_secs
            ))
        }
    }

    impl ConversationRepository for FakeMarket {
        async fn list_for_user(&self, user_id: &UserId) -> MarketResult<Vec<Conversation>> {
            Ok(self
                .conversations
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.includes(user_id))
                .cloned()
                .collect())
        }

        async fn find_by_id(&self, id: &ConversationId) -> MarketResult<Option<Conversation>> {
            Ok(self
                .conversations
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == *id)
                .cloned())
        }

        async fn messages(&self, conversation_id: &ConversationId) -> MarketResult<Vec<Message>> {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.conversation_id == *conversation_id)
                .cloned()
                .collect())
        }

        async fn send(&self, new: &NewMessage) -> MarketResult<Message> {
            let message = Message {
                id: MessageId::new(),
                conversation_id: new.conversation_id,
                sender_id: new.sender_id,
                content: new.content.clone(),
                created_at: Utc::now(),
                read_at: None,
            };
            self.messages.lock().unwrap().push(message.clone());
            Ok(message)
        }

        async fn mark_read(&self, conversation_id: &ConversationId, reader: &UserId) -> MarketResult<()> {
            self.marked_read.fetch_add(1, Ordering::SeqCst);
            for message in self.messages.lock().unwrap().iter_mut() {
                if message.conversation_id == *conversation_id && message.is_unread_for(reader) {
                    message.read_at = Some(Utc::now());
                }
            }
            Ok(())
        }
    }

    impl CertificateRepository for FakeMarket {
        async fn list_for_student(&self, student_id: &UserId) -> MarketResult<Vec<Certificate>> {
            Ok(self
                .certificates
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.student_id == *student_id)
                .cloned()
                .collect())
        }
    }

    impl MatchingService for FakeMarket {
        async fn match_opportunities(&self, _student_id: &UserId) -> MarketResult<Vec<OpportunityMatch>> {
            Ok(self.opportunity_matches.lock().unwrap().clone())
        }

        async fn match_candidates(
            &self,
            _opportunity_id: &OpportunityId,
        ) -> MarketResult<Vec<CandidateMatch>> {
            Ok(Vec::new())
        }
    }

    /// Serves the `messages` table to the polling change feed
    impl RowSource for FakeMarket {
        async fn rows_since(
            &self,
            _table: &str,
            filter: Option<&ColumnFilter>,
            since: DateTime<Utc>,
        ) -> BaasResult<Vec<Value>> {
            let mut rows: Vec<Message> = self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.created_at >= since)
                .filter(|m| filter.is_none_or(|f| m.conversation_id.to_string() == f.value))
                .cloned()
                .collect();
            rows.sort_by_key(|m| m.created_at);
            Ok(rows
                .into_iter()
                .map(|m| serde_json::to_value(m).unwrap())
                .collect())
        }
    }
}

#[cfg(test)]
mod flow_tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use account::models::UserRole;
    use baas::PollingChangeFeed;
    use chrono::Utc;
    use kernel::error::kind::ErrorKind;
    use kernel::id::UserId;
    use platform::cache::QueryCache;

    use super::fixtures::{COVER_LETTER, FakeMarket};
    use crate::application::{
        ApplicationUseCase, ApplyInput, CertificateUseCase, Dashboard, DashboardUseCase,
        MarketConfig, MatchingUseCase, MessagingUseCase, OpportunityUseCase, ResumeUseCase,
        Viewer,
    };
    use crate::domain::entity::opportunity::fixtures::opportunity;
    use crate::domain::entity::{ApplicationStatus, OpportunityStatus};
    use crate::domain::filter::OpportunityFilter;
    use crate::domain::matching::OpportunityMatch;
    use crate::error::MarketError;

    struct Harness {
        market: Arc<FakeMarket>,
        cache: Arc<QueryCache>,
        config: Arc<MarketConfig>,
        student: Viewer,
        recruiter: Viewer,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                market: Arc::new(FakeMarket::default()),
                cache: Arc::new(QueryCache::new(Duration::from_secs(60))),
                config: Arc::new(MarketConfig::default()),
                student: Viewer::new(UserId::new(), UserRole::Student),
                recruiter: Viewer::new(UserId::new(), UserRole::Recruiter),
            }
        }

        /// An open posting owned by the harness recruiter
        fn posting(&self, title: &str) -> crate::domain::entity::Opportunity {
            let mut opp = opportunity(title, &["Rust"]);
            opp.recruiter_id = self.recruiter.user_id;
            self.market.add_opportunity(opp)
        }

        fn opportunities(&self) -> OpportunityUseCase<FakeMarket> {
            OpportunityUseCase::new(self.market.clone(), self.cache.clone())
        }

        fn applications(&self) -> ApplicationUseCase<FakeMarket, FakeMarket> {
            ApplicationUseCase::new(self.market.clone(), self.market.clone(), self.cache.clone())
        }

        fn apply_input(&self, opportunity_id: kernel::id::OpportunityId) -> ApplyInput {
            ApplyInput {
                opportunity_id,
                cover_letter: Some(COVER_LETTER.into()),
                resume_path: None,
            }
        }
    }

    #[tokio::test]
    async fn test_apply_then_duplicate_is_rejected() {
        let h = Harness::new();
        let opp = h.posting("Payments API");
        let uc = h.applications();

        let created = uc.apply(&h.student, h.apply_input(opp.id)).await.unwrap();
        assert_eq!(created.status, ApplicationStatus::Pending);
        assert_eq!(created.student_id, h.student.user_id);

        let again = uc.apply(&h.student, h.apply_input(opp.id)).await.unwrap_err();
        assert!(matches!(again, MarketError::AlreadyApplied));
        assert_eq!(again.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_apply_to_closed_opportunity_fails() {
        let h = Harness::new();
        let mut opp = opportunity("Closed", &[]);
        opp.status = OpportunityStatus::Closed;
        let opp = h.market.add_opportunity(opp);

        let err = h
            .applications()
            .apply(&h.student, h.apply_input(opp.id))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::OpportunityClosed));
        assert!(h.market.applications.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recruiters_cannot_apply_and_foreign_resumes_are_refused() {
        let h = Harness::new();
        let opp = h.posting("API");
        let uc = h.applications();

        let err = uc.apply(&h.recruiter, h.apply_input(opp.id)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let mut input = h.apply_input(opp.id);
        input.resume_path = Some(format!("{}/cv.pdf", UserId::new()));
        let err = uc.apply(&h.student, input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_invalid_transition_makes_no_request() {
        let h = Harness::new();
        let opp = h.posting("API");
        let uc = h.applications();
        let app = uc.apply(&h.student, h.apply_input(opp.id)).await.unwrap();

        let err = uc
            .change_status(&h.recruiter, &app.id, ApplicationStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MarketError::InvalidTransition {
                from: ApplicationStatus::Pending,
                to: ApplicationStatus::Completed
            }
        ));
        assert_eq!(h.market.status_updates(), 0);
    }

    #[tokio::test]
    async fn test_review_pipeline_and_withdraw_rules() {
        let h = Harness::new();
        let opp = h.posting("API");
        let uc = h.applications();
        let app = uc.apply(&h.student, h.apply_input(opp.id)).await.unwrap();

        // Only the student may withdraw
        let err = uc
            .change_status(&h.recruiter, &app.id, ApplicationStatus::Withdrawn)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        // Another recruiter cannot decide on it
        let stranger = Viewer::new(UserId::new(), UserRole::Recruiter);
        let err = uc
            .change_status(&stranger, &app.id, ApplicationStatus::Accepted)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(h.market.status_updates(), 0);

        for next in [
            ApplicationStatus::Accepted,
            ApplicationStatus::InProgress,
            ApplicationStatus::Completed,
        ] {
            let updated = uc.change_status(&h.recruiter, &app.id, next).await.unwrap();
            assert_eq!(updated.status, next);
        }
        assert_eq!(h.market.status_updates(), 3);

        let err = uc.withdraw(&h.student, &app.id).await.unwrap_err();
        assert!(matches!(err, MarketError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_browse_is_cached_until_a_posting_changes() {
        let h = Harness::new();
        h.posting("Payments API");
        h.posting("Landing page");
        let uc = h.opportunities();

        let filter = OpportunityFilter {
            search: Some("payments".into()),
            ..Default::default()
        };
        assert_eq!(uc.browse(&filter).await.unwrap().len(), 1);
        assert_eq!(uc.browse(&OpportunityFilter::default()).await.unwrap().len(), 2);
        assert_eq!(h.market.list_open_calls.load(Ordering::SeqCst), 1);

        let first = h.market.opportunities.lock().unwrap()[0].id;
        uc.close(&h.recruiter, &first).await.unwrap();
        assert_eq!(uc.browse(&OpportunityFilter::default()).await.unwrap().len(), 1);
        assert_eq!(h.market.list_open_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_close_requires_ownership() {
        let h = Harness::new();
        let opp = h.posting("API");
        let stranger = Viewer::new(UserId::new(), UserRole::Recruiter);

        let err = h.opportunities().close(&stranger, &opp.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let admin = Viewer::new(UserId::new(), UserRole::Admin);
        let closed = h.opportunities().close(&admin, &opp.id).await.unwrap();
        assert_eq!(closed.status, OpportunityStatus::Closed);
    }

    #[tokio::test]
    async fn test_resume_upload_lands_in_owner_folder() {
        let h = Harness::new();
        let uc = ResumeUseCase::new(h.market.clone(), h.config.clone());
        let mut pdf = b"%PDF-1.7\n".to_vec();
        pdf.resize(2048, b' ');

        let path = uc.upload(&h.student, "My CV (final).pdf", pdf).await.unwrap();
        assert!(path.starts_with(&format!("{}/", h.student.user_id)));
        assert!(path.ends_with(".pdf"));

        let link = uc.link(&h.recruiter, &path).await.unwrap();
        assert!(link.contains("expires=3600"));

        let other = Viewer::new(UserId::new(), UserRole::Student);
        let err = uc.remove(&other, &path).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        uc.remove(&h.student, &path).await.unwrap();
        assert!(h.market.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_pdf_resume_is_rejected_before_upload() {
        let h = Harness::new();
        let uc = ResumeUseCase::new(h.market.clone(), h.config.clone());

        let err = uc
            .upload(&h.student, "cv.docx", b"PK\x03\x04".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedMediaType);
        assert!(h.market.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_messaging_checks_participants_and_marks_read() {
        let h = Harness::new();
        let conversation = h
            .market
            .add_conversation(h.student.user_id, h.recruiter.user_id);
        h.market
            .add_message(&conversation, h.recruiter.user_id, Utc::now());
        let feed = Arc::new(PollingChangeFeed::new(h.market.clone()));
        let uc = MessagingUseCase::new(h.market.clone(), feed);

        let outsider = Viewer::new(UserId::new(), UserRole::Student);
        let err = uc.open(&outsider, &conversation.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let history = uc.open(&h.student, &conversation.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(h.market.marked_read.load(Ordering::SeqCst), 1);

        // Nothing unread left, so no second write
        uc.open(&h.student, &conversation.id).await.unwrap();
        assert_eq!(h.market.marked_read.load(Ordering::SeqCst), 1);

        let err = uc.send(&h.student, &conversation.id, "   ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let summaries = uc.conversations(&h.student).await.unwrap();
        assert_eq!(summaries[0].counterpart, h.recruiter.user_id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_delivers_new_messages_once() {
        let h = Harness::new();
        let conversation = h
            .market
            .add_conversation(h.student.user_id, h.recruiter.user_id);
        h.market.add_message(
            &conversation,
            h.recruiter.user_id,
            Utc::now() - chrono::Duration::minutes(10),
        );
        // Local clock runs an hour ahead of the backend; the watch must not use it
        let feed = Arc::new(
            PollingChangeFeed::new(h.market.clone())
                .starting_at(Utc::now() + chrono::Duration::hours(1)),
        );
        let uc = MessagingUseCase::new(h.market.clone(), feed);

        let mut watch = uc.watch(&h.student, &conversation.id).await.unwrap();
        assert_eq!(watch.messages().len(), 1);

        let sent = uc
            .send(&h.recruiter, &conversation.id, "Can you start Monday?")
            .await
            .unwrap();
        let next = tokio::time::timeout(Duration::from_secs(30), watch.next())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(next.id, sent.id);
        assert_eq!(watch.messages().len(), 2);
        assert!(watch.messages().iter().all(|m| m.conversation_id == conversation.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_keeps_message_sharing_history_timestamp() {
        let h = Harness::new();
        let conversation = h
            .market
            .add_conversation(h.student.user_id, h.recruiter.user_id);
        let stamp = Utc::now() - chrono::Duration::minutes(5);
        h.market
            .add_message(&conversation, h.recruiter.user_id, stamp);
        let feed = Arc::new(PollingChangeFeed::new(h.market.clone()));
        let uc = MessagingUseCase::new(h.market.clone(), feed);

        let mut watch = uc.watch(&h.student, &conversation.id).await.unwrap();
        assert_eq!(watch.messages().len(), 1);

        // Committed after the history read, stamped in the same instant
        let late = h
            .market
            .add_message(&conversation, h.student.user_id, stamp);
        let next = tokio::time::timeout(Duration::from_secs(30), watch.next())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(next.id, late.id);
        assert_eq!(watch.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_dashboards_follow_role() {
        let h = Harness::new();
        let opp = h.posting("API");
        h.applications()
            .apply(&h.student, h.apply_input(opp.id))
            .await
            .unwrap();
        let uc = DashboardUseCase::new(
            h.market.clone(),
            h.market.clone(),
            h.market.clone(),
            h.cache.clone(),
            h.config.clone(),
        );

        match uc.execute(&h.student).await.unwrap() {
            Dashboard::Student(d) => assert_eq!(d.total_applications, 1),
            other => panic!("unexpected dashboard: {:?}", other),
        }
        match uc.execute(&h.recruiter).await.unwrap() {
            Dashboard::Recruiter(d) => {
                assert_eq!(d.open_opportunities, 1);
                assert_eq!(d.pending_review, 1);
            }
            other => panic!("unexpected dashboard: {:?}", other),
        }

        let analytics = uc.analytics(&h.recruiter).await.unwrap();
        assert_eq!(analytics.total_applications, 1);
        assert_eq!(analytics.daily.len(), 30);
        tokio_test::assert_err!(uc.analytics(&h.student).await);
    }

    #[tokio::test]
    async fn test_matching_is_ranked_and_scoped() {
        let h = Harness::new();
        let opp = h.posting("API");
        *h.market.opportunity_matches.lock().unwrap() = (0..15)
            .map(|i| OpportunityMatch {
                opportunity_id: opp.id,
                title: None,
                score: f64::from(i) * 5.0,
                reasons: Vec::new(),
            })
            .collect();
        let uc = MatchingUseCase::new(h.market.clone(), h.market.clone(), h.config.clone());

        let matches = uc.for_student(&h.student).await.unwrap();
        assert_eq!(matches.len(), 10);
        assert_eq!(matches[0].score, 70.0);

        let stranger = Viewer::new(UserId::new(), UserRole::Recruiter);
        let err = uc.for_opportunity(&stranger, &opp.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert!(uc.for_opportunity(&h.recruiter, &opp.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_completion_refreshes_certificates() {
        let h = Harness::new();
        let certificates = CertificateUseCase::new(h.market.clone(), h.cache.clone());
        assert!(certificates.list_mine(&h.student).await.unwrap().is_empty());

        let opp = h.posting("API");
        let uc = h.applications();
        let app = uc.apply(&h.student, h.apply_input(opp.id)).await.unwrap();
        for next in [
            ApplicationStatus::Accepted,
            ApplicationStatus::InProgress,
            ApplicationStatus::Completed,
        ] {
            uc.change_status(&h.recruiter, &app.id, next).await.unwrap();
        }
        h.market.certificates.lock().unwrap().push(
            serde_json::from_value(serde_json::json!({
                "id": kernel::id::CertificateId::new(),
                "application_id": app.id,
                "student_id": h.student.user_id,
                "opportunity_id": opp.id,
                "issued_at": Utc::now(),
            }))
            .unwrap(),
        );

        assert_eq!(certificates.list_mine(&h.student).await.unwrap().len(), 1);
    }
}
