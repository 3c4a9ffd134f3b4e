//! Cross-layer tests for the account crate
//! Use cases run against an in-memory backend.

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use baas::{AuthUser, BaasError, OAuthProvider, Session, SignUpOutcome};
    use chrono::Utc;
    use kernel::id::UserId;
    use platform::password::{
        BreachCheckError, BreachRangeSource, ClearTextPassword, hash_prefix_suffix,
    };
    use platform::rate_limit::{LimiterError, RateLimitConfig, RateLimitDecision, RateLimiter};
    use serde_json::{Value, json};

    use crate::domain::entity::{Profile, TwoFactorStatus};
    use crate::domain::repository::{
        AuthGateway, CaptchaVerdict, CaptchaVerifier, DataExporter, ProfileRepository,
        Registration, TwoFactorGateway,
    };
    use crate::domain::value_object::{Email, TotpCode, TotpEnrollment};
    use crate::error::{AccountError, AccountResult};

    pub(crate) const PASSWORD: &str = "Tr0ub4dor&3-horse";
    pub(crate) const VALID_CODE: &str = "492039";

    pub(crate) fn session_for(user_id: UserId, expires_in: i64) -> Session {
        serde_json::from_value(json!({
            "access_token": format!("access-{}-{}", user_id, expires_in),
            "refresh_token": "refresh-token",
            "token_type": "bearer",
            "expires_in": expires_in,
            "expires_at": Utc::now().timestamp() + expires_in,
            "user": { "id": user_id, "email": "ada@example.com" }
        }))
        .unwrap()
    }

    pub(crate) struct FakeBackend {
        pub user_id: UserId,
        pub two_factor_enabled: AtomicBool,
        pub two_factor_unavailable: AtomicBool,
        pub confirm_email: AtomicBool,
        pub sign_out_fails: AtomicBool,
        /// Status returned by the refresh grant, when it fails
        pub refresh_status: Mutex<Option<u16>>,
        /// Passwords the breach corpus knows
        pub breached: Mutex<Vec<String>>,
        pub sign_ups: AtomicUsize,
        pub sign_outs: AtomicUsize,
        pub token: Mutex<Option<String>>,
    }

    impl FakeBackend {
        pub(crate) fn new() -> Self {
            Self {
                user_id: UserId::new(),
                two_factor_enabled: AtomicBool::new(false),
                two_factor_unavailable: AtomicBool::new(false),
                confirm_email: AtomicBool::new(false),
                sign_out_fails: AtomicBool::new(false),
                refresh_status: Mutex::new(None),
                breached: Mutex::new(Vec::new()),
                sign_ups: AtomicUsize::new(0),
                sign_outs: AtomicUsize::new(0),
                token: Mutex::new(None),
            }
        }

        pub(crate) fn token(&self) -> Option<String> {
            self.token.lock().unwrap().clone()
        }

        fn flag(flag: &AtomicBool) -> bool {
            flag.load(Ordering::SeqCst)
        }
    }

    impl AuthGateway for FakeBackend {
        async fn sign_in_with_password(
            &self,
            _email: &Email,
            password: &str,
            _captcha_token: Option<&str>,
        ) -> AccountResult<Session> {
            if password != PASSWORD {
                return Err(AccountError::InvalidCredentials);
            }
            Ok(session_for(self.user_id, 3600))
        }

        async fn sign_up(&self, registration: &Registration) -> AccountResult<SignUpOutcome> {
            self.sign_ups.fetch_add(1, Ordering::SeqCst);
            let user: AuthUser = serde_json::from_value(json!({
                "id": self.user_id,
                "email": registration.email.as_str(),
                "user_metadata": { "full_name": registration.full_name.as_str() }
            }))
            .unwrap();
            let session = if Self::flag(&self.confirm_email) {
                None
            } else {
                Some(session_for(self.user_id, 3600))
            };
            Ok(SignUpOutcome { user, session })
        }

        async fn sign_out(&self, _session: &Session) -> AccountResult<()> {
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            if Self::flag(&self.sign_out_fails) {
                return Err(AccountError::Remote(BaasError::Api {
                    status: 503,
                    code: None,
                    message: "upstream unavailable".into(),
                }));
            }
            Ok(())
        }

        async fn request_password_reset(
            &self,
            _email: &Email,
            _redirect_to: Option<&str>,
        ) -> AccountResult<()> {
            Ok(())
        }

        async fn update_password(&self, _password: &ClearTextPassword) -> AccountResult<()> {
            if self.token().is_none() {
                return Err(AccountError::Remote(BaasError::NotAuthenticated));
            }
            Ok(())
        }

        async fn refresh(&self, _refresh_token: &str) -> AccountResult<Session> {
            if let Some(status) = *self.refresh_status.lock().unwrap() {
                return Err(AccountError::Remote(BaasError::Api {
                    status,
                    code: None,
                    message: "Invalid Refresh Token".into(),
                }));
            }
            Ok(session_for(self.user_id, 7200))
        }

        fn authorize_url(
            &self,
            provider: OAuthProvider,
            redirect_to: &str,
            code_challenge: &str,
        ) -> AccountResult<String> {
            Ok(format!(
                "https://auth.test/authorize?provider={}&redirect_to={}&code_challenge={}",
                provider.code(),
                redirect_to,
                code_challenge
            ))
        }

        async fn exchange_code(
            &self,
            auth_code: &str,
            code_verifier: &str,
        ) -> AccountResult<Session> {
            if auth_code != "callback-code" || code_verifier.len() != 64 {
                return Err(AccountError::Remote(BaasError::Api {
                    status: 400,
                    code: Some("bad_code_verifier".into()),
                    message: "code challenge does not match".into(),
                }));
            }
            Ok(session_for(self.user_id, 3600))
        }

        fn use_session(&self, session: Option<&Session>) {
            *self.token.lock().unwrap() = session.map(|s| s.access_token.clone());
        }
    }

    impl ProfileRepository for FakeBackend {
        async fn find_by_id(&self, user_id: &UserId) -> AccountResult<Option<Profile>> {
            if *user_id != self.user_id {
                return Ok(None);
            }
            Ok(Some(
                serde_json::from_value(json!({
                    "id": user_id,
                    "email": "ada@example.com",
                    "full_name": "Ada Lovelace",
                    "role": "student",
                    "created_at": "2025-01-01T00:00:00Z"
                }))
                .unwrap(),
            ))
        }
    }

    impl TwoFactorGateway for FakeBackend {
        async fn status(&self, _user_id: &UserId) -> AccountResult<TwoFactorStatus> {
            if Self::flag(&self.two_factor_unavailable) {
                return Err(AccountError::Remote(BaasError::Api {
                    status: 500,
                    code: None,
                    message: "relation does not exist".into(),
                }));
            }
            Ok(TwoFactorStatus {
                enabled: Self::flag(&self.two_factor_enabled),
                enrolled_at: None,
            })
        }

        async fn setup(&self) -> AccountResult<TotpEnrollment> {
            Ok(serde_json::from_value(json!({
                "secret": "JBSWY3DPEHPK3PXP",
                "uri": "otpauth://totp/MicroIntern:ada%40example.com?secret=JBSWY3DPEHPK3PXP&issuer=MicroIntern"
            }))
            .unwrap())
        }

        async fn verify(&self, code: &TotpCode) -> AccountResult<bool> {
            let valid = code.as_str() == VALID_CODE;
            if valid {
                self.two_factor_enabled.store(true, Ordering::SeqCst);
            }
            Ok(valid)
        }

        async fn disable(&self, code: &TotpCode) -> AccountResult<bool> {
            let valid = code.as_str() == VALID_CODE;
            if valid {
                self.two_factor_enabled.store(false, Ordering::SeqCst);
            }
            Ok(valid)
        }
    }

    impl CaptchaVerifier for FakeBackend {
        async fn verify(&self, token: &str) -> AccountResult<CaptchaVerdict> {
            Ok(CaptchaVerdict {
                success: token != "bot",
                error_codes: vec![],
            })
        }
    }

    impl RateLimiter for FakeBackend {
        async fn check(
            &self,
            _key: &str,
            _config: &RateLimitConfig,
        ) -> Result<RateLimitDecision, LimiterError> {
            Ok(RateLimitDecision {
                allowed: true,
                remaining: 4,
                reset_at_ms: None,
                degraded: false,
            })
        }
    }

    impl BreachRangeSource for FakeBackend {
        async fn fetch_range(&self, prefix: &str) -> Result<String, BreachCheckError> {
            let breached = self.breached.lock().unwrap();
            Ok(breached
                .iter()
                .map(|password| hash_prefix_suffix(password))
                .filter(|(p, _)| p == prefix)
                .map(|(_, suffix)| format!("{}:1337", suffix))
                .collect::<Vec<_>>()
                .join("\r\n"))
        }
    }

    impl DataExporter for FakeBackend {
        async fn export(&self) -> AccountResult<Value> {
            Ok(json!({ "profile": { "email": "ada@example.com" }, "applications": [] }))
        }
    }
}

#[cfg(test)]
mod flow_tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use platform::storage::MemoryStore;

    use super::fixtures::{FakeBackend, PASSWORD, VALID_CODE, session_for};
    use crate::application::*;
    use crate::domain::value_object::{TotpCode, UserRole};
    use crate::error::AccountError;

    struct Harness {
        backend: Arc<FakeBackend>,
        storage: Arc<MemoryStore>,
        store: Arc<SessionStore<MemoryStore>>,
        guards: Arc<Guards<FakeBackend, FakeBackend>>,
        config: Arc<AccountConfig>,
    }

    impl Harness {
        fn new() -> Self {
            let backend = Arc::new(FakeBackend::new());
            let storage = Arc::new(MemoryStore::new());
            let config = Arc::new(AccountConfig::default());
            Self {
                store: Arc::new(SessionStore::new(Arc::clone(&storage))),
                guards: Arc::new(Guards::new(
                    Arc::clone(&backend),
                    Arc::clone(&backend),
                    Arc::clone(&config),
                )),
                backend,
                storage,
                config,
            }
        }

        fn sign_in(&self) -> SignInUseCase<FakeBackend, FakeBackend, FakeBackend, FakeBackend, MemoryStore> {
            SignInUseCase::new(
                Arc::clone(&self.backend),
                Arc::clone(&self.backend),
                Arc::clone(&self.guards),
                Arc::clone(&self.store),
            )
        }

        fn sign_up(&self) -> SignUpUseCase<FakeBackend, FakeBackend, FakeBackend, FakeBackend, MemoryStore> {
            SignUpUseCase::new(
                Arc::clone(&self.backend),
                Arc::clone(&self.backend),
                Arc::clone(&self.guards),
                Arc::clone(&self.store),
                Arc::clone(&self.config),
            )
        }
    }

    fn credentials(password: &str, code: Option<&str>) -> SignInInput {
        SignInInput {
            email: "ada@example.com".into(),
            password: password.into(),
            captcha_token: None,
            totp_code: code.map(str::to_string),
        }
    }

    fn registration(password: &str, role: UserRole) -> SignUpInput {
        SignUpInput {
            email: "ada@example.com".into(),
            password: password.into(),
            confirm_password: password.into(),
            full_name: "Ada Lovelace".into(),
            role,
            captcha_token: None,
        }
    }

    #[tokio::test]
    async fn test_sign_in_without_two_factor_publishes_session() {
        let h = Harness::new();
        let mut events = h.store.subscribe();

        let outcome = h.sign_in().execute(credentials(PASSWORD, None)).await.unwrap();

        assert!(matches!(outcome, SignInOutcome::SignedIn(_)));
        assert_eq!(
            events.try_recv().unwrap(),
            AuthEvent::SignedIn(h.backend.user_id)
        );
        assert!(h.backend.token().is_some());
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let h = Harness::new();
        let result = h.sign_in().execute(credentials("nope", None)).await;
        assert!(matches!(result, Err(AccountError::InvalidCredentials)));
        assert!(h.store.current().is_none());
    }

    #[tokio::test]
    async fn test_two_factor_withholds_session_until_code_verifies() {
        let h = Harness::new();
        h.backend.two_factor_enabled.store(true, Ordering::SeqCst);
        let use_case = h.sign_in();

        let outcome = use_case.execute(credentials(PASSWORD, None)).await.unwrap();
        let SignInOutcome::TwoFactorRequired(pending) = outcome else {
            panic!("expected a two-factor challenge");
        };
        assert!(h.store.current().is_none());

        let code = TotpCode::parse(VALID_CODE).unwrap();
        let session = use_case.complete(pending, &code).await.unwrap();
        assert_eq!(h.store.user_id(), Some(session.user_id()));
    }

    #[tokio::test]
    async fn test_wrong_second_factor_signs_pending_session_out() {
        let h = Harness::new();
        h.backend.two_factor_enabled.store(true, Ordering::SeqCst);

        let result = h
            .sign_in()
            .execute(credentials(PASSWORD, Some("000000")))
            .await;

        assert!(matches!(result, Err(AccountError::InvalidTwoFactorCode)));
        assert!(h.store.current().is_none());
        assert!(h.backend.token().is_none());
        assert_eq!(h.backend.sign_outs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_two_factor_state_fails_closed() {
        let h = Harness::new();
        h.backend.two_factor_unavailable.store(true, Ordering::SeqCst);

        let result = h.sign_in().execute(credentials(PASSWORD, None)).await;

        assert!(matches!(result, Err(AccountError::Remote(_))));
        assert!(h.store.current().is_none());
        assert_eq!(h.backend.sign_outs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_code_is_rejected_before_any_request() {
        let h = Harness::new();
        let result = h
            .sign_in()
            .execute(credentials(PASSWORD, Some("12 34")))
            .await;
        assert!(matches!(result, Err(AccountError::Validation(_))));
        assert!(h.backend.token().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_rejects_leaked_password() {
        let h = Harness::new();
        h.backend.breached.lock().unwrap().push(PASSWORD.to_string());

        let result = h.sign_up().execute(registration(PASSWORD, UserRole::Student)).await;

        assert!(matches!(
            result,
            Err(AccountError::LeakedPassword { count: 1337 })
        ));
        assert_eq!(h.backend.sign_ups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sign_up_refuses_admin_role() {
        let h = Harness::new();
        let result = h.sign_up().execute(registration(PASSWORD, UserRole::Admin)).await;
        assert!(matches!(result, Err(AccountError::Validation(_))));
    }

    #[tokio::test]
    async fn test_sign_up_with_email_confirmation() {
        let h = Harness::new();
        h.backend.confirm_email.store(true, Ordering::SeqCst);

        let output = h
            .sign_up()
            .execute(registration(PASSWORD, UserRole::Recruiter))
            .await
            .unwrap();

        assert!(output.confirmation_required);
        assert_eq!(output.user_id, h.backend.user_id);
        assert!(h.store.current().is_none());
    }

    #[tokio::test]
    async fn test_resume_refreshes_expiring_session() {
        let h = Harness::new();
        h.store
            .set(session_for(h.backend.user_id, 30), AuthEvent::SignedIn(h.backend.user_id))
            .unwrap();
        let mut events = h.store.subscribe();

        let resume = ResumeSessionUseCase::new(
            Arc::clone(&h.backend),
            Arc::new(SessionStore::new(Arc::clone(&h.storage))),
            h.config.refresh_margin_secs(),
        );
        let session = resume.execute().await.unwrap().unwrap();

        assert_eq!(session.expires_in, 7200);
        // A fresh store was used, so the original one saw nothing
        assert!(events.try_recv().is_err());
        assert!(h.backend.token().is_some());
    }

    #[tokio::test]
    async fn test_resume_forgets_revoked_session() {
        let h = Harness::new();
        *h.backend.refresh_status.lock().unwrap() = Some(400);
        h.store
            .set(session_for(h.backend.user_id, 0), AuthEvent::TokenRefreshed)
            .unwrap();

        let resume = ResumeSessionUseCase::new(Arc::clone(&h.backend), Arc::clone(&h.store), 60);

        assert!(resume.execute().await.unwrap().is_none());
        assert!(h.store.current().is_none());
        assert!(h.storage.is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_clears_even_when_revocation_fails() {
        let h = Harness::new();
        h.sign_in().execute(credentials(PASSWORD, None)).await.unwrap();
        h.backend.sign_out_fails.store(true, Ordering::SeqCst);

        SignOutUseCase::new(Arc::clone(&h.backend), Arc::clone(&h.store))
            .execute()
            .await
            .unwrap();

        assert!(h.store.current().is_none());
        assert!(h.backend.token().is_none());
    }

    #[tokio::test]
    async fn test_oauth_flow_uses_stored_verifier_once() {
        let h = Harness::new();
        let flow = OAuthFlowUseCase::new(
            Arc::clone(&h.backend),
            Arc::clone(&h.storage),
            Arc::clone(&h.store),
            Arc::clone(&h.config),
        );

        let url = flow.start(baas::OAuthProvider::Github).unwrap();
        assert!(url.contains("provider=github"));

        flow.complete("callback-code").await.unwrap();
        assert_eq!(h.store.user_id(), Some(h.backend.user_id));

        assert!(matches!(
            flow.complete("callback-code").await,
            Err(AccountError::OAuthFlowMissing)
        ));
    }

    #[tokio::test]
    async fn test_two_factor_enrollment_lifecycle() {
        let h = Harness::new();
        h.sign_in().execute(credentials(PASSWORD, None)).await.unwrap();
        let two_factor = TwoFactorUseCase::new(Arc::clone(&h.backend), Arc::clone(&h.store));

        let enrollment = two_factor.setup().await.unwrap();
        assert_eq!(enrollment.grouped_secret(), "JBSW Y3DP EHPK 3PXP");

        assert!(matches!(
            two_factor.enable("111111").await,
            Err(AccountError::InvalidTwoFactorCode)
        ));
        two_factor.enable(VALID_CODE).await.unwrap();
        assert!(two_factor.status().await.unwrap().enabled);
        assert!(matches!(
            two_factor.setup().await,
            Err(AccountError::TwoFactorAlreadyEnabled)
        ));

        two_factor.disable(VALID_CODE).await.unwrap();
        assert!(matches!(
            two_factor.disable(VALID_CODE).await,
            Err(AccountError::TwoFactorNotEnabled)
        ));
    }

    #[tokio::test]
    async fn test_password_update_requires_session_and_emits_event() {
        let h = Harness::new();
        let reset = PasswordResetUseCase::new(
            Arc::clone(&h.backend),
            Arc::clone(&h.backend),
            Arc::clone(&h.guards),
            Arc::clone(&h.store),
            Arc::clone(&h.config),
        );
        assert!(matches!(
            reset.update_password(PASSWORD.into(), PASSWORD).await,
            Err(AccountError::NotSignedIn)
        ));

        h.sign_in().execute(credentials(PASSWORD, None)).await.unwrap();
        let mut events = h.store.subscribe();
        reset
            .update_password("N3w-passphrase!".into(), "N3w-passphrase!")
            .await
            .unwrap();
        assert_eq!(events.try_recv().unwrap(), AuthEvent::UserUpdated);
    }

    #[tokio::test]
    async fn test_export_document_and_profile() {
        let h = Harness::new();
        h.sign_in().execute(credentials(PASSWORD, None)).await.unwrap();

        let export = DataExportUseCase::new(Arc::clone(&h.backend), Arc::clone(&h.store))
            .execute()
            .await
            .unwrap();
        assert!(export.file_name.starts_with("microintern-export-"));
        assert_eq!(export.checksum, platform::crypto::sha256_hex(export.contents.as_bytes()));

        let profile = CurrentProfileUseCase::new(Arc::clone(&h.backend), Arc::clone(&h.store))
            .execute()
            .await
            .unwrap();
        assert_eq!(profile.display_name(), "Ada Lovelace");
    }
}
