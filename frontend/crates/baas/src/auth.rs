//! Authentication Service (`/auth/v1`)
//!
//! Password grant, sign-up, sign-out, password recovery, user updates,
//! token refresh, and the OAuth authorization-code flow with PKCE.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use kernel::id::UserId;
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use zeroize::Zeroize;

use crate::client::{BaasClient, decode};
use crate::error::{BaasError, BaasResult};

/// Signed-in session as issued by the auth service
#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    /// Unix seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl Session {
    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }

    /// Whether the access token expires within `margin` of `now`
    pub fn needs_refresh(&self, now: DateTime<Utc>, margin: ChronoDuration) -> bool {
        match self.expires_at() {
            Some(expires_at) => expires_at - margin <= now,
            None => false,
        }
    }

    /// Fill `expires_at` from `expires_in` when the service omitted it
    pub(crate) fn stamped(mut self, now: DateTime<Utc>) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = Some(now.timestamp() + self.expires_in);
        }
        self
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user.id)
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.access_token.zeroize();
        self.refresh_token.zeroize();
    }
}

/// User record as the auth service reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_metadata: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of a sign-up: a session only when email confirmation is off
#[derive(Debug)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<Session>,
}

/// Fields accepted by `PUT /auth/v1/user`
#[derive(Debug, Default, Serialize)]
pub struct UserAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// OAuth identity providers enabled for the project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
    LinkedIn,
}

impl OAuthProvider {
    pub const fn code(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
            OAuthProvider::LinkedIn => "linkedin_oidc",
        }
    }
}

impl std::str::FromStr for OAuthProvider {
    type Err = BaasError;

    fn from_str(s: &str) -> BaasResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(OAuthProvider::Google),
            "github" => Ok(OAuthProvider::Github),
            "linkedin" | "linkedin_oidc" => Ok(OAuthProvider::LinkedIn),
            other => Err(BaasError::InvalidRequest(format!(
                "Unsupported sign-in provider: {}",
                other
            ))),
        }
    }
}

/// Handle to the auth endpoints
pub struct AuthApi<'a> {
    client: &'a BaasClient,
}

impl BaasClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { client: self }
    }
}

impl AuthApi<'_> {
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
        captcha_token: Option<&str>,
    ) -> BaasResult<Session> {
        let mut body = json!({ "email": email, "password": password });
        if let Some(token) = captcha_token {
            body["gotrue_meta_security"] = json!({ "captcha_token": token });
        }

        let request = self
            .client
            .request(Method::POST, "auth/v1/token")?
            .query(&[("grant_type", "password")])
            .json(&body);
        let session: Session = self.client.send_json(request).await?;
        Ok(session.stamped(Utc::now()))
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
        email_redirect_to: Option<&str>,
    ) -> BaasResult<SignUpOutcome> {
        let mut request = self
            .client
            .request(Method::POST, "auth/v1/signup")?
            .json(&json!({ "email": email, "password": password, "data": metadata }));
        if let Some(redirect) = email_redirect_to {
            request = request.query(&[("redirect_to", redirect)]);
        }

        let raw: Value = self.client.send_json(request).await?;
        parse_sign_up(raw)
    }

    /// Revoke the session's refresh tokens
    pub async fn sign_out(&self, access_token: &str) -> BaasResult<()> {
        let request = self
            .client
            .request_as(Method::POST, "auth/v1/logout", access_token)?;
        match self.client.send_empty(request).await {
            // Already revoked
            Err(BaasError::Api { status: 401 | 404, .. }) => Ok(()),
            other => other,
        }
    }

    /// Send a password reset email
    pub async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> BaasResult<()> {
        let mut request = self
            .client
            .request(Method::POST, "auth/v1/recover")?
            .json(&json!({ "email": email }));
        if let Some(redirect) = redirect_to {
            request = request.query(&[("redirect_to", redirect)]);
        }
        self.client.send_empty(request).await
    }

    pub async fn get_user(&self) -> BaasResult<AuthUser> {
        if !self.client.has_access_token() {
            return Err(BaasError::NotAuthenticated);
        }
        let request = self.client.request(Method::GET, "auth/v1/user")?;
        self.client.send_json(request).await
    }

    pub async fn update_user(&self, attributes: &UserAttributes) -> BaasResult<AuthUser> {
        if !self.client.has_access_token() {
            return Err(BaasError::NotAuthenticated);
        }
        let request = self
            .client
            .request(Method::PUT, "auth/v1/user")?
            .json(attributes);
        self.client.send_json(request).await
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> BaasResult<Session> {
        let request = self
            .client
            .request(Method::POST, "auth/v1/token")?
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));
        let session: Session = self.client.send_json(request).await?;
        Ok(session.stamped(Utc::now()))
    }

    /// Provider redirect URL for the authorization-code flow
    pub fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        code_challenge: &str,
    ) -> BaasResult<Url> {
        let mut url = self.client.config().endpoint("auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider.code())
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "s256");
        Ok(url)
    }

    /// Trade the callback `code` plus the stored verifier for a session
    pub async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> BaasResult<Session> {
        let request = self
            .client
            .request(Method::POST, "auth/v1/token")?
            .query(&[("grant_type", "pkce")])
            .json(&json!({ "auth_code": auth_code, "code_verifier": code_verifier }));
        let session: Session = self.client.send_json(request).await?;
        Ok(session.stamped(Utc::now()))
    }
}

/// Sign-up answers with a session, a bare user, or `{ "user": ... }`
fn parse_sign_up(raw: Value) -> BaasResult<SignUpOutcome> {
    if raw.get("access_token").is_some() {
        let session: Session = decode(&raw.to_string())?;
        let session = session.stamped(Utc::now());
        return Ok(SignUpOutcome {
            user: session.user.clone(),
            session: Some(session),
        });
    }

    let user_value = match raw.get("user") {
        Some(user) => user.clone(),
        None => raw,
    };
    let user: AuthUser =
        serde_json::from_value(user_value).map_err(|e| BaasError::Decode(e.to_string()))?;
    Ok(SignUpOutcome {
        user,
        session: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaasConfig;

    const USER_ID: &str = "7f0c2d1e-58f3-4f51-9b8e-1d2a3b4c5d6e";

    fn client() -> BaasClient {
        BaasClient::new(BaasConfig::new("https://example.test", "anon").unwrap()).unwrap()
    }

    fn session_json() -> Value {
        json!({
            "access_token": "jwt",
            "refresh_token": "refresh",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": { "id": USER_ID, "email": "ada@example.com" }
        })
    }

    #[test]
    fn test_authorize_url() {
        let client = client();
        let url = client
            .auth()
            .authorize_url(OAuthProvider::Github, "http://localhost:3000/callback", "abc_-")
            .unwrap();

        assert_eq!(url.path(), "/auth/v1/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("provider".into(), "github".into())));
        assert!(pairs.contains(&("code_challenge_method".into(), "s256".into())));
        assert!(pairs.contains(&("redirect_to".into(), "http://localhost:3000/callback".into())));
    }

    #[test]
    fn test_sign_up_with_confirmation_pending() {
        let outcome = parse_sign_up(json!({ "id": USER_ID, "email": "ada@example.com" })).unwrap();
        assert!(outcome.session.is_none());
        assert_eq!(outcome.user.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn test_sign_up_with_session() {
        let outcome = parse_sign_up(session_json()).unwrap();
        let session = outcome.session.unwrap();
        assert_eq!(session.user_id().to_string(), USER_ID);
        assert!(session.expires_at.is_some());
    }

    #[test]
    fn test_session_refresh_window() {
        let session: Session = serde_json::from_value(session_json()).unwrap();
        let now = Utc::now();
        let session = session.stamped(now);

        assert!(!session.needs_refresh(now, ChronoDuration::seconds(60)));
        assert!(session.needs_refresh(now + ChronoDuration::seconds(3550), ChronoDuration::seconds(60)));
    }

    #[test]
    fn test_session_debug_is_redacted() {
        let session: Session = serde_json::from_value(session_json()).unwrap();
        let debug = format!("{:?}", session);
        assert!(!debug.contains("jwt"));
        assert!(!debug.contains("\"refresh\""));
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("GitHub".parse::<OAuthProvider>().unwrap(), OAuthProvider::Github);
        assert_eq!("linkedin".parse::<OAuthProvider>().unwrap().code(), "linkedin_oidc");
        assert!("myspace".parse::<OAuthProvider>().is_err());
    }

    #[test]
    fn test_user_attributes_skip_unset_fields() {
        let attributes = UserAttributes {
            password: Some("N3w!Passw0rd".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&attributes).unwrap();
        assert_eq!(value, json!({ "password": "N3w!Passw0rd" }));
    }
}
