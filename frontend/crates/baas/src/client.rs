//! HTTP Client
//!
//! One `reqwest::Client` shared by every service. Each request carries the
//! project `apikey` and a bearer token: the signed-in user's access token
//! when there is one, the anonymous key otherwise.

use std::sync::{Arc, RwLock};

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use zeroize::Zeroizing;

use crate::config::BaasConfig;
use crate::error::{BaasError, BaasResult};

#[derive(Clone)]
pub struct BaasClient {
    http: reqwest::Client,
    config: Arc<BaasConfig>,
    access_token: Arc<RwLock<Option<Zeroizing<String>>>>,
}

impl std::fmt::Debug for BaasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaasClient")
            .field("config", &self.config)
            .field("signed_in", &self.has_access_token())
            .finish()
    }
}

impl BaasClient {
    pub fn new(config: BaasConfig) -> BaasResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("microintern/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(config),
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn config(&self) -> &BaasConfig {
        &self.config
    }

    /// Use `token` as the bearer for subsequent requests (`None` = anonymous)
    pub fn set_access_token(&self, token: Option<String>) {
        let mut slot = match self.access_token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = token.map(Zeroizing::new);
    }

    pub fn has_access_token(&self) -> bool {
        match self.access_token.read() {
            Ok(guard) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }

    fn bearer(&self) -> String {
        let slot = match self.access_token.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match slot.as_ref() {
            Some(token) => token.as_str().to_string(),
            None => self.config.anon_key.clone(),
        }
    }

    /// Request builder with project headers, authorized as the current user
    pub(crate) fn request(&self, method: Method, path: &str) -> BaasResult<RequestBuilder> {
        let bearer = self.bearer();
        self.request_as(method, path, &bearer)
    }

    /// Request builder authorized with an explicit bearer token
    pub(crate) fn request_as(
        &self,
        method: Method,
        path: &str,
        bearer: &str,
    ) -> BaasResult<RequestBuilder> {
        let url = self.config.endpoint(path)?;
        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer))
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> BaasResult<T> {
        let body = self.send_text(request).await?;
        decode(&body)
    }

    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> BaasResult<()> {
        self.send_text(request).await.map(|_| ())
    }

    pub(crate) async fn send_raw(&self, request: RequestBuilder) -> BaasResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BaasError::from_response(status.as_u16(), &body))
    }

    async fn send_text(&self, request: RequestBuilder) -> BaasResult<String> {
        let response = self.send_raw(request).await?;
        Ok(response.text().await?)
    }
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> BaasResult<T> {
    serde_json::from_str(body).map_err(|e| BaasError::Decode(e.to_string()))
}
