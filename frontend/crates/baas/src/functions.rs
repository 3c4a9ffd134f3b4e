//! Serverless Functions (`/functions/v1/<name>`)

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::client::BaasClient;
use crate::error::{BaasError, BaasResult};

/// Functions deployed alongside the project
pub mod names {
    pub const VERIFY_CAPTCHA: &str = "verify-captcha";
    pub const CHECK_RATE_LIMIT: &str = "check-rate-limit";
    pub const TOTP_SETUP: &str = "totp-setup";
    pub const TOTP_VERIFY: &str = "totp-verify";
    pub const TOTP_DISABLE: &str = "totp-disable";
    pub const MATCH_CANDIDATES: &str = "match-candidates";
    pub const MATCH_OPPORTUNITIES: &str = "match-opportunities";
    pub const EXPORT_USER_DATA: &str = "export-user-data";
}

impl BaasClient {
    /// POST a JSON body to a function and decode its JSON answer
    pub async fn invoke<B, T>(&self, name: &str, body: &B) -> BaasResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if name.is_empty() || name.contains('/') {
            return Err(BaasError::InvalidRequest(format!(
                "Invalid function name: {:?}",
                name
            )));
        }

        let request = self
            .request(Method::POST, &format!("functions/v1/{}", name))?
            .json(body);
        let result = self.send_json(request).await;
        if let Err(e) = &result {
            tracing::debug!(function = name, error = %e, "Function invocation failed");
        }
        result
    }
}
