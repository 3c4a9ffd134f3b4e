//! File Storage Service (`/storage/v1`)

use reqwest::{Method, Url};
use serde::Deserialize;
use serde_json::json;

use crate::client::BaasClient;
use crate::error::{BaasError, BaasResult};

/// Handle to one bucket
pub struct StorageBucket<'a> {
    client: &'a BaasClient,
    bucket: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "Key")]
    key: String,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

impl BaasClient {
    pub fn storage(&self, bucket: impl Into<String>) -> StorageBucket<'_> {
        StorageBucket {
            client: self,
            bucket: bucket.into(),
        }
    }
}

impl StorageBucket<'_> {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload `bytes` to `path`; returns the stored key (`<bucket>/<path>`)
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> BaasResult<String> {
        let request = self
            .client
            .request(Method::POST, &self.object_path(path))?
            .header("Content-Type", content_type)
            .header("Cache-Control", "max-age=3600")
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes);
        let response: UploadResponse = self.client.send_json(request).await?;
        Ok(response.key)
    }

    pub async fn remove(&self, paths: &[String]) -> BaasResult<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let request = self
            .client
            .request(Method::DELETE, &format!("storage/v1/object/{}", self.bucket))?
            .json(&json!({ "prefixes": paths }));
        self.client.send_empty(request).await
    }

    /// Time-limited URL for a private object
    pub async fn create_signed_url(&self, path: &str, expires_in_secs: u64) -> BaasResult<Url> {
        let request = self
            .client
            .request(
                Method::POST,
                &format!("storage/v1/object/sign/{}/{}", self.bucket, path),
            )?
            .json(&json!({ "expiresIn": expires_in_secs }));
        let response: SignedUrlResponse = self.client.send_json(request).await?;
        self.absolute_signed_url(&response.signed_url)
    }

    fn object_path(&self, path: &str) -> String {
        format!("storage/v1/object/{}/{}", self.bucket, path.trim_start_matches('/'))
    }

    /// The service answers with a path relative to `/storage/v1`
    fn absolute_signed_url(&self, relative: &str) -> BaasResult<Url> {
        let path = format!("storage/v1/{}", relative.trim_start_matches('/'));
        self.client
            .config()
            .endpoint(&path)
            .map_err(|_| BaasError::Decode(format!("Unusable signed URL: {}", relative)))
    }
}
