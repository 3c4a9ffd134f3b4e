//! BaaS Connection Configuration

use std::env;
use std::time::Duration;

use reqwest::Url;

use crate::error::{BaasError, BaasResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Where the backend lives and how to identify this client
#[derive(Clone)]
pub struct BaasConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: Url,
    /// Public anonymous key sent as `apikey` on every request
    pub anon_key: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for BaasConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaasConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl BaasConfig {
    pub fn new(url: &str, anon_key: impl Into<String>) -> BaasResult<Self> {
        let mut url =
            Url::parse(url).map_err(|e| BaasError::Config(format!("Invalid BAAS_URL: {}", e)))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let anon_key = anon_key.into();
        if anon_key.trim().is_empty() {
            return Err(BaasError::Config("BAAS_ANON_KEY must not be empty".into()));
        }

        Ok(Self {
            url,
            anon_key,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Read `BAAS_URL`, `BAAS_ANON_KEY` and optional `BAAS_TIMEOUT_SECS`
    pub fn from_env() -> BaasResult<Self> {
        let url = env::var("BAAS_URL")
            .map_err(|_| BaasError::Config("BAAS_URL must be set".into()))?;
        let anon_key = env::var("BAAS_ANON_KEY")
            .map_err(|_| BaasError::Config("BAAS_ANON_KEY must be set".into()))?;

        let config = Self::new(&url, anon_key)?;
        match env::var("BAAS_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    BaasError::Config(format!("BAAS_TIMEOUT_SECS is not a number: {}", raw))
                })?;
                Ok(config.with_timeout(Duration::from_secs(secs)))
            }
            Err(_) => Ok(config),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for a path relative to the project root
    pub fn endpoint(&self, path: &str) -> BaasResult<Url> {
        self.url
            .join(path.trim_start_matches('/'))
            .map_err(|e| BaasError::Config(format!("Invalid endpoint path {}: {}", path, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_project_path() {
        let config = BaasConfig::new("https://example.test/project", "anon").unwrap();
        assert_eq!(
            config.endpoint("/rest/v1/opportunities").unwrap().as_str(),
            "https://example.test/project/rest/v1/opportunities"
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(BaasConfig::new("not a url", "anon").is_err());
        assert!(BaasConfig::new("https://example.test", "  ").is_err());
    }

    #[test]
    fn test_timeout_override() {
        let config = BaasConfig::new("https://example.test", "anon").unwrap();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        let config = config.with_timeout(Duration::from_secs(3));
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = BaasConfig::new("https://example.test", "secret-anon-key").unwrap();
        assert!(!format!("{:?}", config).contains("secret-anon-key"));
    }
}
