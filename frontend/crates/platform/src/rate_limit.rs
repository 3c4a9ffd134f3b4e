//! Rate Limiting
//!
//! The backend enforces limits; the client asks before sensitive actions
//! (sign-in, sign-up, password reset, sending messages) so it can show a
//! friendly "try again in N seconds" instead of a raw 429.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Limit requested for one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    /// Maximum attempts allowed in the window
    pub max_requests: u32,
    /// Window length
    #[serde(rename = "windowMs", serialize_with = "serialize_ms")]
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }
}

fn serialize_ms<S: serde::Serializer>(window: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(window.as_millis() as u64)
}

/// Decision returned by the rate limit check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    #[serde(default)]
    pub remaining: u32,
    /// When the window resets (unix ms), if known
    #[serde(default)]
    pub reset_at_ms: Option<i64>,
    /// Set when the decision was made locally because the check failed
    #[serde(skip)]
    pub degraded: bool,
}

impl RateLimitDecision {
    /// Decision used when the limiter itself is unavailable
    pub fn fail_open() -> Self {
        Self {
            allowed: true,
            remaining: 0,
            reset_at_ms: None,
            degraded: true,
        }
    }

    /// Seconds until the window resets, relative to `now_ms`
    pub fn retry_after_secs(&self, now_ms: i64) -> Option<u64> {
        self.reset_at_ms
            .map(|reset| ((reset - now_ms).max(0) as u64).div_ceil(1000))
    }
}

/// Error reported by a limiter backend
pub type LimiterError = Box<dyn std::error::Error + Send + Sync>;

/// Remote limiter (e.g. a serverless function keyed by action + identifier)
#[trait_variant::make(RateLimiter: Send)]
pub trait LocalRateLimiter {
    async fn check(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitDecision, LimiterError>;
}

/// Ask the limiter, allowing the action if the limiter cannot answer
pub async fn check_or_allow<L: RateLimiter>(
    limiter: &L,
    key: &str,
    config: &RateLimitConfig,
) -> RateLimitDecision {
    match limiter.check(key, config).await {
        Ok(decision) => {
            if !decision.allowed {
                tracing::warn!(key, remaining = decision.remaining, "Rate limit reached");
            }
            decision
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "Rate limit check failed, failing open");
            RateLimitDecision::fail_open()
        }
    }
}
