//! Application Configuration
//!
//! Configuration for the account application layer.

use std::time::Duration;

use platform::rate_limit::RateLimitConfig;

use crate::domain::session_timeout::SessionTimeoutConfig;

/// Account application configuration
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Sign-in attempts per identifier (5 per 15 minutes)
    pub sign_in_limit: RateLimitConfig,
    /// Sign-ups per identifier (3 per hour)
    pub sign_up_limit: RateLimitConfig,
    /// Password reset mails per identifier (3 per hour)
    pub password_reset_limit: RateLimitConfig,
    /// Refuse sign-in/sign-up without a CAPTCHA token
    pub require_captcha: bool,
    /// Reject passwords found in breach corpora at sign-up and change
    pub reject_leaked_passwords: bool,
    /// Refresh the access token this long before it expires
    pub refresh_margin: Duration,
    /// Where auth mails and OAuth providers send the user back
    pub redirect_url: String,
    pub session_timeout: SessionTimeoutConfig,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            sign_in_limit: RateLimitConfig::new(5, 15 * 60),
            sign_up_limit: RateLimitConfig::new(3, 3600),
            password_reset_limit: RateLimitConfig::new(3, 3600),
            require_captcha: false,
            reject_leaked_passwords: true,
            refresh_margin: Duration::from_secs(60),
            redirect_url: "http://localhost:3000/auth/callback".to_string(),
            session_timeout: SessionTimeoutConfig::default(),
        }
    }
}

impl AccountConfig {
    /// Create config for development (short session timeout)
    pub fn development() -> Self {
        Self {
            session_timeout: SessionTimeoutConfig::development(),
            ..Default::default()
        }
    }

    /// Get refresh margin in seconds
    pub fn refresh_margin_secs(&self) -> i64 {
        self.refresh_margin.as_secs() as i64
    }
}
