//! Application Configuration

use std::time::Duration;

/// Marketplace application configuration
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// How long cached query results are served without refetching
    pub stale_time: Duration,
    /// Lifetime of resume download links
    pub resume_link_ttl: Duration,
    /// Suggestions shown per matching request
    pub match_limit: usize,
    /// Days covered by the analytics trend
    pub analytics_days: u32,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(30),
            resume_link_ttl: Duration::from_secs(60 * 60),
            match_limit: 10,
            analytics_days: 30,
        }
    }
}

impl MarketConfig {
    /// Create config for development (no caching, short links)
    pub fn development() -> Self {
        Self {
            stale_time: Duration::ZERO,
            resume_link_ttl: Duration::from_secs(5 * 60),
            ..Default::default()
        }
    }
}
