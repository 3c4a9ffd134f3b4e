//! Session Timeout State Machine
//!
//! ```text
//!   Idle ──(idle period, no activity)──▶ Warning ──(warning period)──▶ Expired
//!    ▲  ◀──────────── extend ─────────────┘
//!    └── activity (Idle only) restarts the idle period
//! ```
//!
//! Pure: every transition takes the current instant, so the same machine is
//! driven by the async coordinator and by tests without a clock.
//! Deadlines derive from the last activity, never from when `poll` ran, so
//! a late poll cannot stretch the window.

use std::time::Duration;

use tokio::time::Instant;

/// Idle time before the warning
pub const DEFAULT_IDLE_PERIOD: Duration = Duration::from_secs(25 * 60);
/// Warning countdown before sign-out
pub const DEFAULT_WARNING_PERIOD: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeoutConfig {
    pub idle: Duration,
    pub warning: Duration,
}

impl Default for SessionTimeoutConfig {
    fn default() -> Self {
        Self {
            idle: DEFAULT_IDLE_PERIOD,
            warning: DEFAULT_WARNING_PERIOD,
        }
    }
}

impl SessionTimeoutConfig {
    /// Short periods for trying the flow by hand
    pub fn development() -> Self {
        Self {
            idle: Duration::from_secs(50),
            warning: Duration::from_secs(10),
        }
    }

    /// Full inactivity window
    pub fn total(&self) -> Duration {
        self.idle + self.warning
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutState {
    Idle,
    Warning,
    Expired,
}

#[derive(Debug, Clone)]
pub struct SessionTimeout {
    config: SessionTimeoutConfig,
    state: TimeoutState,
    last_activity: Instant,
    warning_since: Option<Instant>,
}

impl SessionTimeout {
    pub fn new(config: SessionTimeoutConfig, now: Instant) -> Self {
        Self {
            config,
            state: TimeoutState::Idle,
            last_activity: now,
            warning_since: None,
        }
    }

    pub fn state(&self) -> TimeoutState {
        self.state
    }

    pub fn config(&self) -> &SessionTimeoutConfig {
        &self.config
    }

    /// User activity; restarts the idle period only while Idle
    ///
    /// Returns whether the countdown was reset.
    pub fn record_activity(&mut self, now: Instant) -> bool {
        self.poll(now);
        if self.state != TimeoutState::Idle {
            return false;
        }
        self.last_activity = now;
        true
    }

    /// Explicit "stay signed in"; returns to Idle unless already Expired
    pub fn extend(&mut self, now: Instant) -> bool {
        self.poll(now);
        if self.state == TimeoutState::Expired {
            return false;
        }
        self.state = TimeoutState::Idle;
        self.last_activity = now;
        self.warning_since = None;
        true
    }

    /// Apply every transition due at `now`
    pub fn poll(&mut self, now: Instant) -> TimeoutState {
        if self.state == TimeoutState::Idle {
            let warning_at = self.last_activity + self.config.idle;
            if now >= warning_at {
                self.state = TimeoutState::Warning;
                self.warning_since = Some(warning_at);
            }
        }
        if self.state == TimeoutState::Warning
            && self
                .warning_deadline()
                .is_some_and(|deadline| now >= deadline)
        {
            self.state = TimeoutState::Expired;
        }
        self.state
    }

    /// When the next transition is due
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            TimeoutState::Idle => Some(self.last_activity + self.config.idle),
            TimeoutState::Warning => self.warning_deadline(),
            TimeoutState::Expired => None,
        }
    }

    /// Time left on the warning countdown
    pub fn warning_remaining(&self, now: Instant) -> Option<Duration> {
        match self.state {
            TimeoutState::Warning => self
                .warning_deadline()
                .map(|deadline| deadline.saturating_duration_since(now)),
            _ => None,
        }
    }

    fn warning_deadline(&self) -> Option<Instant> {
        self.warning_since.map(|since| since + self.config.warning)
    }
}
