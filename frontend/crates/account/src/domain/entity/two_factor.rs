//! Two-Factor Status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TwoFactorStatus {
    pub enabled: bool,
    #[serde(default)]
    pub enrolled_at: Option<DateTime<Utc>>,
}

impl TwoFactorStatus {
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            enrolled_at: None,
        }
    }
}
