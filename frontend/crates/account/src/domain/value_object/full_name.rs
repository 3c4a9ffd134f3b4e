use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::AccountError;

const FULL_NAME_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[display("{_0}")]
#[serde(transparent)]
pub struct FullName(String);

impl FullName {
    pub fn parse(raw: &str) -> Result<Self, AccountError> {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            return Err(AccountError::Validation("Full name is required".into()));
        }
        if collapsed.chars().count() > FULL_NAME_MAX_CHARS {
            return Err(AccountError::Validation(format!(
                "Full name must be at most {} characters",
                FULL_NAME_MAX_CHARS
            )));
        }
        Ok(Self(collapsed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
