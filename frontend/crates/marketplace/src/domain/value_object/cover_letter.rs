use derive_more::Display;
use serde::Serialize;

use crate::error::{MarketError, MarketResult};

pub const COVER_LETTER_MIN_CHARS: usize = 50;
pub const COVER_LETTER_MAX_CHARS: usize = 2000;

/// Optional pitch attached to an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Display)]
#[display("{_0}")]
#[serde(transparent)]
pub struct CoverLetter(String);

impl CoverLetter {
    /// Blank input means "no cover letter"
    pub fn parse(raw: &str) -> MarketResult<Option<Self>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let chars = trimmed.chars().count();
        if chars < COVER_LETTER_MIN_CHARS {
            return Err(MarketError::Validation(format!(
                "Cover letter must be at least {} characters",
                COVER_LETTER_MIN_CHARS
            )));
        }
        if chars > COVER_LETTER_MAX_CHARS {
            return Err(MarketError::Validation(format!(
                "Cover letter must be at most {} characters (got {})",
                COVER_LETTER_MAX_CHARS, chars
            )));
        }
        Ok(Some(Self(trimmed.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}
