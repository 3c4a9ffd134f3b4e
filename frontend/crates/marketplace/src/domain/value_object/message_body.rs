use crate::error::{MarketError, MarketResult};

pub const MESSAGE_MAX_CHARS: usize = 2000;

/// Text of a chat message, trimmed and non-empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody(String);

impl MessageBody {
    pub fn parse(raw: &str) -> MarketResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MarketError::Validation("Message cannot be empty".into()));
        }
        if trimmed.chars().count() > MESSAGE_MAX_CHARS {
            return Err(MarketError::Validation(format!(
                "Message must be at most {} characters",
                MESSAGE_MAX_CHARS
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}
