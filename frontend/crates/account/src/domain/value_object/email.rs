//! Email Value Object
//!
//! Syntactic checks only; the auth service confirms ownership by mail.

use std::fmt;
use std::str::FromStr;

use crate::error::AccountError;

/// RFC 5321 path limit
const EMAIL_MAX_LENGTH: usize = 254;
const LOCAL_MAX_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Trim, lowercase and validate
    pub fn parse(raw: &str) -> Result<Self, AccountError> {
        let email = raw.trim().to_lowercase();

        if email.is_empty() {
            return Err(AccountError::Validation("Email is required".into()));
        }
        if email.len() > EMAIL_MAX_LENGTH {
            return Err(AccountError::Validation(format!(
                "Email must be at most {} characters",
                EMAIL_MAX_LENGTH
            )));
        }

        let Some((local, domain)) = email.split_once('@') else {
            return Err(AccountError::Validation("Enter a valid email address".into()));
        };
        if !valid_local(local) || !valid_domain(domain) {
            return Err(AccountError::Validation("Enter a valid email address".into()));
        }

        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `a***@example.com`, for logs
    pub fn masked(&self) -> String {
        match self.0.split_once('@') {
            Some((local, domain)) => {
                let first = local.chars().next().unwrap_or('*');
                format!("{}***@{}", first, domain)
            }
            None => "***".to_string(),
        }
    }
}

fn valid_local(local: &str) -> bool {
    !local.is_empty()
        && local.len() <= LOCAL_MAX_LENGTH
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.chars().any(|c| c.is_whitespace() || c == '@')
}

fn valid_domain(domain: &str) -> bool {
    if !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

impl FromStr for Email {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
