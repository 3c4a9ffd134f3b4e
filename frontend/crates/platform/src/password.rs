//! Password Strength, Policy and Breach Lookup
//!
//! Client-side password handling:
//! - Strength scoring against five composition rules
//! - A policy gate ([`ClearTextPassword`]) that only admits passwords meeting
//!   every rule, zeroized on drop
//! - A k-anonymity breach lookup against the Have I Been Pwned range API
//!   that fails open when the service is unreachable
//!
//! Passwords are NFKC-normalized before any check so that visually identical
//! inputs score identically.

use std::fmt;

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::sha1_hex_upper;

// ============================================================================
// Constants
// ============================================================================

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub const MAX_PASSWORD_LENGTH: usize = 128;

/// HIBP range endpoint (k-Anonymity model)
pub const HIBP_API_URL: &str = "https://api.pwnedpasswords.com/range/";

const HIBP_PREFIX_LEN: usize = 5;

// ============================================================================
// Strength scoring
// ============================================================================

/// One composition rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordRule {
    MinLength,
    Uppercase,
    Lowercase,
    Digit,
    Special,
}

impl PasswordRule {
    pub const ALL: [PasswordRule; 5] = [
        PasswordRule::MinLength,
        PasswordRule::Uppercase,
        PasswordRule::Lowercase,
        PasswordRule::Digit,
        PasswordRule::Special,
    ];

    /// Hint shown next to the password field while the rule is unmet
    pub const fn hint(&self) -> &'static str {
        match self {
            PasswordRule::MinLength => "At least 8 characters",
            PasswordRule::Uppercase => "One uppercase letter",
            PasswordRule::Lowercase => "One lowercase letter",
            PasswordRule::Digit => "One number",
            PasswordRule::Special => "One special character",
        }
    }
}

/// Coarse label for the strength meter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StrengthLevel {
    VeryWeak,
    Weak,
    Fair,
    Good,
    Strong,
}

impl StrengthLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            StrengthLevel::VeryWeak => "Very weak",
            StrengthLevel::Weak => "Weak",
            StrengthLevel::Fair => "Fair",
            StrengthLevel::Good => "Good",
            StrengthLevel::Strong => "Strong",
        }
    }
}

impl fmt::Display for StrengthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of scoring a password
///
/// `score` is exactly the number of satisfied rules, so it grows
/// monotonically as rules are satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordStrength {
    satisfied: Vec<PasswordRule>,
}

impl PasswordStrength {
    pub fn evaluate(raw: &str) -> Self {
        let normalized: String = raw.nfkc().collect();
        let satisfied = PasswordRule::ALL
            .into_iter()
            .filter(|rule| rule_holds(*rule, &normalized))
            .collect();
        Self { satisfied }
    }

    pub fn score(&self) -> u8 {
        self.satisfied.len() as u8
    }

    pub fn max_score() -> u8 {
        PasswordRule::ALL.len() as u8
    }

    pub fn is_satisfied(&self, rule: PasswordRule) -> bool {
        self.satisfied.contains(&rule)
    }

    /// Rules still unmet, in display order
    pub fn missing(&self) -> Vec<PasswordRule> {
        PasswordRule::ALL
            .into_iter()
            .filter(|rule| !self.is_satisfied(*rule))
            .collect()
    }

    /// All five rules hold
    pub fn is_valid(&self) -> bool {
        self.score() == Self::max_score()
    }

    pub fn level(&self) -> StrengthLevel {
        match self.score() {
            0 | 1 => StrengthLevel::VeryWeak,
            2 => StrengthLevel::Weak,
            3 => StrengthLevel::Fair,
            4 => StrengthLevel::Good,
            _ => StrengthLevel::Strong,
        }
    }

    /// Fill percentage for a progress bar
    pub fn percent(&self) -> u8 {
        (u16::from(self.score()) * 100 / u16::from(Self::max_score())) as u8
    }
}

fn rule_holds(rule: PasswordRule, password: &str) -> bool {
    match rule {
        PasswordRule::MinLength => password.chars().count() >= MIN_PASSWORD_LENGTH,
        PasswordRule::Uppercase => password.chars().any(char::is_uppercase),
        PasswordRule::Lowercase => password.chars().any(char::is_lowercase),
        PasswordRule::Digit => password.chars().any(|c| c.is_ascii_digit()),
        PasswordRule::Special => password
            .chars()
            .any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Password policy violations (validation errors, surfaced inline)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password contains invalid control characters")]
    InvalidCharacter,

    #[error("Password is too weak: {}", missing_hints(.missing))]
    TooWeak { missing: Vec<PasswordRule> },

    #[error("Passwords do not match")]
    Mismatch,
}

fn missing_hints(missing: &[PasswordRule]) -> String {
    missing
        .iter()
        .map(PasswordRule::hint)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A password that satisfies every composition rule
///
/// - Zeroized on drop
/// - Not `Clone`
/// - Debug output is redacted
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    pub fn new(mut raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        let char_count = normalized.chars().count();
        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if normalized
            .chars()
            .any(|ch| ch.is_control() && ch != '\t')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        let strength = PasswordStrength::evaluate(&normalized);
        if !strength.is_valid() {
            return Err(PasswordPolicyError::TooWeak {
                missing: strength.missing(),
            });
        }

        Ok(Self(normalized))
    }

    /// Validate a password together with its confirmation field
    pub fn with_confirmation(raw: String, confirm: &str) -> Result<Self, PasswordPolicyError> {
        let password = Self::new(raw)?;
        let confirm: String = confirm.nfkc().collect();
        if password.0 != confirm {
            return Err(PasswordPolicyError::Mismatch);
        }
        Ok(password)
    }

    /// Borrow the normalized password for sending to the auth endpoint
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Breach lookup (k-Anonymity)
// ============================================================================

/// Breach lookup failure (never blocks the user; see [`check_leaked`])
#[derive(Debug, Error)]
pub enum BreachCheckError {
    #[error("Breach range request failed: {0}")]
    Request(String),

    #[error("Breach range API returned status {0}")]
    Status(u16),
}

/// Outcome of a breach lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeakCheck {
    pub leaked: bool,
    /// How many times the password appears in known breaches
    pub count: u64,
}

/// Source of HIBP-format range responses (`SUFFIX:COUNT` lines)
#[trait_variant::make(BreachRangeSource: Send)]
pub trait LocalBreachRangeSource {
    /// Fetch every hash suffix sharing the given 5-character prefix
    async fn fetch_range(&self, prefix: &str) -> Result<String, BreachCheckError>;
}

/// HIBP range API client
#[derive(Debug, Clone)]
pub struct HibpClient {
    http: reqwest::Client,
    base_url: String,
}

impl HibpClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(http, HIBP_API_URL)
    }

    pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

impl BreachRangeSource for HibpClient {
    async fn fetch_range(&self, prefix: &str) -> Result<String, BreachCheckError> {
        let url = format!("{}{}", self.base_url, prefix);
        let response = self
            .http
            .get(&url)
            .header("Add-Padding", "true")
            .send()
            .await
            .map_err(|e| BreachCheckError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BreachCheckError::Status(response.status().as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| BreachCheckError::Request(e.to_string()))
    }
}

/// Split the SHA-1 of a password into the (prefix, suffix) pair
///
/// Only the prefix ever leaves the machine.
pub fn hash_prefix_suffix(password: &str) -> (String, String) {
    let normalized: String = password.nfkc().collect();
    let hash = sha1_hex_upper(normalized.as_bytes());
    let (prefix, suffix) = hash.split_at(HIBP_PREFIX_LEN);
    (prefix.to_string(), suffix.to_string())
}

/// Count for `suffix` in a range response, 0 when absent
///
/// Padding entries carry a count of 0 and therefore never report a leak.
pub fn parse_range_count(body: &str, suffix: &str) -> u64 {
    body.lines()
        .filter_map(|line| line.trim().split_once(':'))
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(suffix))
        .and_then(|(_, count)| count.trim().parse().ok())
        .unwrap_or(0)
}

/// Check a password against known breaches
///
/// Fails open: if the range source errors, the password is reported as not
/// leaked so that a third-party outage never blocks sign-up.
pub async fn check_leaked<S: BreachRangeSource>(source: &S, password: &str) -> LeakCheck {
    let (prefix, suffix) = hash_prefix_suffix(password);

    match source.fetch_range(&prefix).await {
        Ok(body) => {
            let count = parse_range_count(&body, &suffix);
            if count > 0 {
                tracing::info!(count, "Password found in breach corpus");
            }
            LeakCheck {
                leaked: count > 0,
                count,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Breach lookup unavailable, failing open");
            LeakCheck::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
