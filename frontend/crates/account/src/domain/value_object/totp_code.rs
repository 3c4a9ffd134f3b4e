//! TOTP Code Value Object
//!
//! A six-digit authenticator code, checked locally before any verify call.

use std::fmt;

use crate::error::AccountError;

pub const TOTP_CODE_LENGTH: usize = 6;

#[derive(Clone, PartialEq, Eq)]
pub struct TotpCode(String);

impl TotpCode {
    /// Exactly six ASCII digits, surrounding whitespace ignored
    pub fn parse(raw: &str) -> Result<Self, AccountError> {
        let code = raw.trim();
        if code.len() != TOTP_CODE_LENGTH || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AccountError::Validation(format!(
                "Enter the {}-digit code from your authenticator app",
                TOTP_CODE_LENGTH
            )));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TotpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TotpCode(******)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_six_digits() {
        assert_eq!(TotpCode::parse(" 012345\n").unwrap().as_str(), "012345");
    }

    #[test]
    fn test_rejects_everything_else() {
        for bad in ["", "12345", "1234567", "12a456", "123 456", "١٢٣٤٥٦"] {
            assert!(TotpCode::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_debug_hides_digits() {
        let code = TotpCode::parse("987654").unwrap();
        assert!(!format!("{:?}", code).contains("987654"));
    }
}
