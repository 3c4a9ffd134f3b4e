//! TOTP Enrollment
//!
//! What the setup function hands back: the shared secret and its
//! `otpauth://` URL. The QR image is rendered locally from the URL when the
//! function does not include one.

use serde::Deserialize;
use totp_rs::TOTP;

use crate::error::AccountError;

#[derive(Clone, Deserialize)]
pub struct TotpEnrollment {
    /// Base32 secret for manual entry
    pub secret: String,
    #[serde(alias = "uri", alias = "otpauthUrl")]
    pub otpauth_url: String,
    /// PNG, base64-encoded
    #[serde(default, alias = "qrCode", alias = "qr_code")]
    pub qr_code_base64: Option<String>,
}

impl TotpEnrollment {
    fn totp(&self) -> Result<TOTP, AccountError> {
        TOTP::from_url(&self.otpauth_url)
            .map_err(|e| AccountError::Internal(format!("Invalid otpauth URL: {}", e)))
    }

    /// Issuer and account label shown in the authenticator app
    pub fn label(&self) -> Result<(Option<String>, String), AccountError> {
        let totp = self.totp()?;
        Ok((totp.issuer.clone(), totp.account_name.clone()))
    }

    /// QR code as base64 PNG, rendering it if the backend did not
    pub fn qr_png_base64(&self) -> Result<String, AccountError> {
        if let Some(qr) = &self.qr_code_base64 {
            return Ok(qr.clone());
        }
        self.totp()?
            .get_qr_base64()
            .map_err(|e| AccountError::Internal(format!("Failed to render QR code: {}", e)))
    }

    /// Secret in groups of four for easier typing
    pub fn grouped_secret(&self) -> String {
        self.secret
            .chars()
            .collect::<Vec<_>>()
            .chunks(4)
            .map(|chunk| chunk.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Debug for TotpEnrollment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TotpEnrollment")
            .field("secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
