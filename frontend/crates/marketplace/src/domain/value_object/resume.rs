//! Resume File
//!
//! Validated before upload: PDF only, at most 5 MB. Stored under the
//! owner's id so bucket policies can scope access by path prefix.

use std::path::Path;

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::error::{MarketError, MarketResult};

pub const RESUME_BUCKET: &str = "resumes";
pub const RESUME_MAX_BYTES: u64 = 5 * 1024 * 1024;
pub const RESUME_CONTENT_TYPE: &str = "application/pdf";

const PDF_MAGIC: &[u8] = b"%PDF-";

pub struct ResumeFile {
    file_name: String,
    bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> MarketResult<Self> {
        let file_name = Path::new(file_name.trim())
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        if file_name.is_empty() {
            return Err(MarketError::Validation("Choose a file to upload".into()));
        }

        let is_pdf_name = Path::new(&file_name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf_name || !bytes.starts_with(PDF_MAGIC) {
            return Err(MarketError::ResumeNotPdf);
        }

        let size = bytes.len() as u64;
        if size > RESUME_MAX_BYTES {
            return Err(MarketError::ResumeTooLarge { size });
        }

        Ok(Self { file_name, bytes })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// `<user_id>/<unix millis>_<sanitized name>`
    pub fn storage_path(&self, owner: &UserId, at: DateTime<Utc>) -> String {
        format!(
            "{}/{}_{}",
            owner,
            at.timestamp_millis(),
            sanitize_file_name(&self.file_name)
        )
    }
}

impl std::fmt::Debug for ResumeFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeFile")
            .field("file_name", &self.file_name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Keep ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Whether a storage key belongs to `owner`
pub fn is_owned_by(path: &str, owner: &UserId) -> bool {
    path.split_once('/')
        .is_some_and(|(prefix, rest)| prefix == owner.to_string() && !rest.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pdf(len: usize) -> Vec<u8> {
        let mut bytes = PDF_MAGIC.to_vec();
        bytes.resize(len.max(PDF_MAGIC.len()), b' ');
        bytes
    }

    #[test]
    fn test_rejects_non_pdf() {
        assert!(matches!(
            ResumeFile::new("cv.docx", pdf(100)),
            Err(MarketError::ResumeNotPdf)
        ));
        assert!(matches!(
            ResumeFile::new("cv.pdf", b"PK\x03\x04 not a pdf".to_vec()),
            Err(MarketError::ResumeNotPdf)
        ));
        assert_eq!(
            ResumeFile::new("cv.png", vec![]).unwrap_err().to_string(),
            "Only PDF files are accepted for resumes"
        );
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        assert!(ResumeFile::new("cv.pdf", pdf(RESUME_MAX_BYTES as usize)).is_ok());
        assert!(matches!(
            ResumeFile::new("cv.pdf", pdf(RESUME_MAX_BYTES as usize + 1)),
            Err(MarketError::ResumeTooLarge { .. })
        ));
    }

    #[test]
    fn test_storage_path_is_under_owner() {
        let owner = UserId::new();
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let file = ResumeFile::new("/home/ada/My CV (final).PDF", pdf(10)).unwrap();

        let path = file.storage_path(&owner, at);

        assert_eq!(path, format!("{}/1735787045000_My_CV__final_.PDF", owner));
        assert!(is_owned_by(&path, &owner));
        assert!(!is_owned_by(&path, &UserId::new()));
    }
}
