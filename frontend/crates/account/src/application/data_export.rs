//! Personal Data Export

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::crypto::sha256_hex;
use platform::storage::KeyValueStore;

use crate::application::session::SessionStore;
use crate::domain::repository::DataExporter;
use crate::error::{AccountError, AccountResult};

/// A ready-to-save export document
#[derive(Debug, Clone)]
pub struct DataExport {
    pub file_name: String,
    /// Pretty-printed JSON
    pub contents: String,
    /// SHA-256 of `contents`, lowercase hex
    pub checksum: String,
    pub exported_at: DateTime<Utc>,
}

pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("microintern-export-{}.json", at.format("%Y-%m-%d"))
}

pub struct DataExportUseCase<E, K>
where
    E: DataExporter,
    K: KeyValueStore,
{
    exporter: Arc<E>,
    store: Arc<SessionStore<K>>,
}

impl<E, K> DataExportUseCase<E, K>
where
    E: DataExporter,
    K: KeyValueStore,
{
    pub fn new(exporter: Arc<E>, store: Arc<SessionStore<K>>) -> Self {
        Self { exporter, store }
    }

    pub async fn execute(&self) -> AccountResult<DataExport> {
        let session = self.store.require()?;
        let document = self.exporter.export().await?;
        let contents = serde_json::to_string_pretty(&document)
            .map_err(|e| AccountError::Internal(format!("Export serialization failed: {}", e)))?;

        let exported_at = Utc::now();
        let checksum = sha256_hex(contents.as_bytes());
        tracing::info!(
            user_id = %session.user_id(),
            bytes = contents.len(),
            checksum = %checksum,
            "User data exported"
        );

        Ok(DataExport {
            file_name: export_file_name(exported_at),
            contents,
            checksum,
            exported_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_name_is_dated() {
        let at = Utc.with_ymd_and_hms(2025, 3, 9, 23, 59, 0).unwrap();
        assert_eq!(export_file_name(at), "microintern-export-2025-03-09.json");
    }
}
