//! Form Draft Autosave
//!
//! Every change to a form reschedules a single debounced write of the whole
//! form snapshot into a [`KeyValueStore`]. A snapshot is only written when
//! at least one field holds something.
//!
//! Lifecycle, as a form would use it:
//! 1. on mount: [`DraftAutosave::has_draft`] decides whether to offer "restore"
//! 2. on each edit: [`DraftAutosave::on_change`]
//! 3. restore: [`DraftAutosave::restore`] hands the snapshot to a callback and
//!    leaves the stored draft in place
//! 4. on submit or discard: [`DraftAutosave::clear`]
//!
//! One writer per form id is assumed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use kernel::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::storage::KeyValueStore;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

const DEFAULT_KEY_PREFIX: &str = "form_draft_";

/// Autosave settings
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    pub debounce: Duration,
    pub key_prefix: String,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DraftEnvelope {
    data: Value,
    #[serde(rename = "savedAt")]
    saved_at: i64,
}

/// Debounced draft persistence for one form
pub struct DraftAutosave<S: KeyValueStore + 'static> {
    store: Arc<S>,
    key: String,
    debounce: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<S: KeyValueStore + 'static> DraftAutosave<S> {
    pub fn new(store: Arc<S>, form_id: &str, config: &AutosaveConfig) -> Self {
        Self {
            store,
            key: format!("{}{}", config.key_prefix, form_id),
            debounce: config.debounce,
            pending: Mutex::new(None),
        }
    }

    /// Whether a draft exists for this form (checked on mount)
    pub fn has_draft(&self) -> bool {
        match self.store.get(&self.key) {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Draft lookup failed");
                false
            }
        }
    }

    /// Record a change; persists `snapshot` once no further change arrives
    /// within the debounce delay
    ///
    /// Must be called from within a Tokio runtime.
    pub fn on_change(&self, snapshot: Value) {
        let deadline = Instant::now() + self.debounce;
        let store = Arc::clone(&self.store);
        let key = self.key.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if !has_content(&snapshot) {
                return;
            }
            if let Err(e) = persist(store.as_ref(), &key, snapshot) {
                tracing::warn!(key = %key, error = %e, "Draft autosave failed");
            }
        });

        self.replace_pending(Some(task));
    }

    /// Persist immediately, cancelling any pending write
    pub fn flush(&self, snapshot: Value) -> AppResult<bool> {
        self.replace_pending(None);
        if !has_content(&snapshot) {
            return Ok(false);
        }
        persist(self.store.as_ref(), &self.key, snapshot)?;
        Ok(true)
    }

    /// Last persisted snapshot, if any
    pub fn load(&self) -> AppResult<Option<Value>> {
        Ok(self.load_envelope()?.map(|envelope| envelope.data))
    }

    /// When the stored draft was written
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        let envelope = self.load_envelope().ok()??;
        Utc.timestamp_millis_opt(envelope.saved_at).single()
    }

    /// Hand the stored snapshot to `apply`; the draft stays stored
    ///
    /// Returns `false` when there is nothing to restore.
    pub fn restore<F>(&self, apply: F) -> AppResult<bool>
    where
        F: FnOnce(Value),
    {
        match self.load()? {
            Some(data) => {
                apply(data);
                tracing::debug!(key = %self.key, "Draft restored");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the stored draft and cancel any pending write
    pub fn clear(&self) -> AppResult<()> {
        self.replace_pending(None);
        self.store.remove(&self.key)
    }

    fn load_envelope(&self) -> AppResult<Option<DraftEnvelope>> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AppError::internal("Saved draft is corrupted").with_source(e))
    }

    fn replace_pending(&self, next: Option<JoinHandle<()>>) {
        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = next;
    }
}

impl<S: KeyValueStore + 'static> Drop for DraftAutosave<S> {
    fn drop(&mut self) {
        self.replace_pending(None);
    }
}

fn persist<S: KeyValueStore + ?Sized>(store: &S, key: &str, data: Value) -> AppResult<()> {
    let envelope = DraftEnvelope {
        data,
        saved_at: Utc::now().timestamp_millis(),
    };
    let raw = serde_json::to_string(&envelope)
        .map_err(|e| AppError::internal("Draft serialization failed").with_source(e))?;
    store.set(key, &raw)?;
    tracing::debug!(key, "Draft saved");
    Ok(())
}

/// At least one field holds something worth keeping
pub fn has_content(snapshot: &Value) -> bool {
    match snapshot {
        Value::Object(fields) => fields.values().any(field_has_content),
        other => field_has_content(other),
    }
}

fn field_has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}
