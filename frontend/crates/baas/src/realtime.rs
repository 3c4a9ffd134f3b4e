//! Realtime Row Changes
//!
//! Consumers subscribe to a table (optionally narrowed by one column
//! predicate) and receive [`RowChange`]s on a channel until the
//! [`Subscription`] is dropped.
//!
//! [`PollingChangeFeed`] delivers inserts by polling the table endpoint for
//! rows created at or after a cursor. Rows sharing the cursor's timestamp
//! are asked for again on the next poll, since the backend stamps rows with
//! their transaction start and a late commit can land on an old timestamp.
//! Delivery is at-least-once; consumers merge idempotently by row id.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::BaasClient;
use crate::error::BaasResult;
use crate::query::{Order, Query};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    Insert,
    Update,
    Delete,
}

/// One row-level change
#[derive(Debug, Clone, PartialEq)]
pub struct RowChange {
    pub event: ChangeEvent,
    pub table: String,
    pub new: Option<Value>,
    pub old: Option<Value>,
}

/// `column = value` predicate narrowing a subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub column: String,
    pub value: String,
}

impl ColumnFilter {
    pub fn eq(column: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            column: column.into(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ColumnFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=eq.{}", self.column, self.value)
    }
}

/// Live subscription; dropping it stops delivery
pub struct Subscription {
    channel: String,
    rx: mpsc::Receiver<RowChange>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Next change, or `None` once the feed has stopped
    pub async fn recv(&mut self) -> Option<RowChange> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<RowChange> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!(channel = %self.channel, "Realtime subscription closed");
    }
}

/// Source of row changes
pub trait ChangeFeed: Send + Sync {
    /// Deliver rows created at or after `since`
    ///
    /// `since` should come from the backend's clock (a row already read);
    /// `None` falls back to the feed's own starting point.
    fn subscribe_since(
        &self,
        table: &str,
        filter: Option<ColumnFilter>,
        since: Option<DateTime<Utc>>,
    ) -> Subscription;

    fn subscribe(&self, table: &str, filter: Option<ColumnFilter>) -> Subscription {
        self.subscribe_since(table, filter, None)
    }
}

/// Rows of a table created at or after a point in time, oldest first
#[trait_variant::make(RowSource: Send)]
pub trait LocalRowSource {
    async fn rows_since(
        &self,
        table: &str,
        filter: Option<&ColumnFilter>,
        since: DateTime<Utc>,
    ) -> BaasResult<Vec<Value>>;
}

impl RowSource for BaasClient {
    async fn rows_since(
        &self,
        table: &str,
        filter: Option<&ColumnFilter>,
        since: DateTime<Utc>,
    ) -> BaasResult<Vec<Value>> {
        let mut query = Query::table(table)
            .gte(
                "created_at",
                since.to_rfc3339_opts(SecondsFormat::Micros, true),
            )
            .order("created_at", Order::Asc);
        if let Some(filter) = filter {
            query = query.eq(&filter.column, &filter.value);
        }
        self.select(&query).await
    }
}

/// Insert-only change feed driven by periodic polling
pub struct PollingChangeFeed<S> {
    source: Arc<S>,
    interval: Duration,
    start: Option<DateTime<Utc>>,
}

impl<S> PollingChangeFeed<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            interval: DEFAULT_POLL_INTERVAL,
            start: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Default cursor when a subscriber has none; otherwise "now"
    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }
}

impl<S> ChangeFeed for PollingChangeFeed<S>
where
    S: RowSource + Sync + 'static,
{
    fn subscribe_since(
        &self,
        table: &str,
        filter: Option<ColumnFilter>,
        since: Option<DateTime<Utc>>,
    ) -> Subscription {
        let channel = match &filter {
            Some(f) => format!("{}:{}", table, f),
            None => table.to_string(),
        };
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let source = Arc::clone(&self.source);
        let table = table.to_string();
        let interval = self.interval;
        let mut cursor = since.or(self.start).unwrap_or_else(Utc::now);
        // Ids already sent whose `created_at` equals the cursor
        let mut sent_at_cursor: HashSet<String> = HashSet::new();
        let log_channel = channel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let rows = match source.rows_since(&table, filter.as_ref(), cursor).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        tracing::warn!(channel = %log_channel, error = %e, "Realtime poll failed");
                        continue;
                    }
                };

                for row in rows {
                    let ts = created_at(&row);
                    let id = row_id(&row);
                    if let (Some(ts), Some(id)) = (ts, &id) {
                        if ts == cursor && sent_at_cursor.contains(id) {
                            continue;
                        }
                    }
                    if let Some(ts) = ts {
                        if ts > cursor {
                            cursor = ts;
                            sent_at_cursor.clear();
                        }
                        if ts == cursor {
                            if let Some(id) = id {
                                sent_at_cursor.insert(id);
                            }
                        }
                    }
                    let change = RowChange {
                        event: ChangeEvent::Insert,
                        table: table.clone(),
                        new: Some(row),
                        old: None,
                    };
                    if tx.send(change).await.is_err() {
                        return;
                    }
                }
            }
        });

        tracing::debug!(channel = %channel, "Realtime subscription opened");
        Subscription { channel, rx, task }
    }
}

fn created_at(row: &Value) -> Option<DateTime<Utc>> {
    let raw = row.get("created_at")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn row_id(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTable {
        rows: Mutex<Vec<Value>>,
        polls: Mutex<u32>,
    }

    impl FakeTable {
        fn push(&self, row: Value) {
            self.rows.lock().unwrap().push(row);
        }
    }

    impl RowSource for FakeTable {
        async fn rows_since(
            &self,
            _table: &str,
            filter: Option<&ColumnFilter>,
            since: DateTime<Utc>,
        ) -> BaasResult<Vec<Value>> {
            *self.polls.lock().unwrap() += 1;
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|row| created_at(row).is_some_and(|ts| ts >= since))
                .filter(|row| {
                    filter.is_none_or(|f| row[&f.column].as_str() == Some(f.value.as_str()))
                })
                .cloned()
                .collect())
        }
    }

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn message(id: &str, conversation: &str, at: &str) -> Value {
        json!({ "id": id, "conversation_id": conversation, "created_at": at })
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivers_new_rows_once_per_cursor_advance() {
        let table = Arc::new(FakeTable::default());
        table.push(message("m0", "c1", "2025-03-01T09:59:00Z"));
        let feed = PollingChangeFeed::new(Arc::clone(&table)).starting_at(start());
        let mut sub = feed.subscribe("messages", Some(ColumnFilter::eq("conversation_id", "c1")));

        table.push(message("m1", "c1", "2025-03-01T10:00:01Z"));
        table.push(message("x1", "c2", "2025-03-01T10:00:02Z"));

        let change = sub.recv().await.unwrap();
        assert_eq!(change.event, ChangeEvent::Insert);
        assert_eq!(change.new.unwrap()["id"], "m1");

        table.push(message("m2", "c1", "2025-03-01T10:00:05Z"));
        let change = sub.recv().await.unwrap();
        assert_eq!(change.new.unwrap()["id"], "m2");

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_row_on_cursor_timestamp_is_delivered() {
        let table = Arc::new(FakeTable::default());
        let feed = PollingChangeFeed::new(Arc::clone(&table)).starting_at(start());
        let mut sub = feed.subscribe("messages", None);

        table.push(message("m1", "c1", "2025-03-01T10:00:01Z"));
        assert_eq!(sub.recv().await.unwrap().new.unwrap()["id"], "m1");

        // Committed after the cursor reached 10:00:01, stamped the same
        tokio::time::sleep(Duration::from_secs(10)).await;
        table.push(message("m2", "c1", "2025-03-01T10:00:01Z"));

        let change = tokio::time::timeout(Duration::from_secs(30), sub.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(change.new.unwrap()["id"], "m2");

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_since_uses_backend_timestamp() {
        let table = Arc::new(FakeTable::default());
        // Client clock is an hour ahead of the rows
        let ahead = start() + chrono::Duration::hours(1);
        let feed = PollingChangeFeed::new(Arc::clone(&table)).starting_at(ahead);
        table.push(message("m1", "c1", "2025-03-01T10:00:00Z"));
        table.push(message("m2", "c1", "2025-03-01T10:00:03Z"));

        let mut sub = feed.subscribe_since("messages", None, Some(start()));
        assert_eq!(sub.recv().await.unwrap().new.unwrap()["id"], "m1");
        assert_eq!(sub.recv().await.unwrap().new.unwrap()["id"], "m2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let table = Arc::new(FakeTable::default());
        let feed = PollingChangeFeed::new(Arc::clone(&table))
            .with_interval(Duration::from_secs(1))
            .starting_at(start());
        let sub = feed.subscribe("messages", None);
        assert_eq!(sub.channel(), "messages");

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let polls_before = *table.polls.lock().unwrap();
        assert!(polls_before >= 2);

        drop(sub);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*table.polls.lock().unwrap(), polls_before);
    }

    #[test]
    fn test_filter_display() {
        assert_eq!(
            ColumnFilter::eq("conversation_id", "c1").to_string(),
            "conversation_id=eq.c1"
        );
    }
}
