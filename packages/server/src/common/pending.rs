//! Records waiting for confirmation.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use event_extraction::{EventRecord, QueuedUrl};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A workflow result the caller has not confirmed yet.
#[derive(Clone, Debug)]
pub struct PendingRecord {
    pub record: EventRecord,
    /// Source label written to the ledger (URL or input kind)
    pub source: String,
    /// Queued URL to remove once confirmed, for records pulled from the queue
    pub queue_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PendingRecord {
    pub fn new(record: EventRecord, source: impl Into<String>) -> Self {
        Self {
            record,
            source: source.into(),
            queue_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn from_queue(mut self, url: impl Into<String>) -> Self {
        self.queue_url = Some(url.into());
        self
    }
}

/// In-memory pending store
///
/// Entries expire after `ttl`; when full, the oldest entry is evicted.
/// Queued URLs handed out for processing are claimed for the same `ttl`, so
/// concurrent pulls see different URLs.
pub struct PendingRecords {
    records: RwLock<HashMap<Uuid, PendingRecord>>,
    claims: RwLock<HashMap<String, DateTime<Utc>>>,
    ttl: chrono::Duration,
    capacity: usize,
}

impl PendingRecords {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            claims: RwLock::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500)),
            capacity: capacity.max(1),
        }
    }

    fn is_expired(&self, pending: &PendingRecord, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(pending.created_at) >= self.ttl
    }

    /// Store a record and return its request id
    pub async fn insert(&self, pending: PendingRecord) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut records = self.records.write().await;

        records.retain(|_, p| !self.is_expired(p, now));
        while records.len() >= self.capacity {
            let oldest = records
                .iter()
                .min_by_key(|(_, p)| p.created_at)
                .map(|(id, _)| *id);
            match oldest {
                Some(oldest) => {
                    tracing::debug!(request_id = %oldest, "Evicting oldest pending record");
                    records.remove(&oldest);
                }
                None => break,
            }
        }

        records.insert(id, pending);
        id
    }

    /// Remove and return a live record
    pub async fn take(&self, id: &Uuid) -> Option<PendingRecord> {
        let mut records = self.records.write().await;
        let pending = records.remove(id)?;
        (!self.is_expired(&pending, Utc::now())).then_some(pending)
    }

    /// Put a record back under its old id (after a failed confirmation)
    pub async fn restore(&self, id: Uuid, pending: PendingRecord) {
        self.records.write().await.insert(id, pending);
    }

    /// Claim the first of `candidates` nobody else is working on.
    pub async fn claim_first<'a>(&self, candidates: &'a [QueuedUrl]) -> Option<&'a QueuedUrl> {
        let now = Utc::now();
        let mut claims = self.claims.write().await;
        claims.retain(|_, claimed_at| now.signed_duration_since(*claimed_at) < self.ttl);

        let free = candidates.iter().find(|q| !claims.contains_key(&q.url))?;
        claims.insert(free.url.clone(), now);
        Some(free)
    }

    /// Give a claimed URL back to the queue.
    pub async fn release(&self, url: &str) {
        self.claims.write().await.remove(url);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
