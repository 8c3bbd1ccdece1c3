//! Outbound request log
//!
//! Every network call made by the remote backend is appended here. The log
//! is an explicit handle owned by the orchestrator and injected into the
//! backend; clones share the same records and subscribers. Subscribers get
//! each record as it is appended (best effort, a full channel drops it).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRecord {
    pub label: String,
    pub method: String,
    pub url: String,
    pub request_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    pub at: DateTime<Utc>,
}

impl RequestRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.status.is_some_and(|s| (200..300).contains(&s))
    }
}

type Subscriber = mpsc::Sender<RequestRecord>;

#[derive(Clone)]
pub struct TrafficLog {
    records: Arc<RwLock<Vec<RequestRecord>>>,
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
    capacity: usize,
}

impl TrafficLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            subscribers: Arc::new(RwLock::new(Vec::new())),
            capacity,
        }
    }

    pub async fn subscribe(&self) -> mpsc::Receiver<RequestRecord> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers.write().await.push(tx);
        rx
    }

    pub async fn record(&self, record: RequestRecord) {
        {
            let subs = self.subscribers.read().await;
            for tx in subs.iter() {
                let _ = tx.try_send(record.clone());
            }
        }
        self.records.write().await.push(record);
    }

    pub async fn snapshot(&self) -> Vec<RequestRecord> {
        self.records.read().await.clone()
    }

    /// Clear recorded requests; subscribers stay attached.
    pub async fn reset(&self) {
        self.records.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for TrafficLog {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    fn record(label: &str, status: Option<u16>) -> RequestRecord {
        RequestRecord {
            label: label.to_string(),
            method: "POST".to_string(),
            url: "https://api.anthropic.com/v1/messages".to_string(),
            request_bytes: 42,
            status,
            error: None,
            duration_ms: 5,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_record_and_snapshot() {
        let log = TrafficLog::new(8);
        log.record(record("profile", Some(200))).await;
        log.record(record("match", Some(500))).await;

        let records = log.snapshot().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label, "profile");
        assert!(records[0].succeeded());
        assert!(!records[1].succeeded());
    }

    #[tokio::test]
    async fn test_subscriber_receives_records() {
        let log = TrafficLog::new(8);
        let mut rx = log.subscribe().await;
        log.record(record("profile", Some(200))).await;

        let got = timeout(Duration::from_millis(100), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.label, "profile");
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let log = TrafficLog::new(8);
        let clone = log.clone();
        clone.record(record("ping", Some(200))).await;
        assert_eq!(log.len().await, 1);
    }

    #[tokio::test]
    async fn test_reset_clears_records_only() {
        let log = TrafficLog::new(8);
        let mut rx = log.subscribe().await;
        log.record(record("a", Some(200))).await;
        log.reset().await;
        assert!(log.is_empty().await);

        log.record(record("b", Some(200))).await;
        assert_eq!(rx.recv().await.unwrap().label, "a");
        assert_eq!(rx.recv().await.unwrap().label, "b");
    }

    #[tokio::test]
    async fn test_full_subscriber_does_not_block() {
        let log = TrafficLog::new(1);
        let _rx = log.subscribe().await;
        log.record(record("a", Some(200))).await;
        log.record(record("b", Some(200))).await;
        assert_eq!(log.len().await, 2);
    }
}
