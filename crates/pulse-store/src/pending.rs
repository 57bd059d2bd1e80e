//! Import handoff and detected-tracking-ID registry.
//!
//! A [`PendingImport`] is a one-shot handoff record: an external collaborator
//! reads it, acknowledges it, and the acknowledgement deletes it
//! (at-most-once). The detected-ID registry is a separate, growing map of
//! tracking IDs spotted on carrier pages, kept so the host can offer an
//! import even when no collaborator consumed the handoff in time.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use pulse_core::now_ms;
use pulse_core::records::PendingImport;

use crate::errors::StoreError;
use crate::kv::KeyValueStore;

/// Storage key for the pending import handoff.
const PENDING_IMPORT_KEY: &str = "pendingImport";

/// Storage key for the detected-ID registry.
const DETECTED_IDS_KEY: &str = "detectedTrackingIds";

/// Carrier tracking identifiers embedded in page text.
fn tracking_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(TBA\d{12,})\b").expect("static pattern"))
}

/// Extract tracking IDs from free-form page text, de-duplicated in order of
/// first appearance.
#[must_use]
pub fn extract_tracking_ids(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for capture in tracking_id_pattern().find_iter(text) {
        let id = capture.as_str().to_string();
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

/// One detected tracking ID with where and when it was spotted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedId {
    /// Domain the ID was detected on.
    pub domain: String,
    /// Page the ID was detected on.
    #[serde(default)]
    pub source_url: String,
    /// Detection time (epoch ms).
    pub detected_at: i64,
}

/// Access to the pending-import handoff and the detected-ID registry.
pub struct ImportStore {
    store: Arc<dyn KeyValueStore>,
}

impl ImportStore {
    /// Create an import store over the given backing store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write a new handoff record, replacing any unconsumed one.
    pub async fn save(&self, tracking_ids: Vec<String>, domain: &str) -> Result<(), StoreError> {
        let import = PendingImport {
            tracking_ids,
            domain: domain.to_string(),
            created_at: now_ms(),
        };
        let raw = serde_json::to_string(&import)?;
        self.store.set(PENDING_IMPORT_KEY, &raw).await
    }

    /// Read the current handoff record without consuming it.
    pub async fn peek(&self) -> Result<Option<PendingImport>, StoreError> {
        match self.store.get(PENDING_IMPORT_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Acknowledge the handoff, deleting it.
    pub async fn acknowledge(&self) -> Result<(), StoreError> {
        self.store.remove(PENDING_IMPORT_KEY).await
    }

    /// Read and consume the handoff in one step.
    pub async fn take(&self) -> Result<Option<PendingImport>, StoreError> {
        let import = self.peek().await?;
        if import.is_some() {
            self.acknowledge().await?;
        }
        Ok(import)
    }

    /// Record tracking IDs detected on a carrier page.
    ///
    /// Existing entries for the same ID are refreshed in place. Returns the
    /// total number of distinct detected IDs.
    pub async fn record_detected(
        &self,
        tracking_ids: &[String],
        domain: &str,
        source_url: &str,
    ) -> Result<usize, StoreError> {
        let mut detected = self.detected().await?;
        for id in tracking_ids {
            let _ = detected.insert(
                id.clone(),
                DetectedId {
                    domain: domain.to_string(),
                    source_url: source_url.to_string(),
                    detected_at: now_ms(),
                },
            );
        }
        let raw = serde_json::to_string(&detected)?;
        self.store.set(DETECTED_IDS_KEY, &raw).await?;
        tracing::debug!(count = tracking_ids.len(), domain, "tracking IDs detected");
        Ok(detected.len())
    }

    /// All detected tracking IDs.
    pub async fn detected(&self) -> Result<HashMap<String, DetectedId>, StoreError> {
        match self.store.get(DETECTED_IDS_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(HashMap::new()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;

    fn store() -> ImportStore {
        ImportStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn extracts_carrier_ids_from_text() {
        let text = "Spedizione TBA305614523100 in arrivo. Altro: TBA305614523100, \
                    TBA999888777666 e un falso TBA123.";
        let ids = extract_tracking_ids(text);
        assert_eq!(
            ids,
            vec![
                "TBA305614523100".to_string(),
                "TBA999888777666".to_string()
            ]
        );
    }

    #[test]
    fn short_ids_are_not_matched() {
        assert!(extract_tracking_ids("TBA12345").is_empty());
    }

    #[tokio::test]
    async fn handoff_is_consumed_at_most_once() {
        let store = store();
        store
            .save(vec!["TBA305614523100".to_string()], "www.amazon.it")
            .await
            .unwrap();

        let first = store.take().await.unwrap().unwrap();
        assert_eq!(first.tracking_ids, vec!["TBA305614523100".to_string()]);
        assert_eq!(first.domain, "www.amazon.it");

        assert!(store.take().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn peek_does_not_consume() {
        let store = store();
        store
            .save(vec!["TBA305614523100".to_string()], "www.amazon.it")
            .await
            .unwrap();

        assert!(store.peek().await.unwrap().is_some());
        assert!(store.peek().await.unwrap().is_some());

        store.acknowledge().await.unwrap();
        assert!(store.peek().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn new_handoff_replaces_unconsumed_one() {
        let store = store();
        store
            .save(vec!["TBA111111111111".to_string()], "www.amazon.it")
            .await
            .unwrap();
        store
            .save(vec!["TBA222222222222".to_string()], "www.amazon.de")
            .await
            .unwrap();

        let import = store.take().await.unwrap().unwrap();
        assert_eq!(import.domain, "www.amazon.de");
    }

    #[tokio::test]
    async fn detected_registry_accumulates_and_counts() {
        let store = store();
        let count = store
            .record_detected(
                &["TBA111111111111".to_string()],
                "www.amazon.it",
                "https://www.amazon.it/orders",
            )
            .await
            .unwrap();
        assert_eq!(count, 1);

        let count = store
            .record_detected(
                &["TBA111111111111".to_string(), "TBA222222222222".to_string()],
                "www.amazon.it",
                "https://www.amazon.it/ship-track",
            )
            .await
            .unwrap();
        assert_eq!(count, 2);

        let detected = store.detected().await.unwrap();
        // Re-detection refreshed the existing entry's source
        assert_eq!(
            detected["TBA111111111111"].source_url,
            "https://www.amazon.it/ship-track"
        );
    }
}
