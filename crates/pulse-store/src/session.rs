//! Per-origin credential cache.
//!
//! One [`SessionRecord`] per carrier domain, persisted as a single JSON map
//! under the `sessions` key. Every mutation pushes the stored-domain count to
//! the badge collaborator so the host UI reflects connection state.

use std::collections::HashMap;
use std::sync::Arc;

use pulse_core::now_ms;
use pulse_core::records::{SessionPatch, SessionRecord};

use crate::errors::StoreError;
use crate::kv::KeyValueStore;

/// Storage key holding the domain → record map.
const SESSIONS_KEY: &str = "sessions";

/// External badge/indicator collaborator.
///
/// Receives the number of stored domains after every mutating call.
pub trait BadgeSink: Send + Sync {
    /// Update the indicator with the current stored-domain count.
    fn update_count(&self, count: usize);
}

/// Badge sink that drops updates. Used when no host indicator is attached.
pub struct NullBadge;

impl BadgeSink for NullBadge {
    fn update_count(&self, _count: usize) {}
}

/// CRUD over the per-domain credential records.
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    badge: Arc<dyn BadgeSink>,
}

impl SessionStore {
    /// Create a store with no badge collaborator attached.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            badge: Arc::new(NullBadge),
        }
    }

    /// Attach a badge collaborator notified on every mutation.
    #[must_use]
    pub fn with_badge(mut self, badge: Arc<dyn BadgeSink>) -> Self {
        self.badge = badge;
        self
    }

    /// Look up the record for `domain`.
    pub async fn get(&self, domain: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.load_all().await?.remove(domain))
    }

    /// All stored records, keyed by domain.
    pub async fn get_all(&self) -> Result<HashMap<String, SessionRecord>, StoreError> {
        self.load_all().await
    }

    /// The most recently updated record, if any.
    ///
    /// Used by the tracking client to resolve a target domain when the
    /// caller does not name one.
    pub async fn most_recent(&self) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self
            .load_all()
            .await?
            .into_values()
            .max_by_key(|record| record.updated_at))
    }

    /// Merge `patch` onto the record for `domain`, creating it if absent.
    ///
    /// Always advances `updated_at`; the value is clamped so it never moves
    /// backwards even if the wall clock does.
    pub async fn put(
        &self,
        domain: &str,
        patch: SessionPatch,
    ) -> Result<SessionRecord, StoreError> {
        let mut sessions = self.load_all().await?;
        let now = now_ms();

        let record = match sessions.remove(domain) {
            Some(mut existing) => {
                if let Some(token) = patch.csrf_token {
                    existing.csrf_token = token;
                }
                if let Some(cookies) = patch.cookie_header {
                    existing.cookie_header = cookies;
                }
                if let Some(url) = patch.source_url {
                    existing.source_url = url;
                }
                if let Some(at) = patch.captured_at {
                    existing.captured_at = at;
                }
                existing.updated_at = now.max(existing.updated_at);
                existing
            }
            None => SessionRecord {
                domain: domain.to_string(),
                csrf_token: patch.csrf_token.unwrap_or_default(),
                cookie_header: patch.cookie_header.unwrap_or_default(),
                source_url: patch.source_url.unwrap_or_default(),
                captured_at: patch.captured_at.unwrap_or(now),
                updated_at: now,
            },
        };

        let _ = sessions.insert(domain.to_string(), record.clone());
        self.save_all(&sessions).await?;
        tracing::debug!(domain, "session record updated");
        Ok(record)
    }

    /// Remove the record for `domain`.
    pub async fn delete(&self, domain: &str) -> Result<(), StoreError> {
        let mut sessions = self.load_all().await?;
        if sessions.remove(domain).is_some() {
            self.save_all(&sessions).await?;
        } else {
            self.badge.update_count(sessions.len());
        }
        Ok(())
    }

    /// Remove every stored record.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.save_all(&HashMap::new()).await
    }

    async fn load_all(&self) -> Result<HashMap<String, SessionRecord>, StoreError> {
        match self.store.get(SESSIONS_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(HashMap::new()),
        }
    }

    async fn save_all(
        &self,
        sessions: &HashMap<String, SessionRecord>,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(sessions)?;
        self.store.set(SESSIONS_KEY, &raw).await?;
        self.badge.update_count(sessions.len());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
