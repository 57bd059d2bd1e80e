//! Notification rule configuration.
//!
//! Four independently-toggled rules plus two numeric thresholds, persisted
//! through the storage interface under a fixed key. Missing or unreadable
//! stored values fall back to defaults rather than failing the caller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::kv::KeyValueStore;

/// Storage key for the persisted rules.
const RULES_KEY: &str = "notifSettings";

/// Default proximity threshold in km.
pub const DEFAULT_NEARBY_KM: f64 = 1.0;

/// Default stop-count threshold.
pub const DEFAULT_FEW_STOPS: u32 = 3;

/// Which notification rules are enabled, and their thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotifyRules {
    /// Fire on any status change.
    #[serde(rename = "notifStatusChange", default = "enabled")]
    pub status_change: bool,
    /// Fire on the transition into DELIVERED.
    #[serde(rename = "notifDelivered", default = "enabled")]
    pub delivered: bool,
    /// Fire when the courier first comes within `nearby_km`.
    #[serde(rename = "notifNearby", default = "enabled")]
    pub nearby: bool,
    /// Fire when remaining stops first drop to `few_stops_count` or fewer.
    #[serde(rename = "notifFewStops", default = "enabled")]
    pub few_stops: bool,
    /// Proximity threshold, km.
    #[serde(rename = "nearbyKm", default = "default_nearby_km")]
    pub nearby_km: f64,
    /// Stop-count threshold.
    #[serde(rename = "fewStopsCount", default = "default_few_stops")]
    pub few_stops_count: u32,
}

fn enabled() -> bool {
    true
}
fn default_nearby_km() -> f64 {
    DEFAULT_NEARBY_KM
}
fn default_few_stops() -> u32 {
    DEFAULT_FEW_STOPS
}

impl Default for NotifyRules {
    fn default() -> Self {
        Self {
            status_change: true,
            delivered: true,
            nearby: true,
            few_stops: true,
            nearby_km: DEFAULT_NEARBY_KM,
            few_stops_count: DEFAULT_FEW_STOPS,
        }
    }
}

impl NotifyRules {
    /// Load rules from the store, falling back to defaults when absent or
    /// unreadable.
    pub async fn load(store: &Arc<dyn KeyValueStore>) -> Self {
        match store.get(RULES_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("stored notification rules unreadable, using defaults: {e}");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!("failed to load notification rules, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Persist the rules.
    pub async fn save(&self, store: &Arc<dyn KeyValueStore>) -> Result<(), StoreError> {
        let raw = serde_json::to_string(self)?;
        store.set(RULES_KEY, &raw).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
