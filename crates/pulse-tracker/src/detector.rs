//! Edge-triggered change detection between consecutive polls.
//!
//! The detector keeps one baseline record per tracking ID. Rules fire on the
//! transition between the baseline and the new observation, never on the
//! state itself, so a shipment sitting at 0.5 km does not re-notify every
//! cycle. The first observation of an ID only seeds the baseline.

use std::collections::HashMap;

use pulse_core::records::TrackingRecord;
use pulse_store::NotifyRules;

use crate::notify::{Notification, tags};

/// Compares each new observation against the previous one and produces the
/// notifications whose rule edges were crossed.
pub struct ChangeDetector {
    baselines: HashMap<String, TrackingRecord>,
    rules: NotifyRules,
}

impl ChangeDetector {
    /// Detector with the given rule configuration and no baselines.
    #[must_use]
    pub fn new(rules: NotifyRules) -> Self {
        Self {
            baselines: HashMap::new(),
            rules,
        }
    }

    /// Replace the rule configuration. Baselines are kept.
    pub fn set_rules(&mut self, rules: NotifyRules) {
        self.rules = rules;
    }

    /// Forget the baseline for `tracking_id`, so the next observation seeds
    /// instead of firing.
    pub fn reset(&mut self, tracking_id: &str) {
        let _ = self.baselines.remove(tracking_id);
    }

    /// Evaluate `record` against its baseline and replace the baseline.
    ///
    /// Returns the notifications to deliver, in rule order. Empty on the
    /// first observation of an ID.
    pub fn observe(&mut self, record: &TrackingRecord) -> Vec<Notification> {
        let Some(prev) = self
            .baselines
            .insert(record.tracking_id.clone(), record.clone())
        else {
            tracing::debug!(tracking_id = %record.tracking_id, "baseline seeded");
            return Vec::new();
        };

        let mut fired = Vec::new();

        if self.rules.status_change && prev.status != record.status {
            fired.push(Notification {
                title_key: tags::STATUS_CHANGE,
                message_params: vec![
                    record.tracking_id.clone(),
                    prev.status.as_str().to_string(),
                    record.status.as_str().to_string(),
                ],
                tag: tags::STATUS_CHANGE,
            });
        }

        if self.rules.delivered && !prev.status.is_delivered() && record.status.is_delivered() {
            fired.push(Notification {
                title_key: tags::DELIVERED,
                message_params: vec![record.tracking_id.clone()],
                tag: tags::DELIVERED,
            });
        }

        // A baseline without a distance or stop count counts as "outside the
        // threshold": the first reading inside it is still a crossing.
        if self.rules.nearby {
            if let Some(cur_km) = record.effective_distance_km() {
                let was_outside = prev
                    .effective_distance_km()
                    .is_none_or(|km| km > self.rules.nearby_km);
                if was_outside && cur_km <= self.rules.nearby_km {
                    fired.push(Notification {
                        title_key: tags::NEARBY,
                        message_params: vec![record.tracking_id.clone(), format!("{cur_km:.1}")],
                        tag: tags::NEARBY,
                    });
                }
            }
        }

        if self.rules.few_stops {
            if let Some(cur_stops) = record.stops_remaining {
                let was_above = prev
                    .stops_remaining
                    .is_none_or(|stops| stops > self.rules.few_stops_count);
                if was_above && cur_stops <= self.rules.few_stops_count {
                    fired.push(Notification {
                        title_key: tags::FEW_STOPS,
                        message_params: vec![record.tracking_id.clone(), cur_stops.to_string()],
                        tag: tags::FEW_STOPS,
                    });
                }
            }
        }

        if !fired.is_empty() {
            tracing::info!(
                tracking_id = %record.tracking_id,
                count = fired.len(),
                "notification edges crossed"
            );
        }

        fired
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
