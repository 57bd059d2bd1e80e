//! Notification descriptors and the consumed delivery sink.
//!
//! The core never renders user-facing text; it emits a localization key plus
//! positional parameters and a stable tag, and the host decides presentation.
//! Tags are fixed strings so repeated notifications for the same rule and
//! shipment coalesce in the host's notification center.

/// Stable notification tags, one per rule.
pub mod tags {
    /// Shipment status changed.
    pub const STATUS_CHANGE: &str = "status_change";
    /// Shipment transitioned into delivered.
    pub const DELIVERED: &str = "delivered";
    /// Courier crossed the proximity threshold.
    pub const NEARBY: &str = "nearby";
    /// Remaining stops dropped to the threshold.
    pub const FEW_STOPS: &str = "few_stops";
}

/// One notification to be rendered and delivered by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Localization key for the title/body template.
    pub title_key: &'static str,
    /// Positional parameters for the template.
    pub message_params: Vec<String>,
    /// Coalescing tag, one of [`tags`].
    pub tag: &'static str,
}

/// Consumed delivery interface. Best-effort: delivery failures are the
/// host's concern and never propagate back into the polling loop.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification.
    async fn deliver(&self, notification: &Notification);
}

/// Sink that drops every notification. Default when the host wires none.
pub struct NullSink;

#[async_trait::async_trait]
impl NotificationSink for NullSink {
    async fn deliver(&self, _notification: &Notification) {}
}
