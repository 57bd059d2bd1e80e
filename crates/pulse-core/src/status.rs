//! Canonical shipment status taxonomy.
//!
//! The carrier's raw vocabulary is wider than what the core needs, so raw
//! values are folded into a finite set of canonical states. Values outside
//! the mapping table are carried through as-is rather than forced to
//! `Unknown`, so a new carrier state stays visible downstream.

use serde::{Deserialize, Serialize};

/// Canonical shipment state used throughout the core.
///
/// Serialized as the plain status string (`"IN_TRANSIT"`, `"DELIVERED"`,
/// ...), including the passthrough variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShipmentStatus {
    /// Shipment registered but not yet moving.
    NotReady,
    /// Moving through the carrier network.
    InTransit,
    /// On the delivery vehicle.
    OutForDelivery,
    /// Delivered to the destination.
    Delivered,
    /// Cancelled by the carrier or the sender.
    Cancelled,
    /// No status information available.
    Unknown,
    /// Unrecognized raw value, uppercased and passed through.
    Other(String),
}

impl ShipmentStatus {
    /// Normalize a raw carrier status value.
    ///
    /// Case-insensitive. An empty or whitespace-only value yields
    /// [`ShipmentStatus::Unknown`]; anything outside the mapping table is
    /// kept as [`ShipmentStatus::Other`] with the uppercased raw value.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        match upper.as_str() {
            "" => Self::Unknown,
            "DELIVERED" => Self::Delivered,
            "OUT_FOR_DELIVERY" | "PICKED_UP" | "PENDING_PICKUP" => Self::OutForDelivery,
            "IN_TRANSIT" | "SHIPPED" => Self::InTransit,
            "NOT_READY" | "CREATED" => Self::NotReady,
            "CANCELLED" => Self::Cancelled,
            "UNKNOWN" => Self::Unknown,
            _ => Self::Other(upper),
        }
    }

    /// The wire representation of this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotReady => "NOT_READY",
            Self::InTransit => "IN_TRANSIT",
            Self::OutForDelivery => "OUT_FOR_DELIVERY",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
            Self::Other(raw) => raw,
        }
    }

    /// Whether the shipment reached its terminal delivered state.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl From<String> for ShipmentStatus {
    fn from(raw: String) -> Self {
        Self::from_raw(&raw)
    }
}

impl From<ShipmentStatus> for String {
    fn from(status: ShipmentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
