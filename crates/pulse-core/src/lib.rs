//! # pulse-core
//!
//! Foundation types and utilities for the ParcelPulse tracking core.
//!
//! This crate provides the shared vocabulary the other pulse crates depend on:
//!
//! - **Status**: [`status::ShipmentStatus`] canonical taxonomy with raw passthrough
//! - **Records**: [`records::TrackingRecord`], [`records::SessionRecord`],
//!   [`records::PendingImport`] wire types
//! - **Geo**: [`geo::haversine_km`] great-circle baseline distance
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other pulse crates.

#![deny(unsafe_code)]

pub mod geo;
pub mod records;
pub mod status;

/// Current time as epoch milliseconds.
///
/// All persisted timestamps (`capturedAt`, `updatedAt`, `createdAt`) use
/// epoch millis, matching the stored wire format.
#[must_use]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
