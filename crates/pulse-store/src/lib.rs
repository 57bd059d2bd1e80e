//! # pulse-store
//!
//! Storage layer for the ParcelPulse tracking core.
//!
//! - [`kv`]: the opaque get/set/remove storage interface plus in-memory and
//!   JSON-file backends
//! - [`session`]: per-origin credential cache ([`session::SessionStore`])
//! - [`pending`]: one-shot import handoff and the detected-tracking-ID registry
//! - [`rules`]: notification rule configuration
//!
//! ## Crate Position
//!
//! Depends on `pulse-core`. Consumed by `pulse-client` and `pulse-tracker`.

#![deny(unsafe_code)]

pub mod errors;
pub mod kv;
pub mod pending;
pub mod rules;
pub mod session;

pub use errors::StoreError;
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore};
pub use pending::ImportStore;
pub use rules::NotifyRules;
pub use session::{BadgeSink, SessionStore};
