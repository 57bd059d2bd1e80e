//! # pulse-tracker
//!
//! Live tracking loop for the ParcelPulse core.
//!
//! - [`notify`]: notification descriptors and the consumed delivery sink
//! - [`detector`]: edge-triggered change detection between consecutive polls
//! - [`poller`]: the cancellation-safe polling schedule
//!
//! ## Crate Position
//!
//! Top of the workspace: depends on `pulse-core`, `pulse-store`, and
//! `pulse-client`. A host embeds this crate and wires its own
//! [`notify::NotificationSink`] and [`poller::DisplaySink`].

#![deny(unsafe_code)]

pub mod detector;
pub mod notify;
pub mod poller;

pub use detector::ChangeDetector;
pub use notify::{Notification, NotificationSink};
pub use poller::{Poller, PollerCommand, PollerConfig};
