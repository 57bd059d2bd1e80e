//! The live tracking poll loop.
//!
//! One task owns the schedule: an immediate poll on entry, then a fixed
//! countdown driven by one-second ticks, with a full poll when the countdown
//! reaches zero. On-demand refreshes and shipment switches poll immediately
//! and reset the countdown. Fetch failures are reported to the display sink
//! and never alter the schedule; only cancellation ends the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

use pulse_core::records::TrackingRecord;
use pulse_client::FetchError;
use pulse_client::routing::RouteClient;
use pulse_client::tracking::TrackingClient;

use crate::detector::ChangeDetector;
use crate::notify::NotificationSink;

/// Poll loop timing.
#[derive(Clone, Debug)]
pub struct PollerConfig {
    /// Time between full polls.
    pub poll_interval: Duration,
    /// Countdown tick granularity.
    pub countdown_tick: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            countdown_tick: Duration::from_secs(1),
        }
    }
}

/// Outcome of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerResult {
    /// The loop was cancelled externally. The only way it ends.
    Cancelled,
}

/// Commands accepted by a running poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerCommand {
    /// Poll now and restart the countdown.
    RefreshNow,
    /// Switch to another shipment, poll it now, restart the countdown.
    Switch(String),
}

/// One delivered shipment update: the fresh record plus whatever rule edges
/// it crossed.
#[derive(Clone, Debug, PartialEq)]
pub struct ShipmentUpdate {
    /// Shipment the update belongs to.
    pub tracking_id: String,
    /// The freshly normalized and geo-enriched record.
    pub record: TrackingRecord,
    /// Notifications fired by this observation, in rule order.
    pub fired: Vec<crate::notify::Notification>,
}

/// Consumed presentation interface for the poll loop.
#[async_trait::async_trait]
pub trait DisplaySink: Send + Sync {
    /// A poll cycle completed for the active shipment.
    async fn shipment_update(&self, update: &ShipmentUpdate);

    /// Seconds until the next scheduled poll.
    async fn countdown(&self, seconds_remaining: u64);

    /// A poll cycle failed. The schedule continues.
    async fn poll_error(&self, tracking_id: &str, error: &FetchError);
}

/// Produces one fresh record per poll cycle.
///
/// Seam between the loop and the network stack, so the schedule is testable
/// without a carrier endpoint.
#[async_trait::async_trait]
pub trait ShipmentFetcher: Send + Sync {
    /// Fetch, normalize, and geo-enrich one shipment.
    async fn fetch(&self, tracking_id: &str) -> Result<TrackingRecord, FetchError>;
}

/// Production fetcher: tracking fetch followed by best-effort geo
/// enrichment.
pub struct CarrierFetcher {
    client: TrackingClient,
    router: RouteClient,
    domain: Option<String>,
}

impl CarrierFetcher {
    /// Fetcher for an explicit domain, or stored-session resolution when
    /// `None`.
    #[must_use]
    pub fn new(client: TrackingClient, router: RouteClient, domain: Option<String>) -> Self {
        Self {
            client,
            router,
            domain,
        }
    }
}

#[async_trait::async_trait]
impl ShipmentFetcher for CarrierFetcher {
    async fn fetch(&self, tracking_id: &str) -> Result<TrackingRecord, FetchError> {
        let mut record = self
            .client
            .fetch_record(tracking_id, self.domain.as_deref())
            .await?;
        self.router.enrich(&mut record).await;
        Ok(record)
    }
}

/// The polling engine.
pub struct Poller {
    fetcher: Arc<dyn ShipmentFetcher>,
    detector: ChangeDetector,
    display: Arc<dyn DisplaySink>,
    notifier: Arc<dyn NotificationSink>,
    config: PollerConfig,
}

impl Poller {
    /// Assemble a poller. The detector carries the notification rules.
    pub fn new(
        fetcher: Arc<dyn ShipmentFetcher>,
        detector: ChangeDetector,
        display: Arc<dyn DisplaySink>,
        notifier: Arc<dyn NotificationSink>,
        config: PollerConfig,
    ) -> Self {
        Self {
            fetcher,
            detector,
            display,
            notifier,
            config,
        }
    }

    /// Run the loop for `tracking_id` until cancellation.
    ///
    /// Polls immediately, then on every countdown expiry or command. A
    /// cancellation observed mid-fetch discards the in-flight result.
    pub async fn run(
        mut self,
        tracking_id: String,
        mut commands: mpsc::Receiver<PollerCommand>,
        cancel: CancellationToken,
    ) -> PollerResult {
        let tick = self.config.countdown_tick.max(Duration::from_millis(1));
        #[allow(clippy::cast_possible_truncation)]
        let ticks_per_cycle = ((self.config.poll_interval.as_millis() / tick.as_millis()).max(1)) as u64;
        let tick_secs = tick.as_secs().max(1);

        let mut current = tracking_id;
        let mut commands_open = true;

        tokio::select! {
            () = cancel.cancelled() => return PollerResult::Cancelled,
            () = self.poll_once(&current) => {}
        }
        let mut remaining = ticks_per_cycle;

        let mut ticker = time::interval_at(time::Instant::now() + tick, tick);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    return PollerResult::Cancelled;
                }
                command = commands.recv(), if commands_open => {
                    match command {
                        Some(PollerCommand::RefreshNow) => {
                            tokio::select! {
                                () = cancel.cancelled() => return PollerResult::Cancelled,
                                () = self.poll_once(&current) => {}
                            }
                            remaining = ticks_per_cycle;
                            ticker.reset();
                        }
                        Some(PollerCommand::Switch(next)) => {
                            tracing::info!(from = %current, to = %next, "switching shipment");
                            current = next;
                            tokio::select! {
                                () = cancel.cancelled() => return PollerResult::Cancelled,
                                () = self.poll_once(&current) => {}
                            }
                            remaining = ticks_per_cycle;
                            ticker.reset();
                        }
                        None => {
                            // Command handles gone; the schedule keeps
                            // running until cancellation.
                            commands_open = false;
                        }
                    }
                }
                _ = ticker.tick() => {
                    remaining -= 1;
                    if remaining == 0 {
                        tokio::select! {
                            () = cancel.cancelled() => return PollerResult::Cancelled,
                            () = self.poll_once(&current) => {}
                        }
                        remaining = ticks_per_cycle;
                    } else {
                        self.display.countdown(remaining * tick_secs).await;
                    }
                }
            }
        }
    }

    /// One full cycle: fetch, enrich, detect, deliver.
    #[tracing::instrument(skip(self))]
    async fn poll_once(&mut self, tracking_id: &str) {
        match self.fetcher.fetch(tracking_id).await {
            Ok(record) => {
                let fired = self.detector.observe(&record);
                for notification in &fired {
                    self.notifier.deliver(notification).await;
                }
                self.display
                    .shipment_update(&ShipmentUpdate {
                        tracking_id: tracking_id.to_string(),
                        record,
                        fired,
                    })
                    .await;
            }
            Err(error) => {
                tracing::warn!(tracking_id, %error, "poll cycle failed");
                self.display.poll_error(tracking_id, &error).await;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
