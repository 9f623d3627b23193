// ── Gateway lifecycle ──
//
// Initialise the radio, start listening, then run one ingest loop over
// the radio's event channel. Each accepted frame becomes a batch that is
// forwarded on its own task so a slow feed service never stalls
// reception. Forward tasks are tracked and share the gateway's
// cancellation token, so shutdown abandons them promptly.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::config::GatewayConfig;
use crate::error::CoreError;
use crate::forward::FeedSink;
use crate::model::{FeedBatch, InboundFrame, hex_dashed};
use crate::pipeline::{self, FrameBounds};
use crate::radio::{DriverSettings, Radio, RadioEvent};
use crate::stats::{GatewayStats, StatsSnapshot};

/// Entry point: wires a radio and a sink together.
pub struct Gateway;

impl Gateway {
    /// Initialise `radio`, start receiving on the configured listen
    /// address and spawn the ingest loop.
    ///
    /// Fails only if the radio can't be initialised or started; nothing
    /// that happens to individual frames afterwards is fatal.
    pub async fn start<R, S>(
        config: Arc<GatewayConfig>,
        mut radio: R,
        sink: S,
    ) -> Result<GatewayHandle, CoreError>
    where
        R: Radio,
        S: FeedSink,
    {
        radio.initialize(&DriverSettings::new(&config.radio)).await?;
        let events = radio.receive(&config.listen_address).await?;
        info!(
            listen_address = %String::from_utf8_lossy(&config.listen_address),
            frequency = config.radio.frequency,
            spreading_factor = %config.radio.spreading_factor,
            bandwidth = %config.radio.bandwidth,
            "radio listening"
        );

        let cancel = CancellationToken::new();
        let stats = Arc::new(GatewayStats::default());
        let tracker = TaskTracker::new();

        let forwarder = Forwarder {
            sink: Arc::new(sink),
            tracker: tracker.clone(),
            cancel: cancel.child_token(),
            stats: Arc::clone(&stats),
        };
        let ingest = tokio::spawn(ingest_task(
            events,
            config.bounds,
            forwarder,
            Arc::clone(&stats),
            cancel.clone(),
        ));

        Ok(GatewayHandle {
            cancel,
            ingest: Some(ingest),
            tracker,
            stats,
        })
    }
}

// ── GatewayHandle ───────────────────────────────────────────────────

/// Control surface for a running gateway.
#[derive(Debug)]
pub struct GatewayHandle {
    cancel: CancellationToken,
    ingest: Option<JoinHandle<()>>,
    tracker: TaskTracker,
    stats: Arc<GatewayStats>,
}

impl GatewayHandle {
    /// Current counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Block until the radio event stream ends or shutdown is requested.
    ///
    /// Cancel-safe: may be raced against a signal and called again.
    pub async fn wait(&mut self) {
        if let Some(ingest) = self.ingest.as_mut() {
            if let Err(e) = ingest.await {
                error!(error = %e, "ingest loop panicked");
            }
            self.ingest = None;
        }
    }

    /// Wait for the ingest loop, then let in-flight forwards finish.
    pub async fn drain(mut self) -> StatsSnapshot {
        self.wait().await;
        self.tracker.close();
        self.tracker.wait().await;
        self.stats.snapshot()
    }

    /// Stop listening, cancel in-flight forwards and wait for every task.
    pub async fn shutdown(self) -> StatsSnapshot {
        debug!(in_flight = self.tracker.len(), "gateway shutting down");
        self.cancel.cancel();
        self.drain().await
    }
}

// ── Ingest loop ─────────────────────────────────────────────────────

async fn ingest_task(
    mut events: mpsc::Receiver<RadioEvent>,
    bounds: FrameBounds,
    forwarder: Forwarder<impl FeedSink>,
    stats: Arc<GatewayStats>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = events.recv() => {
                let Some(event) = event else {
                    info!("radio event stream closed");
                    break;
                };
                match event {
                    RadioEvent::Received(frame) => {
                        stats.frame_received();
                        handle_frame(&frame, &bounds, &forwarder, &stats);
                    }
                    RadioEvent::Transmitted => {
                        stats.transmit_event();
                        debug!("transmit completion ignored, transmit path not exercised");
                    }
                }
            }
        }
    }
    debug!("ingest loop stopped");
}

fn handle_frame<S: FeedSink>(
    frame: &InboundFrame,
    bounds: &FrameBounds,
    forwarder: &Forwarder<S>,
    stats: &GatewayStats,
) {
    debug!(
        address = %frame.address_text(),
        address_hex = %hex_dashed(&frame.address),
        message = %frame.data_text(),
        message_hex = %hex_dashed(&frame.data),
        snr = frame.link.snr,
        packet_rssi = frame.link.packet_rssi,
        rssi = frame.link.rssi,
        "message data"
    );

    match pipeline::process(frame, bounds) {
        Ok(batch) => {
            for entry in batch.entries() {
                debug!(
                    device_id = %batch.device_id(),
                    sensor = %entry.reading.sensor_id,
                    value = %entry.reading.value,
                    feed = %entry.key,
                    "sensor reading"
                );
            }
            forwarder.forward(batch);
        }
        Err(reason) => {
            stats.frame_rejected(reason);
            warn!(
                reason = %reason,
                address_len = frame.address.len(),
                message_len = frame.data.len(),
                "frame rejected"
            );
        }
    }
}

// ── Forwarder ───────────────────────────────────────────────────────

/// Fires one tracked task per batch.
struct Forwarder<S> {
    sink: Arc<S>,
    tracker: TaskTracker,
    cancel: CancellationToken,
    stats: Arc<GatewayStats>,
}

impl<S: FeedSink> Forwarder<S> {
    fn forward(&self, batch: FeedBatch) {
        let sink = Arc::clone(&self.sink);
        let cancel = self.cancel.clone();
        let stats = Arc::clone(&self.stats);

        self.tracker.spawn(async move {
            let batch_size = batch.len();
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    stats.forward_cancelled();
                    warn!(device_id = %batch.device_id(), batch_size, "forward abandoned at shutdown");
                }
                result = sink.submit(&batch) => match result {
                    Ok(()) => {
                        stats.batch_forwarded();
                        debug!(device_id = %batch.device_id(), batch_size, "batch forwarded");
                    }
                    Err(e) => {
                        stats.forward_failed();
                        error!(
                            device_id = %batch.device_id(),
                            batch_size,
                            error = %e,
                            "feed update failed"
                        );
                    }
                },
            }
        });
    }
}
