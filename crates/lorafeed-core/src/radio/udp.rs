// UDP bridge to an out-of-process radio daemon.
//
// Commands and events are single JSON datagrams:
//
//   -> {"command":"initialize","config":{...}}
//   -> {"command":"receive","address":[110,48,49]}
//   <- {"event":"received","address":[...],"data":[...],"snr":7.5,"packet_rssi":-60,"rssi":-100}
//   <- {"event":"transmitted"}
//
// Undecodable datagrams are logged and skipped.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::error::CoreError;
use crate::model::{InboundFrame, LinkQuality};

use super::{DriverSettings, EVENT_CHANNEL_CAPACITY, Radio, RadioEvent};

/// Largest datagram the bridge will read.
const MAX_DATAGRAM: usize = 8 * 1024;

/// Where the bridge binds and which daemon it talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpRadioConfig {
    pub bind: SocketAddr,
    pub peer: SocketAddr,
}

#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum BridgeCommand<'a> {
    Initialize { config: &'a DriverSettings<'a> },
    Receive { address: &'a [u8] },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum BridgeEvent {
    Received {
        address: Vec<u8>,
        data: Vec<u8>,
        snr: f32,
        packet_rssi: i32,
        rssi: i32,
    },
    Transmitted,
}

impl From<BridgeEvent> for RadioEvent {
    fn from(event: BridgeEvent) -> Self {
        match event {
            BridgeEvent::Received {
                address,
                data,
                snr,
                packet_rssi,
                rssi,
            } => RadioEvent::Received(InboundFrame {
                address,
                data,
                link: LinkQuality {
                    snr,
                    packet_rssi,
                    rssi,
                },
                received_at: Utc::now(),
            }),
            BridgeEvent::Transmitted => RadioEvent::Transmitted,
        }
    }
}

/// Radio reached through a JSON/UDP bridge.
#[derive(Debug)]
pub struct UdpRadio {
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
}

impl UdpRadio {
    /// Bind the local socket and connect it to the daemon.
    pub async fn bind(config: &UdpRadioConfig) -> Result<Self, CoreError> {
        let socket = UdpSocket::bind(config.bind)
            .await
            .map_err(|e| CoreError::radio(format!("cannot bind {}: {e}", config.bind)))?;
        socket
            .connect(config.peer)
            .await
            .map_err(|e| CoreError::radio(format!("cannot reach daemon at {}: {e}", config.peer)))?;
        debug!(bind = %config.bind, peer = %config.peer, "radio bridge socket ready");
        Ok(Self {
            socket: Arc::new(socket),
            peer: config.peer,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, CoreError> {
        self.socket
            .local_addr()
            .map_err(|e| CoreError::radio(e.to_string()))
    }

    async fn send(&self, command: &BridgeCommand<'_>) -> Result<(), CoreError> {
        let bytes = serde_json::to_vec(command)
            .map_err(|e| CoreError::radio(format!("cannot encode command: {e}")))?;
        self.socket
            .send(&bytes)
            .await
            .map_err(|e| CoreError::radio(format!("send to {} failed: {e}", self.peer)))?;
        Ok(())
    }
}

impl Radio for UdpRadio {
    async fn initialize(&mut self, settings: &DriverSettings<'_>) -> Result<(), CoreError> {
        self.send(&BridgeCommand::Initialize { config: settings })
            .await
    }

    async fn receive(&mut self, address: &[u8]) -> Result<mpsc::Receiver<RadioEvent>, CoreError> {
        self.send(&BridgeCommand::Receive { address }).await?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let socket = Arc::clone(&self.socket);
        tokio::spawn(read_events(socket, tx));
        Ok(rx)
    }
}

/// Backoff for a socket that keeps failing. A few failures in a row are
/// tolerated; after that each one waits twice as long, up to a cap.
#[derive(Debug, Default)]
struct RecvBackoff {
    failures: u32,
}

impl RecvBackoff {
    const FREE_RETRIES: u32 = 3;
    const BASE: Duration = Duration::from_millis(50);
    const MAX: Duration = Duration::from_secs(5);

    /// Record a failure and return how long to wait before the next read.
    fn failed(&mut self) -> Option<Duration> {
        self.failures = self.failures.saturating_add(1);
        let excess = self.failures.checked_sub(Self::FREE_RETRIES + 1)?;
        let delay = Self::BASE.saturating_mul(2u32.saturating_pow(excess));
        Some(delay.min(Self::MAX))
    }

    fn reset(&mut self) {
        self.failures = 0;
    }
}

/// Pump datagrams into the event channel until the receiver is dropped.
async fn read_events(socket: Arc<UdpSocket>, tx: mpsc::Sender<RadioEvent>) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut backoff = RecvBackoff::default();
    loop {
        let result = tokio::select! {
            biased;
            () = tx.closed() => break,
            result = socket.recv(&mut buf) => result,
        };

        let len = match result {
            Ok(len) => {
                backoff.reset();
                len
            }
            Err(e) => {
                // ICMP port-unreachable surfaces here while the daemon
                // restarts; keep listening.
                let delay = backoff.failed();
                warn!(error = %e, failures = backoff.failures, "radio bridge receive failed");
                if let Some(delay) = delay {
                    tokio::select! {
                        biased;
                        () = tx.closed() => break,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
                continue;
            }
        };

        let event = match serde_json::from_slice::<BridgeEvent>(&buf[..len]) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, len, "skipping undecodable radio datagram");
                continue;
            }
        };
        trace!(?event, "radio bridge event");

        if tx.send(event.into()).await.is_err() {
            break;
        }
    }
    debug!("radio bridge reader stopped");
}
