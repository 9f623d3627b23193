// ── Radio seam ──
//
// The radio chip is owned by a collaborator; the gateway only asks it to
// initialise and to listen, then consumes a channel of `RadioEvent`s.
// Events arrive in reception order on that one channel.

pub mod channel;
pub mod udp;

use std::future::Future;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::RadioConfiguration;
use crate::error::CoreError;
use crate::model::InboundFrame;

pub use channel::{ChannelRadio, FrameInjector};
pub use udp::{UdpRadio, UdpRadioConfig};

/// Default capacity of a radio event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Notification from the radio.
#[derive(Debug, Clone, PartialEq)]
pub enum RadioEvent {
    /// A frame was received on the listen address.
    Received(InboundFrame),
    /// A transmission finished. The gateway never transmits.
    Transmitted,
}

/// Settings the driver is initialised with.
///
/// CRC handling is not configurable: the payload CRC is always on and
/// frames with a missing or invalid CRC are dropped by the driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverSettings<'a> {
    #[serde(flatten)]
    pub radio: &'a RadioConfiguration,
    pub rx_payload_crc_on: bool,
    pub rx_done_ignore_if_crc_missing: bool,
    pub rx_done_ignore_if_crc_invalid: bool,
}

impl<'a> DriverSettings<'a> {
    pub fn new(radio: &'a RadioConfiguration) -> Self {
        Self {
            radio,
            rx_payload_crc_on: true,
            rx_done_ignore_if_crc_missing: true,
            rx_done_ignore_if_crc_invalid: true,
        }
    }
}

/// A radio the gateway can drive.
pub trait Radio: Send + 'static {
    /// Apply the physical-layer configuration.
    fn initialize(
        &mut self,
        settings: &DriverSettings<'_>,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Start listening on `address` and hand back the event stream.
    ///
    /// The stream ends when the radio goes away; dropping the receiver
    /// stops the radio's background work.
    fn receive(
        &mut self,
        address: &[u8],
    ) -> impl Future<Output = Result<mpsc::Receiver<RadioEvent>, CoreError>> + Send;
}
