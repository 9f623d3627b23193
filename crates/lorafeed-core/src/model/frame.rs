// ── Received frames ──

use std::fmt;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Link-quality metrics the radio reports with every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkQuality {
    /// Packet signal-to-noise ratio, dB.
    pub snr: f32,
    /// Packet RSSI, dBm.
    pub packet_rssi: i32,
    /// Ambient RSSI at reception time, dBm.
    pub rssi: i32,
}

/// One frame as delivered by the radio.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    pub address: Vec<u8>,
    pub data: Vec<u8>,
    pub link: LinkQuality,
    pub received_at: DateTime<Utc>,
}

impl InboundFrame {
    /// Frame stamped with the current time.
    pub fn new(address: impl Into<Vec<u8>>, data: impl Into<Vec<u8>>, link: LinkQuality) -> Self {
        Self {
            address: address.into(),
            data: data.into(),
            link,
            received_at: Utc::now(),
        }
    }

    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }

    /// Address bytes as text, for logs.
    pub fn address_text(&self) -> String {
        String::from_utf8_lossy(&self.address).into_owned()
    }

    /// Payload bytes as text, for logs.
    pub fn data_text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Render bytes as uppercase hex pairs joined by `-` (`6E-30-31`).
pub fn hex_dashed(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push('-');
        }
        let _ = write!(out, "{b:02X}");
    }
    out
}

// ── DeviceId ────────────────────────────────────────────────────────

/// Sender address as lowercase text; the namespace for its feed keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Invalid UTF-8 sequences become U+FFFD rather than failing.
    pub fn from_address(address: &[u8]) -> Self {
        Self(String::from_utf8_lossy(address).to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
