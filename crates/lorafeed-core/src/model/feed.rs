// ── Decoded readings and the batches built from them ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::frame::DeviceId;

/// One `sensor-id value` pair from a payload.
///
/// The sensor id is lowercase; the value is forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor_id: String,
    pub value: String,
}

/// Cloud feed identifier: device id immediately followed by sensor id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedKey(String);

impl FeedKey {
    pub fn new(device: &DeviceId, sensor_id: &str) -> Self {
        Self(format!("{device}{sensor_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reading together with the feed it lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub key: FeedKey,
    pub reading: SensorReading,
}

/// Every reading from one frame, submitted as a single cloud update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedBatch {
    device_id: DeviceId,
    entries: Vec<FeedEntry>,
    received_at: Option<DateTime<Utc>>,
}

impl FeedBatch {
    pub fn new(device_id: DeviceId, entries: Vec<FeedEntry>) -> Self {
        Self {
            device_id,
            entries,
            received_at: None,
        }
    }

    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = Some(received_at);
        self
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    /// When the originating frame was heard, if known.
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(feed key, value)` pairs in payload order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.key.as_str(), e.reading.value.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_key_concatenates_without_separator() {
        let device = DeviceId::from_address(b"node01");
        assert_eq!(FeedKey::new(&device, "temp").as_str(), "node01temp");
    }
}
