// ── Payload decoding ──
//
// Payload grammar: comma-separated `sensor-id value` segments, e.g.
// `temp 21.5,hum 55`. Empty segments and repeated spaces are skipped.
// Any segment that doesn't split into exactly two parts drops the whole
// frame; partial batches are never produced.

use crate::model::{DeviceId, FeedBatch, FeedEntry, FeedKey, SensorReading};

use super::Rejection;

const SEGMENT_SEPARATOR: char = ',';
const FIELD_SEPARATOR: char = ' ';

/// Decode a payload into a batch of feed updates for `address`.
pub fn decode(payload: &[u8], address: &[u8]) -> Result<FeedBatch, Rejection> {
    let text = std::str::from_utf8(payload).map_err(|_| Rejection::InvalidEncoding)?;
    let device = DeviceId::from_address(address);

    let entries = text
        .split(SEGMENT_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let reading = parse_reading(segment)?;
            Ok(FeedEntry {
                key: FeedKey::new(&device, &reading.sensor_id),
                reading,
            })
        })
        .collect::<Result<Vec<_>, Rejection>>()?;

    if entries.is_empty() {
        return Err(Rejection::NoReadings);
    }
    Ok(FeedBatch::new(device, entries))
}

fn parse_reading(segment: &str) -> Result<SensorReading, Rejection> {
    let mut parts = segment.split(FIELD_SEPARATOR).filter(|p| !p.is_empty());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(sensor_id), Some(value), None) => Ok(SensorReading {
            sensor_id: sensor_id.to_lowercase(),
            value: value.to_owned(),
        }),
        _ => Err(Rejection::MalformedReading),
    }
}
