// ── Frame pipeline ──
//
// Pure, synchronous stages a frame passes through before anything is
// forwarded: bounds validation, then payload decoding. A frame either
// becomes a `FeedBatch` or is dropped with a typed `Rejection`.

pub mod decode;
pub mod validate;

use strum::{Display, EnumCount, EnumIter, IntoStaticStr};

use crate::model::{FeedBatch, InboundFrame};

pub use decode::decode;
pub use validate::{FrameBounds, validate};

/// Why a frame was dropped. Never an error: the gateway keeps listening.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumCount, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Rejection {
    AddressTooShort,
    AddressTooLong,
    PayloadTooShort,
    PayloadTooLong,
    /// Payload is not valid UTF-8.
    InvalidEncoding,
    /// Payload holds only separators.
    NoReadings,
    /// A segment did not split into exactly `sensor-id value`.
    MalformedReading,
}

impl Rejection {
    /// Dense index for per-reason counters.
    pub(crate) fn index(self) -> usize {
        match self {
            Self::AddressTooShort => 0,
            Self::AddressTooLong => 1,
            Self::PayloadTooShort => 2,
            Self::PayloadTooLong => 3,
            Self::InvalidEncoding => 4,
            Self::NoReadings => 5,
            Self::MalformedReading => 6,
        }
    }
}

/// Validate then decode one frame. The decoder only runs on frames that
/// passed validation; the batch is stamped with the reception time.
pub fn process(frame: &InboundFrame, bounds: &FrameBounds) -> Result<FeedBatch, Rejection> {
    validate(frame, bounds)?;
    let batch = decode(&frame.data, &frame.address)?;
    Ok(batch.with_received_at(frame.received_at))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::LinkQuality;
    use strum::IntoEnumIterator;

    #[test]
    fn counter_indices_are_dense_and_unique() {
        let mut seen = [false; Rejection::COUNT];
        for reason in Rejection::iter() {
            assert!(!seen[reason.index()], "duplicate index for {reason}");
            seen[reason.index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn reasons_render_as_snake_case_tags() {
        assert_eq!(Rejection::PayloadTooLong.to_string(), "payload_too_long");
        let tag: &'static str = Rejection::MalformedReading.into();
        assert_eq!(tag, "malformed_reading");
    }

    #[test]
    fn process_stamps_batch_with_reception_time() {
        let frame = InboundFrame::new("node01", "temp 21.5", LinkQuality::default());
        let batch = process(&frame, &FrameBounds::default()).unwrap();
        assert_eq!(batch.received_at(), Some(frame.received_at));
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn process_rejects_before_decoding() {
        // "x" would also be malformed, but the bounds check wins.
        let frame = InboundFrame::new("node01", "x", LinkQuality::default());
        assert_eq!(
            process(&frame, &FrameBounds::default()),
            Err(Rejection::PayloadTooShort)
        );
    }
}
