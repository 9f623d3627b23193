// ── Gateway domain model ──
//
// What a frame carries off the air, and what the decoder turns it into.

pub mod feed;
pub mod frame;

pub use feed::{FeedBatch, FeedEntry, FeedKey, SensorReading};
pub use frame::{DeviceId, InboundFrame, LinkQuality, hex_dashed};
