// lorafeed-core: Frame pipeline and gateway runtime between the radio and the feed service.

pub mod config;
pub mod error;
pub mod forward;
pub mod gateway;
pub mod model;
pub mod pipeline;
pub mod radio;
pub mod stats;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    Bandwidth, CloudCredentials, CodingRate, DetectionOptimize, DetectionThreshold, GatewayConfig,
    LnaGain, RadioConfiguration, SpreadingFactor, TlsVerification,
};
pub use error::CoreError;
pub use forward::{CloudSink, FeedSink};
pub use gateway::{Gateway, GatewayHandle};
pub use model::{DeviceId, FeedBatch, FeedEntry, FeedKey, InboundFrame, LinkQuality, SensorReading};
pub use pipeline::{FrameBounds, Rejection, decode, process, validate};
pub use radio::{
    ChannelRadio, DriverSettings, FrameInjector, Radio, RadioEvent, UdpRadio, UdpRadioConfig,
};
pub use stats::StatsSnapshot;
