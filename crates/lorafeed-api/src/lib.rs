// lorafeed-api: Async Rust client for the Adafruit IO group data API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::{API_KEY_HEADER, DEFAULT_BASE_URL, FeedClient};
pub use error::Error;
pub use models::{FeedDatum, FeedValue, GroupFeedData};
pub use transport::{TlsMode, TransportConfig};
