// ── Forwarding to the feed service ──
//
// `FeedSink` is the seam between the pipeline and the cloud. The gateway
// only ever calls `submit`; `CloudSink` is the production implementation
// backed by `lorafeed_api::FeedClient`.

use std::future::Future;

use lorafeed_api::{FeedClient, FeedValue, GroupFeedData, TlsMode, TransportConfig};
use tracing::debug;
use url::Url;

use crate::config::{GatewayConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::FeedBatch;

pub use lorafeed_api::DEFAULT_BASE_URL;

/// Destination for decoded batches.
///
/// One call per frame. Implementations must not retry; a failure is
/// logged by the gateway and the batch is dropped.
pub trait FeedSink: Send + Sync + 'static {
    fn submit(&self, batch: &FeedBatch) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Build the request body for one batch.
pub fn group_data(batch: &FeedBatch) -> GroupFeedData {
    let feeds = batch
        .pairs()
        .map(|(key, value)| FeedValue {
            key: key.to_owned(),
            value: value.to_owned(),
        })
        .collect();
    let data = GroupFeedData::new(feeds);
    match batch.received_at() {
        Some(at) => data.with_created_at(at),
        None => data,
    }
}

// ── CloudSink ───────────────────────────────────────────────────────

/// Posts every batch to `{base}/{username}/groups/{group}/data`.
#[derive(Debug, Clone)]
pub struct CloudSink {
    client: FeedClient,
    username: String,
    group_name: String,
}

impl CloudSink {
    /// Build the HTTP client from the gateway's cloud and transport settings.
    pub fn new(config: &GatewayConfig) -> Result<Self, CoreError> {
        let base_url = match &config.cloud.base_url {
            Some(url) => url.clone(),
            None => Url::parse(DEFAULT_BASE_URL).map_err(lorafeed_api::Error::from)?,
        };
        let transport = TransportConfig {
            tls: tls_to_transport(&config.tls),
            ..TransportConfig::default()
        }
        .with_timeout(config.request_timeout);
        let client = FeedClient::new(base_url, &config.cloud.api_key, &transport)?;
        Ok(Self::with_client(
            client,
            config.cloud.username.clone(),
            config.cloud.group_name.clone(),
        ))
    }

    pub fn with_client(client: FeedClient, username: String, group_name: String) -> Self {
        Self {
            client,
            username,
            group_name,
        }
    }

    pub fn client(&self) -> &FeedClient {
        &self.client
    }
}

impl FeedSink for CloudSink {
    async fn submit(&self, batch: &FeedBatch) -> Result<(), CoreError> {
        let body = group_data(batch);
        match self
            .client
            .create_group_data(&self.username, &self.group_name, &body)
            .await
        {
            Ok(created) => {
                debug!(
                    device_id = %batch.device_id(),
                    points = created.len(),
                    "feed service accepted batch"
                );
                Ok(())
            }
            // A 2xx is an accepted update even when the echo is unreadable.
            Err(lorafeed_api::Error::Deserialization { message, .. }) => {
                debug!(
                    device_id = %batch.device_id(),
                    error = %message,
                    "feed service accepted batch, response not decodable"
                );
                Ok(())
            }
            Err(e) => {
                debug!(
                    transient = e.is_transient(),
                    status = ?e.status(),
                    "feed service refused batch"
                );
                Err(CoreError::from(e))
            }
        }
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pipeline::decode;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn group_data_keeps_order_and_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 7, 30, 0).unwrap();
        let batch = decode(b"temp 21.5,hum 55", b"node01")
            .unwrap()
            .with_received_at(at);

        let body = serde_json::to_value(group_data(&batch)).unwrap();
        assert_eq!(
            body,
            json!({
                "feeds": [
                    { "key": "node01temp", "value": "21.5" },
                    { "key": "node01hum", "value": "55" }
                ],
                "created_at": "2026-10-19T07:30:00Z"
            })
        );
    }

    #[test]
    fn group_data_without_timestamp_lets_service_stamp() {
        let batch = decode(b"temp 21.5", b"node01").unwrap();
        assert!(group_data(&batch).created_at.is_none());
    }
}
