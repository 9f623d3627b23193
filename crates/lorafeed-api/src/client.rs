// Feed service HTTP client
//
// Wraps `reqwest::Client` with group-scoped URL construction, API key
// header injection, and status-to-error mapping. The only write surface
// the gateway needs is the group data batch update.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{ErrorBody, FeedDatum, GroupFeedData};
use crate::transport::TransportConfig;

/// Production endpoint of the v2 REST API.
pub const DEFAULT_BASE_URL: &str = "https://io.adafruit.com/api/v2";

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-AIO-Key";

/// Fallback when a 429 carries no usable `Retry-After`; the service
/// throttles over one-minute windows.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// HTTP client for the feed service.
///
/// Cheap to clone (the inner `reqwest::Client` is reference counted), so
/// one instance can back any number of concurrent updates.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    base_url: Url,
}

impl FeedClient {
    /// Create a client for `base_url` authenticating with `api_key`.
    ///
    /// The key is attached as a sensitive default header so it never shows
    /// up in reqwest's debug output.
    pub fn new(
        base_url: Url,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(base_url.to_string()));
        }

        let mut key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|_| Error::InvalidApiKey)?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for the API key header.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/{username}/groups/{group_key}/data`, each segment
    /// percent-encoded.
    pub(crate) fn group_data_url(&self, username: &str, group_key: &str) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend([username, "groups", group_key, "data"]);
        Ok(url)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Append one point to every feed listed in `data`, inside the group.
    ///
    /// Group keys are lowercase on the service side, so `group_name` is
    /// lowercased before it goes into the path.
    pub async fn create_group_data(
        &self,
        username: &str,
        group_name: &str,
        data: &GroupFeedData,
    ) -> Result<Vec<FeedDatum>, Error> {
        let group_key = group_name.to_lowercase();
        let url = self.group_data_url(username, &group_key)?;
        debug!(feeds = data.len(), "POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(data)
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_response(resp).await
    }
}

// ── Response handling ────────────────────────────────────────────────

/// Map non-2xx statuses onto typed errors, then decode the JSON body.
async fn parse_response<T: DeserializeOwned>(resp: Response) -> Result<T, Error> {
    let status = resp.status();
    let path = resp.url().path().to_owned();

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(Error::InvalidApiKey),
        StatusCode::NOT_FOUND => return Err(Error::NotFound { path }),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(Error::RateLimited { retry_after_secs });
        }
        _ => {}
    }

    let body = resp.text().await.map_err(Error::Transport)?;
    trace!(status = %status, body_len = body.len(), "response received");

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| body.chars().take(200).collect());
        return Err(Error::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}
