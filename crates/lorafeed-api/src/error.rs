use thiserror::Error;

/// Top-level error type for the `lorafeed-api` crate.
///
/// Covers every failure mode of a group data update: transport, HTTP
/// status mapping, and response decoding. `lorafeed-core` maps these into
/// forwarding failures that are logged and dropped.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// API key missing, malformed, or rejected by the service (401/403).
    #[error("Invalid API key")]
    InvalidApiKey,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL cannot have path segments appended (e.g. `mailto:`).
    #[error("Base URL cannot be used for API paths: {0}")]
    InvalidBaseUrl(String),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Service ─────────────────────────────────────────────────────
    /// The user, group, or feed does not exist (404).
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// Throttled by the service. Includes retry-after in seconds.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Any other non-2xx response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// A 2xx response body did not decode, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the service rejected our credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::InvalidApiKey)
    }

    /// Returns `true` if this is a transient error that a later update
    /// could plausibly get past.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// HTTP status associated with this error, if the service answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidApiKey => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::RateLimited { .. } => Some(429),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
