// ── Core error types ──
//
// Errors surfaced by the gateway runtime. Per-frame rejections are NOT
// errors (see `pipeline::Rejection`); these cover radio plumbing and
// forwarding failures. The `From<lorafeed_api::Error>` impl translates
// transport-layer errors into gateway-level variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Cloud errors ─────────────────────────────────────────────────
    #[error("Cannot reach feed service at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Feed service rejected credentials: {message}")]
    AuthenticationFailed { message: String },

    #[error("Feed update timed out")]
    Timeout,

    #[error("Feed service error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if the service answered).
        status: Option<u16>,
    },

    // ── Radio errors ─────────────────────────────────────────────────
    #[error("Radio error: {message}")]
    Radio { message: String },

    #[error("Radio event stream closed")]
    RadioClosed,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn radio(message: impl Into<String>) -> Self {
        Self::Radio {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lorafeed_api::Error> for CoreError {
    fn from(err: lorafeed_api::Error) -> Self {
        match err {
            lorafeed_api::Error::InvalidApiKey => CoreError::AuthenticationFailed {
                message: "Invalid API key".into(),
            },
            lorafeed_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            lorafeed_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            lorafeed_api::Error::InvalidBaseUrl(url) => CoreError::Config {
                message: format!("Base URL cannot be used for API paths: {url}"),
            },
            lorafeed_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            lorafeed_api::Error::NotFound { path } => CoreError::Api {
                message: format!("Not found: {path} (check username and group name)"),
                status: Some(404),
            },
            lorafeed_api::Error::RateLimited { retry_after_secs } => CoreError::Api {
                message: format!("Rate limited -- retry after {retry_after_secs}s"),
                status: Some(429),
            },
            lorafeed_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            lorafeed_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Unexpected response: {message}"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;

    #[test]
    fn invalid_key_becomes_authentication_failure() {
        let err = CoreError::from(lorafeed_api::Error::InvalidApiKey);
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }

    #[test]
    fn throttle_keeps_status() {
        let err = CoreError::from(lorafeed_api::Error::RateLimited {
            retry_after_secs: 30,
        });
        match err {
            CoreError::Api { status, message } => {
                assert_eq!(status, Some(429));
                assert!(message.contains("30s"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
