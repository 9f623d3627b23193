//! Persisted configuration for the lorafeed gateway.
//!
//! One JSON document holds the cloud credentials, the radio parameters
//! and the gateway plumbing settings. `LORAFEED_*` environment variables
//! override individual keys. A first run writes a template and refuses to
//! start until the operator fills in the credentials.

mod fields;

use std::env::VarError;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use lorafeed_core::pipeline::validate::{ADDRESS_LENGTH_MAX, ADDRESS_LENGTH_MIN};
use lorafeed_core::{
    CloudCredentials, FrameBounds, GatewayConfig, RadioConfiguration, TlsVerification,
    UdpRadioConfig,
};

pub use fields::{
    DEFAULT_RADIO_BIND, DEFAULT_RADIO_PEER, PLACEHOLDER_ADDRESS, PLACEHOLDER_API_KEY,
    PLACEHOLDER_GROUP_NAME, PLACEHOLDER_USERNAME,
};

/// Prefix for environment overrides (`LORAFEED_API_KEY` -> `api_key`).
pub const ENV_PREFIX: &str = "LORAFEED_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration not set up: fill in the template written to {}", path.display())]
    NotSetUp { path: PathBuf },

    #[error("missing required setting '{field}'")]
    Missing { field: String },

    #[error("invalid {field}: {reason}")]
    Malformed { field: String, reason: String },

    #[error("'{field}' still holds its template placeholder")]
    Placeholder { field: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn malformed(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Malformed {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "lorafeed", "lorafeed").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.json");
            p
        },
        |dirs| dirs.config_dir().join("config.json"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("lorafeed");
    p
}

// ── Typed document ──────────────────────────────────────────────────

/// The persisted document after defaults have been applied.
#[derive(Deserialize)]
struct PersistedConfig {
    #[serde(default)]
    base_url: Option<Url>,
    api_key: String,
    username: String,
    group_name: String,
    address: String,
    #[serde(flatten)]
    radio: RadioConfiguration,
    request_timeout_secs: u64,
    radio_bind: SocketAddr,
    radio_peer: SocketAddr,
    strict_address_length: bool,
    #[serde(default)]
    ca_cert: Option<PathBuf>,
}

/// Everything the binary needs to start a gateway.
#[derive(Debug, Clone)]
pub struct Settings {
    pub gateway: GatewayConfig,
    pub radio_bridge: UdpRadioConfig,
}

impl Settings {
    /// Log what is about to run. The API key is never printed.
    pub fn log_summary(&self, path: &Path) {
        let cloud = &self.gateway.cloud;
        let radio = &self.gateway.radio;
        info!(
            path = %path.display(),
            base_url = cloud.base_url.as_ref().map_or(lorafeed_core::forward::DEFAULT_BASE_URL, Url::as_str),
            username = %cloud.username,
            group = %cloud.group_name,
            api_key = "[redacted]",
            "cloud settings"
        );
        info!(
            listen_address = %String::from_utf8_lossy(&self.gateway.listen_address),
            frequency = radio.frequency,
            bandwidth = %radio.bandwidth,
            bandwidth_hz = radio.bandwidth.hz(),
            spreading_factor = %radio.spreading_factor,
            coding_rate = %radio.coding_rate,
            sync_word = radio.sync_word,
            bridge_peer = %self.radio_bridge.peer,
            "radio settings"
        );
    }
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load settings from `path`, with `LORAFEED_*` overrides.
///
/// A missing file is not a parse failure: the template is written and
/// [`ConfigError::NotSetUp`] comes back so the caller stops before
/// touching the radio.
pub fn load(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        write_template(path)?;
        return Err(ConfigError::NotSetUp {
            path: path.to_path_buf(),
        });
    }

    let mut doc: Map<String, Value> = layered(path)?.extract()?;

    for key in doc.keys().filter(|k| !fields::is_known(k)) {
        debug!(key = %key, "ignoring unknown configuration key");
    }
    fields::apply(&mut doc)?;

    let persisted: PersistedConfig = serde_json::from_value(Value::Object(doc))
        .map_err(|e| malformed("configuration", e.to_string()))?;
    persisted.into_settings()
}

/// The file, then env overrides. Text fields take the variable verbatim
/// so `0042` stays `0042` instead of being parsed as a number.
fn layered(path: &Path) -> Result<Figment, ConfigError> {
    let mut ignored = vec!["config"];
    ignored.extend(fields::text_fields());

    let mut figment = Figment::new()
        .merge(Json::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&ignored));

    for name in fields::text_fields() {
        let var = format!("{ENV_PREFIX}{}", name.to_ascii_uppercase());
        match std::env::var(&var) {
            Ok(raw) => figment = figment.merge(Serialized::default(name, raw)),
            Err(VarError::NotPresent) => {}
            Err(VarError::NotUnicode(_)) => {
                return Err(malformed(name, format!("{var} is not valid UTF-8")));
            }
        }
    }
    Ok(figment)
}

/// Write the first-run template. Never overwrites an existing file.
pub fn write_template(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&Value::Object(fields::template()))?;
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    std::io::Write::write_all(&mut file, json.as_bytes())?;
    info!(path = %path.display(), "wrote configuration template");
    Ok(())
}

// ── Validation and translation ──────────────────────────────────────

fn mandatory(field: &str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(malformed(field, "must not be empty"));
    }
    if fields::placeholder(field) == Some(value.as_str()) {
        return Err(ConfigError::Placeholder {
            field: field.into(),
        });
    }
    Ok(value)
}

impl PersistedConfig {
    fn into_settings(self) -> Result<Settings, ConfigError> {
        let api_key = mandatory("api_key", self.api_key)?;
        let username = mandatory("username", self.username)?;
        let group_name = mandatory("group_name", self.group_name)?;
        let address = mandatory("address", self.address)?;

        let address_len = address.len();
        if !(ADDRESS_LENGTH_MIN..=ADDRESS_LENGTH_MAX).contains(&address_len) {
            return Err(malformed(
                "address",
                format!(
                    "must be {ADDRESS_LENGTH_MIN}..={ADDRESS_LENGTH_MAX} bytes, got {address_len}"
                ),
            ));
        }

        if let Some(scheme) = self
            .base_url
            .as_ref()
            .map(Url::scheme)
            .filter(|s| !matches!(*s, "http" | "https"))
        {
            return Err(malformed(
                "base_url",
                format!("expected an http(s) URL, got scheme '{scheme}'"),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(malformed("request_timeout_secs", "must be greater than zero"));
        }

        let cloud = CloudCredentials {
            base_url: self.base_url,
            api_key: SecretString::from(api_key),
            username,
            group_name,
        };

        let mut gateway = GatewayConfig::new(self.radio, cloud, address.into_bytes());
        gateway.bounds = FrameBounds {
            strict_address_length: self.strict_address_length,
            ..FrameBounds::default()
        };
        gateway.tls = self
            .ca_cert
            .map_or(TlsVerification::SystemDefaults, TlsVerification::CustomCa);
        gateway.request_timeout = Duration::from_secs(self.request_timeout_secs);

        Ok(Settings {
            gateway,
            radio_bridge: UdpRadioConfig {
                bind: self.radio_bind,
                peer: self.radio_peer,
            },
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;
    use lorafeed_core::SpreadingFactor;
    use secrecy::ExposeSecret;

    const MINIMAL: &str = r#"{
        "api_key": "aio_file_key",
        "username": "maker",
        "group_name": "Garden",
        "address": "gw01"
    }"#;

    #[test]
    fn env_overrides_file_values() {
        Jail::expect_with(|jail| {
            jail.create_file("config.json", MINIMAL)?;
            jail.set_env("LORAFEED_API_KEY", "aio_env_key");
            jail.set_env("LORAFEED_SPREADING_FACTOR", "SF12");

            let settings = load(Path::new("config.json")).unwrap();
            let gateway = &settings.gateway;
            assert_eq!(gateway.cloud.api_key.expose_secret(), "aio_env_key");
            assert_eq!(gateway.radio.spreading_factor, SpreadingFactor::Sf12);
            Ok(())
        });
    }

    #[test]
    fn env_numeric_username_stays_text() {
        Jail::expect_with(|jail| {
            jail.create_file("config.json", MINIMAL)?;
            jail.set_env("LORAFEED_USERNAME", "12345");

            let settings = load(Path::new("config.json")).unwrap();
            assert_eq!(settings.gateway.cloud.username, "12345");
            Ok(())
        });
    }

    #[test]
    fn env_text_keeps_leading_zeros() {
        Jail::expect_with(|jail| {
            jail.create_file("config.json", MINIMAL)?;
            jail.set_env("LORAFEED_ADDRESS", "0042");
            jail.set_env("LORAFEED_USERNAME", "007");
            jail.set_env("LORAFEED_GROUP_NAME", "0100");
            jail.set_env("LORAFEED_SYNC_WORD", "52");

            let settings = load(Path::new("config.json")).unwrap();
            let gateway = &settings.gateway;
            assert_eq!(gateway.listen_address, b"0042");
            assert_eq!(gateway.cloud.username, "007");
            assert_eq!(gateway.cloud.group_name, "0100");
            assert_eq!(gateway.radio.sync_word, 52);
            Ok(())
        });
    }

    #[test]
    fn config_path_points_at_json_file() {
        assert!(config_path().ends_with("config.json"));
    }
}
