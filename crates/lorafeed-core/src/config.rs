// ── Runtime gateway configuration ──
//
// These types describe how the radio is tuned and where readings go.
// They carry credential data and tuning, but never touch disk; the
// config crate builds a `GatewayConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use url::Url;

use crate::pipeline::FrameBounds;

/// Documented defaults for every radio parameter.
///
/// The config crate's defaults table reads these so the persisted
/// template and `RadioConfiguration::default()` never drift apart.
pub mod defaults {
    pub const FREQUENCY_HZ: f64 = 915_000_000.0;
    pub const PA_BOOST: bool = false;
    pub const MAX_POWER: u8 = 0x70;
    pub const OUTPUT_POWER: u8 = 0x0F;
    pub const OCP_ON: bool = true;
    pub const OCP_TRIM: u8 = 0x0B;
    pub const LNA_BOOST: bool = false;
    pub const IMPLICIT_HEADER_MODE_ON: bool = false;
    pub const SYMBOL_TIMEOUT: u8 = 0x64;
    pub const PREAMBLE_LENGTH: u8 = 8;
    pub const PAYLOAD_LENGTH: u8 = 1;
    pub const PAYLOAD_MAX_LENGTH: u8 = 0xFF;
    pub const FREQ_HOPPING_PERIOD: u8 = 0;
    pub const LOW_DATA_RATE_OPTIMIZE: bool = false;
    pub const AGC_AUTO_ON: bool = false;
    pub const PPM_CORRECTION: u8 = 0;
    pub const INVERT_IQ: bool = false;
    pub const SYNC_WORD: u8 = 0x12;

    /// Per-request bound applied to every cloud forward.
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

// ── Radio parameter enums ───────────────────────────────────────────

/// Low-noise amplifier gain step, `G1` being the highest gain.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
pub enum LnaGain {
    #[default]
    G1,
    G2,
    G3,
    G4,
    G5,
    G6,
}

/// Signal bandwidth.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
pub enum Bandwidth {
    #[serde(rename = "7.8kHz")]
    #[strum(to_string = "7.8kHz")]
    Khz7_8,
    #[serde(rename = "10.4kHz")]
    #[strum(to_string = "10.4kHz")]
    Khz10_4,
    #[serde(rename = "15.6kHz")]
    #[strum(to_string = "15.6kHz")]
    Khz15_6,
    #[serde(rename = "20.8kHz")]
    #[strum(to_string = "20.8kHz")]
    Khz20_8,
    #[serde(rename = "31.25kHz")]
    #[strum(to_string = "31.25kHz")]
    Khz31_25,
    #[serde(rename = "41.7kHz")]
    #[strum(to_string = "41.7kHz")]
    Khz41_7,
    #[serde(rename = "62.5kHz")]
    #[strum(to_string = "62.5kHz")]
    Khz62_5,
    #[default]
    #[serde(rename = "125kHz")]
    #[strum(to_string = "125kHz")]
    Khz125,
    #[serde(rename = "250kHz")]
    #[strum(to_string = "250kHz")]
    Khz250,
    #[serde(rename = "500kHz")]
    #[strum(to_string = "500kHz")]
    Khz500,
}

impl Bandwidth {
    /// Bandwidth in hertz.
    pub fn hz(self) -> u32 {
        match self {
            Self::Khz7_8 => 7_800,
            Self::Khz10_4 => 10_400,
            Self::Khz15_6 => 15_600,
            Self::Khz20_8 => 20_800,
            Self::Khz31_25 => 31_250,
            Self::Khz41_7 => 41_700,
            Self::Khz62_5 => 62_500,
            Self::Khz125 => 125_000,
            Self::Khz250 => 250_000,
            Self::Khz500 => 500_000,
        }
    }
}

/// Forward error correction rate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
pub enum CodingRate {
    #[default]
    #[serde(rename = "4/5")]
    #[strum(to_string = "4/5")]
    FourFifths,
    #[serde(rename = "4/6")]
    #[strum(to_string = "4/6")]
    FourSixths,
    #[serde(rename = "4/7")]
    #[strum(to_string = "4/7")]
    FourSevenths,
    #[serde(rename = "4/8")]
    #[strum(to_string = "4/8")]
    FourEighths,
}

/// Chips per symbol, as a power of two.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
pub enum SpreadingFactor {
    #[serde(rename = "SF6")]
    #[strum(to_string = "SF6")]
    Sf6,
    #[default]
    #[serde(rename = "SF7")]
    #[strum(to_string = "SF7")]
    Sf7,
    #[serde(rename = "SF8")]
    #[strum(to_string = "SF8")]
    Sf8,
    #[serde(rename = "SF9")]
    #[strum(to_string = "SF9")]
    Sf9,
    #[serde(rename = "SF10")]
    #[strum(to_string = "SF10")]
    Sf10,
    #[serde(rename = "SF11")]
    #[strum(to_string = "SF11")]
    Sf11,
    #[serde(rename = "SF12")]
    #[strum(to_string = "SF12")]
    Sf12,
}

/// Detection optimisation profile. `SF6` needs its own setting.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
pub enum DetectionOptimize {
    #[default]
    #[serde(rename = "SF7toSF12")]
    #[strum(to_string = "SF7toSF12")]
    Sf7ToSf12,
    #[serde(rename = "SF6")]
    #[strum(to_string = "SF6")]
    Sf6,
}

/// Detection threshold profile, paired with [`DetectionOptimize`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
pub enum DetectionThreshold {
    #[default]
    #[serde(rename = "SF7toSF12")]
    #[strum(to_string = "SF7toSF12")]
    Sf7ToSf12,
    #[serde(rename = "SF6")]
    #[strum(to_string = "SF6")]
    Sf6,
}

// ── Radio configuration ─────────────────────────────────────────────

/// Physical-layer and protocol parameters handed to the radio driver.
///
/// Built once at startup and shared read-only. Every field has a usable
/// default, so `RadioConfiguration::default()` can drive a radio as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioConfiguration {
    /// Carrier frequency in Hz.
    pub frequency: f64,
    pub pa_boost: bool,
    pub max_power: u8,
    pub output_power: u8,
    /// Over-current protection.
    pub ocp_on: bool,
    pub ocp_trim: u8,
    pub lna_gain: LnaGain,
    pub lna_boost: bool,
    pub bandwidth: Bandwidth,
    pub coding_rate: CodingRate,
    pub implicit_header_mode_on: bool,
    pub spreading_factor: SpreadingFactor,
    pub symbol_timeout: u8,
    pub preamble_length: u8,
    pub payload_length: u8,
    pub payload_max_length: u8,
    pub freq_hopping_period: u8,
    pub low_data_rate_optimize: bool,
    pub agc_auto_on: bool,
    pub ppm_correction: u8,
    pub detection_optimize: DetectionOptimize,
    pub invert_iq: bool,
    pub detection_threshold: DetectionThreshold,
    pub sync_word: u8,
}

impl Default for RadioConfiguration {
    fn default() -> Self {
        Self {
            frequency: defaults::FREQUENCY_HZ,
            pa_boost: defaults::PA_BOOST,
            max_power: defaults::MAX_POWER,
            output_power: defaults::OUTPUT_POWER,
            ocp_on: defaults::OCP_ON,
            ocp_trim: defaults::OCP_TRIM,
            lna_gain: LnaGain::default(),
            lna_boost: defaults::LNA_BOOST,
            bandwidth: Bandwidth::default(),
            coding_rate: CodingRate::default(),
            implicit_header_mode_on: defaults::IMPLICIT_HEADER_MODE_ON,
            spreading_factor: SpreadingFactor::default(),
            symbol_timeout: defaults::SYMBOL_TIMEOUT,
            preamble_length: defaults::PREAMBLE_LENGTH,
            payload_length: defaults::PAYLOAD_LENGTH,
            payload_max_length: defaults::PAYLOAD_MAX_LENGTH,
            freq_hopping_period: defaults::FREQ_HOPPING_PERIOD,
            low_data_rate_optimize: defaults::LOW_DATA_RATE_OPTIMIZE,
            agc_auto_on: defaults::AGC_AUTO_ON,
            ppm_correction: defaults::PPM_CORRECTION,
            detection_optimize: DetectionOptimize::default(),
            invert_iq: defaults::INVERT_IQ,
            detection_threshold: DetectionThreshold::default(),
            sync_word: defaults::SYNC_WORD,
        }
    }
}

// ── Cloud credentials ───────────────────────────────────────────────

/// Who to post readings as, and where.
#[derive(Debug, Clone)]
pub struct CloudCredentials {
    /// Service base URL. `None` means the production endpoint.
    pub base_url: Option<Url>,
    pub api_key: SecretString,
    pub username: String,
    pub group_name: String,
}

/// TLS verification strategy for the feed service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file (self-hosted or intercepting proxies).
    CustomCa(PathBuf),
}

// ── Gateway configuration ───────────────────────────────────────────

/// Everything the gateway needs to run.
///
/// Built by the binary, passed to `Gateway::start` -- core never reads
/// config files.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub radio: RadioConfiguration,
    pub cloud: CloudCredentials,
    /// Address the radio listens on (1..=15 bytes).
    pub listen_address: Vec<u8>,
    /// Frame acceptance bounds.
    pub bounds: FrameBounds,
    pub tls: TlsVerification,
    /// Bound on each forward.
    pub request_timeout: Duration,
}

impl GatewayConfig {
    pub fn new(radio: RadioConfiguration, cloud: CloudCredentials, listen_address: Vec<u8>) -> Self {
        Self {
            radio,
            cloud,
            listen_address,
            bounds: FrameBounds::default(),
            tls: TlsVerification::default(),
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn enums_use_driver_spelling() {
        assert_eq!(
            serde_json::to_value(Bandwidth::Khz7_8).unwrap(),
            json!("7.8kHz")
        );
        assert_eq!(
            serde_json::to_value(CodingRate::FourEighths).unwrap(),
            json!("4/8")
        );
        assert_eq!(
            serde_json::to_value(DetectionThreshold::Sf7ToSf12).unwrap(),
            json!("SF7toSF12")
        );
        assert_eq!(SpreadingFactor::Sf12.to_string(), "SF12");
        let tag: &'static str = Bandwidth::Khz31_25.into();
        assert_eq!(tag, "31.25kHz");
    }

    #[test]
    fn default_radio_matches_documented_values() {
        let radio = RadioConfiguration::default();
        assert!((radio.frequency - 915_000_000.0).abs() < f64::EPSILON);
        assert_eq!(radio.max_power, 112);
        assert_eq!(radio.output_power, 15);
        assert_eq!(radio.ocp_trim, 11);
        assert_eq!(radio.symbol_timeout, 100);
        assert_eq!(radio.payload_max_length, 255);
        assert_eq!(radio.sync_word, 18);
        assert_eq!(radio.bandwidth.hz(), 125_000);
        assert_eq!(radio.coding_rate, CodingRate::FourFifths);
        assert_eq!(radio.spreading_factor, SpreadingFactor::Sf7);
        assert_eq!(radio.lna_gain, LnaGain::G1);
        assert!(radio.ocp_on);
        assert!(!radio.invert_iq);
    }

    #[test]
    fn radio_configuration_reads_back_from_json() {
        let radio = RadioConfiguration {
            spreading_factor: SpreadingFactor::Sf9,
            bandwidth: Bandwidth::Khz250,
            ..RadioConfiguration::default()
        };
        let value = serde_json::to_value(&radio).unwrap();
        assert_eq!(value["spreading_factor"], json!("SF9"));
        assert_eq!(value["bandwidth"], json!("250kHz"));
        let back: RadioConfiguration = serde_json::from_value(value).unwrap();
        assert_eq!(back, radio);
    }
}
