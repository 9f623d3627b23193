// ── Field table ──
//
// Every persisted key, whether it must be present, and what it defaults
// to. Loading applies this table to the raw document before the typed
// extraction; the first-run template is generated from it too.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use lorafeed_core::config::defaults;
use lorafeed_core::{
    Bandwidth, CodingRate, DetectionOptimize, DetectionThreshold, LnaGain, SpreadingFactor,
};

use crate::ConfigError;

/// Template value of every mandatory credential.
pub const PLACEHOLDER_API_KEY: &str = "AdaFruitIO API Key goes here";
pub const PLACEHOLDER_USERNAME: &str = "AdaFruit User name goes here";
pub const PLACEHOLDER_GROUP_NAME: &str = "AdaFruit Group name goes here";
pub const PLACEHOLDER_ADDRESS: &str = "Address here";

pub const DEFAULT_RADIO_BIND: &str = "127.0.0.1:5700";
pub const DEFAULT_RADIO_PEER: &str = "127.0.0.1:5701";

/// How a field behaves when the document doesn't mention it.
#[derive(Clone, Copy)]
pub(crate) enum Presence {
    /// Absence is fatal. The template carries `placeholder`.
    Required { placeholder: &'static str },
    /// Absence is fine and stays absent.
    Optional { template: Option<fn() -> Value> },
    /// Absence means `default()`.
    Defaulted(fn() -> Value),
}

#[derive(Clone, Copy)]
pub(crate) struct FieldSpec {
    pub name: &'static str,
    pub presence: Presence,
    /// Taken verbatim from the environment; unquoted numbers in the file
    /// are stringified.
    pub text: bool,
    pub check: fn(&Value) -> Result<(), String>,
}

fn check<T: DeserializeOwned>(value: &Value) -> Result<(), String> {
    T::deserialize(value).map(drop).map_err(|e| e.to_string())
}

const fn required(name: &'static str, placeholder: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        presence: Presence::Required { placeholder },
        text: true,
        check: check::<String>,
    }
}

const fn defaulted(
    name: &'static str,
    default: fn() -> Value,
    check: fn(&Value) -> Result<(), String>,
) -> FieldSpec {
    FieldSpec {
        name,
        presence: Presence::Defaulted(default),
        text: false,
        check,
    }
}

pub(crate) const FIELDS: &[FieldSpec] = &[
    // ── Cloud credentials ──
    FieldSpec {
        name: "base_url",
        presence: Presence::Optional {
            template: Some(|| json!(lorafeed_core::forward::DEFAULT_BASE_URL)),
        },
        text: true,
        check: check::<url::Url>,
    },
    required("api_key", PLACEHOLDER_API_KEY),
    required("username", PLACEHOLDER_USERNAME),
    required("group_name", PLACEHOLDER_GROUP_NAME),
    required("address", PLACEHOLDER_ADDRESS),
    // ── Radio ──
    defaulted("frequency", || json!(defaults::FREQUENCY_HZ), check::<f64>),
    defaulted("pa_boost", || json!(defaults::PA_BOOST), check::<bool>),
    defaulted("max_power", || json!(defaults::MAX_POWER), check::<u8>),
    defaulted("output_power", || json!(defaults::OUTPUT_POWER), check::<u8>),
    defaulted("ocp_on", || json!(defaults::OCP_ON), check::<bool>),
    defaulted("ocp_trim", || json!(defaults::OCP_TRIM), check::<u8>),
    defaulted("lna_gain", || json!(LnaGain::default()), check::<LnaGain>),
    defaulted("lna_boost", || json!(defaults::LNA_BOOST), check::<bool>),
    defaulted("bandwidth", || json!(Bandwidth::default()), check::<Bandwidth>),
    defaulted("coding_rate", || json!(CodingRate::default()), check::<CodingRate>),
    defaulted(
        "implicit_header_mode_on",
        || json!(defaults::IMPLICIT_HEADER_MODE_ON),
        check::<bool>,
    ),
    defaulted(
        "spreading_factor",
        || json!(SpreadingFactor::default()),
        check::<SpreadingFactor>,
    ),
    defaulted("symbol_timeout", || json!(defaults::SYMBOL_TIMEOUT), check::<u8>),
    defaulted("preamble_length", || json!(defaults::PREAMBLE_LENGTH), check::<u8>),
    defaulted("payload_length", || json!(defaults::PAYLOAD_LENGTH), check::<u8>),
    defaulted(
        "payload_max_length",
        || json!(defaults::PAYLOAD_MAX_LENGTH),
        check::<u8>,
    ),
    defaulted(
        "freq_hopping_period",
        || json!(defaults::FREQ_HOPPING_PERIOD),
        check::<u8>,
    ),
    defaulted(
        "low_data_rate_optimize",
        || json!(defaults::LOW_DATA_RATE_OPTIMIZE),
        check::<bool>,
    ),
    defaulted("agc_auto_on", || json!(defaults::AGC_AUTO_ON), check::<bool>),
    defaulted("ppm_correction", || json!(defaults::PPM_CORRECTION), check::<u8>),
    defaulted(
        "detection_optimize",
        || json!(DetectionOptimize::default()),
        check::<DetectionOptimize>,
    ),
    defaulted("invert_iq", || json!(defaults::INVERT_IQ), check::<bool>),
    defaulted(
        "detection_threshold",
        || json!(DetectionThreshold::default()),
        check::<DetectionThreshold>,
    ),
    defaulted("sync_word", || json!(defaults::SYNC_WORD), check::<u8>),
    // ── Gateway plumbing ──
    defaulted(
        "request_timeout_secs",
        || json!(defaults::REQUEST_TIMEOUT_SECS),
        check::<u64>,
    ),
    FieldSpec {
        name: "radio_bind",
        presence: Presence::Defaulted(|| json!(DEFAULT_RADIO_BIND)),
        text: true,
        check: check::<std::net::SocketAddr>,
    },
    FieldSpec {
        name: "radio_peer",
        presence: Presence::Defaulted(|| json!(DEFAULT_RADIO_PEER)),
        text: true,
        check: check::<std::net::SocketAddr>,
    },
    defaulted("strict_address_length", || json!(false), check::<bool>),
    FieldSpec {
        name: "ca_cert",
        presence: Presence::Optional { template: None },
        text: true,
        check: check::<std::path::PathBuf>,
    },
];

/// Fields whose env override is taken as a raw string.
pub(crate) fn text_fields() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().filter(|f| f.text).map(|f| f.name)
}

pub(crate) fn is_known(key: &str) -> bool {
    FIELDS.iter().any(|f| f.name == key)
}

/// Apply the table to a raw document in place.
///
/// Rejects `null`, fills defaults, reports the first missing mandatory
/// field and the first value of the wrong shape.
pub(crate) fn apply(doc: &mut Map<String, Value>) -> Result<(), ConfigError> {
    for field in FIELDS {
        match doc.get_mut(field.name) {
            Some(Value::Null) => {
                return Err(ConfigError::Malformed {
                    field: field.name.into(),
                    reason: "null is not allowed".into(),
                });
            }
            Some(value) => {
                if field.text {
                    stringify_scalar(value);
                }
                (field.check)(value).map_err(|reason| ConfigError::Malformed {
                    field: field.name.into(),
                    reason,
                })?;
            }
            None => match field.presence {
                Presence::Required { .. } => {
                    return Err(ConfigError::Missing {
                        field: field.name.into(),
                    });
                }
                Presence::Optional { .. } => {}
                Presence::Defaulted(default) => {
                    doc.insert(field.name.into(), default());
                }
            },
        }
    }
    Ok(())
}

/// The document a first run writes out.
pub(crate) fn template() -> Map<String, Value> {
    FIELDS
        .iter()
        .filter_map(|field| {
            let value = match field.presence {
                Presence::Required { placeholder } => Some(json!(placeholder)),
                Presence::Optional { template } => template.map(|t| t()),
                Presence::Defaulted(default) => Some(default()),
            };
            value.map(|v| (field.name.to_owned(), v))
        })
        .collect()
}

/// Placeholder a mandatory field carries in the template, if any.
pub(crate) fn placeholder(name: &str) -> Option<&'static str> {
    FIELDS.iter().find_map(|f| match f.presence {
        Presence::Required { placeholder } if f.name == name => Some(placeholder),
        _ => None,
    })
}

fn stringify_scalar(value: &mut Value) {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return,
    };
    *value = Value::String(text);
}
