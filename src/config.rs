//! Runtime settings, loaded from the environment or a `.env` file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::deco::compartment::{Compartment, M_VALUE_COMPARTMENTS, ZHL16C_COMPARTMENTS};
use crate::error::ConfigError;

pub const ENV_USE_PADI_NDL: &str = "DIVALGO_USE_PADI_NDL";
pub const ENV_USE_RGBM_FOR_NDL: &str = "DIVALGO_USE_RGBM_FOR_NDL";
pub const ENV_DECO_MODEL: &str = "DIVALGO_DECO_MODEL";
pub const ENV_COMPARTMENTS: &str = "DIVALGO_COMPARTMENTS";
pub const ENV_NDL_SMOOTHING_ALPHA: &str = "DIVALGO_NDL_SMOOTHING_ALPHA";
pub const ENV_GF_LOW: &str = "DIVALGO_GF_LOW";
pub const ENV_GF_HIGH: &str = "DIVALGO_GF_HIGH";

/// Selected decompression model.
///
/// Only recorded and echoed in reports; the NDL math does not branch on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecoModelKind {
    #[default]
    #[serde(rename = "bühlmann", alias = "buhlmann")]
    Buhlmann,
    #[serde(rename = "rgbm")]
    Rgbm,
    #[serde(rename = "vpm")]
    Vpm,
    #[serde(rename = "deepstops")]
    DeepStops,
    #[serde(rename = "custom")]
    Custom,
}

impl DecoModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buhlmann => "bühlmann",
            Self::Rgbm => "rgbm",
            Self::Vpm => "vpm",
            Self::DeepStops => "deepstops",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for DecoModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecoModelKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bühlmann" | "buhlmann" => Ok(Self::Buhlmann),
            "rgbm" => Ok(Self::Rgbm),
            "vpm" => Ok(Self::Vpm),
            "deepstops" => Ok(Self::DeepStops),
            "custom" => Ok(Self::Custom),
            _ => Err(ConfigError::UnknownDecoModel(s.to_string())),
        }
    }
}

/// Which compartment table the trackers load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompartmentSet {
    /// 10 compartments with fixed M-values
    #[default]
    MValue,
    /// ZHL-16C nitrogen half-times with a/b coefficients
    Zhl16c,
}

impl CompartmentSet {
    pub fn table(&self) -> &'static [Compartment] {
        match self {
            Self::MValue => &M_VALUE_COMPARTMENTS,
            Self::Zhl16c => &ZHL16C_COMPARTMENTS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MValue => "m-value",
            Self::Zhl16c => "zhl16c",
        }
    }
}

impl fmt::Display for CompartmentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompartmentSet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m-value" | "mvalue" => Ok(Self::MValue),
            "zhl16c" | "zhl-16c" => Ok(Self::Zhl16c),
            _ => Err(ConfigError::UnknownCompartmentSet(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoSettings {
    /// Replace the replayed NDL with the PADI table
    pub use_padi_ndl: bool,
    /// Divide NDL by the RGBM conservatism factor
    pub use_rgbm_for_ndl: bool,
    pub deco_model: DecoModelKind,
    pub compartments: CompartmentSet,
    pub ndl_smoothing_alpha: f64,
    /// Gradient factors for the ZHL-16C cross-check
    pub gf_low: f64,
    pub gf_high: f64,
}

impl Default for DecoSettings {
    fn default() -> Self {
        Self {
            use_padi_ndl: false,
            use_rgbm_for_ndl: false,
            deco_model: DecoModelKind::Buhlmann,
            compartments: CompartmentSet::MValue,
            ndl_smoothing_alpha: 0.1,
            gf_low: 0.40,
            gf_high: 0.85,
        }
    }
}

impl DecoSettings {
    /// Loads `.env` if present, then reads `DIVALGO_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Missing keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(raw) = lookup(ENV_USE_PADI_NDL) {
            settings.use_padi_ndl = parse_bool(ENV_USE_PADI_NDL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_USE_RGBM_FOR_NDL) {
            settings.use_rgbm_for_ndl = parse_bool(ENV_USE_RGBM_FOR_NDL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DECO_MODEL) {
            settings.deco_model = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_COMPARTMENTS) {
            settings.compartments = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_NDL_SMOOTHING_ALPHA) {
            settings.ndl_smoothing_alpha = parse_fraction(ENV_NDL_SMOOTHING_ALPHA, &raw)?;
        }
        if let Some(raw) = lookup(ENV_GF_LOW) {
            settings.gf_low = parse_fraction(ENV_GF_LOW, &raw)?;
        }
        if let Some(raw) = lookup(ENV_GF_HIGH) {
            settings.gf_high = parse_fraction(ENV_GF_HIGH, &raw)?;
        }

        tracing::debug!(?settings, "loaded deco settings");
        Ok(settings)
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(key, raw)),
    }
}

/// A finite value in `[0, 1]`.
fn parse_fraction(key: &'static str, raw: &str) -> Result<f64, ConfigError> {
    let value: f64 = raw.trim().parse().map_err(|_| invalid(key, raw))?;
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(invalid(key, raw));
    }
    Ok(value)
}

fn invalid(key: &'static str, raw: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = DecoSettings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, DecoSettings::default());
        assert!(!settings.use_padi_ndl);
        assert!(!settings.use_rgbm_for_ndl);
        assert_eq!(settings.deco_model, DecoModelKind::Buhlmann);
        assert_eq!(settings.compartments, CompartmentSet::MValue);
        assert_eq!(settings.ndl_smoothing_alpha, 0.1);
    }

    #[test]
    fn test_reads_every_key() {
        let settings = DecoSettings::from_lookup(lookup_from(&[
            (ENV_USE_PADI_NDL, "true"),
            (ENV_USE_RGBM_FOR_NDL, "1"),
            (ENV_DECO_MODEL, "RGBM"),
            (ENV_COMPARTMENTS, "zhl16c"),
            (ENV_NDL_SMOOTHING_ALPHA, "0.25"),
            (ENV_GF_LOW, "0.3"),
            (ENV_GF_HIGH, "0.7"),
        ]))
        .unwrap();

        assert!(settings.use_padi_ndl);
        assert!(settings.use_rgbm_for_ndl);
        assert_eq!(settings.deco_model, DecoModelKind::Rgbm);
        assert_eq!(settings.compartments, CompartmentSet::Zhl16c);
        assert_eq!(settings.ndl_smoothing_alpha, 0.25);
        assert_eq!(settings.gf_low, 0.3);
        assert_eq!(settings.gf_high, 0.7);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = DecoSettings::from_lookup(lookup_from(&[(ENV_USE_PADI_NDL, "maybe")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: ENV_USE_PADI_NDL,
                value: "maybe".to_string()
            }
        );

        let err = DecoSettings::from_lookup(lookup_from(&[(ENV_DECO_MODEL, "haldane")])).unwrap_err();
        assert_eq!(err, ConfigError::UnknownDecoModel("haldane".to_string()));

        let err = DecoSettings::from_lookup(lookup_from(&[(ENV_COMPARTMENTS, "zhl8")])).unwrap_err();
        assert_eq!(err, ConfigError::UnknownCompartmentSet("zhl8".to_string()));

        assert!(DecoSettings::from_lookup(lookup_from(&[(ENV_GF_HIGH, "1.5")])).is_err());
        assert!(DecoSettings::from_lookup(lookup_from(&[(ENV_NDL_SMOOTHING_ALPHA, "NaN")])).is_err());
    }

    #[test]
    fn test_deco_model_spellings() {
        assert_eq!("bühlmann".parse::<DecoModelKind>().unwrap(), DecoModelKind::Buhlmann);
        assert_eq!("Buhlmann".parse::<DecoModelKind>().unwrap(), DecoModelKind::Buhlmann);
        assert_eq!("deepstops".parse::<DecoModelKind>().unwrap(), DecoModelKind::DeepStops);

        let json = serde_json::to_string(&DecoModelKind::Buhlmann).unwrap();
        assert_eq!(json, "\"bühlmann\"");
        let parsed: DecoModelKind = serde_json::from_str("\"buhlmann\"").unwrap();
        assert_eq!(parsed, DecoModelKind::Buhlmann);
        assert_eq!(DecoModelKind::Vpm.to_string(), "vpm");
    }

    #[test]
    fn test_compartment_tables() {
        assert_eq!(CompartmentSet::MValue.table().len(), 10);
        assert_eq!(CompartmentSet::Zhl16c.table().len(), 16);
        assert_eq!(serde_json::to_string(&CompartmentSet::MValue).unwrap(), "\"m-value\"");
        assert_eq!(CompartmentSet::Zhl16c.to_string(), "zhl16c");
    }
}
