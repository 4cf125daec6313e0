//! Breathing gas mix.

use serde::{Deserialize, Serialize};

use crate::error::{DecoError, Result};

/// Accepted deviation of the fraction sum from 1.0 before rescaling.
pub const FRACTION_SUM_TOLERANCE: f64 = 0.001;

/// Oxygen/nitrogen/helium fractions summing to 1.0 (±0.001).
///
/// Mixes built through [`GasMix::new`] or deserialized are normalized by
/// uniform scaling when their sum drifts outside the tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGasMix")]
pub struct GasMix {
    oxygen_fraction: f64,
    nitrogen_fraction: f64,
    helium_fraction: f64,
}

#[derive(Deserialize)]
struct RawGasMix {
    #[serde(default = "default_oxygen")]
    oxygen_fraction: f64,
    #[serde(default = "default_nitrogen")]
    nitrogen_fraction: f64,
    #[serde(default)]
    helium_fraction: f64,
}

fn default_oxygen() -> f64 {
    0.21
}

fn default_nitrogen() -> f64 {
    0.79
}

impl TryFrom<RawGasMix> for GasMix {
    type Error = DecoError;

    fn try_from(raw: RawGasMix) -> Result<Self> {
        GasMix::new(raw.oxygen_fraction, raw.nitrogen_fraction, raw.helium_fraction)
    }
}

impl GasMix {
    /// Validates and normalizes a mix.
    pub fn new(oxygen: f64, nitrogen: f64, helium: f64) -> Result<Self> {
        for (gas, value) in [("oxygen", oxygen), ("nitrogen", nitrogen), ("helium", helium)] {
            if !value.is_finite() || value < 0.0 {
                return Err(DecoError::InvalidGasFraction { gas, value });
            }
        }

        let total = oxygen + nitrogen + helium;
        if total <= 0.0 {
            return Err(DecoError::DegenerateGasMix);
        }

        if (total - 1.0).abs() <= FRACTION_SUM_TOLERANCE {
            return Ok(Self {
                oxygen_fraction: oxygen,
                nitrogen_fraction: nitrogen,
                helium_fraction: helium,
            });
        }

        let scale = 1.0 / total;
        tracing::debug!(total, scale, "normalizing gas fractions");
        Ok(Self {
            oxygen_fraction: oxygen * scale,
            nitrogen_fraction: nitrogen * scale,
            helium_fraction: helium * scale,
        })
    }

    pub const fn air() -> Self {
        Self {
            oxygen_fraction: 0.21,
            nitrogen_fraction: 0.79,
            helium_fraction: 0.0,
        }
    }

    pub fn oxygen_fraction(&self) -> f64 {
        self.oxygen_fraction
    }

    pub fn nitrogen_fraction(&self) -> f64 {
        self.nitrogen_fraction
    }

    pub fn helium_fraction(&self) -> f64 {
        self.helium_fraction
    }

    /// Fraction of the mix that loads tissues (oxygen is metabolized).
    pub fn inert_gas_fraction(&self) -> f64 {
        self.nitrogen_fraction + self.helium_fraction
    }

    /// Human-readable label, e.g. `21% O₂, 79% N₂, 0% He`.
    pub fn label(&self) -> String {
        format!(
            "{:.0}% O₂, {:.0}% N₂, {:.0}% He",
            self.oxygen_fraction * 100.0,
            self.nitrogen_fraction * 100.0,
            self.helium_fraction * 100.0
        )
    }
}

impl Default for GasMix {
    fn default() -> Self {
        Self::air()
    }
}
