//! Oxygen partial pressure and toxicity classification.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::gas::GasMix;
use crate::units::{ambient_pressure, round_to};

const AIR_OXYGEN_FRACTION: f64 = 0.21;
const TABLE_MAX_DEPTH_M: u32 = 100;
const TABLE_STEP_M: usize = 10;

/// Oxygen partial pressure (ATA) breathing `gas` at `depth_m`.
pub fn partial_pressure_o2(gas: &GasMix, depth_m: f64) -> f64 {
    gas.oxygen_fraction() * ambient_pressure(depth_m)
}

/// Toxicity band for an oxygen partial pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OxygenRisk {
    Safe,
    Moderate,
    Severe,
    High,
    Fatal,
}

impl OxygenRisk {
    pub fn classify(ppo2: f64) -> Self {
        if ppo2 <= 1.6 {
            Self::Safe
        } else if ppo2 <= 2.0 {
            Self::Moderate
        } else if ppo2 <= 3.0 {
            Self::Severe
        } else if ppo2 <= 5.0 {
            Self::High
        } else {
            Self::Fatal
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::Moderate => "Moderate (CNS risk)",
            Self::Severe => "Severe (Convulsions likely)",
            Self::High => "High (Extreme CNS risk)",
            Self::Fatal => "Fatal (Beyond safe limits)",
        }
    }
}

impl fmt::Display for OxygenRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// One row of the oxygen toxicity reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OxygenToxicityRow {
    pub depth_m: u32,
    pub absolute_pressure: f64,
    pub ppo2_air: f64,
    pub ppo2_oxygen: f64,
    /// Risk of breathing pure oxygen at this depth
    pub risk: OxygenRisk,
}

/// ppO2 on air and on pure oxygen every 10 m from the surface to 100 m.
pub fn oxygen_toxicity_table() -> Vec<OxygenToxicityRow> {
    (0..=TABLE_MAX_DEPTH_M)
        .step_by(TABLE_STEP_M)
        .map(|depth_m| {
            let absolute_pressure = round_to(ambient_pressure(f64::from(depth_m)), 2);
            let ppo2_oxygen = round_to(absolute_pressure, 2);
            OxygenToxicityRow {
                depth_m,
                absolute_pressure,
                ppo2_air: round_to(absolute_pressure * AIR_OXYGEN_FRACTION, 2),
                ppo2_oxygen,
                risk: OxygenRisk::classify(ppo2_oxygen),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_partial_pressure() {
        assert_relative_eq!(partial_pressure_o2(&GasMix::air(), 30.0), 0.84, epsilon = 1e-12);
        let ean32 = GasMix::new(0.32, 0.68, 0.0).unwrap();
        assert_relative_eq!(partial_pressure_o2(&ean32, 40.0), 1.6, epsilon = 1e-12);
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(OxygenRisk::classify(1.4), OxygenRisk::Safe);
        assert_eq!(OxygenRisk::classify(1.6), OxygenRisk::Safe);
        assert_eq!(OxygenRisk::classify(1.61), OxygenRisk::Moderate);
        assert_eq!(OxygenRisk::classify(2.0), OxygenRisk::Moderate);
        assert_eq!(OxygenRisk::classify(3.0), OxygenRisk::Severe);
        assert_eq!(OxygenRisk::classify(5.0), OxygenRisk::High);
        assert_eq!(OxygenRisk::classify(5.01), OxygenRisk::Fatal);
    }

    #[test]
    fn test_table_rows() {
        let table = oxygen_toxicity_table();
        assert_eq!(table.len(), 11);

        assert_eq!(table[0].risk, OxygenRisk::Safe);
        assert_eq!(table[1].ppo2_oxygen, 2.0);
        assert_eq!(table[1].risk, OxygenRisk::Moderate);
        assert_eq!(table[3].ppo2_air, 0.84);
        assert_eq!(table[3].risk, OxygenRisk::High);
        assert_eq!(table[10].depth_m, 100);
        assert_eq!(table[10].absolute_pressure, 11.0);
        assert_eq!(table[10].risk, OxygenRisk::Fatal);
    }

    #[test]
    fn test_description() {
        assert_eq!(OxygenRisk::Moderate.to_string(), "Moderate (CNS risk)");
    }
}
