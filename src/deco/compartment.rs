//! Tissue compartment definitions.

use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;

use crate::units::{Minutes, SURFACE_PRESSURE_ATA};

/// Bühlmann linear M-value law coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuhlmannCoefficients {
    pub a: f64,
    pub b: f64,
}

/// One modelled tissue class.
///
/// The rate constant is always derived from `half_time`, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Compartment {
    /// 1-based compartment number
    pub index: u8,
    pub half_time: Minutes,
    /// Surface-referenced maximum tolerated tension multiplier
    pub m_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coefficients: Option<BuhlmannCoefficients>,
}

impl Compartment {
    pub const fn new(index: u8, half_time_min: f64, m_value: f64) -> Self {
        Self {
            index,
            half_time: Minutes::new(half_time_min),
            m_value,
            coefficients: None,
        }
    }

    pub const fn with_coefficients(self, a: f64, b: f64) -> Self {
        Self {
            coefficients: Some(BuhlmannCoefficients { a, b }),
            ..self
        }
    }

    /// Uptake/elimination rate constant `k = ln 2 / half_time` (per minute).
    pub fn rate_constant(&self) -> f64 {
        LN_2 / self.half_time.value()
    }

    /// Maximum tolerated tension (ATA) at `ambient_pressure`.
    pub fn max_tension(&self, ambient_pressure: f64) -> f64 {
        match self.coefficients {
            Some(BuhlmannCoefficients { a, b }) => (ambient_pressure - a) / b,
            None => self.m_value * SURFACE_PRESSURE_ATA,
        }
    }
}

/// The 10-compartment M-value table the simulator ships with.
pub const M_VALUE_COMPARTMENTS: [Compartment; 10] = [
    Compartment::new(1, 4.0, 1.57),
    Compartment::new(2, 8.0, 1.42),
    Compartment::new(3, 12.5, 1.34),
    Compartment::new(4, 18.5, 1.28),
    Compartment::new(5, 27.0, 1.23),
    Compartment::new(6, 38.3, 1.20),
    Compartment::new(7, 54.3, 1.17),
    Compartment::new(8, 77.0, 1.14),
    Compartment::new(9, 109.0, 1.11),
    Compartment::new(10, 146.0, 1.08),
];

/// ZHL-16C nitrogen half-times with their a/b coefficients.
///
/// `m_value` is the surface M-value `a + 1/b` implied by the coefficients;
/// the solver uses the coefficients whenever they are present.
pub const ZHL16C_COMPARTMENTS: [Compartment; 16] = [
    Compartment::new(1, 5.0, 2.9624).with_coefficients(1.1696, 0.5578),
    Compartment::new(2, 8.0, 2.5352).with_coefficients(1.0000, 0.6514),
    Compartment::new(3, 12.5, 2.2465).with_coefficients(0.8618, 0.7222),
    Compartment::new(4, 18.5, 2.0342).with_coefficients(0.7562, 0.7825),
    Compartment::new(5, 27.0, 1.8506).with_coefficients(0.6200, 0.8126),
    Compartment::new(6, 38.3, 1.6900).with_coefficients(0.5043, 0.8434),
    Compartment::new(7, 54.3, 1.5914).with_coefficients(0.4410, 0.8693),
    Compartment::new(8, 77.0, 1.5223).with_coefficients(0.4000, 0.8910),
    Compartment::new(9, 109.0, 1.4749).with_coefficients(0.3750, 0.9092),
    Compartment::new(10, 146.0, 1.4344).with_coefficients(0.3500, 0.9222),
    Compartment::new(11, 187.0, 1.4026).with_coefficients(0.3295, 0.9319),
    Compartment::new(12, 239.0, 1.3700).with_coefficients(0.3065, 0.9403),
    Compartment::new(13, 305.0, 1.3387).with_coefficients(0.2835, 0.9477),
    Compartment::new(14, 390.0, 1.3088).with_coefficients(0.2610, 0.9544),
    Compartment::new(15, 498.0, 1.2894).with_coefficients(0.2480, 0.9602),
    Compartment::new(16, 635.0, 1.2687).with_coefficients(0.2327, 0.9653),
];
