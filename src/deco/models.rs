//! Data types handed back to the calling layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::gas::GasMix;
use super::oxygen::OxygenRisk;
use crate::config::{CompartmentSet, DecoModelKind};

/// Why a stop was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopReason {
    /// NDL is exactly zero
    NdlReached,
    /// NDL is negative
    NdlExceeded,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NdlReached => write!(f, "NDL reached"),
            Self::NdlExceeded => write!(f, "NDL exceeded"),
        }
    }
}

/// Decompression stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompressionStop {
    /// Stop depth in meters
    pub depth_m: f64,
    /// Stop duration in whole minutes (at least 3)
    pub duration_min: u32,
    pub reason: StopReason,
}

/// Full state readout for one dive session.
#[derive(Debug, Clone, Serialize)]
pub struct DiveReport {
    /// Current depth in meters
    pub depth_m: f64,
    /// Ambient pressure in ATA
    pub pressure_ata: f64,
    /// Oxygen partial pressure at depth
    pub oxygen_toxicity: f64,
    pub oxygen_risk: OxygenRisk,
    pub gas: GasMix,
    pub gas_label: String,

    /// NDL of the tracked tensions (or PADI table), RGBM-adjusted when enabled
    pub ndl: f64,
    /// Compartment limiting `ndl`, none for the PADI table
    pub limiting_compartment: Option<u8>,
    /// Point-sample NDL assuming the whole time at depth from fresh tissue
    pub snapshot_ndl: f64,
    /// Smoothed NDL from the live tissue tracker
    pub tissue_ndl: f64,
    /// NDL from replaying the whole dive log
    pub accumulated_ndl: f64,
    /// Whether decompression stops are required
    pub decompression_required: bool,
    pub stops: Vec<DecompressionStop>,

    pub rgbm_factor: f64,
    pub time_at_depth_minutes: f64,
    pub time_elapsed_minutes: f64,

    pub deco_model: DecoModelKind,
    pub compartments: CompartmentSet,
    pub use_rgbm_for_ndl: bool,
    pub use_padi_ndl: bool,

    /// SHA256 of the replayed dive log
    pub history_hash: String,
}

/// Stop computed by the ZHL-16C reference model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStop {
    pub depth_m: f64,
    pub duration_min: f64,
}

/// Result of replaying a dive log through the ZHL-16C reference model.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceReport {
    pub model: &'static str,
    pub gf_low: f64,
    pub gf_high: f64,
    /// Depth the diver cannot ascend above (m)
    pub ceiling_m: f64,
    /// Time to surface (min)
    pub tts_min: f64,
    /// Only present when no decompression is required, capped at 999
    pub ndl_min: Option<u64>,
    pub deco_required: bool,
    pub stops: Vec<ReferenceStop>,
    pub max_depth_m: f64,
    pub runtime_min: f64,
    pub input_hash: String,
    pub warnings: Vec<String>,
}
