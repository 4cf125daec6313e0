//! No-decompression limit solver.
//!
//! Inverts the loading equation per compartment to find how long the tissue
//! may keep loading before it reaches its maximum tolerated tension:
//!
//! ```text
//! dt = -(1/k) * ln((P_amb - P_max) / (P_amb - P_current))
//! ```

use serde::{Deserialize, Serialize};

use super::compartment::Compartment;
use super::gas::GasMix;
use super::tissue::TissueTensions;
use crate::units::{ambient_pressure, Minutes};

/// Stand-in for an unbounded NDL, and the ceiling for any computed one.
pub const NDL_SENTINEL_MINUTES: f64 = 999.0;

/// Shortest time at depth the snapshot formula accepts.
const MIN_SNAPSHOT_MINUTES: f64 = 0.01;

/// Starting value of the smoothed live NDL.
pub const SMOOTHED_NDL_START: f64 = 200.0;

/// Remaining time allowed by one compartment. Negative means already over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompartmentLimit {
    pub compartment: u8,
    pub minutes: f64,
}

/// Reduced NDL before sentinel clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub minutes: f64,
    pub limiting_compartment: u8,
}

/// Reduces per-compartment limits to one value; `None` when none are valid.
pub type Aggregation = fn(&[CompartmentLimit]) -> Option<Aggregate>;

/// Solver output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NdlResult {
    pub ndl: Minutes,
    pub limiting_compartment: Option<u8>,
    pub decompression_required: bool,
}

impl NdlResult {
    fn unbounded() -> Self {
        Self {
            ndl: Minutes(NDL_SENTINEL_MINUTES),
            limiting_compartment: None,
            decompression_required: false,
        }
    }

    fn from_aggregate(aggregate: Option<Aggregate>) -> Self {
        let Some(Aggregate { minutes, limiting_compartment }) = aggregate else {
            tracing::debug!("no compartment can reach its limit, NDL unbounded");
            return Self::unbounded();
        };

        if !minutes.is_finite() || minutes > NDL_SENTINEL_MINUTES {
            tracing::debug!(minutes, "NDL above sentinel, clamping");
            return Self {
                ndl: Minutes(NDL_SENTINEL_MINUTES),
                limiting_compartment: Some(limiting_compartment),
                decompression_required: false,
            };
        }

        let decompression_required = minutes < 0.0;
        if decompression_required {
            tracing::warn!(
                ndl_min = minutes,
                limiting_compartment,
                "negative NDL, decompression required"
            );
        }
        Self {
            ndl: Minutes(minutes),
            limiting_compartment: Some(limiting_compartment),
            decompression_required,
        }
    }
}

/// Time until `tension` reaches the compartment's limit at `ambient_pressure`.
///
/// Returns `None` for compartments that can never reach the limit going
/// forward or whose numbers are degenerate. A tension at or above ambient
/// pressure yields zero.
pub fn compartment_limit(compartment: &Compartment, tension: f64, ambient_pressure: f64) -> Option<f64> {
    let k = compartment.rate_constant();
    if !k.is_finite() || k <= 0.0 {
        return None;
    }

    let denominator = ambient_pressure - tension;
    if denominator <= 0.0 {
        return Some(0.0);
    }

    let numerator = ambient_pressure - compartment.max_tension(ambient_pressure);
    let ratio = numerator / denominator;
    if !ratio.is_finite() || ratio <= 0.0 {
        tracing::debug!(
            compartment = compartment.index,
            ratio,
            "log argument <= 0, compartment excluded"
        );
        return None;
    }

    let minutes = -ratio.ln() / k;
    minutes.is_finite().then_some(minutes)
}

/// Per-compartment limits for every compartment that yields one.
pub fn compartment_limits(
    compartments: &[Compartment],
    tensions: &TissueTensions,
    ambient_pressure: f64,
) -> Vec<CompartmentLimit> {
    compartments
        .iter()
        .zip(tensions.values())
        .filter_map(|(compartment, &tension)| {
            compartment_limit(compartment, tension, ambient_pressure).map(|minutes| {
                CompartmentLimit {
                    compartment: compartment.index,
                    minutes,
                }
            })
        })
        .collect()
}

/// Sums the deficits of every over-limit compartment; otherwise the minimum.
///
/// Summing per-compartment deficits is not standard decompression practice;
/// it is kept for compatibility with recorded dive histories. The most
/// negative compartment is reported as limiting.
pub fn deficit_sum(limits: &[CompartmentLimit]) -> Option<Aggregate> {
    let deficits: Vec<&CompartmentLimit> = limits.iter().filter(|l| l.minutes < 0.0).collect();
    if deficits.is_empty() {
        return most_restrictive(limits);
    }

    let worst = deficits
        .iter()
        .min_by(|a, b| a.minutes.total_cmp(&b.minutes))?;
    Some(Aggregate {
        minutes: deficits.iter().map(|l| l.minutes).sum(),
        limiting_compartment: worst.compartment,
    })
}

/// The smallest limit wins; ties go to the faster compartment.
pub fn most_restrictive(limits: &[CompartmentLimit]) -> Option<Aggregate> {
    limits
        .iter()
        .min_by(|a, b| a.minutes.total_cmp(&b.minutes))
        .map(|l| Aggregate {
            minutes: l.minutes,
            limiting_compartment: l.compartment,
        })
}

/// NDL for a tension snapshot, aggregated with [`deficit_sum`].
pub fn solve(compartments: &[Compartment], tensions: &TissueTensions, ambient_pressure: f64) -> NdlResult {
    solve_with(compartments, tensions, ambient_pressure, deficit_sum)
}

/// NDL for a tension snapshot with an explicit aggregation policy.
pub fn solve_with(
    compartments: &[Compartment],
    tensions: &TissueTensions,
    ambient_pressure: f64,
    aggregation: Aggregation,
) -> NdlResult {
    let limits = compartment_limits(compartments, tensions, ambient_pressure);
    NdlResult::from_aggregate(aggregation(&limits))
}

/// Point-sample NDL assuming the whole `time_at_depth` was spent at
/// `depth_m` starting from a desaturated tissue.
///
/// Each compartment's remaining time is `ln(1 - M / P_inert) / -k - t`.
pub fn snapshot_ndl(
    compartments: &[Compartment],
    depth_m: f64,
    time_at_depth: Minutes,
    gas: &GasMix,
) -> NdlResult {
    let elapsed = time_at_depth.value().max(MIN_SNAPSHOT_MINUTES);
    let pressure = ambient_pressure(depth_m);
    let inert_pressure = pressure * gas.inert_gas_fraction();

    tracing::debug!(
        depth_m,
        pressure,
        inert_pressure,
        gas = %gas.label(),
        "computing snapshot NDL"
    );

    let mut best: Option<Aggregate> = None;
    for compartment in compartments {
        let k = compartment.rate_constant();
        if inert_pressure <= 0.0 || !k.is_finite() || k <= 0.0 {
            continue;
        }

        let log_arg = 1.0 - compartment.max_tension(pressure) / inert_pressure;
        if log_arg <= 0.0 {
            tracing::debug!(compartment = compartment.index, log_arg, "log argument <= 0");
            continue;
        }

        let minutes = log_arg.ln() / -k - elapsed;
        if !minutes.is_finite() {
            continue;
        }
        if best.map_or(true, |b| minutes < b.minutes) {
            tracing::debug!(compartment = compartment.index, minutes, "new limiting compartment");
            best = Some(Aggregate {
                minutes,
                limiting_compartment: compartment.index,
            });
        }
    }

    NdlResult::from_aggregate(best)
}

/// Exponential smoothing for a live NDL readout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NdlSmoother {
    alpha: f64,
    value: f64,
}

impl NdlSmoother {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            value: SMOOTHED_NDL_START,
        }
    }

    /// Moves the smoothed value `alpha` of the way toward `sample`.
    pub fn update(&mut self, sample: Minutes) -> Minutes {
        self.value += self.alpha * (sample.value() - self.value);
        Minutes(self.value)
    }

    pub fn value(&self) -> Minutes {
        Minutes(self.value)
    }

    pub fn reset(&mut self) {
        self.value = SMOOTHED_NDL_START;
    }
}
