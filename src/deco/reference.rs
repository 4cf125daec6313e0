//! Bühlmann ZHL-16C cross-check through the `dive-deco` crate.

use dive_deco::{BuehlmannConfig, BuehlmannModel, Deco, DecoModel, DecoStageType, Gas};

use super::gas::GasMix;
use super::history::{history_fingerprint, intervals, DiveSegment, Interval, Intervals};
use super::models::{ReferenceReport, ReferenceStop};
use crate::error::ReferenceError;

const MODEL_NAME: &str = "Bühlmann ZHL-16C";
const NDL_CAP_MINUTES: u64 = 999;

/// Replays `history` through the reference model with gradient factors
/// given as fractions.
pub fn validate(
    history: &[DiveSegment],
    gas: &GasMix,
    gf_low: f64,
    gf_high: f64,
) -> Result<ReferenceReport, ReferenceError> {
    if history.is_empty() {
        return Err(ReferenceError::NoSegments);
    }
    let (o2, he) = (gas.oxygen_fraction(), gas.helium_fraction());
    if !(0.0..=1.0).contains(&o2) || !(0.0..=1.0).contains(&he) {
        return Err(ReferenceError::InvalidGasFractions);
    }
    if o2 + he > 1.0 + f64::EPSILON {
        return Err(ReferenceError::GasFractionsExceedOne);
    }
    if !(gf_low > 0.0 && gf_low <= gf_high && gf_high <= 1.0) {
        return Err(ReferenceError::InvalidGradientFactors);
    }

    let Intervals { intervals, skipped } = intervals(history);
    if intervals.is_empty() {
        return Err(ReferenceError::NoSegments);
    }

    let warnings: Vec<String> = (skipped > 0)
        .then(|| format!("skipped {skipped} log entries that added no time at depth"))
        .into_iter()
        .collect();

    let max_depth_m = intervals.iter().map(|i| i.depth_m).fold(0.0_f64, f64::max);
    let runtime_min: f64 = intervals.iter().map(|i| i.duration.value()).sum();

    let dive_gas = Gas::new(o2, he);
    let mut model = loaded_model(&intervals, &dive_gas, gf_low, gf_high);

    let ceiling_m = model.ceiling();
    let deco_required = ceiling_m > 0.0;
    // Unbounded near the surface
    let ndl_min = (!deco_required).then(|| (model.ndl() as u64).min(NDL_CAP_MINUTES));

    let Deco { deco_stages, tts } = model.deco(vec![dive_gas]);
    let stops: Vec<ReferenceStop> = deco_stages
        .iter()
        .filter_map(|stage| {
            let is_stop = matches!(stage.stage_type, DecoStageType::DecoStop) && stage.duration > 0;
            is_stop.then(|| ReferenceStop {
                depth_m: stage.start_depth,
                duration_min: stage.duration as f64 / 60.0,
            })
        })
        .collect();

    tracing::debug!(ceiling_m, deco_required, stops = stops.len(), "reference replay finished");

    Ok(ReferenceReport {
        model: MODEL_NAME,
        gf_low,
        gf_high,
        ceiling_m,
        tts_min: tts as f64 / 60.0,
        ndl_min,
        deco_required,
        stops,
        max_depth_m,
        runtime_min,
        input_hash: history_fingerprint(history),
        warnings,
    })
}

/// Model loaded with every interval. Gradient factors go in as percentages.
fn loaded_model(intervals: &[Interval], gas: &Gas, gf_low: f64, gf_high: f64) -> BuehlmannModel {
    let percent = |gf: f64| (gf * 100.0).round() as u8;
    let config = BuehlmannConfig::new().gradient_factors(percent(gf_low), percent(gf_high));
    let mut model = BuehlmannModel::new(config);
    for interval in intervals {
        let seconds = interval.duration.to_seconds().value().round() as usize;
        model.step(&interval.depth_m, &seconds, gas);
    }
    model
}
