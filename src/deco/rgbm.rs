//! RGBM-style conservatism factor.
//!
//! `factor = round((1 + t_s / 60) * exp(-depth / 100) * (1 + He * 0.2), 5)`
//!
//! The factor depends only on the instantaneous depth, time at that depth and
//! gas. It drops below 1.0 for brief or shallow exposures, which lengthens an
//! NDL divided by it.

use super::gas::GasMix;
use crate::units::{round_to, Minutes, Seconds};

/// Time at depth below this is treated as this, avoiding a degenerate factor
/// on arrival at a new depth.
pub const TIME_AT_DEPTH_FLOOR: Seconds = Seconds::new(0.1);

/// Factor reported while at the surface.
pub const SURFACE_FACTOR: f64 = 1.0;

const DEPTH_SCALE_M: f64 = 100.0;
const INERT_PENALTY: f64 = 0.2;

pub fn factor(depth_m: f64, time_at_depth: Seconds, gas: &GasMix) -> f64 {
    let time = time_at_depth.value().max(TIME_AT_DEPTH_FLOOR.value());
    let base = (1.0 + time / 60.0) * (-depth_m / DEPTH_SCALE_M).exp();
    // Non-zero only when helium is in the mix.
    let gas_penalty = 1.0 + (gas.inert_gas_fraction() - gas.nitrogen_fraction()) * INERT_PENALTY;
    let factor = round_to(base * gas_penalty, 5);

    tracing::debug!(
        depth_m,
        time_at_depth_s = time,
        factor,
        gas = %gas.label(),
        "RGBM factor"
    );
    factor
}

/// Divides `ndl` by `factor`; non-positive factors leave it untouched.
pub fn adjust_ndl(ndl: Minutes, factor: f64) -> Minutes {
    if factor > 0.0 {
        Minutes(ndl.value() / factor)
    } else {
        ndl
    }
}
