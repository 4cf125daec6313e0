//! Decompression stop planning once the NDL is used up.

use super::models::{DecompressionStop, StopReason};
use crate::units::Minutes;

/// Vertical spacing between consecutive stops (m).
pub const STOP_INTERVAL_M: f64 = 3.0;

/// Shortest stop duration (min).
pub const MIN_STOP_MINUTES: u32 = 3;
const MIN_FIRST_STOP_M: f64 = 3.0;

/// Stops from the first stop up to the surface, deepest first.
///
/// The first stop sits 10 m above `depth_m` rounded down to a multiple of
/// 10 m, kept within `[3, depth_m - 3]`. Each stop lasts
/// `|ndl| * (1 + stop_depth / depth * 0.5)` minutes, at least three.
/// A positive NDL or a depth of 3 m or less yields no stops.
pub fn plan(ndl: Minutes, depth_m: f64) -> Vec<DecompressionStop> {
    let deficit = ndl.value();
    if deficit > 0.0 || depth_m <= MIN_FIRST_STOP_M {
        return Vec::new();
    }

    let reason = if deficit < 0.0 {
        StopReason::NdlExceeded
    } else {
        StopReason::NdlReached
    };

    let mut stop_depth = ((depth_m / 10.0).floor() * 10.0 - 10.0)
        .max(MIN_FIRST_STOP_M)
        .min(depth_m - STOP_INTERVAL_M);

    let mut stops = Vec::new();
    while stop_depth > 0.0 {
        let weighted = deficit.abs() * (1.0 + (stop_depth / depth_m) * 0.5);
        let duration_min = (weighted.floor() as u32).max(MIN_STOP_MINUTES);
        stops.push(DecompressionStop {
            depth_m: stop_depth,
            duration_min,
            reason,
        });
        stop_depth -= STOP_INTERVAL_M;
    }

    tracing::debug!(depth_m, ndl_min = deficit, stops = stops.len(), "planned decompression stops");
    stops
}
