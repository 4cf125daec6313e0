//! Table-based NDL from the PADI Recreational Dive Planner.
//!
//! Depths are the planner's foot rows converted to metres. Between rows the
//! maximum bottom time is interpolated linearly; outside the table the nearest
//! row applies unchanged.

use serde::{Deserialize, Serialize};

use crate::units::Minutes;

/// One planner row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub depth_m: f64,
    pub max_bottom_time: Minutes,
}

const fn row(depth_m: f64, minutes: f64) -> ControlPoint {
    ControlPoint {
        depth_m,
        max_bottom_time: Minutes::new(minutes),
    }
}

/// Ascending by depth.
pub const PADI_RDP: [ControlPoint; 11] = [
    row(12.2, 205.0),
    row(15.2, 147.0),
    row(18.3, 100.0),
    row(21.3, 65.0),
    row(24.4, 45.0),
    row(27.4, 35.0),
    row(30.5, 25.0),
    row(33.5, 20.0),
    row(36.6, 15.0),
    row(39.6, 10.0),
    row(42.7, 5.0),
];

/// Maximum no-stop bottom time at `depth_m`.
pub fn max_bottom_time(depth_m: f64) -> Minutes {
    let first = PADI_RDP[0];
    let last = PADI_RDP[PADI_RDP.len() - 1];

    if depth_m <= first.depth_m {
        return first.max_bottom_time;
    }
    if depth_m >= last.depth_m {
        return last.max_bottom_time;
    }

    for pair in PADI_RDP.windows(2) {
        let (low, high) = (pair[0], pair[1]);
        if depth_m < high.depth_m {
            let fraction = (depth_m - low.depth_m) / (high.depth_m - low.depth_m);
            let t_low = low.max_bottom_time.value();
            let t_high = high.max_bottom_time.value();
            return Minutes(t_low + fraction * (t_high - t_low));
        }
    }

    last.max_bottom_time
}

/// Residual NDL: table limit minus time already spent. Negative once the
/// table limit is exceeded.
pub fn lookup(depth_m: f64, bottom_time: Minutes) -> Minutes {
    let residual = max_bottom_time(depth_m) - bottom_time;
    tracing::debug!(depth_m, residual_min = residual.value(), "PADI table lookup");
    residual
}
