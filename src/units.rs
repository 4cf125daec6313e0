//! Time quantities and the depth-to-pressure conversion.
//!
//! Every public operation that takes a duration names its unit through
//! [`Minutes`] or [`Seconds`]; raw `f64` durations never cross a module
//! boundary.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub};

use crate::error::{DecoError, Result};

/// Absolute pressure at the surface (ATA).
pub const SURFACE_PRESSURE_ATA: f64 = 1.0;

/// Metres of water per atmosphere.
pub const METERS_PER_ATA: f64 = 10.0;

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Ambient absolute pressure (ATA) at `depth_m` metres.
///
/// The only depth-to-pressure conversion in the crate.
pub fn ambient_pressure(depth_m: f64) -> f64 {
    SURFACE_PRESSURE_ATA + depth_m / METERS_PER_ATA
}

/// Rounds half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Rejects negative or non-finite depths.
pub fn validate_depth(depth_m: f64) -> Result<f64> {
    if depth_m.is_finite() && depth_m >= 0.0 {
        Ok(depth_m)
    } else {
        Err(DecoError::InvalidDepth(depth_m))
    }
}

/// Rejects negative or non-finite durations, in whatever unit the caller uses.
pub fn validate_duration(value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(DecoError::InvalidDuration(value))
    }
}

/// A duration in minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Minutes(pub f64);

/// A duration in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seconds(pub f64);

impl Minutes {
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(0.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn to_seconds(self) -> Seconds {
        Seconds(self.0 * SECONDS_PER_MINUTE)
    }
}

impl Seconds {
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(0.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn to_minutes(self) -> Minutes {
        Minutes(self.0 / SECONDS_PER_MINUTE)
    }

    /// Converts a chrono duration, keeping sub-second precision.
    pub fn from_duration(duration: chrono::Duration) -> Self {
        match duration.num_microseconds() {
            Some(micros) => Self(micros as f64 / 1_000_000.0),
            None => Self(duration.num_milliseconds() as f64 / 1_000.0),
        }
    }
}

impl From<Seconds> for Minutes {
    fn from(value: Seconds) -> Self {
        value.to_minutes()
    }
}

impl From<Minutes> for Seconds {
    fn from(value: Minutes) -> Self {
        value.to_seconds()
    }
}

impl Add for Minutes {
    type Output = Minutes;

    fn add(self, rhs: Minutes) -> Minutes {
        Minutes(self.0 + rhs.0)
    }
}

impl Sub for Minutes {
    type Output = Minutes;

    fn sub(self, rhs: Minutes) -> Minutes {
        Minutes(self.0 - rhs.0)
    }
}

impl Add for Seconds {
    type Output = Seconds;

    fn add(self, rhs: Seconds) -> Seconds {
        Seconds(self.0 + rhs.0)
    }
}

impl AddAssign for Seconds {
    fn add_assign(&mut self, rhs: Seconds) {
        self.0 += rhs.0;
    }
}

impl Sub for Seconds {
    type Output = Seconds;

    fn sub(self, rhs: Seconds) -> Seconds {
        Seconds(self.0 - rhs.0)
    }
}
