//! Accumulated NDL from a logged dive history.
//!
//! Instead of trusting a long-lived in-memory tracker, the whole log is
//! replayed through a fresh [`TissueTracker`]. The same log always yields the
//! same NDL, so the value survives restarts.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::compartment::Compartment;
use super::gas::GasMix;
use super::padi;
use super::rgbm;
use super::tissue::TissueTracker;
use crate::config::DecoSettings;
use crate::error::Result;
use crate::units::{ambient_pressure, Minutes, Seconds};

/// One logged sample of a dive.
///
/// Only `depth` and `time_at_depth` feed the replay. Both the snake_case keys
/// and the display spellings used by older logs are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiveSegment {
    /// Depth in meters
    #[serde(default, alias = "Depth")]
    pub depth: f64,
    /// Cumulative time spent at this depth
    #[serde(default, alias = "Time at Depth")]
    pub time_at_depth: Seconds,
    #[serde(default, alias = "Pressure", skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(default, alias = "Oxygen Toxicity", skip_serializing_if = "Option::is_none")]
    pub oxygen_toxicity: Option<f64>,
    #[serde(default, alias = "NDL", skip_serializing_if = "Option::is_none")]
    pub ndl: Option<f64>,
    #[serde(default, alias = "RGBM Factor", skip_serializing_if = "Option::is_none")]
    pub rgbm_factor: Option<f64>,
    #[serde(
        default,
        alias = "Time Elapsed",
        alias = "time_elapsed",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_time: Option<Seconds>,
    #[serde(default, with = "log_timestamp", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
}

impl DiveSegment {
    pub fn new(depth: f64, time_at_depth: Seconds) -> Self {
        Self {
            depth,
            time_at_depth,
            pressure: None,
            oxygen_toxicity: None,
            ndl: None,
            rgbm_factor: None,
            total_time: None,
            timestamp: None,
        }
    }

    /// Parses a JSON array of log entries.
    pub fn parse_log(json: &str) -> Result<Vec<DiveSegment>> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A stretch of constant ambient pressure recovered from the log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub depth_m: f64,
    pub duration: Minutes,
}

/// Replayable intervals plus the number of entries that added no time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Intervals {
    pub intervals: Vec<Interval>,
    pub skipped: usize,
}

/// Orders the log by cumulative time at depth and turns consecutive entries
/// into intervals. Entries adding no time are skipped.
pub fn intervals(history: &[DiveSegment]) -> Intervals {
    let mut ordered: Vec<&DiveSegment> = history.iter().collect();
    ordered.sort_by(|a, b| a.time_at_depth.value().total_cmp(&b.time_at_depth.value()));

    let mut result = Intervals::default();
    let mut previous = Seconds::zero();
    for segment in ordered {
        let elapsed = segment.time_at_depth - previous;
        previous = segment.time_at_depth;
        if elapsed.value() <= 0.0 {
            result.skipped += 1;
            continue;
        }
        result.intervals.push(Interval {
            depth_m: segment.depth,
            duration: elapsed.to_minutes(),
        });
    }
    result
}

/// Loads a fresh tracker with every interval of `history`.
pub fn replay<'a>(compartments: &'a [Compartment], history: &[DiveSegment], gas: &GasMix) -> TissueTracker<'a> {
    let mut tracker = TissueTracker::new(compartments);
    let Intervals { intervals, skipped } = intervals(history);
    for interval in &intervals {
        tracker.advance(
            interval.duration,
            ambient_pressure(interval.depth_m),
            gas.inert_gas_fraction(),
        );
    }
    tracing::debug!(
        entries = history.len(),
        intervals = intervals.len(),
        skipped,
        "replayed dive history"
    );
    tracker
}

/// Where the diver is now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentConditions {
    pub depth_m: f64,
    pub time_at_depth: Seconds,
    /// Divisor applied when RGBM adjustment is enabled
    pub rgbm_factor: f64,
}

impl CurrentConditions {
    /// Conditions with the RGBM factor computed for `gas`.
    pub fn new(depth_m: f64, time_at_depth: Seconds, gas: &GasMix) -> Self {
        Self {
            depth_m,
            time_at_depth,
            rgbm_factor: rgbm::factor(depth_m, time_at_depth, gas),
        }
    }
}

/// NDL at the current depth after replaying `history`.
///
/// With `use_padi_ndl` the table lookup replaces the replay. An empty history
/// yields zero. The RGBM division, when enabled, comes last.
pub fn accumulate(
    compartments: &[Compartment],
    history: &[DiveSegment],
    gas: &GasMix,
    current: CurrentConditions,
    settings: &DecoSettings,
) -> Minutes {
    let ndl = if settings.use_padi_ndl {
        padi::lookup(current.depth_m, current.time_at_depth.to_minutes())
    } else if history.is_empty() {
        Minutes::zero()
    } else {
        replay(compartments, history, gas)
            .ndl(ambient_pressure(current.depth_m))
            .ndl
    };

    if settings.use_rgbm_for_ndl {
        rgbm::adjust_ndl(ndl, current.rgbm_factor)
    } else {
        ndl
    }
}

/// `sha256:<hex>` of the log's canonical JSON.
pub fn history_fingerprint(history: &[DiveSegment]) -> String {
    let json = serde_json::to_string(history).unwrap_or_default();
    sha256_hex(&json)
}

pub(crate) fn sha256_hex(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let digest = hasher.finalize();
    format!("sha256:{}", hex::encode(digest))
}

/// `%Y-%m-%d %H:%M:%S` timestamps, with ISO 8601 accepted on input.
mod log_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .map(Some)
            .map_err(|_| {
                serde::de::Error::custom(crate::error::DecoError::InvalidTimestamp(raw.clone()))
            })
    }
}
