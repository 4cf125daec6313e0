//! Tissue inert-gas tension tracking.
//!
//! Each compartment approaches the inspired inert-gas pressure exponentially:
//!
//! ```text
//! P_new = P_inert + (P_old - P_inert) * exp(-k * dt)
//! ```
//!
//! The closed form is exact only while ambient pressure is constant, so
//! callers advance once per pressure-homogeneous interval.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::compartment::Compartment;
use super::ndl::{solve, NdlResult};
use crate::units::{Minutes, Seconds};

/// Dissolved inert-gas pressure (ATA), one value per compartment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TissueTensions(Vec<f64>);

impl TissueTensions {
    /// Fully desaturated baseline.
    pub fn zeroed(compartments: usize) -> Self {
        Self(vec![0.0; compartments])
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies one exponential gas-exchange step to every compartment.
    pub(crate) fn load(
        &mut self,
        compartments: &[Compartment],
        elapsed: Minutes,
        ambient_pressure: f64,
        inert_gas_fraction: f64,
    ) {
        let dt = elapsed.value();
        if dt <= 0.0 {
            return;
        }

        let inert_pressure = ambient_pressure * inert_gas_fraction;
        for (tension, compartment) in self.0.iter_mut().zip(compartments) {
            let k = compartment.rate_constant();
            *tension = inert_pressure + (*tension - inert_pressure) * (-k * dt).exp();
        }
    }
}

/// Owns one dive's tension vector and the clock of its last advance.
///
/// A tracker belongs to a single dive session; share it across threads only
/// through [`SharedTissueTracker`].
#[derive(Debug, Clone)]
pub struct TissueTracker<'a> {
    compartments: &'a [Compartment],
    tensions: TissueTensions,
    last_update: Option<DateTime<Utc>>,
}

impl<'a> TissueTracker<'a> {
    pub fn new(compartments: &'a [Compartment]) -> Self {
        Self {
            compartments,
            tensions: TissueTensions::zeroed(compartments.len()),
            last_update: None,
        }
    }

    pub fn compartments(&self) -> &'a [Compartment] {
        self.compartments
    }

    pub fn tensions(&self) -> &TissueTensions {
        &self.tensions
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Advances every compartment by `elapsed` at constant ambient pressure.
    ///
    /// Non-positive `elapsed` is a no-op.
    pub fn advance(&mut self, elapsed: Minutes, ambient_pressure: f64, inert_gas_fraction: f64) {
        if elapsed.value() <= 0.0 {
            return;
        }
        tracing::trace!(
            elapsed_min = elapsed.value(),
            ambient_pressure,
            inert_gas_fraction,
            "advancing tissue tensions"
        );
        self.tensions
            .load(self.compartments, elapsed, ambient_pressure, inert_gas_fraction);
    }

    /// Advances by the wall-clock time since the previous call.
    ///
    /// The first call only starts the clock. A `now` earlier than the last
    /// update is ignored and never rewinds the clock.
    pub fn advance_to(&mut self, now: DateTime<Utc>, ambient_pressure: f64, inert_gas_fraction: f64) {
        let Some(last) = self.last_update else {
            self.last_update = Some(now);
            return;
        };
        if now <= last {
            return;
        }

        let elapsed = Seconds::from_duration(now - last).to_minutes();
        self.advance(elapsed, ambient_pressure, inert_gas_fraction);
        self.last_update = Some(now);
    }

    /// Starts the clock at `now` without loading any gas.
    pub fn start_clock(&mut self, now: DateTime<Utc>) {
        self.last_update = Some(now);
    }

    /// NDL for the current tensions at `ambient_pressure`.
    pub fn ndl(&self, ambient_pressure: f64) -> NdlResult {
        solve(self.compartments, &self.tensions, ambient_pressure)
    }

    /// Back to a desaturated state with a stopped clock.
    pub fn reset(&mut self) {
        self.tensions = TissueTensions::zeroed(self.compartments.len());
        self.last_update = None;
    }
}

/// A tracker shared between a periodic timer and user actions.
///
/// Every advance and every read goes through the same lock, so elapsed time
/// is never counted twice and reads always see the latest advance.
#[derive(Debug, Clone)]
pub struct SharedTissueTracker {
    inner: Arc<Mutex<TissueTracker<'static>>>,
}

impl SharedTissueTracker {
    pub fn new(compartments: &'static [Compartment]) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TissueTracker::new(compartments))),
        }
    }

    pub fn advance(&self, elapsed: Minutes, ambient_pressure: f64, inert_gas_fraction: f64) {
        self.inner
            .lock()
            .advance(elapsed, ambient_pressure, inert_gas_fraction);
    }

    pub fn advance_to(&self, now: DateTime<Utc>, ambient_pressure: f64, inert_gas_fraction: f64) {
        self.inner
            .lock()
            .advance_to(now, ambient_pressure, inert_gas_fraction);
    }

    pub fn snapshot(&self) -> TissueTensions {
        self.inner.lock().tensions().clone()
    }

    /// Advances to `now` and solves under one lock acquisition.
    pub fn advance_and_solve(
        &self,
        now: DateTime<Utc>,
        ambient_pressure: f64,
        inert_gas_fraction: f64,
    ) -> NdlResult {
        let mut tracker = self.inner.lock();
        tracker.advance_to(now, ambient_pressure, inert_gas_fraction);
        tracker.ndl(ambient_pressure)
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }
}
