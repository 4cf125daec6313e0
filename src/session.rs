//! One dive's state: depth, gas, tissue tracker and log.
//!
//! Every method that moves time forward takes the caller's `now`, so a
//! session is deterministic under test.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::config::{DecoModelKind, DecoSettings};
use crate::deco::gas::GasMix;
use crate::deco::history::{self, history_fingerprint, CurrentConditions, DiveSegment};
use crate::deco::models::DiveReport;
use crate::deco::ndl::{snapshot_ndl, solve, NdlResult, NdlSmoother};
use crate::deco::oxygen::{partial_pressure_o2, OxygenRisk};
use crate::deco::padi;
use crate::deco::rgbm::{self, SURFACE_FACTOR};
use crate::deco::stops;
use crate::deco::tissue::SharedTissueTracker;
use crate::units::{ambient_pressure, round_to, Minutes, Seconds};

/// Depth change per descend/ascend action (m).
pub const DEPTH_STEP_M: u32 = 10;
/// Deepest reachable depth (m).
pub const MAX_DEPTH_M: u32 = 350;

#[derive(Debug)]
pub struct DiveSession {
    settings: DecoSettings,
    gas: GasMix,
    tracker: SharedTissueTracker,
    smoother: NdlSmoother,
    depth_m: u32,
    time_at_depth: Seconds,
    /// Time accumulated at each visited depth, restored on return
    depth_times: BTreeMap<u32, Seconds>,
    rgbm_factor: f64,
    started_at: DateTime<Utc>,
    last_tick: DateTime<Utc>,
    log: Vec<DiveSegment>,
}

impl DiveSession {
    pub fn new(settings: DecoSettings, now: DateTime<Utc>) -> Self {
        let tracker = SharedTissueTracker::new(settings.compartments.table());
        let smoother = NdlSmoother::new(settings.ndl_smoothing_alpha);
        let mut session = Self {
            settings,
            gas: GasMix::air(),
            tracker,
            smoother,
            depth_m: 0,
            time_at_depth: Seconds::zero(),
            depth_times: BTreeMap::new(),
            rgbm_factor: SURFACE_FACTOR,
            started_at: now,
            last_tick: now,
            log: Vec::new(),
        };
        session.start_tracker_clock(now);
        session
    }

    /// Back to the surface with desaturated tissues and an empty log.
    /// Settings and gas mix are kept.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.tracker.reset();
        self.start_tracker_clock(now);
        self.smoother.reset();
        self.depth_m = 0;
        self.time_at_depth = Seconds::zero();
        self.depth_times.clear();
        self.rgbm_factor = SURFACE_FACTOR;
        self.started_at = now;
        self.last_tick = now;
        self.log.clear();
        tracing::info!("dive session reset");
    }

    // A fresh tracker's first advance_to only records the time.
    fn start_tracker_clock(&self, now: DateTime<Utc>) {
        self.tracker
            .advance_to(now, ambient_pressure(0.0), self.gas.inert_gas_fraction());
    }

    /// Accounts for the time since the last tick at the current depth.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if now <= self.last_tick {
            return;
        }
        let elapsed = Seconds::from_duration(now - self.last_tick);
        self.last_tick = now;

        let depth = self.depth();
        if self.depth_m == 0 {
            self.time_at_depth = Seconds::zero();
            self.rgbm_factor = SURFACE_FACTOR;
        } else {
            self.time_at_depth += elapsed;
            self.depth_times.insert(self.depth_m, self.time_at_depth);
            self.rgbm_factor = rgbm::factor(depth, self.time_at_depth, &self.gas);
        }

        let result = self.tracker.advance_and_solve(
            now,
            ambient_pressure(depth),
            self.gas.inert_gas_fraction(),
        );
        let sample = self.rgbm_adjusted(result.ndl);
        self.smoother.update(sample);
    }

    /// Moves 10 m deeper unless already at the limit. Returns the new depth.
    pub fn descend(&mut self, now: DateTime<Utc>) -> f64 {
        self.tick(now);
        if self.depth_m >= MAX_DEPTH_M {
            tracing::warn!(depth_m = self.depth_m, "maximum depth reached");
            return self.depth();
        }
        self.move_to(self.depth_m + DEPTH_STEP_M, now);
        self.depth()
    }

    /// Moves 10 m shallower unless already at the surface. Returns the new depth.
    pub fn ascend(&mut self, now: DateTime<Utc>) -> f64 {
        self.tick(now);
        if self.depth_m == 0 {
            return self.depth();
        }
        self.move_to(self.depth_m - DEPTH_STEP_M, now);
        self.depth()
    }

    fn move_to(&mut self, depth_m: u32, now: DateTime<Utc>) {
        // Departure entry closes the time spent at the old depth.
        if self.depth_m > 0 {
            self.record_segment(now);
        }

        self.depth_m = depth_m;
        let depth = self.depth();
        if depth_m == 0 {
            self.time_at_depth = Seconds::zero();
            self.rgbm_factor = SURFACE_FACTOR;
        } else {
            self.time_at_depth = self.depth_times.get(&depth_m).copied().unwrap_or_default();
            self.rgbm_factor = rgbm::factor(depth, self.time_at_depth, &self.gas);
        }

        self.record_segment(now);
        tracing::info!(depth_m = depth, time_at_depth_s = self.time_at_depth.value(), "depth changed");
    }

    /// Appends the current depth and time at depth to the log.
    fn record_segment(&mut self, now: DateTime<Utc>) {
        let depth = self.depth();
        let ndl = self.rgbm_adjusted(self.tissue_limit().ndl);
        self.log.push(DiveSegment {
            pressure: Some(round_to(ambient_pressure(depth), 2)),
            oxygen_toxicity: Some(round_to(partial_pressure_o2(&self.gas, depth), 2)),
            ndl: Some(round_to(ndl.value(), 2)),
            rgbm_factor: Some(self.rgbm_factor),
            total_time: Some(Seconds::from_duration(now - self.started_at)),
            timestamp: Some(now.naive_utc()),
            ..DiveSegment::new(depth, self.time_at_depth)
        });
    }

    /// NDL from the tracked tensions, or the PADI table when enabled.
    fn tissue_limit(&self) -> NdlResult {
        let depth = self.depth();
        if self.settings.use_padi_ndl {
            let ndl = padi::lookup(depth, self.time_at_depth.to_minutes());
            return NdlResult {
                ndl,
                limiting_compartment: None,
                decompression_required: ndl.value() < 0.0,
            };
        }
        solve(
            self.settings.compartments.table(),
            &self.tracker.snapshot(),
            ambient_pressure(depth),
        )
    }

    fn rgbm_adjusted(&self, ndl: Minutes) -> Minutes {
        if self.settings.use_rgbm_for_ndl {
            rgbm::adjust_ndl(ndl, self.rgbm_factor)
        } else {
            ndl
        }
    }

    /// Switches breathing gas. Time up to `now` is charged to the old mix.
    pub fn set_gas_mix(&mut self, gas: GasMix, now: DateTime<Utc>) {
        self.tick(now);
        tracing::info!(from = %self.gas.label(), to = %gas.label(), "gas switch");
        self.gas = gas;
        if self.depth_m > 0 {
            self.rgbm_factor = rgbm::factor(self.depth(), self.time_at_depth, &self.gas);
        }
    }

    pub fn set_use_rgbm_for_ndl(&mut self, enabled: bool) {
        tracing::info!(enabled, "RGBM NDL adjustment toggled");
        self.settings.use_rgbm_for_ndl = enabled;
    }

    pub fn set_use_padi_ndl(&mut self, enabled: bool) {
        tracing::info!(enabled, "PADI NDL toggled");
        self.settings.use_padi_ndl = enabled;
    }

    pub fn set_deco_model(&mut self, model: DecoModelKind) {
        tracing::info!(%model, "deco model selected");
        self.settings.deco_model = model;
    }

    /// Ticks to `now`, logs the current segment and reads out the full state.
    pub fn report(&mut self, now: DateTime<Utc>) -> DiveReport {
        self.tick(now);
        self.record_segment(now);

        let depth = self.depth();
        let compartments = self.settings.compartments.table();
        let ppo2 = partial_pressure_o2(&self.gas, depth);

        let limit = self.tissue_limit();
        let ndl = self.rgbm_adjusted(limit.ndl);
        let snapshot = snapshot_ndl(compartments, depth, self.time_at_depth.to_minutes(), &self.gas);

        let current = CurrentConditions {
            depth_m: depth,
            time_at_depth: self.time_at_depth,
            rgbm_factor: self.rgbm_factor,
        };
        let accumulated = history::accumulate(compartments, &self.log, &self.gas, current, &self.settings);

        let decompression_required = ndl.value() < 0.0;
        if decompression_required {
            tracing::warn!(depth_m = depth, ndl_min = ndl.value(), "decompression required");
        }

        DiveReport {
            depth_m: depth,
            pressure_ata: round_to(ambient_pressure(depth), 2),
            oxygen_toxicity: round_to(ppo2, 2),
            oxygen_risk: OxygenRisk::classify(ppo2),
            gas: self.gas,
            gas_label: self.gas.label(),
            ndl: round_to(ndl.value(), 2),
            limiting_compartment: limit.limiting_compartment,
            snapshot_ndl: round_to(self.rgbm_adjusted(snapshot.ndl).value(), 2),
            tissue_ndl: round_to(self.smoother.value().value(), 2),
            accumulated_ndl: round_to(accumulated.value(), 2),
            decompression_required,
            stops: stops::plan(ndl, depth),
            rgbm_factor: self.rgbm_factor,
            time_at_depth_minutes: round_to(self.time_at_depth.to_minutes().value(), 2),
            time_elapsed_minutes: round_to(
                Seconds::from_duration(self.last_tick - self.started_at).to_minutes().value(),
                2,
            ),
            deco_model: self.settings.deco_model,
            compartments: self.settings.compartments,
            use_rgbm_for_ndl: self.settings.use_rgbm_for_ndl,
            use_padi_ndl: self.settings.use_padi_ndl,
            history_hash: history_fingerprint(&self.log),
        }
    }

    pub fn depth(&self) -> f64 {
        f64::from(self.depth_m)
    }

    pub fn time_at_depth(&self) -> Seconds {
        self.time_at_depth
    }

    pub fn gas(&self) -> &GasMix {
        &self.gas
    }

    pub fn settings(&self) -> &DecoSettings {
        &self.settings
    }

    pub fn log(&self) -> &[DiveSegment] {
        &self.log
    }

    /// Handle for a timer thread advancing the same tissues.
    pub fn tracker(&self) -> &SharedTissueTracker {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        t0() + Duration::minutes(minutes)
    }

    #[test]
    fn test_new_session_at_surface() {
        let mut session = DiveSession::new(DecoSettings::default(), t0());
        let report = session.report(t0());

        assert_eq!(report.depth_m, 0.0);
        assert_eq!(report.pressure_ata, 1.0);
        assert_eq!(report.ndl, 999.0);
        assert_eq!(report.snapshot_ndl, 999.0);
        assert_eq!(report.accumulated_ndl, 999.0);
        assert_eq!(session.log().len(), 1);
        assert_eq!(report.rgbm_factor, 1.0);
        assert!(!report.decompression_required);
        assert!(report.stops.is_empty());
    }

    #[test]
    fn test_descend_and_ascend_steps() {
        let mut session = DiveSession::new(DecoSettings::default(), t0());

        assert_eq!(session.descend(at(0)), 10.0);
        assert_eq!(session.descend(at(1)), 20.0);
        assert_eq!(session.ascend(at(2)), 10.0);
        assert_eq!(session.ascend(at(3)), 0.0);
        assert_eq!(session.ascend(at(4)), 0.0);

        // Arrival entries plus a departure entry for every depth left below the surface.
        let depths: Vec<f64> = session.log().iter().map(|s| s.depth).collect();
        assert_eq!(depths, vec![10.0, 10.0, 20.0, 20.0, 10.0, 10.0, 0.0]);
        let departures: Vec<Seconds> = [1, 3, 5].iter().map(|&i| session.log()[i].time_at_depth).collect();
        assert_eq!(departures, vec![Seconds(60.0), Seconds(60.0), Seconds(120.0)]);
    }

    #[test]
    fn test_descend_stops_at_max_depth() {
        let mut session = DiveSession::new(DecoSettings::default(), t0());
        for i in 0..40 {
            session.descend(at(i));
        }
        assert_eq!(session.depth(), 350.0);
    }

    #[test]
    fn test_time_at_depth_restored_on_return() {
        let mut session = DiveSession::new(DecoSettings::default(), t0());
        session.descend(at(0));
        session.tick(at(5));
        assert_eq!(session.time_at_depth(), Seconds(300.0));

        session.descend(at(5));
        assert_eq!(session.time_at_depth(), Seconds(0.0));
        session.ascend(at(7));
        assert_eq!(session.time_at_depth(), Seconds(300.0));

        session.ascend(at(8));
        let surface = session.log().last().unwrap();
        assert_eq!(surface.time_at_depth, Seconds(0.0));
        assert_eq!(surface.rgbm_factor, Some(1.0));
    }

    #[test]
    fn test_long_deep_dive_requires_stops() {
        let mut session = DiveSession::new(DecoSettings::default(), t0());
        session.descend(at(0));
        session.descend(at(0));
        session.descend(at(0));
        let report = session.report(at(20));

        assert_eq!(report.depth_m, 30.0);
        assert_eq!(report.time_at_depth_minutes, 20.0);
        assert!(report.decompression_required);
        assert!(report.ndl < 0.0);
        assert_eq!(report.stops.first().map(|s| s.depth_m), Some(20.0));
    }

    #[test]
    fn test_accumulated_ndl_tracks_bottom_time() {
        let mut session = DiveSession::new(DecoSettings::default(), t0());
        for _ in 0..3 {
            session.descend(at(0));
        }
        let early = session.report(at(5));
        let late = session.report(at(60));

        assert!(late.accumulated_ndl < early.accumulated_ndl);
        assert!(late.accumulated_ndl < 0.0);
        assert!(session.log().iter().any(|s| s.time_at_depth == Seconds(3600.0)));
    }

    #[test]
    fn test_ascent_keeps_tracked_loading() {
        let mut session = DiveSession::new(DecoSettings::default(), t0());
        for _ in 0..3 {
            session.descend(at(0));
        }
        session.ascend(at(60));
        let report = session.report(at(60));

        let solved = solve(
            session.settings().compartments.table(),
            &session.tracker().snapshot(),
            ambient_pressure(20.0),
        );
        assert!(solved.ndl.value() < 0.0);
        assert_eq!(report.ndl, round_to(solved.ndl.value(), 2));
        assert_eq!(report.limiting_compartment, solved.limiting_compartment);
        assert!(report.decompression_required);
        assert_eq!(report.stops.first().map(|s| s.depth_m), Some(10.0));
        // Fresh-tissue estimate at 20 m knows nothing about the 30 m leg.
        assert!(report.snapshot_ndl > 0.0);
    }

    #[test]
    fn test_padi_drives_reported_ndl() {
        let mut session = DiveSession::new(DecoSettings::default(), t0());
        session.set_use_padi_ndl(true);
        for _ in 0..3 {
            session.descend(at(0));
        }
        let report = session.report(at(30));

        // 30 m sits between the 27.4 m and 30.5 m rows.
        let expected = padi::lookup(30.0, Minutes(30.0)).value();
        assert_eq!(report.ndl, round_to(expected, 2));
        assert_eq!(report.limiting_compartment, None);
        assert!(report.decompression_required);
    }

    #[test]
    fn test_rgbm_divides_tissue_ndl_before_smoothing() {
        let run = |use_rgbm: bool| {
            let settings = DecoSettings {
                use_rgbm_for_ndl: use_rgbm,
                ..DecoSettings::default()
            };
            let mut session = DiveSession::new(settings, t0());
            session.descend(at(0));
            session.descend(at(0));
            let report = session.report(at(30));
            let sample = solve(
                session.settings().compartments.table(),
                &session.tracker().snapshot(),
                ambient_pressure(20.0),
            )
            .ndl
            .value();
            (report, sample)
        };

        let (plain, sample) = run(false);
        assert_relative_eq!(plain.tissue_ndl, 200.0 + 0.1 * (sample - 200.0), epsilon = 0.01);

        let (adjusted, sample) = run(true);
        let divided = sample / adjusted.rgbm_factor;
        assert_relative_eq!(adjusted.tissue_ndl, 200.0 + 0.1 * (divided - 200.0), epsilon = 0.01);
        assert_ne!(adjusted.tissue_ndl, plain.tissue_ndl);
    }

    #[test]
    fn test_rgbm_setting_is_echoed() {
        let mut session = DiveSession::new(DecoSettings::default(), t0());
        session.set_use_rgbm_for_ndl(true);
        session.set_use_padi_ndl(true);
        session.set_deco_model(DecoModelKind::Vpm);
        let report = session.report(at(1));

        assert!(report.use_rgbm_for_ndl);
        assert!(report.use_padi_ndl);
        assert_eq!(report.deco_model, DecoModelKind::Vpm);
    }

    #[test]
    fn test_gas_switch_updates_oxygen() {
        let mut session = DiveSession::new(DecoSettings::default(), t0());
        session.descend(at(0));
        session.descend(at(0));
        session.descend(at(0));
        session.set_gas_mix(GasMix::new(0.32, 0.68, 0.0).unwrap(), at(1));
        let report = session.report(at(1));

        assert_eq!(report.oxygen_toxicity, 1.28);
        assert_eq!(report.oxygen_risk, OxygenRisk::Safe);
        assert_eq!(report.gas_label, "32% O₂, 68% N₂, 0% He");
    }

    #[test]
    fn test_reset_clears_dive() {
        let mut session = DiveSession::new(DecoSettings::default(), t0());
        session.descend(at(0));
        session.tick(at(10));
        session.reset(at(11));

        assert_eq!(session.depth(), 0.0);
        assert!(session.log().is_empty());
        assert!(session.tracker().snapshot().values().iter().all(|&p| p == 0.0));
        let report = session.report(at(11));
        assert_eq!(report.time_elapsed_minutes, 0.0);
        assert_eq!(report.tissue_ndl, 200.0);
    }

    #[test]
    fn test_clock_going_backwards_is_ignored() {
        let mut session = DiveSession::new(DecoSettings::default(), t0());
        session.descend(at(0));
        session.tick(at(5));
        session.tick(at(3));
        assert_eq!(session.time_at_depth(), Seconds(300.0));
    }
}
