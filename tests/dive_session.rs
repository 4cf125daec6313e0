use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use divalgo::deco::history::{accumulate, CurrentConditions, DiveSegment};
use divalgo::deco::{reference, GasMix, StopReason, TissueTracker, M_VALUE_COMPARTMENTS};
use divalgo::units::{ambient_pressure, round_to, Minutes, Seconds};
use divalgo::{CompartmentSet, DecoSettings, DiveSession};

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn descend_to(session: &mut DiveSession, depth_m: f64, now: DateTime<Utc>) {
    while session.depth() < depth_m {
        session.descend(now);
    }
}

#[test]
fn test_full_dive_profile() {
    divalgo::telemetry::init_tracing();
    let mut session = DiveSession::new(DecoSettings::default(), at(0));

    descend_to(&mut session, 18.0, at(0));
    assert_eq!(session.depth(), 20.0);
    let early = session.report(at(5));
    assert!(!early.decompression_required);
    assert!(early.ndl > 0.0);

    let late = session.report(at(60));
    assert!(late.ndl < early.ndl);
    assert!(late.tissue_ndl < 200.0);

    while session.depth() > 0.0 {
        session.ascend(at(61));
    }
    let surface = session.report(at(62));
    assert_eq!(surface.depth_m, 0.0);
    assert_eq!(surface.time_at_depth_minutes, 0.0);
    assert_eq!(surface.time_elapsed_minutes, 62.0);
    assert!(surface.stops.is_empty());
}

#[test]
fn test_exceeding_ndl_plans_stops() {
    let mut session = DiveSession::new(DecoSettings::default(), at(0));
    descend_to(&mut session, 30.0, at(0));

    let report = session.report(at(25));
    assert!(report.decompression_required);
    assert!(!report.stops.is_empty());
    for stop in &report.stops {
        assert!(stop.depth_m < 30.0);
        assert!(stop.duration_min >= 3);
        assert_eq!(stop.reason, StopReason::NdlExceeded);
    }
}

#[test]
fn test_report_serializes_for_callers() {
    let mut session = DiveSession::new(DecoSettings::default(), at(0));
    session.descend(at(0));
    let json = serde_json::to_value(session.report(at(3))).unwrap();

    assert_eq!(json["depth_m"], 10.0);
    assert_eq!(json["deco_model"], "bühlmann");
    assert_eq!(json["compartments"], "m-value");
    assert_eq!(json["oxygen_risk"], "safe");
    assert!(json["history_hash"].as_str().unwrap().starts_with("sha256:"));
}

#[test]
fn test_replayed_log_survives_a_restart() {
    let mut session = DiveSession::new(DecoSettings::default(), at(0));
    descend_to(&mut session, 30.0, at(0));
    session.report(at(5));
    let before = session.report(at(20));

    let saved = serde_json::to_string(session.log()).unwrap();
    let restored = DiveSegment::parse_log(&saved).unwrap();
    assert_eq!(restored, session.log());

    let current = CurrentConditions {
        depth_m: 30.0,
        time_at_depth: Seconds(1200.0),
        rgbm_factor: before.rgbm_factor,
    };
    let replayed = accumulate(
        &M_VALUE_COMPARTMENTS,
        &restored,
        &GasMix::air(),
        current,
        &DecoSettings::default(),
    );
    assert_eq!(round_to(replayed.value(), 2), before.accumulated_ndl);

    // Twenty logged minutes at 30 m, loaded in one go.
    let mut continuous = TissueTracker::new(&M_VALUE_COMPARTMENTS);
    continuous.advance(Minutes(20.0), ambient_pressure(30.0), GasMix::air().inert_gas_fraction());
    let expected = continuous.ndl(ambient_pressure(30.0)).ndl.value();
    assert_relative_eq!(replayed.value(), expected, epsilon = 1e-9);
    assert!(replayed.value() < 0.0);
}

#[test]
fn test_zhl16c_session_and_reference_check() {
    let settings = DecoSettings {
        compartments: CompartmentSet::Zhl16c,
        ..DecoSettings::default()
    };
    let mut session = DiveSession::new(settings, at(0));
    descend_to(&mut session, 20.0, at(0));
    let report = session.report(at(10));
    assert_eq!(report.compartments, CompartmentSet::Zhl16c);
    assert!(report.ndl > 0.0);

    let history = vec![DiveSegment::new(20.0, Seconds(600.0))];
    let check = reference::validate(&history, &GasMix::air(), 0.40, 0.85).unwrap();
    assert!(!check.deco_required);
    assert_eq!(check.max_depth_m, 20.0);
}
