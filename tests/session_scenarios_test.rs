//! End-to-end session scenarios against the synthetic backends


use parallax_head_tracking::calibration::Viewport;
use parallax_head_tracking::config::Config;
use parallax_head_tracking::perspective::DisplayOrigin;
use parallax_head_tracking::presentation::{status_text, RecordingSink, StartControl, TrackingStatus};
use parallax_head_tracking::session::ParallaxSession;
use parallax_head_tracking::simulation::{FacePlacement, ScriptedDetector, SimClock, SyntheticCamera, SyntheticLoader};
use parallax_head_tracking::Error;
use test_helpers::{assert_close, Harness};

#[test]
fn test_first_detection_sets_baseline() {
    let mut h = Harness::new(Config::default());
    h.face.move_to(10.0, 5.0);
    h.session.start().unwrap();
    assert!(!h.session.baseline().is_set);

    h.detection_tick();

    let baseline = h.session.baseline();
    assert!(baseline.is_set);
    assert_close(baseline.x, 10.0, 1e-9);
    assert_close(baseline.y, 5.0, 1e-9);
    let target = h.session.target().offset;
    assert_eq!(target.target_x, 0.0);
    assert_eq!(target.target_y, 0.0);
    assert_eq!(h.session.status(), TrackingStatus::Tracking);
}

#[test]
fn test_calibration_is_idempotent() {
    let mut h = Harness::new(Config::default());
    h.face.move_to(0.0, 0.0);
    h.session.start().unwrap();
    h.detection_tick();
    h.face.move_to(30.0, -10.0);
    for _ in 0..5 {
        h.detection_tick();
    }
    assert!(h.session.target().offset.target_x < 0.0);

    h.session.calibrate();
    let first = h.session.baseline();
    h.session.calibrate();
    let second = h.session.baseline();

    assert_eq!(first, second);
    assert_close(first.x, h.session.head_state().smooth_x, 1e-12);
    assert_eq!(h.session.target().offset.target_x, 0.0);
    assert_eq!(h.session.head_state().velocity_x, 0.0);
    let render = h.session.render_state();
    assert_eq!((render.display_x, render.smooth_x, render.velocity_x), (0.0, 0.0, 0.0));
}

#[test]
fn test_calibrate_ignored_when_idle() {
    let mut h = Harness::new(Config::default());
    h.session.calibrate();
    assert!(!h.session.baseline().is_set);
}

#[test]
fn test_stop_resets_and_restart_is_centered() {
    let mut h = Harness::new(Config::default());
    h.face.move_to(0.0, 0.0);
    h.session.start().unwrap();
    h.detection_tick();
    h.face.move_to(60.0, 20.0);
    h.run_for(800.0, 16.0);
    assert!(h.session.render_state().display_x < -10.0);

    h.session.stop();
    assert!(!h.session.is_tracking());
    assert!(!h.session.baseline().is_set);
    assert_eq!(h.session.camera().live_streams(), 0);
    assert_eq!(h.session.sink().readouts().last().map(String::as_str), Some(""));
    assert_eq!(h.session.sink().statuses().last().unwrap().1, status_text::IDLE);
    let center = DisplayOrigin { origin_x: 640.0, origin_y: 400.0 };
    assert_eq!(h.session.last_origin(), Some(center));

    h.face.set(None);
    h.session.sink_mut().clear();
    h.session.start().unwrap();
    h.run_for(16.0, 16.0);

    assert_eq!(h.session.sink().origins(), vec![center]);
    assert_eq!(h.session.target().offset.target_x, 0.0);
    assert_eq!(h.session.head_state().smooth_x, 0.0);
}

#[test]
fn test_lateral_movement_moves_target_left() {
    // 60 fps video so 33 ms ticks never land on a repeated frame
    let mut h = Harness::with_camera(Config::default(), |clock| {
        SyntheticCamera::new(clock).with_format(320, 240, 60.0)
    });
    let tick = |h: &mut Harness| {
        h.clock.advance(33.0);
        let report = h.session.frame(h.clock.now());
        assert!(report.detection.is_some());
    };
    h.face.move_to(10.0, 0.0);
    h.session.start().unwrap();
    tick(&mut h);
    assert!(h.session.baseline().is_set);

    let mut targets = Vec::new();
    for i in 1..=10 {
        h.face.move_to(10.0 + 5.0 * f64::from(i), 0.0);
        tick(&mut h);
        targets.push(h.session.target().offset.target_x);
    }
    assert_eq!(h.session.target().sequence, 12);
    assert!(targets.windows(2).all(|w| w[1] <= w[0]), "{targets:?}");
    assert!(*targets.last().unwrap() < 0.0);

    let mut velocities = vec![h.session.head_state().velocity_x];
    for _ in 0..5 {
        tick(&mut h);
        velocities.push(h.session.head_state().velocity_x);
    }
    assert!(velocities.iter().all(|v| *v > 0.0));
    assert!(velocities.windows(2).all(|w| w[1] < w[0]), "{velocities:?}");
}

#[test]
fn test_face_lost_transitions_once_and_freezes_target() {
    let mut h = Harness::new(Config::default());
    h.face.move_to(0.0, 0.0);
    h.session.start().unwrap();
    h.detection_tick();
    h.face.move_to(25.0, 0.0);
    for _ in 0..4 {
        h.detection_tick();
    }
    let frozen = h.session.target();
    h.session.sink_mut().clear();

    h.face.set(None);
    for _ in 0..5 {
        h.detection_tick();
    }

    let statuses = h.session.sink().statuses();
    assert_eq!(statuses, vec![(TrackingStatus::Searching, status_text::SEARCHING.to_string())]);
    assert_eq!(h.session.target(), frozen);
    assert!(h.session.is_tracking());

    h.face.move_to(25.0, 0.0);
    h.detection_tick();
    assert_eq!(h.session.status(), TrackingStatus::Tracking);
}

#[test]
fn test_readout_reports_target_and_depth() {
    let mut h = Harness::new(Config::default());
    h.face.set(Some(FacePlacement::new(0.0, 0.0, 640.0)));
    h.session.start().unwrap();
    h.detection_tick();

    assert_eq!(h.session.sink().readouts(), vec!["X:0 Y:0 Z≈640".to_string()]);
}

#[test]
fn test_unsupported_camera_reports_terminal_status() {
    let mut h = Harness::with_camera(Config::default(), |clock| SyntheticCamera::new(clock).unsupported());
    let err = h.session.start().unwrap_err();
    assert!(err.is_setup_failure());
    assert_eq!(
        h.session.sink().statuses().last().cloned(),
        Some((TrackingStatus::Off, status_text::CAMERA_UNSUPPORTED.to_string()))
    );
    assert_eq!(h.session.sink().last_control(), Some(StartControl::Retry));
}

#[test]
fn test_camera_denied_after_fallback() {
    let mut h = Harness::with_camera(Config::default(), |clock| SyntheticCamera::new(clock).denying_access());
    assert!(matches!(h.session.start(), Err(Error::CameraAccess(_))));
    assert_eq!(h.session.camera().requests().len(), 2);
    assert!(h.session.camera().requests()[1].is_unconstrained());
    assert_eq!(h.session.camera().live_streams(), 0);
    assert!(!h.session.is_tracking());
    assert_eq!(h.session.sink().statuses().last().unwrap().1, status_text::CAMERA_FAILED);

    // nothing runs after a failed start
    h.run_for(200.0, 16.0);
    assert!(h.session.sink().origins().is_empty());
}

#[test]
fn test_constrained_request_falls_back() {
    let mut h = Harness::with_camera(Config::default(), |clock| SyntheticCamera::new(clock).rejecting_constraints());
    h.face.move_to(0.0, 0.0);
    h.session.start().unwrap();
    h.detection_tick();
    assert!(h.session.baseline().is_set);
    assert_eq!(h.session.camera().live_streams(), 1);
}

#[test]
fn test_model_load_failure() {
    let clock = SimClock::new();
    let mut session = ParallaxSession::new(
        Config::default(),
        SyntheticCamera::new(clock),
        SyntheticLoader::failing(),
        RecordingSink::new(),
        Viewport::default(),
    )
    .unwrap();

    assert!(matches!(session.start(), Err(Error::ModelLoad(_))));
    assert!(session.camera().requests().is_empty());
    let statuses = session.sink().statuses();
    assert_eq!(statuses[0].1, status_text::LOADING_MODEL);
    assert_eq!(statuses.last().unwrap().1, status_text::MODEL_FAILED);
    assert_eq!(session.sink().last_control(), Some(StartControl::Retry));
}

#[test]
fn test_start_twice_keeps_single_stream() {
    let clock = SimClock::new();
    let mut session = ParallaxSession::new(
        Config::default(),
        SyntheticCamera::new(clock),
        SyntheticLoader::new(ScriptedDetector::empty()),
        RecordingSink::new(),
        Viewport::default(),
    )
    .unwrap();

    session.start().unwrap();
    session.start().unwrap();
    assert_eq!(session.camera().live_streams(), 1);
}
