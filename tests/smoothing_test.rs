//! Smoothing, prediction and clamp properties across the pipeline stages


use parallax_head_tracking::calibration::Viewport;
use parallax_head_tracking::config::{Config, EstimatorConfig, JitterConfig, TuningProfile};
use parallax_head_tracking::filters::create_filter;
use parallax_head_tracking::head_estimator::{HeadEstimator, HeadSample};
use parallax_head_tracking::jitter::JitterFilter;
use parallax_head_tracking::render::{RenderPipelineState, RenderState};
use parallax_head_tracking::simulation::{synthesize_landmarks, FacePlacement};
use parallax_head_tracking::target::{TargetCell, TargetOffset};
use proptest::prelude::*;
use test_helpers::assert_close;

fn render_for(profile: TuningProfile, frame_ms: f64, total_ms: f64) -> RenderState {
    let cell = TargetCell::new();
    let mut render = RenderPipelineState::new(&Config::for_profile(profile));
    render.start(cell.load());
    cell.publish(TargetOffset::new(-80.0, 30.0), (0.0, 0.0));

    let frames = (total_ms / frame_ms).round() as usize;
    for i in 0..=frames {
        render.tick(i as f64 * frame_ms, &cell, Viewport::default());
    }
    render.state()
}

#[test]
fn test_frame_rate_independent_convergence() {
    for profile in [TuningProfile::Predictive, TuningProfile::Simple] {
        let fast = render_for(profile, 1000.0 / 60.0, 500.0);
        let slow = render_for(profile, 1000.0 / 30.0, 500.0);
        assert_close(fast.display_x, slow.display_x, 1e-3);
        assert_close(fast.display_y, slow.display_y, 1e-3);
        assert_close(fast.display_x, -80.0, 1e-3);
    }
}

#[test]
fn test_single_stage_is_step_size_exact() {
    let fast = render_for(TuningProfile::Simple, 1000.0 / 60.0, 100.0);
    let slow = render_for(TuningProfile::Simple, 1000.0 / 30.0, 100.0);
    assert_close(fast.display_x, slow.display_x, 1e-9);
}

#[test]
fn test_prediction_applies_only_to_predictive_profile() {
    for (profile, expect_lead) in [(TuningProfile::Predictive, true), (TuningProfile::Simple, false)] {
        let cell = TargetCell::new();
        let mut render = RenderPipelineState::new(&Config::for_profile(profile));
        render.start(cell.load());
        cell.publish(TargetOffset::default(), (200.0, 0.0));
        for i in 0..5 {
            render.tick(f64::from(i) * 16.0, &cell, Viewport::default());
        }
        let leads = render.state().display_x < 0.0;
        assert_eq!(leads, expect_lead, "{profile}");
    }
}

#[test]
fn test_prediction_fades_without_detections() {
    let cell = TargetCell::new();
    let mut render = RenderPipelineState::new(&Config::default());
    render.start(cell.load());
    cell.publish(TargetOffset::default(), (200.0, 0.0));
    for i in 0..200 {
        render.tick(f64::from(i) * 16.0, &cell, Viewport::default());
    }
    let state = render.state();
    assert!(state.velocity_x < 1e-3);
    assert!(state.display_x.abs() < 0.01);
}

#[test]
fn test_filter_factory_matches_profiles() {
    let mut two_stage = create_filter("two_stage:30:10").unwrap();
    let mut render = RenderPipelineState::new(&Config::for_profile(TuningProfile::Predictive));
    assert_eq!(two_stage.name(), render.filter_name());

    let cell = TargetCell::new();
    render.start(cell.load());
    cell.publish(TargetOffset::new(50.0, 0.0), (0.0, 0.0));
    render.tick(0.0, &cell, Viewport::default());
    render.tick(16.0, &cell, Viewport::default());
    let (x, _) = two_stage.apply(50.0, 0.0, 16.0);
    assert_close(render.state().display_x, x, 1e-12);
}

proptest! {
    #[test]
    fn prop_simple_estimator_bounded(
        x in -2000.0f64..2000.0,
        y in -2000.0f64..2000.0,
        z in 50.0f64..5000.0,
    ) {
        let cfg = EstimatorConfig::for_profile(TuningProfile::Simple);
        let est = HeadEstimator::new(cfg.clone());
        let frame = synthesize_landmarks(FacePlacement::new(x, y, z), 320.0, 240.0, &cfg).unwrap();
        let s = est.estimate(&frame, 320.0, 240.0);
        prop_assert!(s.x_mm.abs() <= 200.0);
        prop_assert!(s.y_mm.abs() <= 150.0);
        prop_assert!((300.0..=1200.0).contains(&s.z_mm));
    }

    #[test]
    fn prop_deadzone_never_leaks_small_motion(
        dx in -1.19f64..1.19,
        dy in -1.19f64..1.19,
    ) {
        let mut filter = JitterFilter::new(JitterConfig::for_profile(TuningProfile::Simple));
        filter.update(HeadSample::new(0.0, 0.0, 550.0), 0.0);
        let d = filter.update(HeadSample::new(dx, dy, 550.0), 33.0);
        prop_assert_eq!(d.x_mm, 0.0);
        prop_assert_eq!(d.y_mm, 0.0);
    }

    #[test]
    fn prop_render_stays_finite(
        tx in -5000.0f64..5000.0,
        vx in -2000.0f64..2000.0,
        frame_ms in 1.0f64..100.0,
    ) {
        let cell = TargetCell::new();
        let mut render = RenderPipelineState::new(&Config::default());
        render.start(cell.load());
        cell.publish(TargetOffset::new(tx, 0.0), (vx, 0.0));
        for i in 0..30 {
            if let Some(origin) = render.tick(f64::from(i) * frame_ms, &cell, Viewport::default()) {
                prop_assert!(origin.origin_x >= 1280.0 * 0.06 - 1e-9);
                prop_assert!(origin.origin_x <= 1280.0 * 0.94 + 1e-9);
            }
        }
        prop_assert!(render.state().display_x.is_finite());
    }
}
