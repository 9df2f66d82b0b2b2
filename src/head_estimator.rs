//! Monocular head position estimation from face landmarks.
//!
//! The apparent face width in pixels is the only scale cue: every face is assumed to
//! be `assumed_face_width_mm` wide, which gives a millimeter-per-pixel factor for the
//! lateral offset and a rough depth. Users with larger or smaller faces get a biased
//! but self-consistent estimate.

use crate::config::EstimatorConfig;
use crate::landmarks::LandmarkFrame;
use crate::utils::clamp_range;

/// Estimated head center displacement from the video center, plus coarse depth
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadSample {
    /// Horizontal displacement
    pub x_mm: f64,
    /// Vertical displacement
    pub y_mm: f64,
    /// Distance from the camera
    pub z_mm: f64,
}

impl HeadSample {
    #[must_use]
    pub const fn new(x_mm: f64, y_mm: f64, z_mm: f64) -> Self {
        Self { x_mm, y_mm, z_mm }
    }
}

/// Stateless landmark to head position estimator
#[derive(Debug, Clone)]
pub struct HeadEstimator {
    config: EstimatorConfig,
}

impl HeadEstimator {
    #[must_use]
    pub const fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Estimator parameters
    #[must_use]
    pub const fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate head position for one frame of a `video_w` x `video_h` source
    #[must_use]
    pub fn estimate(&self, frame: &LandmarkFrame, video_w: f64, video_h: f64) -> HeadSample {
        let cfg = &self.config;
        let nose = frame.nose_tip();

        let cx = nose.x * video_w;
        let cy = nose.y * video_h;
        let face_w_px = (frame.right_cheek().x - frame.left_cheek().x).abs() * video_w;
        let face_w_px = face_w_px.max(cfg.min_face_width_px);

        let mm_per_px = cfg.assumed_face_width_mm / face_w_px;
        let x_mm = (cx - video_w / 2.0) * mm_per_px;
        let y_mm = (cy - video_h / 2.0) * mm_per_px;
        let z_mm = cfg.assumed_face_width_mm * video_w * cfg.depth_factor / face_w_px;

        HeadSample {
            x_mm: clamp_range(x_mm, -cfg.x_limit_mm, cfg.x_limit_mm),
            y_mm: clamp_range(y_mm, -cfg.y_limit_mm, cfg.y_limit_mm),
            z_mm: clamp_range(z_mm, cfg.z_min_mm, cfg.z_max_mm),
        }
    }
}

impl Default for HeadEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TuningProfile;
    use crate::landmarks::Landmark;
    use proptest::prelude::*;

    fn frame(nose: (f64, f64), left_x: f64, right_x: f64) -> LandmarkFrame {
        let mut points = vec![Landmark::new(0.5, 0.5, 0.0); 478];
        points[1] = Landmark::new(nose.0, nose.1, 0.0);
        points[234] = Landmark::new(left_x, 0.5, 0.0);
        points[454] = Landmark::new(right_x, 0.5, 0.0);
        LandmarkFrame::new(points).unwrap()
    }

    #[test]
    fn test_centered_face() {
        let est = HeadEstimator::default();
        // 320px video, face spans 0.25 → 80px
        let sample = est.estimate(&frame((0.5, 0.5), 0.375, 0.625), 320.0, 240.0);
        assert_eq!(sample.x_mm, 0.0);
        assert_eq!(sample.y_mm, 0.0);
        // 140 * 320 * 0.3 / 80 = 168, below the depth floor
        assert_eq!(sample.z_mm, 300.0);
    }

    #[test]
    fn test_offset_scaled_by_face_width() {
        let est = HeadEstimator::default();
        // nose 16px right of center, face 80px wide → 1.75 mm/px
        let sample = est.estimate(&frame((0.55, 0.5), 0.375, 0.625), 320.0, 240.0);
        assert!((sample.x_mm - 28.0).abs() < 1e-9);
    }

    #[test]
    fn test_depth_shrinks_as_face_grows() {
        let est = HeadEstimator::default();
        let far = est.estimate(&frame((0.5, 0.5), 0.48, 0.52), 1280.0, 720.0);
        let near = est.estimate(&frame((0.5, 0.5), 0.45, 0.55), 1280.0, 720.0);
        assert!(near.z_mm < far.z_mm);
        assert!((near.z_mm - 420.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_face_width_uses_floor() {
        let est = HeadEstimator::default();
        let sample = est.estimate(&frame((0.9, 0.1), 0.5, 0.5), 320.0, 240.0);
        assert_eq!(sample.x_mm, 150.0);
        assert_eq!(sample.y_mm, -120.0);
        assert_eq!(sample.z_mm, 1200.0);
    }

    proptest! {
        #[test]
        fn test_simple_profile_bounds(
            nose_x in -1.0f64..2.0,
            nose_y in -1.0f64..2.0,
            left in -1.0f64..2.0,
            right in -1.0f64..2.0,
            vw in 1.0f64..4000.0,
            vh in 1.0f64..4000.0,
        ) {
            let est = HeadEstimator::new(EstimatorConfig::for_profile(TuningProfile::Simple));
            let s = est.estimate(&frame((nose_x, nose_y), left, right), vw, vh);
            prop_assert!((-200.0..=200.0).contains(&s.x_mm));
            prop_assert!((-150.0..=150.0).contains(&s.y_mm));
            prop_assert!((300.0..=1200.0).contains(&s.z_mm));
        }

        #[test]
        fn test_predictive_profile_bounds(
            nose_x in 0.0f64..1.0,
            nose_y in 0.0f64..1.0,
            left in 0.0f64..1.0,
            right in 0.0f64..1.0,
        ) {
            let est = HeadEstimator::new(EstimatorConfig::for_profile(TuningProfile::Predictive));
            let s = est.estimate(&frame((nose_x, nose_y), left, right), 640.0, 480.0);
            prop_assert!((-150.0..=150.0).contains(&s.x_mm));
            prop_assert!((-120.0..=120.0).contains(&s.y_mm));
            prop_assert!((300.0..=1200.0).contains(&s.z_mm));
        }
    }
}
