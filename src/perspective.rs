//! Perspective output: origin mapping and perspective distance.
//!
//! The render loop's display offset is soft-clamped with `tanh`, moved to the viewport
//! center, hard-clamped to an inset, and only emitted when it moved far enough to be
//! worth a layout write.

use crate::calibration::{ScreenCalibration, Viewport};
use crate::config::PerspectiveConfig;
use crate::constants::{
    DEPTH_VAR_FACTOR, GRID_DIVISIONS, MAX_DEPTH_VAR_PX, MAX_GRID_PX, MIN_DEPTH_VAR_PX, MIN_GRID_PX, SOFT_CLAMP_EPSILON,
};
use crate::utils::{clamp_range, safe_cast::f64_to_i32_round};
use log::debug;

/// Perspective origin in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplayOrigin {
    /// Horizontal origin
    pub origin_x: f64,
    /// Vertical origin
    pub origin_y: f64,
}

impl DisplayOrigin {
    /// CSS `perspective-origin` value
    #[must_use]
    pub fn to_css(&self) -> String {
        format!("{:.1}px {:.1}px", self.origin_x, self.origin_y)
    }
}

/// Perspective distance and the derived scene sizes, recomputed on resize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerspectiveParams {
    /// CSS `perspective` distance
    pub distance_px: i32,
    /// Room depth
    pub depth_px: i32,
    /// Grid cell size
    pub grid_px: i32,
}

impl PerspectiveParams {
    /// Derive perspective parameters from the calibrated FOV and viewport
    #[must_use]
    pub fn compute(calibration: &ScreenCalibration, viewport: Viewport) -> Self {
        let fov_rad = calibration.fov_deg().to_radians();
        let p = viewport.height / 2.0 / (fov_rad / 2.0).tan();
        let depth = (p * DEPTH_VAR_FACTOR).clamp(MIN_DEPTH_VAR_PX, MAX_DEPTH_VAR_PX);
        let grid = (viewport.width.min(viewport.height) / GRID_DIVISIONS).clamp(MIN_GRID_PX, MAX_GRID_PX);
        Self {
            distance_px: f64_to_i32_round(p),
            depth_px: f64_to_i32_round(depth),
            grid_px: f64_to_i32_round(grid),
        }
    }
}

/// `max * tanh(value / max)`: approaches but never exceeds `±max`
#[must_use]
pub fn soft_clamp(value: f64, max: f64) -> f64 {
    max * (value / max.max(SOFT_CLAMP_EPSILON)).tanh()
}

/// Maps display offsets to perspective origins with change suppression
#[derive(Debug, Clone)]
pub struct PerspectiveMapper {
    config: PerspectiveConfig,
    last: Option<DisplayOrigin>,
}

impl PerspectiveMapper {
    #[must_use]
    pub const fn new(config: PerspectiveConfig) -> Self {
        Self { config, last: None }
    }

    /// Origin for an offset, without touching the change cache
    #[must_use]
    pub fn origin_for(&self, x_px: f64, y_px: f64, viewport: Viewport) -> DisplayOrigin {
        let cfg = &self.config;
        let (w, h) = (viewport.width, viewport.height);
        let (cx, cy) = viewport.center();
        let x = cx + soft_clamp(x_px, w * cfg.max_excursion_x);
        let y = cy + soft_clamp(y_px, h * cfg.max_excursion_y);
        DisplayOrigin {
            origin_x: clamp_range(x, w * cfg.inset_x, w * (1.0 - cfg.inset_x)),
            origin_y: clamp_range(y, h * cfg.inset_y, h * (1.0 - cfg.inset_y)),
        }
    }

    /// Map an offset; returns the origin only when it should be written
    pub fn update(&mut self, x_px: f64, y_px: f64, viewport: Viewport) -> Option<DisplayOrigin> {
        let origin = self.origin_for(x_px, y_px, viewport);
        if let Some(last) = self.last {
            let threshold = self.config.origin_threshold_px;
            if (origin.origin_x - last.origin_x).abs() < threshold && (origin.origin_y - last.origin_y).abs() < threshold {
                return None;
            }
        }
        debug!("Perspective origin {}", origin.to_css());
        self.last = Some(origin);
        Some(origin)
    }

    /// Forget the last emitted origin so the next update always writes
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Last emitted origin
    #[must_use]
    pub const fn last_origin(&self) -> Option<DisplayOrigin> {
        self.last
    }
}

impl Default for PerspectiveMapper {
    fn default() -> Self {
        Self::new(PerspectiveConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_offset_is_center() {
        let mapper = PerspectiveMapper::default();
        let origin = mapper.origin_for(0.0, 0.0, Viewport::new(1280.0, 800.0));
        assert_eq!(origin, DisplayOrigin { origin_x: 640.0, origin_y: 400.0 });
        assert_eq!(origin.to_css(), "640.0px 400.0px");
    }

    #[test]
    fn test_soft_clamp_saturates() {
        assert!(soft_clamp(1e6, 100.0) <= 100.0);
        assert!(soft_clamp(1e6, 100.0) > 99.9);
        assert!((soft_clamp(1.0, 100.0) - 1.0).abs() < 1e-4);
        assert!(soft_clamp(5.0, 0.0).abs() <= SOFT_CLAMP_EPSILON);
    }

    #[test]
    fn test_change_threshold() {
        let vp = Viewport::new(1000.0, 1000.0);
        let mut mapper = PerspectiveMapper::default();
        assert!(mapper.update(0.0, 0.0, vp).is_some());
        assert!(mapper.update(0.05, 0.05, vp).is_none());
        assert!(mapper.update(0.2, 0.0, vp).is_some());

        mapper.invalidate();
        assert!(mapper.update(0.2, 0.0, vp).is_some());
    }

    #[test]
    fn test_perspective_params_default_screen() {
        let params = PerspectiveParams::compute(&ScreenCalibration::default(), Viewport::new(1280.0, 800.0));
        // 400 / tan(9.72°)
        assert_eq!(params.distance_px, 2335);
        assert_eq!(params.depth_px, 700);
        assert_eq!(params.grid_px, 50);
    }

    proptest! {
        #[test]
        fn test_origin_within_insets(
            x in -1e7f64..1e7,
            y in -1e7f64..1e7,
            w in 1.0f64..8000.0,
            h in 1.0f64..8000.0,
        ) {
            let mapper = PerspectiveMapper::default();
            let o = mapper.origin_for(x, y, Viewport::new(w, h));
            prop_assert!(o.origin_x >= w * 0.06 - 1e-9 && o.origin_x <= w * 0.94 + 1e-9);
            prop_assert!(o.origin_y >= h * 0.08 - 1e-9 && o.origin_y <= h * 0.92 + 1e-9);
        }
    }
}
