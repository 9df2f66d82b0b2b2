//! Render loop: per-frame smoothing, prediction and perspective output.
//!
//! Runs once per display frame. Reads the latest published target, optionally adds a
//! velocity extrapolation scaled by the frame time, advances the smoothing stages with
//! frame-rate independent blend factors and hands the result to the perspective mapper.

use crate::calibration::{ScreenCalibration, Viewport};
use crate::config::{Config, ParallaxConfig, RenderConfig};
use crate::filters::{from_render_config, OffsetFilter};
use crate::perspective::{DisplayOrigin, PerspectiveMapper};
use crate::target::{TargetCell, TargetSnapshot};
use log::trace;

/// Render-side state snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderState {
    /// Response stage output
    pub smooth_x: f64,
    /// Response stage output
    pub smooth_y: f64,
    /// Filtered offset currently shown
    pub display_x: f64,
    /// Filtered offset currently shown
    pub display_y: f64,
    /// Velocity used for prediction, decayed per frame
    pub velocity_x: f64,
    /// Velocity used for prediction, decayed per frame
    pub velocity_y: f64,
    /// Time of the previous frame
    pub last_frame_ms: Option<f64>,
}

/// State owned by the render loop
pub struct RenderPipelineState {
    config: RenderConfig,
    parallax: ParallaxConfig,
    calibration: ScreenCalibration,
    filter: Box<dyn OffsetFilter>,
    mapper: PerspectiveMapper,
    velocity: (f64, f64),
    seen_sequence: u64,
    last_frame_ms: Option<f64>,
    active: bool,
}

impl RenderPipelineState {
    /// Build the render state from configuration
    ///
    /// # Panics
    ///
    /// Panics if a render time constant is not positive; validated configurations never are.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.render.clone(),
            parallax: config.parallax.clone(),
            calibration: ScreenCalibration::from_config(&config.screen),
            filter: from_render_config(&config.render),
            mapper: PerspectiveMapper::new(config.perspective.clone()),
            velocity: (0.0, 0.0),
            seen_sequence: 0,
            last_frame_ms: None,
            active: false,
        }
    }

    /// Begin rendering from `snapshot`
    ///
    /// Every smoothing stage is seeded with the target and the origin cache is dropped,
    /// so the first frame always writes an origin.
    pub fn start(&mut self, snapshot: TargetSnapshot) {
        self.filter
            .reset_to(snapshot.offset.target_x, snapshot.offset.target_y);
        self.velocity = snapshot.velocity_mm_s;
        self.seen_sequence = snapshot.sequence;
        self.last_frame_ms = None;
        self.mapper.invalidate();
        self.active = true;
    }

    /// Stop rendering; the next frame does nothing
    pub fn stop(&mut self) {
        self.active = false;
        self.last_frame_ms = None;
    }

    /// Whether the loop is running
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Zero every stage and the prediction velocity
    pub fn reset(&mut self) {
        self.filter.reset();
        self.velocity = (0.0, 0.0);
    }

    /// Render state snapshot
    #[must_use]
    pub fn state(&self) -> RenderState {
        let (smooth_x, smooth_y) = self.filter.response_value();
        let (display_x, display_y) = self.filter.value();
        RenderState {
            smooth_x,
            smooth_y,
            display_x,
            display_y,
            velocity_x: self.velocity.0,
            velocity_y: self.velocity.1,
            last_frame_ms: self.last_frame_ms,
        }
    }

    /// Name of the active smoothing filter
    #[must_use]
    pub fn filter_name(&self) -> &str {
        self.filter.name()
    }

    /// Last origin written
    #[must_use]
    pub const fn last_origin(&self) -> Option<DisplayOrigin> {
        self.mapper.last_origin()
    }

    /// Push an offset straight through the mapper, bypassing smoothing
    pub fn present(&mut self, x_px: f64, y_px: f64, viewport: Viewport) -> Option<DisplayOrigin> {
        self.mapper.update(x_px, y_px, viewport)
    }

    /// Advance one display frame
    ///
    /// Returns the origin to write, or `None` when inactive or the change is too small.
    pub fn tick(&mut self, now_ms: f64, target: &TargetCell, viewport: Viewport) -> Option<DisplayOrigin> {
        if !self.active {
            return None;
        }

        let dt_ms = self.last_frame_ms.map_or(0.0, |last| now_ms - last).max(0.0);
        self.last_frame_ms = Some(now_ms);

        let snapshot = target.load();
        if snapshot.sequence != self.seen_sequence {
            self.seen_sequence = snapshot.sequence;
            self.velocity = snapshot.velocity_mm_s;
        }

        let (mut goal_x, mut goal_y) = (snapshot.offset.target_x, snapshot.offset.target_y);
        if self.config.predicts() {
            let dt_s = dt_ms / 1000.0;
            let (px_per_mm_x, px_per_mm_y) = self.calibration.px_per_mm(viewport);
            let pred_x = self.velocity.0 * dt_s * self.config.prediction_fraction;
            let pred_y = self.velocity.1 * dt_s * self.config.prediction_fraction;
            goal_x += pred_x * px_per_mm_x * self.parallax.scale_x;
            goal_y += pred_y * px_per_mm_y * self.parallax.scale_y;
            self.velocity.0 *= self.config.velocity_decay;
            self.velocity.1 *= self.config.velocity_decay;
        }

        let (display_x, display_y) = self.filter.apply(goal_x, goal_y, dt_ms);
        trace!("frame dt={dt_ms:.1}ms display=({display_x:.2}, {display_y:.2})");
        self.mapper.update(display_x, display_y, viewport)
    }
}

impl std::fmt::Debug for RenderPipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPipelineState")
            .field("filter", &self.filter.name())
            .field("state", &self.state())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
