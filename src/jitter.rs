//! Jitter and velocity filtering of raw head samples.
//!
//! Each accepted detection tick folds one [`HeadSample`] into an exponentially smoothed
//! head position, updates a low-passed velocity estimate, and reports the displacement
//! from the calibrated baseline with a hard deadzone applied.

use crate::config::JitterConfig;
use crate::filters::exponential::ExponentialFilter;
use crate::filters::OffsetFilter;
use crate::head_estimator::HeadSample;

/// Calibration origin subtracted from every smoothed position
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Baseline {
    /// Horizontal origin
    pub x: f64,
    /// Vertical origin
    pub y: f64,
    /// False until the first sample or an explicit calibration
    pub is_set: bool,
}

impl Baseline {
    #[must_use]
    pub const fn at(x: f64, y: f64) -> Self {
        Self { x, y, is_set: true }
    }
}

/// Snapshot of the smoothed head state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SmoothedHeadState {
    /// Smoothed horizontal position
    pub smooth_x: f64,
    /// Smoothed vertical position
    pub smooth_y: f64,
    /// Horizontal velocity in mm/s
    pub velocity_x: f64,
    /// Vertical velocity in mm/s
    pub velocity_y: f64,
    /// Time of the last accepted sample
    pub last_sample_ms: Option<f64>,
}

/// Deadzoned displacement from the baseline
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadDisplacement {
    /// Horizontal displacement
    pub x_mm: f64,
    /// Vertical displacement
    pub y_mm: f64,
}

/// Snap values strictly inside the deadzone to zero; pass everything else unchanged
#[must_use]
pub fn apply_deadzone(value: f64, deadzone: f64) -> f64 {
    if value.abs() < deadzone {
        0.0
    } else {
        value
    }
}

/// Stateful smoother over successive head samples
#[derive(Debug, Clone)]
pub struct JitterFilter {
    config: JitterConfig,
    smoother: ExponentialFilter,
    velocity: (f64, f64),
    last_sample_ms: Option<f64>,
    baseline: Baseline,
}

impl JitterFilter {
    /// Create a filter
    ///
    /// # Panics
    ///
    /// Panics if `config.alpha` is not in (0, 1]
    #[must_use]
    pub fn new(config: JitterConfig) -> Self {
        let smoother = ExponentialFilter::new(config.alpha);
        Self {
            config,
            smoother,
            velocity: (0.0, 0.0),
            last_sample_ms: None,
            baseline: Baseline::default(),
        }
    }

    /// Fold one sample taken at `now_ms` and return the deadzoned displacement
    pub fn update(&mut self, sample: HeadSample, now_ms: f64) -> HeadDisplacement {
        if !self.baseline.is_set {
            self.baseline = Baseline::at(sample.x_mm, sample.y_mm);
            self.smoother.reset_to(sample.x_mm, sample.y_mm);
        }

        let dt_ms = self
            .last_sample_ms
            .map_or(self.config.default_dt_ms, |last| now_ms - last);
        self.last_sample_ms = Some(now_ms);

        let (prev_x, prev_y) = self.smoother.current().unwrap_or((sample.x_mm, sample.y_mm));
        let (smooth_x, smooth_y) = self.smoother.update(sample.x_mm, sample.y_mm);

        if dt_ms > self.config.min_velocity_dt_ms {
            let dt_s = dt_ms / 1000.0;
            let keep = self.config.velocity_blend;
            let new_vx = (smooth_x - prev_x) / dt_s;
            let new_vy = (smooth_y - prev_y) / dt_s;
            self.velocity.0 = self.velocity.0 * keep + new_vx * (1.0 - keep);
            self.velocity.1 = self.velocity.1 * keep + new_vy * (1.0 - keep);
        }

        self.displacement()
    }

    /// Current deadzoned displacement from the baseline
    #[must_use]
    pub fn displacement(&self) -> HeadDisplacement {
        let Some((sx, sy)) = self.smoother.current() else {
            return HeadDisplacement::default();
        };
        HeadDisplacement {
            x_mm: apply_deadzone(sx - self.baseline.x, self.config.deadzone_mm),
            y_mm: apply_deadzone(sy - self.baseline.y, self.config.deadzone_mm),
        }
    }

    /// Re-center on the current smoothed position and zero the velocity
    ///
    /// Returns false, leaving the baseline unset, when no sample has been seen yet.
    pub fn recalibrate(&mut self) -> bool {
        self.velocity = (0.0, 0.0);
        match self.smoother.current() {
            Some((sx, sy)) => {
                self.baseline = Baseline::at(sx, sy);
                true
            }
            None => false,
        }
    }

    /// Forget baseline, smoothing and velocity
    pub fn clear(&mut self) {
        self.smoother.clear();
        self.velocity = (0.0, 0.0);
        self.last_sample_ms = None;
        self.baseline = Baseline::default();
    }

    /// Calibration origin
    #[must_use]
    pub const fn baseline(&self) -> Baseline {
        self.baseline
    }

    /// Velocity estimate in mm/s
    #[must_use]
    pub const fn velocity(&self) -> (f64, f64) {
        self.velocity
    }

    /// Smoothed state snapshot
    #[must_use]
    pub fn state(&self) -> SmoothedHeadState {
        let (smooth_x, smooth_y) = self.smoother.current().unwrap_or_default();
        SmoothedHeadState {
            smooth_x,
            smooth_y,
            velocity_x: self.velocity.0,
            velocity_y: self.velocity.1,
            last_sample_ms: self.last_sample_ms,
        }
    }
}

impl Default for JitterFilter {
    fn default() -> Self {
        Self::new(JitterConfig::default())
    }
}
