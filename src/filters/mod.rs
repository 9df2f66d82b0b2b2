//! Smoothing filters for head positions and parallax offsets.
//!
//! Two families live here: the fixed-alpha [`exponential::ExponentialFilter`] used once
//! per detection sample, and the time-constant filters in [`time_constant`] used once
//! per render frame. Time-constant filters derive their blend factor from the elapsed
//! time so they behave the same at any frame rate.

/// Fixed-alpha exponential smoothing, one step per sample
pub mod exponential;

/// Frame-rate independent single and two-stage smoothing
pub mod time_constant;

use crate::config::{RenderConfig, SmoothingMode};
use crate::{Error, Result};

/// Frame-rate independent blend factor `1 - exp(-dt / tau)`
///
/// Non-positive `dt` yields 0 (no movement); non-positive `tau` yields 1 (snap).
#[must_use]
pub fn blend_factor(dt_ms: f64, tau_ms: f64) -> f64 {
    if dt_ms <= 0.0 {
        return 0.0;
    }
    if tau_ms <= 0.0 {
        return 1.0;
    }
    1.0 - (-dt_ms / tau_ms).exp()
}

/// Trait for all offset filters
pub trait OffsetFilter: Send + Sync {
    /// Advance the filter by `dt_ms` toward `(x, y)` and return the filtered value
    fn apply(&mut self, x: f64, y: f64, dt_ms: f64) -> (f64, f64);

    /// Current output without advancing
    fn value(&self) -> (f64, f64);

    /// Output of the first smoothing stage; equals `value` for single-stage filters
    fn response_value(&self) -> (f64, f64) {
        self.value()
    }

    /// Seed every internal stage with `(x, y)`
    fn reset_to(&mut self, x: f64, y: f64);

    /// Reset filter state to zero
    fn reset(&mut self) {
        self.reset_to(0.0, 0.0);
    }

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
#[derive(Debug, Default)]
pub struct NoFilter {
    last: (f64, f64),
}

impl OffsetFilter for NoFilter {
    fn apply(&mut self, x: f64, y: f64, _dt_ms: f64) -> (f64, f64) {
        self.last = (x, y);
        self.last
    }

    fn value(&self) -> (f64, f64) {
        self.last
    }

    fn reset_to(&mut self, x: f64, y: f64) {
        self.last = (x, y);
    }

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Build the render filter described by the render configuration
#[must_use]
pub fn from_render_config(config: &RenderConfig) -> Box<dyn OffsetFilter> {
    match config.smoothing {
        SmoothingMode::Single => Box::new(time_constant::TimeConstantFilter::new(config.response_ms)),
        SmoothingMode::TwoStage => Box::new(time_constant::TwoStageFilter::new(config.response_ms, config.visual_ms)),
    }
}

/// Create an offset filter by type name
///
/// Accepted forms: `none`, `exponential[:alpha]`, `single[:tau_ms]`,
/// `two_stage[:response_ms[:visual_ms]]`.
pub fn create_filter(spec: &str) -> Result<Box<dyn OffsetFilter>> {
    let mut parts = spec.split(':');
    let kind = parts.next().unwrap_or_default().to_lowercase();
    let params = parts
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|_| Error::InvalidInput(format!("Invalid filter parameter '{p}' in {spec}")))
        })
        .collect::<Result<Vec<f64>>>()?;
    let param = |i: usize, default: f64| params.get(i).copied().unwrap_or(default);

    match kind.as_str() {
        "none" | "nofilter" => Ok(Box::new(NoFilter::default())),
        "exponential" => {
            let alpha = param(0, 0.55);
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(Error::InvalidInput(format!("Alpha must be in (0, 1], got {alpha}")));
            }
            Ok(Box::new(exponential::ExponentialFilter::new(alpha)))
        }
        "single" | "time_constant" => {
            let tau = param(0, 25.0);
            if !tau.is_finite() || tau <= 0.0 {
                return Err(Error::InvalidInput(format!("Time constant must be positive, got {tau}")));
            }
            Ok(Box::new(time_constant::TimeConstantFilter::new(tau)))
        }
        "two_stage" | "twostage" => {
            let response = param(0, 30.0);
            let visual = param(1, 10.0);
            if !response.is_finite() || !visual.is_finite() || response <= 0.0 || visual <= 0.0 {
                return Err(Error::InvalidInput(format!(
                    "Time constants must be positive, got {response} and {visual}"
                )));
            }
            Ok(Box::new(time_constant::TwoStageFilter::new(response, visual)))
        }
        _ => Err(Error::InvalidInput(format!("Unknown filter type: {spec}"))),
    }
}
