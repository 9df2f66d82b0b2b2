use super::{blend_factor, OffsetFilter};

/// Single exponential stage driven by a time constant
#[derive(Debug, Clone)]
pub struct TimeConstantFilter {
    tau_ms: f64,
    x: f64,
    y: f64,
}

impl TimeConstantFilter {
    /// Create a stage with time constant `tau_ms`
    ///
    /// # Panics
    ///
    /// Panics if the time constant is not positive
    #[must_use]
    pub fn new(tau_ms: f64) -> Self {
        assert!(tau_ms > 0.0, "Time constant must be positive");
        Self { tau_ms, x: 0.0, y: 0.0 }
    }

    /// Time constant in milliseconds
    #[must_use]
    pub const fn tau_ms(&self) -> f64 {
        self.tau_ms
    }
}

impl OffsetFilter for TimeConstantFilter {
    fn apply(&mut self, x: f64, y: f64, dt_ms: f64) -> (f64, f64) {
        let a = blend_factor(dt_ms, self.tau_ms);
        self.x += (x - self.x) * a;
        self.y += (y - self.y) * a;
        (self.x, self.y)
    }

    fn value(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    fn reset_to(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    fn name(&self) -> &str {
        "TimeConstantFilter"
    }
}

/// Response stage followed by a visual stage
///
/// The response stage sets how quickly the offset reacts; the shorter visual stage
/// only rounds off what the response stage produces.
#[derive(Debug, Clone)]
pub struct TwoStageFilter {
    response: TimeConstantFilter,
    visual: TimeConstantFilter,
}

impl TwoStageFilter {
    /// Create a two-stage filter
    ///
    /// # Panics
    ///
    /// Panics if either time constant is not positive
    #[must_use]
    pub fn new(response_ms: f64, visual_ms: f64) -> Self {
        Self {
            response: TimeConstantFilter::new(response_ms),
            visual: TimeConstantFilter::new(visual_ms),
        }
    }
}

impl OffsetFilter for TwoStageFilter {
    fn apply(&mut self, x: f64, y: f64, dt_ms: f64) -> (f64, f64) {
        let (sx, sy) = self.response.apply(x, y, dt_ms);
        self.visual.apply(sx, sy, dt_ms)
    }

    fn value(&self) -> (f64, f64) {
        self.visual.value()
    }

    fn response_value(&self) -> (f64, f64) {
        self.response.value()
    }

    fn reset_to(&mut self, x: f64, y: f64) {
        self.response.reset_to(x, y);
        self.visual.reset_to(x, y);
    }

    fn name(&self) -> &str {
        "TwoStageFilter"
    }
}
