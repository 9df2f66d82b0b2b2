use super::OffsetFilter;

/// Exponential smoothing filter with a fixed per-sample alpha
///
/// The first sample after a reset passes through unchanged.
#[derive(Debug, Clone)]
pub struct ExponentialFilter {
    alpha: f64,
    last: Option<(f64, f64)>,
}

impl ExponentialFilter {
    /// Create a new exponential filter
    ///
    /// # Panics
    ///
    /// Panics if alpha is not in the range (0, 1]
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, last: None }
    }

    /// Smoothing factor
    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Fold one sample into the smoothed value
    pub fn update(&mut self, x: f64, y: f64) -> (f64, f64) {
        let filtered = match self.last {
            Some((lx, ly)) => (self.alpha.mul_add(x - lx, lx), self.alpha.mul_add(y - ly, ly)),
            None => (x, y),
        };
        self.last = Some(filtered);
        filtered
    }

    /// Last smoothed value, if any sample was seen
    #[must_use]
    pub const fn current(&self) -> Option<(f64, f64)> {
        self.last
    }

    /// Forget all samples
    pub fn clear(&mut self) {
        self.last = None;
    }
}

impl OffsetFilter for ExponentialFilter {
    fn apply(&mut self, x: f64, y: f64, _dt_ms: f64) -> (f64, f64) {
        self.update(x, y)
    }

    fn value(&self) -> (f64, f64) {
        self.last.unwrap_or_default()
    }

    fn reset_to(&mut self, x: f64, y: f64) {
        self.last = Some((x, y));
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}
