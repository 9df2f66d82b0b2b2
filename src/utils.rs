//! Small numeric helpers shared by the pipeline stages.

pub mod safe_cast;

/// Clamp that tolerates an inverted range by swapping its ends
#[must_use]
pub fn clamp_range(value: f64, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    value.max(lo).min(hi)
}
