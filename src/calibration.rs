//! Physical screen calibration.
//!
//! Converts the configured viewing distance, screen diagonal and aspect ratio into
//! millimeter screen dimensions and a vertical field of view. Both loops use the
//! resulting pixels-per-millimeter factors to turn head displacement into parallax.

use crate::config::ScreenConfig;
use crate::constants::{MAX_FOV_DEG, MIN_FOV_DEG, MIN_VIEWING_DISTANCE_MM, MM_PER_INCH};
use serde::{Deserialize, Serialize};

/// Viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl Viewport {
    /// Create a viewport; each dimension is floored at one pixel
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// Viewport center
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

/// Physical screen size in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenMm {
    /// Width
    pub w_mm: f64,
    /// Height
    pub h_mm: f64,
}

/// Screen calibration model
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenCalibration {
    viewing_distance_cm: f64,
    diagonal_in: f64,
    aspect_w: f64,
    aspect_h: f64,
}

impl ScreenCalibration {
    /// Create a calibration from raw physical constants
    #[must_use]
    pub const fn new(viewing_distance_cm: f64, diagonal_in: f64, aspect_w: f64, aspect_h: f64) -> Self {
        Self {
            viewing_distance_cm,
            diagonal_in,
            aspect_w,
            aspect_h,
        }
    }

    /// Create a calibration from the screen section of the configuration
    #[must_use]
    pub const fn from_config(config: &ScreenConfig) -> Self {
        Self::new(config.viewing_distance_cm, config.diagonal_in, config.aspect_w, config.aspect_h)
    }

    /// Physical screen width and height
    #[must_use]
    pub fn screen_mm(&self) -> ScreenMm {
        let diagonal_mm = self.diagonal_in * MM_PER_INCH;
        let ratio = self.aspect_w.hypot(self.aspect_h);
        ScreenMm {
            w_mm: diagonal_mm * (self.aspect_w / ratio),
            h_mm: diagonal_mm * (self.aspect_h / ratio),
        }
    }

    /// Vertical field of view in degrees, clamped to a usable range
    #[must_use]
    pub fn fov_deg(&self) -> f64 {
        let h_mm = self.screen_mm().h_mm;
        let distance_mm = (self.viewing_distance_cm * 10.0).max(MIN_VIEWING_DISTANCE_MM);
        let fov = 2.0 * (h_mm / 2.0 / distance_mm).atan();
        fov.to_degrees().clamp(MIN_FOV_DEG, MAX_FOV_DEG)
    }

    /// Pixels per millimeter along each axis for the given viewport
    #[must_use]
    pub fn px_per_mm(&self, viewport: Viewport) -> (f64, f64) {
        let ScreenMm { w_mm, h_mm } = self.screen_mm();
        (viewport.width / w_mm, viewport.height / h_mm)
    }
}

impl Default for ScreenCalibration {
    fn default() -> Self {
        Self::from_config(&ScreenConfig::default())
    }
}
