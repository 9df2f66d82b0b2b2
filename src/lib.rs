//! Head-tracking parallax library.
//!
//! Turns a webcam view of the user's face into a perspective origin that makes a 3D
//! scene appear to sit behind the screen. The pipeline consists of:
//! 1. Screen calibration: physical screen size and field of view
//! 2. Head estimation: monocular head position from three face landmarks
//! 3. Jitter filtering: exponential smoothing, velocity and deadzone
//! 4. Detection scheduling: rate-limited detector calls that publish a target
//! 5. Render scheduling: frame-rate independent smoothing with optional prediction
//! 6. Perspective mapping: soft-clamped, inset origin with change suppression
//!
//! The camera, the landmark model and the display are external; they are reached
//! through the traits in [`landmarks`] and [`presentation`]. The [`simulation`] module
//! provides synthetic backends.
//!
//! # Examples
//!
//! ## Running a session
//!
//! ```
//! use parallax_head_tracking::{
//!     calibration::Viewport,
//!     config::Config,
//!     presentation::RecordingSink,
//!     session::ParallaxSession,
//!     simulation::{FacePlacement, ScriptedDetector, SimClock, SyntheticCamera, SyntheticLoader},
//! };
//!
//! # fn main() -> parallax_head_tracking::Result<()> {
//! let clock = SimClock::new();
//! let detector = ScriptedDetector::from_fn(|t| Some(FacePlacement::sway(t, 40.0, 2000.0)));
//! let mut session = ParallaxSession::new(
//!     Config::default(),
//!     SyntheticCamera::new(clock.clone()),
//!     SyntheticLoader::new(detector),
//!     RecordingSink::new(),
//!     Viewport::new(1280.0, 800.0),
//! )?;
//!
//! session.start()?;
//! for _ in 0..120 {
//!     clock.advance(16.0);
//!     session.frame(clock.now());
//! }
//! assert!(session.baseline().is_set);
//! session.stop();
//! # Ok(())
//! # }
//! ```
//!
//! ## Using filters
//!
//! ```
//! use parallax_head_tracking::filters::{create_filter, OffsetFilter};
//!
//! # fn main() -> parallax_head_tracking::Result<()> {
//! let mut filter = create_filter("two_stage:30:10")?;
//! filter.reset_to(0.0, 0.0);
//! let (x, y) = filter.apply(100.0, 0.0, 16.0);
//! assert!(x > 0.0 && x < 100.0);
//! assert_eq!(y, 0.0);
//! # Ok(())
//! # }
//! ```

/// Physical screen calibration and field of view
pub mod calibration;

/// Configuration management
pub mod config;

/// Constants used throughout the library
pub mod constants;

/// Detection loop scheduling
pub mod detection;

/// Error types and result handling
pub mod error;

/// Smoothing filters
pub mod filters;

/// Monocular head position estimation
pub mod head_estimator;

/// Jitter and velocity filtering of head samples
pub mod jitter;

/// Landmark frames and external collaborator traits
pub mod landmarks;

/// Perspective origin mapping
pub mod perspective;

/// Status, readout and perspective output
pub mod presentation;

/// Render loop scheduling
pub mod render;

/// Tracking session lifecycle
pub mod session;

/// Synthetic camera, video and detector backends
pub mod simulation;

/// Target handoff between the two loops
pub mod target;

/// Numeric helpers
pub mod utils;

pub use error::{Error, Result};
