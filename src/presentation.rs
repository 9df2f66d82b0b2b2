//! Output side of the tracker: status, readout and perspective writes.

use crate::perspective::{DisplayOrigin, PerspectiveParams};
use log::{debug, info};
use std::fmt;

/// Tracking indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingStatus {
    /// Not tracking, or a terminal failure
    #[default]
    Off,
    /// Tracking with no face in view
    Searching,
    /// Face in view
    Tracking,
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Searching => write!(f, "searching"),
            Self::Tracking => write!(f, "tracking"),
        }
    }
}

/// State of the start/retry control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartControl {
    /// Enabled, labelled "start"
    Ready,
    /// Disabled while a start attempt is in progress
    Busy,
    /// Enabled, labelled "retry" after a failure
    Retry,
    /// Hidden while tracking
    Hidden,
}

/// Status texts shown to the user
pub mod status_text {
    pub const IDLE: &str = "Idle";
    pub const LOADING_MODEL: &str = "Loading model...";
    pub const DETECTING: &str = "Detecting";
    pub const TRACKING: &str = "Tracking";
    pub const SEARCHING: &str = "Searching for face...";
    pub const CAMERA_UNSUPPORTED: &str = "Camera not supported";
    pub const MODEL_FAILED: &str = "Model loading failed";
    pub const CAMERA_FAILED: &str = "Camera access failed";
}

/// Receives everything the tracker wants to show
pub trait PresentationSink {
    /// New perspective origin
    fn perspective_origin(&mut self, origin: DisplayOrigin);

    /// New perspective distance and derived sizes
    fn perspective_params(&mut self, params: PerspectiveParams);

    /// Tracking indicator and its text
    fn status(&mut self, status: TrackingStatus, text: &str);

    /// Position readout; empty clears it
    fn readout(&mut self, text: &str);

    /// Start/retry control state
    fn start_control(&mut self, control: StartControl);
}

/// Sink that writes everything to the log
#[derive(Debug, Default)]
pub struct LogSink {
    origins_written: u64,
}

impl LogSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of origin writes received
    #[must_use]
    pub const fn origins_written(&self) -> u64 {
        self.origins_written
    }
}

impl PresentationSink for LogSink {
    fn perspective_origin(&mut self, origin: DisplayOrigin) {
        self.origins_written += 1;
        debug!("perspective-origin: {}", origin.to_css());
    }

    fn perspective_params(&mut self, params: PerspectiveParams) {
        info!(
            "perspective: {}px, depth: {}px, grid: {}px",
            params.distance_px, params.depth_px, params.grid_px
        );
    }

    fn status(&mut self, status: TrackingStatus, text: &str) {
        info!("status [{status}]: {text}");
    }

    fn readout(&mut self, text: &str) {
        if !text.is_empty() {
            info!("{text}");
        }
    }

    fn start_control(&mut self, control: StartControl) {
        debug!("start control: {control:?}");
    }
}

/// One recorded sink call
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Origin(DisplayOrigin),
    Params(PerspectiveParams),
    Status(TrackingStatus, String),
    Readout(String),
    Control(StartControl),
}

/// Sink that keeps every call, for headless inspection
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<SinkEvent>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events in order
    #[must_use]
    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    /// Drop recorded events
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Recorded origin writes
    #[must_use]
    pub fn origins(&self) -> Vec<DisplayOrigin> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Origin(o) => Some(*o),
                _ => None,
            })
            .collect()
    }

    /// Recorded status changes
    #[must_use]
    pub fn statuses(&self) -> Vec<(TrackingStatus, String)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Status(s, t) => Some((*s, t.clone())),
                _ => None,
            })
            .collect()
    }

    /// Recorded readouts
    #[must_use]
    pub fn readouts(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Readout(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    /// Last control state
    #[must_use]
    pub fn last_control(&self) -> Option<StartControl> {
        self.events.iter().rev().find_map(|e| match e {
            SinkEvent::Control(c) => Some(*c),
            _ => None,
        })
    }
}

impl PresentationSink for RecordingSink {
    fn perspective_origin(&mut self, origin: DisplayOrigin) {
        self.events.push(SinkEvent::Origin(origin));
    }

    fn perspective_params(&mut self, params: PerspectiveParams) {
        self.events.push(SinkEvent::Params(params));
    }

    fn status(&mut self, status: TrackingStatus, text: &str) {
        self.events.push(SinkEvent::Status(status, text.to_string()));
    }

    fn readout(&mut self, text: &str) {
        self.events.push(SinkEvent::Readout(text.to_string()));
    }

    fn start_control(&mut self, control: StartControl) {
        self.events.push(SinkEvent::Control(control));
    }
}
