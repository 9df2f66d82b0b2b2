//! Constants used throughout the application

/// Number of points in one face-mesh landmark frame
pub const NUM_FACE_MESH_LANDMARKS: usize = 478;

/// Landmark index of the nose tip, used as head-center proxy
pub const NOSE_TIP_INDEX: usize = 1;

/// Landmark index of the left cheek edge
pub const LEFT_CHEEK_INDEX: usize = 234;

/// Landmark index of the right cheek edge
pub const RIGHT_CHEEK_INDEX: usize = 454;

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Average adult face width assumed for every user
pub const DEFAULT_FACE_WIDTH_MM: f64 = 140.0;

/// Depth heuristic tuning factor
pub const DEFAULT_DEPTH_FACTOR: f64 = 0.3;

/// Lower bound on apparent face width, avoids division blow-up
pub const MIN_FACE_WIDTH_PX: f64 = 10.0;

/// Depth clamp range
pub const MIN_DEPTH_MM: f64 = 300.0;
pub const MAX_DEPTH_MM: f64 = 1200.0;

/// Field of view clamp range
pub const MIN_FOV_DEG: f64 = 12.0;
pub const MAX_FOV_DEG: f64 = 35.0;

/// Viewing distance floor used by the FOV computation
pub const MIN_VIEWING_DISTANCE_MM: f64 = 200.0;

/// Default detector cadence (~30 Hz)
pub const DEFAULT_DETECT_INTERVAL_MS: f64 = 33.0;

/// Default dt assumed for the first jitter filter tick
pub const DEFAULT_SAMPLE_DT_MS: f64 = 33.0;

/// Ticks closer than this do not update velocity
pub const MIN_VELOCITY_DT_MS: f64 = 1.0;

/// Position readout cadence
pub const DEFAULT_READOUT_INTERVAL_MS: f64 = 120.0;

/// Minimum origin movement that causes a write
pub const DEFAULT_ORIGIN_THRESHOLD_PX: f64 = 0.08;

/// Guard against a zero soft-clamp range
pub const SOFT_CLAMP_EPSILON: f64 = 1e-6;

/// Derived perspective variable ranges
pub const MIN_DEPTH_VAR_PX: f64 = 340.0;
pub const MAX_DEPTH_VAR_PX: f64 = 720.0;
pub const DEPTH_VAR_FACTOR: f64 = 0.3;
pub const MIN_GRID_PX: f64 = 45.0;
pub const MAX_GRID_PX: f64 = 90.0;
pub const GRID_DIVISIONS: f64 = 16.0;
