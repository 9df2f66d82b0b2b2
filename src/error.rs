//! Error types for the parallax head tracking library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// The platform offers no camera capture at all
    #[error("Camera capture is not supported on this platform")]
    CameraUnsupported,

    /// Camera permission was denied or no device could be opened
    #[error("Camera access failed: {0}")]
    CameraAccess(String),

    /// The landmark detector could not be loaded
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// A single detector invocation failed
    #[error("Detection error: {0}")]
    Detection(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic I/O error with description
    #[error("I/O error: {0}")]
    IoError(String),
}

impl Error {
    /// True for failures that end a session start attempt and require a manual retry.
    #[must_use]
    pub const fn is_setup_failure(&self) -> bool {
        matches!(self, Self::CameraUnsupported | Self::CameraAccess(_) | Self::ModelLoad(_))
    }
}

/// Application-specific error type (alias for main Error type)
pub type AppError = Error;

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_failure_classification() {
        assert!(Error::CameraUnsupported.is_setup_failure());
        assert!(Error::CameraAccess("denied".to_string()).is_setup_failure());
        assert!(Error::ModelLoad("404".to_string()).is_setup_failure());
        assert!(!Error::Detection("gpu lost".to_string()).is_setup_failure());
        assert!(!Error::InvalidInput("short frame".to_string()).is_setup_failure());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::CameraAccess("permission denied".to_string());
        assert_eq!(err.to_string(), "Camera access failed: permission denied");

        let io: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(io.to_string().starts_with("IO error"));
    }
}
