use std::fmt;

use thiserror::Error;

/// Stage of the file-writing protocol at which an I/O fault happened.
///
/// Callers use this to decide whether the partial file on disk is usable:
/// a `Finalize` failure leaves the placeholder (zero-size) header in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoStage {
    Create,
    Header,
    Payload,
    Finalize,
    Checksum,
    Metadata,
}

impl fmt::Display for IoStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Header => "header",
            Self::Payload => "payload",
            Self::Finalize => "finalize",
            Self::Checksum => "checksum",
            Self::Metadata => "metadata",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while resolving a device or capturing from it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("endpoint enumeration failed: {0}")]
    EnumerationFailed(String),

    #[error("no matching capture device found")]
    DeviceNotFound,

    #[error("failed to open capture stream: {0}")]
    StreamOpenFailed(String),

    #[error("capture stream failed: {0}")]
    StreamFailed(String),

    #[error("file I/O failed during {stage}: {message}")]
    FileIo { stage: IoStage, message: String },

    #[error("session state violation: {0}")]
    SessionStateViolation(String),

    #[error("stop signal failed: {0}")]
    StopSignalFailed(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),
}

impl CaptureError {
    pub fn file_io(stage: IoStage, err: impl fmt::Display) -> Self {
        Self::FileIo {
            stage,
            message: err.to_string(),
        }
    }

    /// The I/O stage, if this is a file error.
    pub fn io_stage(&self) -> Option<IoStage> {
        match self {
            Self::FileIo { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
