use std::path::PathBuf;

use crate::device::matcher::DeviceMatcher;

/// Default file name prefix; files are named `<prefix>-HH-MM-SS.wav`.
pub const DEFAULT_FILE_PREFIX: &str = "KinectAudio";

/// Configuration for a recorder.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Directory where recordings are written. Created if missing.
    pub output_directory: PathBuf,

    /// File name prefix (default: `KinectAudio`).
    pub file_prefix: String,

    /// Which endpoint to record from (default: the Kinect microphone array).
    pub matcher: DeviceMatcher,

    /// Compute a SHA-256 checksum of the finished file (default: true).
    pub compute_checksum: bool,

    /// Write `<file>.metadata.json` next to the recording (default: true).
    pub write_metadata: bool,
}

impl RecorderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.file_prefix.trim().is_empty() {
            return Err("file prefix must not be empty".into());
        }
        if self
            .file_prefix
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        {
            return Err(format!("file prefix contains a path character: {:?}", self.file_prefix));
        }
        if self.matcher.is_empty() {
            return Err("device matcher has no rules".into());
        }
        Ok(())
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            matcher: DeviceMatcher::kinect(),
            compute_checksum: true,
            write_metadata: true,
        }
    }
}
