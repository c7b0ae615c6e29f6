use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::format::AudioFormat;

/// Result returned when a recording has been finalized on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub duration_secs: f64,
    pub bytes_captured: u64,
    pub metadata: RecordingMetadata,
    pub checksum: Option<String>,
}

/// Metadata stored alongside a recording as a JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub device_name: String,
    pub file_path: String,
    pub created_at: String,
    pub duration_secs: f64,
    pub data_bytes: u64,
    pub format: AudioFormat,
    pub checksum: Option<String>,
}

impl RecordingMetadata {
    pub fn new(
        device_name: &str,
        file_path: &str,
        format: &AudioFormat,
        data_bytes: u64,
        checksum: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            device_name: device_name.to_string(),
            file_path: file_path.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            duration_secs: format.duration_secs(data_bytes),
            data_bytes,
            format: format.clone(),
            checksum,
        }
    }
}
