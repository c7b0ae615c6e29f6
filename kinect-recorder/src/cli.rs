use std::path::PathBuf;

use clap::Parser;
use kinect_capture_core::models::config::DEFAULT_FILE_PREFIX;
use kinect_capture_core::{DeviceMatcher, NameRule, RecorderConfig};

#[derive(Parser, Debug)]
#[command(name = "kinect-recorder")]
#[command(about = "Record the Kinect microphone array to a WAV file")]
#[command(version)]
pub struct Cli {
    /// Directory for recordings (defaults to the user's Music folder)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// File name prefix; files are named <prefix>-HH-MM-SS.wav
    #[arg(short, long, default_value = DEFAULT_FILE_PREFIX)]
    pub prefix: String,

    /// Capture from the endpoint with exactly this friendly name
    #[arg(short, long, conflicts_with = "device_contains")]
    pub device: Option<String>,

    /// Capture from the first endpoint whose name contains this text
    #[arg(long)]
    pub device_contains: Option<String>,

    /// List active capture endpoints and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Skip the checksum and the .metadata.json sidecar
    #[arg(long)]
    pub no_metadata: bool,
}

impl Cli {
    pub fn matcher(&self) -> DeviceMatcher {
        match (&self.device, &self.device_contains) {
            (Some(name), _) => DeviceMatcher::new(vec![NameRule::exact(name.as_str())]),
            (None, Some(fragment)) => DeviceMatcher::new(vec![NameRule::contains(fragment.as_str())]),
            (None, None) => DeviceMatcher::kinect(),
        }
    }

    pub fn recorder_config(&self) -> RecorderConfig {
        RecorderConfig {
            output_directory: self.output_dir.clone().unwrap_or_else(default_output_dir),
            file_prefix: self.prefix.clone(),
            matcher: self.matcher(),
            compute_checksum: !self.no_metadata,
            write_metadata: !self.no_metadata,
        }
    }
}

fn default_output_dir() -> PathBuf {
    dirs_next::audio_dir().unwrap_or_else(|| PathBuf::from("."))
}
