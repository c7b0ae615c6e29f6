//! # kinect-capture-core
//!
//! Platform-agnostic core of the Kinect microphone-array recorder.
//!
//! Resolves the capture device by friendly name, streams its buffers into a
//! WAV file whose header is written up front with a zero size and patched
//! once capture stops. Platform backends (Windows WASAPI) implement the
//! `EndpointEnumerator`, `CaptureEndpoint` and `CaptureStream` traits.
//!
//! ## Architecture
//!
//! ```text
//! kinect-capture-core (this crate)
//! ├── traits/       ← EndpointEnumerator, CaptureEndpoint, CaptureStream, CaptureDelegate, StopSignal
//! ├── models/       ← CaptureError, CaptureState, AudioFormat, RecorderConfig, RecordingResult
//! ├── device/       ← DeviceMatcher, resolve_device
//! ├── processing/   ← WAV header generation and parsing
//! ├── session/      ← CaptureSession, Recorder, LineStopSignal
//! └── storage/      ← WaveFileWriter, checksum, metadata sidecar
//! ```

pub mod device;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types at crate root for convenience.
pub use device::matcher::{DeviceMatcher, NameRule, KINECT_MIC_ARRAY_NAME, KINECT_MIC_ARRAY_TEMPLATE};
pub use device::resolver::{find_device, resolve_device};
pub use models::config::RecorderConfig;
pub use models::endpoint::EndpointInfo;
pub use models::error::{CaptureError, IoStage};
pub use models::format::AudioFormat;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::CaptureState;
pub use session::capture::{CaptureSession, CaptureSummary};
pub use session::recorder::Recorder;
pub use session::stop_signal::LineStopSignal;
pub use storage::wave_writer::WaveFileWriter;
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::capture_stream::{AudioBufferCallback, CaptureStream};
pub use traits::endpoint::{CaptureEndpoint, EndpointEnumerator};
pub use traits::stop_signal::StopSignal;
