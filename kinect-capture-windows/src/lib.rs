//! # kinect-capture-windows
//!
//! Windows WASAPI backend for the Kinect recorder.
//!
//! Provides:
//! - `DeviceEnumerator` — active capture endpoints via the MMDevice API
//! - `WasapiEndpoint` — RAII handle to one endpoint
//! - `WasapiCapture` — shared-mode capture stream in the device's mix format
//! - `ComGuard` — per-thread COM apartment guard
//!
//! ## Usage
//! ```ignore
//! use kinect_capture_core::{resolve_device, CaptureEndpoint, CaptureSession, DeviceMatcher};
//! use kinect_capture_windows::DeviceEnumerator;
//!
//! let enumerator = DeviceEnumerator::new()?;
//! let endpoint = resolve_device(&enumerator, &DeviceMatcher::kinect())?;
//! let mut session = CaptureSession::open(&endpoint)?;
//! session.start(std::fs::File::create("KinectAudio.wav")?)?;
//! ```

#[cfg(target_os = "windows")]
pub mod com;
#[cfg(target_os = "windows")]
pub mod device_enumerator;
#[cfg(target_os = "windows")]
pub mod wasapi_capture;

#[cfg(target_os = "windows")]
pub use com::ComGuard;
#[cfg(target_os = "windows")]
pub use device_enumerator::{DeviceEnumerator, WasapiEndpoint};
#[cfg(target_os = "windows")]
pub use wasapi_capture::WasapiCapture;
