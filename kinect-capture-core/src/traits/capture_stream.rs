use std::ops::ControlFlow;

use crate::models::error::CaptureError;
use crate::models::format::AudioFormat;

/// Callback invoked for every buffer the device delivers.
///
/// Receives raw sample bytes in the stream's negotiated format. Returning
/// `ControlFlow::Break` asks the stream to halt: no further buffers may be
/// delivered after it.
pub type AudioBufferCallback = Box<dyn FnMut(&[u8]) -> ControlFlow<()> + Send + 'static>;

/// An opened, push-delivered audio capture stream.
///
/// Implemented by:
/// - `WasapiCapture` (Windows)
pub trait CaptureStream: Send {
    /// Format negotiated when the stream was opened. Fixed for the stream's
    /// lifetime.
    fn format(&self) -> &AudioFormat;

    /// Display name of the device backing this stream.
    fn device_name(&self) -> &str;

    /// Begin delivering buffers to `callback`, in arrival order, one at a time.
    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), CaptureError>;

    /// Halt delivery.
    ///
    /// Must not return until any in-flight callback has finished; after it
    /// returns the callback is never invoked again. A device fault that ended
    /// delivery early is returned here as `StreamFailed`.
    fn stop(&mut self) -> Result<(), CaptureError>;
}
