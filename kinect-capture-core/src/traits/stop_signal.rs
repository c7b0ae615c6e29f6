use crate::models::error::CaptureError;

/// External trigger that ends a capture.
///
/// Capture has no internal timeout; the recorder blocks on `wait` and stops
/// the session when it returns.
pub trait StopSignal {
    fn wait(&mut self) -> Result<(), CaptureError>;
}
