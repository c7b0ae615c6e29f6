use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;

/// Event delegate for capture session notifications.
///
/// `on_error` is called from the device's delivery thread, the other
/// methods from the thread driving the session.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: CaptureState);

    /// Called when a fault halts the stream mid-capture.
    fn on_error(&self, error: &CaptureError);

    /// Called when the file is finalized and the recording result is known.
    fn on_capture_finished(&self, result: &RecordingResult);
}
