//! Per-thread COM initialization.

use std::marker::PhantomData;

use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_MULTITHREADED};

use kinect_capture_core::models::error::CaptureError;

/// RAII guard joining the calling thread to the multithreaded apartment.
///
/// If the thread already lives in a single-threaded apartment the guard
/// does nothing and leaves that apartment alone.
pub struct ComGuard {
    initialized: bool,
    // Tied to the thread that initialized COM.
    _not_send: PhantomData<*const ()>,
}

impl ComGuard {
    pub fn init() -> Result<Self, CaptureError> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        if hr == RPC_E_CHANGED_MODE {
            log::debug!("COM already initialized as STA on this thread");
            return Ok(Self {
                initialized: false,
                _not_send: PhantomData,
            });
        }
        hr.ok()
            .map_err(|e| CaptureError::EnumerationFailed(format!("CoInitializeEx failed: {}", e)))?;
        Ok(Self {
            initialized: true,
            _not_send: PhantomData,
        })
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.initialized {
            unsafe {
                CoUninitialize();
            }
        }
    }
}
