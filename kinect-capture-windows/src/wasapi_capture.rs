//! WASAPI capture stream.
//!
//! Captures raw bytes from a capture endpoint in shared mode, in the
//! endpoint's own mix format, and delivers each packet to the
//! `AudioBufferCallback` from a dedicated thread.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use windows::core::PCWSTR;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::*;

use kinect_capture_core::models::error::CaptureError;
use kinect_capture_core::models::format::{AudioFormat, FORMAT_FIXED_SIZE};
use kinect_capture_core::traits::capture_stream::{AudioBufferCallback, CaptureStream};

use crate::com::ComGuard;

/// Acceptable lag in milliseconds between live sound and the recording.
pub const TARGET_LATENCY_MS: u32 = 20;

/// 100-nanosecond units per millisecond.
const REFTIMES_PER_MS: i64 = 10_000;

/// WASAPI shared-mode capture.
///
/// The format is read from the endpoint once, on `open`. The capture thread
/// reopens the endpoint by ID and initializes the client with exactly that
/// format, so the header written before streaming always matches the bytes
/// that follow it.
pub struct WasapiCapture {
    device_id: String,
    device_name: String,
    format: AudioFormat,
    running: Arc<AtomicBool>,
    capture_handle: Mutex<Option<thread::JoinHandle<Result<(), CaptureError>>>>,
}

impl WasapiCapture {
    /// Activate an audio client on `device` and query its mix format.
    pub fn open(device: &IMMDevice, device_id: String, device_name: String) -> Result<Self, CaptureError> {
        let format = unsafe {
            let audio_client: IAudioClient = device
                .Activate(CLSCTX_ALL, None)
                .map_err(|e| CaptureError::StreamOpenFailed(format!("Activate failed: {}", e)))?;

            let mix_format_ptr = audio_client
                .GetMixFormat()
                .map_err(|e| CaptureError::StreamOpenFailed(format!("GetMixFormat failed: {}", e)))?;

            let format = format_from_raw(mix_format_ptr);
            CoTaskMemFree(Some(mix_format_ptr as *const _));
            format?
        };
        format.validate()?;

        log::info!(
            "opened {:?}: {} Hz, {} ch, {} bit {}",
            device_name,
            format.sample_rate,
            format.channels,
            format.bits_per_sample,
            format.encoding_name()
        );

        Ok(Self {
            device_id,
            device_name,
            format,
            running: Arc::new(AtomicBool::new(false)),
            capture_handle: Mutex::new(None),
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

impl CaptureStream for WasapiCapture {
    fn format(&self) -> &AudioFormat {
        &self.format
    }

    fn device_name(&self) -> &str {
        &self.device_name
    }

    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), CaptureError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CaptureError::SessionStateViolation("capture already running".into()));
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let device_id = self.device_id.clone();
        let format_block = self.format.to_format_block();
        let block_align = self.format.block_align as usize;
        let (ready_tx, ready_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("wasapi-capture".into())
            .spawn(move || {
                let result = capture_thread(&running, &device_id, &format_block, block_align, callback, ready_tx);
                if let Err(ref e) = result {
                    log::error!("Capture error: {}", e);
                }
                running.store(false, Ordering::SeqCst);
                result
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CaptureError::StreamOpenFailed(format!("failed to spawn capture thread: {}", e))
            })?;

        // Wait until the client is started (or failed to) before returning.
        let startup = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(CaptureError::StreamOpenFailed("capture thread exited during startup".into())));
        if let Err(e) = startup {
            self.running.store(false, Ordering::SeqCst);
            let _ = handle.join();
            return Err(e);
        }

        *self.capture_handle.lock() = Some(handle);
        Ok(())
    }

    /// Halt the capture thread and report any device fault that ended it.
    fn stop(&mut self) -> Result<(), CaptureError> {
        self.running.store(false, Ordering::SeqCst);
        match self.capture_handle.lock().take() {
            Some(handle) => join_capture_thread(handle),
            None => Ok(()),
        }
    }
}

impl Drop for WasapiCapture {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Wait for the capture thread and flatten its outcome.
fn join_capture_thread(handle: thread::JoinHandle<Result<(), CaptureError>>) -> Result<(), CaptureError> {
    handle
        .join()
        .map_err(|_| CaptureError::StreamFailed("capture thread panicked".into()))?
}

/// The device overran its buffer and dropped audio before this packet.
fn is_discontinuity(flags: u32) -> bool {
    flags & (AUDCLNT_BUFFERFLAGS_DATA_DISCONTINUITY.0 as u32) != 0
}

/// The packet must be treated as silence regardless of its contents.
fn is_silent(flags: u32) -> bool {
    flags & (AUDCLNT_BUFFERFLAGS_SILENT.0 as u32) != 0
}

/// Copy a `WAVEFORMATEX` (plus its `cbSize` extension bytes) out of OS memory.
unsafe fn format_from_raw(ptr: *const WAVEFORMATEX) -> Result<AudioFormat, CaptureError> {
    if ptr.is_null() {
        return Err(CaptureError::StreamOpenFailed("GetMixFormat returned null".into()));
    }
    let cb_size = std::ptr::addr_of!((*ptr).cbSize).read_unaligned() as usize;
    let bytes = std::slice::from_raw_parts(ptr as *const u8, FORMAT_FIXED_SIZE + cb_size);
    AudioFormat::from_format_block(bytes)
}

/// Capture thread body.
///
/// Sequence:
/// 1. Join the MTA
/// 2. Reopen the endpoint by ID and activate `IAudioClient`
/// 3. Initialize in shared mode with the negotiated format
/// 4. Get `IAudioCaptureClient`, start, report readiness
/// 5. Poll for packets until stopped or the callback breaks
fn capture_thread(
    running: &AtomicBool,
    device_id: &str,
    format_block: &[u8],
    block_align: usize,
    mut callback: AudioBufferCallback,
    ready: mpsc::Sender<Result<(), CaptureError>>,
) -> Result<(), CaptureError> {
    let _com = match ComGuard::init() {
        Ok(guard) => guard,
        Err(e) => {
            let _ = ready.send(Err(CaptureError::StreamOpenFailed(e.to_string())));
            return Ok(());
        }
    };

    let (audio_client, capture_client) = match unsafe { start_client(device_id, format_block) } {
        Ok(clients) => clients,
        Err(e) => {
            let _ = ready.send(Err(e));
            return Ok(());
        }
    };
    let _ = ready.send(Ok(()));

    let poll_interval = Duration::from_millis((TARGET_LATENCY_MS / 2) as u64);
    let result = unsafe { poll_packets(running, &capture_client, block_align, &mut callback, poll_interval) };

    unsafe {
        let _ = audio_client.Stop();
    }
    result
}

unsafe fn start_client(
    device_id: &str,
    format_block: &[u8],
) -> Result<(IAudioClient, IAudioCaptureClient), CaptureError> {
    let enumerator: IMMDeviceEnumerator = CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
        .map_err(|e| CaptureError::StreamOpenFailed(format!("failed to create enumerator: {}", e)))?;

    let wide_id: Vec<u16> = device_id.encode_utf16().chain(std::iter::once(0)).collect();
    let device = enumerator
        .GetDevice(PCWSTR(wide_id.as_ptr()))
        .map_err(|e| CaptureError::StreamOpenFailed(format!("device disappeared: {}", e)))?;

    let audio_client: IAudioClient = device
        .Activate(CLSCTX_ALL, None)
        .map_err(|e| CaptureError::StreamOpenFailed(format!("Activate failed: {}", e)))?;

    let buffer_duration = TARGET_LATENCY_MS as i64 * REFTIMES_PER_MS;
    audio_client
        .Initialize(
            AUDCLNT_SHAREMODE_SHARED,
            AUDCLNT_STREAMFLAGS_NOPERSIST,
            buffer_duration,
            0,
            format_block.as_ptr() as *const WAVEFORMATEX,
            None,
        )
        .map_err(|e| CaptureError::StreamOpenFailed(format!("IAudioClient::Initialize failed: {}", e)))?;

    let capture_client: IAudioCaptureClient = audio_client
        .GetService()
        .map_err(|e| CaptureError::StreamOpenFailed(format!("GetService failed: {}", e)))?;

    audio_client
        .Start()
        .map_err(|e| CaptureError::StreamOpenFailed(format!("IAudioClient::Start failed: {}", e)))?;

    Ok((audio_client, capture_client))
}

unsafe fn poll_packets(
    running: &AtomicBool,
    capture_client: &IAudioCaptureClient,
    block_align: usize,
    callback: &mut AudioBufferCallback,
    poll_interval: Duration,
) -> Result<(), CaptureError> {
    let device_err = |what: &str, e: windows::core::Error| CaptureError::StreamFailed(format!("{} failed: {}", what, e));

    while running.load(Ordering::SeqCst) {
        thread::sleep(poll_interval);

        let mut packet_length = capture_client
            .GetNextPacketSize()
            .map_err(|e| device_err("GetNextPacketSize", e))?;

        while packet_length > 0 {
            let mut buffer_ptr: *mut u8 = std::ptr::null_mut();
            let mut num_frames: u32 = 0;
            let mut flags: u32 = 0;

            capture_client
                .GetBuffer(&mut buffer_ptr, &mut num_frames, &mut flags, None, None)
                .map_err(|e| device_err("GetBuffer", e))?;

            if is_discontinuity(flags) {
                log::warn!("capture buffer overrun: audio was dropped before this packet");
            }

            let mut flow = ControlFlow::Continue(());
            if num_frames > 0 && !buffer_ptr.is_null() {
                let len = num_frames as usize * block_align;
                if is_silent(flags) {
                    flow = callback(&vec![0u8; len]);
                } else {
                    flow = callback(std::slice::from_raw_parts(buffer_ptr, len));
                }
            }

            capture_client
                .ReleaseBuffer(num_frames)
                .map_err(|e| device_err("ReleaseBuffer", e))?;

            if flow.is_break() {
                log::info!("capture halted by consumer");
                return Ok(());
            }

            packet_length = capture_client
                .GetNextPacketSize()
                .map_err(|e| device_err("GetNextPacketSize", e))?;
        }
    }

    Ok(())
}
