//! Scripted stand-ins for the OS audio layer and the output file.

use std::io::{self, Cursor, Seek, SeekFrom, Write};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::format::{AudioFormat, WAVE_FORMAT_EXTENSIBLE};
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::capture_stream::{AudioBufferCallback, CaptureStream};
use crate::traits::endpoint::{CaptureEndpoint, EndpointEnumerator};

/// 16 kHz, four channel, 32-bit float extensible format of the Kinect array.
pub(crate) fn kinect_format() -> AudioFormat {
    let mut format = AudioFormat::pcm(16000, 4, 32);
    format.format_tag = WAVE_FORMAT_EXTENSIBLE;
    format.extension = vec![0x20, 0x00, 0x0F, 0x00, 0x00, 0x00];
    format.extension.extend_from_slice(&[0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00]);
    format.extension.extend_from_slice(&[0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71]);
    format
}

// --- Streams ---

#[derive(Default)]
struct StreamShared {
    callback: Option<AudioBufferCallback>,
    running: bool,
    delivered: usize,
    start_calls: usize,
    stop_calls: usize,
}

/// Capture stream whose buffers are pushed by the test through a [`MockFeed`].
pub(crate) struct MockStream {
    name: String,
    format: AudioFormat,
    fail_start: bool,
    fail_stop: bool,
    shared: Arc<Mutex<StreamShared>>,
}

/// Test-side handle that plays the device's delivery thread.
#[derive(Clone)]
pub(crate) struct MockFeed {
    shared: Arc<Mutex<StreamShared>>,
}

impl MockStream {
    pub(crate) fn new(name: &str, format: AudioFormat) -> (Self, MockFeed) {
        let shared = Arc::new(Mutex::new(StreamShared::default()));
        let stream = Self {
            name: name.to_string(),
            format,
            fail_start: false,
            fail_stop: false,
            shared: Arc::clone(&shared),
        };
        (stream, MockFeed { shared })
    }

    pub(crate) fn with_start_failure(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Stream that halts delivery on `stop` but reports a device fault.
    pub(crate) fn with_stop_failure(mut self) -> Self {
        self.fail_stop = true;
        self
    }
}

impl CaptureStream for MockStream {
    fn format(&self) -> &AudioFormat {
        &self.format
    }

    fn device_name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), CaptureError> {
        if self.fail_start {
            return Err(CaptureError::StreamOpenFailed("IAudioClient::Start failed".into()));
        }
        let mut shared = self.shared.lock();
        shared.start_calls += 1;
        shared.callback = Some(callback);
        shared.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        // Taking the lock waits out an in-flight push.
        let mut shared = self.shared.lock();
        shared.stop_calls += 1;
        shared.running = false;
        shared.callback = None;
        if self.fail_stop {
            return Err(CaptureError::StreamFailed("device removed during capture".into()));
        }
        Ok(())
    }
}

impl MockFeed {
    /// Deliver one buffer. Returns false if the stream was not running.
    pub(crate) fn push(&self, buffer: &[u8]) -> bool {
        let mut shared = self.shared.lock();
        if !shared.running {
            return false;
        }
        let Some(callback) = shared.callback.as_mut() else {
            return false;
        };
        let flow = callback(buffer);
        shared.delivered += 1;
        if let ControlFlow::Break(()) = flow {
            shared.running = false;
            shared.callback = None;
        }
        true
    }

    pub(crate) fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    pub(crate) fn delivered(&self) -> usize {
        self.shared.lock().delivered
    }

    pub(crate) fn start_calls(&self) -> usize {
        self.shared.lock().start_calls
    }

    pub(crate) fn stop_calls(&self) -> usize {
        self.shared.lock().stop_calls
    }
}

// --- Endpoints ---

#[derive(Debug, Default)]
struct HandleTracker {
    live: AtomicUsize,
    names_read: AtomicUsize,
}

/// Endpoint handle; tracked handles count themselves live until dropped.
#[derive(Debug)]
pub(crate) struct MockEndpoint {
    pub(crate) id: String,
    pub(crate) name: Option<String>,
    open_fails: bool,
    tracker: Option<Arc<HandleTracker>>,
}

impl MockEndpoint {
    pub(crate) fn named(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: Some(name.to_string()),
            open_fails: false,
            tracker: None,
        }
    }

    pub(crate) fn unnamed(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            open_fails: false,
            tracker: None,
        }
    }

    pub(crate) fn with_open_failure(mut self) -> Self {
        self.open_fails = true;
        self
    }
}

impl Drop for MockEndpoint {
    fn drop(&mut self) {
        if let Some(ref tracker) = self.tracker {
            tracker.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl CaptureEndpoint for MockEndpoint {
    type Stream = MockStream;

    fn id(&self) -> Result<String, CaptureError> {
        Ok(self.id.clone())
    }

    fn friendly_name(&self) -> Result<String, CaptureError> {
        if let Some(ref tracker) = self.tracker {
            tracker.names_read.fetch_add(1, Ordering::SeqCst);
        }
        self.name
            .clone()
            .ok_or_else(|| CaptureError::EnumerationFailed("friendly name unreadable".into()))
    }

    fn open_stream(&self) -> Result<MockStream, CaptureError> {
        if self.open_fails {
            return Err(CaptureError::StreamOpenFailed("Activate failed".into()));
        }
        let name = self.name.clone().unwrap_or_else(|| self.id.clone());
        Ok(MockStream::new(&name, kinect_format()).0)
    }
}

/// Scripted endpoint list; yields fresh tracked handles on every call.
pub(crate) struct MockEnumerator {
    items: Vec<Result<MockEndpoint, CaptureError>>,
    failure: Option<String>,
    tracker: Arc<HandleTracker>,
}

pub(crate) struct MockEndpoints {
    items: std::vec::IntoIter<Result<(String, Option<String>, bool), CaptureError>>,
    tracker: Arc<HandleTracker>,
}

impl Iterator for MockEndpoints {
    type Item = Result<MockEndpoint, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.items.next()?;
        Some(item.map(|(id, name, open_fails)| {
            self.tracker.live.fetch_add(1, Ordering::SeqCst);
            MockEndpoint {
                id,
                name,
                open_fails,
                tracker: Some(Arc::clone(&self.tracker)),
            }
        }))
    }
}

impl MockEnumerator {
    pub(crate) fn new(items: Vec<Result<MockEndpoint, CaptureError>>) -> Self {
        Self {
            items,
            failure: None,
            tracker: Arc::new(HandleTracker::default()),
        }
    }

    /// Endpoints named `names`, with ids `endpoint-<position>`.
    pub(crate) fn with_names(names: &[&str]) -> Self {
        Self::new(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| Ok(MockEndpoint::named(&format!("endpoint-{}", i), name)))
                .collect(),
        )
    }

    pub(crate) fn failing(message: &str) -> Self {
        let mut enumerator = Self::new(Vec::new());
        enumerator.failure = Some(message.to_string());
        enumerator
    }

    pub(crate) fn live_handles(&self) -> usize {
        self.tracker.live.load(Ordering::SeqCst)
    }

    pub(crate) fn names_read(&self) -> usize {
        self.tracker.names_read.load(Ordering::SeqCst)
    }
}

impl EndpointEnumerator for MockEnumerator {
    type Endpoint = MockEndpoint;
    type Endpoints = MockEndpoints;

    fn active_capture_endpoints(&self) -> Result<MockEndpoints, CaptureError> {
        if let Some(ref message) = self.failure {
            return Err(CaptureError::EnumerationFailed(message.clone()));
        }
        let items: Vec<_> = self
            .items
            .iter()
            .map(|item| match item {
                Ok(e) => Ok((e.id.clone(), e.name.clone(), e.open_fails)),
                Err(e) => Err(e.clone()),
            })
            .collect();
        Ok(MockEndpoints {
            items: items.into_iter(),
            tracker: Arc::clone(&self.tracker),
        })
    }
}

// --- Output ---

struct SinkShared {
    cursor: Cursor<Vec<u8>>,
    writes: usize,
    fail_on_write: Option<usize>,
    fail_seek: bool,
}

/// In-memory `Write + Seek` output whose contents outlive the session.
///
/// Clones share the same buffer. Faults can be scripted on the n-th
/// `write` call (1-based) or on every seek.
#[derive(Clone)]
pub(crate) struct MemorySink {
    shared: Arc<Mutex<SinkShared>>,
}

impl MemorySink {
    pub(crate) fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(SinkShared {
                cursor: Cursor::new(Vec::new()),
                writes: 0,
                fail_on_write: None,
                fail_seek: false,
            })),
        }
    }

    pub(crate) fn failing_on_write(n: usize) -> Self {
        let sink = Self::new();
        sink.shared.lock().fail_on_write = Some(n);
        sink
    }

    pub(crate) fn failing_seek() -> Self {
        let sink = Self::new();
        sink.shared.lock().fail_seek = true;
        sink
    }

    /// Fail every seek from now on.
    pub(crate) fn fail_seeks(&self) {
        self.shared.lock().fail_seek = true;
    }

    pub(crate) fn contents(&self) -> Vec<u8> {
        self.shared.lock().cursor.get_ref().clone()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut shared = self.shared.lock();
        shared.writes += 1;
        if shared.fail_on_write == Some(shared.writes) {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated disk full"));
        }
        shared.cursor.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemorySink {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let mut shared = self.shared.lock();
        if shared.fail_seek {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated seek failure"));
        }
        shared.cursor.seek(pos)
    }
}

// --- Delegate ---

#[derive(Default)]
pub(crate) struct RecordingDelegate {
    states: Mutex<Vec<CaptureState>>,
    errors: Mutex<Vec<CaptureError>>,
    finished: Mutex<Vec<RecordingResult>>,
}

impl RecordingDelegate {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn states(&self) -> Vec<CaptureState> {
        self.states.lock().clone()
    }

    pub(crate) fn errors(&self) -> Vec<CaptureError> {
        self.errors.lock().clone()
    }

    pub(crate) fn finished(&self) -> Vec<RecordingResult> {
        self.finished.lock().clone()
    }
}

impl CaptureDelegate for RecordingDelegate {
    fn on_state_changed(&self, state: CaptureState) {
        self.states.lock().push(state);
    }

    fn on_error(&self, error: &CaptureError) {
        self.errors.lock().push(error.clone());
    }

    fn on_capture_finished(&self, result: &RecordingResult) {
        self.finished.lock().push(result.clone());
    }
}
