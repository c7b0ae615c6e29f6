use std::io::{Seek, Write};
use std::ops::ControlFlow;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::format::AudioFormat;
use crate::models::state::CaptureState;
use crate::storage::wave_writer::WaveFileWriter;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::capture_stream::{AudioBufferCallback, CaptureStream};
use crate::traits::endpoint::CaptureEndpoint;

/// Output side of a session, shared with the delivery callback.
///
/// The mutex serializes buffer writes against each other and against
/// finalization: once `stop` has taken the writer, a late callback finds
/// `None` and halts.
struct SinkState<W: Write + Seek> {
    writer: Option<WaveFileWriter<W>>,
    failure: Option<CaptureError>,
}

/// What a finished capture produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSummary {
    pub device_name: String,
    pub format: AudioFormat,
    pub bytes_captured: u64,
    pub header_len: u64,
}

/// Binds one capture stream to one WAV output.
///
/// Data flow:
/// ```text
/// [CaptureStream] → callback → [Mutex<WaveFileWriter>] → output
/// ```
///
/// `start` writes a placeholder header and starts the stream; every buffer
/// the device delivers is appended as-is; `stop` halts the stream, then
/// rewrites the header with the final payload size.
pub struct CaptureSession<S: CaptureStream, W: Write + Seek + Send + 'static> {
    stream: S,
    format: AudioFormat,
    state: CaptureState,
    sink: Arc<Mutex<SinkState<W>>>,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    bytes_captured: u64,
}

impl<S: CaptureStream, W: Write + Seek + Send + 'static> CaptureSession<S, W> {
    /// Open a capture stream on `endpoint` and wrap it in a new session.
    pub fn open<E>(endpoint: &E) -> Result<Self, CaptureError>
    where
        E: CaptureEndpoint<Stream = S>,
    {
        Self::from_stream(endpoint.open_stream()?)
    }

    /// Wrap an already opened stream.
    pub fn from_stream(stream: S) -> Result<Self, CaptureError> {
        let format = stream.format().clone();
        format.validate()?;

        log::debug!(
            "capture session for {:?}: {} Hz, {} ch, {} bit {}",
            stream.device_name(),
            format.sample_rate,
            format.channels,
            format.bits_per_sample,
            format.encoding_name()
        );

        Ok(Self {
            stream,
            format,
            state: CaptureState::Created,
            sink: Arc::new(Mutex::new(SinkState {
                writer: None,
                failure: None,
            })),
            delegate: None,
            bytes_captured: 0,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Format of the captured audio, fixed for the session's lifetime.
    pub fn output_format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn device_name(&self) -> &str {
        self.stream.device_name()
    }

    /// Payload bytes written so far (final once stopped).
    pub fn bytes_captured(&self) -> u64 {
        match self.sink.lock().writer.as_ref() {
            Some(writer) => writer.data_bytes(),
            None => self.bytes_captured,
        }
    }

    /// The mid-stream fault that halted delivery, if any.
    pub fn failure(&self) -> Option<CaptureError> {
        self.sink.lock().failure.clone()
    }

    /// Write the placeholder header to `output` and start streaming into it.
    /// Transitions: created → started.
    ///
    /// If the header cannot be written the stream is never started and the
    /// session stays `Created`.
    pub fn start(&mut self, output: W) -> Result<(), CaptureError> {
        if !self.state.is_created() {
            return Err(CaptureError::SessionStateViolation(format!(
                "start called in {} state",
                self.state.as_str()
            )));
        }

        let writer = WaveFileWriter::new(output, self.format.clone())?;
        {
            let mut sink = self.sink.lock();
            sink.writer = Some(writer);
            sink.failure = None;
        }

        let callback = Self::delivery_callback(Arc::clone(&self.sink), self.delegate.clone());
        if let Err(e) = self.stream.start(callback) {
            self.sink.lock().writer = None;
            return Err(e);
        }

        log::info!("capture started on {:?}", self.stream.device_name());
        self.set_state(CaptureState::Started);
        Ok(())
    }

    /// Halt the stream and finalize the output header.
    /// Transitions: started → stopped.
    ///
    /// Errors, most severe first: a finalize failure (file keeps its
    /// placeholder header), then a mid-stream write failure (header declares
    /// only the intact buffers), then a failure to stop the stream.
    pub fn stop(&mut self) -> Result<CaptureSummary, CaptureError> {
        if !self.state.is_started() {
            return Err(CaptureError::SessionStateViolation(format!(
                "stop called in {} state",
                self.state.as_str()
            )));
        }

        let stream_result = self.stream.stop();
        self.set_state(CaptureState::Stopped);

        let (writer, failure) = {
            let mut sink = self.sink.lock();
            (sink.writer.take(), sink.failure.take())
        };
        let writer = writer
            .ok_or_else(|| CaptureError::SessionStateViolation("session has no output".into()))?;

        self.bytes_captured = writer.data_bytes();
        let header_len = writer.header_len();

        writer.finalize()?;
        log::info!(
            "capture finalized: {} payload bytes from {:?}",
            self.bytes_captured,
            self.stream.device_name()
        );

        if let Some(failure) = failure {
            return Err(failure);
        }
        stream_result?;

        Ok(CaptureSummary {
            device_name: self.stream.device_name().to_string(),
            format: self.format.clone(),
            bytes_captured: self.bytes_captured,
            header_len,
        })
    }

    // --- Internal helpers ---

    fn set_state(&mut self, new_state: CaptureState) {
        self.state = new_state;
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(new_state);
        }
    }

    fn delivery_callback(
        sink: Arc<Mutex<SinkState<W>>>,
        delegate: Option<Arc<dyn CaptureDelegate>>,
    ) -> AudioBufferCallback {
        Box::new(move |buffer: &[u8]| {
            let mut guard = sink.lock();
            let SinkState { writer, failure } = &mut *guard;

            if failure.is_some() {
                return ControlFlow::Break(());
            }
            let Some(writer) = writer.as_mut() else {
                return ControlFlow::Break(());
            };

            match writer.write_buffer(buffer) {
                Ok(()) => ControlFlow::Continue(()),
                Err(e) => {
                    log::error!("Failed to write audio data: {}", e);
                    if let Some(ref d) = delegate {
                        d.on_error(&e);
                    }
                    *failure = Some(e);
                    ControlFlow::Break(())
                }
            }
        })
    }
}

impl<S: CaptureStream, W: Write + Seek + Send + 'static> Drop for CaptureSession<S, W> {
    fn drop(&mut self) {
        if self.state.is_started() {
            log::warn!("capture session dropped while running; finalizing");
            if let Err(e) = self.stop() {
                log::error!("finalizing dropped session failed: {}", e);
            }
        }
    }
}
