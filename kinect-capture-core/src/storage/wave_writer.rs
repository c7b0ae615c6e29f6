use std::io::{Seek, SeekFrom, Write};

use crate::models::error::{CaptureError, IoStage};
use crate::models::format::AudioFormat;
use crate::processing::wav_format;

/// Streaming WAV writer for payloads of unknown length.
///
/// ## File lifecycle
///
/// ```text
/// new()          [header, data_size = 0]
/// write_buffer() [header, data_size = 0] [payload...]
/// finalize()     [header, data_size = N] [payload...]
/// ```
///
/// The header is rewritten in place on finalize; payload bytes are never
/// touched again once appended.
pub struct WaveFileWriter<W: Write + Seek> {
    inner: W,
    format: AudioFormat,
    header_len: u64,
    data_bytes: u64,
}

impl<W: Write + Seek> WaveFileWriter<W> {
    /// Write the placeholder header to `inner` (positioned at its start).
    pub fn new(mut inner: W, format: AudioFormat) -> Result<Self, CaptureError> {
        let header = wav_format::build_wav_header(&format, 0);
        inner
            .write_all(&header)
            .and_then(|_| inner.flush())
            .map_err(|e| CaptureError::file_io(IoStage::Header, e))?;

        Ok(Self {
            inner,
            format,
            header_len: header.len() as u64,
            data_bytes: 0,
        })
    }

    /// Append one buffer of payload verbatim.
    ///
    /// The byte count only grows when the whole buffer was written.
    pub fn write_buffer(&mut self, buffer: &[u8]) -> Result<(), CaptureError> {
        let new_total = self.data_bytes + buffer.len() as u64;
        if new_total > wav_format::max_data_size(&self.format) {
            return Err(CaptureError::file_io(
                IoStage::Payload,
                format!("payload of {} bytes exceeds the RIFF size limit", new_total),
            ));
        }

        self.inner
            .write_all(buffer)
            .map_err(|e| CaptureError::file_io(IoStage::Payload, format!("write failed: {}", e)))?;
        self.data_bytes = new_total;
        Ok(())
    }

    /// Rewrite the header with the final payload size and hand back the sink.
    pub fn finalize(mut self) -> Result<W, CaptureError> {
        let header = wav_format::build_wav_header(&self.format, self.data_bytes as u32);

        self.inner
            .seek(SeekFrom::Start(0))
            .map_err(|e| CaptureError::file_io(IoStage::Finalize, format!("seek failed: {}", e)))?;
        self.inner
            .write_all(&header)
            .map_err(|e| CaptureError::file_io(IoStage::Finalize, format!("header rewrite failed: {}", e)))?;
        self.inner
            .seek(SeekFrom::End(0))
            .and_then(|_| self.inner.flush())
            .map_err(|e| CaptureError::file_io(IoStage::Finalize, e))?;

        Ok(self.inner)
    }

    /// Payload bytes written so far.
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    pub fn header_len(&self) -> u64 {
        self.header_len
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }
}
