//! WAV file format utilities.
//!
//! Builds RIFF WAVE headers for any [`AudioFormat`], including formats that
//! carry an extension block, and reads them back.
//!
//! Layout (all integers little-endian):
//! ```text
//! [0-3]     "RIFF"
//! [4-7]     header_len - 8 + data_size
//! [8-11]    "WAVE"
//! [12-15]   "fmt "
//! [16-19]   18 + extension length
//! [20-..]   format block (tag, channels, rate, byte rate, block align,
//!           bits, extension size, extension bytes)
//! [..+4]    "data"
//! [..+4]    data_size
//! ```

use crate::models::error::{CaptureError, IoStage};
use crate::models::format::AudioFormat;

/// Bytes before the format block: "RIFF", size, "WAVE", "fmt ", fmt size.
pub const RIFF_PREAMBLE_SIZE: usize = 20;

/// Bytes after the format block: "data" and the data size.
pub const DATA_CHUNK_HEADER_SIZE: usize = 8;

/// Total header length for `format`.
pub fn header_len(format: &AudioFormat) -> usize {
    RIFF_PREAMBLE_SIZE + format.format_block_len() + DATA_CHUNK_HEADER_SIZE
}

/// Largest payload a header for `format` can declare.
pub fn max_data_size(format: &AudioFormat) -> u64 {
    u32::MAX as u64 - (header_len(format) as u64 - 8)
}

/// Build a complete WAV header declaring `data_size` payload bytes.
///
/// Pure: the same inputs always produce the same bytes, so the placeholder
/// and final headers of one recording differ only in the two size fields.
pub fn build_wav_header(format: &AudioFormat, data_size: u32) -> Vec<u8> {
    let total = header_len(format);
    let riff_size = (total as u32 - 8).wrapping_add(data_size);
    let fmt_size = format.format_block_len() as u32;

    let mut header = Vec::with_capacity(total);

    // RIFF chunk descriptor
    header.extend_from_slice(b"RIFF");
    header.extend_from_slice(&riff_size.to_le_bytes());
    header.extend_from_slice(b"WAVE");

    // fmt sub-chunk
    header.extend_from_slice(b"fmt ");
    header.extend_from_slice(&fmt_size.to_le_bytes());
    header.extend_from_slice(&format.to_format_block());

    // data sub-chunk
    header.extend_from_slice(b"data");
    header.extend_from_slice(&data_size.to_le_bytes());

    debug_assert_eq!(header.len(), total);
    header
}

/// Fields decoded from an on-disk WAV header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavHeaderInfo {
    pub riff_size: u32,
    pub format: AudioFormat,
    pub data_size: u32,
    /// Offset of the first payload byte.
    pub data_offset: usize,
}

/// Decode a header written by [`build_wav_header`].
///
/// Expects the `data` chunk to follow `fmt ` directly, which is always the
/// case for files this crate writes.
pub fn parse_wav_header(bytes: &[u8]) -> Result<WavHeaderInfo, CaptureError> {
    let bad = |what: &str| CaptureError::file_io(IoStage::Header, format!("invalid WAV header: {}", what));
    let u32_at = |at: usize| -> Result<u32, CaptureError> {
        bytes
            .get(at..at + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| bad("truncated"))
    };

    if bytes.len() < RIFF_PREAMBLE_SIZE {
        return Err(bad("truncated"));
    }
    if &bytes[0..4] != b"RIFF" {
        return Err(bad("missing RIFF tag"));
    }
    if &bytes[8..12] != b"WAVE" {
        return Err(bad("missing WAVE tag"));
    }
    if &bytes[12..16] != b"fmt " {
        return Err(bad("missing fmt tag"));
    }

    let riff_size = u32_at(4)?;
    let fmt_size = u32_at(16)? as usize;
    let fmt_end = RIFF_PREAMBLE_SIZE + fmt_size;
    let block = bytes.get(RIFF_PREAMBLE_SIZE..fmt_end).ok_or_else(|| bad("truncated fmt chunk"))?;
    let format = AudioFormat::from_format_block(block).map_err(|_| bad("malformed fmt chunk"))?;

    if bytes.get(fmt_end..fmt_end + 4) != Some(&b"data"[..]) {
        return Err(bad("missing data tag"));
    }
    let data_size = u32_at(fmt_end + 4)?;

    Ok(WavHeaderInfo {
        riff_size,
        format,
        data_size,
        data_offset: fmt_end + DATA_CHUNK_HEADER_SIZE,
    })
}
