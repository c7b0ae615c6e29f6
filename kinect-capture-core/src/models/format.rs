use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// PCM integer samples.
pub const WAVE_FORMAT_PCM: u16 = 0x0001;
/// 32-bit IEEE float samples (the usual WASAPI shared-mode mix format).
pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
/// Format described by a 22-byte extension block (sub-format GUID etc.).
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Size of the fixed format descriptor, up to and including the
/// extension-size field.
pub const FORMAT_FIXED_SIZE: usize = 18;

/// Sample encoding negotiated with a capture device.
///
/// Field layout follows the on-disk `fmt ` block. `extension` holds the
/// bytes that follow the extension-size field; its length is what gets
/// written into that field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<u8>,
}

impl AudioFormat {
    /// Plain integer PCM with derived byte rate and block align.
    pub fn pcm(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        let block_align = channels * (bits_per_sample / 8);
        Self {
            format_tag: WAVE_FORMAT_PCM,
            channels,
            sample_rate,
            avg_bytes_per_sec: sample_rate * block_align as u32,
            block_align,
            bits_per_sample,
            extension: Vec::new(),
        }
    }

    /// Length of the `fmt ` block body: fixed descriptor plus extension.
    pub fn format_block_len(&self) -> usize {
        FORMAT_FIXED_SIZE + self.extension.len()
    }

    /// Serialize the `fmt ` block body (little-endian).
    pub fn to_format_block(&self) -> Vec<u8> {
        let mut block = Vec::with_capacity(self.format_block_len());
        block.extend_from_slice(&self.format_tag.to_le_bytes());
        block.extend_from_slice(&self.channels.to_le_bytes());
        block.extend_from_slice(&self.sample_rate.to_le_bytes());
        block.extend_from_slice(&self.avg_bytes_per_sec.to_le_bytes());
        block.extend_from_slice(&self.block_align.to_le_bytes());
        block.extend_from_slice(&self.bits_per_sample.to_le_bytes());
        block.extend_from_slice(&(self.extension.len() as u16).to_le_bytes());
        block.extend_from_slice(&self.extension);
        block
    }

    /// Parse a `fmt ` block body, as produced by [`to_format_block`] or
    /// handed back by the OS audio layer.
    ///
    /// A bare 16-byte block (no extension-size field) is accepted as PCM
    /// with no extension.
    ///
    /// [`to_format_block`]: Self::to_format_block
    pub fn from_format_block(block: &[u8]) -> Result<Self, CaptureError> {
        if block.len() < 16 {
            return Err(CaptureError::StreamOpenFailed(format!(
                "format block too short: {} bytes",
                block.len()
            )));
        }

        let u16_at = |at: usize| u16::from_le_bytes([block[at], block[at + 1]]);
        let u32_at =
            |at: usize| u32::from_le_bytes([block[at], block[at + 1], block[at + 2], block[at + 3]]);

        let extension = if block.len() >= FORMAT_FIXED_SIZE {
            let ext_len = u16_at(16) as usize;
            let ext = block.get(FORMAT_FIXED_SIZE..FORMAT_FIXED_SIZE + ext_len).ok_or_else(|| {
                CaptureError::StreamOpenFailed(format!(
                    "format extension truncated: declared {} bytes, have {}",
                    ext_len,
                    block.len() - FORMAT_FIXED_SIZE
                ))
            })?;
            ext.to_vec()
        } else {
            Vec::new()
        };

        Ok(Self {
            format_tag: u16_at(0),
            channels: u16_at(2),
            sample_rate: u32_at(4),
            avg_bytes_per_sec: u32_at(8),
            block_align: u16_at(12),
            bits_per_sample: u16_at(14),
            extension,
        })
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.channels == 0 {
            return Err(CaptureError::StreamOpenFailed("channel count is zero".into()));
        }
        if self.sample_rate == 0 {
            return Err(CaptureError::StreamOpenFailed("sample rate is zero".into()));
        }
        if self.block_align == 0 {
            return Err(CaptureError::StreamOpenFailed("block align is zero".into()));
        }
        if self.extension.len() > u16::MAX as usize {
            return Err(CaptureError::StreamOpenFailed(format!(
                "format extension too large: {} bytes",
                self.extension.len()
            )));
        }
        Ok(())
    }

    /// Seconds of audio represented by `bytes` of payload.
    pub fn duration_secs(&self, bytes: u64) -> f64 {
        if self.avg_bytes_per_sec == 0 {
            return 0.0;
        }
        bytes as f64 / self.avg_bytes_per_sec as f64
    }

    /// Human-readable encoding name, for logs and metadata.
    pub fn encoding_name(&self) -> &'static str {
        match self.format_tag {
            WAVE_FORMAT_PCM => "pcm",
            WAVE_FORMAT_IEEE_FLOAT => "ieee-float",
            WAVE_FORMAT_EXTENSIBLE => "extensible",
            _ => "unknown",
        }
    }
}
