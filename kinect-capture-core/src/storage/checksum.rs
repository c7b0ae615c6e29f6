use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::models::error::{CaptureError, IoStage};

/// Compute the SHA-256 hex digest of a file, streaming it in chunks.
pub fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let map_err = |e: io::Error| CaptureError::file_io(IoStage::Checksum, format!("failed to read file for checksum: {}", e));

    let mut file = File::open(path).map_err(map_err)?;
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut chunk).map_err(map_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
