use std::io::BufRead;

use crate::models::error::CaptureError;
use crate::traits::stop_signal::StopSignal;

/// Console stop trigger: returns once a line starting with the stop key
/// (case-insensitive) is read, or when input is closed.
pub struct LineStopSignal<R: BufRead> {
    reader: R,
    key: char,
}

impl<R: BufRead> LineStopSignal<R> {
    /// Stop on `s` / `S`.
    pub fn new(reader: R) -> Self {
        Self::with_key(reader, 's')
    }

    pub fn with_key(reader: R, key: char) -> Self {
        Self { reader, key }
    }

    pub fn key(&self) -> char {
        self.key
    }
}

impl<R: BufRead> StopSignal for LineStopSignal<R> {
    fn wait(&mut self) -> Result<(), CaptureError> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .reader
                .read_line(&mut line)
                .map_err(|e| CaptureError::StopSignalFailed(format!("failed to read input: {}", e)))?;
            if n == 0 {
                log::info!("input closed, stopping capture");
                return Ok(());
            }

            let pressed = line.trim_start().chars().next();
            if pressed.is_some_and(|c| c.eq_ignore_ascii_case(&self.key)) {
                return Ok(());
            }
            log::debug!("ignoring input {:?}", line.trim_end());
        }
    }
}
