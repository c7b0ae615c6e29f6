use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveTime;

use crate::device::resolver;
use crate::models::config::RecorderConfig;
use crate::models::error::{CaptureError, IoStage};
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::session::capture::CaptureSession;
use crate::storage::{checksum, metadata};
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::capture_stream::CaptureStream;
use crate::traits::endpoint::{CaptureEndpoint, EndpointEnumerator};
use crate::traits::stop_signal::StopSignal;

type EndpointStream<E> = <<E as EndpointEnumerator>::Endpoint as CaptureEndpoint>::Stream;

/// Records one capture stream to a timestamped WAV file.
///
/// Sequence for [`record_to`](Self::record_to):
/// 1. Create the output directory and file
/// 2. Start a [`CaptureSession`] (placeholder header, stream on)
/// 3. Block on the stop signal
/// 4. Stop the session (stream off, header finalized)
/// 5. Checksum + JSON sidecar, both best-effort
pub struct Recorder {
    config: RecorderConfig,
    delegate: Option<Arc<dyn CaptureDelegate>>,
}

impl Recorder {
    pub fn new(config: RecorderConfig) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(Self {
            config,
            delegate: None,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Resolve the configured device and open a stream on it.
    ///
    /// Nothing is written to disk here, so a missing or unusable device
    /// aborts before any file exists.
    pub fn open_device<E: EndpointEnumerator>(&self, enumerator: &E) -> Result<EndpointStream<E>, CaptureError> {
        let endpoint = resolver::resolve_device(enumerator, &self.config.matcher)?;
        endpoint.open_stream()
    }

    /// Output path for a recording started at `time`:
    /// `<output_directory>/<prefix>-HH-MM-SS.wav`.
    pub fn output_path_at(&self, time: NaiveTime) -> PathBuf {
        self.config.output_directory.join(format!(
            "{}-{}.wav",
            self.config.file_prefix,
            time.format("%H-%M-%S")
        ))
    }

    /// Output path for a recording started now (local time).
    pub fn output_path(&self) -> PathBuf {
        self.output_path_at(chrono::Local::now().time())
    }

    /// Record `stream` to a file named after the current time.
    pub fn record<S, T>(&self, stream: S, stop: &mut T) -> Result<RecordingResult, CaptureError>
    where
        S: CaptureStream,
        T: StopSignal + ?Sized,
    {
        let path = self.output_path();
        self.record_to(stream, &path, stop)
    }

    /// Record `stream` to `path` until `stop` fires.
    pub fn record_to<S, T>(&self, stream: S, path: &Path, stop: &mut T) -> Result<RecordingResult, CaptureError>
    where
        S: CaptureStream,
        T: StopSignal + ?Sized,
    {
        let mut session: CaptureSession<S, File> = CaptureSession::from_stream(stream)?;
        if let Some(ref delegate) = self.delegate {
            session.set_delegate(Arc::clone(delegate));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::file_io(IoStage::Create, format!("failed to create directory: {}", e)))?;
        }
        let file = File::create(path)
            .map_err(|e| CaptureError::file_io(IoStage::Create, format!("failed to create file: {}", e)))?;

        if let Err(e) = session.start(file) {
            // Nothing was captured; do not leave a stub behind.
            if let Err(remove_err) = fs::remove_file(path) {
                log::warn!("failed to remove {}: {}", path.display(), remove_err);
            }
            return Err(e);
        }
        log::info!("Capturing audio data to file {}", path.display());

        let wait_result = stop.wait();
        let summary = session.stop()?;
        wait_result?;

        let checksum = if self.config.compute_checksum {
            match checksum::sha256_file(path) {
                Ok(sum) => Some(sum),
                Err(e) => {
                    log::warn!("{}", e);
                    None
                }
            }
        } else {
            None
        };

        let metadata = RecordingMetadata::new(
            &summary.device_name,
            &path.to_string_lossy(),
            &summary.format,
            summary.bytes_captured,
            checksum.clone(),
        );
        if self.config.write_metadata {
            if let Err(e) = metadata::write_metadata(&metadata, path) {
                log::warn!("{}", e);
            }
        }

        let result = RecordingResult {
            file_path: path.to_path_buf(),
            duration_secs: metadata.duration_secs,
            bytes_captured: summary.bytes_captured,
            metadata,
            checksum,
        };

        if let Some(ref delegate) = self.delegate {
            delegate.on_capture_finished(&result);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::matcher::DeviceMatcher;
    use crate::models::state::CaptureState;
    use crate::processing::wav_format::parse_wav_header;
    use crate::storage::metadata::{metadata_path, read_metadata};
    use crate::test_support::{kinect_format, MockEnumerator, MockFeed, MockStream, RecordingDelegate};
    use approx::assert_relative_eq;

    /// Stop signal that plays buffers through the feed before returning.
    struct ScriptedStop {
        feed: MockFeed,
        buffers: Vec<Vec<u8>>,
        result: Result<(), CaptureError>,
    }

    impl StopSignal for ScriptedStop {
        fn wait(&mut self) -> Result<(), CaptureError> {
            for buffer in &self.buffers {
                self.feed.push(buffer);
            }
            self.result.clone()
        }
    }

    fn recorder_in(dir: &Path) -> Recorder {
        Recorder::new(RecorderConfig {
            output_directory: dir.to_path_buf(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn output_path_uses_prefix_and_time() {
        let recorder = recorder_in(Path::new("/music"));
        let time = NaiveTime::from_hms_opt(17, 5, 9).unwrap();
        assert_eq!(
            recorder.output_path_at(time),
            Path::new("/music/KinectAudio-17-05-09.wav")
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = RecorderConfig {
            file_prefix: String::new(),
            ..Default::default()
        };
        assert!(matches!(Recorder::new(config), Err(CaptureError::ConfigurationFailed(_))));
    }

    #[test]
    fn records_file_with_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = recorder_in(dir.path());
        let delegate = RecordingDelegate::new();
        recorder.set_delegate(delegate.clone());

        let (stream, feed) = MockStream::new("Microphone Array (Xbox NUI Sensor)", kinect_format());
        let mut stop = ScriptedStop {
            feed: feed.clone(),
            buffers: vec![vec![1u8; 1024], vec![2u8; 1024], vec![3u8; 512]],
            result: Ok(()),
        };

        let path = dir.path().join("nested").join("take.wav");
        let result = recorder.record_to(stream, &path, &mut stop).unwrap();

        assert_eq!(result.bytes_captured, 2560);
        assert_relative_eq!(result.duration_secs, 2560.0 / 256_000.0);
        assert!(result.checksum.is_some());

        let bytes = fs::read(&path).unwrap();
        let info = parse_wav_header(&bytes).unwrap();
        assert_eq!(info.data_size, 2560);
        assert_eq!(info.format, kinect_format());
        assert_eq!(bytes.len(), info.data_offset + 2560);

        let sidecar = read_metadata(&path).unwrap();
        assert_eq!(sidecar.device_name, "Microphone Array (Xbox NUI Sensor)");
        assert_eq!(sidecar.data_bytes, 2560);
        assert_eq!(sidecar.checksum, result.checksum);

        assert_eq!(delegate.states(), vec![CaptureState::Started, CaptureState::Stopped]);
        assert_eq!(delegate.finished().len(), 1);
        assert!(!feed.is_running());
    }

    #[test]
    fn sidecar_and_checksum_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(RecorderConfig {
            output_directory: dir.path().to_path_buf(),
            compute_checksum: false,
            write_metadata: false,
            ..Default::default()
        })
        .unwrap();

        let (stream, feed) = MockStream::new("Kinect", kinect_format());
        let mut stop = ScriptedStop {
            feed,
            buffers: vec![vec![0u8; 16]],
            result: Ok(()),
        };
        let path = dir.path().join("plain.wav");
        let result = recorder.record_to(stream, &path, &mut stop).unwrap();

        assert_eq!(result.checksum, None);
        assert!(!metadata_path(&path).exists());
    }

    #[test]
    fn stop_signal_failure_still_finalizes() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder_in(dir.path());
        let (stream, feed) = MockStream::new("Kinect", kinect_format());
        let mut stop = ScriptedStop {
            feed,
            buffers: vec![vec![4u8; 40]],
            result: Err(CaptureError::StopSignalFailed("console gone".into())),
        };
        let path = dir.path().join("interrupted.wav");

        let err = recorder.record_to(stream, &path, &mut stop).unwrap_err();
        assert!(matches!(err, CaptureError::StopSignalFailed(_)));
        let info = parse_wav_header(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(info.data_size, 40);
    }

    #[test]
    fn stream_start_failure_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder_in(dir.path());
        let (stream, feed) = MockStream::new("Kinect", kinect_format());
        let mut stop = ScriptedStop {
            feed,
            buffers: Vec::new(),
            result: Ok(()),
        };
        let path = dir.path().join("never.wav");

        let err = recorder
            .record_to(stream.with_start_failure(), &path, &mut stop)
            .unwrap_err();
        assert!(matches!(err, CaptureError::StreamOpenFailed(_)));
        assert!(!path.exists());
    }

    #[test]
    fn unwritable_directory_is_a_create_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let recorder = recorder_in(dir.path());
        let (stream, feed) = MockStream::new("Kinect", kinect_format());
        let mut stop = ScriptedStop {
            feed,
            buffers: Vec::new(),
            result: Ok(()),
        };
        let err = recorder
            .record_to(stream, &blocker.join("take.wav"), &mut stop)
            .unwrap_err();
        assert_eq!(err.io_stage(), Some(IoStage::Create));
    }

    #[test]
    fn open_device_resolves_configured_match() {
        let recorder = recorder_in(Path::new("."));
        let enumerator = MockEnumerator::with_names(&["Speakers", "Microphone Array (Xbox NUI Sensor)"]);
        let stream = recorder.open_device(&enumerator).unwrap();
        assert_eq!(stream.device_name(), "Microphone Array (Xbox NUI Sensor)");
        assert_eq!(enumerator.live_handles(), 0);
    }

    #[test]
    fn open_device_reports_missing_device() {
        let recorder = Recorder::new(RecorderConfig {
            matcher: DeviceMatcher::kinect(),
            ..Default::default()
        })
        .unwrap();
        let enumerator = MockEnumerator::with_names(&["Speakers"]);
        assert!(matches!(
            recorder.open_device(&enumerator),
            Err(CaptureError::DeviceNotFound)
        ));
    }
}
