//! kinect-recorder - capture the Kinect microphone array to a WAV file
//!
//! Resolves the Kinect endpoint, records until `s` is entered on the
//! console (or stdin closes), then finalizes the WAV header.

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::Cli;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    run(cli)
}

#[cfg(target_os = "windows")]
fn run(cli: Cli) -> Result<()> {
    use anyhow::Context;
    use kinect_capture_core::{CaptureStream, LineStopSignal, Recorder};
    use kinect_capture_windows::DeviceEnumerator;

    let enumerator = DeviceEnumerator::new().context("failed to initialize audio device enumeration")?;

    if cli.list_devices {
        for device in enumerator.list_capture_devices()? {
            let marker = if device.is_default { "*" } else { " " };
            println!("{} {}  [{}]", marker, device.name, device.id);
        }
        return Ok(());
    }

    let config = cli.recorder_config();
    let matcher_desc = config.matcher.describe();
    let recorder = Recorder::new(config)?;

    let stream = recorder
        .open_device(&enumerator)
        .with_context(|| format!("no usable capture device matching {}", matcher_desc))?;
    log::info!("using capture device {:?}", stream.device_name());

    let path = recorder.output_path();
    println!("Capturing audio to {}", path.display());
    println!("Press 's' to stop capturing.");

    let stdin = std::io::stdin();
    let mut stop = LineStopSignal::new(stdin.lock());
    let result = recorder
        .record_to(stream, &path, &mut stop)
        .with_context(|| format!("recording to {} failed", path.display()))?;

    println!(
        "Captured {} bytes ({:.1} s) to {}",
        result.bytes_captured,
        result.duration_secs,
        result.file_path.display()
    );
    if let Some(checksum) = result.checksum {
        println!("SHA-256 {}", checksum);
    }
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn run(cli: Cli) -> Result<()> {
    let _ = cli;
    anyhow::bail!("kinect-recorder needs the Windows audio stack (WASAPI); this platform is not supported")
}
