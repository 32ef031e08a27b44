//! Microphone Streamer
//!
//! Captures audio, applies gain and streams chunks to the configured sink.
//! Operator commands are read from stdin, one per line:
//! `mic`, `rec`, `play`, `start`, `stop`, `gain <position>`.
//!
//! Usage: `streamer [config.toml]`

use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mic_stream_controller::{
    audio::{CaptureSource, ToneSource},
    config::{AppConfig, SourceKind},
    controller::ControllerSettings,
    network::{Sink, TcpSink, WriterSink},
    ui::{ConsoleSurface, LogPresenter},
    Controller,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout may be the sink
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting microphone streamer");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load_or_default(config_path.as_deref())?;

    let capture = open_capture(&config)?;
    tracing::info!(
        "Capture source '{}': {} Hz, {} channel(s), {} bytes per read",
        capture.name(),
        config.audio.sample_rate,
        config.audio.channels,
        config.audio.buffer_bytes
    );

    let sink: Box<dyn Sink + Send> = if config.sink.address == "stdout" {
        Box::new(WriterSink::new(std::io::stdout(), config.sink.codec))
    } else {
        tracing::info!("Sink: tcp://{} ({:?})", config.sink.address, config.sink.codec);
        Box::new(TcpSink::new(config.sink.address.clone(), config.sink.codec))
    };

    let surface = ConsoleSurface::spawn(std::io::BufReader::new(std::io::stdin()))?;

    let mut controller = Controller::new(
        capture,
        sink,
        surface,
        LogPresenter,
        ControllerSettings::from_config(&config),
    )?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    let idle_poll = config.controller.idle_poll();

    tracing::info!("Commands: mic | rec | play | start | stop | gain <0-19>. Ctrl+C to quit");

    let mut worker = tokio::task::spawn_blocking(move || controller.run(&shutdown_flag, idle_poll));

    tokio::select! {
        result = &mut worker => {
            result??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            shutdown.store(true, Ordering::Relaxed);
            worker.await??;
        }
    }

    Ok(())
}

fn open_capture(config: &AppConfig) -> Result<Box<dyn CaptureSource + Send>> {
    let format = config.audio.format();
    match config.audio.source {
        SourceKind::Tone => Ok(Box::new(ToneSource::new(
            format,
            config.audio.tone_hz,
            config.audio.tone_amplitude,
        ))),
        #[cfg(feature = "cpal-capture")]
        SourceKind::Cpal => {
            for device in mic_stream_controller::audio::device::list_input_devices() {
                let marker = if device.is_default { " [DEFAULT]" } else { "" };
                tracing::info!(
                    "Input device: {}{} rates {:?} channels {:?}",
                    device.name,
                    marker,
                    device.sample_rates,
                    device.channels
                );
            }
            let capture = mic_stream_controller::audio::capture::CpalCapture::open(
                config.audio.device.as_deref(),
                format,
            )?;
            Ok(Box::new(capture))
        }
        #[cfg(not(feature = "cpal-capture"))]
        SourceKind::Cpal => anyhow::bail!("audio.source = \"cpal\" requires the cpal-capture feature"),
    }
}
