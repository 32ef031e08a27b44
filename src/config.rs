//! Application configuration
//!
//! Loaded from a TOML file; every section falls back to defaults so a
//! partial (or missing) file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audio::capture::StreamFormat;
use crate::audio::gain::GainFactor;
use crate::constants::*;
use crate::error::{Error, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub gain: GainConfig,
    pub sink: SinkConfig,
    pub controller: ControllerConfig,
}

/// Which capture source feeds the controller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Synthetic sine tone, no hardware needed
    Tone,
    /// Host input device (requires the `cpal-capture` feature)
    Cpal,
}

/// Capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Bytes requested per capture read; must be a non-zero multiple of the sample width
    pub buffer_bytes: usize,
    pub capture_timeout_ms: u64,
    pub source: SourceKind,
    /// Input device name; `None` selects the host default
    pub device: Option<String>,
    pub tone_hz: u32,
    pub tone_amplitude: i16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            buffer_bytes: STREAM_BUFFER_BYTES,
            capture_timeout_ms: DEFAULT_CAPTURE_TIMEOUT.as_millis() as u64,
            source: SourceKind::Tone,
            device: None,
            tone_hz: 440,
            tone_amplitude: 1000,
        }
    }
}

impl AudioConfig {
    pub fn format(&self) -> StreamFormat {
        StreamFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }
}

/// Gain configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GainConfig {
    /// Starting gain; clamped into [1, MAX_GAIN]
    pub initial: i32,
}

impl Default for GainConfig {
    fn default() -> Self {
        Self {
            initial: DEFAULT_GAIN as i32,
        }
    }
}

impl GainConfig {
    pub fn factor(&self) -> GainFactor {
        GainFactor::clamped(self.initial)
    }
}

/// Wire codec used towards the sink
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SinkCodec {
    /// Length-prefixed bincode frames
    Binary,
    /// One JSON object per line
    Json,
}

/// Sink configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SinkConfig {
    /// `stdout` or a `host:port` TCP address
    pub address: String,
    pub codec: SinkCodec,
    pub recording_name: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            address: "stdout".to_string(),
            codec: SinkCodec::Json,
            recording_name: DEFAULT_RECORDING_NAME.to_string(),
        }
    }
}

/// Polling loop configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    /// Pause between ticks while nothing is streaming
    pub idle_poll_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { idle_poll_ms: 10 }
    }
}

impl ControllerConfig {
    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }
}

impl AppConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from `path` (or the default location); a missing file yields defaults.
    /// Malformed or invalid files are errors.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => return Ok(Self::default()),
        };

        match Self::load(&path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// `<config_dir>/config.toml` for this application
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "mic-stream-controller")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let audio = &self.audio;
        if audio.buffer_bytes == 0 || audio.buffer_bytes % SAMPLE_WIDTH_BYTES != 0 {
            return Err(Error::Config(format!(
                "audio.buffer_bytes must be a non-zero multiple of {}, got {}",
                SAMPLE_WIDTH_BYTES, audio.buffer_bytes
            )));
        }
        if audio.sample_rate == 0 {
            return Err(Error::Config("audio.sample_rate must be non-zero".into()));
        }
        if audio.channels == 0 {
            return Err(Error::Config("audio.channels must be non-zero".into()));
        }
        if audio.capture_timeout_ms == 0 {
            return Err(Error::Config(
                "audio.capture_timeout_ms must be non-zero".into(),
            ));
        }
        // A read must be able to fill the buffer before it times out
        let fill = audio.format().duration_of(audio.buffer_bytes / SAMPLE_WIDTH_BYTES);
        if fill > audio.capture_timeout() {
            return Err(Error::Config(format!(
                "audio.buffer_bytes = {} takes {} ms to fill, longer than audio.capture_timeout_ms = {}",
                audio.buffer_bytes,
                fill.as_millis(),
                audio.capture_timeout_ms
            )));
        }
        if self.sink.address.trim().is_empty() {
            return Err(Error::Config("sink.address must not be empty".into()));
        }
        Ok(())
    }
}
