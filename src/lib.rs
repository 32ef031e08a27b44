//! # Mic Stream Controller
//!
//! Capture-and-stream controller for a 16-bit mono microphone. Each polling
//! tick reads operator input from a control surface, updates the mode/gain
//! state and, while a session is open, forwards one amplified buffer to a
//! remote sink as an ordered chunk.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                        Controller::tick()                            │
//! │                                                                      │
//! │  ┌──────────────────┐  commands  ┌──────────────────┐                │
//! │  │ Control Surface  │──────────▶│  Session Manager │  open/close     │
//! │  │ (ui::control)    │  (ui::     │ (session)        │───────────┐    │
//! │  └──────────────────┘  handlers) └────────┬─────────┘           │    │
//! │                                           │ active?             │    │
//! │                                           ▼                     ▼    │
//! │  ┌──────────────────┐  i16 block ┌──────────────────┐   ┌──────────┐ │
//! │  │ Capture Source   │──────────▶│ Gain Stage       │──▶│ Chunk    │ │
//! │  │ (audio::capture) │  bounded   │ (audio::gain)    │   │ Transmit │ │
//! │  └──────────────────┘  wait      └──────────────────┘   └────┬─────┘ │
//! │                                                              │       │
//! └──────────────────────────────────────────────────────────────┼───────┘
//!                                                                ▼
//!                                              ┌──────────────────────────┐
//!                                              │ Sink (network::transport)│
//!                                              │ [Open|Chunk|Comment]     │
//!                                              └──────────────────────────┘
//! ```
//!
//! Everything runs on one thread. The capture read is the only call that may
//! block, and only up to the configured timeout.

pub mod audio;
pub mod config;
pub mod controller;
pub mod error;
pub mod network;
pub mod session;
pub mod ui;

pub use controller::{CaptureOutcome, Controller, TickReport};
pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    use std::time::Duration;

    /// Default capture sample rate
    pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

    /// Default channel count (mono microphone)
    pub const DEFAULT_CHANNELS: u16 = 1;

    /// Width of one captured sample in bytes (signed 16-bit)
    pub const SAMPLE_WIDTH_BYTES: usize = 2;

    /// Bytes requested from the capture source per tick
    pub const STREAM_BUFFER_BYTES: usize = 256;

    /// Upper bound of the gain factor (and cell count of the gain meter)
    pub const MAX_GAIN: u8 = 20;

    /// Gain applied until the operator moves the meter
    pub const DEFAULT_GAIN: u8 = 10;

    /// Maximum time a single capture read may block the tick
    pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_millis(100);

    /// Name given to recordings saved by the sink
    pub const DEFAULT_RECORDING_NAME: &str = "recorded_sound";
}
