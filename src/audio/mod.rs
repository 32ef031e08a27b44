//! Audio subsystem module

pub mod buffer;
pub mod capture;
#[cfg(feature = "cpal-capture")]
pub mod device;
pub mod gain;
pub mod synth;

pub use buffer::SampleBuffer;
pub use capture::{CaptureSource, StreamFormat};
pub use gain::{apply_gain, GainFactor};
pub use synth::ToneSource;
