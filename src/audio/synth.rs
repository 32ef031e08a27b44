//! Synthetic tone capture source
//!
//! Stands in for a microphone when no input hardware is available. Generates
//! a sine tone with a phase accumulator and, when paced, blocks for as long as
//! a real device would take to fill the block.

use std::f32::consts::TAU;
use std::time::Duration;

use super::capture::{bytes_for, CaptureSource, StreamFormat};
use crate::error::CaptureError;

pub struct ToneSource {
    format: StreamFormat,
    /// Current phase in turns (0.0..1.0)
    phase: f32,
    /// Phase advance per frame
    phase_inc: f32,
    amplitude: i16,
    paced: bool,
}

impl ToneSource {
    /// Real-time paced tone
    pub fn new(format: StreamFormat, freq_hz: u32, amplitude: i16) -> Self {
        Self {
            format,
            phase: 0.0,
            phase_inc: freq_hz as f32 / format.sample_rate.max(1) as f32,
            amplitude,
            paced: true,
        }
    }

    /// Tone that returns immediately, for tests and benchmarks
    pub fn unpaced(format: StreamFormat, freq_hz: u32, amplitude: i16) -> Self {
        Self {
            paced: false,
            ..Self::new(format, freq_hz, amplitude)
        }
    }

    fn next_frame(&mut self) -> i16 {
        let value = (self.phase * TAU).sin() * self.amplitude as f32;
        self.phase = (self.phase + self.phase_inc).fract();
        value as i16
    }
}

impl CaptureSource for ToneSource {
    fn read_block(&mut self, block: &mut [i16], timeout: Duration) -> Result<usize, CaptureError> {
        if self.paced {
            let needed = self.format.duration_of(block.len());
            if needed > timeout {
                std::thread::sleep(timeout);
                return Err(CaptureError::Timeout);
            }
            std::thread::sleep(needed);
        }

        let channels = self.format.channels.max(1) as usize;
        for frame in block.chunks_mut(channels) {
            let value = self.next_frame();
            frame.fill(value);
        }
        Ok(bytes_for(block.len()))
    }

    fn format(&self) -> StreamFormat {
        self.format
    }

    fn name(&self) -> &str {
        "tone"
    }
}
