//! Audio capture sources
//!
//! A capture source fills a caller-owned block of signed 16-bit samples and
//! reports how many bytes it produced. Reads block for at most the timeout
//! passed by the caller.

use std::time::Duration;

use crate::constants::SAMPLE_WIDTH_BYTES;
use crate::error::CaptureError;

/// Sample rate and channel layout of a capture stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl StreamFormat {
    /// Time it takes the device to produce `samples` interleaved samples
    pub fn duration_of(&self, samples: usize) -> Duration {
        let frames = samples as u64 / self.channels.max(1) as u64;
        Duration::from_micros(frames * 1_000_000 / self.sample_rate.max(1) as u64)
    }
}

impl Default for StreamFormat {
    fn default() -> Self {
        Self {
            sample_rate: crate::constants::DEFAULT_SAMPLE_RATE,
            channels: crate::constants::DEFAULT_CHANNELS,
        }
    }
}

/// Boundary to the microphone driver
pub trait CaptureSource {
    /// Fill `block` with captured samples, waiting no longer than `timeout`.
    ///
    /// Returns the number of bytes written (at most `block.len() * 2`).
    fn read_block(&mut self, block: &mut [i16], timeout: Duration) -> Result<usize, CaptureError>;

    /// Format the source captures in
    fn format(&self) -> StreamFormat;

    /// Name for logging
    fn name(&self) -> &str {
        "capture"
    }
}

impl<T: CaptureSource + ?Sized> CaptureSource for Box<T> {
    fn read_block(&mut self, block: &mut [i16], timeout: Duration) -> Result<usize, CaptureError> {
        (**self).read_block(block, timeout)
    }

    fn format(&self) -> StreamFormat {
        (**self).format()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Byte count for a number of samples
#[inline]
pub fn bytes_for(samples: usize) -> usize {
    samples * SAMPLE_WIDTH_BYTES
}

#[cfg(feature = "cpal-capture")]
pub use self::cpal_source::CpalCapture;

#[cfg(feature = "cpal-capture")]
mod cpal_source {
    use cpal::traits::{DeviceTrait, StreamTrait};
    use cpal::{SampleFormat, StreamConfig};
    use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread::{self, JoinHandle};
    use std::time::{Duration, Instant};

    use super::{bytes_for, CaptureSource, StreamFormat};
    use crate::audio::device::InputDevice;
    use crate::error::CaptureError;

    /// Blocks queued between the driver callback and the polling loop
    const BLOCK_QUEUE_DEPTH: usize = 64;

    /// Capture from a host input device through cpal.
    ///
    /// The cpal stream lives on its own thread; its callback converts samples
    /// to i16 and forwards them over a bounded channel that `read_block`
    /// drains with a timeout.
    pub struct CpalCapture {
        device_name: String,
        format: StreamFormat,
        samples_rx: Receiver<Vec<i16>>,
        error_rx: Receiver<CaptureError>,
        pending: VecDeque<i16>,
        running: Arc<AtomicBool>,
        thread_handle: Option<JoinHandle<()>>,
    }

    impl CpalCapture {
        /// Open `device` (or the default input) at the requested format
        pub fn open(device: Option<&str>, format: StreamFormat) -> Result<Self, CaptureError> {
            let device = InputDevice::open(device)?;
            let device_name = device.name.clone();
            let sample_format = device.sample_format()?;
            if !device.supports(format) {
                tracing::warn!(
                    "'{}' reports no config for {} Hz, {} channel(s); trying anyway",
                    device_name,
                    format.sample_rate,
                    format.channels
                );
            }

            let config = StreamConfig {
                channels: format.channels,
                sample_rate: cpal::SampleRate(format.sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let (samples_tx, samples_rx) = bounded::<Vec<i16>>(BLOCK_QUEUE_DEPTH);
            let (error_tx, error_rx) = bounded::<CaptureError>(16);
            let running = Arc::new(AtomicBool::new(true));
            let running_for_loop = running.clone();

            let handle = thread::Builder::new()
                .name("capture-mic".to_string())
                .spawn(move || {
                    let cpal_device = device.into_inner();
                    let stream = build_stream(&cpal_device, &config, sample_format, samples_tx, error_tx.clone());

                    match stream {
                        Ok(stream) => {
                            if let Err(e) = stream.play() {
                                tracing::error!("Failed to start capture stream: {}", e);
                                let _ = error_tx.try_send(CaptureError::Device(e.to_string()));
                                return;
                            }

                            while running_for_loop.load(Ordering::Relaxed) {
                                thread::sleep(Duration::from_millis(10));
                            }
                        }
                        Err(e) => {
                            tracing::error!("Failed to build capture stream: {}", e);
                            let _ = error_tx.try_send(e);
                        }
                    }
                })
                .map_err(|e| CaptureError::Device(e.to_string()))?;

            tracing::info!(
                "Capturing from '{}' at {} Hz, {} channel(s), {:?}",
                device_name,
                format.sample_rate,
                format.channels,
                sample_format
            );

            Ok(Self {
                device_name,
                format,
                samples_rx,
                error_rx,
                pending: VecDeque::new(),
                running,
                thread_handle: Some(handle),
            })
        }

        /// Stop the stream thread
        pub fn stop(&mut self) {
            self.running.store(false, Ordering::SeqCst);
            if let Some(handle) = self.thread_handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn build_stream(
        device: &cpal::Device,
        config: &StreamConfig,
        sample_format: SampleFormat,
        samples_tx: Sender<Vec<i16>>,
        error_tx: Sender<CaptureError>,
    ) -> Result<cpal::Stream, CaptureError> {
        let on_error = move |err: cpal::StreamError| {
            let _ = error_tx.try_send(CaptureError::Device(err.to_string()));
        };

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    // Dropped on overflow; the reader sees a gap, not reordering
                    let _ = samples_tx.try_send(data.to_vec());
                },
                on_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let block = data
                        .iter()
                        .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                        .collect();
                    let _ = samples_tx.try_send(block);
                },
                on_error,
                None,
            ),
            other => {
                return Err(CaptureError::Device(format!(
                    "Unsupported sample format: {:?}",
                    other
                )))
            }
        };

        stream.map_err(|e| CaptureError::Device(e.to_string()))
    }

    impl CaptureSource for CpalCapture {
        fn read_block(&mut self, block: &mut [i16], timeout: Duration) -> Result<usize, CaptureError> {
            if let Ok(err) = self.error_rx.try_recv() {
                return Err(err);
            }

            let deadline = Instant::now() + timeout;
            while self.pending.len() < block.len() {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match self.samples_rx.recv_timeout(remaining) {
                    Ok(samples) => self.pending.extend(samples),
                    // Partial data stays queued for the next read
                    Err(RecvTimeoutError::Timeout) => return Err(CaptureError::Timeout),
                    Err(RecvTimeoutError::Disconnected) => {
                        return Err(CaptureError::Device("capture stream closed".into()))
                    }
                }
            }

            for (slot, sample) in block.iter_mut().zip(self.pending.drain(..block.len())) {
                *slot = sample;
            }
            Ok(bytes_for(block.len()))
        }

        fn format(&self) -> StreamFormat {
            self.format
        }

        fn name(&self) -> &str {
            &self.device_name
        }
    }

    impl Drop for CpalCapture {
        fn drop(&mut self) {
            self.stop();
        }
    }
}
