//! Reusable capture buffer for 16-bit samples
//!
//! Allocated once and filled in place on every tick. The number of valid
//! samples is derived from the bytes the capture source reported.

use crate::constants::SAMPLE_WIDTH_BYTES;
use crate::error::BufferError;

/// Fixed-capacity sample buffer with an explicit valid-sample count
pub struct SampleBuffer {
    /// Backing storage, never reallocated
    data: Box<[i16]>,
    /// Samples written by the last successful capture
    valid: usize,
}

impl SampleBuffer {
    /// Create a buffer holding `capacity_bytes` worth of samples.
    /// The byte capacity must be a non-zero multiple of the sample width.
    pub fn with_capacity_bytes(capacity_bytes: usize) -> Result<Self, BufferError> {
        if capacity_bytes == 0 || capacity_bytes % SAMPLE_WIDTH_BYTES != 0 {
            return Err(BufferError::InvalidCapacity(capacity_bytes));
        }

        Ok(Self {
            data: vec![0i16; capacity_bytes / SAMPLE_WIDTH_BYTES].into_boxed_slice(),
            valid: 0,
        })
    }

    /// Capacity in samples
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Capacity in bytes
    pub fn capacity_bytes(&self) -> usize {
        self.data.len() * SAMPLE_WIDTH_BYTES
    }

    /// Whole backing storage, for the capture source to fill
    pub fn storage_mut(&mut self) -> &mut [i16] {
        self.valid = 0;
        &mut self.data
    }

    /// Record how many bytes the capture source produced.
    ///
    /// Returns the resulting valid sample count. An odd count or one larger
    /// than the buffer is a bug in the capture source.
    pub fn commit_bytes(&mut self, bytes_read: usize) -> Result<usize, BufferError> {
        if bytes_read % SAMPLE_WIDTH_BYTES != 0 {
            self.valid = 0;
            debug_assert!(false, "capture produced odd byte count {}", bytes_read);
            return Err(BufferError::OddByteCount(bytes_read));
        }
        if bytes_read > self.capacity_bytes() {
            self.valid = 0;
            debug_assert!(
                false,
                "capture produced {} bytes into {}-byte buffer",
                bytes_read,
                self.capacity_bytes()
            );
            return Err(BufferError::Overrun {
                bytes: bytes_read,
                capacity: self.capacity_bytes(),
            });
        }

        self.valid = bytes_read / SAMPLE_WIDTH_BYTES;
        Ok(self.valid)
    }

    /// Number of valid samples
    pub fn len(&self) -> usize {
        self.valid
    }

    pub fn is_empty(&self) -> bool {
        self.valid == 0
    }

    /// Valid samples
    pub fn samples(&self) -> &[i16] {
        &self.data[..self.valid]
    }

    /// Valid samples, mutable (gain is applied through this)
    pub fn samples_mut(&mut self) -> &mut [i16] {
        &mut self.data[..self.valid]
    }

    /// Forget the current contents without touching storage
    pub fn clear(&mut self) {
        self.valid = 0;
    }

    /// Largest absolute sample value among the valid samples
    pub fn peak(&self) -> u16 {
        self.samples()
            .iter()
            .map(|s| s.unsigned_abs())
            .max()
            .unwrap_or(0)
    }
}
