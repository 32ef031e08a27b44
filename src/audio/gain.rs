//! Gain stage
//!
//! Integer amplification applied in place right after capture.
//!
//! Products saturate to `i16::MIN..=i16::MAX`; loud input clips instead of
//! wrapping.

use crate::constants::MAX_GAIN;

/// Amplification factor, always within `[1, MAX_GAIN]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GainFactor(u8);

impl GainFactor {
    pub const MIN: GainFactor = GainFactor(1);
    pub const MAX: GainFactor = GainFactor(MAX_GAIN);

    /// Clamp an arbitrary requested value into range
    pub fn clamped(value: i32) -> Self {
        Self(value.clamp(1, MAX_GAIN as i32) as u8)
    }

    /// Gain selected by a meter position (`position + 1`, clamped)
    pub fn from_meter_position(position: usize) -> Self {
        Self::clamped(position.saturating_add(1).min(i32::MAX as usize) as i32)
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for GainFactor {
    fn default() -> Self {
        Self(crate::constants::DEFAULT_GAIN)
    }
}

impl std::fmt::Display for GainFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Multiply every sample by `factor`, saturating at the i16 limits
#[inline]
pub fn apply_gain(samples: &mut [i16], factor: GainFactor) {
    debug_assert!((1..=MAX_GAIN).contains(&factor.0));
    if factor.0 == 1 {
        return;
    }

    let factor = factor.0 as i16;
    for sample in samples.iter_mut() {
        *sample = sample.saturating_mul(factor);
    }
}
