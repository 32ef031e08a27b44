//! Host input devices (cpal)

use cpal::traits::{DeviceTrait, HostTrait};
use serde::Serialize;

use super::capture::StreamFormat;
use crate::error::CaptureError;

/// Rates checked when listing devices
const LISTED_RATES: [u32; 5] = [8_000, 16_000, 22_050, 44_100, 48_000];

/// An input device chosen for capture
pub struct InputDevice {
    inner: cpal::Device,
    pub name: String,
}

impl InputDevice {
    /// Open `name`, or the host default input when `None`
    pub fn open(name: Option<&str>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = match name {
            None => host
                .default_input_device()
                .ok_or_else(|| CaptureError::Device("no default input device".into()))?,
            Some(wanted) => host
                .input_devices()
                .map_err(|e| CaptureError::Device(e.to_string()))?
                .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
                .ok_or_else(|| CaptureError::Device(format!("input device not found: {}", wanted)))?,
        };

        let name = device.name().unwrap_or_else(|_| "unknown".into());
        Ok(Self {
            inner: device,
            name,
        })
    }

    /// Native sample format of the device
    pub fn sample_format(&self) -> Result<cpal::SampleFormat, CaptureError> {
        self.inner
            .default_input_config()
            .map(|c| c.sample_format())
            .map_err(|e| CaptureError::Device(e.to_string()))
    }

    /// Whether any input configuration covers `format`
    pub fn supports(&self, format: StreamFormat) -> bool {
        let rate = cpal::SampleRate(format.sample_rate);
        self.inner
            .supported_input_configs()
            .map(|mut configs| {
                configs.any(|c| {
                    c.channels() == format.channels
                        && c.min_sample_rate() <= rate
                        && rate <= c.max_sample_rate()
                })
            })
            .unwrap_or(false)
    }

    pub fn into_inner(self) -> cpal::Device {
        self.inner
    }
}

/// Listing entry for an input device
#[derive(Debug, Clone, Serialize)]
pub struct InputDeviceInfo {
    pub name: String,
    pub is_default: bool,
    pub sample_rates: Vec<u32>,
    pub channels: Vec<u16>,
}

pub fn list_input_devices() -> Vec<InputDeviceInfo> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let Ok(inputs) = host.input_devices() else {
        return Vec::new();
    };

    inputs
        .filter_map(|device| {
            let name = device.name().ok()?;
            let mut sample_rates = Vec::new();
            let mut channels = Vec::new();

            for config in device.supported_input_configs().into_iter().flatten() {
                for rate in LISTED_RATES {
                    let in_range = config.min_sample_rate().0 <= rate && rate <= config.max_sample_rate().0;
                    if in_range && !sample_rates.contains(&rate) {
                        sample_rates.push(rate);
                    }
                }
                if !channels.contains(&config.channels()) {
                    channels.push(config.channels());
                }
            }
            sample_rates.sort_unstable();
            channels.sort_unstable();

            Some(InputDeviceInfo {
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
                sample_rates,
                channels,
            })
        })
        .collect()
}
