//! Picks the input and output devices at startup.

use anyhow::{Context, Result};
use cpal::{
    traits::{DeviceTrait, HostTrait},
    Device, SampleFormat, SampleRate, StreamConfig, SupportedStreamConfig,
};
use tracing::{debug, warn};

use crate::misc::Similarity;

/// A device and the stream config it will be opened with.
pub struct Endpoint {
    pub device: Device,
    pub config: SupportedStreamConfig,
}

impl Endpoint {
    pub fn name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "<unknown>".to_owned())
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate().0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels()
    }

    pub fn stream_config(&self) -> StreamConfig {
        self.config.clone().into()
    }
}

/// Finds the output device whose name is closest to `wanted` (`default` for the
/// host default) and tries to open it with the requested rate and channel count.
/// Falls back to the device's default config when that combination is unsupported.
pub fn output_device(wanted: &str, sample_rate: u32, channels: u16) -> Result<Endpoint> {
    let host = cpal::default_host();
    let device = match wanted.to_lowercase().as_str() {
        "default" => host
            .default_output_device()
            .context("No default output device")?,
        wanted => closest(host.output_devices()?, wanted).context("No output device found")?,
    };

    let requested = device
        .supported_output_configs()?
        .find(|x| {
            x.channels() == channels
                && x.sample_format() == SampleFormat::F32
                && (x.min_sample_rate().0..=x.max_sample_rate().0).contains(&sample_rate)
        })
        .map(|x| x.with_sample_rate(SampleRate(sample_rate)));

    let config = match requested {
        Some(config) => config,
        None => {
            let config = device
                .default_output_config()
                .context("No default output config")?;
            warn!(
                sample_rate,
                channels,
                using_rate = config.sample_rate().0,
                using_channels = config.channels(),
                "requested output format unsupported, using device default"
            );
            config
        }
    };

    debug!(?config, "output config");
    Ok(Endpoint { device, config })
}

/// Like [`output_device`] for the capture side, always with the default config.
pub fn input_device(wanted: &str) -> Result<Endpoint> {
    let host = cpal::default_host();
    let device = match wanted.to_lowercase().as_str() {
        "default" => host
            .default_input_device()
            .context("No default input device")?,
        wanted => closest(host.input_devices()?, wanted).context("No input device found")?,
    };

    let config = device
        .default_input_config()
        .context("No default input config")?;
    Ok(Endpoint { device, config })
}

/// The device with the highest name similarity (dice coefficient) to `wanted`.
fn closest(devices: impl Iterator<Item = Device>, wanted: &str) -> Option<Device> {
    let wanted = wanted.to_owned();
    devices
        .filter_map(|x| Some((x.name().ok()?.to_lowercase().similarity(&wanted), x)))
        .reduce(|a, b| if a.0 > b.0 { a } else { b })
        .map(|x| x.1)
}
