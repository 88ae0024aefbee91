//! Parameter store.
//!
//! One atomic per field so the control context can replace any value while the
//! render context is reading them, without either side ever waiting on the other.
//! Floats are stored as their bit patterns.

use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};

use super::sweep::{Sweep, SweepMode};

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_CHANNELS: u16 = 1;
pub const DEFAULT_MIN_FREQUENCY: f64 = 220.0;
pub const DEFAULT_MAX_FREQUENCY: f64 = 880.0;
pub const DEFAULT_AMPLITUDE: f64 = 1.0;
pub const DEFAULT_VOLUME: f64 = 1.0;
pub const DEFAULT_SWEEP_RATE: f64 = 1.0;

/// A plain copy of everything in the [`ParamStore`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub min_frequency: f64,
    pub max_frequency: f64,
    pub amplitude: f64,
    pub volume: f64,
    pub sweep_rate: f64,
    pub sweep_mode: SweepMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            min_frequency: DEFAULT_MIN_FREQUENCY,
            max_frequency: DEFAULT_MAX_FREQUENCY,
            amplitude: DEFAULT_AMPLITUDE,
            volume: DEFAULT_VOLUME,
            sweep_rate: DEFAULT_SWEEP_RATE,
            sweep_mode: SweepMode::default(),
        }
    }
}

impl EngineConfig {
    pub fn sweep(&self) -> Sweep {
        Sweep {
            min: self.min_frequency,
            max: self.max_frequency,
            rate: self.sweep_rate,
            mode: self.sweep_mode,
        }
    }

    /// Combined output gain.
    pub fn gain(&self) -> f64 {
        self.amplitude * self.volume
    }
}

#[derive(Debug)]
pub(crate) struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub(crate) fn new(val: f64) -> Self {
        Self(AtomicU64::new(val.to_bits()))
    }

    pub(crate) fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, val: f64) {
        self.0.store(val.to_bits(), Ordering::Release);
    }
}

/// Live engine configuration.
/// Written by the control context, read by the renderer every frame.
#[derive(Debug)]
pub struct ParamStore {
    sample_rate: AtomicU32,
    channels: AtomicU32,
    min_frequency: AtomicF64,
    max_frequency: AtomicF64,
    amplitude: AtomicF64,
    volume: AtomicF64,
    sweep_rate: AtomicF64,
    sweep_mode: AtomicU8,
}

impl ParamStore {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            sample_rate: AtomicU32::new(config.sample_rate),
            channels: AtomicU32::new(config.channels as u32),
            min_frequency: AtomicF64::new(config.min_frequency),
            max_frequency: AtomicF64::new(config.max_frequency),
            amplitude: AtomicF64::new(config.amplitude),
            volume: AtomicF64::new(config.volume),
            sweep_rate: AtomicF64::new(config.sweep_rate),
            sweep_mode: AtomicU8::new(config.sweep_mode.id()),
        }
    }

    /// Copies every field out.
    /// Fields are read one at a time, so a snapshot taken during a burst of
    /// writes can mix old and new values; each field on its own is always whole.
    pub fn snapshot(&self) -> EngineConfig {
        EngineConfig {
            sample_rate: self.sample_rate(),
            channels: self.channels(),
            min_frequency: self.min_frequency.load(),
            max_frequency: self.max_frequency.load(),
            amplitude: self.amplitude.load(),
            volume: self.volume.load(),
            sweep_rate: self.sweep_rate.load(),
            sweep_mode: self.sweep_mode(),
        }
    }

    pub fn replace(&self, config: EngineConfig) {
        self.set_sample_rate(config.sample_rate);
        self.set_channels(config.channels);
        self.set_min_frequency(config.min_frequency);
        self.set_max_frequency(config.max_frequency);
        self.set_amplitude(config.amplitude);
        self.set_volume(config.volume);
        self.set_sweep_rate(config.sweep_rate);
        self.set_sweep_mode(config.sweep_mode);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Acquire)
    }

    pub fn channels(&self) -> u16 {
        self.channels.load(Ordering::Acquire) as u16
    }

    pub fn sweep_mode(&self) -> SweepMode {
        // Only ever written from a `SweepMode`, so the id is always valid
        SweepMode::from_id(self.sweep_mode.load(Ordering::Acquire) as i64).unwrap_or_default()
    }

    pub fn min_frequency(&self) -> f64 {
        self.min_frequency.load()
    }

    pub fn max_frequency(&self) -> f64 {
        self.max_frequency.load()
    }

    pub fn set_sample_rate(&self, val: u32) {
        self.sample_rate.store(val, Ordering::Release);
    }

    pub fn set_channels(&self, val: u16) {
        self.channels.store(val as u32, Ordering::Release);
    }

    pub fn set_min_frequency(&self, val: f64) {
        self.min_frequency.store(val);
    }

    pub fn set_max_frequency(&self, val: f64) {
        self.max_frequency.store(val);
    }

    pub fn set_amplitude(&self, val: f64) {
        self.amplitude.store(val);
    }

    pub fn set_volume(&self, val: f64) {
        self.volume.store(val);
    }

    pub fn set_sweep_rate(&self, val: f64) {
        self.sweep_rate.store(val);
    }

    pub fn set_sweep_mode(&self, mode: SweepMode) {
        self.sweep_mode.store(mode.id(), Ordering::Release);
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod test {
    use super::{EngineConfig, ParamStore};
    use crate::engine::sweep::SweepMode;

    #[test]
    fn test_store_roundtrip() {
        let store = ParamStore::default();
        assert_eq!(store.snapshot(), EngineConfig::default());

        store.set_amplitude(2.5);
        store.set_sweep_mode(SweepMode::Random);
        store.set_min_frequency(-0.0);

        let snap = store.snapshot();
        assert_eq!(snap.amplitude, 2.5);
        assert_eq!(snap.sweep_mode, SweepMode::Random);
        assert!(snap.min_frequency.is_sign_negative());
    }

    #[test]
    fn test_concurrent_writes_never_tear() {
        let store = std::sync::Arc::new(ParamStore::default());
        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..10_000 {
                    store.set_max_frequency(if i % 2 == 0 { 1000.0 } else { 2000.0 });
                }
            })
        };

        for _ in 0..10_000 {
            let f = store.snapshot().max_frequency;
            assert!(f == 880.0 || f == 1000.0 || f == 2000.0);
        }

        writer.join().unwrap();
    }
}
