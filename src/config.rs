//! Session configuration.
//! Everything the CLI can tune, loadable from a JSON file.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    engine::{self, Engine, EngineConfig, EngineOptions, Profile, SweepMode},
    error::EngineError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub min_frequency: f64,
    pub max_frequency: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub amplitude: f64,
    pub volume: f64,
    pub sweep_rate: f64,
    pub sweep_mode: SweepMode,
    /// Playback length, 0 plays until stopped.
    pub duration_ms: u64,
    pub fade_in_ms: u64,
    /// `true` for the per-sample profile, `false` for the polling one.
    pub continuous: bool,
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_frequency: 220.0,
            max_frequency: 880.0,
            sample_rate: 44100,
            channels: 2,
            amplitude: 1.0,
            volume: 1.0,
            sweep_rate: 1.0,
            sweep_mode: SweepMode::Linear,
            duration_ms: 10_000,
            fade_in_ms: 500,
            continuous: true,
            seed: None,
        }
    }
}

impl SessionConfig {
    /// Reads a config file, or returns the defaults when no path is given.
    /// Fields missing from the file keep their default values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config `{}`", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config `{}`", path.display()))?;
        Ok(config)
    }

    pub fn profile(&self) -> Profile {
        match self.continuous {
            true => Profile::Continuous,
            false => Profile::Polling,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            min_frequency: self.min_frequency,
            max_frequency: self.max_frequency,
            amplitude: self.amplitude,
            volume: self.volume,
            sweep_rate: self.sweep_rate,
            sweep_mode: self.sweep_mode,
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            profile: self.profile(),
            seed: self.seed,
            fade_in: Duration::from_millis(self.fade_in_ms),
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        engine::validate(&self.engine_config())
    }

    /// Stages every parameter on `engine` and initializes it.
    pub fn apply(&self, engine: &Engine) -> Result<(), EngineError> {
        self.validate()?;

        // The mode check looks at the current minimum, so set that first
        engine.set_min_frequency(self.min_frequency)?;
        engine.set_mode(self.sweep_mode)?;
        engine.set_amplitude(self.amplitude)?;
        engine.set_volume(self.volume)?;
        engine.set_sweep_rate(self.sweep_rate)?;
        engine.initialize(
            self.min_frequency,
            self.max_frequency,
            self.sample_rate,
            self.channels,
            self.profile(),
        )
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::SessionConfig;
    use crate::engine::{Engine, Profile, State, SweepMode};

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.channels, 2);
        assert_eq!(config.duration_ms, 10_000);
        assert_eq!(config.profile(), Profile::Continuous);
        assert!(config.validate().is_ok());

        assert_eq!(SessionConfig::load(None).unwrap(), config);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "max_frequency": 2000, "sweep_mode": "triangle", "continuous": false, "seed": 7 }}"#
        )
        .unwrap();

        let config = SessionConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_frequency, 2000.0);
        assert_eq!(config.sweep_mode, SweepMode::Triangle);
        assert_eq!(config.profile(), Profile::Polling);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.min_frequency, 220.0);

        let options = config.engine_options();
        assert_eq!(options.fade_in.as_millis(), 500);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SessionConfig::load(Some(dir.path().join("missing.json").as_path())).is_err());

        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "sweep_mode": "wobble" }"#).unwrap();
        assert!(SessionConfig::load(Some(path.as_path())).is_err());
    }

    #[test]
    fn test_apply() {
        let config = SessionConfig {
            min_frequency: 50.0,
            sweep_mode: SweepMode::Exponential,
            amplitude: 0.5,
            ..SessionConfig::default()
        };

        let engine = Engine::default();
        config.apply(&engine).unwrap();
        assert_eq!(engine.state(), State::Configured);
        assert_eq!(engine.config(), config.engine_config());

        let broken = SessionConfig {
            min_frequency: 1000.0,
            ..SessionConfig::default()
        };
        let engine = Engine::default();
        assert!(broken.apply(&engine).is_err());
        assert_eq!(engine.state(), State::Uninitialized);
    }
}
