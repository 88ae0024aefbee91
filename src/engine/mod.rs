//! The sweep engine.
//!
//! An [`Engine`] is the command interface: a handle the controlling side owns
//! and calls from any thread. Audio is produced by a [`Renderer`] obtained
//! from [`Engine::renderer`] and moved into the audio callback.
//!
//! The two sides only share atomics: the [`params::ParamStore`], the
//! [`lifecycle::SessionFlag`] and the published frequency. Lifecycle commands
//! serialize on a lock the renderer never takes.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{EngineError, Result};

pub mod lifecycle;
pub mod params;
pub mod render;
pub mod sweep;
pub mod ticker;

pub use lifecycle::State;
pub use params::EngineConfig;
pub use render::Renderer;
pub use sweep::{Sweep, SweepMode};
pub use ticker::Ticker;

use lifecycle::{Lifecycle, SessionFlag};
use params::{AtomicF64, ParamStore};

/// Interval the polling profile expects [`Engine::update_frequency`] to be called at.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How the engine turns the sweep into sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// The renderer evaluates the sweep for every sample.
    #[default]
    Continuous,
    /// The control side calls [`Engine::update_frequency`] on a timer and the
    /// renderer plays whatever frequency was last published.
    Polling,
}

/// Options fixed for the lifetime of an engine.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Profile used by [`Engine::initialize_audio`].
    pub profile: Profile,
    /// Seed for Random sweeps. Each started session replays the same draws.
    pub seed: Option<u64>,
    /// Linear gain ramp at the start of every session.
    pub fade_in: Duration,
}

/// State shared between the command interface and renderers.
pub(crate) struct Shared {
    pub options: EngineOptions,
    pub params: ParamStore,
    pub session: SessionFlag,
    /// Last frequency produced by either profile.
    pub frequency: AtomicF64,
    continuous: AtomicBool,
    duration_frames: AtomicU64,
    fade_frames: AtomicU64,
}

impl Shared {
    pub fn profile(&self) -> Profile {
        match self.continuous.load(Ordering::Acquire) {
            true => Profile::Continuous,
            false => Profile::Polling,
        }
    }

    /// Frames the current session may render, 0 for no limit.
    pub fn duration_frames(&self) -> u64 {
        self.duration_frames.load(Ordering::Acquire)
    }

    /// Frames the fade-in of the current session lasts, 0 for none.
    pub fn fade_frames(&self) -> u64 {
        self.fade_frames.load(Ordering::Acquire)
    }
}

pub struct Engine {
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
}

impl Engine {
    /// Creates an uninitialized engine.
    /// Setters called before [`Engine::initialize_audio`] stage their values.
    pub fn new(options: EngineOptions) -> Self {
        let config = EngineConfig::default();
        let shared = Shared {
            continuous: AtomicBool::new(options.profile == Profile::Continuous),
            frequency: AtomicF64::new(config.min_frequency),
            params: ParamStore::new(config),
            session: SessionFlag::default(),
            duration_frames: AtomicU64::new(0),
            fade_frames: AtomicU64::new(0),
            options,
        };

        Self {
            lifecycle: Mutex::new(Lifecycle::new(shared.options.seed)),
            shared: Arc::new(shared),
        }
    }

    /// A renderer for one output stream.
    /// Renderers are silent until a session is started.
    pub fn renderer(&self) -> Renderer {
        Renderer::new(self.shared.clone())
    }

    pub fn options(&self) -> &EngineOptions {
        &self.shared.options
    }

    pub fn profile(&self) -> Profile {
        self.shared.profile()
    }

    pub fn state(&self) -> State {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.sync(&self.shared.session);
        lifecycle.state
    }

    /// Lock-free check of the running flag.
    pub fn is_running(&self) -> bool {
        self.shared.session.is_running()
    }

    pub fn config(&self) -> EngineConfig {
        self.shared.params.snapshot()
    }

    /// Last published instantaneous frequency.
    pub fn current_frequency(&self) -> f64 {
        self.shared.frequency.load()
    }

    // == Lifecycle ==

    pub fn initialize_audio(
        &self,
        min_frequency: f64,
        max_frequency: f64,
        sample_rate: u32,
        channels: u16,
    ) -> Result<()> {
        let profile = self.shared.options.profile;
        self.initialize(min_frequency, max_frequency, sample_rate, channels, profile)
    }

    /// Configures the engine, choosing the profile for this configuration.
    pub fn initialize(
        &self,
        min_frequency: f64,
        max_frequency: f64,
        sample_rate: u32,
        channels: u16,
        profile: Profile,
    ) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.sync(&self.shared.session);
        lifecycle
            .expect(
                "initialize audio",
                &[State::Uninitialized, State::Configured, State::Stopped],
            )
            .map_err(log_rejected)?;

        let config = EngineConfig {
            min_frequency,
            max_frequency,
            sample_rate,
            channels,
            ..self.shared.params.snapshot()
        };
        validate(&config).map_err(log_rejected)?;

        self.shared.params.replace(config);
        self.shared
            .continuous
            .store(profile == Profile::Continuous, Ordering::Release);
        self.shared.frequency.store(min_frequency);
        lifecycle.state = State::Configured;

        debug!(
            min_frequency,
            max_frequency, sample_rate, channels, ?profile, "engine configured"
        );
        Ok(())
    }

    /// Starts a session.
    /// `duration_ms == 0` plays until [`Engine::stop_audio`]; anything else
    /// is counted down by the renderer, which stops the session itself.
    pub fn start_audio(&self, duration_ms: u64) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.sync(&self.shared.session);
        lifecycle
            .expect("start audio", &[State::Configured, State::Stopped])
            .map_err(log_rejected)?;

        let config = self.shared.params.snapshot();
        validate(&config).map_err(log_rejected)?;

        let frames = match duration_ms {
            0 => 0,
            ms => frames_for(ms as u128, config.sample_rate).max(1),
        };
        let fade = frames_for(self.shared.options.fade_in.as_millis(), config.sample_rate);
        self.shared.duration_frames.store(frames, Ordering::Release);
        self.shared.fade_frames.store(fade, Ordering::Release);

        lifecycle.begin(self.shared.options.seed);
        let generation = self.shared.session.begin();
        lifecycle.state = State::Running;

        debug!(generation, duration_ms, mode = %config.sweep_mode, "audio started");
        Ok(())
    }

    /// Stops the running session.
    /// Renderers go silent from their next frame. Stopping an already
    /// stopped engine is a no-op.
    pub fn stop_audio(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.sync(&self.shared.session);
        lifecycle
            .expect("stop audio", &[State::Running, State::Stopped])
            .map_err(log_rejected)?;

        if lifecycle.state == State::Running {
            self.shared.session.end();
            lifecycle.state = State::Stopped;
            lifecycle.started = None;
            debug!("audio stopped");
        }

        Ok(())
    }

    /// Releases everything and returns to `Uninitialized`.
    /// Safe to call from any state, any number of times.
    pub fn cleanup_audio(&self) {
        let mut lifecycle = self.lifecycle.lock();
        self.shared.session.end();
        self.shared.duration_frames.store(0, Ordering::Release);
        self.shared.fade_frames.store(0, Ordering::Release);

        let config = EngineConfig::default();
        self.shared.params.replace(config);
        self.shared.frequency.store(config.min_frequency);
        self.shared
            .continuous
            .store(self.shared.options.profile == Profile::Continuous, Ordering::Release);

        if lifecycle.state != State::Uninitialized {
            debug!(from = %lifecycle.state, "engine cleaned up");
        }
        *lifecycle = Lifecycle::new(self.shared.options.seed);
    }

    pub fn start_device(&self) -> Result<()> {
        self.start_audio(0)
    }

    pub fn stop_device(&self) -> Result<()> {
        self.stop_audio()
    }

    pub fn cleanup_device(&self) {
        self.cleanup_audio()
    }

    /// Polling profile only: evaluates the sweep at the wall-clock time since
    /// the session started and publishes the result for the renderer.
    /// Does nothing when not running or in the continuous profile.
    pub fn update_frequency(&self) {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.sync(&self.shared.session);
        if let Some(started) = lifecycle.started {
            self.publish_at(&mut lifecycle, started.elapsed());
        }
    }

    fn publish_at(&self, lifecycle: &mut Lifecycle, elapsed: Duration) {
        if lifecycle.state != State::Running || self.profile() != Profile::Polling {
            return;
        }

        let sweep = self.shared.params.snapshot().sweep();
        let Lifecycle { hold, rng, .. } = lifecycle;
        let frequency = sweep.evaluate(elapsed.as_secs_f64(), hold, rng);
        self.shared.frequency.store(frequency);
    }

    // == Parameters ==

    /// Sets the upper bound of the sweep.
    /// In the polling profile this is also the pushed target: while not
    /// running it is published as the current frequency.
    pub fn set_frequency(&self, hz: f64) -> Result<()> {
        check_frequency("maximum frequency", hz).map_err(log_rejected)?;
        self.shared.params.set_max_frequency(hz);
        if self.profile() == Profile::Polling && !self.is_running() {
            self.shared.frequency.store(hz);
        }

        debug!(hz, "maximum frequency set");
        Ok(())
    }

    pub fn set_min_frequency(&self, hz: f64) -> Result<()> {
        check_frequency("minimum frequency", hz).map_err(log_rejected)?;
        let mode = self.shared.params.sweep_mode();
        if mode.needs_positive_min() && hz <= 0.0 {
            return Err(log_rejected(EngineError::NonPositiveMinimum {
                mode: mode.name(),
                min: hz,
            }));
        }

        self.shared.params.set_min_frequency(hz);
        debug!(hz, "minimum frequency set");
        Ok(())
    }

    /// Amplitude is not clamped: anything finite is accepted and values
    /// outside `[0, 1]` come out of the renderer unclipped.
    pub fn set_amplitude(&self, value: f64) -> Result<()> {
        check_gain("amplitude", value).map_err(log_rejected)?;
        self.shared.params.set_amplitude(value);
        debug!(value, "amplitude set");
        Ok(())
    }

    /// Second gain stage, multiplied with the amplitude.
    pub fn set_volume(&self, value: f64) -> Result<()> {
        check_gain("volume", value).map_err(log_rejected)?;
        self.shared.params.set_volume(value);
        debug!(value, "volume set");
        Ok(())
    }

    /// Sweep cycles per second.
    pub fn set_sweep_rate(&self, hz: f64) -> Result<()> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(log_rejected(EngineError::InvalidSweepRate(hz)));
        }

        self.shared.params.set_sweep_rate(hz);
        debug!(hz, "sweep rate set");
        Ok(())
    }

    /// Sets the sweep mode by its canonical id, see [`SweepMode::from_id`].
    pub fn set_sweep_mode(&self, id: i64) -> Result<()> {
        let mode = SweepMode::from_id(id).map_err(log_rejected)?;
        self.set_mode(mode)
    }

    pub fn set_mode(&self, mode: SweepMode) -> Result<()> {
        let min = self.shared.params.min_frequency();
        if mode.needs_positive_min() && min <= 0.0 {
            return Err(log_rejected(EngineError::NonPositiveMinimum {
                mode: mode.name(),
                min,
            }));
        }

        self.shared.params.set_sweep_mode(mode);
        debug!(%mode, "sweep mode set");
        Ok(())
    }

    pub fn set_channels(&self, channels: u16) -> Result<()> {
        if channels < 1 {
            return Err(log_rejected(EngineError::InvalidChannels(channels as i64)));
        }

        self.shared.params.set_channels(channels);
        debug!(channels, "channel count set");
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shared.session.end();
    }
}

/// Checks a whole configuration before it is used for a session.
pub fn validate(config: &EngineConfig) -> Result<()> {
    if config.sample_rate == 0 {
        return Err(EngineError::InvalidSampleRate(0));
    }

    if config.channels == 0 {
        return Err(EngineError::InvalidChannels(0));
    }

    check_frequency("minimum frequency", config.min_frequency)?;
    check_frequency("maximum frequency", config.max_frequency)?;
    if config.min_frequency > config.max_frequency {
        return Err(EngineError::InvalidFrequencyRange {
            min: config.min_frequency,
            max: config.max_frequency,
        });
    }

    if config.sweep_mode.needs_positive_min() && config.min_frequency <= 0.0 {
        return Err(EngineError::NonPositiveMinimum {
            mode: config.sweep_mode.name(),
            min: config.min_frequency,
        });
    }

    check_gain("amplitude", config.amplitude)?;
    check_gain("volume", config.volume)?;
    if !config.sweep_rate.is_finite() || config.sweep_rate <= 0.0 {
        return Err(EngineError::InvalidSweepRate(config.sweep_rate));
    }

    Ok(())
}

/// Frames covering `ms` milliseconds, saturating at `u64::MAX`.
fn frames_for(ms: u128, sample_rate: u32) -> u64 {
    u64::try_from(ms * sample_rate as u128 / 1000).unwrap_or(u64::MAX)
}

fn check_frequency(what: &'static str, hz: f64) -> Result<()> {
    if !hz.is_finite() || hz < 0.0 {
        return Err(EngineError::InvalidFrequency { what, value: hz });
    }

    Ok(())
}

fn check_gain(what: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(EngineError::InvalidAmplitude { what, value });
    }

    Ok(())
}

fn log_rejected(err: EngineError) -> EngineError {
    warn!(kind = %err.kind(), "rejected: {err}");
    err
}
