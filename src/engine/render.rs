//! Phase/sample renderer.
//!
//! A [`Renderer`] is owned by the render context (an audio callback).
//! It never locks, logs or allocates: every frame it checks the session
//! flag, reads the live parameters and advances its own [`RenderState`].

use std::{f64::consts::TAU, sync::Arc};

use rand::{rngs::StdRng, SeedableRng};

use super::{lifecycle::new_rng, params::EngineConfig, sweep::RandomHold, Profile, Shared};

/// Largest change in applied gain per frame.
/// Keeps amplitude changes mid-buffer from clicking.
pub const GAIN_SLEW: f64 = 0.001;

/// Everything that must carry across buffer boundaries.
/// Only exists while a session is running.
#[derive(Debug, Clone)]
struct RenderState {
    generation: u64,
    frames: u64,
    phase: f64,
    frequency: f64,
    gain: f64,
    remaining: Option<u64>,
    fade_frames: u64,
    hold: RandomHold,
}

pub struct Renderer {
    shared: Arc<Shared>,
    state: Option<RenderState>,
    rng: StdRng,
}

impl Renderer {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        let rng = new_rng(shared.options.seed);
        Self {
            shared,
            state: None,
            rng,
        }
    }

    /// Fills `output` with interleaved frames of `channels` samples.
    /// Produces silence whenever no session is running.
    /// Returns the number of frames that carried signal.
    pub fn render(&mut self, output: &mut [f32]) -> usize {
        let channels = (self.shared.params.channels() as usize).max(1);
        let mut produced = 0;

        for frame in output.chunks_mut(channels) {
            match self.next_sample() {
                Some(sample) => {
                    frame.fill(sample as f32);
                    produced += 1;
                }
                None => frame.fill(0.0),
            }
        }

        if let Some(state) = &self.state {
            if self.shared.profile() == Profile::Continuous {
                self.shared.frequency.store(state.frequency);
            }
        }

        produced
    }

    /// Seconds rendered in the current session.
    pub fn elapsed(&self) -> f64 {
        match &self.state {
            Some(state) => state.frames as f64 / self.shared.params.sample_rate() as f64,
            None => 0.0,
        }
    }

    /// Carrier phase in `[0, 2π)`.
    pub fn phase(&self) -> f64 {
        self.state.as_ref().map(|x| x.phase).unwrap_or(0.0)
    }

    /// The frequency used for the last rendered frame.
    pub fn current_frequency(&self) -> Option<f64> {
        self.state.as_ref().map(|x| x.frequency)
    }

    /// Random-mode draws made in the current session.
    pub fn random_draws(&self) -> u64 {
        self.state.as_ref().map(|x| x.hold.draws()).unwrap_or(0)
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    fn next_sample(&mut self) -> Option<f64> {
        let session = self.shared.session.load();
        if !session.running {
            self.state = None;
            return None;
        }

        let config = self.shared.params.snapshot();
        if self.state.as_ref().map(|x| x.generation) != Some(session.generation) {
            self.state = Some(self.begin(session.generation, &config));
        }

        let state = self.state.as_mut()?;
        if let Some(remaining) = &mut state.remaining {
            if *remaining == 0 {
                self.shared.session.expire(session.generation);
                self.state = None;
                return None;
            }

            *remaining -= 1;
        }

        let sample_rate = config.sample_rate.max(1) as f64;
        state.frames += 1;
        let elapsed = state.frames as f64 / sample_rate;

        state.frequency = match self.shared.profile() {
            Profile::Continuous => config
                .sweep()
                .evaluate(elapsed, &mut state.hold, &mut self.rng),
            Profile::Polling => self.shared.frequency.load(),
        };

        state.phase = (state.phase + TAU * state.frequency / sample_rate).rem_euclid(TAU);

        let mut target = config.gain();
        if state.frames <= state.fade_frames {
            target *= state.frames as f64 / state.fade_frames as f64;
        }
        state.gain += (target - state.gain).clamp(-GAIN_SLEW, GAIN_SLEW);

        Some(state.gain * state.phase.sin())
    }

    fn begin(&mut self, generation: u64, config: &EngineConfig) -> RenderState {
        if let Some(seed) = self.shared.options.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }

        let fade_frames = self.shared.fade_frames();
        let duration = self.shared.duration_frames();

        RenderState {
            generation,
            frames: 0,
            phase: 0.0,
            frequency: 0.0,
            gain: if fade_frames > 0 { 0.0 } else { config.gain() },
            remaining: (duration > 0).then_some(duration),
            fade_frames,
            hold: RandomHold::default(),
        }
    }
}
