//! Lifecycle state machine and the session flag shared with the renderer.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};

use rand::{rngs::StdRng, SeedableRng};

use super::sweep::RandomHold;
use crate::error::EngineError;

/// Engine lifecycle states.
/// `Uninitialized -> Configured -> Running -> Stopped (-> Configured | Uninitialized)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Uninitialized,
    Configured,
    Running,
    Stopped,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Uninitialized => "uninitialized",
            State::Configured => "configured",
            State::Running => "running",
            State::Stopped => "stopped",
        })
    }
}

/// A view of the [`SessionFlag`] at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub generation: u64,
    pub running: bool,
}

/// Lock-free "is running" flag, tagged with a generation counter.
///
/// The low bit is the running flag and the rest counts started sessions.
/// Packing both into one word lets the renderer end a timed session with a
/// single compare-exchange that can never stop a newer session by mistake.
#[derive(Debug, Default)]
pub struct SessionFlag(AtomicU64);

impl SessionFlag {
    pub fn load(&self) -> Session {
        let raw = self.0.load(Ordering::Acquire);
        Session {
            generation: raw >> 1,
            running: raw & 1 == 1,
        }
    }

    pub fn is_running(&self) -> bool {
        self.load().running
    }

    /// Starts a new session and returns its generation.
    /// Only called by the control context while holding the lifecycle lock.
    pub fn begin(&self) -> u64 {
        let generation = (self.0.load(Ordering::Acquire) >> 1).wrapping_add(1);
        self.0.store(generation << 1 | 1, Ordering::Release);
        generation
    }

    /// Clears the running flag, keeping the generation.
    pub fn end(&self) {
        self.0.fetch_and(!1, Ordering::AcqRel);
    }

    /// Ends the session `generation` if it is still the running one.
    /// Used by the renderer when a timed session runs out.
    pub fn expire(&self, generation: u64) -> bool {
        let running = generation << 1 | 1;
        self.0
            .compare_exchange(running, running & !1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Control-side lifecycle bookkeeping, guarded by the engine's lifecycle lock.
/// The render context never touches this.
pub(crate) struct Lifecycle {
    pub state: State,
    /// Wall-clock start of the running session, for the polling profile.
    pub started: Option<Instant>,
    /// Random-mode cache for the polling profile.
    pub hold: RandomHold,
    pub rng: StdRng,
}

impl Lifecycle {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            state: State::Uninitialized,
            started: None,
            hold: RandomHold::default(),
            rng: new_rng(seed),
        }
    }

    /// Folds a session the renderer ended on its own (timed playback) back
    /// into the state machine.
    pub fn sync(&mut self, session: &SessionFlag) {
        if self.state == State::Running && !session.is_running() {
            self.state = State::Stopped;
            self.started = None;
        }
    }

    /// Resets the per-session control state at the start of playback.
    pub fn begin(&mut self, seed: Option<u64>) {
        self.started = Some(Instant::now());
        self.hold.reset();
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
    }

    /// Errors unless the current state is one of `allowed`.
    pub fn expect(&self, operation: &'static str, allowed: &[State]) -> Result<(), EngineError> {
        if allowed.contains(&self.state) {
            return Ok(());
        }

        Err(EngineError::InvalidTransition {
            operation,
            state: self.state,
        })
    }
}

pub(crate) fn new_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
