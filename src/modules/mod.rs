//! Programs the binary can run on the audio devices.

use std::sync::Arc;

use anyhow::Result;
use sweep_tone::{config::SessionConfig, Engine};

pub mod listener;
pub mod sweep;
pub mod tone;

use listener::Listener;

pub trait Module {
    fn name(&self) -> &'static str;
    /// The engine whose renderer feeds the output stream.
    fn engine(&self) -> &Arc<Engine>;
    /// Configures the engine and starts playback.
    fn init(&self) -> Result<()>;
    /// Releases the engine and anything driving it.
    fn cleanup(&self) {
        self.engine().cleanup_audio();
    }
    fn listener(&self) -> Option<&Listener> {
        None
    }
    fn input(&self, input: &[f32]) {
        if let Some(listener) = self.listener() {
            listener.input(input);
        }
    }
}

pub struct InitContext {
    pub config: SessionConfig,
    pub listener: Option<Listener>,
}

impl InitContext {
    pub fn engine(&self) -> Arc<Engine> {
        Arc::new(Engine::new(self.config.engine_options()))
    }
}
