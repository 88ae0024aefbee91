//! Continuous sweep: the renderer evaluates the sweep for every sample.

use std::sync::Arc;

use anyhow::Result;
use sweep_tone::{config::SessionConfig, Engine};

use super::{listener::Listener, InitContext, Module};

pub struct Sweep {
    config: SessionConfig,
    engine: Arc<Engine>,
    listener: Option<Listener>,
}

impl Sweep {
    pub fn new(ctx: InitContext) -> Arc<Self> {
        Arc::new(Self {
            engine: ctx.engine(),
            config: ctx.config,
            listener: ctx.listener,
        })
    }
}

impl Module for Sweep {
    fn name(&self) -> &'static str {
        "Sweep"
    }

    fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    fn init(&self) -> Result<()> {
        self.config.apply(&self.engine)?;
        self.engine.start_audio(self.config.duration_ms)?;

        println!(
            "[*] Sweeping {} Hz to {} Hz ({}, {} cycles/s)",
            self.config.min_frequency,
            self.config.max_frequency,
            self.config.sweep_mode,
            self.config.sweep_rate
        );
        Ok(())
    }

    fn listener(&self) -> Option<&Listener> {
        self.listener.as_ref()
    }
}
