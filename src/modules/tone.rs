//! Pushed tone: a ticker recomputes the frequency every 100ms and the
//! renderer keeps playing whatever was published last.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use sweep_tone::{
    config::SessionConfig,
    engine::{Ticker, POLL_INTERVAL},
    Engine,
};

use super::{listener::Listener, InitContext, Module};

pub struct Tone {
    config: SessionConfig,
    engine: Arc<Engine>,
    ticker: Mutex<Option<Ticker>>,
    listener: Option<Listener>,
}

impl Tone {
    pub fn new(ctx: InitContext) -> Arc<Self> {
        Arc::new(Self {
            engine: ctx.engine(),
            config: ctx.config,
            ticker: Mutex::new(None),
            listener: ctx.listener,
        })
    }
}

impl Module for Tone {
    fn name(&self) -> &'static str {
        "Tone"
    }

    fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    fn init(&self) -> Result<()> {
        self.config.apply(&self.engine)?;
        self.engine.set_frequency(self.config.max_frequency)?;
        self.engine.start_audio(self.config.duration_ms)?;
        *self.ticker.lock() = Some(Ticker::spawn(self.engine.clone(), POLL_INTERVAL));

        println!("[*] Playing {} Hz", self.config.max_frequency);
        Ok(())
    }

    fn cleanup(&self) {
        if let Some(ticker) = self.ticker.lock().take() {
            ticker.stop();
        }

        self.engine.cleanup_audio();
    }

    fn listener(&self) -> Option<&Listener> {
        self.listener.as_ref()
    }
}
