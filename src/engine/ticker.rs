//! Periodic driver for the polling profile.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use tracing::trace;

use super::Engine;

/// Calls [`Engine::update_frequency`] every `interval` on its own thread.
/// Stops when [`Ticker::stop`] is called or the ticker is dropped.
pub struct Ticker {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<u64>>,
}

impl Ticker {
    pub fn spawn(engine: Arc<Engine>, interval: Duration) -> Self {
        let (tx, rx) = channel::bounded::<()>(1);
        let handle = thread::spawn(move || {
            let mut ticks = 0;
            loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        engine.update_frequency();
                        ticks += 1;
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }

            trace!(ticks, "ticker exited");
            ticks
        });

        Self {
            stop: Some(tx),
            handle: Some(handle),
        }
    }

    /// Stops the thread and returns how many updates it made.
    pub fn stop(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        // Dropping the sender wakes the thread as well
        if let Some(stop) = self.stop.take() {
            let _ = stop.try_send(());
        }

        self.handle
            .take()
            .and_then(|x| x.join().ok())
            .unwrap_or(0)
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, thread, time::Duration};

    use super::Ticker;
    use crate::engine::{Engine, EngineOptions, Profile, SweepMode};

    #[test]
    fn test_ticker_publishes() {
        let engine = Arc::new(Engine::new(EngineOptions {
            profile: Profile::Polling,
            ..EngineOptions::default()
        }));
        engine.set_sweep_mode(SweepMode::Square.id() as i64).unwrap();
        engine.initialize_audio(100.0, 200.0, 44100, 1).unwrap();
        engine.start_audio(0).unwrap();

        let ticker = Ticker::spawn(engine.clone(), Duration::from_millis(5));
        thread::sleep(Duration::from_millis(60));
        assert!(ticker.stop() > 0);

        // First half of the first cycle
        assert_eq!(engine.current_frequency(), 100.0);
    }

    #[test]
    fn test_ticker_stops_on_drop() {
        let engine = Arc::new(Engine::default());
        let ticker = Ticker::spawn(engine.clone(), Duration::from_secs(60));
        drop(ticker);
        assert_eq!(Arc::strong_count(&engine), 1);
    }
}
