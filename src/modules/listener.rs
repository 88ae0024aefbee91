//! Listens on the input device and tracks the frequency it hears.

use parking_lot::Mutex;
use sweep_tone::audio::{
    algorithms::to_mono,
    analysis::{Detector, FrequencyTracker, MatchStatus},
    windows::BoxedWindow,
};

/// Samples per detection.
const DETECT_CHUNK: usize = 4096;

pub struct Listener {
    sample_rate: u32,
    channels: usize,
    detector: Detector,
    tracker: Mutex<FrequencyTracker>,
    work: Mutex<Vec<f32>>,
}

impl Listener {
    pub fn new(sample_rate: u32, channels: u16, window: BoxedWindow) -> Self {
        Self {
            sample_rate,
            channels: channels as usize,
            detector: Detector::with_window(window),
            tracker: Mutex::new(FrequencyTracker::default()),
            work: Mutex::new(Vec::with_capacity(DETECT_CHUNK * 2)),
        }
    }

    pub fn input(&self, input: &[f32]) {
        let mut work = self.work.lock();
        work.extend(to_mono(input, self.channels));

        for _ in 0..work.len() / DETECT_CHUNK {
            let chunk = work.drain(..DETECT_CHUNK).collect::<Vec<_>>();
            let detected = self.detector.detect(&chunk, self.sample_rate);
            self.tracker.lock().push(detected);
        }
    }

    /// Averaged detection and whether it matches `played`.
    pub fn status(&self, played: f64) -> (f64, MatchStatus) {
        let tracker = self.tracker.lock();
        (tracker.average(), tracker.status(played))
    }
}
