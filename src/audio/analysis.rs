//! Frequency detection, used to check what the output device actually plays
//! by listening to it through an input device.

use std::{fmt, sync::Arc};

use num_complex::Complex;
use parking_lot::Mutex;
use rustfft::{Fft, FftPlanner};

use super::{
    algorithms::{find_peaks, parabolic_peak},
    windows::{BoxedWindow, HannWindow},
};
use crate::misc::ring_buffer::RingBuffer;

/// Zero padding factor applied before the FFT.
pub const PADDING: usize = 4;
/// Peaks below this fraction of the strongest bin are ignored.
pub const PEAK_THRESHOLD: f64 = 0.1;
/// Relative error still counted as a match.
pub const MATCH_TOLERANCE: f64 = 0.05;

/// Estimates the dominant frequency of `samples` in Hz.
/// Returns 0.0 when the spectrum has no peak.
pub fn detect_frequency(samples: &[f32], sample_rate: u32) -> f64 {
    Detector::new().detect(samples, sample_rate)
}

/// FFT based frequency detector.
/// Keeps its planner around so repeated calls with the same block size reuse the plan.
pub struct Detector {
    planner: Mutex<FftPlanner<f64>>,
    window: BoxedWindow,
}

impl Detector {
    pub fn new() -> Self {
        Self::with_window(Box::new(HannWindow))
    }

    pub fn with_window(window: BoxedWindow) -> Self {
        Self {
            planner: Mutex::new(FftPlanner::new()),
            window,
        }
    }

    pub fn detect(&self, samples: &[f32], sample_rate: u32) -> f64 {
        if samples.len() < 2 {
            return 0.0;
        }

        let data = samples.iter().map(|&x| x as f64).collect::<Vec<_>>();
        let windowed = self.window.window(&data);

        let size = windowed.len() * PADDING;
        let mut buf = windowed
            .iter()
            .map(|&x| Complex::new(x, 0.0))
            .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
            .take(size)
            .collect::<Vec<_>>();

        let fft: Arc<dyn Fft<f64>> = self.planner.lock().plan_fft_forward(size);
        fft.process(&mut buf);

        // Real input, so only the first half of the spectrum is interesting
        let magnitude = buf[..=size / 2].iter().map(|x| x.norm()).collect::<Vec<_>>();
        let max = magnitude.iter().copied().fold(0.0, f64::max);

        let Some(peak) = find_peaks(&magnitude, max * PEAK_THRESHOLD)
            .into_iter()
            .reduce(|a, b| if magnitude[b] > magnitude[a] { b } else { a })
        else {
            return 0.0;
        };

        let (bin, _) = parabolic_peak(&magnitude, peak);
        bin * sample_rate as f64 / size as f64
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-frequency correction for the input device's response.
/// Detected frequencies are divided by the interpolated factor.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    points: Vec<(f64, f64)>,
}

impl Calibration {
    pub fn new(mut points: Vec<(f64, f64)>) -> Self {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { points }
    }

    /// No correction at all.
    pub fn flat() -> Self {
        Self::new(vec![(0.0, 1.0)])
    }

    /// Linearly interpolated factor, clamped to the end points.
    pub fn factor(&self, freq: f64) -> f64 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return 1.0;
        };

        if freq <= first.0 {
            return first.1;
        }

        if freq >= last.0 {
            return last.1;
        }

        for pair in self.points.windows(2) {
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            if x0 <= freq && freq < x1 {
                let t = (freq - x0) / (x1 - x0);
                return y0 * (1.0 - t) + y1 * t;
            }
        }

        1.0
    }

    pub fn apply(&self, freq: f64) -> f64 {
        freq / self.factor(freq)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(vec![
            (20.0, 1.2),
            (100.0, 1.0),
            (300.0, 1.0),
            (1000.0, 1.1),
            (5000.0, 1.0),
            (10000.0, 1.0),
            (15000.0, 1.0),
            (20000.0, 1.0),
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Match,
    Mismatch,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchStatus::Match => "MATCH",
            MatchStatus::Mismatch => "MISMATCH",
        })
    }
}

/// Moving average of the last ten calibrated detections.
pub struct FrequencyTracker {
    calibration: Calibration,
    history: RingBuffer<f64, 10>,
}

impl FrequencyTracker {
    pub fn new(calibration: Calibration) -> Self {
        Self {
            calibration,
            history: RingBuffer::new(),
        }
    }

    /// Adds a raw detection and returns the new average.
    pub fn push(&mut self, detected: f64) -> f64 {
        self.history.push(self.calibration.apply(detected));
        self.average()
    }

    pub fn average(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }

        self.history.avg()
    }

    pub fn status(&self, played: f64) -> MatchStatus {
        if !self.history.is_empty()
            && (self.average() - played).abs() <= MATCH_TOLERANCE * played
        {
            return MatchStatus::Match;
        }

        MatchStatus::Mismatch
    }
}

impl Default for FrequencyTracker {
    fn default() -> Self {
        Self::new(Calibration::default())
    }
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;

    use super::{detect_frequency, Calibration, Detector, FrequencyTracker, MatchStatus};
    use crate::audio::{tone::Tone, windows::SquareWindow};

    #[test]
    fn test_detect_tone() {
        for freq in [220.0, 1000.0, 3150.0] {
            let samples = Tone::new(freq, 44100).take(4096).collect::<Vec<_>>();
            assert_abs_diff_eq!(detect_frequency(&samples, 44100), freq as f64, epsilon = 3.0);
        }
    }

    #[test]
    fn test_detect_without_window() {
        let samples = Tone::new(1000.0, 48000).take(4800).collect::<Vec<_>>();
        let detector = Detector::with_window(Box::new(SquareWindow));
        assert_abs_diff_eq!(detector.detect(&samples, 48000), 1000.0, epsilon = 5.0);
    }

    #[test]
    fn test_detect_silence() {
        assert_eq!(detect_frequency(&[0.0; 1024], 44100), 0.0);
        assert_eq!(detect_frequency(&[], 44100), 0.0);
    }

    #[test]
    fn test_calibration() {
        let cal = Calibration::default();
        assert_abs_diff_eq!(cal.factor(10.0), 1.2);
        assert_abs_diff_eq!(cal.factor(60.0), 1.1, epsilon = 1e-12);
        assert_abs_diff_eq!(cal.factor(650.0), 1.05, epsilon = 1e-12);
        assert_abs_diff_eq!(cal.factor(1000.0), 1.1);
        assert_abs_diff_eq!(cal.factor(30000.0), 1.0);
        assert_abs_diff_eq!(cal.apply(1100.0), 1100.0 / cal.factor(1100.0));

        assert_eq!(Calibration::new(Vec::new()).factor(500.0), 1.0);
        assert_eq!(Calibration::flat().apply(440.0), 440.0);
    }

    #[test]
    fn test_tracker_status() {
        let mut tracker = FrequencyTracker::default();
        assert_eq!(tracker.average(), 0.0);
        assert_eq!(tracker.status(1000.0), MatchStatus::Mismatch);

        for _ in 0..10 {
            tracker.push(1100.0);
        }
        assert_abs_diff_eq!(tracker.average(), 1100.0 / tracker.calibration.factor(1100.0));
        assert_eq!(tracker.status(1000.0), MatchStatus::Match);
        assert_eq!(tracker.status(2000.0), MatchStatus::Mismatch);

        // Only the last ten detections count
        for _ in 0..10 {
            tracker.push(4000.0);
        }
        assert_eq!(tracker.status(1000.0), MatchStatus::Mismatch);
        assert_eq!(MatchStatus::Match.to_string(), "MATCH");
    }
}
