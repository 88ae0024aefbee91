//! Sweep evaluator.
//! Maps elapsed time and the sweep settings to an instantaneous frequency.
//!
//! Every mode is expressed on `x = frac(t)` where `t = elapsed * sweep_rate`
//! is the number of sweep cycles since playback started:
//!
//! | Mode        | Frequency                                  |
//! |-------------|--------------------------------------------|
//! | Linear      | `min + range * x`                          |
//! | Sawtooth    | `min + range * x`                          |
//! | Triangle    | `min + range * (x < .5 ? 2x : 2 - 2x)`      |
//! | Sine        | `min + range * (0.5 + 0.5 * sin(2πt))`     |
//! | Square      | `x < .5 ? min : max`                       |
//! | Exponential | `min * (max / min)^x`                      |
//! | Logarithmic | `max - range * log10(1 + 9x)`              |
//! | Random      | uniform draw per whole cycle, held         |
//!
//! Logarithmic falls from `max` at the start of a cycle to `min` at its end.

use std::{f64::consts::TAU, fmt, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Shape of the frequency trajectory.
/// This never changes the carrier, which is always a sine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SweepMode {
    Linear = 0,
    Sine = 1,
    Triangle = 2,
    Exponential = 3,
    Logarithmic = 4,
    Square = 5,
    Sawtooth = 6,
    Random = 7,
}

impl SweepMode {
    pub const ALL: [SweepMode; 8] = [
        SweepMode::Linear,
        SweepMode::Sine,
        SweepMode::Triangle,
        SweepMode::Exponential,
        SweepMode::Logarithmic,
        SweepMode::Square,
        SweepMode::Sawtooth,
        SweepMode::Random,
    ];

    /// Canonical integer id of this mode.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Looks a mode up by its canonical id.
    /// Unknown ids are rejected instead of falling back to a default mode.
    pub fn from_id(id: i64) -> Result<Self, EngineError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(EngineError::UnknownSweepMode(id))
    }

    pub fn name(self) -> &'static str {
        match self {
            SweepMode::Linear => "linear",
            SweepMode::Sine => "sine",
            SweepMode::Triangle => "triangle",
            SweepMode::Exponential => "exponential",
            SweepMode::Logarithmic => "logarithmic",
            SweepMode::Square => "square",
            SweepMode::Sawtooth => "sawtooth",
            SweepMode::Random => "random",
        }
    }

    /// Modes whose formula divides by or takes the log of the minimum.
    pub fn needs_positive_min(self) -> bool {
        matches!(self, SweepMode::Exponential | SweepMode::Logarithmic)
    }
}

impl Default for SweepMode {
    fn default() -> Self {
        SweepMode::Linear
    }
}

impl fmt::Display for SweepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SweepMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|x| x.name() == s)
            .ok_or(EngineError::UnknownSweepModeName(s))
    }
}

/// The parameters the evaluator reads, copied out of the parameter store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    pub min: f64,
    pub max: f64,
    pub rate: f64,
    pub mode: SweepMode,
}

/// Per-cycle cache for [`SweepMode::Random`].
/// A new frequency is only drawn when the cycle index changes.
#[derive(Debug, Clone, Default)]
pub struct RandomHold {
    cycle: Option<u64>,
    value: f64,
    draws: u64,
}

impl RandomHold {
    pub fn reset(&mut self) {
        self.cycle = None;
        self.value = 0.0;
        self.draws = 0;
    }

    /// Number of frequencies drawn since the last reset.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl Sweep {
    fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Frequency at `elapsed` seconds for every mode except Random.
    /// Random needs a cache and a source of randomness, see [`Sweep::evaluate`].
    pub fn frequency_at(&self, elapsed: f64) -> f64 {
        let t = elapsed * self.rate;
        let x = frac(t);

        match self.mode {
            SweepMode::Linear | SweepMode::Sawtooth => self.min + self.range() * x,
            SweepMode::Triangle => self.min + self.range() * triangle(x),
            SweepMode::Sine => self.min + self.range() * (0.5 + 0.5 * (TAU * t).sin()),
            SweepMode::Square if x < 0.5 => self.min,
            SweepMode::Square => self.max,
            SweepMode::Exponential => self.min * (self.max / self.min).powf(x),
            SweepMode::Logarithmic => self.max - self.range() * (1.0 + x * 9.0).log10(),
            // Without a cache the best we can do is the middle of the range
            SweepMode::Random => self.min + self.range() * 0.5,
        }
    }

    /// Frequency at `elapsed` seconds, drawing into `hold` for Random sweeps.
    pub fn evaluate(&self, elapsed: f64, hold: &mut RandomHold, rng: &mut impl Rng) -> f64 {
        if self.mode != SweepMode::Random {
            return self.frequency_at(elapsed);
        }

        let cycle = (elapsed * self.rate).floor().max(0.0) as u64;
        if hold.cycle != Some(cycle) {
            hold.cycle = Some(cycle);
            hold.value = self.min + self.range() * rng.gen::<f64>();
            hold.draws += 1;
        }

        hold.value
    }
}

fn frac(t: f64) -> f64 {
    t - t.floor()
}

/// Ramps 0 -> 1 over the first half cycle and back down over the second.
fn triangle(x: f64) -> f64 {
    if x < 0.5 {
        x * 2.0
    } else {
        2.0 - x * 2.0
    }
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;
    use rand::{rngs::StdRng, SeedableRng};

    use super::{RandomHold, Sweep, SweepMode};

    fn sweep(mode: SweepMode) -> Sweep {
        Sweep {
            min: 220.0,
            max: 880.0,
            rate: 1.0,
            mode,
        }
    }

    #[test]
    fn test_mode_ids() {
        for (i, mode) in SweepMode::ALL.iter().enumerate() {
            assert_eq!(mode.id() as usize, i);
            assert_eq!(SweepMode::from_id(i as i64).unwrap(), *mode);
            assert_eq!(mode.name().parse::<SweepMode>().unwrap(), *mode);
        }

        assert!(SweepMode::from_id(8).is_err());
        assert!(SweepMode::from_id(-1).is_err());
        assert!("wobble".parse::<SweepMode>().is_err());
        assert_eq!(" Sine".parse::<SweepMode>().unwrap(), SweepMode::Sine);
    }

    #[test]
    fn test_constant_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for mode in SweepMode::ALL {
            let s = Sweep {
                min: 440.0,
                max: 440.0,
                rate: 3.0,
                mode,
            };

            let mut hold = RandomHold::default();
            for i in 0..1000 {
                let f = s.evaluate(i as f64 * 0.0123, &mut hold, &mut rng);
                assert_abs_diff_eq!(f, 440.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_linear_periodic() {
        for mode in [SweepMode::Linear, SweepMode::Sawtooth] {
            let s = Sweep { rate: 4.0, ..sweep(mode) };
            assert_eq!(s.frequency_at(0.0), 220.0);
            assert_abs_diff_eq!(s.frequency_at(0.125), 550.0, epsilon = 1e-9);

            // Approaches max just before the end of a cycle then resets
            assert!(s.frequency_at(0.2499) > 879.0);
            assert_abs_diff_eq!(s.frequency_at(0.25), 220.0, epsilon = 1e-9);

            for i in 0..100 {
                let t = i as f64 * 0.0371;
                assert_abs_diff_eq!(s.frequency_at(t), s.frequency_at(t + 0.25), epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_triangle() {
        let s = sweep(SweepMode::Triangle);
        assert_eq!(s.frequency_at(0.0), 220.0);
        assert_abs_diff_eq!(s.frequency_at(0.25), 550.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.frequency_at(0.5), 880.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.frequency_at(0.75), 550.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.frequency_at(0.99999), 220.0, epsilon = 0.1);
    }

    #[test]
    fn test_sine() {
        let s = sweep(SweepMode::Sine);
        assert_abs_diff_eq!(s.frequency_at(0.0), 550.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.frequency_at(0.25), 880.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.frequency_at(0.5), 550.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.frequency_at(0.75), 220.0, epsilon = 1e-9);
    }

    #[test]
    fn test_square_never_between() {
        let s = Sweep { rate: 3.3, ..sweep(SweepMode::Square) };
        for i in 0..10_000 {
            let f = s.frequency_at(i as f64 / 1000.0);
            assert!(f == 220.0 || f == 880.0, "got {f}");
        }

        assert_eq!(s.frequency_at(0.0), 220.0);
        assert_eq!(s.frequency_at(0.5 / 3.3 + 1e-6), 880.0);
    }

    #[test]
    fn test_exponential() {
        let s = sweep(SweepMode::Exponential);
        assert_abs_diff_eq!(s.frequency_at(0.0), 220.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.frequency_at(0.5), 440.0, epsilon = 1e-9);
        assert!(s.frequency_at(0.9999) < 880.0);
        assert!(s.frequency_at(0.9999) > 879.0);
    }

    #[test]
    fn test_logarithmic() {
        let s = sweep(SweepMode::Logarithmic);
        assert_abs_diff_eq!(s.frequency_at(0.0), 880.0, epsilon = 1e-9);
        // log10(5.5) of the way down
        assert_abs_diff_eq!(s.frequency_at(0.5), 880.0 - 660.0 * 5.5_f64.log10(), epsilon = 1e-9);
        assert_abs_diff_eq!(s.frequency_at(0.999999), 220.0, epsilon = 0.01);

        // Monotonically falling within a cycle
        let mut last = f64::INFINITY;
        for i in 0..100 {
            let f = s.frequency_at(i as f64 / 100.0);
            assert!(f < last);
            last = f;
        }
    }

    #[test]
    fn test_random_hold() {
        let s = Sweep { rate: 2.0, ..sweep(SweepMode::Random) };
        let mut rng = StdRng::seed_from_u64(42);
        let mut hold = RandomHold::default();

        let a = s.evaluate(0.01, &mut hold, &mut rng);
        let b = s.evaluate(0.49, &mut hold, &mut rng);
        assert_eq!(a, b);
        assert_eq!(hold.draws(), 1);
        assert!((220.0..=880.0).contains(&a));

        s.evaluate(0.51, &mut hold, &mut rng);
        assert_eq!(hold.draws(), 2);

        hold.reset();
        assert_eq!(hold.draws(), 0);
    }

    #[test]
    fn test_random_seeded() {
        let s = sweep(SweepMode::Random);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut hold = RandomHold::default();
            (0..10)
                .map(|i| s.evaluate(i as f64, &mut hold, &mut rng))
                .collect::<Vec<_>>()
        };

        assert_eq!(run(1), run(1));
        assert_ne!(run(1), run(2));
    }
}
