//! Window functions applied before frequency analysis.

use std::{borrow::Cow, f64::consts::TAU};

pub type BoxedWindow = Box<dyn Window + Send + Sync>;

pub trait Window {
    fn name(&self) -> &'static str;
    fn window<'a>(&self, samples: &'a [f64]) -> Cow<'a, [f64]>;
}

/// Looks a window up by its name or first letter.
pub fn get_window(name: &str) -> Option<BoxedWindow> {
    Some(match name.to_ascii_lowercase().as_str() {
        "s" | "square" => Box::new(SquareWindow),
        "h" | "hann" => Box::new(HannWindow),
        _ => return None,
    })
}

/// No windowing at all.
pub struct SquareWindow;

impl Window for SquareWindow {
    fn name(&self) -> &'static str {
        "square"
    }

    fn window<'a>(&self, samples: &'a [f64]) -> Cow<'a, [f64]> {
        Cow::Borrowed(samples)
    }
}

/// Symmetric Hann window, zero at both ends.
pub struct HannWindow;

impl Window for HannWindow {
    fn name(&self) -> &'static str {
        "hann"
    }

    fn window<'a>(&self, samples: &'a [f64]) -> Cow<'a, [f64]> {
        if samples.len() < 2 {
            return Cow::Borrowed(samples);
        }

        let span = (samples.len() - 1) as f64;
        let out = samples
            .iter()
            .enumerate()
            .map(|(i, &e)| {
                let w = 0.5 * (1.0 - (TAU * i as f64 / span).cos());
                w * e
            })
            .collect();

        Cow::Owned(out)
    }
}
