use std::f32::consts::PI;

/// Fixed-frequency sine generator.
/// Used as a reference signal when checking the analysis code.
#[derive(Clone, Copy, Debug)]
pub struct Tone {
    i: usize,
    tone: f32,
    sample_rate: f32,
    duration: Option<u32>,
}

impl Tone {
    pub fn new(tone: f32, sample_rate: u32) -> Self {
        Self {
            i: 0,
            sample_rate: sample_rate as f32,
            tone,
            duration: None,
        }
    }

    /// Limits the tone to `duration` samples.
    pub fn duration(mut self, duration: u32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn reset(&mut self) {
        self.i = 0;
    }
}

impl Iterator for Tone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        self.i += 1;

        match self.duration {
            Some(i) if self.i > i as usize => return None,
            _ => {}
        }

        Some((self.i as f32 * self.tone * 2.0 * PI / self.sample_rate).sin())
    }
}
