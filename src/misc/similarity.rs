//! Fuzzy string matching for picking audio devices by name.

use hashbrown::HashMap;

pub trait Similarity {
    fn similarity(&self, other: &Self) -> f64;
}

impl<T: AsRef<str>> Similarity for T {
    fn similarity(&self, other: &Self) -> f64 {
        similarity(self.as_ref(), other.as_ref())
    }
}

/// Dice coefficient of the character bigrams of both strings, ignoring spaces.
/// 1.0 for identical strings, 0.0 when nothing is shared.
pub fn similarity(str1: &str, str2: &str) -> f64 {
    let a = str1.replace(' ', "").chars().collect::<Vec<_>>();
    let b = str2.replace(' ', "").chars().collect::<Vec<_>>();

    if a == b {
        return 1.0;
    }

    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut bigrams = HashMap::<(char, char), u32>::new();
    for pair in a.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_default() += 1;
    }

    let mut shared = 0;
    for pair in b.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                shared += 1;
            }
        }
    }

    (2.0 * shared as f64) / (a.len() + b.len() - 2) as f64
}

#[cfg(test)]
mod test {
    use super::{similarity, Similarity};

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("night", "night"), 1.0);
        assert_eq!(similarity("a", "b"), 0.0);
        assert_eq!(similarity("night", "nacht"), 0.25);
        assert_eq!("Built-in Output".similarity(&"Built in Output"), 22.0 / 25.0);
    }

    #[test]
    fn test_picks_closest_device() {
        let wanted = "speakers";
        let devices = ["HDMI Output", "MacBook Speakers", "USB Microphone"];
        let best = devices
            .iter()
            .map(|x| (x.to_lowercase().similarity(&wanted.to_owned()), *x))
            .reduce(|a, b| if a.0 > b.0 { a } else { b })
            .unwrap();
        assert_eq!(best.1, "MacBook Speakers");
    }
}
