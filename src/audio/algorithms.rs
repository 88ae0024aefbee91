//! Audio processing algorithms.

/// Averages interleaved frames down to one channel.
pub fn to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    let channels = channels.max(1);
    samples
        .chunks(channels)
        .map(|x| x.iter().sum::<f32>() / x.len() as f32)
        .collect()
}

/// Refines the position of the peak at `x` by fitting a parabola through it
/// and its two neighbours. Returns the fractional index and the peak height.
pub fn parabolic_peak(data: &[f64], x: usize) -> (f64, f64) {
    let (a, b, c) = (data[x - 1], data[x], data[x + 1]);
    let denom = a - 2.0 * b + c;
    if denom == 0.0 {
        return (x as f64, b);
    }

    let offset = 0.5 * (a - c) / denom;
    (x as f64 + offset, b - 0.25 * (a - c) * offset)
}

/// Indices of local maxima strictly above `min_height`.
pub fn find_peaks(data: &[f64], min_height: f64) -> Vec<usize> {
    (1..data.len().saturating_sub(1))
        .filter(|&i| data[i] > data[i - 1] && data[i] > data[i + 1] && data[i] > min_height)
        .collect()
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;

    use super::{find_peaks, parabolic_peak, to_mono};

    #[test]
    fn test_to_mono() {
        assert_eq!(to_mono(&[1.0, 0.0, 0.5, 0.5], 2), vec![0.5, 0.5]);
        assert_eq!(to_mono(&[1.0, 2.0], 1), vec![1.0, 2.0]);
    }

    #[test]
    fn test_peaks() {
        let data = [0.0, 1.0, 0.0, 3.0, 4.0, 3.0, 0.0];
        assert_eq!(find_peaks(&data, 0.5), vec![1, 4]);
        assert_eq!(find_peaks(&data, 2.0), vec![4]);
        assert!(find_peaks(&[1.0], 0.0).is_empty());

        let (x, y) = parabolic_peak(&data, 4);
        assert_abs_diff_eq!(x, 4.0);
        assert_abs_diff_eq!(y, 4.0);

        let (x, _) = parabolic_peak(&[1.0, 3.0, 2.0], 1);
        assert!(x > 1.0 && x < 1.5);
    }
}
