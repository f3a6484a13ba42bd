//! Ricker (Mexican-hat) wavelet and a single-family continuous wavelet
//! transform, matching `scipy.signal.cwt(x, ricker, widths)` row by row.

use rustfft::FftPlanner;

use crate::core::fft::fft_convolve_same_with;

/// Ricker wavelet sampled on `points` samples, centred at `(points - 1) / 2`.
///
/// `A * (1 - t²/a²) * exp(-t²/(2a²))` with `A = 2 / (sqrt(3a) * π^¼)`.
pub fn ricker(points: usize, a: f64) -> Vec<f64> {
    let amp = 2.0 / ((3.0 * a).sqrt() * std::f64::consts::PI.powf(0.25));
    let wsq = a * a;
    let center = (points as f64 - 1.0) / 2.0;
    (0..points)
        .map(|i| {
            let t = i as f64 - center;
            let tsq = t * t;
            amp * (1.0 - tsq / wsq) * (-tsq / (2.0 * wsq)).exp()
        })
        .collect()
}

/// Number of wavelet samples used for `width` on a signal of `len` samples.
#[inline]
fn support(width: f64, len: usize) -> usize {
    ((10.0 * width) as usize).clamp(1, len.max(1))
}

/// One CWT row: "same" convolution with the time-reversed wavelet.
pub fn cwt_row(signal: &[f64], width: f64) -> Vec<f64> {
    cwt_row_with(&mut FftPlanner::new(), signal, width)
}

pub fn cwt_row_with(planner: &mut FftPlanner<f64>, signal: &[f64], width: f64) -> Vec<f64> {
    let mut kernel = ricker(support(width, signal.len()), width);
    kernel.reverse();
    fft_convolve_same_with(planner, signal, &kernel)
}

/// Continuous wavelet transform, one output row per width.
pub fn cwt(signal: &[f64], widths: &[f64]) -> Vec<Vec<f64>> {
    let mut planner = FftPlanner::new();
    widths
        .iter()
        .map(|&w| cwt_row_with(&mut planner, signal, w))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ricker_is_symmetric_with_peak_at_center() {
        let w = ricker(51, 5.0);
        for i in 0..25 {
            assert_relative_eq!(w[i], w[50 - i], epsilon = 1e-12);
        }
        let peak = w.iter().cloned().fold(f64::MIN, f64::max);
        assert_relative_eq!(peak, w[25]);
        let expected = 2.0 / ((15.0f64).sqrt() * std::f64::consts::PI.powf(0.25));
        assert_relative_eq!(w[25], expected, epsilon = 1e-12);
    }

    #[test]
    fn ricker_has_zero_crossings_at_width() {
        // 1 - t²/a² vanishes at t = ±a.
        let w = ricker(41, 4.0);
        assert!(w[20 - 4].abs() < 1e-12);
        assert!(w[20 + 4].abs() < 1e-12);
        assert!(w[20 - 6] < 0.0);
    }

    #[test]
    fn cwt_rows_follow_widths() {
        let x: Vec<f64> = (0..300).map(|i| (i as f64 * 0.3).sin()).collect();
        let rows = cwt(&x, &[2.0, 5.0]);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.len() == x.len()));
        assert_eq!(rows[1], cwt_row(&x, 5.0));
    }

    #[test]
    fn cwt_of_constant_is_small_in_the_interior() {
        // The Ricker wavelet integrates to ~0, so DC is rejected.
        let x = vec![1.0; 400];
        let row = cwt_row(&x, 3.0);
        for v in &row[50..350] {
            assert!(v.abs() < 1e-3, "dc leak {v}");
        }
    }

    #[test]
    fn support_is_clamped_to_signal_length() {
        let x = vec![0.5; 8];
        assert_eq!(cwt_row(&x, 5.0).len(), 8);
    }
}
