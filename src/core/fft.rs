use rustfft::{FftPlanner, num_complex::Complex64};

// ======================================================================
// FFT-based convolution ("same" mode)
// ======================================================================

/// FFT convolution with "same" output length (SciPy-compatible).
pub fn fft_convolve_same(x: &[f64], h: &[f64]) -> Vec<f64> {
    fft_convolve_same_with(&mut FftPlanner::new(), x, h)
}

/// [`fft_convolve_same`] drawing plans from a caller-owned planner, so
/// repeated calls at one length plan the transform once.
pub fn fft_convolve_same_with(planner: &mut FftPlanner<f64>, x: &[f64], h: &[f64]) -> Vec<f64> {
    let nx = x.len();
    let nh = h.len();
    if nx == 0 || nh == 0 {
        return Vec::new();
    }

    // Use direct convolution for small signals
    let direct_limit: usize = 16_384;
    if nx.saturating_mul(nh) <= direct_limit {
        return conv_same_direct(x, h);
    }

    // Linear convolution via FFT
    let n_full = nx + nh - 1;
    let n_fft = n_full.next_power_of_two();

    let mut xa = vec![Complex64::new(0.0, 0.0); n_fft];
    let mut hb = vec![Complex64::new(0.0, 0.0); n_fft];

    for (i, &v) in x.iter().enumerate() {
        xa[i].re = v;
    }
    for (i, &v) in h.iter().enumerate() {
        hb[i].re = v;
    }

    let fft = planner.plan_fft_forward(n_fft);
    let ifft = planner.plan_fft_inverse(n_fft);

    fft.process(&mut xa);
    fft.process(&mut hb);

    for (a, b) in xa.iter_mut().zip(&hb) {
        *a *= b;
    }

    // IFFT and scale
    ifft.process(&mut xa);
    let scale = 1.0 / n_fft as f64;

    // Crop "same" segment
    let start = (nh - 1) / 2;
    xa[start..start + nx].iter().map(|z| z.re * scale).collect()
}

#[inline]
fn conv_same_direct(x: &[f64], h: &[f64]) -> Vec<f64> {
    let nx = x.len();
    let nh = h.len();
    let n_full = nx + nh - 1;
    let mut y_full = vec![0.0f64; n_full];

    for (i, &xi) in x.iter().enumerate() {
        for (j, &hj) in h.iter().enumerate() {
            y_full[i + j] += xi * hj;
        }
    }

    let start = (nh - 1) / 2;
    y_full[start..start + nx].to_vec()
}

/// Compute analytic signal (Hilbert transform) over the exact input length.
/// Returns complex output: real=input, imag=Hilbert(x).
pub fn hilbert(x: &[f64]) -> Vec<Complex64> {
    hilbert_with(&mut FftPlanner::new(), x)
}

pub fn hilbert_with(planner: &mut FftPlanner<f64>, x: &[f64]) -> Vec<Complex64> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }
    let mut buf: Vec<Complex64> = x.iter().map(|&v| Complex64::new(v, 0.0)).collect();

    let fft = planner.plan_fft_forward(n);
    let ifft = planner.plan_fft_inverse(n);

    fft.process(&mut buf);

    // Frequency-domain multiplier: DC (and Nyquist) kept, positive doubled,
    // negative zeroed.
    let positive_end = n.div_ceil(2);
    for (k, z) in buf.iter_mut().enumerate() {
        if k == 0 || (n.is_multiple_of(2) && k == n / 2) {
            continue;
        }
        if k < positive_end {
            *z *= 2.0;
        } else {
            *z = Complex64::new(0.0, 0.0);
        }
    }

    ifft.process(&mut buf);

    // rustfft does not scale the inverse
    let scale = 1.0 / n as f64;
    buf.iter_mut().for_each(|z| *z *= scale);

    buf
}

// ======================================================================
// Tests
// ======================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    // Reference "same" via explicit linear convolution then crop.
    fn same_ref(x: &[f64], h: &[f64]) -> Vec<f64> {
        let n = x.len();
        let m = h.len();
        let mut full = vec![0.0f64; n + m - 1];
        for i in 0..n {
            for j in 0..m {
                full[i + j] += x[i] * h[j];
            }
        }
        let start = (m - 1) / 2;
        full[start..start + n].to_vec()
    }

    fn sine(f: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * f * i as f64 / n as f64).sin())
            .collect()
    }

    #[test]
    fn convolve_same_matches_reference_on_fft_path() {
        let x: Vec<f64> = (0..4000).map(|i| ((i * 37 % 101) as f64 - 50.0) / 50.0).collect();
        let h: Vec<f64> = (0..51).map(|i| (i as f64 * 0.1).cos()).collect();
        let y = fft_convolve_same(&x, &h);
        let r = same_ref(&x, &h);
        assert_eq!(y.len(), x.len());
        for (a, b) in y.iter().zip(&r) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn convolve_same_small_uses_direct_path() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let h = [0.0, 1.0, 0.5];
        // Centred kernel: y[i] = x[i] + 0.5 * x[i - 1]
        assert_eq!(fft_convolve_same(&x, &h), vec![1.0, 2.5, 4.0, 5.5]);
    }

    #[test]
    fn convolve_same_empty_inputs() {
        assert!(fft_convolve_same(&[], &[1.0]).is_empty());
        assert!(fft_convolve_same(&[1.0], &[]).is_empty());
    }

    #[test]
    fn hilbert_real_part_is_input() {
        for n in [255usize, 256] {
            let x = sine(7.0, n);
            let z = hilbert(&x);
            assert_eq!(z.len(), n);
            for (zi, xi) in z.iter().zip(&x) {
                assert_abs_diff_eq!(zi.re, *xi, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn hilbert_of_sine_is_minus_cosine() {
        // Whole number of periods: sin -> -i cos, so the envelope is flat.
        let n = 512;
        let z = hilbert(&sine(8.0, n));
        for (i, zi) in z.iter().enumerate() {
            let expected = -(2.0 * std::f64::consts::PI * 8.0 * i as f64 / n as f64).cos();
            assert_abs_diff_eq!(zi.im, expected, epsilon = 1e-9);
            assert_relative_eq!(zi.norm(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn shared_planner_matches_fresh_planner() {
        let mut planner = FftPlanner::new();
        let x: Vec<f64> = (0..3000).map(|i| ((i * 13 % 71) as f64 - 35.0) / 35.0).collect();
        let h: Vec<f64> = (0..41).map(|i| (i as f64 * 0.2).sin()).collect();
        for _ in 0..2 {
            assert_eq!(fft_convolve_same_with(&mut planner, &x, &h), fft_convolve_same(&x, &h));
            assert_eq!(hilbert_with(&mut planner, &x), hilbert(&x));
        }
    }

    #[test]
    fn hilbert_on_dc_signal() {
        let z = hilbert(&[1.0; 64]);
        assert!(z.iter().all(|c| (c.re - 1.0).abs() < 1e-12 && c.im.abs() < 1e-12));
    }
}
