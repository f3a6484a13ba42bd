//! Synthetic oscillatory parcel signals.
//!
//! Each parcel gets white Gaussian noise, band-limited by one Ricker wavelet
//! scale and turned into an analytic signal. Extra samples are generated on
//! both ends and trimmed to drop convolution and FFT edge artefacts.

use ndarray::Array2;
use rand::Rng;
use rand_distr::StandardNormal;
use rustfft::FftPlanner;
use rustfft::num_complex::Complex64;
use tracing::debug;

use crate::core::fft::hilbert_with;
use crate::core::wavelet::cwt_row_with;

/// Generate `[n_parcels, n_samples]` complex analytic parcel series
/// band-limited at Ricker scale `width`.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    n_parcels: usize,
    n_samples: usize,
    n_edge_samples: usize,
    width: f64,
) -> Array2<Complex64> {
    let n_total = n_samples + 2 * n_edge_samples;
    debug!(n_parcels, n_samples, n_edge_samples, width, "generating parcel series");

    let mut out = Array2::<Complex64>::zeros((n_parcels, n_samples));
    let mut noise = vec![0.0f64; n_total];
    // Every row has the same length, so each transform is planned once.
    let mut planner = FftPlanner::new();
    for mut row in out.rows_mut() {
        for v in noise.iter_mut() {
            *v = rng.sample(StandardNormal);
        }
        let filtered = cwt_row_with(&mut planner, &noise, width);
        let analytic = hilbert_with(&mut planner, &filtered);
        for (dst, src) in row
            .iter_mut()
            .zip(&analytic[n_edge_samples..n_edge_samples + n_samples])
        {
            *dst = *src;
        }
    }
    out
}
