use ndarray::{Array2, ArrayView2};
use rustfft::num_complex::Complex64;

/// Unit-amplitude phasor `exp(i·arg z)`. Silent samples (`|z| == 0`) have no
/// phase and stay zero.
#[inline]
pub fn unit_phasor(z: Complex64) -> Complex64 {
    let r = z.norm();
    if r > 0.0 && r.is_finite() {
        z / r
    } else {
        Complex64::new(0.0, 0.0)
    }
}

/// Phase-only copy of a complex series.
pub fn to_unit_phase(series: ArrayView2<'_, Complex64>) -> Array2<Complex64> {
    series.mapv(unit_phasor)
}

/// Phase-normalize in place, reusing the buffer.
pub fn to_unit_phase_inplace(series: &mut Array2<Complex64>) {
    series.mapv_inplace(unit_phasor);
}
