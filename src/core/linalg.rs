//! Dense helpers that ndarray does not provide directly.

use ndarray::{Array2, ArrayView2, Zip};
use rustfft::num_complex::Complex64;

use crate::error::{FidelityError, Result};

/// `op · x` for a real operator and a complex series, as two real GEMMs.
pub fn real_dot_complex(
    what: &'static str,
    op: ArrayView2<'_, f64>,
    x: ArrayView2<'_, Complex64>,
) -> Result<Array2<Complex64>> {
    if op.ncols() != x.nrows() {
        return Err(FidelityError::DimensionMismatch {
            what,
            expected: op.ncols(),
            actual: x.nrows(),
        });
    }
    let re = op.dot(&x.map(|z| z.re));
    let im = op.dot(&x.map(|z| z.im));
    Ok(Zip::from(&re)
        .and(&im)
        .map_collect(|&r, &i| Complex64::new(r, i)))
}

/// Frobenius norm of a real matrix.
pub fn frobenius_norm(m: ArrayView2<'_, f64>) -> f64 {
    m.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Frobenius norm of the sub-matrix made of `rows`.
pub fn rows_norm(m: ArrayView2<'_, f64>, rows: &[usize]) -> f64 {
    rows.iter()
        .map(|&r| m.row(r).iter().map(|v| v * v).sum::<f64>())
        .sum::<f64>()
        .sqrt()
}
