//! Complex phase-locking value between each source's reconstruction and the
//! reference signal of its parcel.

use ndarray::{Array1, ArrayView2};
use rustfft::num_complex::Complex64;

use crate::core::identity::SourceIdentities;
use crate::error::{FidelityError, Result};

/// `cplv[i] = mean_t(parcel[id(i), t] · conj(source[i, t]))`; zero for
/// unassigned sources.
///
/// Both inputs are expected to be phase-normalized. Dividing by the sample
/// count keeps `|cplv| <= 1`; it does not change the sign of the real part.
pub fn compute_cplv(
    parcel_phase: ArrayView2<'_, Complex64>,
    source_phase: ArrayView2<'_, Complex64>,
    identities: &SourceIdentities,
) -> Result<Array1<Complex64>> {
    if source_phase.nrows() != identities.len() {
        return Err(FidelityError::DimensionMismatch {
            what: "source series rows vs sources",
            expected: identities.len(),
            actual: source_phase.nrows(),
        });
    }
    if parcel_phase.nrows() != identities.n_parcels() {
        return Err(FidelityError::DimensionMismatch {
            what: "parcel series rows vs parcel count",
            expected: identities.n_parcels(),
            actual: parcel_phase.nrows(),
        });
    }
    if parcel_phase.ncols() != source_phase.ncols() {
        return Err(FidelityError::DimensionMismatch {
            what: "parcel vs source sample count",
            expected: parcel_phase.ncols(),
            actual: source_phase.ncols(),
        });
    }

    let n_samples = source_phase.ncols();
    let mut cplv = Array1::<Complex64>::zeros(identities.len());
    if n_samples == 0 {
        return Ok(cplv);
    }
    let scale = 1.0 / n_samples as f64;
    for (i, out) in cplv.iter_mut().enumerate() {
        let Some(parcel) = identities.parcel_of(i) else {
            continue;
        };
        let sum: Complex64 = parcel_phase
            .row(parcel)
            .iter()
            .zip(source_phase.row(i))
            .map(|(p, s)| *p * s.conj())
            .sum();
        *out = sum * scale;
    }
    Ok(cplv)
}
