//! Fidelity weights and the weighted inverse operator.
//!
//! Weights are `sign(Re cplv) · (Re cplv)²`. They scale the rows of the
//! inverse operator, first renormalized so each parcel block keeps the norm
//! of the original block, then so the whole operator keeps the original
//! norm. Blocks whose weighted norm is zero contribute zero rows.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rustfft::num_complex::Complex64;
use tracing::{debug, warn};

use crate::core::identity::SourceIdentities;
use crate::core::linalg::{frobenius_norm, rows_norm};
use crate::error::{FidelityError, Result};

#[derive(Debug, Clone)]
pub struct WeightSynthesis {
    /// Effective per-source weights: `weighted_operator == diag(weights) · inverse`.
    pub weights: Array1<f64>,
    /// Weights after the per-parcel stage, before the global rescale.
    pub parcel_weights: Array1<f64>,
    pub weighted_operator: Array2<f64>,
}

/// Signed squared real part of each cPLV.
pub fn raw_weights(cplv: ArrayView1<'_, Complex64>) -> Array1<f64> {
    cplv.mapv(|c| {
        let re = c.re;
        if re == 0.0 || !re.is_finite() {
            0.0
        } else {
            re.signum() * re * re
        }
    })
}

/// `diag(weights) · inverse`.
pub fn apply_weights(
    weights: ArrayView1<'_, f64>,
    inverse_op: ArrayView2<'_, f64>,
) -> Array2<f64> {
    let mut out = inverse_op.to_owned();
    for (mut row, &w) in out.axis_iter_mut(Axis(0)).zip(weights) {
        row *= w;
    }
    out
}

/// `num / den`, or zero when the ratio is not a finite number.
#[inline]
fn safe_ratio(num: f64, den: f64) -> f64 {
    let r = num / den;
    if r.is_finite() { r } else { 0.0 }
}

/// Rescale each parcel's weights so its weighted block has the norm of the
/// original block. Unassigned sources get weight zero.
pub fn normalize_per_parcel(
    weights: ArrayView1<'_, f64>,
    identities: &SourceIdentities,
    inverse_op: ArrayView2<'_, f64>,
) -> Array1<f64> {
    let weighted = apply_weights(weights, inverse_op);
    let mut out = Array1::<f64>::zeros(weights.len());
    for (parcel, members) in identities.groups().iter().enumerate() {
        let original = rows_norm(inverse_op, members);
        let current = rows_norm(weighted.view(), members);
        let factor = safe_ratio(original, current);
        if factor == 0.0 {
            warn!(parcel, "weighted parcel block has zero norm; zeroing its weights");
        }
        for &i in members {
            out[i] = weights[i] * factor;
        }
    }
    out
}

/// Rescale `weights` so `diag(weights) · inverse` has the norm of `inverse`.
/// Returns the scale factor applied (zero when the weighted operator vanishes).
pub fn normalize_global(weights: &mut Array1<f64>, inverse_op: ArrayView2<'_, f64>) -> f64 {
    let weighted = apply_weights(weights.view(), inverse_op);
    let factor = safe_ratio(frobenius_norm(inverse_op), frobenius_norm(weighted.view()));
    weights.mapv_inplace(|w| {
        let v = w * factor;
        if v.is_finite() { v } else { 0.0 }
    });
    factor
}

/// Full weight synthesis: raw weights, per-parcel then global normalization.
pub fn synthesize(
    cplv: ArrayView1<'_, Complex64>,
    identities: &SourceIdentities,
    inverse_op: ArrayView2<'_, f64>,
) -> Result<WeightSynthesis> {
    if cplv.len() != identities.len() {
        return Err(FidelityError::DimensionMismatch {
            what: "cPLV length vs sources",
            expected: identities.len(),
            actual: cplv.len(),
        });
    }
    if inverse_op.nrows() != identities.len() {
        return Err(FidelityError::DimensionMismatch {
            what: "inverse operator rows vs sources",
            expected: identities.len(),
            actual: inverse_op.nrows(),
        });
    }

    let raw = raw_weights(cplv);
    let parcel_weights = normalize_per_parcel(raw.view(), identities, inverse_op);
    let mut weights = parcel_weights.clone();
    let factor = normalize_global(&mut weights, inverse_op);
    debug!(global_factor = factor, "weights normalized");
    if factor == 0.0 && identities.n_parcels() > 0 {
        warn!("all weights vanished; weighted operator is zero");
    }

    let weighted_operator = apply_weights(weights.view(), inverse_op);
    Ok(WeightSynthesis {
        weights,
        parcel_weights,
        weighted_operator,
    })
}
