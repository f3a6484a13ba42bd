//! Parcel-level fidelity of an inverse operator on independent data.
//!
//! Fresh parcel series are measured through the forward operator only; each
//! inverse operator under test then reconstructs sources from the same sensor
//! data. A parcel's fidelity is the mean of `true · conj(estimate)`, where the
//! estimate is the average phase of its member sources.

use ndarray::{Array1, ArrayView2};
use rand::Rng;
use rustfft::num_complex::Complex64;
use serde::Serialize;
use tracing::info;

use crate::core::generator::generate;
use crate::core::identity::SourceIdentities;
use crate::core::linalg::real_dot_complex;
use crate::core::phase::{to_unit_phase_inplace, unit_phasor};
use crate::core::projector::{expand, project_forward};
use crate::error::{FidelityError, Result};

/// Tolerance under which two parcel scores count as equal.
const TIE_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Serialize)]
pub struct ParcelFidelity {
    pub parcel: usize,
    pub n_sources: usize,
    pub weighted: f64,
    pub original: f64,
    pub weighted_cplv: [f64; 2],
    pub original_cplv: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub mean_weighted: f64,
    pub mean_original: f64,
    pub improved: usize,
    pub unchanged: usize,
    pub degraded: usize,
}

#[derive(Debug, Clone)]
pub struct Validation {
    /// Complex mean phase-locking per parcel, weighted operator.
    pub weighted_cplv: Array1<Complex64>,
    /// Complex mean phase-locking per parcel, original operator.
    pub original_cplv: Array1<Complex64>,
    /// Member count per parcel.
    pub n_sources: Vec<usize>,
}

impl Validation {
    /// Fidelity scores (real part) under the weighted operator.
    pub fn fidelity_weighted(&self) -> Array1<f64> {
        self.weighted_cplv.mapv(|c| c.re)
    }

    /// Fidelity scores (real part) under the original operator.
    pub fn fidelity_original(&self) -> Array1<f64> {
        self.original_cplv.mapv(|c| c.re)
    }

    pub fn parcels(&self) -> Vec<ParcelFidelity> {
        self.weighted_cplv
            .iter()
            .zip(self.original_cplv.iter())
            .zip(&self.n_sources)
            .enumerate()
            .map(|(parcel, ((w, o), &n_sources))| ParcelFidelity {
                parcel,
                n_sources,
                weighted: w.re,
                original: o.re,
                weighted_cplv: [w.re, w.im],
                original_cplv: [o.re, o.im],
            })
            .collect()
    }

    pub fn summary(&self) -> ValidationSummary {
        let w = self.fidelity_weighted();
        let o = self.fidelity_original();
        let n = w.len();
        let (mut improved, mut unchanged, mut degraded) = (0, 0, 0);
        for (a, b) in w.iter().zip(o.iter()) {
            let d = a - b;
            if d.abs() <= TIE_EPS {
                unchanged += 1;
            } else if d > 0.0 {
                improved += 1;
            } else {
                degraded += 1;
            }
        }
        let mean = |v: &Array1<f64>| if n == 0 { 0.0 } else { v.sum() / n as f64 };
        ValidationSummary {
            mean_weighted: mean(&w),
            mean_original: mean(&o),
            improved,
            unchanged,
            degraded,
        }
    }
}

/// Per-parcel `mean_t(true[p, t] · conj(mean_{i ∈ p} estimate[i, t]))`.
///
/// `true_phase` and `estimate_phase` are phase-normalized. Parcels without
/// members score zero.
pub fn parcel_fidelity(
    true_phase: ArrayView2<'_, Complex64>,
    estimate_phase: ArrayView2<'_, Complex64>,
    identities: &SourceIdentities,
) -> Array1<Complex64> {
    let n_samples = true_phase.ncols();
    let mut out = Array1::<Complex64>::zeros(identities.n_parcels());
    if n_samples == 0 {
        return out;
    }
    let mut averaged = vec![Complex64::new(0.0, 0.0); n_samples];
    for (parcel, members) in identities.groups().iter().enumerate() {
        if members.is_empty() {
            continue;
        }
        averaged.fill(Complex64::new(0.0, 0.0));
        for &i in members {
            for (acc, z) in averaged.iter_mut().zip(estimate_phase.row(i)) {
                *acc += *z;
            }
        }
        let inv_members = 1.0 / members.len() as f64;
        let sum: Complex64 = true_phase
            .row(parcel)
            .iter()
            .zip(&averaged)
            .map(|(t, e)| *t * (*e * inv_members).conj())
            .sum();
        out[parcel] = sum / n_samples as f64;
    }
    out
}

/// Score the weighted and original inverse operators on a fresh draw of
/// `n_samples` parcel samples.
#[allow(clippy::too_many_arguments)]
pub fn validate<R: Rng + ?Sized>(
    rng: &mut R,
    forward_op: ArrayView2<'_, f64>,
    inverse_op: ArrayView2<'_, f64>,
    weighted_op: ArrayView2<'_, f64>,
    identities: &SourceIdentities,
    n_samples: usize,
    n_edge_samples: usize,
    width: f64,
) -> Result<Validation> {
    if weighted_op.dim() != inverse_op.dim() {
        return Err(FidelityError::DimensionMismatch {
            what: "weighted operator size vs inverse operator size",
            expected: inverse_op.len(),
            actual: weighted_op.len(),
        });
    }
    info!(n_samples, "validating on independent series");

    let mut parcels = generate(rng, identities.n_parcels(), n_samples, n_edge_samples, width);
    to_unit_phase_inplace(&mut parcels);

    let sources = expand(parcels.view(), identities)?;
    let sensors = project_forward(sources.view(), forward_op)?;
    drop(sources);

    let score = |op: ArrayView2<'_, f64>, what: &'static str| -> Result<Array1<Complex64>> {
        let mut estimate = real_dot_complex(what, op, sensors.view())?;
        estimate.mapv_inplace(unit_phasor);
        Ok(parcel_fidelity(parcels.view(), estimate.view(), identities))
    };
    let weighted_cplv = score(weighted_op, "weighted operator columns vs sensors")?;
    let original_cplv = score(inverse_op, "inverse operator columns vs sensors")?;

    Ok(Validation {
        weighted_cplv,
        original_cplv,
        n_sources: identities.groups().iter().map(Vec::len).collect(),
    })
}
