//! Parcel → source expansion and forward/inverse projection.

use ndarray::{Array2, ArrayView2};
use rustfft::num_complex::Complex64;

use crate::core::identity::SourceIdentities;
use crate::core::linalg::real_dot_complex;
use crate::error::{FidelityError, Result};

/// Copy each parcel row to every member source; unassigned sources stay zero.
pub fn expand(
    parcel_series: ArrayView2<'_, Complex64>,
    identities: &SourceIdentities,
) -> Result<Array2<Complex64>> {
    if parcel_series.nrows() != identities.n_parcels() {
        return Err(FidelityError::DimensionMismatch {
            what: "parcel series rows vs parcel count",
            expected: identities.n_parcels(),
            actual: parcel_series.nrows(),
        });
    }
    let mut sources = Array2::<Complex64>::zeros((identities.len(), parcel_series.ncols()));
    for (parcel, members) in identities.groups().iter().enumerate() {
        let src = parcel_series.row(parcel);
        for &i in members {
            sources.row_mut(i).assign(&src);
        }
    }
    Ok(sources)
}

/// Sensor-space measurement of source activity: `forward · sources`.
pub fn project_forward(
    source_series: ArrayView2<'_, Complex64>,
    forward_op: ArrayView2<'_, f64>,
) -> Result<Array2<Complex64>> {
    real_dot_complex("forward operator columns vs sources", forward_op, source_series)
}

/// Expand parcel series to sources and round-trip them through
/// `inverse · (forward · sources)`.
pub fn expand_and_project(
    parcel_series: ArrayView2<'_, Complex64>,
    identities: &SourceIdentities,
    forward_op: ArrayView2<'_, f64>,
    inverse_op: ArrayView2<'_, f64>,
) -> Result<Array2<Complex64>> {
    let sources = expand(parcel_series, identities)?;
    let sensors = project_forward(sources.view(), forward_op)?;
    drop(sources);
    real_dot_complex("inverse operator columns vs sensors", inverse_op, sensors.view())
}
