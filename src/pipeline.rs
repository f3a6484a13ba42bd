//! End-to-end weighting run: generate → round-trip → phase → cPLV → weights,
//! then an independent validation pass.

use ndarray::{Array1, Array2, ArrayView2};
use rand::Rng;
use rustfft::num_complex::Complex64;
use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::core::cplv::compute_cplv;
use crate::core::generator::generate;
use crate::core::identity::SourceIdentities;
use crate::core::linalg::frobenius_norm;
use crate::core::phase::to_unit_phase_inplace;
use crate::core::projector::expand_and_project;
use crate::core::validator::{ParcelFidelity, Validation, ValidationSummary, validate};
use crate::core::weights::{WeightSynthesis, synthesize};
use crate::error::{FidelityError, Result};

/// Mapping plus forward and inverse operators, checked for consistent shapes.
#[derive(Debug, Clone)]
pub struct OperatorInputs {
    identities: SourceIdentities,
    forward: Array2<f64>,
    inverse: Array2<f64>,
}

impl OperatorInputs {
    /// `forward` is `[n_sensors, n_sources]`, `inverse` is `[n_sources, n_sensors]`.
    pub fn new(
        identities: SourceIdentities,
        forward: Array2<f64>,
        inverse: Array2<f64>,
    ) -> Result<Self> {
        let n_sources = identities.len();
        if forward.ncols() != n_sources {
            return Err(FidelityError::DimensionMismatch {
                what: "forward operator columns vs sources",
                expected: n_sources,
                actual: forward.ncols(),
            });
        }
        if inverse.nrows() != n_sources {
            return Err(FidelityError::DimensionMismatch {
                what: "inverse operator rows vs sources",
                expected: n_sources,
                actual: inverse.nrows(),
            });
        }
        if inverse.ncols() != forward.nrows() {
            return Err(FidelityError::DimensionMismatch {
                what: "inverse operator columns vs forward operator rows (sensors)",
                expected: forward.nrows(),
                actual: inverse.ncols(),
            });
        }
        Ok(Self {
            identities,
            forward,
            inverse,
        })
    }

    pub fn identities(&self) -> &SourceIdentities {
        &self.identities
    }

    pub fn forward(&self) -> ArrayView2<'_, f64> {
        self.forward.view()
    }

    pub fn inverse(&self) -> ArrayView2<'_, f64> {
        self.inverse.view()
    }

    pub fn n_sources(&self) -> usize {
        self.identities.len()
    }

    pub fn n_sensors(&self) -> usize {
        self.forward.nrows()
    }

    pub fn n_parcels(&self) -> usize {
        self.identities.n_parcels()
    }
}

#[derive(Debug, Clone)]
pub struct WeightedOperator {
    pub cplv: Array1<Complex64>,
    pub synthesis: WeightSynthesis,
}

impl WeightedOperator {
    pub fn operator(&self) -> ArrayView2<'_, f64> {
        self.synthesis.weighted_operator.view()
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.synthesis.weights
    }

    /// Sources whose reconstruction came back polarity-inverted.
    pub fn n_flipped(&self) -> usize {
        self.synthesis.weights.iter().filter(|w| **w < 0.0).count()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub weighted: WeightedOperator,
    pub validation: Option<Validation>,
}

/// Serializable run summary for downstream reporting.
#[derive(Debug, Clone, Serialize)]
pub struct FidelityReport {
    pub n_sources: usize,
    pub n_sensors: usize,
    pub n_parcels: usize,
    pub n_unassigned: usize,
    pub n_samples: usize,
    pub seed: Option<u64>,
    pub inverse_norm: f64,
    pub weighted_norm: f64,
    pub n_flipped: usize,
    pub summary: Option<ValidationSummary>,
    pub parcels: Vec<ParcelFidelity>,
}

#[derive(Debug, Clone)]
pub struct FidelityPipeline {
    config: PipelineConfig,
    /// Ricker scale used to band-limit the synthetic series.
    width: f64,
}

impl FidelityPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let width = config.signal.wavelet_widths.first().copied().ok_or_else(|| {
            FidelityError::InvalidConfig("signal.wavelet_widths must not be empty".into())
        })?;
        Ok(Self { config, width })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Derive fidelity weights and the weighted inverse operator.
    pub fn compute_weighted_operator<R: Rng + ?Sized>(
        &self,
        inputs: &OperatorInputs,
        rng: &mut R,
    ) -> Result<WeightedOperator> {
        let signal = &self.config.signal;
        info!(
            n_sources = inputs.n_sources(),
            n_sensors = inputs.n_sensors(),
            n_parcels = inputs.n_parcels(),
            n_samples = signal.n_samples,
            "computing fidelity weights"
        );

        let mut parcels = generate(
            rng,
            inputs.n_parcels(),
            signal.n_samples,
            signal.n_edge_samples,
            self.width,
        );
        let mut round_trip = expand_and_project(
            parcels.view(),
            inputs.identities(),
            inputs.forward(),
            inputs.inverse(),
        )?;
        to_unit_phase_inplace(&mut round_trip);
        to_unit_phase_inplace(&mut parcels);

        let cplv = compute_cplv(parcels.view(), round_trip.view(), inputs.identities())?;
        drop(round_trip);
        drop(parcels);

        let synthesis = synthesize(cplv.view(), inputs.identities(), inputs.inverse())?;
        let weighted = WeightedOperator { cplv, synthesis };
        info!(
            n_flipped = weighted.n_flipped(),
            weighted_norm = frobenius_norm(weighted.operator()),
            "weighted operator ready"
        );
        Ok(weighted)
    }

    /// Score `weighted_op` against the original inverse on fresh series.
    pub fn validate<R: Rng + ?Sized>(
        &self,
        inputs: &OperatorInputs,
        weighted_op: ArrayView2<'_, f64>,
        rng: &mut R,
    ) -> Result<Validation> {
        let validation = validate(
            rng,
            inputs.forward(),
            inputs.inverse(),
            weighted_op,
            inputs.identities(),
            self.config.validation.n_samples,
            self.config.signal.n_edge_samples,
            self.width,
        )?;
        let s = validation.summary();
        info!(
            mean_weighted = s.mean_weighted,
            mean_original = s.mean_original,
            improved = s.improved,
            degraded = s.degraded,
            "validation finished"
        );
        Ok(validation)
    }

    /// Weighting followed by validation when enabled.
    pub fn run<R: Rng + ?Sized>(&self, inputs: &OperatorInputs, rng: &mut R) -> Result<PipelineOutput> {
        let weighted = self.compute_weighted_operator(inputs, rng)?;
        let validation = if self.config.validation.enabled {
            Some(self.validate(inputs, weighted.operator(), rng)?)
        } else {
            None
        };
        Ok(PipelineOutput {
            weighted,
            validation,
        })
    }

    pub fn report(&self, inputs: &OperatorInputs, output: &PipelineOutput) -> FidelityReport {
        FidelityReport {
            n_sources: inputs.n_sources(),
            n_sensors: inputs.n_sensors(),
            n_parcels: inputs.n_parcels(),
            n_unassigned: inputs.identities().n_unassigned(),
            n_samples: self.config.signal.n_samples,
            seed: self.config.seed,
            inverse_norm: frobenius_norm(inputs.inverse()),
            weighted_norm: frobenius_norm(output.weighted.operator()),
            n_flipped: output.weighted.n_flipped(),
            summary: output.validation.as_ref().map(Validation::summary),
            parcels: output
                .validation
                .as_ref()
                .map(Validation::parcels)
                .unwrap_or_default(),
        }
    }
}
