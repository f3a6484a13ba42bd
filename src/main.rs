// Entry point: loads the operators, runs the weighting pipeline and writes results.
mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use fidelity_weighting::config::PipelineConfig;
use fidelity_weighting::core::identity::SourceIdentities;
use fidelity_weighting::io;
use fidelity_weighting::pipeline::{FidelityPipeline, OperatorInputs};
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Args;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut config = PipelineConfig::load_or_default(&args.config);
    args.apply_overrides(&mut config);

    let ids = io::load_identities(&args.identities)
        .with_context(|| format!("loading source identities from {}", args.identities.display()))?;
    let identities = SourceIdentities::new(ids).context("validating source identities")?;
    let forward = io::load_matrix(&args.forward)
        .with_context(|| format!("loading forward operator from {}", args.forward.display()))?;
    let inverse = io::load_matrix(&args.inverse)
        .with_context(|| format!("loading inverse operator from {}", args.inverse.display()))?;
    let inputs = OperatorInputs::new(identities, forward, inverse)
        .context("checking operator dimensions")?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let pipeline = FidelityPipeline::new(config).context("invalid configuration")?;
    let output = pipeline.run(&inputs, &mut rng)?;

    // Everything is rendered before the first file is touched.
    let mut outputs = io::OutputSet::new();
    outputs.add_matrix(&args.output, output.weighted.operator());
    if let Some(path) = &args.weights {
        let weights = output.weighted.weights();
        let column = Array2::from_shape_fn((weights.len(), 1), |(i, _)| weights[i]);
        outputs.add_matrix(path, column.view());
    }
    if let Some(path) = &args.report {
        let report = pipeline.report(&inputs, &output);
        outputs.add_report(path, &report).context("rendering report")?;
    }
    let n_files = outputs.len();
    outputs.commit().context("writing outputs")?;
    info!(n_files, "wrote weighted operator to {}", args.output.display());

    Ok(())
}
