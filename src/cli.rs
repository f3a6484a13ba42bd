use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Source-to-parcel ids (-1 = no parcel), one row or one column
    #[arg(long, value_name = "CSV")]
    pub identities: PathBuf,

    /// Forward operator, sensors x sources
    #[arg(long, value_name = "CSV")]
    pub forward: PathBuf,

    /// Inverse operator, sources x sensors
    #[arg(long, value_name = "CSV")]
    pub inverse: PathBuf,

    /// Where to write the fidelity-weighted inverse operator
    #[arg(long, short, value_name = "CSV")]
    pub output: PathBuf,

    /// Write per-source weights (one per line)
    #[arg(long, value_name = "CSV")]
    pub weights: Option<PathBuf>,

    /// Write the validation report as JSON
    #[arg(long, value_name = "JSON")]
    pub report: Option<PathBuf>,

    /// Path to config TOML
    #[arg(long, default_value = "fidelity.toml")]
    pub config: String,

    /// Random seed (overrides config)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Synthetic series length (overrides config)
    #[arg(long)]
    pub n_samples: Option<usize>,

    /// Validation series length (overrides config)
    #[arg(long)]
    pub validation_samples: Option<usize>,

    /// Skip the validation pass
    #[arg(long, default_value_t = false)]
    pub no_validate: bool,
}

impl Args {
    /// Fold command-line overrides into a loaded config.
    pub fn apply_overrides(&self, cfg: &mut fidelity_weighting::config::PipelineConfig) {
        if let Some(seed) = self.seed {
            cfg.seed = Some(seed);
        }
        if let Some(n) = self.n_samples {
            cfg.signal.n_samples = n;
        }
        if let Some(n) = self.validation_samples {
            cfg.validation.n_samples = n;
        }
        if self.no_validate {
            cfg.validation.enabled = false;
        }
    }
}
