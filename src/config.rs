use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::{FidelityError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalConfig {
    /// Length of each synthetic series after edge trimming.
    #[serde(default = "SignalConfig::default_n_samples")]
    pub n_samples: usize,
    /// Samples generated and discarded at each end.
    #[serde(default = "SignalConfig::default_n_edge_samples")]
    pub n_edge_samples: usize,
    /// Ricker wavelet widths; the first one shapes the oscillations.
    #[serde(default = "SignalConfig::default_wavelet_widths")]
    pub wavelet_widths: Vec<f64>,
}

impl SignalConfig {
    fn default_n_samples() -> usize {
        30_000
    }
    fn default_n_edge_samples() -> usize {
        20
    }
    fn default_wavelet_widths() -> Vec<f64> {
        vec![5.0]
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            n_samples: Self::default_n_samples(),
            n_edge_samples: Self::default_n_edge_samples(),
            wavelet_widths: Self::default_wavelet_widths(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationConfig {
    #[serde(default = "ValidationConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "ValidationConfig::default_n_samples")]
    pub n_samples: usize,
}

impl ValidationConfig {
    fn default_enabled() -> bool {
        true
    }
    fn default_n_samples() -> usize {
        10_000
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            n_samples: Self::default_n_samples(),
        }
    }
}

/// All tunables of a weighting run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PipelineConfig {
    /// Seed for the synthetic signals; entropy-seeded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.signal.n_samples == 0 {
            return Err(FidelityError::InvalidConfig(
                "signal.n_samples must be positive".into(),
            ));
        }
        if self.signal.wavelet_widths.is_empty() {
            return Err(FidelityError::InvalidConfig(
                "signal.wavelet_widths must not be empty".into(),
            ));
        }
        if let Some(w) = self
            .signal
            .wavelet_widths
            .iter()
            .find(|w| !w.is_finite() || **w <= 0.0)
        {
            return Err(FidelityError::InvalidConfig(format!(
                "wavelet width {w} must be finite and positive"
            )));
        }
        if self.validation.enabled && self.validation.n_samples == 0 {
            return Err(FidelityError::InvalidConfig(
                "validation.n_samples must be positive when validation is enabled".into(),
            ));
        }
        Ok(())
    }

    /// Read `path`; when it does not exist, write the defaults there as a
    /// commented template and return them.
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        warn!("Failed to parse config {path}: {err}. Using defaults.");
                    }
                },
                Err(err) => {
                    warn!("Failed to read config {path}: {err}. Using defaults.");
                }
            }
            return Self::default();
        }

        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                let mut commented = String::from("# seed = 0\n\n");
                for line in text.lines() {
                    let trimmed = line.trim();
                    if trimmed.is_empty() || (trimmed.starts_with('[') && trimmed.ends_with(']')) {
                        commented.push_str(line);
                    } else {
                        commented.push_str("# ");
                        commented.push_str(line);
                    }
                    commented.push('\n');
                }
                if let Err(err) = fs::write(path_obj, commented) {
                    warn!("Failed to write default config to {path}: {err}");
                }
            }
            Err(err) => warn!("Failed to serialize default config: {err}"),
        }
        default_cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "fidelity_config_test_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn defaults_follow_reference_run() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.signal.n_samples, 30_000);
        assert_eq!(cfg.signal.n_edge_samples, 20);
        assert_eq!(cfg.signal.wavelet_widths, vec![5.0]);
        assert!(cfg.validation.enabled);
        assert_eq!(cfg.validation.n_samples, 10_000);
        assert_eq!(cfg.seed, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn load_or_default_writes_commented_template() {
        let path = unique_path("defaults.toml");
        let path_str = path.to_string_lossy().to_string();
        let _ = fs::remove_file(&path);

        let cfg = PipelineConfig::load_or_default(&path_str);
        assert_eq!(cfg, PipelineConfig::default());
        let contents = fs::read_to_string(&path).expect("read written config");
        assert!(contents.contains("[signal]"));
        assert!(contents.contains("# n_samples = 30000"));
        assert!(contents.contains("# n_edge_samples = 20"));
        assert!(contents.contains("# seed = 0"));

        // A fully commented template parses back to the defaults.
        let reread = PipelineConfig::load_or_default(&path_str);
        assert_eq!(reread, PipelineConfig::default());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = unique_path("partial.toml");
        fs::write(&path, "seed = 9\n[signal]\nn_samples = 512\n").unwrap();
        let cfg = PipelineConfig::load_or_default(&path.to_string_lossy());
        assert_eq!(cfg.seed, Some(9));
        assert_eq!(cfg.signal.n_samples, 512);
        assert_eq!(cfg.signal.n_edge_samples, 20);
        assert_eq!(cfg.validation, ValidationConfig::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let path = unique_path("broken.toml");
        fs::write(&path, "[signal\nn_samples = ").unwrap();
        let cfg = PipelineConfig::load_or_default(&path.to_string_lossy());
        assert_eq!(cfg, PipelineConfig::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn validate_rejects_bad_widths_and_lengths() {
        let mut cfg = PipelineConfig::default();
        cfg.signal.wavelet_widths = vec![];
        assert!(cfg.validate().is_err());
        cfg.signal.wavelet_widths = vec![-1.0];
        assert!(cfg.validate().is_err());
        cfg.signal.wavelet_widths = vec![5.0, f64::NAN];
        assert!(cfg.validate().is_err());
        cfg.signal.wavelet_widths = vec![5.0];
        cfg.signal.n_samples = 0;
        assert!(cfg.validate().is_err());
        cfg.signal.n_samples = 10;
        cfg.validation.n_samples = 0;
        assert!(cfg.validate().is_err());
        cfg.validation.enabled = false;
        assert!(cfg.validate().is_ok());
    }
}
