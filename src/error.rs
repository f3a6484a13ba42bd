use thiserror::Error;

/// Errors that abort a weighting run before any output is produced.
#[derive(Debug, Error)]
pub enum FidelityError {
    /// Source identities are outside `{-1, 0..n_parcels-1}` or skip a parcel id.
    #[error("malformed source-to-parcel mapping: {0}")]
    MalformedMapping(String),
    /// Operator shapes disagree with each other or with the source count.
    #[error("dimension mismatch: {what} (expected {expected}, got {actual})")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, FidelityError>;
