use crate::config::CorrectionVariant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DosimError {
    #[error("Shape mismatch in {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Named array '{name}' is missing from the measurement")]
    MissingArray { name: String },

    #[error("No saturation coefficients configured for the {variant} variant")]
    MissingCoefficients { variant: CorrectionVariant },

    #[error("Fit did not converge after {iterations} iterations (residual {residual:.3e})")]
    FitDiverged { iterations: usize, residual: f64 },

    #[error("Malformed table '{table}': cell ({row}, {col}) is not a finite number")]
    MalformedTable {
        table: String,
        row: usize,
        col: usize,
    },

    #[error("Diode index {diode} out of range 1..={count}")]
    DiodeOutOfRange { diode: usize, count: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("NPZ error: {0}")]
    Npz(String),
}

pub type DosimResult<T> = Result<T, DosimError>;
