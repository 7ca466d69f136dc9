use thiserror::Error;

use super::calibration::SensorGroup;

/// Errors returned when loading calibration coefficients.
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("calibration JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid number {value:?} in {key}")]
    Number { key: String, value: String },
    #[error("{group} calibration has wrong shape: expected {expected}, found {found}")]
    Dimension {
        group: SensorGroup,
        expected: String,
        found: String,
    },
}
