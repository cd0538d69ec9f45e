//! Error types for the fusion core

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FusionError {
    /// Empty image set, malformed pixel buffer, or mismatched weights
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Strategy selector that does not name a known fusion method
    #[error("Unsupported fusion method: {0}. Valid options: weighted, laplacian, adaptive")]
    UnsupportedMethod(String),
}

pub type Result<T> = std::result::Result<T, FusionError>;
