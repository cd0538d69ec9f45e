//! Fusion run configuration
//!
//! Loaded from an optional JSON file; any field left out falls back to its
//! default. Command-line flags are applied on top by the caller.

use anyhow::{Context, Result};
use image_fusion::FusionMethod;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub method: FusionMethod,
    /// Per-image weights, only used by the weighted method
    pub weights: Option<Vec<f64>>,
    pub jpeg_quality: u8,
    /// Directory for generated output names
    pub output_dir: PathBuf,
    pub write_report: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            method: FusionMethod::Laplacian,
            weights: None,
            jpeg_quality: 90,
            output_dir: PathBuf::from("."),
            write_report: true,
        }
    }
}

impl FusionConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}
