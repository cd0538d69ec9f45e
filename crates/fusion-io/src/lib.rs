//! File handling and reporting around the ImageFuse core
//!
//! The `image-fusion` crate only sees in-memory pixels. This crate supplies
//! everything around it: decoding and encoding image files, naming outputs,
//! loading run configuration, and assembling the JSON quality report that
//! compares a fused composite with its sources.

pub mod codec;
pub mod config;
pub mod report;

pub use codec::{decode_image, encode_image, load_image, save_image, OutputFormat};
pub use config::FusionConfig;
pub use report::{FusionReport, ImageAssessment};

use anyhow::Result;
use image_fusion::FusionMethod;
use std::path::Path;

/// Deterministic output file name for a set of inputs
///
/// Hashes each input's canonical path, size and modification time, so the
/// same request maps to the same name and different requests never collide.
pub fn output_name<P: AsRef<Path>>(inputs: &[P], method: FusionMethod) -> Result<String> {
    use sha2::{Digest, Sha256};
    use std::fs;

    let mut hasher = Sha256::new();
    for input in inputs {
        let path = input.as_ref();
        let metadata = fs::metadata(path)?;
        let absolute_path = path.canonicalize()?.to_string_lossy().to_string();
        let modified_time = metadata
            .modified()?
            .duration_since(std::time::UNIX_EPOCH)?
            .as_millis();

        hasher.update(absolute_path.as_bytes());
        hasher.update(metadata.len().to_le_bytes());
        hasher.update(modified_time.to_le_bytes());
    }

    let result = hasher.finalize();
    Ok(format!("fused_{}_{}.jpg", method, hex::encode(&result[..8])))
}
