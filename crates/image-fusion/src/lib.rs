//! Multi-image fusion and quality analysis for ImageFuse
//!
//! This crate fuses two or more co-registered captures of the same scene into
//! one composite and measures how usable any image is. It contains no file or
//! network handling; callers decode images into an [`Image`] and hand them in.
//!
//! - [`fuse`] combines an ordered image set with one of three strategies
//!   ([`FusionMethod::Weighted`], [`FusionMethod::Laplacian`],
//!   [`FusionMethod::Adaptive`]).
//! - [`analyze`] extracts sharpness, brightness, contrast, SNR and edge
//!   density from a single image.
//! - [`score`] turns those metrics into a 0-100 score and a rating.
//!
//! All operations are pure and single-threaded per call, so independent calls
//! can run concurrently without coordination.

pub mod error;
pub mod filters;
pub mod fusion;
pub mod quality;
pub mod raster;
pub mod score;

pub use error::{FusionError, Result};
pub use fusion::{fuse, FusionEngine, FusionMethod, FusionResult};
pub use raster::{Channels, Image};
pub use quality::{analyze, QualityAnalyzer, QualityMetrics};
pub use score::{score, QualityRating, QualityScore, QualityScorer};
