/**
 * Matching Engine
 * Narrow boundary around template extraction and template comparison
 */

use thiserror::Error;

use crate::decoder::FingerprintImage;

mod ridge;

pub use ridge::{RidgeFieldEngine, RidgeTemplate};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("image {width}x{height} is too small to hold a fingerprint")]
    TooSmall { width: u32, height: u32 },

    #[error("no ridge structure found ({found} of {required} required blocks)")]
    NoRidgeStructure { found: usize, required: usize },
}

/// A fingerprint matching backend.
///
/// Templates are opaque to the rest of the crate: they can only be built from
/// an image and compared with each other. Implementations must be
/// deterministic for a fixed input. `compare` returns a non-negative score
/// where higher means more similar; it need not be symmetric.
pub trait FingerprintEngine: Send + Sync + 'static {
    type Template: Send;

    fn extract(&self, image: &FingerprintImage) -> Result<Self::Template, ExtractionError>;

    fn compare(&self, probe: &Self::Template, candidate: &Self::Template) -> f64;
}

#[cfg(test)]
pub(crate) use ridge::tests::ridges as synthetic_ridges;
