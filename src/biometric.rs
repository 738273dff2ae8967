/**
 * Biometric Service
 * Decodes two fingerprint images, builds templates and scores them
 * against the configured threshold
 */

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decoder::{decode_image, payload_digest};
use crate::engine::FingerprintEngine;
use crate::error::VerifyError;

/// Outcome of one probe/candidate comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub score: i64,
    pub threshold: i64,
    #[serde(rename = "match")]
    pub is_match: bool,
}

impl MatchResult {
    /// Rounds the raw engine score and applies the threshold to the rounded value.
    pub fn from_score(raw_score: f64, threshold: u32) -> Self {
        let score = raw_score.max(0.0).round() as i64;
        let threshold = i64::from(threshold);
        Self {
            score,
            threshold,
            is_match: score >= threshold,
        }
    }
}

pub struct BiometricService<E> {
    engine: E,
    threshold: u32,
}

impl<E: FingerprintEngine> BiometricService<E> {
    pub fn new(engine: E, threshold: u32) -> Self {
        Self { engine, threshold }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Synchronous decode -> template -> match pipeline. CPU bound.
    pub fn verify(&self, probe_png: &str, candidate_png: &str) -> Result<MatchResult, VerifyError> {
        // Both fields are validated before any decode work starts
        if probe_png.trim().is_empty() {
            return Err(VerifyError::InvalidInput("probe image is empty"));
        }
        if candidate_png.trim().is_empty() {
            return Err(VerifyError::InvalidInput("candidate image is empty"));
        }

        let probe_image = decode_image(probe_png)?;
        let candidate_image = decode_image(candidate_png)?;

        let probe = self.engine.extract(&probe_image)?;
        let candidate = self.engine.extract(&candidate_image)?;

        let raw_score = self.engine.compare(&probe, &candidate);
        let result = MatchResult::from_score(raw_score, self.threshold);

        debug!(
            probe = %payload_digest(probe_png),
            candidate = %payload_digest(candidate_png),
            raw_score,
            score = result.score,
            matched = result.is_match,
            "compared fingerprints"
        );

        Ok(result)
    }
}
