/**
 * Enrollment
 * Builds an employee's finger set, rejecting duplicate captures
 */

use tracing::{debug, info};

use super::{ServiceUnavailable, Verifier};

/// One slot per finger.
pub const MAX_SAMPLES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Stored in `slot`.
    Accepted { slot: usize },
    /// Matches the sample already stored at `existing_index`; discarded.
    Duplicate { existing_index: usize, score: i64 },
    /// All slots are taken; the service was not called.
    SetFull,
    /// The capture carried no image; the service was not called.
    Empty,
}

/// Samples accepted during one enrollment session, in capture order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnrollmentSession {
    samples: Vec<String>,
    revision: u64,
}

impl EnrollmentSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.samples.len() >= MAX_SAMPLES
    }

    /// Advanced by one for every accepted sample.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn into_samples(self) -> Vec<String> {
        self.samples
    }

    /// Checks `image` against every accepted sample in insertion order and
    /// stores it when none of them match.
    ///
    /// A service failure leaves the session untouched.
    pub async fn capture<V: Verifier + ?Sized>(
        &mut self,
        verifier: &V,
        image: String,
    ) -> Result<CaptureOutcome, ServiceUnavailable> {
        if self.is_complete() {
            debug!("Finger set full, capture ignored");
            return Ok(CaptureOutcome::SetFull);
        }
        if image.trim().is_empty() {
            return Ok(CaptureOutcome::Empty);
        }

        for (existing_index, existing) in self.samples.iter().enumerate() {
            let result = verifier.verify(&image, existing).await?;
            debug!(
                "Duplicate check against F{}: score={} match={}",
                existing_index + 1,
                result.score,
                result.is_match
            );

            if result.is_match {
                info!("Capture rejected: finger already registered as F{}", existing_index + 1);
                return Ok(CaptureOutcome::Duplicate {
                    existing_index,
                    score: result.score,
                });
            }
        }

        self.samples.push(image);
        self.revision += 1;
        let slot = self.samples.len() - 1;
        info!("Finger {} captured", slot + 1);

        Ok(CaptureOutcome::Accepted { slot })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::testing::ScriptedVerifier;
    use crate::orchestrator::FailureKind;

    #[tokio::test]
    async fn first_capture_needs_no_comparison() {
        let verifier = ScriptedVerifier::default();
        let mut session = EnrollmentSession::new();

        let outcome = session.capture(&verifier, "f1".to_string()).await.unwrap();

        assert_eq!(outcome, CaptureOutcome::Accepted { slot: 0 });
        assert_eq!(verifier.call_count(), 0);
        assert_eq!(session.revision(), 1);
    }

    #[tokio::test]
    async fn same_finger_twice_is_stored_once() {
        let verifier = ScriptedVerifier::default().matching("f1", "f1");
        let mut session = EnrollmentSession::new();

        session.capture(&verifier, "f1".to_string()).await.unwrap();
        let outcome = session.capture(&verifier, "f1".to_string()).await.unwrap();

        assert_eq!(
            outcome,
            CaptureOutcome::Duplicate {
                existing_index: 0,
                score: 80
            }
        );
        assert_eq!(session.samples(), &["f1".to_string()]);
        assert_eq!(session.revision(), 1);
    }

    #[tokio::test]
    async fn duplicate_scan_stops_at_first_match_in_insertion_order() {
        let verifier = ScriptedVerifier::default()
            .matching("new", "b")
            .matching("new", "c");
        let mut session = EnrollmentSession::new();
        for sample in ["a", "b", "c", "d"] {
            session.capture(&verifier, sample.to_string()).await.unwrap();
        }
        let before = verifier.call_count();

        let outcome = session.capture(&verifier, "new".to_string()).await.unwrap();

        assert_eq!(
            outcome,
            CaptureOutcome::Duplicate {
                existing_index: 1,
                score: 80
            }
        );
        let candidates = verifier.candidates();
        assert_eq!(&candidates[before..], &["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn eleventh_capture_is_rejected_locally() {
        let verifier = ScriptedVerifier::default();
        let mut session = EnrollmentSession::new();
        for finger in 0..MAX_SAMPLES {
            let outcome = session.capture(&verifier, format!("f{finger}")).await.unwrap();
            assert_eq!(outcome, CaptureOutcome::Accepted { slot: finger });
        }
        assert!(session.is_complete());
        let calls = verifier.call_count();

        let outcome = session.capture(&verifier, "extra".to_string()).await.unwrap();

        assert_eq!(outcome, CaptureOutcome::SetFull);
        assert_eq!(verifier.call_count(), calls);
        assert_eq!(session.len(), MAX_SAMPLES);
    }

    #[tokio::test]
    async fn service_failure_leaves_session_unchanged() {
        let verifier = ScriptedVerifier::default().failing_at(1);
        let mut session = EnrollmentSession::new();
        session.capture(&verifier, "f1".to_string()).await.unwrap();

        let err = session.capture(&verifier, "f2".to_string()).await.unwrap_err();

        assert_eq!(err.kind, FailureKind::Transport);
        assert_eq!(session.samples(), &["f1".to_string()]);
        assert_eq!(session.revision(), 1);
    }

    #[tokio::test]
    async fn empty_capture_is_ignored() {
        let verifier = ScriptedVerifier::default();
        let mut session = EnrollmentSession::new();

        let outcome = session.capture(&verifier, "  ".to_string()).await.unwrap();

        assert_eq!(outcome, CaptureOutcome::Empty);
        assert!(session.is_empty());
    }
}
