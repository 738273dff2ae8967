/**
 * Matching Orchestrator
 * Drives the verification service for enrollment duplicate checks and
 * 1:N attendance identification
 */

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::biometric::MatchResult;

pub mod bridge;
pub mod enrollment;
pub mod http;
pub mod identification;

pub use bridge::{run_bridge, Inbound, Outbound};
pub use enrollment::{CaptureOutcome, EnrollmentSession, MAX_SAMPLES};
pub use http::HttpVerifier;
pub use identification::{confirm_identity, identify, Identification, IdentityCheck};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Timeout,
    Status,
    Body,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Transport => "transport",
            FailureKind::Timeout => "timeout",
            FailureKind::Status => "status",
            FailureKind::Body => "body",
        };
        f.write_str(name)
    }
}

/// The verification service could not produce a result for a call.
///
/// Transport failures, timeouts and non-2xx answers are all collapsed into
/// this one error; a scan that hits it stops immediately.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("fingerprint service not reachable ({kind}): {message}")]
pub struct ServiceUnavailable {
    pub kind: FailureKind,
    pub message: String,
}

impl ServiceUnavailable {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// One 1:1 comparison against the verification service.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(
        &self,
        probe_png: &str,
        candidate_png: &str,
    ) -> Result<MatchResult, ServiceUnavailable>;
}

/// Employee record as handed over by the employee store.
///
/// Fields this crate does not use are kept in `extra` so the record can be
/// passed back to the UI unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, deserialize_with = "nullable_samples")]
    pub biometric_data: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Employee {
    pub fn new(id: impl Into<String>, samples: Vec<String>) -> Self {
        Self {
            id: id.into(),
            first_name: String::new(),
            last_name: String::new(),
            biometric_data: samples,
            extra: Map::new(),
        }
    }

    /// Stored samples in stored order, with their slot index. Empty slots are skipped.
    pub fn samples(&self) -> impl Iterator<Item = (usize, &str)> {
        self.biometric_data
            .iter()
            .enumerate()
            .filter(|(_, sample)| !sample.trim().is_empty())
            .map(|(index, sample)| (index, sample.as_str()))
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

fn nullable_samples<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}
