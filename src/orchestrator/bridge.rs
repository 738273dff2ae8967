/**
 * UI Bridge
 * Message channel between the scanner UI and the matching orchestrator
 */

use serde::{Deserialize, Serialize, Serializer};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{
    identify, CaptureOutcome, Employee, EnrollmentSession, Identification, ServiceUnavailable,
    Verifier,
};

pub const DUPLICATE_MESSAGE: &str =
    "This finger is already registered. Please scan a different finger.";
pub const NO_MATCH_MESSAGE: &str = "No match. Fingerprint not recognized.";
pub const UNREACHABLE_MESSAGE: &str = "Fingerprint service not reachable. Try again.";
pub const SET_FULL_MESSAGE: &str = "All fingers are already captured.";

/// Messages arriving from the scanner UI.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Inbound {
    /// Roster used for attendance identification.
    #[serde(rename = "employees")]
    Employees { data: Vec<Employee> },
    #[serde(rename = "fingerprint-register")]
    RegisterCaptured { image: String },
    #[serde(rename = "fingerprint-attendance-capture")]
    AttendanceCaptured { image: String },
}

/// Messages sent back to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Registration {
        outcome: CaptureOutcome,
        captured: usize,
    },
    RegistrationFailed {
        message: String,
    },
    MatchFound {
        employee: Employee,
        image: String,
        score: i64,
    },
    NoMatch {
        image: String,
    },
    AttendanceFailed {
        image: String,
        message: String,
    },
}

impl Serialize for Outbound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = match self {
            Outbound::Registration { outcome, captured } => {
                let (status, slot, message) = match outcome {
                    CaptureOutcome::Accepted { slot } => ("accepted", Some(*slot), None),
                    CaptureOutcome::Duplicate { .. } => {
                        ("duplicate", None, Some(DUPLICATE_MESSAGE))
                    }
                    CaptureOutcome::SetFull => ("set_full", None, Some(SET_FULL_MESSAGE)),
                    CaptureOutcome::Empty => ("empty", None, None),
                };
                json!({
                    "type": "fingerprint-register",
                    "status": status,
                    "slot": slot,
                    "captured": captured,
                    "message": message,
                })
            }
            Outbound::RegistrationFailed { message } => json!({
                "type": "fingerprint-register",
                "status": "error",
                "message": message,
            }),
            Outbound::MatchFound {
                employee,
                image,
                score,
            } => json!({
                "type": "fingerprint-attendance",
                "status": "match",
                "employee": employee,
                "image": image,
                "score": score,
            }),
            Outbound::NoMatch { image } => json!({
                "type": "fingerprint-attendance",
                "status": "no_match",
                "image": image,
                "message": NO_MATCH_MESSAGE,
            }),
            Outbound::AttendanceFailed { image, message } => json!({
                "type": "fingerprint-attendance",
                "status": "error",
                "image": image,
                "message": message,
            }),
        };
        value.serialize(serializer)
    }
}

fn unreachable_message(err: &ServiceUnavailable) -> String {
    warn!("Verification service unavailable: {err}");
    UNREACHABLE_MESSAGE.to_string()
}

/// Processes UI events one at a time until the inbound channel closes or the
/// UI stops listening. Returns the samples accepted during enrollment.
pub async fn run_bridge<V: Verifier + ?Sized>(
    verifier: &V,
    mut inbound: mpsc::Receiver<Inbound>,
    outbound: mpsc::Sender<Outbound>,
) -> Vec<String> {
    let mut roster: Vec<Employee> = Vec::new();
    let mut session = EnrollmentSession::new();

    while let Some(event) = inbound.recv().await {
        let reply = match event {
            Inbound::Employees { data } => {
                info!("Employees loaded: {}", data.len());
                roster = data;
                continue;
            }
            Inbound::RegisterCaptured { image } => match session.capture(verifier, image).await {
                Ok(outcome) => Outbound::Registration {
                    outcome,
                    captured: session.len(),
                },
                Err(err) => Outbound::RegistrationFailed {
                    message: unreachable_message(&err),
                },
            },
            Inbound::AttendanceCaptured { image } => {
                match identify(verifier, &image, &roster).await {
                    Ok(Identification::Match {
                        employee, score, ..
                    }) => Outbound::MatchFound {
                        employee: employee.clone(),
                        image,
                        score,
                    },
                    Ok(Identification::NoMatch) => Outbound::NoMatch { image },
                    Err(err) => Outbound::AttendanceFailed {
                        message: unreachable_message(&err),
                        image,
                    },
                }
            }
        };

        if outbound.send(reply).await.is_err() {
            warn!("UI side of the bridge closed");
            break;
        }
    }

    session.into_samples()
}
