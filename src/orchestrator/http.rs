/**
 * HTTP Verifier
 * Reqwest-backed client for the `/verify` endpoint
 */

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{FailureKind, ServiceUnavailable, Verifier};
use crate::biometric::MatchResult;
use crate::config::ClientConfig;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyBody<'a> {
    probe_png: &'a str,
    candidate_png: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Calls a verification service over HTTP with a per-request timeout.
pub struct HttpVerifier {
    client: Client,
    endpoint: String,
}

impl HttpVerifier {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/verify", config.service_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Verifier for HttpVerifier {
    async fn verify(
        &self,
        probe_png: &str,
        candidate_png: &str,
    ) -> Result<MatchResult, ServiceUnavailable> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&VerifyBody {
                probe_png,
                candidate_png,
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }

        serde_json::from_slice(&body).map_err(|e| {
            ServiceUnavailable::new(FailureKind::Body, format!("invalid verify response: {e}"))
        })
    }
}

fn map_transport_error(error: reqwest::Error) -> ServiceUnavailable {
    if error.is_timeout() {
        ServiceUnavailable::new(FailureKind::Timeout, error.to_string())
    } else {
        ServiceUnavailable::new(FailureKind::Transport, error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ServiceUnavailable {
    let message = match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody { error }) => format!("status {}: {error}", status.as_u16()),
        Err(_) => format!("status {}", status.as_u16()),
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ServiceUnavailable::new(FailureKind::Timeout, message)
        }
        _ => ServiceUnavailable::new(FailureKind::Status, message),
    }
}
