/**
 * Error types
 * Per-request verification failures and their HTTP mapping
 */

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::engine::ExtractionError;

/// Stage of the decode pipeline that rejected an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    Base64,
    Png,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeStage::Base64 => f.write_str("base64"),
            DecodeStage::Png => f.write_str("png"),
        }
    }
}

/// Failures of a single verification request.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("{stage} decode failed: {reason}")]
    Decode { stage: DecodeStage, reason: String },

    #[error("template extraction failed: {0}")]
    TemplateExtraction(#[from] ExtractionError),
}

impl IntoResponse for VerifyError {
    fn into_response(self) -> Response {
        error_body(StatusCode::BAD_REQUEST, self.to_string())
    }
}

/// Everything a `/verify` handler can answer with besides a result.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("verification worker failed")]
    Worker,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Verify(_) | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Worker => StatusCode::INTERNAL_SERVER_ERROR,
        };

        error_body(status, self.to_string())
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
