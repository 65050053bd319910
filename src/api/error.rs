//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pipeline::PredictError;

/// Stable message returned for any inference failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "prediction failed";

/// Error response body. Diagnostic fields only appear on the
/// "no recognized symptoms" error.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<Vec<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_symptoms_example: Option<Vec<String>>,
}

impl ErrorBody {
    fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            received: None,
            normalized: None,
            known_symptoms_example: None,
        }
    }
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("symptoms must be a list of strings")]
    InvalidSymptoms,
    #[error("no recognized symptoms")]
    NoRecognizedSymptoms {
        received: Vec<Option<String>>,
        normalized: Vec<String>,
        known_symptoms_example: Vec<String>,
    },
    #[error("request body too large")]
    PayloadTooLarge,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match self {
            ApiError::InvalidSymptoms => (StatusCode::BAD_REQUEST, ErrorBody::message(message)),
            ApiError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, ErrorBody::message(message))
            }
            ApiError::NoRecognizedSymptoms {
                received,
                normalized,
                known_symptoms_example,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: message,
                    received: Some(received),
                    normalized: Some(normalized),
                    known_symptoms_example: Some(known_symptoms_example),
                },
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "Prediction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::message(INTERNAL_ERROR_MESSAGE),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::InvalidInput => ApiError::InvalidSymptoms,
            PredictError::NoRecognizedSymptoms {
                received,
                normalized,
                known_symptoms_example,
            } => ApiError::NoRecognizedSymptoms {
                received,
                normalized,
                known_symptoms_example,
            },
            PredictError::Inference(e) => ApiError::Internal(e.to_string()),
        }
    }
}
