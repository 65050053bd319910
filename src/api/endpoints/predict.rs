//! Prediction endpoint.
//!
//! The body is read as raw bytes, not `Json<T>`: any malformed body,
//! whatever its content type, gets the list-of-strings 400. Bodies over
//! `MAX_BODY_BYTES` get a JSON 413.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::{parse_symptoms, Prediction};

/// `POST /predict`: raw symptom list in, disease label out.
pub async fn predict(
    State(ctx): State<ApiContext>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::InvalidSymptoms
        }
    })?;
    let raw = parse_symptoms(&body)?;
    let prediction = ctx.core.predictor().predict(&raw)?;
    Ok(Json(prediction))
}

/// `OPTIONS /predict` without CORS request headers.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}
