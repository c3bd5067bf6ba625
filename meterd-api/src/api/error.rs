//! Error-to-response translation
//!
//! Every business-rule failure becomes a structured JSON body
//! `{error_code, error_description}` with the status mapping below.
//! Internal failure detail is suppressed outside debug builds.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use meterd_common::Error;
use serde::Serialize;
use tracing::error;

/// Wire shape of all error responses
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error_code: String,
    pub error_description: String,
}

/// Newtype so the common error can carry an axum `IntoResponse` impl
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, error_description) = match &self.0 {
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "INVALID_DATA", msg.clone()),
            Error::ExtractionFailed(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_DATA", msg.clone())
            }
            Error::DuplicateMeasurement => (
                StatusCode::CONFLICT,
                "DOUBLE_REPORT",
                "Monthly reading already recorded".to_string(),
            ),
            Error::NotFound(uuid) => (
                StatusCode::NOT_FOUND,
                "MEASURE_NOT_FOUND",
                format!("No measurement with uuid {}", uuid),
            ),
            Error::AlreadyConfirmed => (
                StatusCode::CONFLICT,
                "CONFIRMATION_DUPLICATE",
                "Measurement already confirmed".to_string(),
            ),
            Error::NoMeasurementsFound => (
                StatusCode::NOT_FOUND,
                "MEASURES_NOT_FOUND",
                "No measurements found".to_string(),
            ),
            other => {
                error!("Internal error serving request: {}", other);
                let description = if cfg!(debug_assertions) {
                    other.to_string()
                } else {
                    "Internal Server Error".to_string()
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    description,
                )
            }
        };

        let body = Json(ErrorBody {
            error_code: error_code.to_string(),
            error_description,
        });
        (status, body).into_response()
    }
}
