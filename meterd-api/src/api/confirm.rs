//! Measurement confirmation endpoint
//!
//! `PATCH /confirm` applies the one-time human override of the extracted
//! value. A second confirmation for the same measurement is a caller error.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use meterd_common::Error;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ConfirmBody {
    measure_uuid: Option<String>,
    confirmed_value: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub success: bool,
}

/// PATCH /confirm
pub async fn confirm_measurement(
    State(state): State<AppState>,
    payload: Result<Json<ConfirmBody>, JsonRejection>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let Json(body) = payload
        .map_err(|e| Error::InvalidInput(format!("Request body is not valid JSON: {}", e)))?;

    let (uuid, confirmed_value) = validate_confirmation(body)?;
    state.engine.confirm(&uuid, confirmed_value).await?;

    Ok(Json(ConfirmResponse { success: true }))
}

/// Typed field validation for the confirmation body
fn validate_confirmation(body: ConfirmBody) -> Result<(Uuid, f64), ApiError> {
    let mut errors = Vec::new();

    let uuid = match body.measure_uuid.as_deref().map(Uuid::parse_str) {
        Some(Ok(uuid)) => Some(uuid),
        _ => {
            errors.push("measure_uuid must be a valid UUID".to_string());
            None
        }
    };

    let confirmed_value = match body.confirmed_value {
        Some(v) if v.is_finite() && v >= 0.0 => Some(v),
        _ => {
            errors.push("confirmed_value must be a non-negative number".to_string());
            None
        }
    };

    if !errors.is_empty() {
        return Err(Error::InvalidInput(errors.join(", ")).into());
    }
    Ok((uuid.unwrap(), confirmed_value.unwrap()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_accepts_uuid_and_non_negative_value() {
        let body = ConfirmBody {
            measure_uuid: Some(Uuid::new_v4().to_string()),
            confirmed_value: Some(0.0),
        };
        assert!(validate_confirmation(body).is_ok());
    }

    #[test]
    fn validation_rejects_bad_uuid_and_negative_value() {
        let body = ConfirmBody {
            measure_uuid: Some("not-a-uuid".to_string()),
            confirmed_value: Some(-1.0),
        };
        let err = validate_confirmation(body).unwrap_err();
        let Error::InvalidInput(msg) = err.0 else {
            panic!("expected InvalidInput");
        };
        assert!(msg.contains("measure_uuid"));
        assert!(msg.contains("confirmed_value"));
    }

    #[test]
    fn validation_rejects_missing_fields() {
        let body = ConfirmBody {
            measure_uuid: None,
            confirmed_value: None,
        };
        assert!(validate_confirmation(body).is_err());
    }
}
