//! Measurement upload endpoint
//!
//! `POST /upload` accepts the reading metadata plus the meter photo, which
//! arrives either as a multipart file field or as a base64 data-URI string
//! in a JSON body. Both sources decode to plain bytes before the lifecycle
//! engine is invoked.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use meterd_common::Error;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{image_url, ApiError};
use crate::AppState;

/// Matches the original service's 10 MB JSON body limit
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub image_url: String,
    pub measure_value: f64,
    pub measure_uuid: Uuid,
}

/// JSON body variant of the upload request
#[derive(Debug, Deserialize)]
struct UploadBody {
    customer_code: Option<String>,
    measure_datetime: Option<String>,
    measure_type: Option<String>,
    /// base64 data-URI, e.g. "data:image/png;base64,..."
    image: Option<String>,
}

/// Where the image bytes came from
enum ImageSource {
    /// Multipart file field
    File(Vec<u8>),
    /// base64 data-URI string field
    DataUri(String),
}

/// Fields as they arrived, before validation
#[derive(Default)]
struct RawUpload {
    customer_code: Option<String>,
    measure_datetime: Option<String>,
    measure_type: Option<String>,
    image: Option<ImageSource>,
}

/// Validated upload, ready for the lifecycle engine
#[derive(Debug)]
struct ValidatedUpload {
    customer_code: String,
    measure_datetime: DateTime<Utc>,
    measure_type: String,
    image: Vec<u8>,
}

/// POST /upload
pub async fn upload_measurement(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<UploadResponse>, ApiError> {
    let raw = read_upload(req).await?;
    let upload = validate_upload(raw)?;

    let measurement = state
        .engine
        .create(
            &upload.customer_code,
            &upload.measure_type,
            upload.measure_datetime,
            &upload.image,
        )
        .await?;

    Ok(Json(UploadResponse {
        image_url: image_url(&state.image_base_url, &measurement.measure_uuid),
        measure_value: measurement.measure_value,
        measure_uuid: measurement.measure_uuid,
    }))
}

/// Pull the upload fields out of either body encoding
async fn read_upload(req: Request) -> Result<RawUpload, ApiError> {
    let is_multipart = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if is_multipart {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| Error::InvalidInput(format!("Malformed multipart body: {}", e)))?;
        read_multipart(multipart).await
    } else {
        let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|e| Error::InvalidInput(format!("Unreadable request body: {}", e)))?;
        let body: UploadBody = serde_json::from_slice(&bytes)
            .map_err(|e| Error::InvalidInput(format!("Request body is not valid JSON: {}", e)))?;

        Ok(RawUpload {
            customer_code: body.customer_code,
            measure_datetime: body.measure_datetime,
            measure_type: body.measure_type,
            image: body.image.map(ImageSource::DataUri),
        })
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<RawUpload, ApiError> {
    let mut raw = RawUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("Malformed multipart field: {}", e)))?
    {
        let read_text = |e| Error::InvalidInput(format!("Unreadable multipart field: {}", e));
        match field.name().unwrap_or_default() {
            "customer_code" => raw.customer_code = Some(field.text().await.map_err(read_text)?),
            "measure_datetime" => {
                raw.measure_datetime = Some(field.text().await.map_err(read_text)?)
            }
            "measure_type" => raw.measure_type = Some(field.text().await.map_err(read_text)?),
            "image" => {
                // A file part carries raw bytes; a text part may carry a
                // data-URI just like the JSON body
                raw.image = if field.file_name().is_some() {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| Error::InvalidInput(format!("Unreadable image: {}", e)))?;
                    Some(ImageSource::File(bytes.to_vec()))
                } else {
                    Some(ImageSource::DataUri(field.text().await.map_err(read_text)?))
                };
            }
            _ => {}
        }
    }

    Ok(raw)
}

/// Typed field validation; all problems are collected into one
/// `INVALID_DATA` description
fn validate_upload(raw: RawUpload) -> Result<ValidatedUpload, ApiError> {
    let mut errors = Vec::new();

    let customer_code = match raw.customer_code {
        Some(code) if !code.is_empty() => Some(code),
        _ => {
            errors.push("customer_code must be a non-empty string".to_string());
            None
        }
    };

    let measure_datetime = match raw.measure_datetime.as_deref().map(parse_datetime) {
        Some(Some(dt)) => Some(dt),
        _ => {
            errors.push("measure_datetime must be a valid ISO-8601 date".to_string());
            None
        }
    };

    let measure_type = match raw.measure_type {
        Some(t) if t.parse::<meterd_common::MeasureType>().is_ok() => Some(t),
        _ => {
            errors.push("measure_type must be \"WATER\" or \"GAS\"".to_string());
            None
        }
    };

    let image = match raw.image {
        Some(ImageSource::File(bytes)) if !bytes.is_empty() => Some(bytes),
        Some(ImageSource::DataUri(uri)) => match decode_data_uri(&uri) {
            Ok(bytes) => Some(bytes),
            Err(msg) => {
                errors.push(msg);
                None
            }
        },
        _ => {
            errors.push(
                "image must be supplied as a file upload or a base64 data-URI".to_string(),
            );
            None
        }
    };

    if !errors.is_empty() {
        return Err(Error::InvalidInput(errors.join(", ")).into());
    }

    // All four are Some once errors is empty
    Ok(ValidatedUpload {
        customer_code: customer_code.unwrap(),
        measure_datetime: measure_datetime.unwrap(),
        measure_type: measure_type.unwrap(),
        image: image.unwrap(),
    })
}

/// Accept RFC 3339 first, then the common naive date/datetime forms
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Decode a "data:image/<fmt>;base64,<payload>" string to raw bytes
fn decode_data_uri(uri: &str) -> Result<Vec<u8>, String> {
    let payload = uri
        .strip_prefix("data:image/")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| "image is not a base64 data-URI".to_string())?;

    BASE64
        .decode(payload)
        .map_err(|e| format!("image base64 payload is invalid: {}", e))
}
