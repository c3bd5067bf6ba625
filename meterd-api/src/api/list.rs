//! Customer measurement listing endpoint

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use meterd_common::{MeasureType, Measurement};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{image_url, ApiError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Optional case-insensitive type filter
    measure_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub customer_code: String,
    pub measures: Vec<MeasureSummary>,
}

#[derive(Debug, Serialize)]
pub struct MeasureSummary {
    pub measure_uuid: Uuid,
    pub measure_datetime: DateTime<Utc>,
    pub measure_type: MeasureType,
    pub has_confirmed: bool,
    pub image_url: String,
}

/// GET /:customer_code/list?measure_type=
pub async fn list_measurements(
    State(state): State<AppState>,
    Path(customer_code): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let filter = match query.measure_type.as_deref() {
        Some(raw) => Some(raw.parse::<MeasureType>()?),
        None => None,
    };

    let measurements = state.query.list(&customer_code, filter).await?;
    let measures = measurements
        .iter()
        .map(|m| summarize(m, &state.image_base_url))
        .collect();

    Ok(Json(ListResponse {
        customer_code,
        measures,
    }))
}

fn summarize(m: &Measurement, image_base_url: &str) -> MeasureSummary {
    MeasureSummary {
        measure_uuid: m.measure_uuid,
        measure_datetime: m.measure_date,
        measure_type: m.measure_type,
        has_confirmed: m.confirmed,
        image_url: image_url(image_base_url, &m.measure_uuid),
    }
}
