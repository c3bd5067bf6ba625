//! Measurement lifecycle engine
//!
//! Orchestrates creation (dedup pre-check, external value extraction,
//! insert) and the one-time confirmation. The engine is the only writer to
//! the store.

use chrono::{DateTime, Utc};
use meterd_common::{Error, MeasureType, Measurement, Result};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::extraction::ValueExtractor;
use crate::store::MeasurementStore;

pub struct MeasurementEngine {
    store: Arc<MeasurementStore>,
    extractor: Arc<dyn ValueExtractor>,
}

impl MeasurementEngine {
    pub fn new(store: Arc<MeasurementStore>, extractor: Arc<dyn ValueExtractor>) -> Self {
        Self { store, extractor }
    }

    /// Record a new measurement from an uploaded meter photo.
    ///
    /// The duplicate pre-check runs before the extraction call so a
    /// colliding upload never costs a provider round-trip. Extraction runs
    /// outside the store lock; `MeasurementStore::insert` re-validates
    /// uniqueness atomically, so two concurrent creates for one
    /// (customer, type, month) key cannot both commit.
    pub async fn create(
        &self,
        customer_code: &str,
        measure_type: &str,
        measure_date: DateTime<Utc>,
        image: &[u8],
    ) -> Result<Measurement> {
        if customer_code.is_empty() {
            return Err(Error::InvalidInput(
                "customer_code must not be empty".to_string(),
            ));
        }
        let measure_type: MeasureType = measure_type.parse()?;

        if self
            .store
            .exists(customer_code, measure_type, &measure_date)
            .await
        {
            return Err(Error::DuplicateMeasurement);
        }

        let measure_value = self.extractor.extract_value(image).await?;

        let measurement = self
            .store
            .insert(customer_code, measure_type, measure_date, measure_value)
            .await?;

        info!(
            "Recorded {} measurement {} for customer {} (value {})",
            measurement.measure_type,
            measurement.measure_uuid,
            measurement.customer_code,
            measurement.measure_value
        );
        Ok(measurement)
    }

    /// Apply the one-time human confirmation of an extracted value.
    ///
    /// Not idempotent: a second confirmation for the same UUID fails with
    /// `AlreadyConfirmed` even if the value is identical.
    pub async fn confirm(&self, uuid: &Uuid, confirmed_value: f64) -> Result<()> {
        self.store.confirm(uuid, confirmed_value).await?;
        info!("Confirmed measurement {} (value {})", uuid, confirmed_value);
        Ok(())
    }
}
