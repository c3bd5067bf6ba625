//! Read-only measurement queries

use meterd_common::{Error, MeasureType, Measurement, Result};
use std::sync::Arc;

use crate::store::MeasurementStore;

/// Read-only listing over the measurement store
pub struct QueryService {
    store: Arc<MeasurementStore>,
}

impl QueryService {
    pub fn new(store: Arc<MeasurementStore>) -> Self {
        Self { store }
    }

    /// All measurements for a customer, optionally filtered by type.
    ///
    /// An empty result is surfaced as `NoMeasurementsFound` rather than an
    /// empty list; absence of matches is a reported condition.
    pub async fn list(
        &self,
        customer_code: &str,
        measure_type: Option<MeasureType>,
    ) -> Result<Vec<Measurement>> {
        let measurements = self.store.list_by_customer(customer_code, measure_type).await;
        if measurements.is_empty() {
            return Err(Error::NoMeasurementsFound);
        }
        Ok(measurements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn list_reports_empty_results_explicitly() {
        let store = Arc::new(MeasurementStore::new());
        let query = QueryService::new(store.clone());

        let err = query.list("C1", None).await.unwrap_err();
        assert!(matches!(err, Error::NoMeasurementsFound));

        store
            .insert(
                "C1",
                MeasureType::Water,
                Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(),
                10.0,
            )
            .await
            .unwrap();

        assert_eq!(query.list("C1", None).await.unwrap().len(), 1);

        // Filter that matches nothing is also a reported condition
        let err = query.list("C1", Some(MeasureType::Gas)).await.unwrap_err();
        assert!(matches!(err, Error::NoMeasurementsFound));
    }
}
