//! In-memory measurement store
//!
//! Holds every measurement record for the process lifetime. All access goes
//! through a single `tokio::sync::Mutex`, so check-then-act sequences
//! (uniqueness re-check at insert, already-confirmed check at confirm) are
//! atomic with respect to each other.

use chrono::{DateTime, Utc};
use meterd_common::{Error, MeasureType, Measurement, Result};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Owned store for all measurement records
///
/// The lifecycle engine is the only writer; listing and lookups are
/// read-only. Records are kept in insertion order and never deleted.
#[derive(Debug, Default)]
pub struct MeasurementStore {
    records: Mutex<Vec<Measurement>>,
}

impl MeasurementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff a record matches `customer_code` and `measure_type` exactly
    /// and shares the calendar (month, year) of `measure_date`.
    pub async fn exists(
        &self,
        customer_code: &str,
        measure_type: MeasureType,
        measure_date: &DateTime<Utc>,
    ) -> bool {
        let records = self.records.lock().await;
        records
            .iter()
            .any(|m| matches_dedup_key(m, customer_code, measure_type, measure_date))
    }

    /// Append a new record with a fresh UUID and `confirmed = false`.
    ///
    /// Uniqueness is re-validated under the lock: the slow extraction call
    /// runs outside it, so a concurrent create for the same
    /// (customer, type, month) key may have landed in between. The loser
    /// fails with `DuplicateMeasurement` and commits nothing.
    pub async fn insert(
        &self,
        customer_code: &str,
        measure_type: MeasureType,
        measure_date: DateTime<Utc>,
        measure_value: f64,
    ) -> Result<Measurement> {
        let mut records = self.records.lock().await;

        if records
            .iter()
            .any(|m| matches_dedup_key(m, customer_code, measure_type, &measure_date))
        {
            return Err(Error::DuplicateMeasurement);
        }

        let measurement = Measurement {
            customer_code: customer_code.to_string(),
            measure_type,
            measure_date,
            measure_uuid: Uuid::new_v4(),
            measure_value,
            confirmed: false,
        };
        records.push(measurement.clone());
        Ok(measurement)
    }

    /// Exact-match lookup by UUID
    pub async fn find_by_uuid(&self, uuid: &Uuid) -> Option<Measurement> {
        let records = self.records.lock().await;
        records.iter().find(|m| &m.measure_uuid == uuid).cloned()
    }

    /// All records for a customer, optionally filtered by type, in
    /// insertion order
    pub async fn list_by_customer(
        &self,
        customer_code: &str,
        measure_type: Option<MeasureType>,
    ) -> Vec<Measurement> {
        let records = self.records.lock().await;
        records
            .iter()
            .filter(|m| m.customer_code == customer_code)
            .filter(|m| measure_type.map_or(true, |t| m.measure_type == t))
            .cloned()
            .collect()
    }

    /// Apply the one-time confirmation: overwrite the value and flip
    /// `confirmed` to true.
    ///
    /// Lookup, already-confirmed check and mutation happen under one lock
    /// acquisition. A second confirmation is a caller error, not a no-op.
    pub async fn confirm(&self, uuid: &Uuid, confirmed_value: f64) -> Result<()> {
        let mut records = self.records.lock().await;

        let measurement = records
            .iter_mut()
            .find(|m| &m.measure_uuid == uuid)
            .ok_or_else(|| Error::NotFound(uuid.to_string()))?;

        if measurement.confirmed {
            return Err(Error::AlreadyConfirmed);
        }

        measurement.measure_value = confirmed_value;
        measurement.confirmed = true;
        Ok(())
    }
}

/// Dedup key match: exact customer and type, same calendar month and year
fn matches_dedup_key(
    m: &Measurement,
    customer_code: &str,
    measure_type: MeasureType,
    measure_date: &DateTime<Utc>,
) -> bool {
    m.customer_code == customer_code
        && m.measure_type == measure_type
        && m.same_month(measure_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_uuid_and_starts_unconfirmed() {
        let store = MeasurementStore::new();
        let m = store
            .insert("C1", MeasureType::Water, date(2024, 3, 5), 100.0)
            .await
            .unwrap();

        assert_eq!(m.customer_code, "C1");
        assert_eq!(m.measure_value, 100.0);
        assert!(!m.confirmed);
        assert_eq!(store.find_by_uuid(&m.measure_uuid).await.unwrap().measure_uuid, m.measure_uuid);
    }

    #[tokio::test]
    async fn insert_rejects_same_month_same_type() {
        let store = MeasurementStore::new();
        store
            .insert("C1", MeasureType::Water, date(2024, 3, 5), 100.0)
            .await
            .unwrap();

        // Different day, same month and year
        let err = store
            .insert("C1", MeasureType::Water, date(2024, 3, 28), 200.0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateMeasurement));

        // Different type in the same month is fine
        store
            .insert("C1", MeasureType::Gas, date(2024, 3, 5), 50.0)
            .await
            .unwrap();

        // Same type in the next month is fine
        store
            .insert("C1", MeasureType::Water, date(2024, 4, 5), 110.0)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn exists_matches_month_and_year_only() {
        let store = MeasurementStore::new();
        store
            .insert("C1", MeasureType::Water, date(2024, 3, 5), 100.0)
            .await
            .unwrap();

        assert!(store.exists("C1", MeasureType::Water, &date(2024, 3, 31)).await);
        assert!(!store.exists("C1", MeasureType::Water, &date(2025, 3, 5)).await);
        assert!(!store.exists("C1", MeasureType::Gas, &date(2024, 3, 5)).await);
        assert!(!store.exists("C2", MeasureType::Water, &date(2024, 3, 5)).await);
    }

    #[tokio::test]
    async fn list_by_customer_filters_and_preserves_order() {
        let store = MeasurementStore::new();
        let m1 = store
            .insert("C1", MeasureType::Water, date(2024, 1, 1), 1.0)
            .await
            .unwrap();
        let m2 = store
            .insert("C1", MeasureType::Gas, date(2024, 1, 1), 2.0)
            .await
            .unwrap();
        let m3 = store
            .insert("C1", MeasureType::Water, date(2024, 2, 1), 3.0)
            .await
            .unwrap();
        store
            .insert("C2", MeasureType::Water, date(2024, 1, 1), 4.0)
            .await
            .unwrap();

        let all = store.list_by_customer("C1", None).await;
        assert_eq!(
            all.iter().map(|m| m.measure_uuid).collect::<Vec<_>>(),
            vec![m1.measure_uuid, m2.measure_uuid, m3.measure_uuid]
        );

        let water = store.list_by_customer("C1", Some(MeasureType::Water)).await;
        assert_eq!(water.len(), 2);
        assert!(water.iter().all(|m| m.measure_type == MeasureType::Water));

        assert!(store.list_by_customer("C3", None).await.is_empty());
    }

    #[tokio::test]
    async fn confirm_overwrites_value_exactly_once() {
        let store = MeasurementStore::new();
        let m = store
            .insert("C1", MeasureType::Water, date(2024, 3, 5), 100.0)
            .await
            .unwrap();

        store.confirm(&m.measure_uuid, 42.0).await.unwrap();
        let stored = store.find_by_uuid(&m.measure_uuid).await.unwrap();
        assert!(stored.confirmed);
        assert_eq!(stored.measure_value, 42.0);

        // Second confirmation fails and leaves the value untouched
        let err = store.confirm(&m.measure_uuid, 99.0).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyConfirmed));
        let stored = store.find_by_uuid(&m.measure_uuid).await.unwrap();
        assert_eq!(stored.measure_value, 42.0);
    }

    #[tokio::test]
    async fn confirm_unknown_uuid_is_not_found() {
        let store = MeasurementStore::new();
        let err = store.confirm(&Uuid::new_v4(), 1.0).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
