//! Measurement model
//!
//! One `Measurement` per accepted meter-reading upload. Uniqueness is
//! enforced per (customer_code, measure_type, month, year); day-of-month
//! and time-of-day are accepted but do not participate in deduplication.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Kind of utility meter being read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MeasureType {
    Water,
    Gas,
}

impl MeasureType {
    /// Normalized uppercase form used on the wire and in dedup matching
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureType::Water => "WATER",
            MeasureType::Gas => "GAS",
        }
    }
}

impl fmt::Display for MeasureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasureType {
    type Err = Error;

    /// Case-insensitive: "water", "Water" and "WATER" are the same type
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WATER" => Ok(MeasureType::Water),
            "GAS" => Ok(MeasureType::Gas),
            other => Err(Error::InvalidInput(format!(
                "measure_type must be WATER or GAS, got {:?}",
                other
            ))),
        }
    }
}

/// One recorded meter reading with its confirmation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    pub customer_code: String,
    pub measure_type: MeasureType,
    pub measure_date: DateTime<Utc>,
    /// Assigned once at creation, never reused or reassigned
    pub measure_uuid: Uuid,
    /// Extracted reading; overwritten at most once by a confirmation
    pub measure_value: f64,
    /// One-way transition false -> true
    pub confirmed: bool,
}

impl Measurement {
    /// True when `date` falls in the same calendar (month, year) as this
    /// measurement's date. This is the dedup granularity.
    pub fn same_month(&self, date: &DateTime<Utc>) -> bool {
        self.measure_date.month() == date.month() && self.measure_date.year() == date.year()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn measure_type_parsing_is_case_insensitive() {
        for input in ["water", "Water", "WATER", "wAtEr"] {
            assert_eq!(input.parse::<MeasureType>().unwrap(), MeasureType::Water);
        }
        for input in ["gas", "Gas", "GAS"] {
            assert_eq!(input.parse::<MeasureType>().unwrap(), MeasureType::Gas);
        }
    }

    #[test]
    fn measure_type_rejects_unknown_values() {
        assert!("electricity".parse::<MeasureType>().is_err());
        assert!("".parse::<MeasureType>().is_err());
    }

    #[test]
    fn measure_type_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&MeasureType::Water).unwrap(),
            "\"WATER\""
        );
        assert_eq!(serde_json::to_string(&MeasureType::Gas).unwrap(), "\"GAS\"");
    }

    #[test]
    fn same_month_ignores_day_and_time() {
        let m = Measurement {
            customer_code: "C1".to_string(),
            measure_type: MeasureType::Water,
            measure_date: Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap(),
            measure_uuid: Uuid::new_v4(),
            measure_value: 100.0,
            confirmed: false,
        };

        let same_month_other_day = Utc.with_ymd_and_hms(2024, 3, 28, 23, 59, 59).unwrap();
        let next_month = Utc.with_ymd_and_hms(2024, 4, 5, 10, 0, 0).unwrap();
        let same_month_other_year = Utc.with_ymd_and_hms(2025, 3, 5, 10, 0, 0).unwrap();

        assert!(m.same_month(&same_month_other_day));
        assert!(!m.same_month(&next_month));
        assert!(!m.same_month(&same_month_other_year));
    }
}
