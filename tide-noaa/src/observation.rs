use crate::schema::ResolvedColumns;
use chrono::{DateTime, NaiveDate, Utc};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tide_utils::dates::parse_timestamp_utc;

/// Column headers of the daily-maximum CSV.
pub const DAILY_MAX_HEADERS: [&str; 3] = ["date", "daily_max_tide_m", "city"];

/// Why a row of an hourly series did not become an observation.
#[derive(Debug, PartialEq, Clone, Copy, Hash)]
pub enum RowRejection {
    BadTimestamp,
    BadLevel,
}

/// One hourly reading from a station-year file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub timestamp: DateTime<Utc>,
    /// Water level in metres relative to MSL
    pub water_level: f64,
    /// Trimmed cells of the quality columns, in header order
    pub quality: Vec<String>,
}

impl RawObservation {
    /// Build an observation from a CSV row using resolved column positions.
    pub fn from_record(
        record: &StringRecord,
        columns: &ResolvedColumns,
    ) -> Result<RawObservation, RowRejection> {
        let timestamp = record
            .get(columns.timestamp)
            .and_then(parse_timestamp_utc)
            .ok_or(RowRejection::BadTimestamp)?;
        let water_level = record
            .get(columns.water_level)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .ok_or(RowRejection::BadLevel)?;
        let quality = columns
            .quality
            .iter()
            .map(|&idx| record.get(idx).unwrap_or("").trim().to_string())
            .collect();
        Ok(RawObservation {
            timestamp,
            water_level,
            quality,
        })
    }

    /// Calendar date (UTC) of the reading.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Highest water level observed on one calendar date at one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMax {
    pub date: NaiveDate,
    pub station_id: String,
    pub daily_max_tide_m: f64,
    pub city: String,
}

impl DailyMax {
    /// CSV row in `DAILY_MAX_HEADERS` order.
    pub fn to_record(&self) -> StringRecord {
        StringRecord::from(vec![
            self.date.format("%Y-%m-%d").to_string(),
            self.daily_max_tide_m.to_string(),
            self.city.clone(),
        ])
    }
}
