//! End-of-run report of what each station produced.

use anyhow::Context;
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// What one station went through.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StationOutcome {
    pub station_id: String,
    pub city: String,
    pub year_files: Vec<PathBuf>,
    pub merged: Option<PathBuf>,
    pub merged_rows: usize,
    pub daily: Option<PathBuf>,
    pub daily_rows: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub raw_dir: PathBuf,
    pub daily_dir: PathBuf,
    pub first_year: i32,
    pub last_year: i32,
    pub stations: Vec<StationOutcome>,
}

impl RunSummary {
    pub fn failures(&self) -> impl Iterator<Item = &StationOutcome> {
        self.stations.iter().filter(|s| s.error.is_some())
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    pub fn log(&self) {
        for station in &self.stations {
            match &station.error {
                None => info!(
                    "{} ({}): {} years, {} hourly rows, {} daily rows",
                    station.city,
                    station.station_id,
                    station.year_files.len(),
                    station.merged_rows,
                    station.daily_rows
                ),
                Some(e) => warn!("{} ({}) failed: {}", station.city, station.station_id, e),
            }
        }
        info!("Raw files dir:    {}", self.raw_dir.display());
        info!("Daily files dir:  {}", self.daily_dir.display());
    }

    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing summary {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_and_json() {
        let summary = RunSummary {
            raw_dir: PathBuf::from("noaa_raw"),
            daily_dir: PathBuf::from("noaa_daily"),
            first_year: 2020,
            last_year: 2020,
            stations: vec![
                StationOutcome {
                    station_id: "8723214".to_string(),
                    city: "Miami (Virginia Key)".to_string(),
                    daily_rows: 366,
                    ..StationOutcome::default()
                },
                StationOutcome {
                    station_id: "8761927".to_string(),
                    city: "New Orleans (New Canal)".to_string(),
                    error: Some("boom".to_string()),
                    ..StationOutcome::default()
                },
            ],
        };
        assert_eq!(summary.failed_count(), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        summary.write_json(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["stations"][0]["daily_rows"], 366);
        assert_eq!(value["stations"][1]["error"], "boom");
        assert_eq!(value["first_year"], 2020);
    }
}
