use crate::error::{Result, TideError};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};

/// Embedded CSV of the default tide-gauge stations.
pub static STATIONS_CSV: &str = include_str!("../../fixtures/stations.csv");

/// A NOAA CO-OPS tide-gauge station.
///
/// See: <https://tidesandcurrents.noaa.gov/stations.html>
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Station {
    /// CO-OPS station identifier (e.g., "8723214" for Virginia Key)
    pub station_id: String,
    /// Human-readable city label carried into the daily output
    pub city: String,
}

impl Station {
    /// Stations from the embedded fixture: Miami, New Orleans, Norfolk.
    pub fn get_station_vector() -> Result<Vec<Station>> {
        Station::parse_station_csv(STATIONS_CSV)
    }

    /// Parse a CSV string of station data into a vector of Stations.
    ///
    /// Expected CSV columns (with headers): station_id, city
    pub fn parse_station_csv(csv_object: &str) -> Result<Vec<Station>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(csv_object.as_bytes());
        let mut station_list = Vec::new();
        for row in rdr.deserialize() {
            let station: Station = row?;
            station_list.push(station);
        }
        Ok(station_list)
    }

    /// Look up a station by identifier in the configured set.
    pub fn find<'a>(stations: &'a [Station], station_id: &str) -> Result<&'a Station> {
        stations
            .iter()
            .find(|s| s.station_id == station_id)
            .ok_or_else(|| TideError::UnknownStation(station_id.to_string()))
    }
}
