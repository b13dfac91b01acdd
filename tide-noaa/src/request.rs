use chrono::NaiveDate;
use tide_utils::dates::format_date_compact;

/// CO-OPS data retrieval endpoint.
pub const NOAA_DATAGETTER_URL: &str = "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter";

/// Hourly heights, the verified hourly series.
pub const PRODUCT: &str = "hourly_height";
pub const DATUM: &str = "MSL";
pub const UNITS: &str = "metric";
pub const TIME_ZONE: &str = "gmt";
pub const FORMAT: &str = "csv";

/// A single (station, year) download.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TideRequest {
    pub station_id: String,
    pub year: i32,
}

impl TideRequest {
    pub fn new(station_id: &str, year: i32) -> Self {
        TideRequest {
            station_id: station_id.to_string(),
            year,
        }
    }

    /// Query parameters for the datagetter, covering Jan 1 through Dec 31.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let (begin, end) = self.date_bounds();
        vec![
            ("begin_date", begin),
            ("end_date", end),
            ("station", self.station_id.clone()),
            ("product", PRODUCT.to_string()),
            ("datum", DATUM.to_string()),
            ("units", UNITS.to_string()),
            ("time_zone", TIME_ZONE.to_string()),
            ("format", FORMAT.to_string()),
        ]
    }

    /// Full request URL, used for logging and error messages.
    pub fn url(&self, base_url: &str) -> String {
        let query = self
            .query_params()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{base_url}?{query}")
    }

    /// Name of the raw file this request is cached under.
    pub fn file_name(&self) -> String {
        format!("{}_{}_hourly.csv", self.station_id, self.year)
    }

    fn date_bounds(&self) -> (String, String) {
        match (
            NaiveDate::from_ymd_opt(self.year, 1, 1),
            NaiveDate::from_ymd_opt(self.year, 12, 31),
        ) {
            (Some(begin), Some(end)) => (format_date_compact(&begin), format_date_compact(&end)),
            _ => (format!("{}0101", self.year), format!("{}1231", self.year)),
        }
    }
}
