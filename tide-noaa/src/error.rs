/// Error types for the tide library
use crate::schema::SchemaError;
use thiserror::Error;

/// Main error type for tide series operations
#[derive(Error, Debug)]
pub enum TideError {
    /// HTTP transport failed (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    /// Server answered with a non-success status
    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Body came back as an HTML or error page instead of CSV
    #[error("Response looks like an error page: {0}")]
    ErrorPage(String),

    /// Every fetch attempt for a station-year failed
    #[error("Failed {station_id}-{year} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        station_id: String,
        year: i32,
        attempts: u32,
        last_error: String,
    },

    /// Station identifier is not in the configured set
    #[error("Station not configured: {0}")]
    UnknownStation(String),

    /// Year outside the data source's historical range
    #[error("Year {year} outside supported range {earliest}..={latest}")]
    UnsupportedYear { year: i32, earliest: i32, latest: i32 },

    /// Year window with first > last
    #[error("Invalid year window: {first} > {last}")]
    InvalidYearWindow { first: i32, last: i32 },

    /// Hourly series header does not satisfy the schema
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Failed to read or write CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Merge was asked to combine zero files
    #[error("No year files to merge for station {0}")]
    EmptyMerge(String),
}

/// Type alias for Results using TideError
pub type Result<T> = std::result::Result<T, TideError>;
