//! Pipeline configuration assembled from command-line arguments.

use anyhow::Context;
use clap::{Args, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tide_noaa::fetcher::{CachePolicy, FetchPolicy};
use tide_noaa::schema::{HourlySchema, NOAA_HOURLY};
use tide_noaa::station::Station;
use tide_noaa::year_window::YearWindow;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CacheMode {
    /// Reuse any non-empty downloaded file
    Trust,
    /// Reuse a downloaded file only if its SHA3 sidecar matches
    Verify,
}

impl From<CacheMode> for CachePolicy {
    fn from(mode: CacheMode) -> Self {
        match mode {
            CacheMode::Trust => CachePolicy::Trust,
            CacheMode::Verify => CachePolicy::Verify,
        }
    }
}

/// Options shared by the commands that touch the station/year grid.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Directory for raw per-year and merged hourly CSVs
    #[arg(long, value_name = "DIR", default_value = "noaa_raw")]
    pub raw_dir: PathBuf,

    /// Directory for daily-maximum CSVs
    #[arg(long, value_name = "DIR", default_value = "noaa_daily")]
    pub daily_dir: PathBuf,

    /// First calendar year to fetch
    #[arg(long, value_name = "YYYY", default_value_t = 2015)]
    pub first_year: i32,

    /// Last calendar year to fetch (inclusive)
    #[arg(long, value_name = "YYYY", default_value_t = 2024)]
    pub last_year: i32,

    /// CSV of `station_id,city` replacing the built-in station list
    #[arg(long, value_name = "FILE")]
    pub stations_csv: Option<PathBuf>,

    /// Attempts per station-year before giving up
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,

    /// Linear backoff base between attempts, in seconds
    #[arg(long, default_value_t = 2)]
    pub backoff_secs: u64,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// How existing downloads are trusted
    #[arg(long, value_enum, default_value_t = CacheMode::Trust)]
    pub cache_policy: CacheMode,

    /// Smallest existing file (bytes) reused under the trust policy
    #[arg(long, default_value_t = 1)]
    pub min_cached_bytes: u64,
}

/// Everything a pipeline stage needs, passed explicitly.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub stations: Vec<Station>,
    pub window: YearWindow,
    pub raw_dir: PathBuf,
    pub daily_dir: PathBuf,
    pub fetch: FetchPolicy,
    pub schema: HourlySchema,
    /// Continue with the next station after a station fails
    pub keep_going: bool,
}

impl PipelineConfig {
    pub fn from_args(args: &PipelineArgs) -> anyhow::Result<Self> {
        let window = YearWindow::supported(args.first_year, args.last_year)?;
        let stations = load_stations(args.stations_csv.as_ref())?;
        if stations.is_empty() {
            anyhow::bail!("station list is empty");
        }
        Ok(PipelineConfig {
            stations,
            window,
            raw_dir: args.raw_dir.clone(),
            daily_dir: args.daily_dir.clone(),
            fetch: FetchPolicy {
                max_attempts: args.max_attempts,
                backoff_base: Duration::from_secs(args.backoff_secs),
                timeout: Duration::from_secs(args.timeout_secs),
                cache_policy: args.cache_policy.into(),
                min_cached_bytes: args.min_cached_bytes,
            },
            schema: NOAA_HOURLY,
            keep_going: false,
        })
    }

    /// One station by id, or every configured station.
    pub fn select_stations(&self, station_id: Option<&str>) -> anyhow::Result<Vec<Station>> {
        match station_id {
            Some(id) => Ok(vec![Station::find(&self.stations, id)?.clone()]),
            None => Ok(self.stations.clone()),
        }
    }
}

/// Built-in stations, or those listed in `path`.
pub fn load_stations(path: Option<&PathBuf>) -> anyhow::Result<Vec<Station>> {
    match path {
        Some(path) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("reading stations CSV {}", path.display()))?;
            Station::parse_station_csv(&data)
                .with_context(|| format!("parsing stations CSV {}", path.display()))
        }
        None => Ok(Station::get_station_vector()?),
    }
}
