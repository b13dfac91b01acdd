//! Station-Year Fetcher: one bounded download per (station, year).
//!
//! Files land in the raw directory as `{station}_{year}_hourly.csv`. An
//! existing file is reused according to the [`CachePolicy`]; otherwise the
//! source is asked up to `max_attempts` times with linear backoff. Nothing
//! is written for a failed attempt.

use crate::error::{Result, TideError};
use crate::request::TideRequest;
use crate::source::TideSource;
use crate::station::Station;
use crate::year_window::{validate_year, YearWindow};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tide_utils::files::{checksum_matches, file_len, write_atomic, write_checksum};

/// How an already-downloaded station-year file is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Reuse any file of at least `min_cached_bytes`
    #[default]
    Trust,
    /// Reuse only when the SHA3 sidecar matches the file contents
    Verify,
}

/// Retry, timeout and cache settings for the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    pub max_attempts: u32,
    /// Sleep before retry `n` is `backoff_base * n`
    pub backoff_base: Duration,
    pub timeout: Duration,
    pub cache_policy: CachePolicy,
    pub min_cached_bytes: u64,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        FetchPolicy {
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
            timeout: crate::client::DEFAULT_TIMEOUT,
            cache_policy: CachePolicy::Trust,
            min_cached_bytes: 1,
        }
    }
}

/// Downloads station-year files into a raw directory.
pub struct StationYearFetcher<S: TideSource> {
    source: S,
    stations: Vec<Station>,
    raw_dir: PathBuf,
    policy: FetchPolicy,
}

impl<S: TideSource> StationYearFetcher<S> {
    pub fn new(source: S, stations: Vec<Station>, raw_dir: &Path, policy: FetchPolicy) -> Self {
        StationYearFetcher {
            source,
            stations,
            raw_dir: raw_dir.to_path_buf(),
            policy,
        }
    }

    /// Path the station-year file is (or will be) stored under.
    pub fn path_for(&self, station_id: &str, year: i32) -> PathBuf {
        self.raw_dir.join(TideRequest::new(station_id, year).file_name())
    }

    /// Fetch one station-year, returning the local file path.
    pub async fn fetch_one_year(&self, station_id: &str, year: i32) -> Result<PathBuf> {
        Station::find(&self.stations, station_id)?;
        validate_year(year)?;

        let request = TideRequest::new(station_id, year);
        let path = self.path_for(station_id, year);
        if self.is_cached(&path)? {
            info!("skip existing {}", path.display());
            return Ok(path);
        }
        fs::create_dir_all(&self.raw_dir)?;

        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();
        for attempt in 1..=max_attempts {
            match self.source.fetch_csv(&request).await {
                Ok(body) => {
                    write_atomic(&path, body.as_bytes())?;
                    if self.policy.cache_policy == CachePolicy::Verify {
                        write_checksum(&path, body.as_bytes())?;
                    }
                    info!("downloaded {} ({} bytes)", path.display(), body.len());
                    return Ok(path);
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{}: {}-{} failed: {}",
                        attempt, max_attempts, station_id, year, e
                    );
                    last_error = e.to_string();
                }
            }
            if attempt < max_attempts {
                let backoff = self.policy.backoff_base * attempt;
                info!(
                    "Sleeping for {} milliseconds before retry for {}-{}",
                    backoff.as_millis(),
                    station_id,
                    year
                );
                tokio::time::sleep(backoff).await;
            }
        }

        Err(TideError::RetriesExhausted {
            station_id: station_id.to_string(),
            year,
            attempts: max_attempts,
            last_error,
        })
    }

    /// Fetch every year of the window for one station, in ascending order.
    ///
    /// Both ends of the window are checked before any request. Stops at the
    /// first station-year that cannot be fetched.
    pub async fn fetch_station(&self, station_id: &str, window: &YearWindow) -> Result<Vec<PathBuf>> {
        Station::find(&self.stations, station_id)?;
        window.check_supported()?;
        let mut files = Vec::new();
        for year in window.years() {
            files.push(self.fetch_one_year(station_id, year).await?);
        }
        Ok(files)
    }

    fn is_cached(&self, path: &Path) -> Result<bool> {
        let len = match file_len(path)? {
            Some(len) => len,
            None => return Ok(false),
        };
        let cached = match self.policy.cache_policy {
            CachePolicy::Trust => len >= self.policy.min_cached_bytes.max(1),
            CachePolicy::Verify => len > 0 && checksum_matches(path)?,
        };
        Ok(cached)
    }
}
