//! Fetch -> merge -> daily, station by station.

use crate::config::PipelineConfig;
use crate::summary::{RunSummary, StationOutcome};
use anyhow::Context;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use tide_data::daily::{daily_file_name, hourly_to_daily_max, DailyOutput};
use tide_data::merge::{merge_years, merged_file_name, MergeReport};
use tide_noaa::fetcher::StationYearFetcher;
use tide_noaa::request::TideRequest;
use tide_noaa::schema::HourlySchema;
use tide_noaa::source::TideSource;
use tide_noaa::station::Station;

fn fetcher_for<S: TideSource>(config: &PipelineConfig, source: S) -> StationYearFetcher<S> {
    StationYearFetcher::new(
        source,
        config.stations.clone(),
        &config.raw_dir,
        config.fetch.clone(),
    )
}

/// Merge already-present year files for one station.
fn merge_station(config: &PipelineConfig, station: &Station, year_files: &[PathBuf]) -> anyhow::Result<MergeReport> {
    let merged_path = config
        .raw_dir
        .join(merged_file_name(&station.station_id, &config.window));
    let report = merge_years(&station.station_id, year_files, &config.schema, &merged_path)
        .with_context(|| format!("merging years for {}", station.station_id))?;
    Ok(report)
}

/// Reduce a merged series into the daily directory.
fn reduce_station(
    config: &PipelineConfig,
    station: &Station,
    merged_path: &Path,
) -> anyhow::Result<DailyOutput> {
    fs::create_dir_all(&config.daily_dir)
        .with_context(|| format!("creating {}", config.daily_dir.display()))?;
    let out_path = config.daily_dir.join(daily_file_name(merged_path));
    let output = hourly_to_daily_max(merged_path, station, &config.schema, &out_path)
        .with_context(|| format!("reducing {} to daily maxima", merged_path.display()))?;
    Ok(output)
}

async fn process_station<S: TideSource>(
    fetcher: &StationYearFetcher<S>,
    config: &PipelineConfig,
    station: &Station,
    outcome: &mut StationOutcome,
) -> anyhow::Result<()> {
    outcome.year_files = fetcher
        .fetch_station(&station.station_id, &config.window)
        .await
        .with_context(|| format!("fetching {} ({})", station.city, station.station_id))?;
    let merged = merge_station(config, station, &outcome.year_files)?;
    outcome.merged_rows = merged.rows;
    let daily = reduce_station(config, station, &merged.path)?;
    outcome.merged = Some(merged.path);
    outcome.daily_rows = daily.rows;
    outcome.daily = Some(daily.path);
    Ok(())
}

/// Run all three stages for every configured station.
///
/// The first failing station aborts the run unless `keep_going` is set, in
/// which case the failure is recorded in the summary and the next station
/// is processed.
pub async fn run_pipeline<S: TideSource>(config: &PipelineConfig, source: S) -> anyhow::Result<RunSummary> {
    let fetcher = fetcher_for(config, source);
    let mut summary = RunSummary {
        raw_dir: config.raw_dir.clone(),
        daily_dir: config.daily_dir.clone(),
        first_year: config.window.first(),
        last_year: config.window.last(),
        stations: Vec::with_capacity(config.stations.len()),
    };

    for station in &config.stations {
        info!("=== {} ({}) ===", station.city, station.station_id);
        let mut outcome = StationOutcome {
            station_id: station.station_id.clone(),
            city: station.city.clone(),
            ..StationOutcome::default()
        };
        if let Err(e) = process_station(&fetcher, config, station, &mut outcome).await {
            if !config.keep_going {
                return Err(e);
            }
            warn!("{:#}; continuing with next station", e);
            outcome.error = Some(format!("{e:#}"));
        }
        summary.stations.push(outcome);
    }
    Ok(summary)
}

/// Fetch every year for the selected stations.
pub async fn run_fetch<S: TideSource>(
    config: &PipelineConfig,
    source: S,
    station_id: Option<&str>,
) -> anyhow::Result<Vec<PathBuf>> {
    let fetcher = fetcher_for(config, source);
    let mut files = Vec::new();
    for station in config.select_stations(station_id)? {
        let station_files = fetcher
            .fetch_station(&station.station_id, &config.window)
            .await
            .with_context(|| format!("fetching {} ({})", station.city, station.station_id))?;
        files.extend(station_files);
    }
    Ok(files)
}

/// Merge the already-downloaded years for the selected stations.
pub fn run_merge(config: &PipelineConfig, station_id: Option<&str>) -> anyhow::Result<Vec<MergeReport>> {
    config.window.check_supported()?;
    let mut reports = Vec::new();
    for station in config.select_stations(station_id)? {
        let year_files: Vec<PathBuf> = config
            .window
            .years()
            .map(|year| {
                config
                    .raw_dir
                    .join(TideRequest::new(&station.station_id, year).file_name())
            })
            .collect();
        if let Some(missing) = year_files.iter().find(|p| !p.exists()) {
            anyhow::bail!(
                "{} has not been downloaded; run fetch first",
                missing.display()
            );
        }
        reports.push(merge_station(config, &station, &year_files)?);
    }
    Ok(reports)
}

/// Reduce a single merged (or per-year) file.
pub fn run_daily(
    input: &Path,
    station: &Station,
    schema: &HourlySchema,
    output: &Path,
) -> anyhow::Result<DailyOutput> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    hourly_to_daily_max(input, station, schema, output)
        .with_context(|| format!("reducing {} to daily maxima", input.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Duration;
    use tide_noaa::error::{Result as TideResult, TideError};
    use tide_noaa::fetcher::FetchPolicy;
    use tide_noaa::schema::NOAA_HOURLY;
    use tide_noaa::year_window::YearWindow;

    /// Serves three hourly rows on June 1st of the requested year; fails for
    /// one station id.
    struct StubSource {
        failing_station: Option<&'static str>,
        calls: Cell<usize>,
    }

    impl StubSource {
        fn new(failing_station: Option<&'static str>) -> Self {
            StubSource {
                failing_station,
                calls: Cell::new(0),
            }
        }
    }

    impl TideSource for &StubSource {
        async fn fetch_csv(&self, request: &TideRequest) -> TideResult<String> {
            self.calls.set(self.calls.get() + 1);
            if self.failing_station == Some(request.station_id.as_str()) {
                return Err(TideError::ErrorPage("<html> 502 bad gateway".to_string()));
            }
            let y = request.year;
            Ok(format!(
                "Date Time, Water Level, Sigma, I, L\n\
                 {y}-06-01 00:00,0.31,0.003,0,0\n\
                 {y}-06-01 01:00,0.42,0.003,0,0\n\
                 {y}-06-01 02:00,0.28,0.003,0,0\n"
            ))
        }
    }

    fn config(root: &Path) -> PipelineConfig {
        PipelineConfig {
            stations: Station::get_station_vector().unwrap(),
            window: YearWindow::new(2019, 2020).unwrap(),
            raw_dir: root.join("noaa_raw"),
            daily_dir: root.join("noaa_daily"),
            fetch: FetchPolicy {
                backoff_base: Duration::ZERO,
                ..FetchPolicy::default()
            },
            schema: NOAA_HOURLY,
            keep_going: false,
        }
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let source = StubSource::new(None);
        let summary = run_pipeline(&config, &source).await.unwrap();

        assert_eq!(summary.stations.len(), 3);
        assert_eq!(summary.failed_count(), 0);
        assert_eq!(source.calls.get(), 6);

        let miami = &summary.stations[0];
        assert_eq!(miami.year_files.len(), 2);
        assert_eq!(miami.merged_rows, 6);
        assert_eq!(miami.daily_rows, 2);
        let daily_path = dir.path().join("noaa_daily/8723214_2019_2020_daily_max.csv");
        assert_eq!(miami.daily.as_deref(), Some(daily_path.as_path()));
        assert_eq!(
            fs::read_to_string(daily_path).unwrap(),
            "date,daily_max_tide_m,city\n\
             2019-06-01,0.42,Miami (Virginia Key)\n\
             2020-06-01,0.42,Miami (Virginia Key)\n"
        );
        assert!(dir
            .path()
            .join("noaa_raw/8638610_2019_2020_hourly_merged.csv")
            .exists());
    }

    #[tokio::test]
    async fn test_rerun_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let source = StubSource::new(None);
        run_pipeline(&config, &source).await.unwrap();
        let first = fs::read_to_string(dir.path().join("noaa_raw/8723214_2019_hourly.csv")).unwrap();
        run_pipeline(&config, &source).await.unwrap();
        assert_eq!(source.calls.get(), 6);
        let second = fs::read_to_string(dir.path().join("noaa_raw/8723214_2019_hourly.csv")).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failure_aborts_whole_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let source = StubSource::new(Some("8761927"));
        let err = run_pipeline(&config, &source).await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("8761927"));
        assert!(message.contains("error page"));
        // Norfolk comes after New Orleans and is never attempted
        assert!(!dir.path().join("noaa_raw/8638610_2019_hourly.csv").exists());
        assert!(!dir.path().join("noaa_daily/8761927_2019_2020_daily_max.csv").exists());
    }

    #[tokio::test]
    async fn test_keep_going_isolates_stations() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.keep_going = true;
        let source = StubSource::new(Some("8761927"));
        let summary = run_pipeline(&config, &source).await.unwrap();
        assert_eq!(summary.failed_count(), 1);
        let failed = summary.failures().next().unwrap();
        assert_eq!(failed.station_id, "8761927");
        assert!(failed.daily.is_none());
        assert!(dir
            .path()
            .join("noaa_daily/8638610_2019_2020_daily_max.csv")
            .exists());
    }

    #[tokio::test]
    async fn test_fetch_then_merge() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let source = StubSource::new(None);
        let files = run_fetch(&config, &source, Some("8723214")).await.unwrap();
        assert_eq!(files.len(), 2);

        let reports = run_merge(&config, Some("8723214")).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].rows, 6);

        // other stations were never fetched
        assert!(run_merge(&config, Some("8638610")).is_err());
    }

    #[test]
    fn test_merge_rejects_unsupported_window_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.window = YearWindow::new(0, 2_000_000_000).unwrap();
        let err = run_merge(&config, Some("8723214")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TideError>(),
            Some(TideError::UnsupportedYear { year: 0, .. })
        ));
    }

    #[test]
    fn test_run_daily_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        fs::write(&input, "Date Time,Water Level\n2020-06-01 00:00,0.5\n").unwrap();
        let station = Station {
            station_id: "8723214".to_string(),
            city: "Miami (Virginia Key)".to_string(),
        };
        let output = dir.path().join("nested/out.csv");
        let result = run_daily(&input, &station, &NOAA_HOURLY, &output).unwrap();
        assert_eq!(result.rows, 1);
        assert!(output.exists());
    }
}
