//! Command implementations for the tide CLI.
//!
//! Provides subcommands for downloading NOAA hourly water levels, merging
//! them per station, and reducing them to daily maxima.

use anyhow::Context;
use clap::Subcommand;
use log::info;
use std::path::PathBuf;
use tide_noaa::client::NoaaClient;
use tide_noaa::schema::NOAA_HOURLY;
use tide_noaa::station::Station;

pub mod config;
pub mod pipeline;
pub mod summary;

use config::{load_stations, PipelineArgs, PipelineConfig};

#[derive(Subcommand)]
pub enum Command {
    /// Fetch, merge and reduce every configured station
    Run {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Record a failing station and continue with the rest
        #[arg(long)]
        keep_going: bool,

        /// Write a JSON summary of the run
        #[arg(long, value_name = "FILE")]
        summary_json: Option<PathBuf>,
    },

    /// Download hourly files for one station (or all) without merging
    Fetch {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Station id; all configured stations when omitted
        #[arg(short, long)]
        station: Option<String>,
    },

    /// Merge already-downloaded year files
    Merge {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Station id; all configured stations when omitted
        #[arg(short, long)]
        station: Option<String>,
    },

    /// Reduce one hourly CSV to daily maxima
    Daily {
        /// Merged (or single-year) hourly CSV
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// City label written on every output row
        #[arg(long)]
        city: String,

        /// Station id; taken from the input file name when omitted
        #[arg(long)]
        station_id: Option<String>,

        /// Output CSV; defaults to the daily directory
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Directory for the default output path
        #[arg(long, value_name = "DIR", default_value = "noaa_daily")]
        daily_dir: PathBuf,
    },

    /// List the configured stations
    Stations {
        /// CSV of `station_id,city` replacing the built-in station list
        #[arg(long, value_name = "FILE")]
        stations_csv: Option<PathBuf>,
    },
}

fn client_for(config: &PipelineConfig) -> anyhow::Result<NoaaClient> {
    NoaaClient::new(config.fetch.timeout).context("building HTTP client")
}

/// Station id from a file name such as `8723214_2015_2024_hourly_merged.csv`.
fn station_id_from_path(input: &std::path::Path) -> Option<String> {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.split('_').next())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Run {
            pipeline: args,
            keep_going,
            summary_json,
        } => {
            let mut config = PipelineConfig::from_args(&args)?;
            config.keep_going = keep_going;
            info!(
                "Fetching {} stations for {}..={}",
                config.stations.len(),
                config.window.first(),
                config.window.last()
            );
            let summary = pipeline::run_pipeline(&config, client_for(&config)?).await?;
            summary.log();
            if let Some(path) = summary_json {
                summary.write_json(&path)?;
            }
            let failed = summary.failed_count();
            if failed > 0 {
                anyhow::bail!("{} of {} stations failed", failed, summary.stations.len());
            }
            info!("All done.");
            Ok(())
        }
        Command::Fetch {
            pipeline: args,
            station,
        } => {
            let config = PipelineConfig::from_args(&args)?;
            let files =
                pipeline::run_fetch(&config, client_for(&config)?, station.as_deref()).await?;
            info!("{} station-year files in {}", files.len(), config.raw_dir.display());
            Ok(())
        }
        Command::Merge {
            pipeline: args,
            station,
        } => {
            let config = PipelineConfig::from_args(&args)?;
            for report in pipeline::run_merge(&config, station.as_deref())? {
                info!("{} ({} rows)", report.path.display(), report.rows);
            }
            Ok(())
        }
        Command::Daily {
            input,
            city,
            station_id,
            output,
            daily_dir,
        } => {
            let station_id = match station_id.or_else(|| station_id_from_path(&input)) {
                Some(id) => id,
                None => anyhow::bail!(
                    "cannot infer a station id from {}; pass --station-id",
                    input.display()
                ),
            };
            let station = Station { station_id, city };
            let output = output.unwrap_or_else(|| {
                daily_dir.join(tide_data::daily::daily_file_name(&input))
            });
            let result = pipeline::run_daily(&input, &station, &NOAA_HOURLY, &output)?;
            info!("{} ({} rows)", result.path.display(), result.rows);
            Ok(())
        }
        Command::Stations { stations_csv } => {
            for station in load_stations(stations_csv.as_ref())? {
                println!("{}\t{}", station.station_id, station.city);
            }
            Ok(())
        }
    }
}
