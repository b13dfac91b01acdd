//! Tide CLI - Command line tool for NOAA tide-gauge daily maxima.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "tide-cli",
    version,
    about = "Coastal tide-gauge download and daily-maximum toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: tide_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    log::debug!("tide-cli {}", env!("CARGO_PKG_VERSION"));
    tide_cmd::run(cli.command).await
}
