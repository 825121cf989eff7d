//! cmclient - command line front end for the Coastal Monitoring observations API
//!
//! ```text
//! cmclient waves --sensor Porthleven --at 2025-01-04T09:30:00 --format csv
//! cmclient glossary
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use coastal_monitoring_client::config::{self, ClientConfig};
use coastal_monitoring_client::export::{self, format_table, write_csv};
use coastal_monitoring_client::glossary;
use coastal_monitoring_client::logging::{self, LogLevel};
use coastal_monitoring_client::CoastalMonitoringClient;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "coastal_monitoring.toml";

#[derive(Debug, Parser)]
#[command(name = "cmclient", version, about = "Coastal Monitoring observations client")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Also append log output to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch the wave observation closest to a point in time
    Waves {
        /// Sensor name, e.g. "Porthleven"
        #[arg(long)]
        sensor: String,

        /// Requested time (UTC): RFC 3339, or YYYY-MM-DDTHH:MM:SS
        #[arg(long, value_parser = parse_time)]
        at: DateTime<Utc>,

        /// TOML configuration file (default: ./coastal_monitoring.toml, then environment)
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Keep wire abbreviations (hs, tp, …) instead of descriptive column names
        #[arg(long)]
        raw_columns: bool,
    },

    /// Print the wave parameter glossary
    Glossary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }
    Err(format!(
        "invalid time '{}': expected RFC 3339 or YYYY-MM-DDTHH:MM:SS (UTC)",
        s
    ))
}

fn resolve_config(path: Option<&Path>) -> Result<ClientConfig> {
    match path {
        Some(path) => config::load_config(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            config::load_config(Path::new(DEFAULT_CONFIG_FILE))
                .with_context(|| format!("loading configuration from {}", DEFAULT_CONFIG_FILE))
        }
        None => ClientConfig::from_env().context("no configuration file; reading environment"),
    }
}

fn run_waves(
    sensor: &str,
    at: DateTime<Utc>,
    config_path: Option<&Path>,
    format: OutputFormat,
    raw_columns: bool,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let mut client = CoastalMonitoringClient::new(config);

    let observation = client
        .with_session(|c| c.get_observation_of_waves(sensor, at))
        .map_err(|err| {
            logging::log_request_failure(sensor, "get_observation_of_waves", &err);
            err
        })
        .with_context(|| format!("fetching waves for '{}' at {}", sensor, at))?;

    info!(
        sensor,
        features = observation.features.len(),
        "Received wave observation"
    );

    let rows = export::export(&observation, !raw_columns);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match format {
        OutputFormat::Table => write!(out, "{}", format_table(&rows))?,
        OutputFormat::Csv => write_csv(&rows, &mut out)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &rows)?;
            writeln!(out)?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logger(
        LogLevel::from_verbosity(cli.verbose, cli.quiet),
        cli.log_file.as_deref(),
        cli.verbose > 1,
    )?;

    match cli.command {
        Command::Waves {
            sensor,
            at,
            config,
            format,
            raw_columns,
        } => run_waves(&sensor, at, config.as_deref(), format, raw_columns),
        Command::Glossary => {
            print!("{}", glossary::describe());
            Ok(())
        }
    }
}
