use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use aqmon_service::analysis::{filter_by_date_range, MeasurementAnalyzer};
use aqmon_service::cache::CacheStore;
use aqmon_service::config::{AppConfig, DEFAULT_CONFIG_PATH};
use aqmon_service::ingest::gios::GiosClient;
use aqmon_service::logging::{self, init_logger, DataSource};
use aqmon_service::model::{Sensor, Station, INDEX_OVERALL};
use aqmon_service::session::Session;

#[derive(Parser)]
#[command(name = "aqmon", version, about = "Air-quality measurements from GIOS, with an offline cache")]
struct Cli {
    /// TOML configuration file (optional)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Prefix console log lines with timestamps
    #[arg(long)]
    timestamps: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List stations
    Stations {
        /// Only stations whose name contains this text (case-insensitive)
        #[arg(long)]
        filter: Option<String>,
    },
    /// List the sensors of a station
    Sensors { station: i64 },
    /// Show a sensor's measurements with min/max/average/trend
    Analyze {
        station: i64,
        sensor: i64,
        /// First day of the range, YYYY-MM-DD
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        /// Last day of the range (inclusive), YYYY-MM-DD
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        /// Save the fetched series to the local cache
        #[arg(long, conflicts_with = "cached")]
        save: bool,
        /// Analyse the locally saved series even when online
        #[arg(long)]
        cached: bool,
    },
    /// Show the air-quality index of a station
    Index { station: i64 },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    init_logger(config.log_level()?, config.log_file.as_deref(), cli.timestamps);

    let cache = CacheStore::open(&config.cache_path)
        .with_context(|| format!("opening cache {}", config.cache_path.display()))?;
    let client = GiosClient::from_config(&config)?;
    let mut session = Session::start(client, cache);

    println!("Mode: {}", session.mode());

    match cli.command {
        Command::Stations { filter } => {
            let needle = filter.map(|f| f.to_lowercase());
            for station in session.stations() {
                if needle.as_ref().is_some_and(|n| !station.name.to_lowercase().contains(n)) {
                    continue;
                }
                println!("{:>6}  {}", station.id, station.name);
            }
        }

        Command::Sensors { station } => {
            let sensors = session.sensors(station)?;
            if sensors.is_empty() {
                println!("No sensors for station {}", station);
            }
            for sensor in sensors {
                print_sensor(&sensor);
            }
        }

        Command::Index { station } => match session.air_quality_index(station)? {
            Some(index) if !index.is_empty() => {
                for (pollutant, level) in &index {
                    println!("{:<8} {}", pollutant, level);
                }
            }
            _ => println!("No air quality index for station {}", station),
        },

        Command::Analyze { station, sensor, from, to, save, cached } => {
            let station = resolve_station(&session, station)?;
            let sensors = if cached {
                session.cache().list_saved_sensors(station.id)
            } else {
                session.sensors(station.id)?
            };
            let sensor = match sensors.into_iter().find(|s| s.id == sensor) {
                Some(sensor) => sensor,
                None => bail!("sensor {} not found at station {}", sensor, station.id),
            };

            let index = if cached {
                Ok(session.cached_air_quality_index(station.id))
            } else {
                session.air_quality_index(station.id)
            };
            let origin = if cached { " (cached)" } else { "" };
            match index {
                Ok(Some(index)) => match index.get(INDEX_OVERALL) {
                    Some(level) => println!("Overall air quality index: {}{}", level, origin),
                    None => println!("No overall air quality index."),
                },
                Ok(None) => println!("No overall air quality index."),
                Err(err) => logging::warn(DataSource::Gios, None, &err.to_string()),
            }

            let series = if cached {
                session.cached_measurements(station.id, sensor.id)
            } else {
                session.measurements(station.id, sensor.id)?
            };
            let Some(series) = series else {
                println!("No saved data for this station and sensor.");
                return Ok(());
            };

            let shown = match (from, to) {
                (Some(from), Some(to)) => filter_by_date_range(&series, from, to),
                _ => series.clone(),
            };

            for m in &shown {
                if m.is_valid() {
                    println!("{} - {}", m.timestamp, m.value);
                } else {
                    println!("{} - no measurement", m.timestamp);
                }
            }
            println!();
            let label = format!("{}{}", sensor.parameter_name, origin);
            print!("{}", MeasurementAnalyzer::new(&shown).summary(&label));

            if save {
                if session.is_offline() {
                    println!("Offline: nothing new to save.");
                } else {
                    session
                        .save(&station, &sensor, &series)
                        .context("saving to the local cache")?;
                    println!("Saved to {}", session.cache().path().display());
                }
            }
        }
    }

    Ok(())
}

fn resolve_station<S>(session: &Session<S>, station_id: i64) -> anyhow::Result<Station>
where
    S: aqmon_service::ingest::AirQualitySource,
{
    match session.find_station(station_id) {
        Some(station) => Ok(station.clone()),
        None if session.is_offline() => bail!("station {} is not in the local cache", station_id),
        None => bail!("unknown station {}", station_id),
    }
}

fn print_sensor(sensor: &Sensor) {
    if sensor.parameter_formula.is_empty() {
        println!("{:>6}  {}", sensor.id, sensor.parameter_name);
    } else {
        println!("{:>6}  {} ({})", sensor.id, sensor.parameter_name, sensor.parameter_formula);
    }
}
