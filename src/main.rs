//! Tidecast binary - query tide levels from the command line
//!
//! Wires the component graph from environment configuration, runs a single
//! query against either a station ID or a coordinate pair, and prints the
//! assembled response as JSON.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use tidecast::cache::MemoryPredictionCache;
use tidecast::cli::{Cli, QueryTarget};
use tidecast::http::{HttpClient, HttpOptions};
use tidecast::station::NoaaStationFinder;
use tidecast::{Config, TideError, TideService};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let target = match cli.target() {
        Ok(target) => target,
        Err(err) => {
            error!("{err}");
            return ExitCode::from(2);
        }
    };

    let config = Config::from_env();
    let http = Arc::new(HttpClient::new(HttpOptions {
        base_url: Some(config.noaa_base_url.clone()),
        timeout: Some(config.http_timeout),
        max_retries: Some(config.http_max_retries),
    }));
    let stations = Arc::new(NoaaStationFinder::new(
        Arc::clone(&http),
        config.station_list_ttl,
    ));
    let cache = Arc::new(MemoryPredictionCache::new(config.cache_lru_size));
    let service = TideService::new(http, stations, cache);

    let result = match target {
        QueryTarget::Station(station_id) => {
            service
                .get_current_tide_for_station(&station_id, cli.start.as_deref(), cli.end.as_deref())
                .await
        }
        QueryTarget::Coordinates {
            latitude,
            longitude,
        } => {
            service
                .get_current_tide(latitude, longitude, cli.start.as_deref(), cli.end.as_deref())
                .await
        }
    };

    let exit = match result {
        Ok(response) => match serde_json::to_string_pretty(&response) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!("serializing response: {err}");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            error!("{err}");
            match err {
                // Caller mistakes and upstream failures exit differently so
                // scripts can tell them apart, mirroring the 4xx/5xx split a
                // service transport would use.
                TideError::InvalidParameter(_) | TideError::InvalidRange(_) => ExitCode::from(2),
                TideError::StationNotFound(_) | TideError::Upstream(_) => ExitCode::FAILURE,
            }
        }
    };

    // Fetched days are written back off the response path; drain them so the
    // process never exits with a write in flight.
    service.wait_for_cache_writes().await;

    exit
}
