//! Command-line interface parsing for the tidecast binary
//!
//! The binary is the minimal transport face of the service: it accepts
//! either a station identifier or a coordinate pair, plus an optional
//! station-local time range, and prints the assembled response as JSON.

use clap::Parser;
use thiserror::Error;

/// Errors from CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// Neither a station nor a full coordinate pair was given
    #[error("either --station or both --lat and --lon are required")]
    MissingTarget,

    /// A station and coordinates were both given
    #[error("--station cannot be combined with --lat/--lon")]
    ConflictingTarget,

    /// Only one of --lat/--lon was given
    #[error("--lat and --lon must be provided together")]
    PartialCoordinates,
}

/// Tidecast - current and ranged tide levels for coastal stations
#[derive(Parser, Debug)]
#[command(name = "tidecast")]
#[command(about = "Current and ranged tide levels for coastal stations")]
#[command(version)]
pub struct Cli {
    /// Station identifier to query directly (e.g. 9447130)
    #[arg(long)]
    pub station: Option<String>,

    /// Latitude of the point of interest; resolves the nearest station
    #[arg(long)]
    pub lat: Option<f64>,

    /// Longitude of the point of interest
    #[arg(long)]
    pub lon: Option<f64>,

    /// Range start, station-local, YYYY-MM-DDThh:mm:ss
    #[arg(long)]
    pub start: Option<String>,

    /// Range end, station-local, YYYY-MM-DDThh:mm:ss
    #[arg(long)]
    pub end: Option<String>,
}

/// What the query should resolve the station from
#[derive(Debug, Clone, PartialEq)]
pub enum QueryTarget {
    Station(String),
    Coordinates { latitude: f64, longitude: f64 },
}

impl Cli {
    /// Validates the station-or-coordinates rule and returns the target.
    pub fn target(&self) -> Result<QueryTarget, CliError> {
        match (&self.station, self.lat, self.lon) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(CliError::ConflictingTarget),
            (Some(station), None, None) => Ok(QueryTarget::Station(station.clone())),
            (None, Some(latitude), Some(longitude)) => Ok(QueryTarget::Coordinates {
                latitude,
                longitude,
            }),
            (None, Some(_), None) | (None, None, Some(_)) => Err(CliError::PartialCoordinates),
            (None, None, None) => Err(CliError::MissingTarget),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_target() {
        let cli = Cli::parse_from(["tidecast", "--station", "9447130"]);
        assert_eq!(
            cli.target().unwrap(),
            QueryTarget::Station("9447130".to_string())
        );
    }

    #[test]
    fn test_coordinate_target() {
        let cli = Cli::parse_from(["tidecast", "--lat", "47.6", "--lon", "-122.3"]);
        match cli.target().unwrap() {
            QueryTarget::Coordinates {
                latitude,
                longitude,
            } => {
                assert!((latitude - 47.6).abs() < 1e-9);
                assert!((longitude - (-122.3)).abs() < 1e-9);
            }
            other => panic!("Expected coordinates, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_target_rejected() {
        let cli = Cli::parse_from(["tidecast"]);
        assert!(matches!(cli.target(), Err(CliError::MissingTarget)));
    }

    #[test]
    fn test_conflicting_target_rejected() {
        let cli = Cli::parse_from([
            "tidecast", "--station", "9447130", "--lat", "47.6", "--lon", "-122.3",
        ]);
        assert!(matches!(cli.target(), Err(CliError::ConflictingTarget)));
    }

    #[test]
    fn test_partial_coordinates_rejected() {
        let cli = Cli::parse_from(["tidecast", "--lat", "47.6"]);
        assert!(matches!(cli.target(), Err(CliError::PartialCoordinates)));
    }

    #[test]
    fn test_range_arguments_pass_through() {
        let cli = Cli::parse_from([
            "tidecast",
            "--station",
            "9447130",
            "--start",
            "2025-01-28T00:00:00",
            "--end",
            "2025-01-29T00:00:00",
        ]);
        assert_eq!(cli.start.as_deref(), Some("2025-01-28T00:00:00"));
        assert_eq!(cli.end.as_deref(), Some("2025-01-29T00:00:00"));
    }
}
