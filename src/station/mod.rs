//! Station directory: resolving tide stations by ID or proximity
//!
//! The directory is a capability the prediction engine calls through the
//! [`StationDirectory`] trait, so tests can substitute it without touching
//! the network. The NOAA-backed implementation fetches the provider's
//! station catalog once, keeps it in memory behind a TTL, and answers both
//! ID lookups and nearest-station queries from that list.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::data::noaa::{self, NoaaError, NoaaStationMetadata};
use crate::data::{Station, StationCapability, StationSource};
use crate::http::{HttpClient, HttpError};

/// Provider endpoint for the tide prediction station catalog
const STATION_LIST_PATH: &str = "/mdapi/prod/webapi/tidepredstations.json";

/// Mean Earth radius in kilometers, for haversine distances
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Errors from station resolution
#[derive(Debug, Error)]
pub enum StationError {
    /// No station in the catalog matches the requested identifier
    #[error("station not found: {0}")]
    NotFound(String),

    /// The catalog could not be fetched or parsed
    #[error("station catalog unavailable: {0}")]
    Upstream(String),
}

impl From<HttpError> for StationError {
    fn from(err: HttpError) -> Self {
        StationError::Upstream(err.to_string())
    }
}

impl From<NoaaError> for StationError {
    fn from(err: NoaaError) -> Self {
        StationError::Upstream(err.to_string())
    }
}

/// Capability interface for station lookup
#[async_trait]
pub trait StationDirectory: Send + Sync {
    /// Resolves a station by its provider identifier.
    async fn find_station(&self, station_id: &str) -> Result<Station, StationError>;

    /// Returns up to `limit` stations ordered nearest-first from the given
    /// coordinates, with `distance` populated in kilometers.
    async fn find_nearest_stations(
        &self,
        latitude: f64,
        longitude: f64,
        limit: usize,
    ) -> Result<Vec<Station>, StationError>;
}

/// Cached catalog snapshot
struct CatalogSnapshot {
    fetched_at: Instant,
    stations: Arc<Vec<NoaaStationMetadata>>,
}

/// NOAA-backed station directory with an in-memory catalog cache
pub struct NoaaStationFinder {
    http: Arc<HttpClient>,
    catalog: RwLock<Option<CatalogSnapshot>>,
    list_ttl: Duration,
}

impl NoaaStationFinder {
    pub fn new(http: Arc<HttpClient>, list_ttl: Duration) -> Self {
        Self {
            http,
            catalog: RwLock::new(None),
            list_ttl,
        }
    }

    /// Returns the station catalog, fetching it from the provider when the
    /// cached copy is absent or stale.
    async fn station_list(&self) -> Result<Arc<Vec<NoaaStationMetadata>>, StationError> {
        {
            let catalog = self.catalog.read().await;
            if let Some(snapshot) = catalog.as_ref() {
                if snapshot.fetched_at.elapsed() < self.list_ttl {
                    return Ok(Arc::clone(&snapshot.stations));
                }
            }
        }

        let mut catalog = self.catalog.write().await;
        // Another request may have refreshed the list while we waited
        if let Some(snapshot) = catalog.as_ref() {
            if snapshot.fetched_at.elapsed() < self.list_ttl {
                return Ok(Arc::clone(&snapshot.stations));
            }
        }

        debug!("fetching station catalog");
        let response = self.http.get(STATION_LIST_PATH).await?;
        if !response.is_success() {
            return Err(StationError::Upstream(format!(
                "station catalog request failed with status {}",
                response.status
            )));
        }

        let stations = Arc::new(noaa::parse_station_list(&response.body)?);
        debug!(count = stations.len(), "station catalog refreshed");

        *catalog = Some(CatalogSnapshot {
            fetched_at: Instant::now(),
            stations: Arc::clone(&stations),
        });
        Ok(stations)
    }
}

#[async_trait]
impl StationDirectory for NoaaStationFinder {
    async fn find_station(&self, station_id: &str) -> Result<Station, StationError> {
        let stations = self.station_list().await?;

        stations
            .iter()
            .find(|candidate| candidate.station_id == station_id)
            .map(|metadata| to_station(metadata, None))
            .ok_or_else(|| StationError::NotFound(station_id.to_string()))
    }

    async fn find_nearest_stations(
        &self,
        latitude: f64,
        longitude: f64,
        limit: usize,
    ) -> Result<Vec<Station>, StationError> {
        let stations = self.station_list().await?;

        let mut ranked: Vec<(f64, &NoaaStationMetadata)> = stations
            .iter()
            .map(|metadata| {
                let distance = haversine_km(latitude, longitude, metadata.lat, metadata.lon);
                (distance, metadata)
            })
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(distance, metadata)| to_station(metadata, Some(distance)))
            .collect())
    }
}

/// Converts a catalog entry into the internal station model
fn to_station(metadata: &NoaaStationMetadata, distance: Option<f64>) -> Station {
    Station {
        id: metadata.station_id.clone(),
        name: metadata.name.clone(),
        state: metadata.state.clone(),
        region: metadata.region.clone(),
        distance,
        latitude: metadata.lat,
        longitude: metadata.lon,
        source: StationSource::Noaa,
        capabilities: vec![StationCapability::WaterLevel],
        time_zone_offset: metadata.time_zone_offset_seconds(),
        level: metadata.level.clone(),
        station_type: metadata.station_type.clone(),
    }
}

/// Great-circle distance between two WGS84 points in kilometers
fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}
