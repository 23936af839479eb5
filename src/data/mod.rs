//! Core data models for the tide prediction service
//!
//! This module contains the data types used throughout the service for
//! representing stations, tide predictions, cached day records, and the
//! assembled response returned to callers.

pub mod noaa;

use serde::{Deserialize, Serialize};

/// Upstream provider a station was sourced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationSource {
    Noaa,
}

/// Kinds of observations a station can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationCapability {
    WaterLevel,
    TidalCurrents,
    WaterTemperature,
}

/// A tide station as resolved by the station directory
///
/// Immutable once resolved. The time zone is a fixed UTC offset in seconds,
/// matching how the provider reports station-local times; it deliberately
/// carries no DST rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// Provider-assigned station identifier
    pub id: String,
    /// Human-readable station name
    pub name: Option<String>,
    /// State or province abbreviation, if reported
    pub state: Option<String>,
    /// Provider region grouping, if reported
    pub region: Option<String>,
    /// Distance in kilometers from the query point, set when the station
    /// was resolved by coordinates
    pub distance: Option<f64>,
    /// Latitude in WGS84 degrees
    pub latitude: f64,
    /// Longitude in WGS84 degrees
    pub longitude: f64,
    /// Which provider this station belongs to
    pub source: StationSource,
    /// Observation kinds the station supports
    pub capabilities: Vec<StationCapability>,
    /// Fixed UTC offset of the station's local time, in seconds
    pub time_zone_offset: i32,
    /// Provider level classification, if reported
    pub level: Option<String>,
    /// "R" for reference stations, "S" for subordinate stations
    pub station_type: Option<String>,
}

impl Station {
    /// True when the provider offers only high/low events for this station,
    /// not the dense 6-minute prediction series.
    pub fn is_subordinate(&self) -> bool {
        self.station_type.as_deref() == Some("S")
    }
}

/// Whether an extreme is a high or low water event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TideType {
    High,
    Low,
}

/// Direction of the tide at the evaluated instant
///
/// Absence of a trend (too little data on one side of the instant) is
/// represented by `Option::None`, never by a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TideTrend {
    Rising,
    Falling,
}

/// A single water-level prediction sample
///
/// Timestamps are epoch milliseconds UTC; heights are in the station's
/// reporting unit (feet for NOAA with the configured datum).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TidePrediction {
    pub timestamp: i64,
    pub height: f64,
}

/// A provider-reported local maximum or minimum of the tide curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TideExtreme {
    #[serde(rename = "type")]
    pub kind: TideType,
    pub timestamp: i64,
    pub height: f64,
}

/// One station-local calendar day of predictions and extremes
///
/// This is the unit of both upstream fetch and cache storage. All contained
/// timestamps fall within `date` in the station's fixed-offset local time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TidePredictionRecord {
    /// Station the record belongs to
    pub station_id: String,
    /// Station-local calendar date, `YYYY-MM-DD`
    pub date: String,
    /// "R" or "S", mirroring the station's classification at fetch time
    pub station_type: String,
    /// Dense prediction samples for the day (empty for subordinate stations)
    pub predictions: Vec<TidePrediction>,
    /// High/low events for the day
    pub extremes: Vec<TideExtreme>,
    /// Epoch milliseconds when this record was fetched
    pub last_updated: i64,
    /// Epoch milliseconds after which the record is stale
    pub ttl: i64,
}

impl TidePredictionRecord {
    /// True once the record's expiry has passed
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.ttl
    }
}

/// Assembled answer for one tide query
///
/// Constructed fresh per request and never cached; only its daily building
/// blocks ([`TidePredictionRecord`]) are. Serialization is the transport
/// layer's concern; the camelCase field names follow the provider-facing
/// convention so transports can pass it through unchanged.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedTideResponse {
    /// Instant the query was evaluated at, epoch milliseconds UTC
    pub timestamp: i64,
    /// The same instant in the station's local time, `YYYY-MM-DDThh:mm:ss`
    pub local_time: String,
    /// Water level at the evaluated instant
    pub water_level: Option<f64>,
    /// Interpolated predicted level at the evaluated instant
    pub predicted_level: Option<f64>,
    /// Identifier of the station the answer is for
    pub nearest_station: String,
    /// Station display name
    pub location: Option<String>,
    /// Station latitude
    pub latitude: f64,
    /// Station longitude
    pub longitude: f64,
    /// Distance from the query coordinates, when resolved by location
    pub station_distance: Option<f64>,
    /// Rising or falling, when determinable from the available data
    pub tide_trend: Option<TideTrend>,
    /// How the level was produced
    pub calculation_method: String,
    /// Merged high/low events across the requested span, ascending
    pub extremes: Vec<TideExtreme>,
    /// Merged prediction samples across the requested span, ascending
    pub predictions: Vec<TidePrediction>,
    /// Fixed UTC offset used for all local-time arithmetic, in seconds
    pub time_zone_offset_seconds: Option<i32>,
}
