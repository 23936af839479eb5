//! NOAA Tides and Currents response parsing
//!
//! This module normalizes the provider's JSON into the internal model. The
//! provider reports timestamps as naive datetimes in the station's local
//! time and heights as stringified floats; both prediction products (the
//! dense 6-minute series and the sparse high/low events) share one envelope.
//!
//! The provider signals "no data for this product/station" as an HTTP 200
//! whose body is `{"error":{"message":"..."}}`. That case must surface as a
//! typed error carrying the message verbatim; an empty-but-successful day is
//! a different, valid outcome.

use chrono::{FixedOffset, NaiveDateTime, TimeZone};
use serde::Deserialize;
use thiserror::Error;

use super::{TideExtreme, TidePrediction, TideType};

/// Datetime format used by the provider's prediction products
const NOAA_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Errors from normalizing upstream responses
#[derive(Debug, Error)]
pub enum NoaaError {
    /// The provider rejected the request in-band (200 with an error body)
    #[error("{0}")]
    Provider(String),

    /// The body was not valid JSON for any known shape
    #[error("decoding upstream response: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON decoded but a field had an unusable value
    #[error("parsing upstream response: {0}")]
    Parse(String),
}

/// Parses a dense prediction response (`interval=6`) into samples ordered
/// as the provider returned them, reinterpreting each naive local timestamp
/// through the station's fixed offset.
pub fn parse_predictions(
    body: &[u8],
    offset: FixedOffset,
) -> Result<Vec<TidePrediction>, NoaaError> {
    let entries = decode_envelope(body)?;

    entries
        .iter()
        .map(|entry| {
            Ok(TidePrediction {
                timestamp: local_to_epoch_ms(&entry.t, offset)?,
                height: parse_height(&entry.v)?,
            })
        })
        .collect()
}

/// Parses a high/low response (`interval=hilo`) into extremes.
pub fn parse_extremes(body: &[u8], offset: FixedOffset) -> Result<Vec<TideExtreme>, NoaaError> {
    let entries = decode_envelope(body)?;

    entries
        .iter()
        .map(|entry| {
            let kind = match entry.kind.as_deref() {
                Some("H") => TideType::High,
                Some(_) => TideType::Low,
                None => {
                    return Err(NoaaError::Parse(format!(
                        "extreme at {} missing type marker",
                        entry.t
                    )))
                }
            };
            Ok(TideExtreme {
                kind,
                timestamp: local_to_epoch_ms(&entry.t, offset)?,
                height: parse_height(&entry.v)?,
            })
        })
        .collect()
}

/// Parses the provider's station catalog.
pub fn parse_station_list(body: &[u8]) -> Result<Vec<NoaaStationMetadata>, NoaaError> {
    let response: NoaaStationsResponse = serde_json::from_slice(body)?;
    Ok(response.station_list)
}

/// Decodes the shared prediction envelope, surfacing the in-band error
/// convention before anything else is inspected.
fn decode_envelope(body: &[u8]) -> Result<Vec<NoaaPredictionEntry>, NoaaError> {
    let envelope: NoaaPredictionsResponse = serde_json::from_slice(body)?;

    if let Some(error) = envelope.error {
        return Err(NoaaError::Provider(error.message));
    }

    envelope.predictions.ok_or_else(|| {
        NoaaError::Parse("response contained neither predictions nor an error".to_string())
    })
}

/// Converts a provider-local naive datetime string to epoch milliseconds UTC
fn local_to_epoch_ms(datetime: &str, offset: FixedOffset) -> Result<i64, NoaaError> {
    let naive = NaiveDateTime::parse_from_str(datetime, NOAA_DATETIME_FORMAT)
        .map_err(|_| NoaaError::Parse(format!("invalid datetime {datetime:?}")))?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| NoaaError::Parse(format!("unrepresentable datetime {datetime:?}")))
}

fn parse_height(value: &str) -> Result<f64, NoaaError> {
    value
        .parse()
        .map_err(|_| NoaaError::Parse(format!("invalid height {value:?}")))
}

/// One station entry from the provider's catalog
#[derive(Debug, Clone, Deserialize)]
pub struct NoaaStationMetadata {
    #[serde(rename = "stationId")]
    pub station_id: String,
    pub name: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub lat: f64,
    pub lon: f64,
    /// UTC offset in hours, as a string (e.g. "-8")
    #[serde(rename = "timeZoneCorr")]
    pub time_zone_corr: Option<String>,
    pub level: Option<String>,
    #[serde(rename = "stationType")]
    pub station_type: Option<String>,
}

impl NoaaStationMetadata {
    /// The catalog's hour offset as seconds; stations with a missing or
    /// malformed correction are treated as UTC.
    pub fn time_zone_offset_seconds(&self) -> i32 {
        self.time_zone_corr
            .as_deref()
            .and_then(|hours| hours.parse::<f64>().ok())
            .map(|hours| (hours * 3600.0) as i32)
            .unwrap_or(0)
    }
}

/// Shared envelope for both prediction products
#[derive(Debug, Deserialize)]
struct NoaaPredictionsResponse {
    predictions: Option<Vec<NoaaPredictionEntry>>,
    error: Option<NoaaErrorBody>,
}

#[derive(Debug, Deserialize)]
struct NoaaPredictionEntry {
    /// Station-local naive datetime, "YYYY-MM-DD HH:MM"
    t: String,
    /// Height as a stringified float
    v: String,
    /// "H" or "L", present only in hilo responses
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NoaaErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct NoaaStationsResponse {
    #[serde(rename = "stationList")]
    station_list: Vec<NoaaStationMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pacific() -> FixedOffset {
        FixedOffset::east_opt(-8 * 3600).unwrap()
    }

    const DENSE_RESPONSE: &str = r#"{
        "predictions": [
            {"t": "2024-01-01 00:00", "v": "1.0"},
            {"t": "2024-01-01 00:06", "v": "1.1"},
            {"t": "2024-01-01 00:12", "v": "1.2"}
        ]
    }"#;

    const HILO_RESPONSE: &str = r#"{
        "predictions": [
            {"t": "2024-01-01 00:00", "v": "1.0", "type": "H"},
            {"t": "2024-01-01 06:00", "v": "0.5", "type": "L"}
        ]
    }"#;

    const ERROR_RESPONSE: &str = r#"{
        "error": {
            "message": "No data was found. This product may not be offered at this station."
        }
    }"#;

    #[test]
    fn test_parse_dense_predictions() {
        let predictions =
            parse_predictions(DENSE_RESPONSE.as_bytes(), pacific()).expect("should parse");

        assert_eq!(predictions.len(), 3);
        // 2024-01-01 00:00 at UTC-8 is 2024-01-01T08:00:00Z
        assert_eq!(predictions[0].timestamp, 1_704_096_000_000);
        assert!((predictions[0].height - 1.0).abs() < 1e-9);
        // Samples are six minutes apart
        assert_eq!(predictions[1].timestamp - predictions[0].timestamp, 360_000);
    }

    #[test]
    fn test_parse_extremes_maps_types() {
        let extremes = parse_extremes(HILO_RESPONSE.as_bytes(), pacific()).expect("should parse");

        assert_eq!(extremes.len(), 2);
        assert_eq!(extremes[0].kind, TideType::High);
        assert_eq!(extremes[1].kind, TideType::Low);
        assert_eq!(
            extremes[1].timestamp - extremes[0].timestamp,
            6 * 3600 * 1000
        );
    }

    #[test]
    fn test_offset_changes_epoch_timestamp() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let predictions =
            parse_predictions(DENSE_RESPONSE.as_bytes(), utc).expect("should parse");

        // Same wall-clock text, eight hours earlier than the Pacific reading
        assert_eq!(predictions[0].timestamp, 1_704_067_200_000);
    }

    #[test]
    fn test_embedded_error_surfaces_verbatim() {
        let err = parse_extremes(ERROR_RESPONSE.as_bytes(), pacific()).unwrap_err();

        match err {
            NoaaError::Provider(message) => {
                assert!(message.contains("No data was found"));
                assert!(message.contains("product may not be offered"));
            }
            other => panic!("Expected Provider error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_day_is_not_an_error() {
        let predictions =
            parse_predictions(br#"{"predictions": []}"#, pacific()).expect("should parse");
        assert!(predictions.is_empty());
    }

    #[test]
    fn test_missing_both_fields_is_parse_error() {
        let err = parse_predictions(b"{}", pacific()).unwrap_err();
        assert!(matches!(err, NoaaError::Parse(_)));
    }

    #[test]
    fn test_invalid_height_is_parse_error() {
        let body = br#"{"predictions": [{"t": "2024-01-01 00:00", "v": "not-a-number"}]}"#;
        let err = parse_predictions(body, pacific()).unwrap_err();
        assert!(err.to_string().contains("not-a-number"));
    }

    #[test]
    fn test_extreme_without_type_is_parse_error() {
        let body = br#"{"predictions": [{"t": "2024-01-01 00:00", "v": "1.0"}]}"#;
        let err = parse_extremes(body, pacific()).unwrap_err();
        assert!(matches!(err, NoaaError::Parse(_)));
    }

    #[test]
    fn test_parse_station_list() {
        let body = br#"{
            "stationList": [{
                "stationId": "9447130",
                "name": "Seattle",
                "state": "WA",
                "region": "Puget Sound",
                "lat": 47.602638889,
                "lon": -122.339167,
                "timeZoneCorr": "-8",
                "level": "R",
                "stationType": "R"
            }]
        }"#;

        let stations = parse_station_list(body).expect("should parse");
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].station_id, "9447130");
        assert_eq!(stations[0].time_zone_offset_seconds(), -28800);
    }

    #[test]
    fn test_station_missing_offset_defaults_to_utc() {
        let body = br#"{
            "stationList": [{
                "stationId": "X1",
                "name": "Nowhere",
                "lat": 0.0,
                "lon": 0.0
            }]
        }"#;

        let stations = parse_station_list(body).expect("should parse");
        assert_eq!(stations[0].time_zone_offset_seconds(), 0);
    }
}
