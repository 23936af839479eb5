//! Tide prediction engine
//!
//! Orchestrates a tide query end to end: resolve the station, normalize the
//! requested range into station-local calendar days, serve each day from the
//! prediction cache or fetch it from the provider, then interpolate the
//! requested instant and classify the current trend.
//!
//! All calendar arithmetic uses the station's fixed UTC offset. The provider
//! reports per-station local times as fixed offsets, so IANA zone rules (and
//! DST in particular) must not be substituted here.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use futures::future::try_join_all;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::cache::{PredictionCache, WriteTracker};
use crate::data::noaa::{self, NoaaError};
use crate::data::{
    ExtendedTideResponse, Station, TideExtreme, TidePrediction, TidePredictionRecord, TideTrend,
    TideType,
};
use crate::http::{HttpClient, HttpError};
use crate::station::{StationDirectory, StationError};

/// Provider endpoint for prediction products
const DATAGETTER_PATH: &str = "/api/prod/datagetter";

/// Format accepted for request start/end bounds (station-local, no zone)
const REQUEST_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Longest allowed request span
const MAX_RANGE_DAYS: i64 = 30;

/// Lookback used for trend classification: one provider sample interval
const TREND_LOOKBACK_MS: i64 = 6 * 60 * 1000;

/// How long a freshly fetched day record stays valid in the cache
const RECORD_TTL_MS: i64 = 24 * 3600 * 1000;

/// Station-local hour from which a bare "now" query also fetches tomorrow,
/// so late-evening trend evaluation has data on both sides of midnight.
const TOMORROW_FETCH_CUTOFF_HOUR: u32 = 18;

/// Errors surfaced by tide queries
///
/// The variants are deliberately distinct so transports can map them to
/// different status codes: bad input, oversized range, unknown station, and
/// upstream failure (which preserves the provider's message verbatim).
#[derive(Debug, Error)]
pub enum TideError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("station not found: {0}")]
    StationNotFound(String),

    #[error("upstream provider error: {0}")]
    Upstream(String),
}

impl From<HttpError> for TideError {
    fn from(err: HttpError) -> Self {
        TideError::Upstream(err.to_string())
    }
}

impl From<NoaaError> for TideError {
    fn from(err: NoaaError) -> Self {
        TideError::Upstream(err.to_string())
    }
}

impl From<StationError> for TideError {
    fn from(err: StationError) -> Self {
        match err {
            StationError::NotFound(id) => TideError::StationNotFound(id),
            StationError::Upstream(message) => TideError::Upstream(message),
        }
    }
}

/// The tide prediction service
///
/// Holds its collaborators as owned handles; construction cannot succeed
/// without all of them, so there is no deferred "dependency missing"
/// failure mode. One instance serves concurrent requests; the only shared
/// mutable state is the prediction cache, which synchronizes internally.
pub struct TideService {
    http: Arc<HttpClient>,
    stations: Arc<dyn StationDirectory>,
    cache: Arc<dyn PredictionCache>,
    write_tracker: WriteTracker,
}

impl TideService {
    pub fn new(
        http: Arc<HttpClient>,
        stations: Arc<dyn StationDirectory>,
        cache: Arc<dyn PredictionCache>,
    ) -> Self {
        Self {
            http,
            stations,
            cache,
            write_tracker: WriteTracker::new(),
        }
    }

    /// Answers a tide query for the station nearest to the given coordinates.
    pub async fn get_current_tide(
        &self,
        latitude: f64,
        longitude: f64,
        start_time: Option<&str>,
        end_time: Option<&str>,
    ) -> Result<ExtendedTideResponse, TideError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(TideError::InvalidParameter(format!(
                "invalid latitude: {latitude}"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(TideError::InvalidParameter(format!(
                "invalid longitude: {longitude}"
            )));
        }

        let stations = self.stations.find_nearest_stations(latitude, longitude, 1).await?;
        let station = stations.into_iter().next().ok_or_else(|| {
            TideError::StationNotFound(format!("no stations near ({latitude}, {longitude})"))
        })?;

        self.tide_for_station(&station, start_time, end_time).await
    }

    /// Answers a tide query for a station resolved by identifier.
    pub async fn get_current_tide_for_station(
        &self,
        station_id: &str,
        start_time: Option<&str>,
        end_time: Option<&str>,
    ) -> Result<ExtendedTideResponse, TideError> {
        let station = self.stations.find_station(station_id).await?;
        self.tide_for_station(&station, start_time, end_time).await
    }

    /// Blocks until every background cache write spawned by this service has
    /// settled. Used by tests and by graceful shutdown.
    pub async fn wait_for_cache_writes(&self) {
        self.write_tracker.wait_idle().await;
    }

    async fn tide_for_station(
        &self,
        station: &Station,
        start_time: Option<&str>,
        end_time: Option<&str>,
    ) -> Result<ExtendedTideResponse, TideError> {
        let offset = station_offset(station);
        let now_utc = Utc::now();
        let now_local = now_utc.with_timezone(&offset);

        let start_local = match start_time {
            Some(text) => parse_request_datetime(text, offset)
                .ok_or_else(|| TideError::InvalidParameter(format!("parsing start time {text:?}")))?,
            None => now_local,
        };
        let end_local = match end_time {
            Some(text) => parse_request_datetime(text, offset)
                .ok_or_else(|| TideError::InvalidParameter(format!("parsing end time {text:?}")))?,
            None => match start_time {
                Some(_) => start_local,
                None => default_window_end(now_local),
            },
        };

        if end_local < start_local {
            return Err(TideError::InvalidRange("end time precedes start time".to_string()));
        }
        if end_local - start_local > Duration::days(MAX_RANGE_DAYS) {
            return Err(TideError::InvalidRange(format!(
                "date range cannot exceed {MAX_RANGE_DAYS} days"
            )));
        }

        let days = local_days(start_local.date_naive(), end_local.date_naive());
        debug!(
            station = %station.id,
            start = %start_local,
            end = %end_local,
            days = days.len(),
            "resolving tide query"
        );

        // Cache pass first, then one concurrent fetch per missing day. The
        // response waits on the fetches but not on the cache write-back.
        let mut records = Vec::with_capacity(days.len());
        let mut missing = Vec::new();
        for day in days {
            match self.cache.get_predictions(&station.id, day).await {
                Some(record) => records.push(record),
                None => missing.push(day),
            }
        }

        let fetched = try_join_all(
            missing
                .iter()
                .map(|day| self.fetch_day(station, *day, offset)),
        )
        .await?;
        records.extend(fetched.iter().cloned());

        let mut predictions: Vec<TidePrediction> = Vec::new();
        let mut extremes: Vec<TideExtreme> = Vec::new();
        for record in &records {
            predictions.extend(record.predictions.iter().copied());
            extremes.extend(record.extremes.iter().copied());
        }
        predictions.sort_by_key(|p| p.timestamp);
        extremes.sort_by_key(|e| e.timestamp);

        let now_ms = now_utc.timestamp_millis();
        let predicted_level = interpolate_predictions(&predictions, now_ms)
            .or_else(|| interpolate_extremes(&extremes, now_ms));
        if predicted_level.is_none() {
            return Err(TideError::Upstream(
                "no prediction data available for the requested range".to_string(),
            ));
        }

        let tide_trend = determine_trend(&predictions, &extremes, now_ms);

        let response = ExtendedTideResponse {
            timestamp: now_ms,
            local_time: now_local.format(REQUEST_DATETIME_FORMAT).to_string(),
            water_level: predicted_level,
            predicted_level,
            nearest_station: station.id.clone(),
            location: station.name.clone(),
            latitude: station.latitude,
            longitude: station.longitude,
            station_distance: station.distance,
            tide_trend,
            calculation_method: "NOAA API".to_string(),
            extremes,
            predictions,
            time_zone_offset_seconds: Some(station.time_zone_offset),
        };

        if !fetched.is_empty() {
            self.spawn_cache_write(fetched);
        }

        Ok(response)
    }

    /// Fetches one station-local calendar day from the provider.
    ///
    /// Reference stations get the dense series and the extremes in parallel;
    /// subordinate stations only offer extremes.
    async fn fetch_day(
        &self,
        station: &Station,
        date: NaiveDate,
        offset: FixedOffset,
    ) -> Result<TidePredictionRecord, TideError> {
        let date_str = date.format("%Y%m%d").to_string();

        let (predictions, extremes) = if station.is_subordinate() {
            let extremes = self.fetch_product(station, &date_str, "hilo").await?;
            (Vec::new(), noaa::parse_extremes(&extremes, offset)?)
        } else {
            let (predictions, extremes) = tokio::try_join!(
                self.fetch_product(station, &date_str, "6"),
                self.fetch_product(station, &date_str, "hilo"),
            )?;
            (
                noaa::parse_predictions(&predictions, offset)?,
                noaa::parse_extremes(&extremes, offset)?,
            )
        };

        let now_ms = Utc::now().timestamp_millis();
        Ok(TidePredictionRecord {
            station_id: station.id.clone(),
            date: date.format("%Y-%m-%d").to_string(),
            station_type: station.station_type.clone().unwrap_or_else(|| "R".to_string()),
            predictions,
            extremes,
            last_updated: now_ms,
            ttl: now_ms + RECORD_TTL_MS,
        })
    }

    /// Issues one prediction-product request and returns the raw body.
    async fn fetch_product(
        &self,
        station: &Station,
        date_str: &str,
        interval: &str,
    ) -> Result<Vec<u8>, TideError> {
        let path = format!(
            "{DATAGETTER_PATH}?station={}&begin_date={date_str}&end_date={date_str}\
             &product=predictions&datum=MLLW&units=english&time_zone=lst&format=json\
             &interval={interval}",
            station.id
        );

        debug!(station = %station.id, date = date_str, interval, "fetching from provider");
        let response = self.http.get(&path).await?;
        if !response.is_success() {
            return Err(TideError::Upstream(format!(
                "tide predictions request failed with status {}",
                response.status
            )));
        }
        Ok(response.body)
    }

    /// Writes freshly fetched records back to the cache off the response
    /// path. The write is issued exactly once per missed day; failures are
    /// logged and never affect the response.
    fn spawn_cache_write(&self, records: Vec<TidePredictionRecord>) {
        let guard = self.write_tracker.begin();
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            let count = records.len();
            if let Err(err) = cache.save_predictions_batch(records).await {
                error!(error = %err, count, "failed to persist fetched tide predictions");
            } else {
                debug!(count, "persisted fetched tide predictions");
            }
            drop(guard);
        });
    }
}

/// The station's fixed offset as a chrono zone; out-of-range offsets fall
/// back to UTC rather than failing the request.
fn station_offset(station: &Station) -> FixedOffset {
    match FixedOffset::east_opt(station.time_zone_offset) {
        Some(offset) => offset,
        None => {
            warn!(
                station = %station.id,
                offset = station.time_zone_offset,
                "station UTC offset out of range, using UTC"
            );
            FixedOffset::east_opt(0).expect("zero offset is valid")
        }
    }
}

/// Parses a request bound (`YYYY-MM-DDThh:mm:ss`, no zone suffix) as a
/// station-local instant.
fn parse_request_datetime(text: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(text, REQUEST_DATETIME_FORMAT).ok()?;
    offset.from_local_datetime(&naive).single()
}

/// End of the default window for a bare "now" query: tonight, or tomorrow
/// night once the local evening passes the cutoff hour.
fn default_window_end(now_local: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    if now_local.hour() >= TOMORROW_FETCH_CUTOFF_HOUR {
        now_local + Duration::days(1)
    } else {
        now_local
    }
}

/// Whole station-local calendar days spanning the request, inclusive.
fn local_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        days.push(day);
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

/// Water level at `timestamp` by linear interpolation over an ascending
/// dense prediction series. Instants at or before the first sample clamp to
/// the first height; at or after the last sample, to the last height.
/// Returns `None` only for an empty series.
pub fn interpolate_predictions(predictions: &[TidePrediction], timestamp: i64) -> Option<f64> {
    interpolate_series(predictions, timestamp, |p| (p.timestamp, p.height))
}

/// Water level at `timestamp` by linear interpolation between the two
/// bracketing high/low events, with the same edge-clamping rule as
/// [`interpolate_predictions`].
pub fn interpolate_extremes(extremes: &[TideExtreme], timestamp: i64) -> Option<f64> {
    interpolate_series(extremes, timestamp, |e| (e.timestamp, e.height))
}

fn interpolate_series<T>(
    series: &[T],
    timestamp: i64,
    point: impl Fn(&T) -> (i64, f64),
) -> Option<f64> {
    let (first_t, first_h) = point(series.first()?);
    let (last_t, last_h) = point(series.last()?);

    if timestamp <= first_t {
        return Some(first_h);
    }
    if timestamp >= last_t {
        return Some(last_h);
    }

    let idx = series.partition_point(|entry| point(entry).0 <= timestamp);
    let (t0, h0) = point(&series[idx - 1]);
    let (t1, h1) = point(&series[idx]);
    if t0 == timestamp {
        return Some(h0);
    }

    let ratio = (timestamp - t0) as f64 / (t1 - t0) as f64;
    Some(h0 + (h1 - h0) * ratio)
}

/// Classifies the tide direction at `timestamp`.
///
/// With a dense series, compares the interpolated height against the height
/// one sample interval earlier; both instants must lie within the series, so
/// an evaluation too near the data's edge yields `None` rather than a guess.
/// With only extremes (subordinate stations), the bracketing pair decides:
/// heading toward a high means rising.
fn determine_trend(
    predictions: &[TidePrediction],
    extremes: &[TideExtreme],
    timestamp: i64,
) -> Option<TideTrend> {
    if predictions.len() >= 2 {
        let first = predictions.first()?.timestamp;
        let last = predictions.last()?.timestamp;
        let lookback = timestamp - TREND_LOOKBACK_MS;
        if lookback < first || timestamp > last {
            return None;
        }

        let now_height = interpolate_predictions(predictions, timestamp)?;
        let then_height = interpolate_predictions(predictions, lookback)?;
        if now_height > then_height {
            Some(TideTrend::Rising)
        } else if now_height < then_height {
            Some(TideTrend::Falling)
        } else {
            None
        }
    } else {
        // Need an event on each side of the instant to know the direction
        if !extremes.iter().any(|e| e.timestamp <= timestamp) {
            return None;
        }
        let next = extremes.iter().find(|e| e.timestamp > timestamp)?;
        match next.kind {
            TideType::High => Some(TideTrend::Rising),
            TideType::Low => Some(TideTrend::Falling),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;
    use crate::data::{StationCapability, StationSource};
    use crate::http::HttpOptions;
    use async_trait::async_trait;

    fn pred(timestamp: i64, height: f64) -> TidePrediction {
        TidePrediction { timestamp, height }
    }

    fn ext(kind: TideType, timestamp: i64, height: f64) -> TideExtreme {
        TideExtreme {
            kind,
            timestamp,
            height,
        }
    }

    fn test_station(time_zone_offset: i32) -> Station {
        Station {
            id: "TEST001".to_string(),
            name: Some("Test Station".to_string()),
            state: None,
            region: None,
            distance: None,
            latitude: 47.6062,
            longitude: -122.3321,
            source: StationSource::Noaa,
            capabilities: vec![StationCapability::WaterLevel],
            time_zone_offset,
            level: None,
            station_type: Some("R".to_string()),
        }
    }

    struct StubDirectory {
        station: Station,
    }

    #[async_trait]
    impl StationDirectory for StubDirectory {
        async fn find_station(&self, station_id: &str) -> Result<Station, StationError> {
            if station_id == self.station.id {
                Ok(self.station.clone())
            } else {
                Err(StationError::NotFound(station_id.to_string()))
            }
        }

        async fn find_nearest_stations(
            &self,
            _latitude: f64,
            _longitude: f64,
            _limit: usize,
        ) -> Result<Vec<Station>, StationError> {
            Ok(vec![self.station.clone()])
        }
    }

    /// Cache that always misses and discards writes
    struct NullCache;

    #[async_trait]
    impl PredictionCache for NullCache {
        async fn get_predictions(
            &self,
            _station_id: &str,
            _date: NaiveDate,
        ) -> Option<TidePredictionRecord> {
            None
        }

        async fn save_predictions_batch(
            &self,
            _records: Vec<TidePredictionRecord>,
        ) -> Result<(), CacheError> {
            Ok(())
        }
    }

    fn service_with_station(station: Station) -> TideService {
        let http = Arc::new(HttpClient::new(HttpOptions::default()).with_fetch_override(
            Box::new(|_url| {
                Box::pin(async {
                    Ok(crate::http::HttpResponse {
                        status: 200,
                        body: br#"{"predictions": []}"#.to_vec(),
                    })
                })
            }),
        ));
        TideService::new(http, Arc::new(StubDirectory { station }), Arc::new(NullCache))
    }

    #[tokio::test]
    async fn test_invalid_latitude_rejected() {
        let service = service_with_station(test_station(-28800));

        for bad_latitude in [91.0, -91.0] {
            let err = service
                .get_current_tide(bad_latitude, 0.0, None, None)
                .await
                .unwrap_err();
            assert!(matches!(err, TideError::InvalidParameter(_)));
            assert!(err.to_string().contains("invalid latitude"));
        }
    }

    #[tokio::test]
    async fn test_invalid_longitude_rejected() {
        let service = service_with_station(test_station(-28800));

        for bad_longitude in [181.0, -181.0] {
            let err = service
                .get_current_tide(0.0, bad_longitude, None, None)
                .await
                .unwrap_err();
            assert!(matches!(err, TideError::InvalidParameter(_)));
            assert!(err.to_string().contains("invalid longitude"));
        }
    }

    #[tokio::test]
    async fn test_unknown_station_is_not_found() {
        let service = service_with_station(test_station(-28800));

        let err = service
            .get_current_tide_for_station("NOPE", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TideError::StationNotFound(_)));
    }

    #[tokio::test]
    async fn test_range_longer_than_30_days_rejected() {
        let service = service_with_station(test_station(-28800));

        let now = Utc::now();
        let start = now.format(REQUEST_DATETIME_FORMAT).to_string();
        let end = (now + Duration::days(31)).format(REQUEST_DATETIME_FORMAT).to_string();

        let err = service
            .get_current_tide_for_station("TEST001", Some(&start), Some(&end))
            .await
            .unwrap_err();
        assert!(matches!(err, TideError::InvalidRange(_)));
        assert!(err.to_string().contains("date range cannot exceed 30 days"));
    }

    #[tokio::test]
    async fn test_malformed_bounds_name_the_failing_field() {
        let service = service_with_station(test_station(-28800));
        let now = Utc::now().format(REQUEST_DATETIME_FORMAT).to_string();

        let err = service
            .get_current_tide_for_station("TEST001", Some("invalid"), Some(&now))
            .await
            .unwrap_err();
        assert!(matches!(err, TideError::InvalidParameter(_)));
        assert!(err.to_string().contains("parsing start time"));

        let err = service
            .get_current_tide_for_station("TEST001", Some(&now), Some("invalid"))
            .await
            .unwrap_err();
        assert!(matches!(err, TideError::InvalidParameter(_)));
        assert!(err.to_string().contains("parsing end time"));
    }

    #[tokio::test]
    async fn test_end_before_start_rejected() {
        let service = service_with_station(test_station(-28800));

        let now = Utc::now();
        let start = now.format(REQUEST_DATETIME_FORMAT).to_string();
        let end = (now - Duration::days(1)).format(REQUEST_DATETIME_FORMAT).to_string();

        let err = service
            .get_current_tide_for_station("TEST001", Some(&start), Some(&end))
            .await
            .unwrap_err();
        assert!(matches!(err, TideError::InvalidRange(_)));
    }

    #[test]
    fn test_interpolation_exact_match() {
        let predictions = vec![pred(1000, 2.0), pred(2000, 3.0)];
        let level = interpolate_predictions(&predictions, 1000).unwrap();
        assert!((level - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_interpolation_midpoint() {
        let predictions = vec![pred(1000, 2.0), pred(2000, 4.0)];
        let level = interpolate_predictions(&predictions, 1500).unwrap();
        assert!((level - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_interpolation_clamps_before_first() {
        let predictions = vec![pred(1000, 2.0), pred(2000, 3.0)];
        let level = interpolate_predictions(&predictions, 500).unwrap();
        assert!((level - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_interpolation_clamps_after_last() {
        let predictions = vec![pred(1000, 2.0), pred(2000, 3.0)];
        let level = interpolate_predictions(&predictions, 2500).unwrap();
        assert!((level - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_interpolation_empty_is_none() {
        assert!(interpolate_predictions(&[], 1000).is_none());
        assert!(interpolate_extremes(&[], 1000).is_none());
    }

    #[test]
    fn test_extremes_interpolation_between_high_and_low() {
        let now = Utc::now().timestamp_millis();
        let six_hours = 6 * 3600 * 1000;
        let extremes = vec![
            ext(TideType::High, now, 10.0),
            ext(TideType::Low, now + six_hours, 2.0),
        ];

        let level = interpolate_extremes(&extremes, now + six_hours / 2).unwrap();
        assert!((level - 6.0).abs() < 0.5);
    }

    #[test]
    fn test_extremes_interpolation_clamps_at_edges() {
        let now = Utc::now().timestamp_millis();
        let extremes = vec![ext(TideType::High, now, 10.0)];

        let before = interpolate_extremes(&extremes, now - 3_600_000).unwrap();
        assert!((before - 10.0).abs() < 1e-3);

        let after = interpolate_extremes(&extremes, now + 3_600_000).unwrap();
        assert!((after - 10.0).abs() < 1e-3);

        let exact = interpolate_extremes(&extremes, now).unwrap();
        assert!((exact - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_trend_rising_then_falling() {
        let now = Utc::now().timestamp_millis();
        let hour = 3600 * 1000;
        let mut predictions = vec![
            pred(now - hour, 1.0),
            pred(now, 2.0),
            pred(now + hour, 3.0),
        ];

        assert_eq!(
            determine_trend(&predictions, &[], now),
            Some(TideTrend::Rising)
        );

        predictions[1].height = 0.5;
        assert_eq!(
            determine_trend(&predictions, &[], now),
            Some(TideTrend::Falling)
        );
    }

    #[test]
    fn test_trend_omitted_near_data_edge() {
        let now = Utc::now().timestamp_millis();
        let hour = 3600 * 1000;
        let predictions = vec![pred(now - 2 * hour, 1.0), pred(now - hour, 2.0)];

        // "now" is past the last sample, so no trend can be claimed
        assert_eq!(determine_trend(&predictions, &[], now), None);

        // Equally, a lookback falling before the first sample gives nothing
        let late_start = vec![pred(now - 60_000, 1.0), pred(now + hour, 2.0)];
        assert_eq!(determine_trend(&late_start, &[], now), None);
    }

    #[test]
    fn test_trend_flat_curve_is_undetermined() {
        let now = Utc::now().timestamp_millis();
        let hour = 3600 * 1000;
        let predictions = vec![pred(now - hour, 2.0), pred(now + hour, 2.0)];

        assert_eq!(determine_trend(&predictions, &[], now), None);
    }

    #[test]
    fn test_trend_from_extremes_for_subordinate_stations() {
        let now = Utc::now().timestamp_millis();
        let hour = 3600 * 1000;
        let extremes = vec![
            ext(TideType::Low, now - 3 * hour, 0.5),
            ext(TideType::High, now + 3 * hour, 3.0),
        ];

        assert_eq!(
            determine_trend(&[], &extremes, now),
            Some(TideTrend::Rising)
        );

        // Before the first event there is no bracketing pair
        assert_eq!(determine_trend(&[], &extremes, now - 4 * hour), None);
    }

    #[test]
    fn test_local_days_inclusive_and_across_month_boundary() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap();

        let days = local_days(start, end);
        assert_eq!(days.len(), 4);
        assert_eq!(days[0], start);
        assert_eq!(days[3], end);

        let single = local_days(start, start);
        assert_eq!(single, vec![start]);
    }

    #[test]
    fn test_default_window_extends_past_cutoff() {
        let offset = FixedOffset::east_opt(-8 * 3600).unwrap();

        let early = offset.with_ymd_and_hms(2025, 1, 28, 11, 0, 0).unwrap();
        assert_eq!(default_window_end(early).date_naive(), early.date_naive());

        let late = offset.with_ymd_and_hms(2025, 1, 28, 18, 0, 0).unwrap();
        assert_eq!(
            default_window_end(late).date_naive(),
            early.date_naive().succ_opt().unwrap()
        );
    }

    #[test]
    fn test_parse_request_datetime() {
        let offset = FixedOffset::east_opt(-8 * 3600).unwrap();

        let parsed = parse_request_datetime("2025-01-28T15:04:05", offset).unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), -8 * 3600);
        assert_eq!(parsed.format(REQUEST_DATETIME_FORMAT).to_string(), "2025-01-28T15:04:05");

        assert!(parse_request_datetime("invalid", offset).is_none());
        assert!(parse_request_datetime("2025-01-28 15:04:05", offset).is_none());
    }

    #[test]
    fn test_station_offset_out_of_range_falls_back_to_utc() {
        let mut station = test_station(999_999);
        let offset = station_offset(&station);
        assert_eq!(offset.local_minus_utc(), 0);

        station.time_zone_offset = -28800;
        assert_eq!(station_offset(&station).local_minus_utc(), -28800);
    }
}
