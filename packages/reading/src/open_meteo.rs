//! Open-Meteo air quality API client.
//!
//! One endpoint serves both modes:
//!
//! - **current**: `current=<fields>&hourly=<fields>&forecast_days=1`
//! - **historical**: `hourly=<fields>&start_date=D&end_date=D` for a single
//!   calendar date, answered from the CAMS reanalysis archive.
//!
//! Values are taken per field: the instantaneous `current` value when the
//! payload has one, otherwise the hourly series (first hour for
//! historical requests, last hour for current requests).
//!
//! See <https://open-meteo.com/en/docs/air-quality-api>

use std::time::Duration;

use air_compare_reading_models::{Coordinates, FetchMode, Pollutant, Reading};
use async_trait::async_trait;
use serde::Deserialize;

use crate::{ReadingError, ReadingSource, provenance, retry};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenMeteoConfig {
    /// Air quality endpoint URL.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries for transient failures.
    pub max_retries: u32,
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 20,
            max_retries: 2,
        }
    }
}

impl OpenMeteoConfig {
    /// Reads `AIR_QUALITY_API_URL`, `AIR_QUALITY_TIMEOUT_SECS`, and
    /// `AIR_QUALITY_MAX_RETRIES`, falling back to defaults for anything
    /// unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("AIR_QUALITY_API_URL").unwrap_or(defaults.base_url),
            timeout_secs: std::env::var("AIR_QUALITY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            max_retries: std::env::var("AIR_QUALITY_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
        }
    }
}

/// Open-Meteo air quality response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AirQualityResponse {
    /// Instantaneous values (current mode only).
    #[serde(default)]
    pub current: Option<CurrentValues>,
    /// Hourly time series.
    #[serde(default)]
    pub hourly: Option<HourlyValues>,
    /// Explicit provenance annotation, when the upstream supplies one.
    #[serde(default)]
    pub data_source: Option<String>,
}

/// The `current` block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentValues {
    /// Timestamp of the values (ISO 8601, local time).
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pm10: Option<f64>,
    #[serde(default)]
    pm2_5: Option<f64>,
    #[serde(default)]
    carbon_monoxide: Option<f64>,
    #[serde(default)]
    nitrogen_dioxide: Option<f64>,
    #[serde(default)]
    ozone: Option<f64>,
    #[serde(default)]
    sulphur_dioxide: Option<f64>,
    #[serde(default)]
    european_aqi: Option<f64>,
    #[serde(default)]
    us_aqi: Option<f64>,
}

impl CurrentValues {
    /// The instantaneous value for `pollutant`.
    #[must_use]
    pub const fn value(&self, pollutant: Pollutant) -> Option<f64> {
        match pollutant {
            Pollutant::Pm10 => self.pm10,
            Pollutant::Pm25 => self.pm2_5,
            Pollutant::CarbonMonoxide => self.carbon_monoxide,
            Pollutant::NitrogenDioxide => self.nitrogen_dioxide,
            Pollutant::Ozone => self.ozone,
            Pollutant::SulphurDioxide => self.sulphur_dioxide,
            Pollutant::EuropeanAqi => self.european_aqi,
            Pollutant::UsAqi => self.us_aqi,
        }
    }
}

/// The `hourly` block. Individual hours may be `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlyValues {
    /// Hour timestamps (ISO 8601, local time).
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pm10: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pm2_5: Option<Vec<Option<f64>>>,
    #[serde(default)]
    carbon_monoxide: Option<Vec<Option<f64>>>,
    #[serde(default)]
    nitrogen_dioxide: Option<Vec<Option<f64>>>,
    #[serde(default)]
    ozone: Option<Vec<Option<f64>>>,
    #[serde(default)]
    sulphur_dioxide: Option<Vec<Option<f64>>>,
    #[serde(default)]
    european_aqi: Option<Vec<Option<f64>>>,
    #[serde(default)]
    us_aqi: Option<Vec<Option<f64>>>,
}

impl HourlyValues {
    /// The hourly series for `pollutant`, if the payload has one.
    #[must_use]
    pub fn series(&self, pollutant: Pollutant) -> Option<&[Option<f64>]> {
        match pollutant {
            Pollutant::Pm10 => self.pm10.as_deref(),
            Pollutant::Pm25 => self.pm2_5.as_deref(),
            Pollutant::CarbonMonoxide => self.carbon_monoxide.as_deref(),
            Pollutant::NitrogenDioxide => self.nitrogen_dioxide.as_deref(),
            Pollutant::Ozone => self.ozone.as_deref(),
            Pollutant::SulphurDioxide => self.sulphur_dioxide.as_deref(),
            Pollutant::EuropeanAqi => self.european_aqi.as_deref(),
            Pollutant::UsAqi => self.us_aqi.as_deref(),
        }
    }

    fn has_any_series(&self) -> bool {
        Pollutant::ALL
            .iter()
            .any(|p| self.series(*p).is_some_and(|s| !s.is_empty()))
    }
}

impl AirQualityResponse {
    /// `true` when the payload has a `current` block or at least one
    /// non-empty hourly series.
    #[must_use]
    pub fn has_usable_data(&self) -> bool {
        self.current.is_some() || self.hourly.as_ref().is_some_and(HourlyValues::has_any_series)
    }

    /// Picks the value for one field according to the fetch mode.
    fn pick(&self, pollutant: Pollutant, mode: FetchMode) -> Option<f64> {
        self.current
            .as_ref()
            .and_then(|c| c.value(pollutant))
            .or_else(|| {
                let series = self.hourly.as_ref()?.series(pollutant)?;
                let slot = match mode {
                    FetchMode::Historical { .. } => series.first(),
                    FetchMode::Current => series.last(),
                };
                slot.copied().flatten()
            })
            .filter(|v| v.is_finite())
    }
}

/// Converts an upstream payload into a [`Reading`].
///
/// # Errors
///
/// Returns [`ReadingError::NoData`] if `mode` is current and the payload
/// has no usable data. Historical payloads without data produce an
/// all-null reading instead.
pub fn extract_reading(
    response: &AirQualityResponse,
    mode: FetchMode,
    coordinates: Coordinates,
) -> Result<Reading, ReadingError> {
    let data_source = provenance::infer_data_source(response.data_source.as_deref(), coordinates);

    if !response.has_usable_data() {
        return match mode {
            FetchMode::Current => Err(ReadingError::NoData {
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
            }),
            FetchMode::Historical { date } => {
                log::debug!(
                    "No historical data at ({}, {}) for {date}",
                    coordinates.latitude,
                    coordinates.longitude
                );
                Ok(Reading::empty(data_source))
            }
        };
    }

    let mut reading = Reading::empty(data_source);
    for pollutant in Pollutant::ALL {
        reading.set(*pollutant, response.pick(*pollutant, mode));
    }
    Ok(reading)
}

/// Builds the query string parameters for a request.
#[must_use]
pub fn query_params(coordinates: Coordinates, mode: FetchMode) -> Vec<(&'static str, String)> {
    let fields = Pollutant::ALL
        .iter()
        .map(|p| p.api_field())
        .collect::<Vec<_>>()
        .join(",");

    let mut params = vec![
        ("latitude", format!("{:.4}", coordinates.latitude)),
        ("longitude", format!("{:.4}", coordinates.longitude)),
        ("hourly", fields.clone()),
        ("timezone", "auto".to_string()),
    ];

    match mode {
        FetchMode::Current => {
            params.push(("current", fields));
            params.push(("forecast_days", "1".to_string()));
        }
        FetchMode::Historical { date } => {
            let day = date.format("%Y-%m-%d").to_string();
            params.push(("start_date", day.clone()));
            params.push(("end_date", day));
        }
    }

    params
}

/// Open-Meteo backed [`ReadingSource`].
pub struct OpenMeteoClient {
    client: reqwest::Client,
    config: OpenMeteoConfig,
}

impl OpenMeteoClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`ReadingError::Http`] if the HTTP client cannot be built.
    pub fn new(config: OpenMeteoConfig) -> Result<Self, ReadingError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a client configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ReadingError::Http`] if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, ReadingError> {
        Self::new(OpenMeteoConfig::from_env())
    }
}

#[async_trait]
impl ReadingSource for OpenMeteoClient {
    async fn fetch(
        &self,
        coordinates: Coordinates,
        mode: FetchMode,
    ) -> Result<Reading, ReadingError> {
        let params = query_params(coordinates, mode);
        log::debug!(
            "Fetching {mode} air quality for ({}, {})",
            coordinates.latitude,
            coordinates.longitude
        );

        let body = retry::send_json(
            || self.client.get(&self.config.base_url).query(&params),
            self.config.max_retries,
        )
        .await?;

        let response: AirQualityResponse = serde_json::from_value(body)?;
        extract_reading(&response, mode, coordinates)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::provenance::{EUROPE_SOURCE, NORTH_AMERICA_SOURCE};

    const NEW_YORK: Coordinates = Coordinates::new(40.7128, -74.0060);
    const BERLIN: Coordinates = Coordinates::new(52.52, 13.405);

    fn historical() -> FetchMode {
        FetchMode::Historical {
            date: NaiveDate::from_ymd_opt(2016, 10, 16).unwrap(),
        }
    }

    fn parse(body: &serde_json::Value) -> AirQualityResponse {
        serde_json::from_value(body.clone()).unwrap()
    }

    #[test]
    fn current_values_are_preferred_over_hourly() {
        let body = serde_json::json!({
            "current": { "time": "2026-10-16T14:00", "pm2_5": 35.0, "us_aqi": 80 },
            "hourly": {
                "time": ["2026-10-16T00:00", "2026-10-16T01:00"],
                "pm2_5": [10.0, 11.0],
                "us_aqi": [40, 41],
                "pm10": [20.0, 22.5]
            }
        });
        let reading = extract_reading(&parse(&body), FetchMode::Current, NEW_YORK).unwrap();
        assert_eq!(reading.pm25, Some(35.0));
        assert_eq!(reading.us_aqi, Some(80.0));
        // No current pm10, so the last hourly value is used.
        assert_eq!(reading.pm10, Some(22.5));
        assert_eq!(reading.ozone, None);
        assert_eq!(reading.data_source, NORTH_AMERICA_SOURCE);
    }

    #[test]
    fn historical_uses_first_hour() {
        let body = serde_json::json!({
            "hourly": {
                "time": ["2016-10-16T00:00", "2016-10-16T01:00"],
                "pm2_5": [12.0, 18.0],
                "european_aqi": [null, 30]
            }
        });
        let reading = extract_reading(&parse(&body), historical(), BERLIN).unwrap();
        assert_eq!(reading.pm25, Some(12.0));
        // First hour is null; it stays null rather than skipping ahead.
        assert_eq!(reading.european_aqi, None);
        assert_eq!(reading.data_source, EUROPE_SOURCE);
    }

    #[test]
    fn null_current_value_falls_back_to_hourly() {
        let body = serde_json::json!({
            "current": { "pm2_5": null },
            "hourly": { "time": ["t0", "t1"], "pm2_5": [5.0, 6.0] }
        });
        let reading = extract_reading(&parse(&body), FetchMode::Current, BERLIN).unwrap();
        assert_eq!(reading.pm25, Some(6.0));
    }

    #[test]
    fn historical_without_data_is_all_null() {
        let body = serde_json::json!({ "latitude": 52.5, "longitude": 13.4 });
        let reading = extract_reading(&parse(&body), historical(), BERLIN).unwrap();
        assert!(reading.is_all_null());
        assert_eq!(reading.data_source, EUROPE_SOURCE);
    }

    #[test]
    fn historical_with_empty_series_is_all_null() {
        let body = serde_json::json!({ "hourly": { "time": [], "pm2_5": [] } });
        let reading = extract_reading(&parse(&body), historical(), NEW_YORK).unwrap();
        assert!(reading.is_all_null());
    }

    #[test]
    fn current_without_data_is_an_error() {
        let body = serde_json::json!({});
        let err = extract_reading(&parse(&body), FetchMode::Current, NEW_YORK).unwrap_err();
        assert!(matches!(err, ReadingError::NoData { .. }));
    }

    #[test]
    fn explicit_source_annotation_is_kept() {
        let body = serde_json::json!({
            "data_source": "AirNow station 360610135",
            "current": { "pm2_5": 9.0 }
        });
        let reading = extract_reading(&parse(&body), FetchMode::Current, NEW_YORK).unwrap();
        assert_eq!(reading.data_source, "AirNow station 360610135");
    }

    #[test]
    fn query_params_for_historical_date() {
        let params = query_params(BERLIN, historical());
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("start_date"), Some("2016-10-16"));
        assert_eq!(get("end_date"), Some("2016-10-16"));
        assert_eq!(get("current"), None);
        assert_eq!(get("latitude"), Some("52.5200"));
        assert!(get("hourly").unwrap().contains("pm2_5"));
        assert!(get("hourly").unwrap().contains("us_aqi"));
    }

    #[test]
    fn query_params_for_current() {
        let params = query_params(NEW_YORK, FetchMode::Current);
        assert!(params.iter().any(|(k, _)| *k == "current"));
        assert!(!params.iter().any(|(k, _)| *k == "start_date"));
    }

    #[test]
    fn config_defaults() {
        let config = OpenMeteoConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_retries, 2);
    }
}
