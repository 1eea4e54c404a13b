//! Nominatim / OpenStreetMap geocoder client.
//!
//! The public instance allows **1 request per second** and requires an
//! identifying `User-Agent`. Both endpoints use `format=jsonv2`.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/> and
//! <https://nominatim.org/release-docs/develop/api/Reverse/>

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{GeocodeError, GeocodedPlace, Geocoder, ReverseGeocoded};

/// Default Nominatim instance.
pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NominatimConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!("air-compare/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 10,
        }
    }
}

impl NominatimConfig {
    /// Reads `NOMINATIM_URL` and `GEOCODER_USER_AGENT`, falling back to
    /// defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("NOMINATIM_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            user_agent: std::env::var("GEOCODER_USER_AGENT").unwrap_or(defaults.user_agent),
            timeout_secs: defaults.timeout_secs,
        }
    }
}

/// One `/search` result.
#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

/// A `/reverse` response. Failed lookups come back as `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct ReverseResult {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<ReverseAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

/// HTTP client for a Nominatim instance.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    config: NominatimConfig,
}

impl NominatimClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(config: NominatimConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a client configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, GeocodeError> {
        Self::new(NominatimConfig::from_env())
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, GeocodeError> {
        let url = format!("{}/{path}", self.config.base_url);
        log::debug!("Nominatim {path}: {query:?}");

        let resp = self.client.get(&url).query(query).send().await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }
        let resp = resp.error_for_status()?;

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn search(&self, query: &str) -> Result<GeocodedPlace, GeocodeError> {
        let body = self
            .get_json(
                "search",
                &[
                    ("q", query.to_string()),
                    ("format", "jsonv2".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        parse_search(&body)?.ok_or_else(|| GeocodeError::NotFound {
            query: query.to_string(),
        })
    }

    async fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<ReverseGeocoded>, GeocodeError> {
        let body = self
            .get_json(
                "reverse",
                &[
                    ("lat", latitude.to_string()),
                    ("lon", longitude.to_string()),
                    ("format", "jsonv2".to_string()),
                    ("zoom", "10".to_string()),
                ],
            )
            .await?;
        parse_reverse(body)
    }
}

/// Parses a `/search` response into the first match.
fn parse_search(body: &serde_json::Value) -> Result<Option<GeocodedPlace>, GeocodeError> {
    if !body.is_array() {
        return Err(GeocodeError::Parse {
            message: "Nominatim search response is not an array".to_string(),
        });
    }

    let results: Vec<SearchResult> =
        serde_json::from_value(body.clone()).map_err(|e| GeocodeError::Parse {
            message: e.to_string(),
        })?;

    let Some(first) = results.into_iter().next() else {
        return Ok(None);
    };

    let parse_coord = |value: &str, field: &str| {
        value.parse::<f64>().map_err(|_| GeocodeError::Parse {
            message: format!("Invalid {field} in Nominatim response: {value}"),
        })
    };

    let name = first
        .name
        .filter(|n| !n.is_empty())
        .or(first.display_name)
        .unwrap_or_default();

    Ok(Some(GeocodedPlace {
        latitude: parse_coord(&first.lat, "lat")?,
        longitude: parse_coord(&first.lon, "lon")?,
        name,
    }))
}

/// Parses a `/reverse` response.
fn parse_reverse(body: serde_json::Value) -> Result<Option<ReverseGeocoded>, GeocodeError> {
    let result: ReverseResult = serde_json::from_value(body).map_err(|e| GeocodeError::Parse {
        message: e.to_string(),
    })?;

    if let Some(error) = result.error {
        log::debug!("Nominatim reverse: {error}");
        return Ok(None);
    }

    let address = result.address.unwrap_or_default();
    Ok(Some(ReverseGeocoded {
        city: address
            .city
            .or(address.town)
            .or(address.village)
            .or(address.municipality),
        country: address.country,
        country_code: address.country_code,
        display_name: result.display_name.unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use air_compare_reading_models::CountryIdentity;

    use super::*;

    #[test]
    fn parses_search_result() {
        let body = serde_json::json!([{
            "lat": "45.7578137",
            "lon": "4.8320114",
            "name": "Lyon",
            "display_name": "Lyon, Métropole de Lyon, Rhône, France"
        }]);
        let place = parse_search(&body).unwrap().unwrap();
        assert!((place.latitude - 45.757_813_7).abs() < 1e-6);
        assert!((place.longitude - 4.832_011_4).abs() < 1e-6);
        assert_eq!(place.name, "Lyon");
    }

    #[test]
    fn search_falls_back_to_display_name() {
        let body = serde_json::json!([{
            "lat": "1.0",
            "lon": "2.0",
            "name": "",
            "display_name": "Somewhere"
        }]);
        assert_eq!(parse_search(&body).unwrap().unwrap().name, "Somewhere");
    }

    #[test]
    fn empty_search() {
        assert!(parse_search(&serde_json::json!([])).unwrap().is_none());
    }

    #[test]
    fn malformed_search() {
        assert!(matches!(
            parse_search(&serde_json::json!({ "error": "bad" })),
            Err(GeocodeError::Parse { .. })
        ));
        assert!(matches!(
            parse_search(&serde_json::json!([{ "lat": "north", "lon": "2.0" }])),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn parses_reverse_result() {
        let body = serde_json::json!({
            "display_name": "Lyon, Métropole de Lyon, Rhône, France",
            "address": {
                "city": "Lyon",
                "county": "Métropole de Lyon",
                "country": "France",
                "country_code": "fr"
            }
        });
        let place = parse_reverse(body).unwrap().unwrap();
        assert_eq!(place.city.as_deref(), Some("Lyon"));
        assert_eq!(
            place.country_identity(),
            Some(CountryIdentity::new("France", "FR"))
        );
    }

    #[test]
    fn reverse_uses_town_when_no_city() {
        let body = serde_json::json!({
            "display_name": "Chamonix, France",
            "address": { "town": "Chamonix", "country": "France", "country_code": "fr" }
        });
        let place = parse_reverse(body).unwrap().unwrap();
        assert_eq!(place.city.as_deref(), Some("Chamonix"));
    }

    #[test]
    fn reverse_error_is_none() {
        let body = serde_json::json!({ "error": "Unable to geocode" });
        assert_eq!(parse_reverse(body).unwrap(), None);
    }

    #[test]
    fn default_user_agent_identifies_the_app() {
        assert!(NominatimConfig::default().user_agent.starts_with("air-compare/"));
    }
}
