#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Place search and reverse geocoding.
//!
//! Two lookups feed the comparison engine:
//!
//! - free-text search, turning "Lyon" into coordinates, and
//! - reverse geocoding, turning coordinates into a country identity for
//!   the national average.
//!
//! Both go through the [`Geocoder`] trait; [`nominatim::NominatimClient`]
//! is the OpenStreetMap-backed implementation.

pub mod nominatim;

use air_compare_reading_models::CountryIdentity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A place found by free-text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodedPlace {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Display name of the match.
    pub name: String,
}

/// Address details for a coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseGeocoded {
    /// City, town, or village, when known.
    pub city: Option<String>,
    /// Country name.
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2 code as returned by the geocoder.
    pub country_code: Option<String>,
    /// Full display name.
    pub display_name: String,
}

impl ReverseGeocoded {
    /// The country identity for sample table lookup, if a country name
    /// or code is known. The ISO code is upper-cased.
    #[must_use]
    pub fn country_identity(&self) -> Option<CountryIdentity> {
        let code = self
            .country_code
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_uppercase();
        let name = self.country.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() && code.is_empty() {
            return None;
        }
        Some(CountryIdentity::new(name, code))
    }
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response could not be parsed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    /// The geocoding service rate-limited the request.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The search found nothing.
    #[error("Location not found: {query}")]
    NotFound {
        /// The query that was searched.
        query: String,
    },
}

/// A search and reverse-geocoding backend.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Finds the best match for a free-text query.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::NotFound`] when nothing matches, or
    /// another [`GeocodeError`] if the request fails.
    async fn search(&self, query: &str) -> Result<GeocodedPlace, GeocodeError>;

    /// Looks up the address at a coordinate. `Ok(None)` means the
    /// geocoder has no address there (e.g. open ocean).
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails.
    async fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<ReverseGeocoded>, GeocodeError>;
}

/// Reverse-geocodes a coordinate to a country, logging and swallowing
/// failures.
pub async fn country_at(
    geocoder: &dyn Geocoder,
    latitude: f64,
    longitude: f64,
) -> Option<CountryIdentity> {
    match geocoder.reverse(latitude, longitude).await {
        Ok(Some(place)) => place.country_identity(),
        Ok(None) => {
            log::debug!("No address at ({latitude}, {longitude})");
            None
        }
        Err(e) => {
            log::warn!("Reverse geocoding ({latitude}, {longitude}) failed: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingGeocoder;

    #[async_trait]
    impl Geocoder for FailingGeocoder {
        async fn search(&self, query: &str) -> Result<GeocodedPlace, GeocodeError> {
            Err(GeocodeError::NotFound {
                query: query.to_string(),
            })
        }

        async fn reverse(&self, _: f64, _: f64) -> Result<Option<ReverseGeocoded>, GeocodeError> {
            Err(GeocodeError::RateLimited)
        }
    }

    fn place(country: Option<&str>, code: Option<&str>) -> ReverseGeocoded {
        ReverseGeocoded {
            city: Some("Lyon".to_string()),
            country: country.map(str::to_string),
            country_code: code.map(str::to_string),
            display_name: "Lyon, France".to_string(),
        }
    }

    #[test]
    fn country_identity_uppercases_code() {
        assert_eq!(
            place(Some("France"), Some("fr")).country_identity(),
            Some(CountryIdentity::new("France", "FR"))
        );
    }

    #[test]
    fn country_identity_with_partial_data() {
        assert_eq!(
            place(None, Some("fr")).country_identity(),
            Some(CountryIdentity::new("", "FR"))
        );
        assert_eq!(place(None, None).country_identity(), None);
    }

    #[tokio::test]
    async fn country_at_swallows_errors() {
        assert_eq!(country_at(&FailingGeocoder, 45.76, 4.83).await, None);
    }
}
