#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the air quality comparison server.
//!
//! These types are serialized to JSON for the REST API. They wrap the
//! engine's result types so the API contract can evolve independently.

use air_compare_comparison::{Comparison, NationalComparison};
use air_compare_national::NationalAverage;
use air_compare_reading_models::{CountryIdentity, SampleLocation};
use air_compare_samples::CountrySamples;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned with every non-success status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable error message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Query parameters for the compare endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareQueryParams {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
    /// Country name; reverse geocoded when absent.
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: Option<String>,
    /// Overrides "today" (`YYYY-MM-DD`).
    pub date: Option<NaiveDate>,
}

impl CompareQueryParams {
    /// The country given in the query, if any.
    #[must_use]
    pub fn country_identity(&self) -> Option<CountryIdentity> {
        country_identity(self.country.as_deref(), self.country_code.as_deref())
    }
}

/// Query parameters for the national endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalQueryParams {
    /// Country name.
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: Option<String>,
    /// Overrides "today" (`YYYY-MM-DD`).
    pub date: Option<NaiveDate>,
}

impl NationalQueryParams {
    /// The country given in the query, if any.
    #[must_use]
    pub fn country_identity(&self) -> Option<CountryIdentity> {
        country_identity(self.country.as_deref(), self.country_code.as_deref())
    }
}

/// Query parameters for the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQueryParams {
    /// Free-text place query.
    pub q: String,
}

fn country_identity(name: Option<&str>, code: Option<&str>) -> Option<CountryIdentity> {
    let name = name.map(str::trim).unwrap_or_default();
    let code = code.map(str::trim).unwrap_or_default();
    if name.is_empty() && code.is_empty() {
        return None;
    }
    Some(CountryIdentity::new(name, code.to_uppercase()))
}

/// Response of the compare endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiComparison {
    /// Current vs historical comparison at the requested point.
    #[serde(flatten)]
    pub comparison: Comparison,
    /// Country used for the national comparison, if one was resolved.
    pub country: Option<CountryIdentity>,
    /// The location compared against its national average, when
    /// available.
    pub national: Option<NationalComparison>,
}

/// Response of the national endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiNational {
    /// The country as requested.
    pub requested: CountryIdentity,
    /// The average, or `null` when the country has no sample cities.
    pub national: Option<NationalAverage>,
}

/// A country in the sample table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCountry {
    /// Country name.
    pub name: String,
    /// ISO 3166-1 alpha-2 code.
    pub code: String,
    /// Representative sample cities.
    pub samples: Vec<SampleLocation>,
}

impl From<&CountrySamples> for ApiCountry {
    fn from(country: &CountrySamples) -> Self {
        Self {
            name: country.name.clone(),
            code: country.code.clone(),
            samples: country.samples.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_params_from_query_json() {
        let params: CompareQueryParams = serde_json::from_value(serde_json::json!({
            "lat": 48.85,
            "lon": 2.35,
            "countryCode": "fr",
            "date": "2026-03-01"
        }))
        .unwrap();

        assert_eq!(
            params.country_identity(),
            Some(CountryIdentity::new("", "FR"))
        );
        assert_eq!(params.date, NaiveDate::from_ymd_opt(2026, 3, 1));
    }

    #[test]
    fn blank_country_is_none() {
        let params = NationalQueryParams {
            country: Some("  ".to_string()),
            country_code: None,
            date: None,
        };
        assert_eq!(params.country_identity(), None);
    }
}
