#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Air quality reading fetcher.
//!
//! Retrieves pollutant/AQI values for a coordinate either for "now" or
//! for a single past calendar date, and labels each reading with an
//! inferred data provenance. Fetching is abstracted behind the
//! [`ReadingSource`] trait:
//!
//! - [`open_meteo::OpenMeteoClient`] talks to the Open-Meteo air quality
//!   API (current conditions and the CAMS reanalysis archive).
//! - [`historical::resolve_historical`] layers the primary/fallback year
//!   policy on top of any source.
//!
//! Historical fetches that come back without any usable data are *not*
//! errors: they produce an all-null [`Reading`]. Current fetches without
//! usable data fail with [`ReadingError::NoData`].

pub mod historical;
pub mod open_meteo;
pub mod provenance;
pub mod retry;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

use air_compare_reading_models::{Coordinates, FetchMode, Reading};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while fetching readings.
#[derive(Debug, Error)]
pub enum ReadingError {
    /// The upstream request could not be completed or returned a
    /// non-success status.
    #[error("Upstream request failed: {message}")]
    Transport {
        /// Description of the failure, including the upstream reason when
        /// one was given.
        message: String,
    },

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream payload did not match the expected schema.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A current-conditions fetch returned no usable data.
    #[error("No current air quality data available at ({latitude}, {longitude})")]
    NoData {
        /// Requested latitude.
        latitude: f64,
        /// Requested longitude.
        longitude: f64,
    },

    /// A reference date could not be built for the requested year.
    #[error("Invalid reference date: {message}")]
    InvalidDate {
        /// Description of the invalid date.
        message: String,
    },
}

impl ReadingError {
    /// `true` for network, status, and payload failures: the request
    /// itself could not produce a reading.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Http(_) | Self::Json(_))
    }
}

/// Anything that can produce a [`Reading`] for a coordinate and point
/// in time.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Fetches a reading.
    ///
    /// # Errors
    ///
    /// * [`ReadingError::NoData`] if `mode` is [`FetchMode::Current`] and
    ///   the upstream has nothing for the location.
    /// * A transport-class [`ReadingError`] if the upstream request fails.
    async fn fetch(
        &self,
        coordinates: Coordinates,
        mode: FetchMode,
    ) -> Result<Reading, ReadingError>;
}
