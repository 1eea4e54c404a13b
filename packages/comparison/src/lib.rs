#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Air quality comparison orchestration.
//!
//! [`ComparisonService::compare`] answers "how does today's air at this
//! point compare to the same day N years ago?" It fetches the current
//! reading, resolves the historical reading (with fallback year), and
//! derives per-metric changes. When a country is known, the national
//! average is computed concurrently in a separate task that can fail or
//! lag without affecting the primary result.
//!
//! "Today" is always an explicit input so that reference years and dates
//! do not depend on the wall clock.

pub mod national;
pub mod summary;

use std::sync::Arc;
use std::time::Duration;

use air_compare_national::{NationalAverage, NationalRequest};
use air_compare_reading::{
    ReadingError, ReadingSource,
    historical::{resolve_historical, same_day_in_year},
};
use air_compare_reading_models::{Coordinates, CountryIdentity, FetchMode};
use chrono::{Datelike as _, NaiveDate};
use thiserror::Error;

pub use national::{NationalComparison, NationalMetric, NationalTask};
pub use summary::{Comparison, MetricComparison};

/// Errors that can occur during a comparison.
#[derive(Debug, Error)]
pub enum ComparisonError {
    /// Fetching a reading failed.
    #[error(transparent)]
    Reading(#[from] ReadingError),

    /// The requested coordinates are out of range or not finite.
    #[error("Invalid coordinates: ({latitude}, {longitude})")]
    InvalidCoordinates {
        /// Requested latitude.
        latitude: f64,
        /// Requested longitude.
        longitude: f64,
    },

    /// No usable reference date could be derived.
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// Description of the problem.
        message: String,
    },
}

impl ComparisonError {
    /// `true` for errors caused by the caller's input rather than the
    /// upstream service.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidCoordinates { .. }
                | Self::InvalidDate { .. }
                | Self::Reading(ReadingError::InvalidDate { .. })
        )
    }

    /// `true` when the upstream had no current data for the location.
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::Reading(ReadingError::NoData { .. }))
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonConfig {
    /// The primary reference year is this many years before today.
    pub reference_years_back: i32,
    /// The fallback reference year is this many years before today.
    pub fallback_years_back: i32,
    /// Maximum concurrent sample fetches for the national average.
    pub national_max_concurrent: usize,
    /// How long [`NationalTask::resolve`] waits before giving up on the
    /// national average.
    pub national_timeout: Duration,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            reference_years_back: 10,
            fallback_years_back: 1,
            national_max_concurrent: 5,
            national_timeout: Duration::from_secs(30),
        }
    }
}

impl ComparisonConfig {
    /// Reads `REFERENCE_YEARS_BACK`, `FALLBACK_YEARS_BACK`,
    /// `NATIONAL_MAX_CONCURRENT` and `NATIONAL_TIMEOUT_SECS`, falling back
    /// to defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            reference_years_back: env_or("REFERENCE_YEARS_BACK", defaults.reference_years_back),
            fallback_years_back: env_or("FALLBACK_YEARS_BACK", defaults.fallback_years_back),
            national_max_concurrent: env_or(
                "NATIONAL_MAX_CONCURRENT",
                defaults.national_max_concurrent,
            ),
            national_timeout: Duration::from_secs(env_or(
                "NATIONAL_TIMEOUT_SECS",
                defaults.national_timeout.as_secs(),
            )),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// The primary and fallback historical years for a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceYears {
    /// Year tried first.
    pub primary: i32,
    /// Year tried when the primary year has no data.
    pub fallback: i32,
}

impl ReferenceYears {
    /// Derives the reference years for `today`.
    ///
    /// # Errors
    ///
    /// Returns [`ComparisonError::InvalidDate`] if either offset is not
    /// strictly in the past.
    pub fn from_today(today: NaiveDate, config: &ComparisonConfig) -> Result<Self, ComparisonError> {
        for (name, back) in [
            ("reference", config.reference_years_back),
            ("fallback", config.fallback_years_back),
        ] {
            if back < 1 {
                return Err(ComparisonError::InvalidDate {
                    message: format!("{name} year must be at least one year back, got {back}"),
                });
            }
        }
        Ok(Self {
            primary: today.year() - config.reference_years_back,
            fallback: today.year() - config.fallback_years_back,
        })
    }
}

/// One comparison request.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRequest {
    /// The location to compare.
    pub coordinates: Coordinates,
    /// The country the location belongs to, if known.
    pub country: Option<CountryIdentity>,
    /// The day treated as "today".
    pub today: NaiveDate,
}

/// The primary comparison plus the pending national average.
#[derive(Debug)]
pub struct ComparisonOutcome {
    /// Current vs historical readings for the requested point.
    pub comparison: Comparison,
    /// National average, delivered separately.
    pub national: NationalTask,
}

/// Runs comparisons against a [`ReadingSource`].
#[derive(Clone)]
pub struct ComparisonService {
    source: Arc<dyn ReadingSource>,
    config: ComparisonConfig,
}

impl std::fmt::Debug for ComparisonService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComparisonService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ComparisonService {
    /// Creates a service.
    #[must_use]
    pub fn new(source: Arc<dyn ReadingSource>, config: ComparisonConfig) -> Self {
        Self { source, config }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    /// Compares today's air at `request.coordinates` with the same day in
    /// the reference year.
    ///
    /// The national average for `request.country` starts first and runs
    /// independently; await it with [`NationalTask::resolve`], which gives
    /// up after `national_timeout`. It is aborted if the primary
    /// comparison fails.
    ///
    /// # Errors
    ///
    /// * [`ComparisonError::InvalidCoordinates`] for out-of-range input.
    /// * [`ComparisonError::InvalidDate`] if no reference year can be
    ///   derived from the configuration.
    /// * [`ComparisonError::Reading`] if the current reading is missing
    ///   or a primary fetch fails.
    pub async fn compare(
        &self,
        request: ComparisonRequest,
    ) -> Result<ComparisonOutcome, ComparisonError> {
        let ComparisonRequest {
            coordinates,
            country,
            today,
        } = request;

        if !coordinates.is_valid() {
            return Err(ComparisonError::InvalidCoordinates {
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
            });
        }

        let years = ReferenceYears::from_today(today, &self.config)?;

        log::info!(
            "Comparing ({}, {}) on {today} against {} (fallback {})",
            coordinates.latitude,
            coordinates.longitude,
            years.primary,
            years.fallback
        );

        let national = country.map(|country| self.spawn_national(country, today, years));

        let primary = async {
            let current = self
                .source
                .fetch(coordinates, FetchMode::Current)
                .await?;
            let historical = resolve_historical(
                self.source.as_ref(),
                coordinates,
                today,
                years.primary,
                years.fallback,
            )
            .await?;
            Ok::<_, ReadingError>((current, historical))
        };

        let (current, historical) = match primary.await {
            Ok(readings) => readings,
            Err(e) => {
                if let Some(handle) = national {
                    handle.abort();
                }
                log::error!(
                    "Comparison for ({}, {}) failed: {e}",
                    coordinates.latitude,
                    coordinates.longitude
                );
                return Err(e.into());
            }
        };

        let fallback_used = historical.year_used != years.primary;
        if fallback_used {
            log::warn!(
                "Using fallback year {} for ({}, {})",
                historical.year_used,
                coordinates.latitude,
                coordinates.longitude
            );
        }

        let target_date = same_day_in_year(today, historical.year_used)?;
        let comparison = Comparison::build(
            coordinates,
            today,
            target_date,
            current,
            historical,
            fallback_used,
        );
        let national = NationalTask::new(
            national,
            self.config.national_timeout,
            comparison.current.clone(),
            comparison.historical.reading.clone(),
        );

        Ok(ComparisonOutcome {
            comparison,
            national,
        })
    }

    /// Computes the national average for `country` on its own, without a
    /// point comparison.
    ///
    /// Returns `Ok(None)` when the country is not in the sample table.
    ///
    /// # Errors
    ///
    /// Returns [`ComparisonError::InvalidDate`] if no reference year can
    /// be derived from the configuration.
    pub async fn national_average(
        &self,
        country: &CountryIdentity,
        today: NaiveDate,
    ) -> Result<Option<NationalAverage>, ComparisonError> {
        let years = ReferenceYears::from_today(today, &self.config)?;
        Ok(air_compare_national::average(
            self.source.as_ref(),
            Some(country),
            self.national_request(today, years),
        )
        .await)
    }

    const fn national_request(&self, today: NaiveDate, years: ReferenceYears) -> NationalRequest {
        NationalRequest {
            today,
            historical_year: years.primary,
            fallback_year: years.fallback,
            max_concurrent: self.config.national_max_concurrent,
        }
    }

    fn spawn_national(
        &self,
        country: CountryIdentity,
        today: NaiveDate,
        years: ReferenceYears,
    ) -> tokio::task::JoinHandle<Option<NationalAverage>> {
        let source = Arc::clone(&self.source);
        let request = self.national_request(today, years);
        tokio::spawn(async move {
            air_compare_national::average(source.as_ref(), Some(&country), request).await
        })
    }
}
