#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! National average approximation.
//!
//! A country's air quality is approximated by averaging readings from
//! its representative sample cities. Individual sample failures are
//! logged and skipped; the only way to get no result at all is a
//! country missing from the sample table.

use air_compare_reading::{ReadingSource, historical::resolve_historical};
use air_compare_reading_models::{
    AggregateReading, CountryIdentity, FetchMode, Pollutant, Reading, SampleLocation,
};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt as _};
use serde::{Deserialize, Serialize};

/// Upper bound on the number of samples fetched per country.
pub const MAX_SAMPLES: usize = 5;

/// Provenance label for aggregates whose samples carried none.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Parameters for one national average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NationalRequest {
    /// The day being compared; historical samples use its month and day.
    pub today: NaiveDate,
    /// Primary historical year.
    pub historical_year: i32,
    /// Year tried when a sample has no data for `historical_year`.
    pub fallback_year: i32,
    /// Maximum number of samples fetched at once.
    pub max_concurrent: usize,
}

/// Averaged readings for a country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalAverage {
    /// The country as named in the sample table.
    pub country: CountryIdentity,
    /// Mean of the current sample readings, if any were usable.
    pub current: Option<AggregateReading>,
    /// Mean of the historical sample readings, if any were usable.
    pub historical: Option<AggregateReading>,
    /// Number of sample cities queried.
    pub samples_attempted: usize,
}

/// Readings gathered for one sample city. A `None` means the fetch
/// failed or produced nothing meaningful.
#[derive(Debug, Default)]
struct SampleReadings {
    current: Option<Reading>,
    historical: Option<Reading>,
}

/// Computes the national average for `country`.
///
/// Returns `None` if `country` is absent or not in the sample table.
/// Otherwise up to [`MAX_SAMPLES`] cities are fetched, with current and
/// historical readings handled independently: a sample is left out of
/// a set when its fetch fails or when it has neither an AQI nor a PM2.5
/// value.
pub async fn average(
    source: &dyn ReadingSource,
    country: Option<&CountryIdentity>,
    request: NationalRequest,
) -> Option<NationalAverage> {
    let country = country?;
    let Some(entry) = air_compare_samples::find_country(&country.name, &country.iso_code) else {
        log::info!(
            "No national samples for '{}' ({})",
            country.name,
            country.iso_code
        );
        return None;
    };

    let samples: Vec<&SampleLocation> = entry.samples.iter().take(MAX_SAMPLES).collect();
    if samples.is_empty() {
        return None;
    }

    log::info!(
        "Averaging {} samples for {} (historical year {}, fallback {})",
        samples.len(),
        entry.name,
        request.historical_year,
        request.fallback_year
    );

    let fetches: Vec<_> = samples
        .iter()
        .map(|sample| fetch_sample(source, sample, request))
        .collect();
    let results: Vec<SampleReadings> = stream::iter(fetches)
    .buffered(request.max_concurrent.max(1))
    .collect()
    .await;

    let (current, historical): (Vec<_>, Vec<_>) = results
        .into_iter()
        .map(|r| (r.current, r.historical))
        .unzip();
    let current: Vec<Reading> = current.into_iter().flatten().collect();
    let historical: Vec<Reading> = historical.into_iter().flatten().collect();

    log::debug!(
        "{}: {} usable current samples, {} usable historical samples",
        entry.name,
        current.len(),
        historical.len()
    );

    Some(NationalAverage {
        country: CountryIdentity::new(entry.name.clone(), entry.code.clone()),
        current: aggregate(&current),
        historical: aggregate(&historical),
        samples_attempted: samples.len(),
    })
}

async fn fetch_sample(
    source: &dyn ReadingSource,
    sample: &SampleLocation,
    request: NationalRequest,
) -> SampleReadings {
    let coordinates = sample.coordinates();

    let current = match source.fetch(coordinates, FetchMode::Current).await {
        Ok(reading) => Some(reading),
        Err(e) => {
            log::warn!("Skipping current sample {}: {e}", sample.label);
            None
        }
    };

    let historical = match resolve_historical(
        source,
        coordinates,
        request.today,
        request.historical_year,
        request.fallback_year,
    )
    .await
    {
        Ok(resolved) => Some(resolved.reading),
        Err(e) => {
            log::warn!("Skipping historical sample {}: {e}", sample.label);
            None
        }
    };

    SampleReadings {
        current: current.filter(Reading::has_meaningful_data),
        historical: historical.filter(Reading::has_meaningful_data),
    }
}

/// Per-field mean of `readings`.
///
/// Each pollutant is averaged over the readings that have a value for
/// it; a field with no values stays `None`. The provenance label is
/// taken from the first reading. Returns `None` for an empty slice.
#[must_use]
pub fn aggregate(readings: &[Reading]) -> Option<AggregateReading> {
    let first = readings.first()?;

    let mut reading = Reading::empty(if first.data_source.is_empty() {
        UNKNOWN_SOURCE
    } else {
        first.data_source.as_str()
    });

    for &pollutant in Pollutant::ALL {
        let values: Vec<f64> = readings
            .iter()
            .filter_map(|r| r.value(pollutant))
            .filter(|v| v.is_finite())
            .collect();
        if values.is_empty() {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        reading.set(pollutant, Some(mean));
    }

    Some(AggregateReading {
        reading,
        sample_count: readings.len(),
    })
}
