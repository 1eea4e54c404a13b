//! The isolated national average task and its comparison against the
//! requested location.

use std::time::Duration;

use air_compare_change::{AggregateStanding, classify_against_aggregate, compute_delta};
use air_compare_national::NationalAverage;
use air_compare_reading_models::{AggregateReading, CountryIdentity, Metric, Reading};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// One metric compared between the location and the national average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalMetric {
    /// The metric.
    pub metric: Metric,
    /// The location's value.
    pub location: Option<f64>,
    /// The national average.
    pub national: Option<f64>,
    /// Percentage difference of the location against the average.
    pub delta: Option<f64>,
    /// How the national average stands relative to the location.
    pub standing: AggregateStanding,
}

impl NationalMetric {
    fn between(metric: Metric, location: &Reading, national: Option<&AggregateReading>) -> Self {
        let location = metric.value_in(location);
        let national = national.and_then(|a| metric.value_in(&a.reading));
        Self {
            metric,
            location,
            national,
            delta: compute_delta(location, national),
            standing: classify_against_aggregate(location, national),
        }
    }

    fn all(location: &Reading, national: Option<&AggregateReading>) -> Vec<Self> {
        Metric::all()
            .into_iter()
            .map(|m| Self::between(m, location, national))
            .collect()
    }
}

/// The location compared against its country's average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalComparison {
    /// The country as named in the sample table.
    pub country: CountryIdentity,
    /// Average of today's sample readings.
    pub current: Option<AggregateReading>,
    /// Average of the historical sample readings.
    pub historical: Option<AggregateReading>,
    /// Number of sample cities queried.
    pub samples_attempted: usize,
    /// Today's location values against today's average.
    pub current_metrics: Vec<NationalMetric>,
    /// Historical location values against the historical average.
    pub historical_metrics: Vec<NationalMetric>,
}

impl NationalComparison {
    /// Compares location readings against a national average.
    #[must_use]
    pub fn build(average: NationalAverage, current: &Reading, historical: &Reading) -> Self {
        let current_metrics = NationalMetric::all(current, average.current.as_ref());
        let historical_metrics = NationalMetric::all(historical, average.historical.as_ref());
        Self {
            country: average.country,
            current: average.current,
            historical: average.historical,
            samples_attempted: average.samples_attempted,
            current_metrics,
            historical_metrics,
        }
    }
}

/// A national average computed in its own task.
///
/// Failures inside the task (including panics) never reach the caller:
/// [`Self::resolve`] logs them and yields `None`. A task still running
/// after `timeout` is aborted and also yields `None`.
#[derive(Debug)]
pub struct NationalTask {
    handle: Option<JoinHandle<Option<NationalAverage>>>,
    timeout: Duration,
    current: Reading,
    historical: Reading,
}

impl NationalTask {
    pub(crate) const fn new(
        handle: Option<JoinHandle<Option<NationalAverage>>>,
        timeout: Duration,
        current: Reading,
        historical: Reading,
    ) -> Self {
        Self {
            handle,
            timeout,
            current,
            historical,
        }
    }

    /// `true` when no country was given, so no average is coming.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.handle.is_none()
    }

    /// Stops the task without waiting for it.
    pub fn abort(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    /// Waits for the national average and compares it against the
    /// location's readings.
    ///
    /// Returns `None` when there was no country, the country is not in
    /// the sample table, the task failed, or it did not finish in time.
    pub async fn resolve(self) -> Option<NationalComparison> {
        let mut handle = self.handle?;
        let Ok(joined) = tokio::time::timeout(self.timeout, &mut handle).await else {
            log::warn!(
                "National average took longer than {:?}, giving up",
                self.timeout
            );
            handle.abort();
            return None;
        };
        match joined {
            Ok(Some(average)) => Some(NationalComparison::build(
                average,
                &self.current,
                &self.historical,
            )),
            Ok(None) => None,
            Err(e) if e.is_cancelled() => {
                log::debug!("National average task was cancelled");
                None
            }
            Err(e) => {
                log::error!("National average task failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use air_compare_reading_models::Pollutant;

    use super::*;

    const LONG: Duration = Duration::from_secs(30);

    fn average(pm25: f64) -> NationalAverage {
        NationalAverage {
            country: CountryIdentity::new("Germany", "DE"),
            current: Some(AggregateReading {
                reading: Reading::empty("CAMS").with(Pollutant::Pm25, pm25),
                sample_count: 5,
            }),
            historical: None,
            samples_attempted: 5,
        }
    }

    #[test]
    fn compares_location_against_average() {
        let location = Reading::empty("CAMS").with(Pollutant::Pm25, 10.0);
        let comparison = NationalComparison::build(average(20.0), &location, &Reading::empty("x"));

        let pm25 = comparison
            .current_metrics
            .iter()
            .find(|m| m.metric == Metric::Pollutant(Pollutant::Pm25))
            .unwrap();
        assert_eq!(pm25.delta, Some(-50.0));
        assert_eq!(pm25.standing, AggregateStanding::Worse);

        assert!(
            comparison
                .historical_metrics
                .iter()
                .all(|m| m.national.is_none() && m.standing == AggregateStanding::Neutral)
        );
    }

    #[tokio::test]
    async fn resolves_spawned_average() {
        let handle = tokio::spawn(async { Some(average(8.0)) });
        let task = NationalTask::new(Some(handle), LONG, Reading::empty("x"), Reading::empty("x"));

        let comparison = task.resolve().await.unwrap();

        assert_eq!(comparison.country.name, "Germany");
        assert_eq!(comparison.current.unwrap().reading.pm25, Some(8.0));
    }

    #[tokio::test]
    async fn panicking_task_resolves_to_none() {
        let handle = tokio::spawn(async {
            if true {
                panic!("sample table exploded");
            }
            None
        });
        let task = NationalTask::new(Some(handle), LONG, Reading::empty("x"), Reading::empty("x"));

        assert_eq!(task.resolve().await, None);
    }

    #[tokio::test]
    async fn aborted_task_resolves_to_none() {
        let handle = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Some(average(1.0))
        });
        let task = NationalTask::new(Some(handle), LONG, Reading::empty("x"), Reading::empty("x"));

        task.abort();

        assert_eq!(task.resolve().await, None);
    }

    #[tokio::test]
    async fn slow_task_times_out() {
        let handle = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Some(average(1.0))
        });
        let task = NationalTask::new(
            Some(handle),
            Duration::from_millis(50),
            Reading::empty("x"),
            Reading::empty("x"),
        );

        let started = std::time::Instant::now();
        assert_eq!(task.resolve().await, None);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn no_country_means_no_task() {
        let task = NationalTask::new(None, LONG, Reading::empty("x"), Reading::empty("x"));
        assert!(task.is_empty());
        assert_eq!(task.resolve().await, None);
    }
}
