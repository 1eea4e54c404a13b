//! Per-metric comparison summaries.

use air_compare_change::{Change, Classification, classify, compute_change};
use air_compare_reading_models::{AqiCategory, Coordinates, HistoricalReading, Metric, Reading};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One metric compared between today and the reference date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    /// The metric.
    pub metric: Metric,
    /// Today's value.
    pub current: Option<f64>,
    /// The reference date's value.
    pub historical: Option<f64>,
    /// Relative change, if computable.
    pub change: Option<Change>,
    /// Whether the change is an improvement.
    pub classification: Classification,
}

impl MetricComparison {
    /// Compares `metric` between two readings.
    #[must_use]
    pub fn between(metric: Metric, current: &Reading, historical: &Reading) -> Self {
        let current = metric.value_in(current);
        let historical = metric.value_in(historical);
        let change = compute_change(current, historical);
        Self {
            metric,
            current,
            historical,
            change,
            classification: classify(change, metric.lower_is_better()),
        }
    }
}

/// Result of comparing a point today against a reference date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    /// The compared location.
    pub coordinates: Coordinates,
    /// The day treated as "today".
    pub today: NaiveDate,
    /// The historical date the reading actually came from.
    pub target_date: NaiveDate,
    /// Today's reading.
    pub current: Reading,
    /// The historical reading and its year.
    pub historical: HistoricalReading,
    /// `true` when the primary reference year had no data.
    pub fallback_used: bool,
    /// AQI first, then every pollutant.
    pub metrics: Vec<MetricComparison>,
    /// One-line summary.
    pub description: String,
}

impl Comparison {
    /// Builds the per-metric comparison.
    #[must_use]
    pub fn build(
        coordinates: Coordinates,
        today: NaiveDate,
        target_date: NaiveDate,
        current: Reading,
        historical: HistoricalReading,
        fallback_used: bool,
    ) -> Self {
        let metrics: Vec<MetricComparison> = Metric::all()
            .into_iter()
            .map(|m| MetricComparison::between(m, &current, &historical.reading))
            .collect();
        let description = describe(&metrics, target_date);

        Self {
            coordinates,
            today,
            target_date,
            current,
            historical,
            fallback_used,
            metrics,
            description,
        }
    }

    /// The AQI category of today's reading, when a US AQI is available.
    #[must_use]
    pub fn current_category(&self) -> Option<AqiCategory> {
        self.current.us_aqi.and_then(AqiCategory::from_us_aqi)
    }
}

/// Summarizes the headline metric: AQI when both sides have it,
/// otherwise the first metric with both values.
fn describe(metrics: &[MetricComparison], target_date: NaiveDate) -> String {
    let Some((headline, current, historical)) = metrics
        .iter()
        .find_map(|m| Some((m, m.current?, m.historical?)))
    else {
        return format!("No comparable air quality values for {target_date}.");
    };

    let verdict = match headline.classification {
        Classification::Positive => "better",
        Classification::Negative => "worse",
        Classification::Neutral => "unchanged",
    };

    let change = headline
        .change
        .map_or_else(String::new, |c| format!(" ({c})"));

    format!(
        "{} is {current:.1} today vs {historical:.1} on {target_date}{change}: {verdict}.",
        headline.metric.label()
    )
}

#[cfg(test)]
mod tests {
    use air_compare_reading_models::Pollutant;

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 10, 16).unwrap()
    }

    fn build(current: Reading, historical: Reading) -> Comparison {
        Comparison::build(
            Coordinates::new(52.52, 13.405),
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            date(),
            current,
            HistoricalReading {
                reading: historical,
                year_used: 2016,
            },
            false,
        )
    }

    #[test]
    fn reports_aqi_then_every_pollutant() {
        let comparison = build(Reading::empty("x"), Reading::empty("x"));
        assert_eq!(comparison.metrics.len(), 1 + Pollutant::ALL.len());
        assert_eq!(comparison.metrics[0].metric, Metric::Aqi);
    }

    #[test]
    fn aqi_uses_whichever_standard_is_present() {
        let comparison = build(
            Reading::empty("x").with(Pollutant::EuropeanAqi, 30.0),
            Reading::empty("x").with(Pollutant::EuropeanAqi, 60.0),
        );
        let aqi = &comparison.metrics[0];
        assert_eq!(aqi.current, Some(30.0));
        assert_eq!(aqi.classification, Classification::Positive);
    }

    #[test]
    fn description_uses_headline_metric() {
        let comparison = build(
            Reading::empty("x").with(Pollutant::UsAqi, 60.0),
            Reading::empty("x").with(Pollutant::UsAqi, 40.0),
        );
        assert_eq!(
            comparison.description,
            "AQI is 60.0 today vs 40.0 on 2016-10-16 (+50.0%): worse."
        );
    }

    #[test]
    fn description_without_data() {
        let comparison = build(Reading::empty("x"), Reading::empty("x"));
        assert_eq!(
            comparison.description,
            "No comparable air quality values for 2016-10-16."
        );
    }

    #[test]
    fn current_category_from_us_aqi() {
        let comparison = build(
            Reading::empty("x").with(Pollutant::UsAqi, 120.0),
            Reading::empty("x"),
        );
        assert_eq!(
            comparison.current_category(),
            Some(AqiCategory::UnhealthyForSensitiveGroups)
        );
    }

    #[test]
    fn serializes_camel_case() {
        let comparison = build(
            Reading::empty("x").with(Pollutant::Pm25, 9.0),
            Reading::empty("x").with(Pollutant::Pm25, 12.0),
        );
        let json = serde_json::to_value(&comparison).unwrap();
        assert_eq!(json["targetDate"], "2016-10-16");
        assert_eq!(json["historical"]["yearUsed"], 2016);
        assert_eq!(json["fallbackUsed"], false);
        assert_eq!(json["metrics"][0]["metric"], "aqi");
        assert_eq!(json["metrics"][0]["classification"], "neutral");
    }
}
