//! Plain-text rendering of comparison results.

use std::fmt::Write as _;

use air_compare_comparison::{Comparison, NationalComparison, NationalMetric};
use air_compare_national::NationalAverage;
use air_compare_reading_models::{AggregateReading, Metric};
use air_compare_samples::CountrySamples;

fn value(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

fn unit(metric: Metric) -> &'static str {
    match metric {
        Metric::Aqi => "",
        Metric::Pollutant(p) => p.unit().unwrap_or(""),
    }
}

/// Renders a point comparison as a table.
pub fn format_comparison(comparison: &Comparison) -> String {
    let mut out = String::new();
    let historical_year = comparison.historical.year_used;

    let _ = writeln!(
        out,
        "\n({:.4}, {:.4}) on {} vs {}",
        comparison.coordinates.latitude,
        comparison.coordinates.longitude,
        comparison.today,
        comparison.target_date
    );
    if comparison.fallback_used {
        let _ = writeln!(out, "(no data for the reference year, using {historical_year})");
    }
    if let Some(category) = comparison.current_category() {
        let _ = writeln!(out, "Today: {category}");
    }
    let _ = writeln!(out, "Source: {}", comparison.current.data_source);
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "{:<20} {:>10} {:>10} {:>24} {:<10}",
        "METRIC", "TODAY", historical_year, "CHANGE", "VERDICT"
    );
    let _ = writeln!(out, "{}", "-".repeat(78));
    for m in &comparison.metrics {
        let label = format!("{} {}", m.metric.label(), unit(m.metric));
        let change = m.change.map_or_else(|| "-".to_string(), |c| c.to_string());
        let _ = writeln!(
            out,
            "{:<20} {:>10} {:>10} {:>24} {:<10}",
            label.trim_end(),
            value(m.current),
            value(m.historical),
            change,
            m.classification
        );
    }
    let _ = writeln!(out, "\n{}", comparison.description);
    out
}

fn format_metrics(out: &mut String, title: &str, metrics: &[NationalMetric]) {
    let _ = writeln!(out, "\n{title}");
    let _ = writeln!(
        out,
        "{:<20} {:>10} {:>10} {:>10} {:<10}",
        "METRIC", "HERE", "NATIONAL", "DELTA", "NATIONAL IS"
    );
    for m in metrics.iter().filter(|m| m.national.is_some()) {
        let delta = m
            .delta
            .map_or_else(|| "-".to_string(), |d| format!("{d:+.1}%"));
        let _ = writeln!(
            out,
            "{:<20} {:>10} {:>10} {:>10} {:<10}",
            m.metric.label(),
            value(m.location),
            value(m.national),
            delta,
            m.standing
        );
    }
}

/// Renders the location-vs-national comparison.
pub fn format_national_comparison(national: &NationalComparison) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nNational average for {} ({} sample cities)",
        national.country.name, national.samples_attempted
    );
    if national.current.is_none() && national.historical.is_none() {
        let _ = writeln!(out, "No sample city returned usable data.");
        return out;
    }
    format_metrics(&mut out, "Today", &national.current_metrics);
    format_metrics(&mut out, "Reference year", &national.historical_metrics);
    out
}

fn format_aggregate(out: &mut String, title: &str, aggregate: Option<&AggregateReading>) {
    let Some(aggregate) = aggregate else {
        let _ = writeln!(out, "{title}: no usable samples");
        return;
    };
    let _ = writeln!(out, "{title} ({} samples):", aggregate.sample_count);
    for metric in Metric::all() {
        if let Some(v) = metric.value_in(&aggregate.reading) {
            let _ = writeln!(out, "  {:<18} {v:>8.1} {}", metric.label(), unit(metric));
        }
    }
}

/// Renders a standalone national average.
pub fn format_national_average(average: &NationalAverage) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}), {} sample cities",
        average.country.name, average.country.iso_code, average.samples_attempted
    );
    format_aggregate(&mut out, "Today", average.current.as_ref());
    format_aggregate(&mut out, "Reference year", average.historical.as_ref());
    out
}

/// Renders the sample country table.
pub fn format_countries(countries: &[CountrySamples]) -> String {
    let mut out = String::new();
    for country in countries {
        let cities: Vec<&str> = country.samples.iter().map(|s| s.label.as_str()).collect();
        let _ = writeln!(out, "{:<3} {:<22} {}", country.code, country.name, cities.join(", "));
    }
    let _ = writeln!(out, "\n{} countries", countries.len());
    out
}
