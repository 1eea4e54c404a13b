#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Relative change between two readings of the same metric.
//!
//! Two comparisons are supported:
//!
//! - [`compute_change`]: today vs the same day in a reference year. A
//!   zero baseline is reported as [`Change::ZeroBaseline`] rather than an
//!   infinite percentage.
//! - [`compute_delta`]: a location vs an aggregate (e.g. the national
//!   average). A zero aggregate simply yields `None`.
//!
//! NaN inputs are treated exactly like missing values.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Result of [`compute_change`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Change {
    /// The historical value was exactly zero, so no percentage exists.
    ZeroBaseline {
        /// The current value, if any.
        current: Option<f64>,
    },
    /// Signed, unrounded percentage change from the historical value.
    Percent {
        /// `(current - historical) / historical * 100`.
        value: f64,
    },
}

impl Change {
    /// The percentage, if this is a normal change.
    #[must_use]
    pub const fn percent(&self) -> Option<f64> {
        match self {
            Self::Percent { value } => Some(*value),
            Self::ZeroBaseline { .. } => None,
        }
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Percent { value } => write!(f, "{value:+.1}%"),
            Self::ZeroBaseline { current: Some(c) } if *c != 0.0 => {
                write!(f, "up from zero (now {c})")
            }
            Self::ZeroBaseline { .. } => write!(f, "no change from zero"),
        }
    }
}

/// Direction of a change once metric polarity is taken into account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum Classification {
    /// An improvement.
    Positive,
    /// A regression.
    Negative,
    /// No change, or not comparable.
    Neutral,
}

/// How an aggregate compares to a specific location.
///
/// The label describes the *aggregate*: [`Self::Worse`] means the
/// aggregate is more polluted than the location.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum AggregateStanding {
    /// The aggregate is lower than the location.
    Better,
    /// The aggregate is higher than the location.
    Worse,
    /// Equal, or not comparable.
    Neutral,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// Relative change of `current` against `historical`.
///
/// * Missing historical value: `None`.
/// * Historical value of exactly zero: [`Change::ZeroBaseline`] carrying
///   `current`.
/// * Missing current value against a non-zero baseline: `None`.
/// * Otherwise the signed percentage change.
#[must_use]
pub fn compute_change(current: Option<f64>, historical: Option<f64>) -> Option<Change> {
    let historical = finite(historical)?;
    let current = finite(current);

    if historical == 0.0 {
        return Some(Change::ZeroBaseline { current });
    }

    current.map(|c| Change::Percent {
        value: ((c - historical) / historical) * 100.0,
    })
}

/// Labels a change as an improvement or regression.
///
/// For `lower_is_better` metrics (every pollutant and AQI), a rise is a
/// regression. An increase from a zero baseline is treated the same way.
#[must_use]
pub fn classify(change: Option<Change>, lower_is_better: bool) -> Classification {
    let rose = match change {
        None => return Classification::Neutral,
        Some(Change::ZeroBaseline { current }) => match finite(current) {
            None => return Classification::Neutral,
            Some(c) if c == 0.0 => return Classification::Neutral,
            Some(_) => true,
        },
        Some(Change::Percent { value }) if value.is_nan() || value == 0.0 => {
            return Classification::Neutral;
        }
        Some(Change::Percent { value }) => value > 0.0,
    };

    if rose == lower_is_better {
        Classification::Negative
    } else {
        Classification::Positive
    }
}

/// Percentage difference of a location value against an aggregate.
///
/// Returns `None` if either value is missing or the aggregate is zero.
#[must_use]
pub fn compute_delta(location: Option<f64>, aggregate: Option<f64>) -> Option<f64> {
    let location = finite(location)?;
    let aggregate = finite(aggregate)?;
    if aggregate == 0.0 {
        return None;
    }
    Some(((location - aggregate) / aggregate) * 100.0)
}

/// Compares an aggregate against a location for a lower-is-better metric.
#[must_use]
pub fn classify_against_aggregate(
    location: Option<f64>,
    aggregate: Option<f64>,
) -> AggregateStanding {
    match (finite(location), finite(aggregate)) {
        (Some(loc), Some(agg)) if agg > loc => AggregateStanding::Worse,
        (Some(loc), Some(agg)) if agg < loc => AggregateStanding::Better,
        _ => AggregateStanding::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(change: Option<Change>) -> f64 {
        change.and_then(|c| c.percent()).unwrap()
    }

    #[test]
    fn missing_historical_is_not_applicable() {
        assert_eq!(compute_change(Some(5.0), None), None);
        assert_eq!(compute_change(Some(5.0), Some(f64::NAN)), None);
    }

    #[test]
    fn zero_baseline_is_a_distinct_marker() {
        assert_eq!(
            compute_change(Some(5.0), Some(0.0)),
            Some(Change::ZeroBaseline { current: Some(5.0) })
        );
        assert_eq!(
            compute_change(None, Some(0.0)),
            Some(Change::ZeroBaseline { current: None })
        );
        assert_eq!(
            compute_change(Some(f64::NAN), Some(0.0)),
            Some(Change::ZeroBaseline { current: None })
        );
    }

    #[test]
    fn missing_current_against_nonzero_baseline() {
        assert_eq!(compute_change(None, Some(10.0)), None);
    }

    #[test]
    fn percentage_is_exact_and_signed() {
        assert!((pct(compute_change(Some(12.0), Some(8.0))) - 50.0).abs() < 1e-12);
        assert!((pct(compute_change(Some(6.0), Some(8.0))) + 25.0).abs() < 1e-12);
        assert!((pct(compute_change(Some(40.0), Some(30.0))) - 100.0 / 3.0).abs() < 1e-12);
        assert!((pct(compute_change(Some(-1.0), Some(-2.0))) + 50.0).abs() < 1e-12);
    }

    #[test]
    fn classify_inverts_for_lower_is_better() {
        let up = compute_change(Some(12.0), Some(8.0));
        let down = compute_change(Some(6.0), Some(8.0));

        assert_eq!(classify(up, true), Classification::Negative);
        assert_eq!(classify(down, true), Classification::Positive);
        assert_eq!(classify(up, false), Classification::Positive);
        assert_eq!(classify(down, false), Classification::Negative);
    }

    #[test]
    fn classify_neutral_cases() {
        assert_eq!(classify(None, true), Classification::Neutral);
        assert_eq!(
            classify(compute_change(Some(8.0), Some(8.0)), true),
            Classification::Neutral
        );
        assert_eq!(
            classify(Some(Change::ZeroBaseline { current: Some(0.0) }), true),
            Classification::Neutral
        );
        assert_eq!(
            classify(Some(Change::ZeroBaseline { current: None }), true),
            Classification::Neutral
        );
        assert_eq!(
            classify(
                Some(Change::ZeroBaseline {
                    current: Some(f64::NAN)
                }),
                true
            ),
            Classification::Neutral
        );
    }

    #[test]
    fn rise_from_zero_baseline() {
        let change = Some(Change::ZeroBaseline { current: Some(5.0) });
        assert_eq!(classify(change, true), Classification::Negative);
        assert_eq!(classify(change, false), Classification::Positive);
    }

    #[test]
    fn delta_against_aggregate() {
        assert_eq!(compute_delta(Some(5.0), Some(0.0)), None);
        assert_eq!(compute_delta(None, Some(10.0)), None);
        assert_eq!(compute_delta(Some(10.0), None), None);
        assert_eq!(compute_delta(Some(f64::NAN), Some(10.0)), None);
        assert!((compute_delta(Some(15.0), Some(10.0)).unwrap() - 50.0).abs() < 1e-12);
        assert!((compute_delta(Some(5.0), Some(10.0)).unwrap() + 50.0).abs() < 1e-12);
    }

    #[test]
    fn zero_baseline_asymmetry() {
        assert!(compute_change(Some(5.0), Some(0.0)).is_some());
        assert!(compute_delta(Some(5.0), Some(0.0)).is_none());
    }

    #[test]
    fn standing_labels_the_aggregate() {
        assert_eq!(
            classify_against_aggregate(Some(10.0), Some(20.0)),
            AggregateStanding::Worse
        );
        assert_eq!(
            classify_against_aggregate(Some(20.0), Some(10.0)),
            AggregateStanding::Better
        );
        assert_eq!(
            classify_against_aggregate(Some(10.0), Some(10.0)),
            AggregateStanding::Neutral
        );
        assert_eq!(
            classify_against_aggregate(None, Some(10.0)),
            AggregateStanding::Neutral
        );
        assert_eq!(
            classify_against_aggregate(Some(10.0), Some(f64::NAN)),
            AggregateStanding::Neutral
        );
    }

    #[test]
    fn serializes_for_presentation() {
        let json = serde_json::to_value(compute_change(Some(12.0), Some(8.0))).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "percent", "value": 50.0 }));

        let json = serde_json::to_value(Change::ZeroBaseline { current: Some(5.0) }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "zeroBaseline", "current": 5.0 })
        );

        assert_eq!(Classification::Negative.to_string(), "negative");
        assert_eq!(AggregateStanding::Worse.as_ref(), "worse");
    }

    #[test]
    fn display() {
        assert_eq!(
            compute_change(Some(12.0), Some(8.0)).unwrap().to_string(),
            "+50.0%"
        );
        assert_eq!(
            Change::ZeroBaseline { current: Some(0.0) }.to_string(),
            "no change from zero"
        );
    }
}
