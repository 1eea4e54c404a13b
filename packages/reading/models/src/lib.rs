#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Air quality reading types and the pollutant taxonomy.
//!
//! A [`Reading`] is one point-in-time snapshot of the eight tracked
//! pollutant/AQI fields at a coordinate. Every field is optional: a
//! reading with no values at all is a legitimate "no data" result, not an
//! error. [`AggregateReading`] has the same shape and holds per-field
//! means across a set of sample readings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

/// One of the eight measurements tracked per reading.
///
/// The string form (`Display`/`FromStr`) is the upstream API field name,
/// e.g. `"pm2_5"` or `"us_aqi"`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum Pollutant {
    /// Fine particulate matter (< 2.5 µm).
    #[strum(to_string = "pm2_5")]
    Pm25,
    /// Coarse particulate matter (< 10 µm).
    Pm10,
    /// Carbon monoxide.
    CarbonMonoxide,
    /// Nitrogen dioxide.
    NitrogenDioxide,
    /// Ozone.
    Ozone,
    /// Sulphur dioxide.
    SulphurDioxide,
    /// US EPA Air Quality Index.
    UsAqi,
    /// European Air Quality Index.
    EuropeanAqi,
}

impl Pollutant {
    /// All pollutant fields, in upstream request order.
    pub const ALL: &[Self] = &[
        Self::Pm10,
        Self::Pm25,
        Self::CarbonMonoxide,
        Self::NitrogenDioxide,
        Self::Ozone,
        Self::SulphurDioxide,
        Self::EuropeanAqi,
        Self::UsAqi,
    ];

    /// Returns the upstream API field name (e.g. `"pm2_5"`).
    #[must_use]
    pub fn api_field(self) -> &'static str {
        self.into()
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pm25 => "PM2.5",
            Self::Pm10 => "PM10",
            Self::CarbonMonoxide => "Carbon monoxide",
            Self::NitrogenDioxide => "Nitrogen dioxide",
            Self::Ozone => "Ozone",
            Self::SulphurDioxide => "Sulphur dioxide",
            Self::UsAqi => "US AQI",
            Self::EuropeanAqi => "European AQI",
        }
    }

    /// Unit of measurement. AQI values are unitless.
    #[must_use]
    pub const fn unit(self) -> Option<&'static str> {
        if self.is_aqi() { None } else { Some("µg/m³") }
    }

    /// Whether this field is an index rather than a concentration.
    #[must_use]
    pub const fn is_aqi(self) -> bool {
        matches!(self, Self::UsAqi | Self::EuropeanAqi)
    }

    /// Whether numerically smaller values mean better air.
    ///
    /// Every tracked field is a pollution measure, so this is always
    /// `true`; callers still go through it so the polarity stays explicit.
    #[must_use]
    pub const fn lower_is_better(self) -> bool {
        true
    }
}

/// A metric shown in a comparison: the generic AQI (whichever standard
/// is available) or one specific pollutant field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    /// US AQI when present, otherwise European AQI.
    Aqi,
    /// A specific pollutant field.
    Pollutant(Pollutant),
}

impl Metric {
    /// The metrics a comparison reports, in display order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        std::iter::once(Self::Aqi)
            .chain(Pollutant::ALL.iter().copied().map(Self::Pollutant))
            .collect()
    }

    /// Extracts this metric's value from a reading.
    #[must_use]
    pub fn value_in(self, reading: &Reading) -> Option<f64> {
        match self {
            Self::Aqi => reading.display_aqi(),
            Self::Pollutant(p) => reading.value(p),
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Aqi => "AQI",
            Self::Pollutant(p) => p.label(),
        }
    }

    /// Whether numerically smaller values mean better air.
    #[must_use]
    pub const fn lower_is_better(self) -> bool {
        match self {
            Self::Aqi => true,
            Self::Pollutant(p) => p.lower_is_better(),
        }
    }
}

impl From<Pollutant> for Metric {
    fn from(value: Pollutant) -> Self {
        Self::Pollutant(value)
    }
}

/// One point-in-time pollutant/AQI snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// PM2.5 concentration (µg/m³).
    pub pm25: Option<f64>,
    /// PM10 concentration (µg/m³).
    pub pm10: Option<f64>,
    /// Carbon monoxide concentration (µg/m³).
    pub carbon_monoxide: Option<f64>,
    /// Nitrogen dioxide concentration (µg/m³).
    pub nitrogen_dioxide: Option<f64>,
    /// Ozone concentration (µg/m³).
    pub ozone: Option<f64>,
    /// Sulphur dioxide concentration (µg/m³).
    pub sulphur_dioxide: Option<f64>,
    /// US AQI.
    pub us_aqi: Option<f64>,
    /// European AQI.
    pub european_aqi: Option<f64>,
    /// Provenance label describing where the data likely came from.
    pub data_source: String,
}

impl Reading {
    /// A reading with every value missing.
    #[must_use]
    pub fn empty(data_source: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            ..Self::default()
        }
    }

    /// Returns the value recorded for `pollutant`.
    #[must_use]
    pub const fn value(&self, pollutant: Pollutant) -> Option<f64> {
        match pollutant {
            Pollutant::Pm25 => self.pm25,
            Pollutant::Pm10 => self.pm10,
            Pollutant::CarbonMonoxide => self.carbon_monoxide,
            Pollutant::NitrogenDioxide => self.nitrogen_dioxide,
            Pollutant::Ozone => self.ozone,
            Pollutant::SulphurDioxide => self.sulphur_dioxide,
            Pollutant::UsAqi => self.us_aqi,
            Pollutant::EuropeanAqi => self.european_aqi,
        }
    }

    /// Sets the value recorded for `pollutant`.
    pub fn set(&mut self, pollutant: Pollutant, value: Option<f64>) {
        let slot = match pollutant {
            Pollutant::Pm25 => &mut self.pm25,
            Pollutant::Pm10 => &mut self.pm10,
            Pollutant::CarbonMonoxide => &mut self.carbon_monoxide,
            Pollutant::NitrogenDioxide => &mut self.nitrogen_dioxide,
            Pollutant::Ozone => &mut self.ozone,
            Pollutant::SulphurDioxide => &mut self.sulphur_dioxide,
            Pollutant::UsAqi => &mut self.us_aqi,
            Pollutant::EuropeanAqi => &mut self.european_aqi,
        };
        *slot = value;
    }

    /// Builder-style variant of [`Self::set`].
    #[must_use]
    pub fn with(mut self, pollutant: Pollutant, value: f64) -> Self {
        self.set(pollutant, Some(value));
        self
    }

    /// `true` when no pollutant field has a value.
    #[must_use]
    pub fn is_all_null(&self) -> bool {
        Pollutant::ALL.iter().all(|p| self.value(*p).is_none())
    }

    /// `true` when the reading carries an AQI (either standard) or a
    /// PM2.5 value. Readings without any of these are not used in
    /// national averages.
    #[must_use]
    pub const fn has_meaningful_data(&self) -> bool {
        self.us_aqi.is_some() || self.european_aqi.is_some() || self.pm25.is_some()
    }

    /// The AQI shown when no specific standard is requested: US AQI if
    /// present, otherwise European AQI.
    #[must_use]
    pub fn display_aqi(&self) -> Option<f64> {
        self.us_aqi.or(self.european_aqi)
    }
}

/// Per-field mean of a set of sample readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReading {
    /// Averaged values; `data_source` is the first contributing sample's.
    #[serde(flatten)]
    pub reading: Reading,
    /// Number of samples that went into the aggregate.
    pub sample_count: usize,
}

/// A historical reading together with the year it actually came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalReading {
    /// The reading (possibly all-null).
    pub reading: Reading,
    /// Year the reading belongs to.
    pub year_used: i32,
}

/// Which point in time a fetch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FetchMode {
    /// Latest available conditions.
    Current,
    /// A single past calendar date.
    Historical {
        /// The date to fetch.
        date: NaiveDate,
    },
}

impl std::fmt::Display for FetchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Historical { date } => write!(f, "historical {date}"),
        }
    }
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `true` when both components are finite and within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A country as identified by a reverse geocoder or user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryIdentity {
    /// Country name (e.g. "United States").
    pub name: String,
    /// ISO 3166-1 alpha-2 code; may be empty.
    #[serde(default)]
    pub iso_code: String,
}

impl CountryIdentity {
    /// Creates a country identity.
    #[must_use]
    pub fn new(name: impl Into<String>, iso_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            iso_code: iso_code.into(),
        }
    }
}

/// A representative city used to approximate a national average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleLocation {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// City name.
    pub label: String,
}

impl SampleLocation {
    /// The sample's coordinates.
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// US EPA AQI category bands.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "camelCase")]
pub enum AqiCategory {
    /// 0-50.
    #[strum(to_string = "Good")]
    Good,
    /// 51-100.
    #[strum(to_string = "Moderate")]
    Moderate,
    /// 101-150.
    #[strum(to_string = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    /// 151-200.
    #[strum(to_string = "Unhealthy")]
    Unhealthy,
    /// 201-300.
    #[strum(to_string = "Very Unhealthy")]
    VeryUnhealthy,
    /// Above 300.
    #[strum(to_string = "Hazardous")]
    Hazardous,
}

impl AqiCategory {
    /// Classifies a US AQI value. Returns `None` for NaN or negative input.
    #[must_use]
    pub fn from_us_aqi(value: f64) -> Option<Self> {
        if value.is_nan() || value < 0.0 {
            return None;
        }
        let rounded = value.round();
        Some(if rounded <= 50.0 {
            Self::Good
        } else if rounded <= 100.0 {
            Self::Moderate
        } else if rounded <= 150.0 {
            Self::UnhealthyForSensitiveGroups
        } else if rounded <= 200.0 {
            Self::Unhealthy
        } else if rounded <= 300.0 {
            Self::VeryUnhealthy
        } else {
            Self::Hazardous
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    #[test]
    fn pollutant_api_fields_match_upstream_names() {
        assert_eq!(Pollutant::Pm25.api_field(), "pm2_5");
        assert_eq!(Pollutant::CarbonMonoxide.api_field(), "carbon_monoxide");
        assert_eq!(Pollutant::UsAqi.to_string(), "us_aqi");
        assert_eq!(
            Pollutant::from_str("european_aqi").unwrap(),
            Pollutant::EuropeanAqi
        );
    }

    #[test]
    fn all_pollutants_are_lower_is_better() {
        assert_eq!(Pollutant::ALL.len(), 8);
        assert!(Pollutant::ALL.iter().all(|p| p.lower_is_better()));
        assert!(Metric::all().iter().all(|m| m.lower_is_better()));
    }

    #[test]
    fn empty_reading_is_all_null() {
        let reading = Reading::empty("CAMS Global Reanalysis");
        assert!(reading.is_all_null());
        assert!(!reading.has_meaningful_data());
        assert_eq!(reading.data_source, "CAMS Global Reanalysis");
    }

    #[test]
    fn set_and_value_agree_for_every_field() {
        let mut reading = Reading::empty("x");
        let mut next = 0.0;
        for p in Pollutant::ALL {
            next += 1.5;
            reading.set(*p, Some(next));
        }
        let mut expected = 0.0;
        for p in Pollutant::ALL {
            expected += 1.5;
            assert_eq!(reading.value(*p), Some(expected), "{p}");
        }
        assert!(!reading.is_all_null());
    }

    #[test]
    fn meaningful_data_requires_aqi_or_pm25() {
        let only_ozone = Reading::empty("x").with(Pollutant::Ozone, 40.0);
        assert!(!only_ozone.has_meaningful_data());
        assert!(!only_ozone.is_all_null());

        let eu_aqi = Reading::empty("x").with(Pollutant::EuropeanAqi, 22.0);
        assert!(eu_aqi.has_meaningful_data());
    }

    #[test]
    fn display_aqi_prefers_us() {
        let both = Reading::empty("x")
            .with(Pollutant::UsAqi, 80.0)
            .with(Pollutant::EuropeanAqi, 30.0);
        assert_eq!(both.display_aqi(), Some(80.0));

        let eu_only = Reading::empty("x").with(Pollutant::EuropeanAqi, 30.0);
        assert_eq!(eu_only.display_aqi(), Some(30.0));
        assert_eq!(Metric::Aqi.value_in(&eu_only), Some(30.0));
    }

    #[test]
    fn aggregate_serializes_flat() {
        let agg = AggregateReading {
            reading: Reading::empty("CAMS Global Reanalysis").with(Pollutant::Pm25, 20.0),
            sample_count: 3,
        };
        let json = serde_json::to_value(&agg).unwrap();
        assert_eq!(json["pm25"], 20.0);
        assert_eq!(json["sampleCount"], 3);
        assert_eq!(json["dataSource"], "CAMS Global Reanalysis");
    }

    #[test]
    fn coordinates_validation() {
        assert!(Coordinates::new(40.7, -74.0).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, f64::NAN).is_valid());
    }

    #[test]
    fn aqi_categories() {
        assert_eq!(AqiCategory::from_us_aqi(0.0), Some(AqiCategory::Good));
        assert_eq!(AqiCategory::from_us_aqi(50.4), Some(AqiCategory::Good));
        assert_eq!(AqiCategory::from_us_aqi(80.0), Some(AqiCategory::Moderate));
        assert_eq!(
            AqiCategory::from_us_aqi(101.0),
            Some(AqiCategory::UnhealthyForSensitiveGroups)
        );
        assert_eq!(AqiCategory::from_us_aqi(301.0), Some(AqiCategory::Hazardous));
        assert_eq!(AqiCategory::from_us_aqi(f64::NAN), None);
        assert_eq!(
            AqiCategory::UnhealthyForSensitiveGroups.to_string(),
            "Unhealthy for Sensitive Groups"
        );
    }
}
