//! Best-effort data provenance labels.
//!
//! The upstream model data comes from different CAMS products depending
//! on region. When the payload does not say where a value came from, the
//! label is inferred from rough coordinate boxes. The boxes are
//! approximate and overlap; Europe is checked first and wins.

use air_compare_reading_models::Coordinates;

/// Label for coordinates inside the European box.
pub const EUROPE_SOURCE: &str = "CAMS European Air Quality Reanalysis";

/// Label for coordinates inside one of the North American boxes.
pub const NORTH_AMERICA_SOURCE: &str =
    "CAMS Global (may include NOAA/Environment Canada ground stations)";

/// Label for everywhere else.
pub const GLOBAL_SOURCE: &str = "CAMS Global Reanalysis";

/// An inclusive latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Region {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

impl Region {
    fn contains(&self, coordinates: Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&coordinates.latitude)
            && (self.min_lon..=self.max_lon).contains(&coordinates.longitude)
    }
}

const EUROPE: Region = Region {
    min_lat: 35.0,
    max_lat: 71.0,
    min_lon: -10.0,
    max_lon: 40.0,
};

const NORTH_AMERICA: &[Region] = &[
    // Contiguous United States
    Region {
        min_lat: 24.0,
        max_lat: 50.0,
        min_lon: -125.0,
        max_lon: -66.0,
    },
    // Canada
    Region {
        min_lat: 41.0,
        max_lat: 84.0,
        min_lon: -141.0,
        max_lon: -52.0,
    },
    // Mexico
    Region {
        min_lat: 14.0,
        max_lat: 33.0,
        min_lon: -118.0,
        max_lon: -86.0,
    },
    // Hawaii
    Region {
        min_lat: 18.0,
        max_lat: 23.0,
        min_lon: -161.0,
        max_lon: -154.0,
    },
];

/// Returns the provenance label for a reading.
///
/// An explicit upstream annotation is used verbatim when present and
/// non-blank; otherwise the label is inferred from the coordinates.
#[must_use]
pub fn infer_data_source(annotation: Option<&str>, coordinates: Coordinates) -> String {
    if let Some(explicit) = annotation.map(str::trim).filter(|s| !s.is_empty()) {
        return explicit.to_string();
    }

    if EUROPE.contains(coordinates) {
        EUROPE_SOURCE.to_string()
    } else if NORTH_AMERICA.iter().any(|r| r.contains(coordinates)) {
        NORTH_AMERICA_SOURCE.to_string()
    } else {
        GLOBAL_SOURCE.to_string()
    }
}
