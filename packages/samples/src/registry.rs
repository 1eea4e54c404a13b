//! Compile-time registry of sample countries.
//!
//! Each entry is a `(region, toml_content)` pair embedded via
//! `include_str!`. Adding a country means adding a `[[countries]]` table
//! to the matching file in `countries/`.

use std::sync::LazyLock;

use serde::Deserialize;

use crate::CountrySamples;

/// Number of countries in the table. Enforced by a test.
#[cfg(test)]
const EXPECTED_COUNTRY_COUNT: usize = 48;

/// Embedded TOML country definitions, one file per region.
const COUNTRY_TOMLS: &[(&str, &str)] = &[
    ("europe", include_str!("../countries/europe.toml")),
    ("americas", include_str!("../countries/americas.toml")),
    ("asia_pacific", include_str!("../countries/asia_pacific.toml")),
    (
        "africa_middle_east",
        include_str!("../countries/africa_middle_east.toml"),
    ),
];

#[derive(Deserialize)]
struct RegionFile {
    countries: Vec<CountrySamples>,
}

static COUNTRIES: LazyLock<Vec<CountrySamples>> = LazyLock::new(|| {
    COUNTRY_TOMLS
        .iter()
        .flat_map(|(region, toml_str)| {
            let file: RegionFile = toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse sample region '{region}': {e}"));
            file.countries
        })
        .collect()
});

/// Returns every country in the sample table.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error
/// and are caught by the tests below.
#[must_use]
pub fn all_countries() -> &'static [CountrySamples] {
    &COUNTRIES
}
