#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Static table of representative sample cities per country.
//!
//! Countries are looked up by name or ISO code. Names pass through an
//! alias table first so that "USA", "UK", "Czechia" and similar
//! variants reach the canonical entry. A country missing from the table
//! is not an error: [`lookup`] returns `None` and the caller skips the
//! national comparison.

pub mod registry;

use air_compare_reading_models::SampleLocation;
use serde::{Deserialize, Serialize};

pub use registry::all_countries;

/// Number of sample cities every country carries.
pub const SAMPLES_PER_COUNTRY: usize = 5;

/// One country in the sample table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySamples {
    /// Canonical country name.
    pub name: String,
    /// ISO 3166-1 alpha-2 code.
    pub code: String,
    /// Representative cities, most populous first.
    pub samples: Vec<SampleLocation>,
}

/// Alternate country names mapped to the canonical table name.
const ALIASES: &[(&str, &str)] = &[
    ("usa", "United States"),
    ("us", "United States"),
    ("u.s.", "United States"),
    ("u.s.a.", "United States"),
    ("united states of america", "United States"),
    ("america", "United States"),
    ("uk", "United Kingdom"),
    ("u.k.", "United Kingdom"),
    ("great britain", "United Kingdom"),
    ("britain", "United Kingdom"),
    ("england", "United Kingdom"),
    ("scotland", "United Kingdom"),
    ("wales", "United Kingdom"),
    ("czechia", "Czech Republic"),
    ("holland", "Netherlands"),
    ("the netherlands", "Netherlands"),
    ("deutschland", "Germany"),
    ("türkiye", "Turkey"),
    ("turkiye", "Turkey"),
    ("russian federation", "Russia"),
    ("republic of korea", "South Korea"),
    ("korea, republic of", "South Korea"),
    ("korea", "South Korea"),
    ("viet nam", "Vietnam"),
    ("uae", "United Arab Emirates"),
    ("iran, islamic republic of", "Iran"),
    ("islamic republic of iran", "Iran"),
    ("people's republic of china", "China"),
    ("prc", "China"),
    ("brasil", "Brazil"),
    ("méxico", "Mexico"),
    ("españa", "Spain"),
    ("italia", "Italy"),
    ("éire", "Ireland"),
    ("aotearoa", "New Zealand"),
];

/// Resolves `name` through the alias table. Returns the canonical name,
/// or `None` if `name` is not a known alias.
#[must_use]
pub fn normalize_country_name(name: &str) -> Option<&'static str> {
    let needle = name.trim().to_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == needle)
        .map(|(_, canonical)| *canonical)
}

/// Returns the sample locations for a country.
///
/// Tries, in order: the alias-normalized name, the raw name, then the
/// ISO code. Matching is case-insensitive and ignores surrounding
/// whitespace. Returns `None` when nothing matches.
#[must_use]
pub fn lookup(country_name: &str, country_code: &str) -> Option<Vec<SampleLocation>> {
    find_country(country_name, country_code).map(|c| c.samples.clone())
}

/// Like [`lookup`] but returns the whole table entry.
#[must_use]
pub fn find_country(country_name: &str, country_code: &str) -> Option<&'static CountrySamples> {
    let countries = all_countries();

    let by_name = |name: &str| {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        countries.iter().find(|c| c.name.to_lowercase() == needle)
    };

    if let Some(found) = normalize_country_name(country_name).and_then(by_name) {
        return Some(found);
    }
    if let Some(found) = by_name(country_name) {
        return Some(found);
    }

    let code = country_code.trim();
    if code.is_empty() {
        log::debug!("No sample table entry for country '{country_name}'");
        return None;
    }
    let found = countries.iter().find(|c| c.code.eq_ignore_ascii_case(code));
    if found.is_none() {
        log::debug!("No sample table entry for country '{country_name}' ({code})");
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(samples: &[SampleLocation]) -> Vec<&str> {
        samples.iter().map(|s| s.label.as_str()).collect()
    }

    #[test]
    fn alias_and_canonical_name_agree() {
        let via_alias = lookup("USA", "").unwrap();
        let via_name = lookup("United States", "").unwrap();
        assert_eq!(via_alias, via_name);
        assert_eq!(via_alias.len(), SAMPLES_PER_COUNTRY);
    }

    #[test]
    fn common_aliases() {
        assert_eq!(normalize_country_name("US"), Some("United States"));
        assert_eq!(normalize_country_name(" uk "), Some("United Kingdom"));
        assert_eq!(normalize_country_name("Czechia"), Some("Czech Republic"));
        assert_eq!(normalize_country_name("Germany"), None);
    }

    #[test]
    fn every_alias_targets_a_table_entry() {
        let countries = all_countries();
        for (alias, canonical) in ALIASES {
            assert!(
                countries.iter().any(|c| c.name == *canonical),
                "Alias '{alias}' points at unknown country '{canonical}'"
            );
        }
    }

    #[test]
    fn aliases_are_lowercase() {
        for (alias, _) in ALIASES {
            assert_eq!(*alias, alias.to_lowercase(), "Alias '{alias}' is not lowercase");
        }
    }

    #[test]
    fn name_lookup_is_case_insensitive() {
        assert_eq!(lookup("germany", ""), lookup("Germany", ""));
        assert_eq!(
            labels(&lookup("  FRANCE ", "").unwrap())[0],
            "Paris",
            "Whitespace and case should not matter"
        );
    }

    #[test]
    fn falls_back_to_code() {
        let samples = lookup("Bundesrepublik", "de").unwrap();
        assert_eq!(labels(&samples)[0], "Berlin");
    }

    #[test]
    fn name_wins_over_code() {
        let samples = lookup("Japan", "FR").unwrap();
        assert_eq!(labels(&samples)[0], "Tokyo");
    }

    #[test]
    fn unknown_country_is_none() {
        assert_eq!(lookup("Atlantis", "XX"), None);
        assert_eq!(lookup("", ""), None);
    }
}
