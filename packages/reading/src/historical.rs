//! Historical reading resolution with a fallback year.
//!
//! Reanalysis coverage is uneven: regional products reach back further
//! than the global one, so a reading for the primary reference year may
//! come back empty. [`resolve_historical`] then tries a fallback year and
//! reports whichever year actually produced data.

use air_compare_reading_models::{Coordinates, FetchMode, HistoricalReading};
use chrono::{Datelike as _, NaiveDate};

use crate::{ReadingError, ReadingSource};

/// Returns `today`'s month and day in `year`.
///
/// February 29 maps to February 28 when `year` is not a leap year.
///
/// # Errors
///
/// Returns [`ReadingError::InvalidDate`] if `year` is outside the
/// representable range.
pub fn same_day_in_year(today: NaiveDate, year: i32) -> Result<NaiveDate, ReadingError> {
    NaiveDate::from_ymd_opt(year, today.month(), today.day())
        .or_else(|| {
            (today.month() == 2 && today.day() == 29)
                .then(|| NaiveDate::from_ymd_opt(year, 2, 28))
                .flatten()
        })
        .ok_or_else(|| ReadingError::InvalidDate {
            message: format!("{today} has no equivalent in year {year}"),
        })
}

/// Fetches a historical reading for `today`'s calendar day in
/// `primary_year`, falling back to `fallback_year` if the primary reading
/// is entirely empty.
///
/// `year_used` is the fallback year only when the fallback reading has at
/// least one value. Otherwise the (all-null) primary reading is returned
/// with `primary_year`; callers treat that as "no historical data".
///
/// A failed fallback fetch is logged and the primary result is kept.
///
/// # Errors
///
/// Returns [`ReadingError`] if the primary fetch fails or a reference
/// date cannot be built.
pub async fn resolve_historical(
    source: &dyn ReadingSource,
    coordinates: Coordinates,
    today: NaiveDate,
    primary_year: i32,
    fallback_year: i32,
) -> Result<HistoricalReading, ReadingError> {
    let primary_date = same_day_in_year(today, primary_year)?;
    let primary = source
        .fetch(coordinates, FetchMode::Historical { date: primary_date })
        .await?;

    if !primary.is_all_null() || fallback_year == primary_year {
        return Ok(HistoricalReading {
            reading: primary,
            year_used: primary_year,
        });
    }

    log::info!(
        "No data for ({}, {}) in {primary_year}, trying {fallback_year}",
        coordinates.latitude,
        coordinates.longitude
    );

    let fallback_date = same_day_in_year(today, fallback_year)?;
    match source
        .fetch(coordinates, FetchMode::Historical { date: fallback_date })
        .await
    {
        Ok(fallback) if !fallback.is_all_null() => Ok(HistoricalReading {
            reading: fallback,
            year_used: fallback_year,
        }),
        Ok(_) => Ok(HistoricalReading {
            reading: primary,
            year_used: primary_year,
        }),
        Err(e) => {
            log::warn!("Fallback year {fallback_year} fetch failed: {e}");
            Ok(HistoricalReading {
                reading: primary,
                year_used: primary_year,
            })
        }
    }
}
