//! HTTP handler functions for the air quality comparison API.

use actix_web::{HttpResponse, web};
use air_compare_comparison::{ComparisonError, ComparisonRequest};
use air_compare_geocoder::GeocodeError;
use air_compare_reading_models::Coordinates;
use air_compare_server_models::{
    ApiComparison, ApiCountry, ApiError, ApiHealth, ApiNational, CompareQueryParams,
    NationalQueryParams, SearchQueryParams,
};
use chrono::{NaiveDate, Utc};

use crate::AppState;

fn today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Utc::now().date_naive())
}

fn comparison_error(e: &ComparisonError) -> HttpResponse {
    if e.is_invalid_input() {
        return HttpResponse::BadRequest().json(ApiError::new(e.to_string()));
    }
    if e.is_no_data() {
        return HttpResponse::NotFound().json(ApiError::new(e.to_string()));
    }
    log::error!("Comparison failed: {e}");
    HttpResponse::BadGateway().json(ApiError::new(format!(
        "Failed to fetch air quality data: {e}"
    )))
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/compare`
///
/// Compares today's air quality at a point with the same day in the
/// reference year, and against the national average when the country
/// is known or can be reverse geocoded.
pub async fn compare(
    state: web::Data<AppState>,
    params: web::Query<CompareQueryParams>,
) -> HttpResponse {
    let params = params.into_inner();

    let country = match params.country_identity() {
        Some(country) => Some(country),
        None => air_compare_geocoder::country_at(state.geocoder.as_ref(), params.lat, params.lon)
            .await,
    };

    let request = ComparisonRequest {
        coordinates: Coordinates::new(params.lat, params.lon),
        country: country.clone(),
        today: today(params.date),
    };

    match state.comparisons.compare(request).await {
        Ok(outcome) => {
            let national = outcome.national.resolve().await;
            HttpResponse::Ok().json(ApiComparison {
                comparison: outcome.comparison,
                country,
                national,
            })
        }
        Err(e) => comparison_error(&e),
    }
}

/// `GET /api/national`
///
/// Averages the sample cities of a country. `national` is `null` when the
/// country has no sample cities.
pub async fn national(
    state: web::Data<AppState>,
    params: web::Query<NationalQueryParams>,
) -> HttpResponse {
    let Some(country) = params.country_identity() else {
        return HttpResponse::BadRequest().json(ApiError::new(
            "Either country or countryCode is required",
        ));
    };

    match state
        .comparisons
        .national_average(&country, today(params.date))
        .await
    {
        Ok(national) => HttpResponse::Ok().json(ApiNational {
            requested: country,
            national,
        }),
        Err(e) => comparison_error(&e),
    }
}

/// `GET /api/search`
///
/// Resolves a free-text place query to coordinates.
pub async fn search(
    state: web::Data<AppState>,
    params: web::Query<SearchQueryParams>,
) -> HttpResponse {
    let query = params.q.trim();
    if query.is_empty() {
        return HttpResponse::BadRequest().json(ApiError::new("Query must not be empty"));
    }

    match state.geocoder.search(query).await {
        Ok(place) => HttpResponse::Ok().json(place),
        Err(GeocodeError::NotFound { .. }) => {
            HttpResponse::NotFound().json(ApiError::new("Location not found"))
        }
        Err(GeocodeError::RateLimited) => HttpResponse::ServiceUnavailable()
            .json(ApiError::new("Search is rate limited, try again shortly")),
        Err(e) => {
            log::error!("Search for '{query}' failed: {e}");
            HttpResponse::BadGateway().json(ApiError::new("Location search failed"))
        }
    }
}

/// `GET /api/countries`
///
/// Lists the countries with sample cities for national averages.
pub async fn countries() -> HttpResponse {
    let countries: Vec<ApiCountry> = air_compare_samples::all_countries()
        .iter()
        .map(ApiCountry::from)
        .collect();
    HttpResponse::Ok().json(countries)
}
