#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for air quality comparisons.
//!
//! Serves the REST API consumed by the front end: point comparisons
//! (today vs the same day in a reference year), national averages,
//! place search, and the sample country table. Readings come from the
//! Open-Meteo air quality API and places from Nominatim.

mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use air_compare_comparison::{ComparisonConfig, ComparisonService};
use air_compare_geocoder::{Geocoder, nominatim::NominatimClient};
use air_compare_reading::open_meteo::OpenMeteoClient;

/// Shared application state.
pub struct AppState {
    /// Comparison engine.
    pub comparisons: ComparisonService,
    /// Place search and reverse geocoding.
    pub geocoder: Arc<dyn Geocoder>,
}

impl AppState {
    /// Builds the production state from environment configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let source = OpenMeteoClient::from_env()?;
        let geocoder = NominatimClient::from_env()?;
        Ok(Self {
            comparisons: ComparisonService::new(Arc::new(source), ComparisonConfig::from_env()),
            geocoder: Arc::new(geocoder),
        })
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/compare", web::get().to(handlers::compare))
            .route("/national", web::get().to(handlers::national))
            .route("/search", web::get().to(handlers::search))
            .route("/countries", web::get().to(handlers::countries)),
    );
}

/// Starts the API server.
///
/// Builds the upstream clients from the environment and starts the
/// Actix-Web HTTP server on `BIND_ADDR:PORT`. The caller is responsible
/// for initializing logging and providing the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the upstream clients cannot be
/// built, or the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let state = web::Data::new(AppState::from_env().map_err(std::io::Error::other)?);

    log::info!("Comparison config: {:?}", state.comparisons.config());

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
