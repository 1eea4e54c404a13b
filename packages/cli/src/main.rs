#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line interface for air quality comparisons.
//!
//! ```text
//! air_compare compare Lyon [--date 2026-03-01] [--json]
//! air_compare compare --lat 45.76 --lon 4.83 [--country France]
//! air_compare search "Cape Town"
//! air_compare national Germany [--code DE] [--json]
//! air_compare countries [--json]
//! air_compare serve
//! ```
//!
//! Running `air_compare` with no subcommand enters interactive mode.

mod interactive;
mod output;

use std::sync::Arc;

use air_compare_comparison::{ComparisonConfig, ComparisonRequest, ComparisonService};
use air_compare_geocoder::{Geocoder, nominatim::NominatimClient};
use air_compare_reading::open_meteo::OpenMeteoClient;
use air_compare_reading_models::{Coordinates, CountryIdentity};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "air_compare",
    about = "Compare today's air quality with the same day years ago"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a place today against the reference year
    Compare {
        /// Place name to search for (omit when using --lat/--lon)
        place: Option<String>,
        /// Latitude
        #[arg(long, requires = "lon", conflicts_with = "place", allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Country name (reverse geocoded when omitted)
        #[arg(long)]
        country: Option<String>,
        /// ISO 3166-1 alpha-2 country code
        #[arg(long)]
        country_code: Option<String>,
        /// Treat this date as today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Look up the coordinates of a place
    Search {
        /// Place name
        query: String,
    },
    /// Average a country's sample cities
    National {
        /// Country name
        country: String,
        /// ISO 3166-1 alpha-2 country code
        #[arg(long)]
        code: Option<String>,
        /// Treat this date as today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the countries with sample cities
    Countries {
        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the API server
    Serve,
}

/// Upstream clients shared by every command.
struct Clients {
    /// Comparison engine backed by Open-Meteo.
    comparisons: ComparisonService,
    /// Nominatim geocoder.
    geocoder: Arc<dyn Geocoder>,
}

impl Clients {
    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            comparisons: ComparisonService::new(
                Arc::new(OpenMeteoClient::from_env()?),
                ComparisonConfig::from_env(),
            ),
            geocoder: Arc::new(NominatimClient::from_env()?),
        })
    }
}

/// Where to compare.
enum Target {
    /// A place name to search for.
    Place(String),
    /// Explicit coordinates.
    Point(Coordinates),
}

/// Runs a comparison and prints it.
///
/// # Errors
///
/// Returns an error if the place cannot be found or the comparison fails.
async fn run_compare(
    clients: &Clients,
    target: Target,
    country: Option<CountryIdentity>,
    today: NaiveDate,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let coordinates = match target {
        Target::Point(coordinates) => coordinates,
        Target::Place(query) => {
            let place = clients.geocoder.search(&query).await?;
            if !json {
                println!("{}", place.name);
            }
            Coordinates::new(place.latitude, place.longitude)
        }
    };

    let country = match country {
        Some(country) => Some(country),
        None => {
            air_compare_geocoder::country_at(
                clients.geocoder.as_ref(),
                coordinates.latitude,
                coordinates.longitude,
            )
            .await
        }
    };

    log::debug!("Comparing {coordinates:?} in {country:?} on {today}");

    let outcome = clients
        .comparisons
        .compare(ComparisonRequest {
            coordinates,
            country: country.clone(),
            today,
        })
        .await?;

    if !json {
        print!("{}", output::format_comparison(&outcome.comparison));
    }

    let national = outcome.national.resolve().await;

    if json {
        print_json(&serde_json::json!({
            "comparison": outcome.comparison,
            "country": country,
            "national": national,
        }))?;
    } else {
        match &national {
            Some(national) => print!("{}", output::format_national_comparison(national)),
            None => println!("\nNo national comparison available."),
        }
    }

    Ok(())
}

/// Computes a national average and prints it.
///
/// # Errors
///
/// Returns an error if the reference years cannot be derived.
async fn run_national(
    clients: &Clients,
    country: &CountryIdentity,
    today: NaiveDate,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let average = clients.comparisons.national_average(country, today).await?;

    if json {
        return print_json(&average);
    }

    match average {
        Some(average) => print!("{}", output::format_national_average(&average)),
        None => println!("No sample cities for '{}'.", country.name),
    }
    Ok(())
}

/// Prints the sample country table.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
fn run_countries(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let countries = air_compare_samples::all_countries();
    if json {
        return print_json(&countries);
    }
    print!("{}", output::format_countries(countries));
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Starts the API server on actix-web's own runtime.
///
/// # Errors
///
/// Returns an error if the server fails to start.
async fn run_serve(interactive: bool) -> Result<(), Box<dyn std::error::Error>> {
    // The server uses actix-web's runtime, so we need to run it
    // in a blocking task to avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(async move {
            if interactive {
                air_compare_server::interactive::run().await
            } else {
                air_compare_server::run_server().await
            }
        })
    })
    .await??;
    Ok(())
}

fn country_arg(name: Option<String>, code: Option<String>) -> Option<CountryIdentity> {
    let name = name.unwrap_or_default();
    let code = code.unwrap_or_default().trim().to_uppercase();
    if name.trim().is_empty() && code.is_empty() {
        return None;
    }
    Some(CountryIdentity::new(name.trim(), code))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run().await;
    };

    let today = |date: Option<NaiveDate>| date.unwrap_or_else(|| Local::now().date_naive());

    match command {
        Commands::Compare {
            place,
            lat,
            lon,
            country,
            country_code,
            date,
            json,
        } => {
            let target = match (place, lat, lon) {
                (_, Some(lat), Some(lon)) => Target::Point(Coordinates::new(lat, lon)),
                (Some(place), _, _) => Target::Place(place),
                _ => return Err("Provide a place name or --lat and --lon".into()),
            };
            let clients = Clients::from_env()?;
            run_compare(
                &clients,
                target,
                country_arg(country, country_code),
                today(date),
                json,
            )
            .await?;
        }
        Commands::Search { query } => {
            let clients = Clients::from_env()?;
            let place = clients.geocoder.search(&query).await?;
            println!(
                "{} ({:.4}, {:.4})",
                place.name, place.latitude, place.longitude
            );
        }
        Commands::National {
            country,
            code,
            date,
            json,
        } => {
            let clients = Clients::from_env()?;
            let Some(country) = country_arg(Some(country), code) else {
                return Err("Country must not be empty".into());
            };
            run_national(&clients, &country, today(date), json).await?;
        }
        Commands::Countries { json } => run_countries(json)?,
        Commands::Serve => run_serve(false).await?,
    }

    Ok(())
}
