//! Interactive server launcher.
//!
//! Prompts for the listen address and the reference year offset before
//! starting the server.

use dialoguer::{Confirm, Input};

fn prompt(label: &str, env_var: &str, default: &str) -> String {
    let current = std::env::var(env_var).unwrap_or_else(|_| default.to_string());
    Input::new()
        .with_prompt(label)
        .default(current.clone())
        .interact_text()
        .unwrap_or(current)
}

/// Runs the server after prompting for its configuration.
///
/// The answers are stored in `BIND_ADDR`, `PORT`, and
/// `REFERENCE_YEARS_BACK` before delegating to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Air Quality Comparison Server");
    println!();

    let bind_addr = prompt("Bind address", "BIND_ADDR", "127.0.0.1");
    let port = prompt("Port", "PORT", "8080");
    let years_back = prompt("Compare against how many years ago", "REFERENCE_YEARS_BACK", "10");

    // SAFETY: We are single-threaded at this point (before server starts) and
    // these variables are only read once during server initialisation.
    unsafe {
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", &port);
        std::env::set_var("REFERENCE_YEARS_BACK", &years_back);
    }

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server().await
}
