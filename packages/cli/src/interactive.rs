//! Interactive mode: pick an action from a menu and answer prompts.

use chrono::Local;
use dialoguer::{Input, Select};

use crate::{Clients, Target, country_arg, run_compare, run_countries, run_national, run_serve};

/// Top-level actions.
enum Action {
    Compare,
    National,
    Countries,
    Server,
}

impl Action {
    const ALL: &[Self] = &[Self::Compare, Self::National, Self::Countries, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Compare => "Compare a place with years ago",
            Self::National => "National average for a country",
            Self::Countries => "List countries with sample cities",
            Self::Server => "Start server",
        }
    }
}

/// Runs the interactive menu.
///
/// # Errors
///
/// Returns an error if a prompt fails or the chosen action fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Air Quality Comparison");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let today = Local::now().date_naive();

    match Action::ALL[idx] {
        Action::Compare => {
            let place: String = Input::new().with_prompt("Place").interact_text()?;
            let clients = Clients::from_env()?;
            run_compare(&clients, Target::Place(place), None, today, false).await?;
        }
        Action::National => {
            let name: String = Input::new().with_prompt("Country").interact_text()?;
            let Some(country) = country_arg(Some(name), None) else {
                println!("No country given.");
                return Ok(());
            };
            let clients = Clients::from_env()?;
            run_national(&clients, &country, today, false).await?;
        }
        Action::Countries => run_countries(false)?,
        Action::Server => run_serve(true).await?,
    }

    Ok(())
}
