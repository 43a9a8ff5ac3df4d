use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::error;

use tripplanner::cli::{Cli, Command};
use tripplanner::config::TripPlannerConfig;
use tripplanner::models::{Budget, TripRequest};
use tripplanner::{TravelPlanner, TripPlannerError, logging, web};

fn report(err: TripPlannerError) -> anyhow::Error {
    error!("{}", err);
    anyhow!("{}\n{}", err.user_message(), err)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = TripPlannerConfig::load_from_path(cli.config.clone())
        .context("Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose)?;

    match cli.command {
        Command::Plan {
            city,
            start,
            end,
            adults,
            budget,
            currency,
        } => {
            let budget = budget.map(|amount| Budget { amount, currency });
            let trip = TripRequest::new(city, start, end, adults, budget).map_err(report)?;

            let planner = TravelPlanner::from_config(&config).map_err(report)?;
            let outcome = planner.run(&trip).await.map_err(report)?;

            println!("{}", outcome.message);
            if !outcome.empty_sections.is_empty() {
                println!("No results for: {}", outcome.empty_sections.join(", "));
            }
        }
        Command::Serve { port } => {
            let planner = TravelPlanner::from_config(&config).map_err(report)?;
            web::run(Arc::new(planner), port).await?;
        }
    }

    Ok(())
}
