//! Command line definitions

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Personalized multi-day travel itineraries as PDF
#[derive(Debug, Parser)]
#[command(name = "tripplanner", version, about)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan one trip and write the itinerary PDF
    Plan {
        /// Destination city
        #[arg(long)]
        city: String,

        /// First day of the trip (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day of the trip (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// Number of adults travelling
        #[arg(long)]
        adults: u32,

        /// Total budget for the trip
        #[arg(long)]
        budget: Option<f64>,

        /// Currency of the budget
        #[arg(long, default_value = "EUR", requires = "budget")]
        currency: String,
    },

    /// Serve the itinerary API over HTTP
    Serve {
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
}
