//! `tripplanner` - Personalized multi-day travel itineraries
//!
//! This library gathers weather, events, attractions, hotels and restaurants for a
//! trip, asks a language model to plan the days, and renders the answer as a PDF.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod models;
pub mod narrative;
pub mod pipeline;
pub mod render;
pub mod routing;
pub mod sources;
pub mod web;

// Re-export core types for public API
pub use config::TripPlannerConfig;
pub use error::TripPlannerError;
pub use models::{Budget, TripRequest};
pub use narrative::{NarrativeSynthesizer, NarrativeText, TripData};
pub use pipeline::{Pipeline, PlanOutcome, PlanStatus, Step, StepOutput, StepResults, TravelPlanner};
pub use render::DocumentRenderer;
pub use sources::{Source, Sources};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripPlannerError>;
