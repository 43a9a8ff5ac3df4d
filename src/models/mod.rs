//! Data models for the trip planner
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates and distances
//! - Trip: The validated request that seeds a planning run
//! - Records: Typed results returned by the travel data sources

pub mod location;
pub mod records;
pub mod trip;

// Re-export all public types for convenient access
pub use location::Coordinates;
pub use records::{Attraction, Event, Hotel, Restaurant, WeatherDay};
pub use trip::{Budget, TripRequest};
