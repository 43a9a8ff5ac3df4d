//! Travel data sources
//!
//! Each source turns a [`TripRequest`] into an ordered list of typed records:
//! - OpenMeteo: daily weather forecast
//! - Ticketmaster: public events
//! - TripAdvisor (RapidAPI): tourist attractions
//! - Booking.com (RapidAPI): hotels
//! - Google Places: restaurants

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::config::TripPlannerConfig;
use crate::models::{Attraction, Event, Hotel, Restaurant, TripRequest, WeatherDay};

pub mod booking;
pub mod google_places;
pub mod http;
pub mod open_meteo;
pub mod ticketmaster;
pub mod tripadvisor;

pub use booking::BookingHotels;
pub use google_places::GooglePlacesRestaurants;
pub use open_meteo::OpenMeteoWeather;
pub use ticketmaster::TicketmasterEvents;
pub use tripadvisor::TripAdvisorAttractions;

/// A provider of one kind of travel record
#[async_trait]
pub trait Source: Send + Sync {
    type Record: Send;

    /// Fetch records for the trip. An empty answer is a single placeholder
    /// record, an `Err` always means the service could not be used.
    async fn fetch(&self, trip: &TripRequest) -> Result<Vec<Self::Record>>;
}

pub type SharedSource<R> = Arc<dyn Source<Record = R>>;

/// The five sources a travel plan is built from
#[derive(Clone)]
pub struct Sources {
    pub weather: SharedSource<WeatherDay>,
    pub events: SharedSource<Event>,
    pub attractions: SharedSource<Attraction>,
    pub hotels: SharedSource<Hotel>,
    pub restaurants: SharedSource<Restaurant>,
}

impl Sources {
    /// Build the HTTP backed sources from configuration
    pub fn from_config(config: &TripPlannerConfig) -> Result<Self> {
        let client = http::build_client(&config.http)?;

        Ok(Self {
            weather: Arc::new(OpenMeteoWeather::new(client.clone(), &config.weather)),
            events: Arc::new(TicketmasterEvents::new(client.clone(), &config.events)?),
            attractions: Arc::new(TripAdvisorAttractions::new(client.clone(), &config.attractions)?),
            hotels: Arc::new(BookingHotels::new(client.clone(), &config.hotels)?),
            restaurants: Arc::new(GooglePlacesRestaurants::new(client, &config.restaurants)?),
        })
    }
}
