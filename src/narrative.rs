//! Planning prompt and narrative generation

use std::fmt;
use std::sync::Arc;

use futures::TryStreamExt;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::llm::{ChatMessage, TextGenerator};
use crate::models::{Attraction, Coordinates, Event, Hotel, Restaurant, TripRequest, WeatherDay};
use crate::routing::{RouteEstimate, RouteEstimator, estimate_both};
use crate::{Result, TripPlannerError};

/// Everything the fetch steps gathered for one trip
#[derive(Debug, Clone, Serialize)]
pub struct TripData {
    pub weather: Vec<WeatherDay>,
    pub events: Vec<Event>,
    pub attractions: Vec<Attraction>,
    pub hotels: Vec<Hotel>,
    pub restaurants: Vec<Restaurant>,
}

/// The generated itinerary text, exactly as streamed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeText(String);

impl NarrativeText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NarrativeText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A hotel, the attraction closest to it, and how to get there
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelRoute {
    pub hotel: String,
    pub attraction: String,
    pub straight_line_km: f64,
    pub route: RouteEstimate,
}

pub struct NarrativeSynthesizer {
    generator: Arc<dyn TextGenerator>,
    routes: Option<Arc<dyn RouteEstimator>>,
    instructions: String,
    max_route_pairs: usize,
}

impl NarrativeSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>, instructions: impl Into<String>) -> Self {
        Self {
            generator,
            routes: None,
            instructions: instructions.into(),
            max_route_pairs: 3,
        }
    }

    /// Add hotel to attraction routes to the prompt
    #[must_use]
    pub fn with_routes(mut self, estimator: Arc<dyn RouteEstimator>, max_pairs: usize) -> Self {
        self.routes = Some(estimator);
        self.max_route_pairs = max_pairs;
        self
    }

    #[instrument(skip_all, fields(city = %trip.city))]
    pub async fn synthesize(&self, data: &TripData, trip: &TripRequest) -> Result<NarrativeText> {
        let routes = match &self.routes {
            Some(estimator) => hotel_routes(estimator.as_ref(), data, self.max_route_pairs).await?,
            None => Vec::new(),
        };

        let prompt = build_prompt(trip, data, &routes)?;
        debug!("Planning prompt is {} bytes", prompt.len());

        let messages = vec![
            ChatMessage::system(self.instructions.clone()),
            ChatMessage::user(prompt),
        ];
        let mut fragments = self.generator.stream(messages).await?;

        let mut text = String::new();
        let mut count = 0usize;
        while let Some(fragment) = fragments.try_next().await? {
            text.push_str(&fragment);
            count += 1;
        }
        info!("Received {} fragments ({} bytes) of itinerary text", count, text.len());

        if text.trim().is_empty() {
            return Err(TripPlannerError::generation("The model returned an empty itinerary"));
        }
        Ok(NarrativeText(text))
    }
}

/// Pair up to `max_pairs` hotels that have coordinates with their nearest attraction
#[must_use]
pub fn nearest_pairs<'a>(
    hotels: &'a [Hotel],
    attractions: &'a [Attraction],
    max_pairs: usize,
) -> Vec<(&'a Hotel, &'a Attraction, f64)> {
    let located: Vec<(&Attraction, Coordinates)> = attractions
        .iter()
        .filter_map(|a| a.coordinates().map(|c| (a, c)))
        .collect();

    hotels
        .iter()
        .filter_map(|hotel| {
            let from = hotel.coordinates()?;
            located
                .iter()
                .map(|(attraction, at)| (*attraction, from.distance_km(at)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(attraction, km)| (hotel, attraction, km))
        })
        .take(max_pairs)
        .collect()
}

async fn hotel_routes(
    estimator: &dyn RouteEstimator,
    data: &TripData,
    max_pairs: usize,
) -> Result<Vec<HotelRoute>> {
    let mut routes = Vec::new();
    for (hotel, attraction, km) in nearest_pairs(&data.hotels, &data.attractions, max_pairs) {
        // both sides are located, nearest_pairs filtered on it
        let (Some(from), Some(to)) = (hotel.coordinates(), attraction.coordinates()) else {
            continue;
        };
        let route = estimate_both(estimator, from, to).await?;
        routes.push(HotelRoute {
            hotel: hotel.name.clone(),
            attraction: attraction.name.clone(),
            straight_line_km: (km * 100.0).round() / 100.0,
            route,
        });
    }
    debug!("Estimated {} hotel routes", routes.len());
    Ok(routes)
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| TripPlannerError::generation(format!("Failed to serialize prompt data: {e}")))
}

/// The user prompt: trip parameters followed by every record set as JSON
pub fn build_prompt(trip: &TripRequest, data: &TripData, routes: &[HotelRoute]) -> Result<String> {
    let mut prompt = format!(
        "You are a travel assistant. Using the information below, suggest an itinerary with personalized activities.\n\n\
         Destination: {}\nDates: {} to {} ({} days)\nTravellers: {} adults\n",
        trip.city,
        trip.start_date,
        trip.end_date,
        trip.days(),
        trip.party_size
    );
    if let Some(budget) = &trip.budget {
        prompt.push_str(&format!("Budget: {budget}\n"));
    }

    let sections = [
        ("Weather forecast", pretty(&data.weather)?),
        ("Available events", pretty(&data.events)?),
        ("Tourist attractions", pretty(&data.attractions)?),
        ("Suggested hotels", pretty(&data.hotels)?),
        ("Recommended restaurants", pretty(&data.restaurants)?),
    ];
    for (title, json) in sections {
        prompt.push_str(&format!("\n**{title}**:\n{json}\n"));
    }

    if !routes.is_empty() {
        prompt.push_str(&format!(
            "\n**Hotels and their nearest attraction**:\n{}\n",
            pretty(routes)?
        ));
    }

    prompt.push_str(
        "\nPlease suggest an attractive itinerary taking into account the weather, \
         common tourist preferences and the availability of activities.",
    );
    Ok(prompt)
}
