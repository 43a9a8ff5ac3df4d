//! In-memory stand-ins for the external services

#![allow(dead_code)]

use std::marker::PhantomData;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::StreamExt;

use tripplanner::llm::{ChatMessage, TextGenerator, TextStream};
use tripplanner::models::records::NoResults;
use tripplanner::models::{Attraction, Event, Hotel, Restaurant, TripRequest, WeatherDay};
use tripplanner::sources::{Source, Sources};
use tripplanner::{DocumentRenderer, NarrativeSynthesizer, Result, TravelPlanner, TripPlannerError};

pub const NARRATIVE: &str = "**DAY 1 - Arrival in Barcelona**\n\
• Hotel: Hotel Arts\n\
• Weather: Sunny, 28°C\n\
Stroll down to **Barceloneta** for dinner.\n\
---\n\
**DAY 2 - Modernisme**\n\
• Morning: Sagrada Familia\n\
**NOTE**\n\
Book tickets in advance.";

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn trip() -> TripRequest {
    TripRequest::new("Barcelona", date("2025-06-01"), date("2025-06-02"), 2, None).unwrap()
}

/// Returns fixed records and counts its calls
pub struct FakeSource<R> {
    records: Vec<R>,
    calls: Arc<AtomicUsize>,
}

impl<R> FakeSource<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self { records, calls: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl<R: Clone + Send + Sync + 'static> Source for FakeSource<R> {
    type Record = R;

    async fn fetch(&self, _trip: &TripRequest) -> Result<Vec<R>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
}

/// Always fails like an unavailable upstream
pub struct FailingSource<R>(PhantomData<fn() -> R>);

impl<R> FailingSource<R> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

#[async_trait]
impl<R: Send + 'static> Source for FailingSource<R> {
    type Record = R;

    async fn fetch(&self, _trip: &TripRequest) -> Result<Vec<R>> {
        Err(TripPlannerError::upstream("Booking.com", 503, "Service Unavailable"))
    }
}

/// Streams a fixed text in small fragments and keeps every prompt it saw
#[derive(Default)]
pub struct ScriptedGenerator {
    text: String,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedGenerator {
    pub fn new(text: &str) -> Arc<Self> {
        Arc::new(Self { text: text.to_string(), prompts: Mutex::new(Vec::new()) })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> String {
        let prompts = self.prompts.lock().unwrap();
        prompts
            .last()
            .and_then(|messages| messages.last())
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn stream(&self, messages: Vec<ChatMessage>) -> Result<TextStream> {
        self.prompts.lock().unwrap().push(messages);
        let fragments: Vec<Result<String>> = self
            .text
            .chars()
            .collect::<Vec<_>>()
            .chunks(7)
            .map(|chunk| Ok(chunk.iter().collect()))
            .collect();
        Ok(futures::stream::iter(fragments).boxed())
    }
}

pub fn weather() -> Vec<WeatherDay> {
    vec![WeatherDay {
        date: date("2025-06-01"),
        max_temp: 28.0,
        min_temp: 19.0,
        precipitation_chance: 5.0,
        condition: "Clear sky".to_string(),
        location: "Barcelona".to_string(),
    }]
}

pub fn events() -> Vec<Event> {
    vec![Event {
        name: "Primavera Sound".to_string(),
        url: "https://example.com/primavera".to_string(),
        start_date: "2025-06-01T18:00:00Z".to_string(),
        venue: "Parc del Forum".to_string(),
        latitude: Some(41.4106),
        longitude: Some(2.2217),
    }]
}

pub fn attractions() -> Vec<Attraction> {
    vec![Attraction {
        name: "Sagrada Familia".to_string(),
        description: Some("Basilica".to_string()),
        address: None,
        rating: Some("4.5/5".to_string()),
        url: None,
        latitude: Some(41.4036),
        longitude: Some(2.1744),
    }]
}

pub fn hotels() -> Vec<Hotel> {
    vec![Hotel {
        name: "Hotel Arts".to_string(),
        price: Some("412.50 EUR (Total for stay)".to_string()),
        latitude: Some(41.3863),
        longitude: Some(2.1966),
        ..Hotel::no_results("Barcelona")
    }]
}

pub fn restaurants() -> Vec<Restaurant> {
    vec![Restaurant {
        name: "Cal Pep".to_string(),
        address: "Plaça de les Olles, 8".to_string(),
        rating: Some(4.4),
        opening_hours: Some(vec!["Monday: Closed".to_string()]),
        price_level: Some("3/4 - Expensive".to_string()),
        latitude: None,
        longitude: None,
    }]
}

pub fn sample_sources() -> Sources {
    Sources {
        weather: Arc::new(FakeSource::new(weather())),
        events: Arc::new(FakeSource::new(events())),
        attractions: Arc::new(FakeSource::new(attractions())),
        hotels: Arc::new(FakeSource::new(hotels())),
        restaurants: Arc::new(FakeSource::new(restaurants())),
    }
}

/// Every source answers with its placeholder record
pub fn empty_sources() -> Sources {
    Sources {
        weather: Arc::new(FakeSource::new(vec![WeatherDay::no_forecast(date("2025-06-01"), "Barcelona")])),
        events: Arc::new(FakeSource::new(vec![Event::no_results("Barcelona")])),
        attractions: Arc::new(FakeSource::new(vec![Attraction::no_results("Barcelona")])),
        hotels: Arc::new(FakeSource::new(vec![Hotel::no_results("Barcelona")])),
        restaurants: Arc::new(FakeSource::new(vec![Restaurant::no_results("Barcelona")])),
    }
}

pub fn planner(sources: Sources, generator: Arc<ScriptedGenerator>, output: &Path) -> TravelPlanner {
    let synthesizer = NarrativeSynthesizer::new(generator, "Plan the trip");
    let renderer = DocumentRenderer::new(output, "Personalized Travel Itinerary");
    TravelPlanner::new(sources, synthesizer, renderer)
}

pub fn pdf_files(dir: &Path) -> Vec<std::path::PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "pdf"))
        .collect();
    files.sort();
    files
}
