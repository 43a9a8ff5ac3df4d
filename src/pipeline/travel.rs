//! The travel itinerary chain
//!
//! fetch-weather → fetch-events → fetch-restaurants → fetch-hotels →
//! fetch-attractions → plan-activities → render-itinerary

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::{Pipeline, Step, StepOutput, StepRecords, StepResults};
use crate::config::TripPlannerConfig;
use crate::llm::{OpenAiClient, TextGenerator};
use crate::models::records::{NoResults, is_empty_result};
use crate::models::{Attraction, Event, Hotel, Restaurant, TripRequest, WeatherDay};
use crate::narrative::{NarrativeSynthesizer, TripData};
use crate::render::DocumentRenderer;
use crate::routing::OpenRouteService;
use crate::sources::{SharedSource, Sources, http};
use crate::Result;

pub const FETCH_WEATHER: &str = "fetch-weather";
pub const FETCH_EVENTS: &str = "fetch-events";
pub const FETCH_RESTAURANTS: &str = "fetch-restaurants";
pub const FETCH_HOTELS: &str = "fetch-hotels";
pub const FETCH_ATTRACTIONS: &str = "fetch-attractions";
pub const PLAN_ACTIVITIES: &str = "plan-activities";
pub const RENDER_ITINERARY: &str = "render-itinerary";

const FETCH_STEPS: [&str; 5] = [
    FETCH_WEATHER,
    FETCH_EVENTS,
    FETCH_RESTAURANTS,
    FETCH_HOTELS,
    FETCH_ATTRACTIONS,
];

/// Runs one source and stores its records
pub struct FetchStep<R> {
    id: &'static str,
    source: SharedSource<R>,
}

impl<R> FetchStep<R> {
    pub fn new(id: &'static str, source: SharedSource<R>) -> Self {
        Self { id, source }
    }
}

#[async_trait]
impl<R: StepRecords> Step for FetchStep<R> {
    fn id(&self) -> &'static str {
        self.id
    }

    async fn execute(&self, trip: &TripRequest, _results: &StepResults) -> Result<StepOutput> {
        let records = self.source.fetch(trip).await?;
        info!("{} returned {} {}", self.id, records.len(), R::KIND);
        Ok(R::into_output(records))
    }
}

/// Turns the five record sets into the itinerary text
pub struct PlanActivitiesStep {
    synthesizer: NarrativeSynthesizer,
}

impl PlanActivitiesStep {
    pub fn new(synthesizer: NarrativeSynthesizer) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Step for PlanActivitiesStep {
    fn id(&self) -> &'static str {
        PLAN_ACTIVITIES
    }

    fn requires(&self) -> &[&'static str] {
        &FETCH_STEPS
    }

    async fn execute(&self, trip: &TripRequest, results: &StepResults) -> Result<StepOutput> {
        let data = TripData {
            weather: results.records::<WeatherDay>(FETCH_WEATHER, PLAN_ACTIVITIES)?.to_vec(),
            events: results.records::<Event>(FETCH_EVENTS, PLAN_ACTIVITIES)?.to_vec(),
            attractions: results.records::<Attraction>(FETCH_ATTRACTIONS, PLAN_ACTIVITIES)?.to_vec(),
            hotels: results.records::<Hotel>(FETCH_HOTELS, PLAN_ACTIVITIES)?.to_vec(),
            restaurants: results.records::<Restaurant>(FETCH_RESTAURANTS, PLAN_ACTIVITIES)?.to_vec(),
        };
        let narrative = self.synthesizer.synthesize(&data, trip).await?;
        Ok(StepOutput::Narrative(narrative))
    }
}

pub struct RenderItineraryStep {
    renderer: DocumentRenderer,
}

impl RenderItineraryStep {
    pub fn new(renderer: DocumentRenderer) -> Self {
        Self { renderer }
    }
}

#[async_trait]
impl Step for RenderItineraryStep {
    fn id(&self) -> &'static str {
        RENDER_ITINERARY
    }

    fn requires(&self) -> &[&'static str] {
        &[PLAN_ACTIVITIES]
    }

    async fn execute(&self, _trip: &TripRequest, results: &StepResults) -> Result<StepOutput> {
        let narrative = results.narrative(PLAN_ACTIVITIES, RENDER_ITINERARY)?;
        let path = self.renderer.render(narrative).await?;
        Ok(StepOutput::Document(path))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Every source returned real records
    Complete,
    /// At least one source only had its placeholder record
    Partial,
}

/// Result of one successful run
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub pdf_path: PathBuf,
    pub status: PlanStatus,
    pub message: String,
    /// Fetch steps that found nothing
    pub empty_sections: Vec<String>,
}

fn empty_sections(results: &StepResults) -> Vec<String> {
    fn is_empty<R: StepRecords + NoResults>(results: &StepResults, step: &str) -> bool {
        results
            .get(step)
            .and_then(R::from_output)
            .is_some_and(is_empty_result)
    }

    let weather_empty = results
        .get(FETCH_WEATHER)
        .and_then(WeatherDay::from_output)
        .is_some_and(|days| days.iter().all(WeatherDay::is_no_results));

    [
        (FETCH_WEATHER, weather_empty),
        (FETCH_EVENTS, is_empty::<Event>(results, FETCH_EVENTS)),
        (FETCH_RESTAURANTS, is_empty::<Restaurant>(results, FETCH_RESTAURANTS)),
        (FETCH_HOTELS, is_empty::<Hotel>(results, FETCH_HOTELS)),
        (FETCH_ATTRACTIONS, is_empty::<Attraction>(results, FETCH_ATTRACTIONS)),
    ]
    .into_iter()
    .filter(|(_, empty)| *empty)
    .map(|(step, _)| step.to_string())
    .collect()
}

/// The full travel chain, ready to run for any number of trips
pub struct TravelPlanner {
    pipeline: Pipeline,
}

impl TravelPlanner {
    pub fn new(
        sources: Sources,
        synthesizer: NarrativeSynthesizer,
        renderer: DocumentRenderer,
    ) -> Self {
        let pipeline = Pipeline::new("travel-workflow")
            .step(FetchStep::new(FETCH_WEATHER, sources.weather))
            .step(FetchStep::new(FETCH_EVENTS, sources.events))
            .step(FetchStep::new(FETCH_RESTAURANTS, sources.restaurants))
            .step(FetchStep::new(FETCH_HOTELS, sources.hotels))
            .step(FetchStep::new(FETCH_ATTRACTIONS, sources.attractions))
            .step(PlanActivitiesStep::new(synthesizer))
            .step(RenderItineraryStep::new(renderer));
        Self { pipeline }
    }

    /// Wire up the HTTP backed sources, the text generator and the renderer
    pub fn from_config(config: &TripPlannerConfig) -> Result<Self> {
        let sources = Sources::from_config(config)?;
        let client = http::build_client(&config.http)?;

        let generator: Arc<dyn TextGenerator> =
            Arc::new(OpenAiClient::from_config(client.clone(), &config.llm)?);
        let mut synthesizer = NarrativeSynthesizer::new(generator, config.llm.instructions.clone());
        match OpenRouteService::from_config(client, &config.routing) {
            Some(estimator) if config.routing.max_pairs > 0 => {
                synthesizer = synthesizer.with_routes(Arc::new(estimator), config.routing.max_pairs);
            }
            _ => warn!("Route estimates disabled, itineraries will not include hotel routes"),
        }

        let renderer = DocumentRenderer::new(&config.output.directory, &config.output.title);
        Ok(Self::new(sources, synthesizer, renderer))
    }

    #[must_use]
    pub fn step_ids(&self) -> Vec<&'static str> {
        self.pipeline.step_ids()
    }

    pub async fn run(&self, trip: &TripRequest) -> Result<PlanOutcome> {
        trip.validate()?;
        let results = self.pipeline.run(trip).await?;
        let pdf_path = results
            .document(RENDER_ITINERARY, "travel-workflow")?
            .to_path_buf();

        let empty_sections = empty_sections(&results);
        let status = if empty_sections.is_empty() {
            PlanStatus::Complete
        } else {
            PlanStatus::Partial
        };
        info!("Itinerary written to {}", pdf_path.display());

        Ok(PlanOutcome {
            message: format!("Itinerary generated successfully at {}", pdf_path.display()),
            pdf_path,
            status,
            empty_sections,
        })
    }
}
