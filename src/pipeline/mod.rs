//! Step pipeline
//!
//! A pipeline is an ordered list of named steps. Each step declares the steps whose
//! output it reads; the pipeline runs them strictly in declaration order and checks
//! those outputs exist before a step starts. There is no scheduling beyond that,
//! the travel chain is a straight line.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::models::{Attraction, Event, Hotel, Restaurant, TripRequest, WeatherDay};
use crate::narrative::NarrativeText;
use crate::{Result, TripPlannerError};

pub mod travel;

pub use travel::{FetchStep, PlanActivitiesStep, PlanOutcome, PlanStatus, RenderItineraryStep, TravelPlanner};

/// What a step hands to the steps after it
#[derive(Debug, Clone)]
pub enum StepOutput {
    Weather(Vec<WeatherDay>),
    Events(Vec<Event>),
    Attractions(Vec<Attraction>),
    Hotels(Vec<Hotel>),
    Restaurants(Vec<Restaurant>),
    Narrative(NarrativeText),
    Document(PathBuf),
}

/// Record types a fetch step can produce
pub trait StepRecords: Sized + Send + Sync + 'static {
    /// Name used in error messages
    const KIND: &'static str;

    fn into_output(records: Vec<Self>) -> StepOutput;
    fn from_output(output: &StepOutput) -> Option<&[Self]>;
}

macro_rules! step_records {
    ($record:ty, $variant:ident, $kind:literal) => {
        impl StepRecords for $record {
            const KIND: &'static str = $kind;

            fn into_output(records: Vec<Self>) -> StepOutput {
                StepOutput::$variant(records)
            }

            fn from_output(output: &StepOutput) -> Option<&[Self]> {
                match output {
                    StepOutput::$variant(records) => Some(records),
                    _ => None,
                }
            }
        }
    };
}

step_records!(WeatherDay, Weather, "weather forecast");
step_records!(Event, Events, "events");
step_records!(Attraction, Attractions, "attractions");
step_records!(Hotel, Hotels, "hotels");
step_records!(Restaurant, Restaurants, "restaurants");

/// Outputs of the steps run so far. Each step id is written at most once.
#[derive(Debug, Default)]
pub struct StepResults {
    outputs: HashMap<&'static str, StepOutput>,
}

impl StepResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a step's output. A second write for the same step is a wiring error.
    pub fn insert(&mut self, step: &'static str, output: StepOutput) -> Result<()> {
        if self.outputs.contains_key(step) {
            return Err(TripPlannerError::DuplicateStep {
                step: step.to_string(),
            });
        }
        self.outputs.insert(step, output);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, step: &str) -> Option<&StepOutput> {
        self.outputs.get(step)
    }

    #[must_use]
    pub fn contains(&self, step: &str) -> bool {
        self.outputs.contains_key(step)
    }

    pub fn require(&self, step: &str, required_by: &str) -> Result<&StepOutput> {
        self.get(step)
            .ok_or_else(|| TripPlannerError::missing_dependency(step, required_by))
    }

    /// Records produced by a fetch step
    pub fn records<R: StepRecords>(&self, step: &str, required_by: &str) -> Result<&[R]> {
        R::from_output(self.require(step, required_by)?)
            .ok_or_else(|| TripPlannerError::step_output(step, R::KIND))
    }

    pub fn narrative(&self, step: &str, required_by: &str) -> Result<&NarrativeText> {
        match self.require(step, required_by)? {
            StepOutput::Narrative(text) => Ok(text),
            _ => Err(TripPlannerError::step_output(step, "a narrative")),
        }
    }

    pub fn document(&self, step: &str, required_by: &str) -> Result<&Path> {
        match self.require(step, required_by)? {
            StepOutput::Document(path) => Ok(path),
            _ => Err(TripPlannerError::step_output(step, "a document")),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// One named unit of work
#[async_trait]
pub trait Step: Send + Sync {
    fn id(&self) -> &'static str;

    /// Steps whose output must exist before this one runs
    fn requires(&self) -> &[&'static str] {
        &[]
    }

    async fn execute(&self, trip: &TripRequest, results: &StepResults) -> Result<StepOutput>;
}

pub struct Pipeline {
    name: String,
    steps: Vec<Box<dyn Step>>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step; steps run in the order they are added
    #[must_use]
    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    #[must_use]
    pub fn step_ids(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.id()).collect()
    }

    /// Run every step in order. The first failure ends the run.
    pub async fn run(&self, trip: &TripRequest) -> Result<StepResults> {
        let started = Instant::now();
        info!("Starting {} for {} ({} steps)", self.name, trip.city, self.steps.len());

        let mut results = StepResults::new();
        for step in &self.steps {
            let id = step.id();
            if let Some(missing) = step.requires().iter().find(|dep| !results.contains(dep)) {
                return Err(TripPlannerError::missing_dependency(*missing, id));
            }

            let step_start = Instant::now();
            info!("Step {} started", id);
            let output = step.execute(trip, &results).await?;

            let elapsed = step_start.elapsed();
            if elapsed.as_secs() > 5 {
                warn!("Slow step {}: {:.3}s", id, elapsed.as_secs_f64());
            }
            info!("Step {} finished in {:.3}s", id, elapsed.as_secs_f64());

            results.insert(id, output)?;
        }

        info!("{} finished in {:.3}s", self.name, started.elapsed().as_secs_f64());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::NoResults;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn trip() -> TripRequest {
        let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        TripRequest::new("Lisbon", day, day, 1, None).unwrap()
    }

    struct Emit {
        id: &'static str,
        requires: &'static [&'static str],
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Step for Emit {
        fn id(&self) -> &'static str {
            self.id
        }

        fn requires(&self) -> &[&'static str] {
            self.requires
        }

        async fn execute(&self, trip: &TripRequest, _results: &StepResults) -> Result<StepOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(StepOutput::Events(vec![Event::no_results(&trip.city)]))
        }
    }

    fn emit(id: &'static str, requires: &'static [&'static str], calls: &Arc<AtomicUsize>) -> Emit {
        Emit { id, requires, calls: calls.clone() }
    }

    #[test]
    fn test_results_are_write_once() {
        let mut results = StepResults::new();
        results.insert("fetch-events", StepOutput::Events(Vec::new())).unwrap();
        let err = results.insert("fetch-events", StepOutput::Events(Vec::new())).unwrap_err();
        assert!(matches!(err, TripPlannerError::DuplicateStep { .. }));
    }

    #[test]
    fn test_typed_access_checks_shape() {
        let mut results = StepResults::new();
        results.insert("fetch-events", StepOutput::Events(vec![Event::no_results("Lisbon")])).unwrap();

        let events: &[Event] = results.records("fetch-events", "test").unwrap();
        assert_eq!(events.len(), 1);

        let err = results.records::<Hotel>("fetch-events", "test").unwrap_err();
        assert_eq!(err.to_string(), "Step 'fetch-events' did not produce hotels");

        let err = results.narrative("plan-activities", "render").unwrap_err();
        assert!(matches!(err, TripPlannerError::MissingDependency { .. }));
    }

    #[tokio::test]
    async fn test_steps_run_in_declaration_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new("test")
            .step(emit("a", &[], &calls))
            .step(emit("b", &["a"], &calls))
            .step(emit("c", &["a", "b"], &calls));

        assert_eq!(pipeline.step_ids(), vec!["a", "b", "c"]);
        let results = pipeline.run(&trip()).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_missing_dependency_stops_before_step_runs() {
        let before = Arc::new(AtomicUsize::new(0));
        let after = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new("test")
            .step(emit("a", &[], &before))
            .step(emit("b", &["never-declared"], &after))
            .step(emit("c", &[], &after));

        let err = pipeline.run(&trip()).await.unwrap_err();
        match err {
            TripPlannerError::MissingDependency { step, required_by } => {
                assert_eq!(step, "never-declared");
                assert_eq!(required_by, "b");
            }
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(before.load(Ordering::SeqCst), 1);
        assert_eq!(after.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicate_step_id_fails_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new("test")
            .step(emit("a", &[], &calls))
            .step(emit("a", &[], &calls));

        let err = pipeline.run(&trip()).await.unwrap_err();
        assert!(matches!(err, TripPlannerError::DuplicateStep { .. }));
    }
}
