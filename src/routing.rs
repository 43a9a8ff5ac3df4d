//! Route estimates between two points
//!
//! OpenRouteService answers one profile per request, so a car + walk estimate is
//! two requests issued together.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use crate::config::{RoutingConfig, resolve_api_key};
use crate::models::Coordinates;
use crate::sources::http;
use crate::{Result, TripPlannerError};

const SERVICE: &str = "OpenRouteService";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Car,
    Walk,
}

impl TravelMode {
    /// OpenRouteService profile name
    #[must_use]
    pub fn profile(self) -> &'static str {
        match self {
            TravelMode::Car => "driving-car",
            TravelMode::Walk => "foot-walking",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TravelMode::Car => write!(f, "car"),
            TravelMode::Walk => write!(f, "walk"),
        }
    }
}

/// Raw estimate for one leg
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

impl RouteLeg {
    #[must_use]
    pub fn summary(&self) -> LegSummary {
        LegSummary {
            distance: format_distance(self.distance_meters),
            duration: format_duration(self.duration_seconds),
        }
    }
}

/// Human readable leg, as embedded in the planning prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegSummary {
    pub distance: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteEstimate {
    pub car: LegSummary,
    pub walk: LegSummary,
}

#[async_trait]
pub trait RouteEstimator: Send + Sync {
    async fn estimate(&self, from: Coordinates, to: Coordinates, mode: TravelMode) -> Result<RouteLeg>;
}

/// Car and walk estimates, requested concurrently. Either leg failing fails both.
pub async fn estimate_both(
    estimator: &dyn RouteEstimator,
    from: Coordinates,
    to: Coordinates,
) -> Result<RouteEstimate> {
    let (car, walk) = futures::try_join!(
        estimator.estimate(from, to, TravelMode::Car),
        estimator.estimate(from, to, TravelMode::Walk),
    )?;
    Ok(RouteEstimate {
        car: car.summary(),
        walk: walk.summary(),
    })
}

/// "3 km 250 m"
#[must_use]
pub fn format_distance(meters: f64) -> String {
    let km = (meters / 1000.0).floor();
    let m = (meters % 1000.0).round();
    format!("{km} km {m} m")
}

/// "0h 35m 20s"
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    let h = (seconds / 3600.0).floor();
    let m = ((seconds % 3600.0) / 60.0).floor();
    let s = (seconds % 60.0).round();
    format!("{h}h {m}m {s}s")
}

pub struct OpenRouteService {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenRouteService {
    pub fn new(client: Client, api_key: String, base_url: &str) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `None` when no key is configured; routes are optional
    pub fn from_config(client: Client, config: &RoutingConfig) -> Option<Self> {
        resolve_api_key(config.api_key.as_deref(), "OPENROUTESERVICE_API_KEY")
            .map(|key| Self::new(client, key, &config.base_url))
    }
}

#[async_trait]
impl RouteEstimator for OpenRouteService {
    #[instrument(skip(self))]
    async fn estimate(&self, from: Coordinates, to: Coordinates, mode: TravelMode) -> Result<RouteLeg> {
        let url = format!("{}/directions/{}", self.base_url, mode.profile());
        debug!("Requesting {} route from {}", mode, url);

        let request = self
            .client
            .post(url)
            .header("Authorization", &self.api_key)
            .json(&json!({ "coordinates": [from.lng_lat(), to.lng_lat()] }));

        let response: DirectionsResponse = http::get_json(SERVICE, request).await?;
        response
            .routes
            .into_iter()
            .next()
            .map(|route| RouteLeg {
                distance_meters: route.summary.distance,
                duration_seconds: route.summary.duration,
            })
            .ok_or_else(|| TripPlannerError::unexpected(SERVICE, "No routes in response"))
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    summary: Summary,
}

/// ORS omits both fields for zero-length routes
#[derive(Debug, Deserialize)]
struct Summary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}
