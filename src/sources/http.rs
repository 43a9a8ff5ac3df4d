//! Shared HTTP plumbing for the source adapters

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::{Result, TripPlannerError};

/// Build the client every adapter shares
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds.into()))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| TripPlannerError::config(format!("Failed to create HTTP client: {e}")))
}

/// Send a request and return the response if it has a success status.
///
/// Failures are classified: a non-success status becomes `Upstream` with the
/// message found in the body, a request that never got an answer becomes
/// `NoResponse`, anything else is `Unexpected`.
pub async fn send(service: &str, request: RequestBuilder) -> Result<Response> {
    let start_time = Instant::now();
    let response = request
        .send()
        .await
        .map_err(|e| TripPlannerError::from_reqwest(service, e))?;

    let elapsed = start_time.elapsed();
    if elapsed.as_secs() > 5 {
        warn!("Slow {} response: {:.3}s", service, elapsed.as_secs_f64());
    }

    let status = response.status();
    if status.is_success() {
        debug!("{} answered {} in {:.3}s", service, status, elapsed.as_secs_f64());
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "Unknown error".to_string());
    Err(TripPlannerError::upstream(service, status.as_u16(), message))
}

/// Send a request and decode its JSON body
pub async fn get_json<T: DeserializeOwned>(service: &str, request: RequestBuilder) -> Result<T> {
    let response = send(service, request).await?;
    response.json::<T>().await.map_err(|e| {
        TripPlannerError::unexpected(service, format!("Invalid response body: {e}"))
    })
}

/// Pull a human readable message out of a JSON error body
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let candidates = [
        "/error/message",
        "/error_message",
        "/message",
        "/fault/faultstring",
        "/error",
    ];
    candidates
        .iter()
        .filter_map(|pointer| value.pointer(pointer))
        .find_map(|v| v.as_str().map(str::to_string))
}
