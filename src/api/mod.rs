use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::TripPlannerError;
use crate::models::TripRequest;
use crate::pipeline::{PlanOutcome, TravelPlanner};

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub detail: String,
}

/// A planner failure mapped onto an HTTP status
pub struct ApiError(TripPlannerError);

impl From<TripPlannerError> for ApiError {
    fn from(err: TripPlannerError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        if self.0.is_input_error() {
            StatusCode::BAD_REQUEST
        } else if self.0.is_upstream_error() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Itinerary request failed: {}", self.0);
        } else {
            warn!("Rejected itinerary request: {}", self.0);
        }
        let body = ApiErrorBody {
            error: self.0.user_message(),
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(planner: Arc<TravelPlanner>) -> Router {
    Router::new()
        .route("/itineraries", post(create_itinerary))
        .with_state(planner)
}

async fn create_itinerary(
    State(planner): State<Arc<TravelPlanner>>,
    payload: Result<Json<TripRequest>, JsonRejection>,
) -> Result<Json<PlanOutcome>, ApiError> {
    let Json(trip) = payload.map_err(|rejection| TripPlannerError::validation(rejection.body_text()))?;
    let trip = TripRequest::new(
        trip.city,
        trip.start_date,
        trip.end_date,
        trip.party_size,
        trip.budget,
    )?;
    let outcome = planner.run(&trip).await?;
    Ok(Json(outcome))
}
