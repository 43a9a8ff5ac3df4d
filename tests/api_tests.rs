mod common;

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use common::*;
use tripplanner::models::Hotel;
use tripplanner::sources::Sources;
use tripplanner::web;

async fn post_itinerary(planner: tripplanner::TravelPlanner, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/itineraries")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = web::app(Arc::new(planner)).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn barcelona() -> Value {
    json!({
        "city": "Barcelona",
        "start_date": "2025-06-01",
        "end_date": "2025-06-02",
        "adults": 2,
        "budget": { "amount": 1500.0, "currency": "EUR" }
    })
}

#[tokio::test]
async fn test_itinerary_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let planner = planner(sample_sources(), ScriptedGenerator::new(NARRATIVE), dir.path());

    let (status, body) = post_itinerary(planner, barcelona()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "complete");
    let path = body["pdf_path"].as_str().unwrap();
    assert!(std::path::Path::new(path).exists());
    assert!(body["message"].as_str().unwrap().contains(path));
}

#[tokio::test]
async fn test_reversed_dates_are_a_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::new(NARRATIVE);
    let planner = planner(sample_sources(), generator.clone(), dir.path());
    let mut trip = barcelona();
    trip["end_date"] = json!("2025-05-28");

    let (status, body) = post_itinerary(planner, trip).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_source_failure_is_a_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let sources = Sources {
        hotels: Arc::new(FailingSource::<Hotel>::new()),
        ..sample_sources()
    };
    let planner = planner(sources, ScriptedGenerator::new(NARRATIVE), dir.path());

    let (status, body) = post_itinerary(planner, barcelona()).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["detail"], "Booking.com error 503 - Service Unavailable");
    assert!(pdf_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_empty_narrative_is_a_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let planner = planner(sample_sources(), ScriptedGenerator::new(""), dir.path());

    let (status, body) = post_itinerary(planner, barcelona()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().starts_with("Generation error"));
    assert!(pdf_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_missing_trip_field_is_a_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::new(NARRATIVE);
    let planner = planner(sample_sources(), generator.clone(), dir.path());
    let body = json!({ "start_date": "2025-06-01", "end_date": "2025-06-02", "adults": 2 });

    let (status, body) = post_itinerary(planner, body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));
    assert!(body["detail"].as_str().unwrap().contains("city"));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_camel_case_trip_fields_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let planner = planner(sample_sources(), ScriptedGenerator::new(NARRATIVE), dir.path());
    let body = json!({
        "city": "Barcelona",
        "startDate": "2025-06-01",
        "endDate": "2025-06-02",
        "adults": 2
    });

    let (status, body) = post_itinerary(planner, body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "complete");
}
