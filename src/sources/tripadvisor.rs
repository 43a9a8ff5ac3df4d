//! TripAdvisor (RapidAPI) attractions source
//!
//! Three stages: resolve the city to a TripAdvisor geo id, search attractions for
//! that geo id, then look up each attraction's details to get its coordinates.
//! The detail lookups run strictly one at a time with a fixed pause in between,
//! the RapidAPI plan rejects bursts.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::{Source, http};
use crate::Result;
use crate::config::{AttractionsConfig, require_api_key};
use crate::models::records::NoResults;
use crate::models::{Attraction, Coordinates, TripRequest};

const SERVICE: &str = "TripAdvisor";

pub struct TripAdvisorAttractions {
    client: Client,
    api_key: String,
    host: String,
    max_results: usize,
    detail_delay: Duration,
    language: String,
}

impl TripAdvisorAttractions {
    pub fn new(client: Client, config: &AttractionsConfig) -> Result<Self> {
        Ok(Self {
            client,
            api_key: require_api_key(config.api_key.as_deref(), "RAPIDAPI_KEY", SERVICE)?,
            host: config.host.clone(),
            max_results: config.max_results,
            detail_delay: Duration::from_millis(config.detail_delay_ms),
            language: config.language.clone(),
        })
    }

    fn get(&self, path_and_query: String) -> RequestBuilder {
        self.client
            .get(format!("https://{}/{}", self.host, path_and_query))
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
    }

    async fn geo_id(&self, city: &str) -> Result<Option<String>> {
        let body: Value = http::get_json(
            SERVICE,
            self.get(format!(
                "auto-complete?query={}&lang={}",
                urlencoding::encode(city),
                self.language
            )),
        )
        .await?;
        Ok(find_geo_id(&body))
    }

    async fn search(&self, geo_id: &str, trip: &TripRequest) -> Result<Vec<Value>> {
        let body: Value = http::get_json(
            SERVICE,
            self.get(format!(
                "attractions/search?geoId={}&lang={}&startDate={}&endDate={}",
                urlencoding::encode(geo_id),
                self.language,
                trip.start(),
                trip.end()
            )),
        )
        .await?;

        Ok(body
            .pointer("/data/attractions")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// Coordinates of one attraction. Failures are logged and treated as unknown.
    async fn coordinates(&self, content_id: &str, trip: &TripRequest) -> Option<Coordinates> {
        let request = self.get(format!(
            "attractions/details?contentId={}&units=miles&startDate={}&endDate={}",
            urlencoding::encode(content_id),
            trip.start(),
            trip.end()
        ));

        match http::get_json::<Value>(SERVICE, request).await {
            Ok(detail) => geo_point(&detail),
            Err(e) => {
                warn!("Failed to fetch details for contentId {}: {}", content_id, e);
                None
            }
        }
    }
}

#[async_trait]
impl Source for TripAdvisorAttractions {
    type Record = Attraction;

    #[instrument(skip(self, trip), fields(city = %trip.city))]
    async fn fetch(&self, trip: &TripRequest) -> Result<Vec<Attraction>> {
        let Some(geo_id) = self.geo_id(&trip.city).await? else {
            info!("No TripAdvisor location for {}", trip.city);
            let mut placeholder = Attraction::no_results(&trip.city);
            placeholder.description = Some(format!(
                "Could not resolve a TripAdvisor location for \"{}\"",
                trip.city
            ));
            return Ok(vec![placeholder]);
        };
        debug!("Resolved {} to geoId {}", trip.city, geo_id);

        let candidates: Vec<(String, Value)> = self
            .search(&geo_id, trip)
            .await?
            .into_iter()
            .take(self.max_results)
            .filter_map(|item| content_id(&item).map(|id| (id, item)))
            .collect();

        let enriched = one_at_a_time(candidates, self.detail_delay, |(id, item)| async move {
            self.coordinates(&id, trip)
                .await
                .map(|coordinates| to_attraction(&item, coordinates))
        })
        .await;

        let attractions: Vec<Attraction> = enriched.into_iter().flatten().collect();
        info!("Found {} attractions with coordinates in {}", attractions.len(), trip.city);

        if attractions.is_empty() {
            return Ok(vec![Attraction::no_results(&trip.city)]);
        }
        Ok(attractions)
    }
}

/// Run `lookup` for every item, one after another, pausing `delay` between calls
pub async fn one_at_a_time<T, O, F, Fut>(items: Vec<T>, delay: Duration, mut lookup: F) -> Vec<O>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = O>,
{
    let total = items.len();
    let mut results = Vec::with_capacity(total);
    for (index, item) in items.into_iter().enumerate() {
        results.push(lookup(item).await);
        if index + 1 < total {
            tokio::time::sleep(delay).await;
        }
    }
    results
}

fn as_param(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First typeahead result that is a location with a geo id
fn find_geo_id(body: &Value) -> Option<String> {
    body.get("data")?.as_array()?.iter().find_map(|item| {
        let is_location = item["__typename"] == "AppPresentation_TypeaheadResult"
            && item["trackingItems"]["dataType"] == "LOCATION";
        if is_location { as_param(&item["geoId"]) } else { None }
    })
}

fn content_id(item: &Value) -> Option<String> {
    item.pointer("/cardLink/route/params/contentId").and_then(as_param)
}

fn geo_point(detail: &Value) -> Option<Coordinates> {
    let section = detail
        .pointer("/data/sections")?
        .as_array()?
        .iter()
        .find(|s| s["__typename"] == "AppPresentation_PoiLocationV2")?;
    let point = section.pointer("/address/geoPoint")?;
    Some(Coordinates::new(
        point.get("latitude")?.as_f64()?,
        point.get("longitude")?.as_f64()?,
    ))
}

fn to_attraction(item: &Value, coordinates: Coordinates) -> Attraction {
    let text = |pointer: &str| {
        item.pointer(pointer)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    Attraction {
        name: text("/cardTitle/string").unwrap_or_else(|| "Unnamed".to_string()),
        description: text("/descriptiveText/text"),
        address: text("/distance/text"),
        rating: item
            .pointer("/bubbleRating/rating")
            .and_then(Value::as_f64)
            .map(|r| format!("{r}/5")),
        url: text("/cardLink/route/url"),
        latitude: Some(coordinates.latitude),
        longitude: Some(coordinates.longitude),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;
    use tokio::time::Instant;

    #[test]
    fn test_find_geo_id_skips_non_locations() {
        let body = json!({"data": [
            {"__typename": "AppPresentation_TypeaheadResult", "trackingItems": {"dataType": "ATTRACTION"}, "geoId": 1},
            {"__typename": "AppPresentation_TypeaheadResult", "trackingItems": {"dataType": "LOCATION"}, "geoId": 187497},
        ]});
        assert_eq!(find_geo_id(&body).as_deref(), Some("187497"));
        assert_eq!(find_geo_id(&json!({"data": []})), None);
    }

    #[test]
    fn test_attraction_from_search_item_and_detail() {
        let item = json!({
            "cardTitle": {"string": "Sagrada Familia"},
            "descriptiveText": {"text": "Basilica"},
            "distance": {"text": "Eixample"},
            "bubbleRating": {"rating": 4.5},
            "cardLink": {"route": {"url": "/Attraction_Review-g187497", "params": {"contentId": "190166"}}}
        });
        let detail = json!({"data": {"sections": [
            {"__typename": "AppPresentation_PoiOverview"},
            {"__typename": "AppPresentation_PoiLocationV2",
             "address": {"geoPoint": {"latitude": 41.4036, "longitude": 2.1744}}}
        ]}});

        assert_eq!(content_id(&item).as_deref(), Some("190166"));
        let coordinates = geo_point(&detail).unwrap();
        let attraction = to_attraction(&item, coordinates);

        assert_eq!(attraction.name, "Sagrada Familia");
        assert_eq!(attraction.rating.as_deref(), Some("4.5/5"));
        assert_eq!(attraction.address.as_deref(), Some("Eixample"));
        assert_eq!(attraction.latitude, Some(41.4036));
    }

    #[test]
    fn test_detail_without_location_section() {
        let detail = json!({"data": {"sections": [{"__typename": "AppPresentation_PoiOverview"}]}});
        assert!(geo_point(&detail).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookups_run_one_at_a_time_with_delay() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let starts = Arc::new(Mutex::new(Vec::new()));

        let results = one_at_a_time(vec![1, 2, 3], Duration::from_millis(300), |n| {
            let in_flight = in_flight.clone();
            let max_in_flight = max_in_flight.clone();
            let starts = starts.clone();
            async move {
                starts.lock().await.push(Instant::now());
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                n * 10
            }
        })
        .await;

        assert_eq!(results, vec![10, 20, 30]);
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);

        let starts = starts.lock().await;
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(350));
        }
    }
}
