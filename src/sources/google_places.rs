//! Google Places restaurants source
//!
//! A text search for "restaurants in <city>" followed by one details request per
//! hit. The details requests are independent and run concurrently, results keep
//! the search order.

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument};

use super::{Source, http};
use crate::config::{RestaurantsConfig, require_api_key};
use crate::models::records::NoResults;
use crate::models::{Restaurant, TripRequest};
use crate::{Result, TripPlannerError};

const SERVICE: &str = "Google Places";
const DETAIL_FIELDS: &str = "name,formatted_address,rating,opening_hours,price_level,geometry";

pub struct GooglePlacesRestaurants {
    client: Client,
    api_key: String,
    base_url: String,
    max_results: usize,
}

impl GooglePlacesRestaurants {
    pub fn new(client: Client, config: &RestaurantsConfig) -> Result<Self> {
        Ok(Self {
            client,
            api_key: require_api_key(config.api_key.as_deref(), "GOOGLE_PLACES_API_KEY", SERVICE)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
        })
    }

    async fn details(&self, place_id: &str) -> Result<Restaurant> {
        let url = format!(
            "{}/details/json?place_id={}&fields={}&key={}",
            self.base_url,
            urlencoding::encode(place_id),
            DETAIL_FIELDS,
            urlencoding::encode(&self.api_key)
        );
        let response: DetailsResponse = http::get_json(SERVICE, self.client.get(url)).await?;
        check_status(&response.status, response.error_message.as_deref())?;

        response
            .result
            .map(PlaceDetails::into_restaurant)
            .ok_or_else(|| TripPlannerError::unexpected(SERVICE, format!("No details for place {place_id}")))
    }
}

#[async_trait]
impl Source for GooglePlacesRestaurants {
    type Record = Restaurant;

    #[instrument(skip(self, trip), fields(city = %trip.city))]
    async fn fetch(&self, trip: &TripRequest) -> Result<Vec<Restaurant>> {
        let query = format!("restaurants in {}", trip.city);
        let url = format!(
            "{}/textsearch/json?query={}&type=restaurant&rankby=prominence&key={}",
            self.base_url,
            urlencoding::encode(&query),
            urlencoding::encode(&self.api_key)
        );
        let search: TextSearchResponse = http::get_json(SERVICE, self.client.get(url)).await?;
        check_status(&search.status, search.error_message.as_deref())?;

        let place_ids: Vec<String> = search
            .results
            .into_iter()
            .take(self.max_results)
            .map(|r| r.place_id)
            .collect();

        if place_ids.is_empty() {
            info!("No restaurants found in {}", trip.city);
            return Ok(vec![Restaurant::no_results(&trip.city)]);
        }

        let restaurants = try_join_all(place_ids.iter().map(|id| self.details(id))).await?;
        info!("Found {} restaurants in {}", restaurants.len(), trip.city);
        Ok(restaurants)
    }
}

/// Google answers most failures with HTTP 200 and a status field
fn check_status(status: &str, error_message: Option<&str>) -> Result<()> {
    match status {
        "OK" | "ZERO_RESULTS" | "" => Ok(()),
        other => Err(TripPlannerError::upstream(
            SERVICE,
            200,
            error_message.map_or_else(|| other.to_string(), |m| format!("{other}: {m}")),
        )),
    }
}

/// Price level as "n/4 - label"
#[must_use]
pub fn price_level_label(level: u8) -> String {
    match level {
        0 => "0/4 - Free".to_string(),
        1 => "1/4 - Inexpensive".to_string(),
        2 => "2/4 - Moderate".to_string(),
        3 => "3/4 - Expensive".to_string(),
        4 => "4/4 - Very expensive".to_string(),
        _ => "Unknown".to_string(),
    }
}

#[derive(Debug, Deserialize)]
pub struct TextSearchResponse {
    #[serde(default)]
    pub status: String,
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct SearchHit {
    pub place_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DetailsResponse {
    #[serde(default)]
    pub status: String,
    pub error_message: Option<String>,
    pub result: Option<PlaceDetails>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub formatted_address: String,
    pub rating: Option<f64>,
    pub opening_hours: Option<OpeningHours>,
    pub price_level: Option<u8>,
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl PlaceDetails {
    #[must_use]
    pub fn into_restaurant(self) -> Restaurant {
        let location = self.geometry.and_then(|g| g.location);
        Restaurant {
            name: self.name,
            address: self.formatted_address,
            rating: self.rating,
            opening_hours: Some(self.opening_hours.map(|h| h.weekday_text).unwrap_or_default()),
            price_level: self.price_level.map(price_level_label),
            latitude: location.as_ref().map(|l| l.lat),
            longitude: location.as_ref().map(|l| l.lng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0/4 - Free")]
    #[case(2, "2/4 - Moderate")]
    #[case(4, "4/4 - Very expensive")]
    #[case(7, "Unknown")]
    fn test_price_level_label(#[case] level: u8, #[case] expected: &str) {
        assert_eq!(price_level_label(level), expected);
    }

    #[test]
    fn test_details_conversion() {
        let json = r#"{
            "status": "OK",
            "result": {
                "name": "Cal Pep",
                "formatted_address": "Plaça de les Olles, 8, Barcelona",
                "rating": 4.4,
                "price_level": 3,
                "opening_hours": {"weekday_text": ["Monday: Closed", "Tuesday: 1:00 - 3:45 PM"]},
                "geometry": {"location": {"lat": 41.3839, "lng": 2.1834}}
            }
        }"#;
        let response: DetailsResponse = serde_json::from_str(json).unwrap();
        let restaurant = response.result.unwrap().into_restaurant();

        assert_eq!(restaurant.name, "Cal Pep");
        assert_eq!(restaurant.price_level.as_deref(), Some("3/4 - Expensive"));
        assert_eq!(restaurant.opening_hours.as_ref().map(Vec::len), Some(2));
        assert_eq!(restaurant.latitude, Some(41.3839));
    }

    #[test]
    fn test_missing_hours_become_empty_list() {
        let response: DetailsResponse =
            serde_json::from_str(r#"{"status": "OK", "result": {"name": "Bar", "formatted_address": "x"}}"#).unwrap();
        let restaurant = response.result.unwrap().into_restaurant();
        assert_eq!(restaurant.opening_hours, Some(Vec::new()));
        assert!(restaurant.price_level.is_none());
    }

    #[test]
    fn test_denied_status_is_upstream_error() {
        let err = check_status("REQUEST_DENIED", Some("The provided API key is invalid.")).unwrap_err();
        assert!(err.is_upstream_error());
        assert!(err.to_string().contains("REQUEST_DENIED"));
        assert!(check_status("ZERO_RESULTS", None).is_ok());
    }
}
