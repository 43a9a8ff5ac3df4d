//! Ticketmaster discovery API events source

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{Source, http};
use crate::Result;
use crate::config::{EventsConfig, require_api_key};
use crate::models::records::NoResults;
use crate::models::{Event, TripRequest};

const SERVICE: &str = "Ticketmaster";

pub struct TicketmasterEvents {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TicketmasterEvents {
    pub fn new(client: Client, config: &EventsConfig) -> Result<Self> {
        Ok(Self {
            client,
            api_key: require_api_key(config.api_key.as_deref(), "TICKETMASTER_API_KEY", SERVICE)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Source for TicketmasterEvents {
    type Record = Event;

    #[instrument(skip(self, trip), fields(city = %trip.city))]
    async fn fetch(&self, trip: &TripRequest) -> Result<Vec<Event>> {
        let url = format!(
            "{}/events.json?apikey={}&city={}&startDateTime={}T00:00:00Z&endDateTime={}T23:59:59Z&sort=date,asc",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&trip.city),
            trip.start(),
            trip.end()
        );
        debug!("Requesting Ticketmaster events for {}", trip.city);

        let response: SearchResponse = http::get_json(SERVICE, self.client.get(url)).await?;
        let events = response.into_events(&trip.city);
        info!("Found {} events in {}", events.len(), trip.city);
        Ok(events)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "_embedded")]
    pub embedded: Option<EmbeddedEvents>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddedEvents {
    #[serde(default)]
    pub events: Vec<ApiEvent>,
}

#[derive(Debug, Deserialize)]
pub struct ApiEvent {
    pub name: String,
    #[serde(default)]
    pub url: String,
    pub dates: Option<EventDates>,
    #[serde(rename = "_embedded")]
    pub embedded: Option<EmbeddedVenues>,
}

#[derive(Debug, Deserialize)]
pub struct EventDates {
    pub start: Option<EventStart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStart {
    pub date_time: Option<String>,
    pub local_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddedVenues {
    #[serde(default)]
    pub venues: Vec<Venue>,
}

#[derive(Debug, Deserialize)]
pub struct Venue {
    pub name: Option<String>,
    pub location: Option<VenueLocation>,
}

/// Ticketmaster sends coordinates as strings
#[derive(Debug, Deserialize)]
pub struct VenueLocation {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl SearchResponse {
    /// Events in API order, or the placeholder when there are none
    #[must_use]
    pub fn into_events(self, city: &str) -> Vec<Event> {
        let events: Vec<Event> = self
            .embedded
            .map(|e| e.events)
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.into_event(city))
            .collect();

        if events.is_empty() {
            return vec![Event::no_results(city)];
        }
        events
    }
}

impl ApiEvent {
    fn into_event(self, city: &str) -> Event {
        let start_date = self
            .dates
            .and_then(|d| d.start)
            .and_then(|s| s.date_time.or(s.local_date))
            .unwrap_or_default();
        let venue = self.embedded.and_then(|e| e.venues.into_iter().next());
        let (latitude, longitude) = venue
            .as_ref()
            .and_then(|v| v.location.as_ref())
            .map_or((None, None), |l| {
                (
                    l.latitude.as_deref().and_then(|s| s.parse().ok()),
                    l.longitude.as_deref().and_then(|s| s.parse().ok()),
                )
            });

        Event {
            name: self.name,
            url: self.url,
            start_date,
            venue: venue.and_then(|v| v.name).unwrap_or_else(|| city.to_string()),
            latitude,
            longitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_conversion() {
        let json = r#"{
            "_embedded": {
                "events": [{
                    "name": "Primavera Sound",
                    "url": "https://www.ticketmaster.es/event/1",
                    "dates": {"start": {"localDate": "2025-06-01", "dateTime": "2025-06-01T18:00:00Z"}},
                    "_embedded": {"venues": [{
                        "name": "Parc del Forum",
                        "location": {"latitude": "41.4106", "longitude": "2.2217"}
                    }]}
                }]
            }
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let events = response.into_events("Barcelona");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].venue, "Parc del Forum");
        assert_eq!(events[0].start_date, "2025-06-01T18:00:00Z");
        assert_eq!(events[0].latitude, Some(41.4106));
        assert_eq!(events[0].longitude, Some(2.2217));
    }

    #[test]
    fn test_no_events_yields_placeholder() {
        let response: SearchResponse = serde_json::from_str(r#"{"page": {"totalElements": 0}}"#).unwrap();
        let events = response.into_events("Girona");

        assert_eq!(events.len(), 1);
        assert!(events[0].is_no_results());
        assert_eq!(events[0].venue, "Girona");
    }
}
