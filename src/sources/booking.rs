//! Booking.com (RapidAPI) hotels source

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{Source, http};
use crate::Result;
use crate::config::{HotelsConfig, require_api_key};
use crate::models::records::NoResults;
use crate::models::{Hotel, TripRequest};

const SERVICE: &str = "Booking.com";

pub struct BookingHotels {
    client: Client,
    api_key: String,
    host: String,
    currency: String,
}

impl BookingHotels {
    pub fn new(client: Client, config: &HotelsConfig) -> Result<Self> {
        Ok(Self {
            client,
            api_key: require_api_key(config.api_key.as_deref(), "RAPIDAPI_KEY", SERVICE)?,
            host: config.host.clone(),
            currency: config.currency.clone(),
        })
    }

    fn get(&self, path_and_query: String) -> RequestBuilder {
        self.client
            .get(format!("https://{}/api/v1/hotels/{}", self.host, path_and_query))
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
    }

    async fn destination_id(&self, city: &str) -> Result<Option<String>> {
        let response: DestinationResponse = http::get_json(
            SERVICE,
            self.get(format!(
                "searchDestination?query={}&languagecode=en-us",
                urlencoding::encode(city)
            )),
        )
        .await?;
        Ok(response.data.into_iter().next().map(|d| d.dest_id))
    }
}

#[async_trait]
impl Source for BookingHotels {
    type Record = Hotel;

    #[instrument(skip(self, trip), fields(city = %trip.city))]
    async fn fetch(&self, trip: &TripRequest) -> Result<Vec<Hotel>> {
        let Some(dest_id) = self.destination_id(&trip.city).await? else {
            info!("Booking.com has no destination for {}", trip.city);
            return Ok(vec![Hotel::no_results(&trip.city)]);
        };
        debug!("Resolved {} to dest_id {}", trip.city, dest_id);

        let query = format!(
            "searchHotels?dest_id={}&search_type=CITY&arrival_date={}&departure_date={}&adults={}&room_qty=1&page_number=1&units=metric&temperature_unit=c&languagecode=en-us&currency_code={}",
            urlencoding::encode(&dest_id),
            trip.start(),
            trip.end(),
            trip.party_size,
            urlencoding::encode(&self.currency)
        );
        let response: SearchResponse = http::get_json(SERVICE, self.get(query)).await?;

        let hotels = response.into_hotels(&trip.city);
        info!("Found {} hotels in {}", hotels.len(), trip.city);
        Ok(hotels)
    }
}

#[derive(Debug, Deserialize)]
pub struct DestinationResponse {
    #[serde(default)]
    pub data: Vec<Destination>,
}

#[derive(Debug, Deserialize)]
pub struct Destination {
    #[serde(deserialize_with = "string_or_number")]
    pub dest_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub hotels: Vec<ApiHotel>,
}

#[derive(Debug, Deserialize)]
pub struct ApiHotel {
    pub property: Property,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: u64,
    pub name: String,
    pub price_breakdown: Option<PriceBreakdown>,
    pub property_class: Option<f64>,
    pub checkin: Option<TimeWindow>,
    pub checkout: Option<TimeWindow>,
    pub review_score: Option<f64>,
    pub review_score_word: Option<String>,
    pub review_count: Option<u64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub gross_price: Option<Price>,
}

#[derive(Debug, Deserialize)]
pub struct Price {
    pub value: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub from_time: Option<String>,
    pub until_time: Option<String>,
}

impl TimeWindow {
    fn describe(&self) -> Option<String> {
        match (&self.from_time, &self.until_time) {
            (Some(from), Some(until)) if !from.is_empty() && !until.is_empty() => {
                Some(format!("From {from} to {until}"))
            }
            _ => None,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unexpected dest_id {other}"))),
    }
}

impl SearchResponse {
    /// Hotels in API order, or the placeholder when there are none
    #[must_use]
    pub fn into_hotels(self, city: &str) -> Vec<Hotel> {
        let hotels: Vec<Hotel> = self
            .data
            .map(|d| d.hotels)
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.property.into_hotel(city))
            .collect();

        if hotels.is_empty() {
            return vec![Hotel::no_results(city)];
        }
        hotels
    }
}

impl Property {
    fn into_hotel(self, city: &str) -> Hotel {
        let price = self
            .price_breakdown
            .and_then(|p| p.gross_price)
            .and_then(|p| {
                let value = p.value.filter(|v| *v > 0.0)?;
                Some(format!(
                    "{value:.2} {} (Total for stay)",
                    p.currency.unwrap_or_default()
                ))
            });
        let review = self.review_score.filter(|s| *s > 0.0).map(|score| {
            format!(
                "{score} - {} ({} reviews)",
                self.review_score_word.unwrap_or_default(),
                self.review_count.unwrap_or(0)
            )
        });

        Hotel {
            name: self.name,
            address: city.to_string(),
            price,
            stars: self.property_class.filter(|s| *s > 0.0),
            url: Some(format!("https://www.booking.com/hotel/{}.html", self.id)),
            review,
            check_in: self.checkin.as_ref().and_then(TimeWindow::describe),
            check_out: self.checkout.as_ref().and_then(TimeWindow::describe),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}
