//! OpenMeteo weather source
//!
//! Resolves the trip city with the OpenMeteo geocoding API, then fetches the
//! daily forecast for the trip dates. No API key is required.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use tracing::{debug, info, instrument};

use super::{Source, http};
use crate::config::WeatherConfig;
use crate::models::{TripRequest, WeatherDay};
use crate::{Result, TripPlannerError};

const SERVICE: &str = "OpenMeteo";

pub struct OpenMeteoWeather {
    client: Client,
    geocoding_url: String,
    forecast_url: String,
}

impl OpenMeteoWeather {
    pub fn new(client: Client, config: &WeatherConfig) -> Self {
        Self {
            client,
            geocoding_url: config.geocoding_url.trim_end_matches('/').to_string(),
            forecast_url: config.forecast_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a city name to its best geocoding match
    #[instrument(skip(self))]
    pub async fn geocode(&self, city: &str) -> Result<openmeteo::GeocodingResult> {
        let url = format!(
            "{}/search?name={}&count=1&language=en&format=json",
            self.geocoding_url,
            urlencoding::encode(city)
        );
        debug!("OpenMeteo geocoding request URL: {}", url);

        let response: openmeteo::GeocodingResponse =
            http::get_json(SERVICE, self.client.get(url)).await?;

        response
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| TripPlannerError::validation(format!("Location '{city}' not found")))
    }
}

#[async_trait]
impl Source for OpenMeteoWeather {
    type Record = WeatherDay;

    #[instrument(skip(self, trip), fields(city = %trip.city))]
    async fn fetch(&self, trip: &TripRequest) -> Result<Vec<WeatherDay>> {
        let place = self.geocode(&trip.city).await?;

        let url = format!(
            "{}/forecast?latitude={}&longitude={}&daily=temperature_2m_max,temperature_2m_min,precipitation_probability_mean,weathercode&timezone=auto&start_date={}&end_date={}",
            self.forecast_url,
            place.latitude,
            place.longitude,
            trip.start(),
            trip.end()
        );
        debug!("OpenMeteo forecast request URL: {}", url);

        let response: openmeteo::ForecastResponse =
            http::get_json(SERVICE, self.client.get(url)).await?;

        let days = response.into_weather_days(&place.name);
        info!("Retrieved {} forecast days for {}", days.len(), place.name);

        if days.is_empty() {
            return Ok(vec![WeatherDay::no_forecast(trip.start_date, &place.name)]);
        }
        Ok(days)
    }
}

/// `OpenMeteo` API response structures and conversion utilities
pub mod openmeteo {
    use super::{NaiveDate, WeatherDay};
    use serde::Deserialize;

    /// Geocoding response from `OpenMeteo`
    #[derive(Debug, Deserialize)]
    pub struct GeocodingResponse {
        pub results: Option<Vec<GeocodingResult>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct GeocodingResult {
        pub name: String,
        pub latitude: f64,
        pub longitude: f64,
        pub country: Option<String>,
    }

    /// Daily forecast response from `OpenMeteo`
    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub daily: Option<DailyData>,
    }

    /// Daily weather data from `OpenMeteo`
    #[derive(Debug, Deserialize)]
    pub struct DailyData {
        pub time: Vec<String>,
        #[serde(rename = "temperature_2m_max")]
        pub temperature_max: Option<Vec<Option<f64>>>,
        #[serde(rename = "temperature_2m_min")]
        pub temperature_min: Option<Vec<Option<f64>>>,
        #[serde(rename = "precipitation_probability_mean")]
        pub precipitation_probability: Option<Vec<Option<f64>>>,
        #[serde(rename = "weathercode")]
        pub weather_code: Option<Vec<Option<u8>>>,
    }

    fn value_at<T: Copy>(values: &Option<Vec<Option<T>>>, index: usize) -> Option<T> {
        values.as_ref().and_then(|v| v.get(index).copied().flatten())
    }

    impl ForecastResponse {
        /// One record per forecast day. Days whose date cannot be parsed are skipped,
        /// missing measurements default to zero.
        #[must_use]
        pub fn into_weather_days(self, location: &str) -> Vec<WeatherDay> {
            let Some(daily) = self.daily else {
                return Vec::new();
            };

            daily
                .time
                .iter()
                .enumerate()
                .filter_map(|(i, time)| {
                    let date = NaiveDate::parse_from_str(time, "%Y-%m-%d").ok()?;
                    let condition = value_at(&daily.weather_code, i)
                        .map_or("Unknown", weather_code_to_description);
                    Some(WeatherDay {
                        date,
                        max_temp: value_at(&daily.temperature_max, i).unwrap_or(0.0),
                        min_temp: value_at(&daily.temperature_min, i).unwrap_or(0.0),
                        precipitation_chance: value_at(&daily.precipitation_probability, i)
                            .unwrap_or(0.0),
                        condition: condition.to_string(),
                        location: location.to_string(),
                    })
                })
                .collect()
        }
    }

    /// Convert `OpenMeteo` weather code to human-readable description
    #[must_use]
    pub fn weather_code_to_description(code: u8) -> &'static str {
        match code {
            0 => "Clear sky",
            1 => "Mainly clear",
            2 => "Partly cloudy",
            3 => "Overcast",
            45 => "Foggy",
            48 => "Depositing rime fog",
            51 => "Light drizzle",
            53 => "Moderate drizzle",
            55 => "Dense drizzle",
            56 => "Light freezing drizzle",
            57 => "Dense freezing drizzle",
            61 => "Slight rain",
            63 => "Moderate rain",
            65 => "Heavy rain",
            66 => "Light freezing rain",
            67 => "Heavy freezing rain",
            71 => "Slight snow fall",
            73 => "Moderate snow fall",
            75 => "Heavy snow fall",
            77 => "Snow grains",
            80 => "Slight rain showers",
            81 => "Moderate rain showers",
            82 => "Violent rain showers",
            85 => "Slight snow showers",
            86 => "Heavy snow showers",
            95 => "Thunderstorm",
            96 => "Thunderstorm with slight hail",
            99 => "Thunderstorm with heavy hail",
            _ => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::openmeteo::*;

    #[test]
    fn test_forecast_conversion() {
        let json = r#"{
            "daily": {
                "time": ["2025-06-01", "2025-06-02"],
                "temperature_2m_max": [28.1, null],
                "temperature_2m_min": [19.4, 18.0],
                "precipitation_probability_mean": [5, 60],
                "weathercode": [1, 63]
            }
        }"#;
        let response: ForecastResponse = serde_json::from_str(json).unwrap();
        let days = response.into_weather_days("Barcelona");

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].condition, "Mainly clear");
        assert_eq!(days[0].max_temp, 28.1);
        assert_eq!(days[1].max_temp, 0.0);
        assert_eq!(days[1].precipitation_chance, 60.0);
        assert_eq!(days[1].condition, "Moderate rain");
        assert_eq!(days[1].location, "Barcelona");
    }

    #[test]
    fn test_missing_daily_block_yields_no_days() {
        let response: ForecastResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_weather_days("Nowhere").is_empty());
    }

    #[test]
    fn test_weather_code_to_description() {
        assert_eq!(weather_code_to_description(0), "Clear sky");
        assert_eq!(weather_code_to_description(95), "Thunderstorm");
        assert_eq!(weather_code_to_description(42), "Unknown");
    }
}
