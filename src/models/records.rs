//! Records returned by the travel data sources
//!
//! Every source answers with an ordered list of its record type. When a source
//! finds nothing it returns a single placeholder record carrying a reserved name
//! instead of an empty list, so the planning prompt always has something to show
//! for every section. Transport failures are errors, never placeholders.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::location::Coordinates;

pub const NO_FORECAST: &str = "No forecast available for these dates";
pub const NO_EVENTS: &str = "No special events scheduled for these dates";
pub const NO_ATTRACTIONS: &str = "No tourist attractions found";
pub const NO_HOTELS: &str = "No available accommodation found";
pub const NO_RESTAURANTS: &str = "No restaurants found";

/// Records that can stand in for "nothing found"
pub trait NoResults {
    /// Placeholder record for a city with no results
    fn no_results(city: &str) -> Self;

    /// True if this record is the placeholder, not real data
    fn is_no_results(&self) -> bool;
}

/// True when a result list holds only the placeholder record
pub fn is_empty_result<R: NoResults>(records: &[R]) -> bool {
    records.iter().all(NoResults::is_no_results)
}

/// Daily forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherDay {
    pub date: NaiveDate,
    /// Maximum temperature in Celsius
    pub max_temp: f64,
    /// Minimum temperature in Celsius
    pub min_temp: f64,
    /// Mean precipitation probability (0-100)
    pub precipitation_chance: f64,
    pub condition: String,
    /// Resolved place name
    pub location: String,
}

impl WeatherDay {
    /// Placeholder for a forecast that returned no days
    #[must_use]
    pub fn no_forecast(date: NaiveDate, location: &str) -> Self {
        Self {
            date,
            max_temp: 0.0,
            min_temp: 0.0,
            precipitation_chance: 0.0,
            condition: NO_FORECAST.to_string(),
            location: location.to_string(),
        }
    }

    pub fn is_no_results(&self) -> bool {
        self.condition == NO_FORECAST
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub name: String,
    pub url: String,
    pub start_date: String,
    pub venue: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl NoResults for Event {
    fn no_results(city: &str) -> Self {
        Self {
            name: NO_EVENTS.to_string(),
            url: String::new(),
            start_date: String::new(),
            venue: city.to_string(),
            latitude: None,
            longitude: None,
        }
    }

    fn is_no_results(&self) -> bool {
        self.name == NO_EVENTS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attraction {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Rating such as "4.5/5"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Attraction {
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}

impl NoResults for Attraction {
    fn no_results(_city: &str) -> Self {
        Self {
            name: NO_ATTRACTIONS.to_string(),
            description: None,
            address: None,
            rating: None,
            url: None,
            latitude: None,
            longitude: None,
        }
    }

    fn is_no_results(&self) -> bool {
        self.name == NO_ATTRACTIONS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub name: String,
    pub address: String,
    /// Total price for the stay, e.g. "412.50 EUR (Total for stay)"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stars: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Review summary, e.g. "8.7 - Excellent (1520 reviews)"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Hotel {
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}

impl NoResults for Hotel {
    fn no_results(city: &str) -> Self {
        Self {
            name: NO_HOTELS.to_string(),
            address: city.to_string(),
            price: None,
            stars: None,
            url: None,
            review: None,
            check_in: None,
            check_out: None,
            latitude: None,
            longitude: None,
        }
    }

    fn is_no_results(&self) -> bool {
        self.name == NO_HOTELS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// One entry per weekday, e.g. "Monday: 1:00 - 11:00 PM"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<Vec<String>>,
    /// Price level such as "2/4 - Moderate"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl NoResults for Restaurant {
    fn no_results(city: &str) -> Self {
        Self {
            name: NO_RESTAURANTS.to_string(),
            address: city.to_string(),
            rating: None,
            opening_hours: None,
            price_level: None,
            latitude: None,
            longitude: None,
        }
    }

    fn is_no_results(&self) -> bool {
        self.name == NO_RESTAURANTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_recognized_by_name() {
        let placeholder = Event::no_results("Lisbon");
        assert!(placeholder.is_no_results());
        assert_eq!(placeholder.venue, "Lisbon");

        let real = Event {
            name: "Fado night".to_string(),
            url: "https://example.com".to_string(),
            start_date: "2025-06-01T20:00:00Z".to_string(),
            venue: "Clube de Fado".to_string(),
            latitude: None,
            longitude: None,
        };
        assert!(!real.is_no_results());
        assert!(is_empty_result(&[placeholder]));
        assert!(!is_empty_result(&[real]));
    }

    #[test]
    fn test_optional_fields_are_omitted_from_json() {
        let hotel = Hotel::no_results("Porto");
        let json = serde_json::to_value(&hotel).unwrap();
        assert_eq!(json["name"], NO_HOTELS);
        assert_eq!(json["address"], "Porto");
        assert!(json.get("price").is_none());
    }

    #[test]
    fn test_weather_serializes_camel_case() {
        let day = WeatherDay {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            max_temp: 28.4,
            min_temp: 19.0,
            precipitation_chance: 10.0,
            condition: "Mainly clear".to_string(),
            location: "Barcelona".to_string(),
        };
        let json = serde_json::to_value(&day).unwrap();
        assert_eq!(json["maxTemp"], 28.4);
        assert_eq!(json["precipitationChance"], 10.0);
        assert_eq!(json["date"], "2025-06-01");
        assert!(!day.is_no_results());
    }
}
