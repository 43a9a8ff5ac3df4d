//! Configuration management for the trip planner
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TripPlannerError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the trip planner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TripPlannerConfig {
    /// Shared HTTP client settings
    pub http: HttpConfig,
    /// OpenMeteo geocoding and forecast endpoints
    pub weather: WeatherConfig,
    /// Ticketmaster discovery API
    pub events: EventsConfig,
    /// TripAdvisor (RapidAPI) attractions
    pub attractions: AttractionsConfig,
    /// Booking.com (RapidAPI) hotels
    pub hotels: HotelsConfig,
    /// Google Places restaurants
    pub restaurants: RestaurantsConfig,
    /// OpenRouteService route estimates
    pub routing: RoutingConfig,
    /// Text generation service
    pub llm: LlmConfig,
    /// Document output
    pub output: OutputConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP client settings shared by every adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// User agent sent with every request
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub geocoding_url: String,
    pub forecast_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Ticketmaster API key (falls back to `TICKETMASTER_API_KEY`)
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractionsConfig {
    /// RapidAPI key (falls back to `RAPIDAPI_KEY`)
    pub api_key: Option<String>,
    pub host: String,
    /// Maximum number of attractions enriched with details
    pub max_results: usize,
    /// Pause after every detail request, in milliseconds
    pub detail_delay_ms: u64,
    /// TripAdvisor language code
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotelsConfig {
    /// RapidAPI key (falls back to `RAPIDAPI_KEY`)
    pub api_key: Option<String>,
    pub host: String,
    /// Currency prices are quoted in
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestaurantsConfig {
    /// Google Places key (falls back to `GOOGLE_PLACES_API_KEY`)
    pub api_key: Option<String>,
    pub base_url: String,
    /// Maximum number of restaurants enriched with details
    pub max_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// OpenRouteService key (falls back to `OPENROUTESERVICE_API_KEY`).
    /// Without a key no routes are added to the prompt.
    pub api_key: Option<String>,
    pub base_url: String,
    /// Number of hotel / nearest attraction pairs to route
    pub max_pairs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key (falls back to `OPENAI_API_KEY`)
    pub api_key: Option<String>,
    /// Base URL of an OpenAI compatible API
    pub base_url: String,
    pub model: String,
    /// System instructions prepended to the planning prompt
    pub instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory itinerary documents are written to
    pub directory: PathBuf,
    /// Title printed at the top of every itinerary
    pub title: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

/// Instructions given to the text generation service. They define the markup the
/// document renderer understands.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a local activities and travel expert. \
Analyze the weather data, attractions, restaurants, events and hotels to plan the best \
activities and travel for the user. Give the user a detailed plan of the activities and travel.

Format the plan as plain text using only these conventions:
- One heading per day on its own line, written as **DAY 1 - Title**, **DAY 2 - Title**, ...
- Other section headings on their own line, written as **TITLE**
- A line containing only --- between days
- Details as bullet lines starting with \"• \", written as • Label: value
- Use **text** inside sentences to highlight names";

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: format!("tripplanner/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://geocoding-api.open-meteo.com/v1".to_string(),
            forecast_url: "https://api.open-meteo.com/v1".to_string(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://app.ticketmaster.com/discovery/v2".to_string(),
        }
    }
}

impl Default for AttractionsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            host: "tripadvisor-com1.p.rapidapi.com".to_string(),
            max_results: 15,
            detail_delay_ms: 300,
            language: "en_US".to_string(),
        }
    }
}

impl Default for HotelsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            host: "booking-com15.p.rapidapi.com".to_string(),
            currency: "EUR".to_string(),
        }
    }
}

impl Default for RestaurantsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://maps.googleapis.com/maps/api/place".to_string(),
            max_results: 15,
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openrouteservice.org/v2".to_string(),
            max_pairs: 3,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o".to_string(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("tmp"),
            title: "Personalized Travel Itinerary".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl TripPlannerConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRIPPLANNER_LLM__MODEL=gpt-4o-mini overrides llm.model
        builder = builder.add_source(
            Environment::with_prefix("TRIPPLANNER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: TripPlannerConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripplanner").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.timeout_seconds == 0 || self.http.timeout_seconds > 300 {
            return Err(TripPlannerError::config("HTTP timeout must be between 1 and 300 seconds").into());
        }

        if self.attractions.max_results == 0 || self.attractions.max_results > 50 {
            return Err(TripPlannerError::config("Attraction results must be between 1 and 50").into());
        }

        if self.attractions.detail_delay_ms > 10_000 {
            return Err(TripPlannerError::config(
                "Attraction detail delay cannot exceed 10000 ms"
            ).into());
        }

        if self.restaurants.max_results == 0 || self.restaurants.max_results > 20 {
            return Err(TripPlannerError::config("Restaurant results must be between 1 and 20").into());
        }

        if self.routing.max_pairs > 10 {
            return Err(TripPlannerError::config("Route pairs cannot exceed 10").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TripPlannerError::config(
                format!("Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_log_levels.join(", ")
                )
            ).into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TripPlannerError::config(
                format!("Invalid log format '{}'. Must be one of: {}",
                    self.logging.format,
                    valid_log_formats.join(", ")
                )
            ).into());
        }

        let urls = [
            ("weather.geocoding_url", &self.weather.geocoding_url),
            ("weather.forecast_url", &self.weather.forecast_url),
            ("events.base_url", &self.events.base_url),
            ("restaurants.base_url", &self.restaurants.base_url),
            ("routing.base_url", &self.routing.base_url),
            ("llm.base_url", &self.llm.base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TripPlannerError::config(
                    format!("{name} must be a valid HTTP or HTTPS URL")
                ).into());
            }
        }

        if self.llm.model.trim().is_empty() {
            return Err(TripPlannerError::config("llm.model cannot be empty").into());
        }

        if self.output.directory.as_os_str().is_empty() {
            return Err(TripPlannerError::config("output.directory cannot be empty").into());
        }

        Ok(())
    }
}

/// Resolve an API key from configuration, falling back to a conventional
/// environment variable.
pub fn resolve_api_key(configured: Option<&str>, env_var: &str) -> Option<String> {
    configured
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok())
        .filter(|key| !key.trim().is_empty())
}

/// Like [`resolve_api_key`], but a missing key is a configuration error.
pub fn require_api_key(
    configured: Option<&str>,
    env_var: &str,
    service: &str,
) -> crate::Result<String> {
    resolve_api_key(configured, env_var).ok_or_else(|| {
        TripPlannerError::config(format!(
            "Missing API key for {service}. Set it in the config file or via {env_var}"
        ))
    })
}
