//! Error types and handling for the trip planner

use thiserror::Error;

/// Main error type for the trip planner
#[derive(Error, Debug)]
pub enum TripPlannerError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// An external service answered with a non-success status code
    #[error("{service} error {status} - {message}")]
    Upstream {
        service: String,
        status: u16,
        message: String,
    },

    /// The request was sent but no response came back
    #[error("No response received from {service}: {message}")]
    NoResponse { service: String, message: String },

    /// Any other failure while talking to an external service
    #[error("Unexpected error from {service}: {message}")]
    Unexpected { service: String, message: String },

    /// A step ran before one of its declared prerequisites produced output
    #[error("Missing output of step '{step}' required by '{required_by}'")]
    MissingDependency { step: String, required_by: String },

    /// A step identifier produced output twice in one run
    #[error("Step '{step}' already produced output in this run")]
    DuplicateStep { step: String },

    /// A step's stored output does not have the shape a consumer expects
    #[error("Step '{step}' did not produce {expected}")]
    StepOutput { step: String, expected: String },

    /// Text generation failures
    #[error("Generation error: {message}")]
    Generation { message: String },

    /// Document encoding failures
    #[error("Render error: {message}")]
    Render { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl TripPlannerError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new upstream status error
    pub fn upstream<S: Into<String>, M: Into<String>>(service: S, status: u16, message: M) -> Self {
        Self::Upstream {
            service: service.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a new unexpected service error
    pub fn unexpected<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::Unexpected {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn missing_dependency<S: Into<String>, R: Into<String>>(step: S, required_by: R) -> Self {
        Self::MissingDependency {
            step: step.into(),
            required_by: required_by.into(),
        }
    }

    pub fn step_output<S: Into<String>, E: Into<String>>(step: S, expected: E) -> Self {
        Self::StepOutput {
            step: step.into(),
            expected: expected.into(),
        }
    }

    /// Create a new generation error
    pub fn generation<S: Into<String>>(message: S) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Create a new render error
    pub fn render<S: Into<String>>(message: S) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Classify a transport failure reported by `reqwest`.
    ///
    /// Status errors keep their code, connect/timeout/request failures count as
    /// "no response", everything else (including undecodable bodies) is unexpected.
    pub fn from_reqwest<S: Into<String>>(service: S, err: reqwest::Error) -> Self {
        let service = service.into();
        if let Some(status) = err.status() {
            let reason = status.canonical_reason().unwrap_or("Unknown status").to_string();
            Self::upstream(service, status.as_u16(), reason)
        } else if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::NoResponse {
                service,
                message: err.to_string(),
            }
        } else {
            Self::unexpected(service, err.to_string())
        }
    }

    /// True for failures caused by the caller's input
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, TripPlannerError::Validation { .. })
    }

    /// True for failures reported by (or while reaching) an external service
    #[must_use]
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            TripPlannerError::Upstream { .. }
                | TripPlannerError::NoResponse { .. }
                | TripPlannerError::Unexpected { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TripPlannerError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            TripPlannerError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TripPlannerError::Upstream { .. }
            | TripPlannerError::NoResponse { .. }
            | TripPlannerError::Unexpected { .. } => {
                format!("Unable to fetch travel data: {self}")
            }
            TripPlannerError::MissingDependency { .. }
            | TripPlannerError::DuplicateStep { .. }
            | TripPlannerError::StepOutput { .. } => {
                format!("Internal pipeline error: {self}")
            }
            TripPlannerError::Generation { .. } => {
                "The itinerary text could not be generated. Please try again.".to_string()
            }
            TripPlannerError::Render { .. } | TripPlannerError::Io { .. } => {
                "Writing the itinerary document failed. Please check the output directory."
                    .to_string()
            }
        }
    }
}
