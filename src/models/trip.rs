//! The trip request that seeds a planning run

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Result, TripPlannerError};

/// Spending limit for the whole trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub amount: f64,
    pub currency: String,
}

impl std::fmt::Display for Budget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}

/// Trigger parameters for one itinerary. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub city: String,
    #[serde(alias = "startDate")]
    pub start_date: NaiveDate,
    #[serde(alias = "endDate")]
    pub end_date: NaiveDate,
    /// Number of adults travelling
    #[serde(alias = "adults")]
    pub party_size: u32,
    #[serde(default)]
    pub budget: Option<Budget>,
}

impl TripRequest {
    /// Create and validate a trip request
    pub fn new(
        city: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        party_size: u32,
        budget: Option<Budget>,
    ) -> Result<Self> {
        let request = Self {
            city: city.into().trim().to_string(),
            start_date,
            end_date,
            party_size,
            budget,
        };
        request.validate()?;
        Ok(request)
    }

    /// Check the invariants every downstream step relies on
    pub fn validate(&self) -> Result<()> {
        if self.city.trim().is_empty() {
            return Err(TripPlannerError::validation("City cannot be empty"));
        }

        if self.end_date < self.start_date {
            return Err(TripPlannerError::validation(format!(
                "End date {} is before start date {}",
                self.end_date, self.start_date
            )));
        }

        if self.party_size == 0 {
            return Err(TripPlannerError::validation("Party size must be at least 1"));
        }

        if let Some(budget) = &self.budget {
            if !budget.amount.is_finite() || budget.amount <= 0.0 {
                return Err(TripPlannerError::validation("Budget must be a positive amount"));
            }
            if budget.currency.trim().is_empty() {
                return Err(TripPlannerError::validation("Budget currency cannot be empty"));
            }
        }

        Ok(())
    }

    /// Number of calendar days covered, both ends included
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Dates in `YYYY-MM-DD` form, as the source APIs expect them
    #[must_use]
    pub fn start(&self) -> String {
        self.start_date.format("%Y-%m-%d").to_string()
    }

    #[must_use]
    pub fn end(&self) -> String {
        self.end_date.format("%Y-%m-%d").to_string()
    }
}
