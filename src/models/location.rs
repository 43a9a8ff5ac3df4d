//! Geographic coordinates and distances

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

/// A point on the map
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build coordinates only when both halves are known
    #[must_use]
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Self::new(latitude, longitude)),
            _ => None,
        }
    }

    /// Great-circle distance in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let from = HaversineLocation {
            latitude: self.latitude,
            longitude: self.longitude,
        };
        let to = HaversineLocation {
            latitude: other.latitude,
            longitude: other.longitude,
        };
        distance(from, to, Units::Kilometers)
    }

    /// Format as "lat, lon" with four decimals
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// `[longitude, latitude]`, the order GeoJSON style APIs expect
    #[must_use]
    pub fn lng_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_between_barcelona_landmarks() {
        let sagrada_familia = Coordinates::new(41.403_423, 2.174_611);
        let casa_mila = Coordinates::new(41.395_154, 2.161_851);
        let km = sagrada_familia.distance_km(&casa_mila);
        assert!(km > 1.2 && km < 1.6, "unexpected distance {km}");
    }

    #[test]
    fn test_from_parts_requires_both_halves() {
        assert!(Coordinates::from_parts(Some(1.0), None).is_none());
        assert_eq!(
            Coordinates::from_parts(Some(1.0), Some(2.0)),
            Some(Coordinates::new(1.0, 2.0))
        );
    }

    #[test]
    fn test_lng_lat_order() {
        let c = Coordinates::new(41.39, 2.16);
        assert_eq!(c.lng_lat(), [2.16, 41.39]);
        assert_eq!(c.format_coordinates(), "41.3900, 2.1600");
    }
}
