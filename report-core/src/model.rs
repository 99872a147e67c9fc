use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::icon::Icon;

/// A point on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Location used whenever the real one cannot be determined or named.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackLocation {
    pub name: &'static str,
    pub coordinates: Coordinates,
}

pub const FALLBACK_LOCATION: FallbackLocation = FallbackLocation {
    name: "London",
    coordinates: Coordinates::new(51.5074, -0.1278),
};

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRequest {
    pub coordinates: Coordinates,
    pub place: Option<String>,
}

impl WeatherRequest {
    pub fn new(coordinates: Coordinates, place: impl Into<String>) -> Self {
        Self { coordinates, place: Some(place.into()) }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_LOCATION.coordinates, FALLBACK_LOCATION.name)
    }
}

/// Provider-agnostic current conditions.
///
/// Temperature (°C) and wind speed are already rounded to one decimal place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature: f64,
    pub wind_speed: Option<f64>,
    pub condition_code: Option<i64>,
    pub icon: Icon,
    pub observed_at: Option<DateTime<Utc>>,
}

/// Rounds to one decimal place, halves toward +∞ (-2.25 → -2.2).
///
/// Never returns negative zero, so `-0.04` formats as `0.0`.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0 + 0.5).floor() / 10.0 + 0.0
}
