//! Condition code → icon tables.
//!
//! Each provider has its own code space, so each gets its own table. Both
//! are pure: a code always maps to the same icon.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Clear,
    #[default]
    PartlyCloudy,
    ScatteredClouds,
    Overcast,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
}

impl Icon {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Clear => "☀️",
            Self::PartlyCloudy => "🌤️",
            Self::ScatteredClouds => "⛅",
            Self::Overcast => "☁️",
            Self::Fog => "🌫️",
            Self::Drizzle => "🌦️",
            Self::Rain => "🌧️",
            Self::Snow => "❄️",
            Self::Thunderstorm => "⛈️",
        }
    }

    /// OpenWeather condition ids, grouped by hundreds.
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_openweather_id(id: Option<i64>) -> Self {
        match id {
            Some(200..=299) => Self::Thunderstorm,
            Some(300..=399) => Self::Drizzle,
            Some(500..=599) => Self::Rain,
            Some(600..=699) => Self::Snow,
            Some(700..=799) => Self::Fog,
            Some(800) => Self::Clear,
            Some(801) => Self::PartlyCloudy,
            Some(802) => Self::ScatteredClouds,
            Some(803 | 804) => Self::Overcast,
            _ => Self::default(),
        }
    }

    /// WMO weather interpretation codes as used by Open-Meteo.
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => Self::Clear,
            Some(1 | 2) => Self::PartlyCloudy,
            Some(3) => Self::Overcast,
            Some(45 | 48) => Self::Fog,
            Some(51..=55) => Self::Drizzle,
            Some(61..=65 | 80..=82) => Self::Rain,
            Some(71..=77 | 85 | 86) => Self::Snow,
            Some(95..=99) => Self::Thunderstorm,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for Icon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
