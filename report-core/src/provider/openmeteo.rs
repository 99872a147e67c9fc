use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    icon::Icon,
    model::{WeatherReading, WeatherRequest, round_tenth},
};

use super::WeatherProvider;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Open-Meteo current weather. No credential required.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    url: String,
    http: Client,
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self::with_url(FORECAST_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: crate::http::client(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrentWeather {
    temperature: f64,
    windspeed: Option<f64>,
    weathercode: Option<i64>,
    /// ISO 8601 without offset; GMT unless a timezone is requested.
    time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    current_weather: Option<OmCurrentWeather>,
}

impl OmCurrentWeather {
    fn into_reading(self) -> WeatherReading {
        WeatherReading {
            temperature: round_tenth(self.temperature),
            wind_speed: self.windspeed.map(round_tenth),
            condition_code: self.weathercode,
            icon: Icon::from_wmo_code(self.weathercode),
            observed_at: self.time.as_deref().and_then(parse_time),
        }
    }
}

fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .ok()
        .map(|ndt| ndt.and_utc())
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn current(&self, request: &WeatherRequest) -> Result<WeatherReading> {
        let lat = request.coordinates.latitude.to_string();
        let lon = request.coordinates.longitude.to_string();
        debug!(place = ?request.place, %lat, %lon, "requesting Open-Meteo current weather");

        let res = self
            .http
            .get(&self.url)
            .query(&[
                ("latitude", lat.as_str()),
                ("longitude", lon.as_str()),
                ("current_weather", "true"),
            ])
            .send()
            .await
            .context("Failed to send request to Open-Meteo")?;

        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!("Open-Meteo fetch failed: {}", status.as_u16()));
        }

        let body = res
            .text()
            .await
            .context("Failed to read Open-Meteo response body")?;

        let parsed: OmResponse =
            serde_json::from_str(&body).context("Failed to parse Open-Meteo JSON")?;

        let current = parsed
            .current_weather
            .ok_or_else(|| anyhow!("Open-Meteo: no current weather"))?;

        Ok(current.into_reading())
    }
}
