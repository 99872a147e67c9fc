use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    icon::Icon,
    model::{WeatherReading, WeatherRequest, round_tenth},
};

use super::WeatherProvider;

const ONECALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";

/// OpenWeather One Call 3.0, metric units.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: Option<String>,
    url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_url(api_key, ONECALL_URL)
    }

    pub fn with_url(api_key: Option<String>, url: impl Into<String>) -> Self {
        Self {
            api_key,
            url: url.into(),
            http: crate::http::client(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    dt: Option<i64>,
    temp: f64,
    wind_speed: Option<f64>,
    wind: Option<OwWind>,
    #[serde(default)]
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
struct OwResponse {
    current: Option<OwCurrent>,
}

impl OwCurrent {
    /// Some payloads nest wind under `wind.speed`, others use a flat `wind_speed`.
    fn wind(&self) -> Option<f64> {
        self.wind.as_ref().and_then(|w| w.speed).or(self.wind_speed)
    }

    fn into_reading(self) -> WeatherReading {
        let code = self.weather.first().map(|w| w.id);
        let wind = self.wind();

        WeatherReading {
            temperature: round_tenth(self.temp),
            wind_speed: wind.map(round_tenth),
            condition_code: code,
            icon: Icon::from_openweather_id(code),
            observed_at: self.dt.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, request: &WeatherRequest) -> Result<WeatherReading> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OpenWeather API key missing"))?;

        let lat = request.coordinates.latitude.to_string();
        let lon = request.coordinates.longitude.to_string();
        debug!(place = ?request.place, %lat, %lon, "requesting OpenWeather current conditions");

        let res = self
            .http
            .get(&self.url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("units", "metric"),
                ("exclude", "minutely,hourly,daily,alerts"),
                ("appid", api_key),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather")?;

        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!("OpenWeather fetch failed: {}", status.as_u16()));
        }

        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather response body")?;

        let parsed: OwResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather JSON")?;

        let current = parsed
            .current
            .ok_or_else(|| anyhow!("OpenWeather: no current weather"))?;

        Ok(current.into_reading())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinates;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> WeatherRequest {
        WeatherRequest::new(Coordinates::new(51.5, -0.12), "London")
    }

    #[test]
    fn nested_wind_preferred_over_flat() {
        let current: OwCurrent = serde_json::from_value(serde_json::json!({
            "temp": 10.0,
            "wind_speed": 1.0,
            "wind": { "speed": 2.0 }
        }))
        .unwrap();
        assert_eq!(current.wind(), Some(2.0));
    }

    #[test]
    fn flat_wind_used_when_nested_missing() {
        let current: OwCurrent = serde_json::from_value(serde_json::json!({
            "temp": 10.0,
            "wind_speed": 3.46,
            "wind": {}
        }))
        .unwrap();
        let reading = current.into_reading();
        assert_eq!(reading.wind_speed, Some(3.5));
    }

    #[test]
    fn no_wind_and_no_conditions() {
        let current: OwCurrent =
            serde_json::from_value(serde_json::json!({ "temp": -1.04 })).unwrap();
        let reading = current.into_reading();
        assert_eq!(reading.temperature, -1.0);
        assert_eq!(reading.wind_speed, None);
        assert_eq!(reading.condition_code, None);
        assert_eq!(reading.icon, Icon::PartlyCloudy);
        assert_eq!(reading.observed_at, None);
    }

    #[tokio::test]
    async fn fetches_and_normalizes_current_weather() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/onecall"))
            .and(query_param("lat", "51.5"))
            .and(query_param("lon", "-0.12"))
            .and(query_param("units", "metric"))
            .and(query_param("exclude", "minutely,hourly,daily,alerts"))
            .and(query_param("appid", "KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "current": {
                    "dt": 1_700_000_000,
                    "temp": 12.345,
                    "wind_speed": 4.06,
                    "weather": [{ "id": 802, "main": "Clouds", "description": "scattered clouds" }]
                }
            })))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_url(
            Some("KEY".into()),
            format!("{}/onecall", mock_server.uri()),
        );
        let reading = provider.current(&request()).await.unwrap();

        assert_eq!(reading.temperature, 12.3);
        assert_eq!(reading.wind_speed, Some(4.1));
        assert_eq!(reading.condition_code, Some(802));
        assert_eq!(reading.icon, Icon::ScatteredClouds);
        assert_eq!(reading.observed_at.map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_url(None, mock_server.uri());
        let err = provider.current(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "OpenWeather API key missing");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_url(Some("BAD".into()), mock_server.uri());
        let err = provider.current(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "OpenWeather fetch failed: 401");
    }

    #[tokio::test]
    async fn missing_current_is_an_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&mock_server)
            .await;

        let provider = OpenWeatherProvider::with_url(Some("KEY".into()), mock_server.uri());
        let err = provider.current(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "OpenWeather: no current weather");
    }
}
