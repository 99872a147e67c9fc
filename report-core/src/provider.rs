use crate::{
    Config, WeatherReading, WeatherRequest,
    provider::{openmeteo::OpenMeteoProvider, openweather::OpenWeatherProvider},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod openmeteo;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Keyed commercial API.
    OpenWeather,
    /// Keyless API.
    OpenMeteo,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenWeather => "openweather",
            ProviderKind::OpenMeteo => "open-meteo",
        }
    }

    pub const fn all() -> &'static [ProviderKind] {
        &[ProviderKind::OpenWeather, ProviderKind::OpenMeteo]
    }

    pub fn needs_api_key(&self) -> bool {
        matches!(self, ProviderKind::OpenWeather)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderKind::OpenWeather),
            "open-meteo" | "openmeteo" => Ok(ProviderKind::OpenMeteo),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, open-meteo."
            )),
        }
    }
}

/// Maps coordinates to current conditions.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, request: &WeatherRequest) -> anyhow::Result<WeatherReading>;
}

/// Construct the provider for an already-resolved kind.
///
/// The keyed provider is built even without a key; it then fails every
/// request with a credential error instead of silently switching providers.
pub fn provider_for(kind: ProviderKind, config: &Config) -> Box<dyn WeatherProvider> {
    match kind {
        ProviderKind::OpenWeather => {
            Box::new(OpenWeatherProvider::new(config.api_key().map(str::to_owned)))
        }
        ProviderKind::OpenMeteo => Box::new(OpenMeteoProvider::new()),
    }
}
