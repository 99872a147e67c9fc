//! Reverse geocoding: convert coordinates to a human-readable place name.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;
use tracing::debug;

use crate::model::Coordinates;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
/// Nominatim's usage policy requires an identifying User-Agent.
const USER_AGENT: &str = concat!(
    "daily-report/",
    env!("CARGO_PKG_VERSION"),
    " (+https://example.com)"
);

/// Soft lookup: every failure is reported as "no name".
#[async_trait]
pub trait ReverseGeocoder: Send + Sync + Debug {
    async fn place_name(&self, coordinates: Coordinates) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
}

impl NominatimResponse {
    /// city > town > village > municipality > county > display name
    fn best_name(self) -> Option<String> {
        let display_name = self.display_name.filter(|s| !s.trim().is_empty());

        let Some(addr) = self.address else {
            return display_name;
        };

        [addr.city, addr.town, addr.village, addr.municipality, addr.county]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .or(display_name)
    }
}

#[derive(Debug, Clone)]
pub struct Nominatim {
    base_url: String,
    http: Client,
}

impl Default for Nominatim {
    fn default() -> Self {
        Self::new()
    }
}

impl Nominatim {
    pub fn new() -> Self {
        Self::new_with_base_url(NOMINATIM_URL)
    }

    pub fn new_with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: crate::http::client(),
        }
    }
}

#[async_trait]
impl ReverseGeocoder for Nominatim {
    async fn place_name(&self, coordinates: Coordinates) -> Option<String> {
        let url = format!("{}/reverse", self.base_url);
        let lat = coordinates.latitude.to_string();
        let lon = coordinates.longitude.to_string();

        let response = match self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("lat", lat.as_str()), ("lon", lon.as_str()), ("format", "jsonv2")])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!("Reverse geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("Reverse geocode returned status {}", response.status());
            return None;
        }

        let body: NominatimResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                debug!("Reverse geocode parse error: {}", e);
                return None;
            }
        };

        let name = body.best_name();
        match &name {
            Some(n) => debug!("Reverse geocoded to: {}", n),
            None => debug!("Reverse geocode found no usable place name"),
        }
        name
    }
}
