//! Current-position lookup.
//!
//! A locator makes exactly one attempt. Any failure sends the resolver
//! straight to the fallback location, so nothing here retries.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::{
    fmt::Debug,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::model::Coordinates;

const IPINFO_URL: &str = "https://ipinfo.io/json";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Geolocation is not available")]
    Unsupported,
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location unavailable")]
    PositionUnavailable,
    #[error("Location request timed out")]
    Timeout,
}

/// How hard a locator may try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocateOptions {
    /// A previous fix younger than this may be returned instead of a new lookup.
    ///
    /// Only locators that keep state honour it, and only when the same
    /// instance serves repeated resolutions. A one-shot CLI run never hits it.
    pub maximum_age: Duration,
    pub timeout: Duration,
    pub high_accuracy: bool,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            maximum_age: Duration::from_secs(60),
            timeout: Duration::from_secs(8),
            high_accuracy: false,
        }
    }
}

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self, options: &LocateOptions) -> Result<Coordinates, GeolocationError>;
}

/// No location capability at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

#[async_trait]
impl Geolocator for NoGeolocation {
    async fn locate(&self, _options: &LocateOptions) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

/// Position supplied up front, e.g. on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinates);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self, _options: &LocateOptions) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// Approximates the caller's position from their public IP address.
///
/// Always low accuracy, so `high_accuracy` is ignored.
///
/// The last fix is kept on the instance and reused within `maximum_age`.
/// That pays off for long-lived front ends sharing one locator across
/// refreshes; the CLI builds a fresh one per run and always looks up.
#[derive(Debug)]
pub struct IpGeolocator {
    url: String,
    http: Client,
    last_fix: Mutex<Option<(Instant, Coordinates)>>,
}

#[derive(Debug, Deserialize)]
struct IpInfoResponse {
    /// "lat,lon"
    loc: Option<String>,
}

impl Default for IpGeolocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IpGeolocator {
    pub fn new() -> Self {
        Self::with_url(IPINFO_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: Client::new(),
            last_fix: Mutex::new(None),
        }
    }

    async fn lookup(&self) -> Result<Coordinates, GeolocationError> {
        let res = self.http.get(&self.url).send().await.map_err(|e| {
            debug!("IP location request failed: {}", e);
            GeolocationError::PositionUnavailable
        })?;

        match res.status() {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(GeolocationError::PermissionDenied);
            }
            s => {
                debug!("IP location returned status {}", s);
                return Err(GeolocationError::PositionUnavailable);
            }
        }

        let body: IpInfoResponse = res.json().await.map_err(|e| {
            debug!("IP location parse error: {}", e);
            GeolocationError::PositionUnavailable
        })?;

        body.loc
            .as_deref()
            .and_then(parse_loc)
            .ok_or(GeolocationError::PositionUnavailable)
    }
}

fn parse_loc(loc: &str) -> Option<Coordinates> {
    let (lat, lon) = loc.split_once(',')?;
    let latitude = lat.trim().parse::<f64>().ok()?;
    let longitude = lon.trim().parse::<f64>().ok()?;
    Some(Coordinates::new(latitude, longitude))
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self, options: &LocateOptions) -> Result<Coordinates, GeolocationError> {
        let mut last_fix = self.last_fix.lock().await;

        if let Some((at, coords)) = *last_fix {
            if at.elapsed() <= options.maximum_age {
                debug!("reusing location fix from {:?} ago", at.elapsed());
                return Ok(coords);
            }
        }

        let coords = tokio::time::timeout(options.timeout, self.lookup())
            .await
            .map_err(|_| GeolocationError::Timeout)??;

        *last_fix = Some((Instant::now(), coords));
        Ok(coords)
    }
}
