//! Core library for the Daily Report news reader.
//!
//! This crate defines:
//! - Configuration & provider selection
//! - Geolocation, reverse geocoding and weather providers
//! - The weather resolution state machine and the widget that runs it
//! - The news feed client and terminal rendering
//!
//! It is used by `report-cli`, but can also be reused by other front ends.

pub mod config;
pub mod geocode;
pub mod geolocation;
mod http;
pub mod icon;
pub mod model;
pub mod news;
pub mod provider;
pub mod render;
pub mod resolver;
pub mod widget;

pub use config::Config;
pub use geocode::{Nominatim, ReverseGeocoder};
pub use geolocation::{
    FixedGeolocator, GeolocationError, Geolocator, IpGeolocator, NoGeolocation, LocateOptions,
};
pub use icon::Icon;
pub use model::{Coordinates, FALLBACK_LOCATION, WeatherReading, WeatherRequest};
pub use news::{NewsClient, Post};
pub use provider::{ProviderKind, WeatherProvider, provider_for};
pub use resolver::{Phase, Resolver, WeatherState};
pub use widget::WeatherWidget;
