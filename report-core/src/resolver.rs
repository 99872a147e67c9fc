//! Weather resolution: locate → name → fetch, with a fixed fallback location.
//!
//! The sequence is a small state machine. [`transition`] is pure and says
//! which [`Effect`] to run next; [`Resolver`] runs effects against the real
//! (or fake) locator, geocoder and provider and feeds the results back in as
//! [`Event`]s. Exactly one provider call happens per resolution.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    geocode::ReverseGeocoder,
    geolocation::{GeolocationError, Geolocator, LocateOptions},
    model::{Coordinates, FALLBACK_LOCATION, WeatherReading, WeatherRequest},
    provider::WeatherProvider,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Locating,
    Naming(Coordinates),
    Fetching(WeatherRequest),
    Resolved,
    Failed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Resolved | Phase::Failed)
    }

    fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Locating => "locating",
            Phase::Naming(_) => "naming",
            Phase::Fetching(_) => "fetching",
            Phase::Resolved => "resolved",
            Phase::Failed => "failed",
        }
    }
}

impl Serialize for Phase {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Mount,
    Located(Coordinates),
    LocateFailed(GeolocationError),
    Named(Option<String>),
    /// Provider outcome; the error is already rendered to its message.
    Fetched(Result<WeatherReading, String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Locate,
    ReverseGeocode(Coordinates),
    FetchWeather(WeatherRequest),
}

/// Next phase and the effect to run for it, if any.
///
/// Events that don't fit the current phase move a live resolution to
/// `Failed`; once terminal, further events change nothing.
pub fn transition(phase: &Phase, event: &Event) -> (Phase, Option<Effect>) {
    match (phase, event) {
        (Phase::Idle, Event::Mount) => (Phase::Locating, Some(Effect::Locate)),

        (Phase::Locating, Event::Located(coords)) => {
            (Phase::Naming(*coords), Some(Effect::ReverseGeocode(*coords)))
        }
        (Phase::Locating, Event::LocateFailed(_)) => fetch(WeatherRequest::fallback()),

        (Phase::Naming(coords), Event::Named(Some(name))) => {
            fetch(WeatherRequest::new(*coords, name.clone()))
        }
        // No name means the real coordinates are dropped too.
        (Phase::Naming(_), Event::Named(None)) => fetch(WeatherRequest::fallback()),

        (Phase::Fetching(_), Event::Fetched(_)) => (Phase::Resolved, None),

        (p, _) if p.is_terminal() => (p.clone(), None),
        _ => (Phase::Failed, None),
    }
}

fn fetch(request: WeatherRequest) -> (Phase, Option<Effect>) {
    (Phase::Fetching(request.clone()), Some(Effect::FetchWeather(request)))
}

/// Everything the widget renders from.
///
/// Once `loading` is false exactly one of `reading` and `error` is set and
/// `city` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherState {
    pub phase: Phase,
    pub city: String,
    pub reading: Option<WeatherReading>,
    pub loading: bool,
    pub error: Option<String>,
    /// Coordinates the provider was (or is being) asked about.
    pub coordinates: Option<Coordinates>,
}

impl Default for WeatherState {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            city: String::new(),
            reading: None,
            loading: true,
            error: None,
            coordinates: None,
        }
    }

    /// Fold one event into the state and return the effect to run next.
    pub fn apply(&mut self, event: Event) -> Option<Effect> {
        let (next, effect) = transition(&self.phase, &event);

        if self.phase.is_terminal() {
            debug!(phase = self.phase.name(), ?event, "ignoring event after resolution");
            return None;
        }

        debug!(from = self.phase.name(), to = next.name(), "weather phase transition");

        match (&next, event) {
            (Phase::Locating, _) => {
                self.loading = true;
                self.error = None;
            }
            (Phase::Fetching(request), _) => {
                self.city = request
                    .place
                    .clone()
                    .unwrap_or_else(|| FALLBACK_LOCATION.name.to_string());
                self.coordinates = Some(request.coordinates);
            }
            (Phase::Resolved, Event::Fetched(Ok(reading))) => {
                self.reading = Some(reading);
                self.error = None;
                self.loading = false;
            }
            (Phase::Resolved, Event::Fetched(Err(message))) => {
                self.reading = None;
                self.error = Some(message);
                self.loading = false;
            }
            (Phase::Failed, event) => {
                warn!(phase = self.phase.name(), ?event, "unexpected event during weather resolution");
                self.reading = None;
                self.error = Some(format!(
                    "Weather resolution failed while {}",
                    self.phase.name()
                ));
                if self.city.is_empty() {
                    self.city = FALLBACK_LOCATION.name.to_string();
                }
                self.loading = false;
            }
            _ => {}
        }

        self.phase = next;
        effect
    }
}

/// Runs one resolution against injected collaborators.
#[derive(Debug, Clone)]
pub struct Resolver {
    geolocator: Arc<dyn Geolocator>,
    geocoder: Arc<dyn ReverseGeocoder>,
    provider: Arc<dyn WeatherProvider>,
    options: LocateOptions,
}

impl Resolver {
    pub fn new(
        geolocator: Arc<dyn Geolocator>,
        geocoder: Arc<dyn ReverseGeocoder>,
        provider: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self {
            geolocator,
            geocoder,
            provider,
            options: LocateOptions::default(),
        }
    }

    pub fn with_locate_options(mut self, options: LocateOptions) -> Self {
        self.options = options;
        self
    }

    async fn run(&self, effect: Effect) -> Event {
        match effect {
            Effect::Locate => match self.geolocator.locate(&self.options).await {
                Ok(coords) => Event::Located(coords),
                Err(e) => {
                    info!("Location unavailable ({}), using {}", e, FALLBACK_LOCATION.name);
                    Event::LocateFailed(e)
                }
            },
            Effect::ReverseGeocode(coords) => {
                let name = self.geocoder.place_name(coords).await;
                if name.is_none() {
                    info!("No place name for location, using {}", FALLBACK_LOCATION.name);
                }
                Event::Named(name)
            }
            Effect::FetchWeather(request) => {
                let outcome = self.provider.current(&request).await.map_err(|e| {
                    warn!("Weather fetch failed: {:#}", e);
                    e.to_string()
                });
                Event::Fetched(outcome)
            }
        }
    }

    /// Drive a resolution to completion.
    ///
    /// `on_update` sees every state change. Cancelling `token` abandons the
    /// in-flight step and guarantees no further updates; the return value is
    /// then `None`.
    #[instrument(skip_all)]
    pub async fn resolve<F>(&self, token: &CancellationToken, mut on_update: F) -> Option<WeatherState>
    where
        F: FnMut(&WeatherState) + Send,
    {
        if token.is_cancelled() {
            return None;
        }

        let mut state = WeatherState::new();
        let mut next = state.apply(Event::Mount);
        on_update(&state);

        while let Some(effect) = next {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(phase = state.phase.name(), "weather resolution cancelled");
                    return None;
                }
                event = self.run(effect) => event,
            };

            if token.is_cancelled() {
                debug!(phase = state.phase.name(), "discarding result after cancellation");
                return None;
            }

            next = state.apply(event);
            on_update(&state);
        }

        info!(city = %state.city, ok = state.reading.is_some(), "weather resolved");
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::Icon;

    fn here() -> Coordinates {
        Coordinates::new(40.0, -3.7)
    }

    fn reading() -> WeatherReading {
        WeatherReading {
            temperature: 21.5,
            wind_speed: Some(3.2),
            condition_code: Some(0),
            icon: Icon::Clear,
            observed_at: None,
        }
    }

    #[test]
    fn mount_starts_locating() {
        assert_eq!(
            transition(&Phase::Idle, &Event::Mount),
            (Phase::Locating, Some(Effect::Locate))
        );
    }

    #[test]
    fn located_goes_to_naming() {
        assert_eq!(
            transition(&Phase::Locating, &Event::Located(here())),
            (Phase::Naming(here()), Some(Effect::ReverseGeocode(here())))
        );
    }

    #[test]
    fn locate_failure_fetches_fallback() {
        for err in [
            GeolocationError::Unsupported,
            GeolocationError::PermissionDenied,
            GeolocationError::PositionUnavailable,
            GeolocationError::Timeout,
        ] {
            let (phase, effect) = transition(&Phase::Locating, &Event::LocateFailed(err));
            assert_eq!(phase, Phase::Fetching(WeatherRequest::fallback()));
            assert_eq!(effect, Some(Effect::FetchWeather(WeatherRequest::fallback())));
        }
    }

    #[test]
    fn named_location_fetches_real_coordinates() {
        let (_, effect) = transition(&Phase::Naming(here()), &Event::Named(Some("Madrid".into())));
        assert_eq!(
            effect,
            Some(Effect::FetchWeather(WeatherRequest::new(here(), "Madrid")))
        );
    }

    #[test]
    fn unnamed_location_fetches_fallback_coordinates() {
        let (_, effect) = transition(&Phase::Naming(here()), &Event::Named(None));
        assert_eq!(effect, Some(Effect::FetchWeather(WeatherRequest::fallback())));
    }

    #[test]
    fn fetch_outcome_resolves() {
        let fetching = Phase::Fetching(WeatherRequest::fallback());
        assert_eq!(
            transition(&fetching, &Event::Fetched(Ok(reading()))),
            (Phase::Resolved, None)
        );
        assert_eq!(
            transition(&fetching, &Event::Fetched(Err("boom".into()))),
            (Phase::Resolved, None)
        );
    }

    #[test]
    fn out_of_order_event_fails() {
        assert_eq!(
            transition(&Phase::Locating, &Event::Named(Some("X".into()))),
            (Phase::Failed, None)
        );
        assert_eq!(transition(&Phase::Idle, &Event::Located(here())), (Phase::Failed, None));
    }

    #[test]
    fn terminal_phases_absorb_events() {
        assert_eq!(transition(&Phase::Resolved, &Event::Mount), (Phase::Resolved, None));
        assert_eq!(transition(&Phase::Failed, &Event::Mount), (Phase::Failed, None));
    }

    #[test]
    fn state_success_path() {
        let mut state = WeatherState::new();
        assert!(state.loading);

        assert_eq!(state.apply(Event::Mount), Some(Effect::Locate));
        state.apply(Event::Located(here()));
        state.apply(Event::Named(Some("Madrid".into())));
        assert_eq!(state.city, "Madrid");
        assert_eq!(state.coordinates, Some(here()));
        assert!(state.loading);

        assert_eq!(state.apply(Event::Fetched(Ok(reading()))), None);
        assert_eq!(state.phase, Phase::Resolved);
        assert!(!state.loading);
        assert_eq!(state.reading, Some(reading()));
        assert_eq!(state.error, None);
    }

    #[test]
    fn state_provider_failure_keeps_city() {
        let mut state = WeatherState::new();
        state.apply(Event::Mount);
        state.apply(Event::LocateFailed(GeolocationError::PermissionDenied));
        state.apply(Event::Fetched(Err("OpenWeather API key missing".into())));

        assert_eq!(state.city, "London");
        assert_eq!(state.reading, None);
        assert_eq!(state.error.as_deref(), Some("OpenWeather API key missing"));
        assert!(!state.loading);
    }

    #[test]
    fn state_failed_sets_error_and_fallback_city() {
        let mut state = WeatherState::new();
        state.apply(Event::Mount);
        state.apply(Event::Fetched(Ok(reading())));

        assert_eq!(state.phase, Phase::Failed);
        assert!(!state.loading);
        assert_eq!(state.reading, None);
        assert!(state.error.is_some());
        assert_eq!(state.city, "London");
    }

    #[test]
    fn state_ignores_events_after_resolution() {
        let mut state = WeatherState::new();
        state.apply(Event::Mount);
        state.apply(Event::LocateFailed(GeolocationError::Timeout));
        state.apply(Event::Fetched(Ok(reading())));
        let resolved = state.clone();

        assert_eq!(state.apply(Event::Fetched(Err("late".into()))), None);
        assert_eq!(state, resolved);
    }

    #[test]
    fn phase_serializes_as_name() {
        let json = serde_json::to_string(&Phase::Naming(here())).unwrap();
        assert_eq!(json, "\"naming\"");
    }
}
