//! Terminal rendering for the weather line and the masthead.

use crate::{model::FALLBACK_LOCATION, resolver::WeatherState};

pub const BRAND: &str = "The Daily Report";
pub const TAGLINE: &str = "Independent journalism";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub title: &'static str,
    pub href: &'static str,
}

pub const NAV_LINKS: &[NavLink] = &[
    NavLink { title: "Home", href: "/" },
    NavLink { title: "World", href: "/world" },
    NavLink { title: "Politics", href: "/politics" },
    NavLink { title: "Business", href: "/business" },
    NavLink { title: "Tech", href: "/tech" },
    NavLink { title: "Culture", href: "/culture" },
];

fn city_or_fallback(state: &WeatherState) -> &str {
    if state.city.is_empty() {
        FALLBACK_LOCATION.name
    } else {
        &state.city
    }
}

/// One-line weather display.
pub fn render_weather(state: &WeatherState) -> String {
    if state.loading {
        return "⏳ Loading weather…".to_string();
    }

    let city = city_or_fallback(state);

    match (&state.error, &state.reading) {
        (Some(_), _) | (None, None) => format!("⚠️ Weather unavailable  {city}"),
        (None, Some(reading)) => {
            let wind = reading
                .wind_speed
                .map(|w| format!(" {w:.1} m/s"))
                .unwrap_or_default();
            format!("{} {} {:.1}°C{}", reading.icon, city, reading.temperature, wind)
        }
    }
}

/// Weather line, brand and navigation.
pub fn render_masthead(state: &WeatherState) -> String {
    let nav = NAV_LINKS
        .iter()
        .map(|link| link.title)
        .collect::<Vec<_>>()
        .join(" · ");

    format!("{}\n\n{BRAND}\n{TAGLINE}\n{nav}", render_weather(state))
}
