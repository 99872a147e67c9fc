//! Shared HTTP client construction.

use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// Upper bound on any single outbound request.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn client() -> Client {
    client_with_timeout(REQUEST_TIMEOUT)
}

pub(crate) fn client_with_timeout(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        warn!("Failed to configure HTTP client, requests will have no timeout: {}", e);
        Client::new()
    })
}
