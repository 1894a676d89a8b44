use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required startup input is absent. Not retried.
    #[error("{name} not found. Please save your {name} to `{}`", .path.display())]
    MissingCredential { name: &'static str, path: PathBuf },

    /// Geocoding produced no usable candidate, for whatever reason.
    #[error("Could not geolocate {city:?}. Please try a different city.")]
    LocationNotFound { city: String },

    #[error("Could not fetch the current weather: {0}")]
    WeatherFetchFailed(#[from] FetchError),

    #[error("Unable to open output device: {0}")]
    Device(String),
}

/// Everything that can go wrong with a single HTTP exchange.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("response is not valid JSON: {0}")]
    Json(#[from] json::Error),

    #[error("unexpected response: {0}")]
    Payload(&'static str),
}

impl From<reqwest::Error> for FetchError {
    /// The request URL carries the API key in its query string, so it is stripped.
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(Box::new(e.without_url()))
    }
}
