use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Startup inputs. Values given directly (command line, environment, `.env`) win over
/// the one-line credential files.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub api_key: String,
    pub city: String,
}

impl Credentials {
    pub const API_KEY_FILE: &'static str = "API_KEY.txt";
    pub const CITY_FILE: &'static str = "LOCATION.txt";

    pub fn load(dir: &Path, api_key: Option<String>, city: Option<String>) -> Result<Self> {
        Ok(Self {
            api_key: given_or_read(api_key, &dir.join(Self::API_KEY_FILE), "API key")?,
            city: given_or_read(city, &dir.join(Self::CITY_FILE), "City")?,
        })
    }
}

fn given_or_read(given: Option<String>, path: &Path, name: &'static str) -> Result<String> {
    match given.map(|value| value.trim().to_owned()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => read_credential(path, name),
    }
}

/// First line of `path`, trimmed. A missing, unreadable or blank file is fatal.
pub fn read_credential(path: &Path, name: &'static str) -> Result<String> {
    let missing = || Error::MissingCredential {
        name,
        path: PathBuf::from(path),
    };

    let contents = fs::read_to_string(path).map_err(|e| {
        debug!(path = %path.display(), error = %e, "unable to read credential");
        missing()
    })?;

    match contents.lines().next().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_owned()),
        _ => Err(missing()),
    }
}
