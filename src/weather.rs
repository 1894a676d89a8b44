use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::error::{Error, FetchError, Result};

/// Short category code taken from the first two characters of an OpenWeather icon
/// identifier, e.g. `"10"` for `"10d"`. `"Un"` stands for "could not tell".
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConditionKey(String);

impl ConditionKey {
    /// Icon placeholder used when the upstream response carries none.
    pub const UNKNOWN_ICON: &'static str = "Unknown";

    /// Icons shorter than two characters carry no category and give the sentinel.
    pub fn from_icon(icon: &str) -> Self {
        let key: String = icon.chars().take(2).collect();
        if key.chars().count() < 2 {
            return Self::unknown();
        }
        Self(key)
    }

    /// The sentinel key.
    pub fn unknown() -> Self {
        Self::from_icon(Self::UNKNOWN_ICON)
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::unknown()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn describe(&self) -> &'static str {
        match self.as_str() {
            "01" => "clear sky",
            "02" => "few clouds",
            "03" => "scattered clouds",
            "04" => "broken clouds",
            "09" => "shower rain",
            "10" => "rain",
            "11" => "thunderstorm",
            "13" => "snow",
            "50" => "mist",
            _ => "unknown",
        }
    }
}

impl fmt::Display for ConditionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Returns `None` unless latitude is within [-90, 90] and longitude within [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if (-90. ..=90.).contains(&latitude) && (-180. ..=180.).contains(&longitude) {
            Some(Self {
                latitude,
                longitude,
            })
        } else {
            None
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// First candidate of a geocoding lookup.
///
/// ```json
/// {
///     "name": "Ottawa",
///     "local_names": { "fr": "Ottawa" },
///     "lat": 45.4208777,
///     "lon": -75.6901106,
///     "country": "CA",
///     "state": "Ontario"
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub name: String,
    pub state: Option<String>,
    pub country: String,
    pub coordinates: Coordinates,
}

impl TryFrom<json::JsonValue> for Location {
    type Error = &'static str;

    fn try_from(mut json: json::JsonValue) -> Result<Self, Self::Error> {
        let latitude = json
            .remove("lat")
            .as_f64()
            .ok_or("Missing or invalid \"lat\" value.")?;
        let longitude = json
            .remove("lon")
            .as_f64()
            .ok_or("Missing or invalid \"lon\" value.")?;

        Ok(Self {
            name: json
                .remove("name")
                .as_str()
                .map(str::to_owned)
                .ok_or("Missing or invalid \"name\" value.")?,
            state: json
                .remove("state")
                .as_str()
                .filter(|state| !state.is_empty())
                .map(str::to_owned),
            country: json
                .remove("country")
                .as_str()
                .map(str::to_owned)
                .ok_or("Missing or invalid \"country\" value.")?,
            coordinates: Coordinates::new(latitude, longitude)
                .ok_or("Coordinates out of range.")?,
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            Some(state) => write!(f, "{}, {}, {}", self.name, state, self.country),
            None => write!(f, "{}, {}", self.name, self.country),
        }
    }
}

/// The parts of a current-conditions response we care about.
///
/// ```json
/// {
///     "coord": { "lon": -75.6901, "lat": 45.4209 },
///     "weather": [{
///         "id": 500,
///         "main": "Rain",
///         "description": "light rain",
///         "icon": "10d"
///     }],
///     "main": { "temp": 284.2 },
///     "name": "Ottawa"
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentWeather {
    pub label: Option<String>,
    pub icon: String,
}

impl TryFrom<json::JsonValue> for CurrentWeather {
    type Error = &'static str;

    fn try_from(mut json: json::JsonValue) -> Result<Self, Self::Error> {
        if !json.is_object() {
            return Err("Expected a JSON object.");
        }

        let mut weather = json.remove("weather");
        let mut first = weather
            .members_mut()
            .next()
            .map(json::JsonValue::take)
            .unwrap_or(json::JsonValue::Null);

        Ok(Self {
            label: first.remove("main").as_str().map(str::to_owned),
            icon: first
                .remove("icon")
                .as_str()
                .unwrap_or(ConditionKey::UNKNOWN_ICON)
                .to_owned(),
        })
    }
}

impl CurrentWeather {
    pub fn condition_key(&self) -> ConditionKey {
        ConditionKey::from_icon(&self.icon)
    }

    pub fn sky(&self) -> Sky {
        self.label
            .as_deref()
            .unwrap_or(ConditionKey::UNKNOWN_ICON)
            .into()
    }
}

/// Coarse human-readable summary of the `main` label.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Sky {
    Unknown,
    Clear,
    Cloudy,
    Raining,
}

impl From<&str> for Sky {
    fn from(label: &str) -> Self {
        match label {
            "Unknown" => Self::Unknown,
            "Clear" => Self::Clear,
            "Clouds" | "Atmosphere" => Self::Cloudy,
            _ => Self::Raining,
        }
    }
}

impl fmt::Display for Sky {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unknown => "Could not find your weather. Please try again later.",
            Self::Clear => "Clear skies right now.",
            Self::Cloudy => "It's a little cloudy at the moment.",
            Self::Raining => "It's currently raining.",
        })
    }
}

#[derive(Clone, Debug)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn json(&self) -> Result<json::JsonValue, FetchError> {
        if !(200..300).contains(&self.status) {
            return Err(FetchError::Status(self.status));
        }
        Ok(json::parse(&self.body)?)
    }
}

/// Minimal HTTP capability the fetch logic is written against.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Response, FetchError>;
}

pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// `timeout` bounds both connecting and the whole exchange.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .connect_timeout(timeout)
                .timeout(timeout)
                .build()?,
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &Url) -> Result<Response, FetchError> {
        // the query string carries the API key
        debug!(host = url.host_str(), path = url.path(), "GET");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, bytes = body.len(), "response received");

        Ok(Response { status, body })
    }
}

/// Two-step condition lookup against the OpenWeather API.
pub struct OpenWeather<C = ReqwestClient> {
    client: C,
    base_url: Url,
    api_key: String,
}

impl<C: HttpClient> OpenWeather<C> {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openweathermap.org";

    const GEOCODE_PATH: &'static str = "/geo/1.0/direct";
    const WEATHER_PATH: &'static str = "/data/2.5/weather";

    pub fn new(client: C, base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url,
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url.query_pairs_mut()
            .clear()
            .extend_pairs(params)
            .append_pair("appid", &self.api_key);
        url
    }

    /// Resolve `city` to the first geocoding candidate. Every failure, including a
    /// network error, is reported as [`Error::LocationNotFound`].
    pub async fn geocode(&self, city: &str) -> Result<Location> {
        let url = self.endpoint(Self::GEOCODE_PATH, &[("q", city), ("limit", "5")]);

        let result = match self.client.get(&url).await {
            Ok(response) => first_candidate(&response),
            Err(e) => Err(e),
        };

        result.map_err(|e| {
            warn!(city, error = %e, "geocoding failed");
            Error::LocationNotFound {
                city: city.to_owned(),
            }
        })
    }

    pub async fn current_weather(&self, coordinates: Coordinates) -> Result<CurrentWeather> {
        let latitude = coordinates.latitude().to_string();
        let longitude = coordinates.longitude().to_string();
        let url = self.endpoint(
            Self::WEATHER_PATH,
            &[("lat", latitude.as_str()), ("lon", longitude.as_str())],
        );

        let json = self.client.get(&url).await?.json()?;
        Ok(CurrentWeather::try_from(json).map_err(FetchError::Payload)?)
    }

    /// Condition at `coordinates`, or the sentinel key if it cannot be determined.
    pub async fn condition_at(&self, coordinates: Coordinates) -> ConditionKey {
        match self.current_weather(coordinates).await {
            Ok(weather) => {
                let key = weather.condition_key();
                if key.is_unknown() {
                    warn!("Weather response carried no condition, running in degraded mode.");
                }
                key
            }
            Err(e) => {
                warn!(error = %e, "Could not find your weather, running in degraded mode.");
                ConditionKey::unknown()
            }
        }
    }

    /// Geocode `city`, then look up its current condition. Only a failed geocode is an
    /// error; a failed weather lookup yields the sentinel key.
    pub async fn fetch_condition(&self, city: &str) -> Result<ConditionKey> {
        let location = self.geocode(city).await?;
        info!("Location: {}", location);

        let key = self.condition_at(location.coordinates).await;
        info!(condition = %key, "{}", key.describe());

        Ok(key)
    }
}

fn first_candidate(response: &Response) -> Result<Location, FetchError> {
    let mut candidates = response.json()?;
    if !candidates.is_array() {
        return Err(FetchError::Payload("Expected a list of locations."));
    }

    let candidate = candidates
        .members_mut()
        .next()
        .map(json::JsonValue::take)
        .ok_or(FetchError::Payload("No matching locations."))?;

    Location::try_from(candidate).map_err(FetchError::Payload)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<Response, FetchError>>>,
        requested: Mutex<Vec<Url>>,
    }

    impl ScriptedClient {
        fn respond(self, status: u16, body: &str) -> Self {
            self.responses.lock().unwrap().push_back(Ok(Response {
                status,
                body: body.to_owned(),
            }));
            self
        }

        fn fail(self) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(FetchError::Transport("connection reset".into())));
            self
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedClient {
        async fn get(&self, url: &Url) -> Result<Response, FetchError> {
            self.requested.lock().unwrap().push(url.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchError::Payload("no scripted response")))
        }
    }

    const OTTAWA: &str = r#"[
        {"name": "Ottawa", "lat": 45.4208777, "lon": -75.6901106, "country": "CA", "state": "Ontario"},
        {"name": "Ottawa", "lat": 41.3455892, "lon": -88.8425769, "country": "US", "state": "Illinois"}
    ]"#;

    fn api(client: ScriptedClient) -> OpenWeather<ScriptedClient> {
        OpenWeather::new(
            client,
            Url::parse("https://weather.test").unwrap(),
            "secret key",
        )
    }

    #[tokio::test]
    async fn transport_errors_hide_the_api_key() {
        let closed = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let api = OpenWeather::new(
            ReqwestClient::new(Duration::from_secs(2)).unwrap(),
            Url::parse(&format!("http://{closed}")).unwrap(),
            "secret-key",
        );
        let url = api.endpoint(OpenWeather::<ReqwestClient>::GEOCODE_PATH, &[("q", "Ottawa")]);
        assert!(url.as_str().contains("secret-key"));

        let e = api.client.get(&url).await.unwrap_err();
        assert!(matches!(e, FetchError::Transport(_)));

        let mut source: Option<&dyn std::error::Error> = Some(&e);
        while let Some(error) = source {
            assert!(!error.to_string().contains("secret-key"), "{error}");
            source = error.source();
        }
        assert!(!format!("{e:?}").contains("secret-key"));
    }

    #[test]
    fn key_takes_first_two_characters() {
        assert_eq!(ConditionKey::from_icon("10d").as_str(), "10");
        assert_eq!(ConditionKey::from_icon("01n").as_str(), "01");
        assert!(ConditionKey::from_icon("4").is_unknown());
        assert!(ConditionKey::from_icon("").is_unknown());
        assert_eq!(ConditionKey::unknown().as_str(), "Un");
        assert!(ConditionKey::from_icon("Unknown").is_unknown());
        assert_eq!(ConditionKey::from_icon("13d").describe(), "snow");
        assert_eq!(ConditionKey::unknown().describe(), "unknown");
    }

    #[test]
    fn coordinates_are_range_checked() {
        assert!(Coordinates::new(90., -180.).is_some());
        assert!(Coordinates::new(-90.5, 0.).is_none());
        assert!(Coordinates::new(0., 180.1).is_none());
        assert!(Coordinates::new(f64::NAN, 0.).is_none());
    }

    #[test]
    fn location_display() {
        let mut location =
            Location::try_from(json::parse(OTTAWA).unwrap()[0].clone()).unwrap();
        assert_eq!(location.to_string(), "Ottawa, Ontario, CA");
        assert_eq!(location.coordinates.latitude(), 45.4208777);

        location.state = None;
        assert_eq!(location.to_string(), "Ottawa, CA");
    }

    #[test]
    fn location_requires_fields() {
        let missing_lat = json::parse(r#"{"name": "Nowhere", "lon": 1.0, "country": "XX"}"#).unwrap();
        assert!(Location::try_from(missing_lat).is_err());

        let empty_state = json::parse(
            r#"{"name": "Paris", "lat": 48.85, "lon": 2.35, "country": "FR", "state": ""}"#,
        )
        .unwrap();
        assert_eq!(Location::try_from(empty_state).unwrap().state, None);
    }

    #[test]
    fn current_weather_defaults_to_unknown() {
        let weather = CurrentWeather::try_from(json::parse(r#"{"cod": 401}"#).unwrap()).unwrap();
        assert!(weather.condition_key().is_unknown());
        assert_eq!(weather.sky(), Sky::Unknown);

        let weather = CurrentWeather::try_from(json::parse(r#"{"weather": []}"#).unwrap()).unwrap();
        assert!(weather.condition_key().is_unknown());

        assert!(CurrentWeather::try_from(json::parse("[1, 2]").unwrap()).is_err());
    }

    #[test]
    fn current_weather_reads_first_entry() {
        let weather = CurrentWeather::try_from(
            json::parse(
                r#"{"weather": [
                    {"main": "Drizzle", "icon": "09n"},
                    {"main": "Clear", "icon": "01n"}
                ]}"#,
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(weather.condition_key().as_str(), "09");
        assert_eq!(weather.sky(), Sky::Raining);
    }

    #[test]
    fn sky_sentences() {
        assert_eq!(Sky::from("Clear").to_string(), "Clear skies right now.");
        assert_eq!(Sky::from("Atmosphere"), Sky::Cloudy);
        assert_eq!(Sky::from("Clouds"), Sky::Cloudy);
        assert_eq!(Sky::from("Snow"), Sky::Raining);
    }

    #[tokio::test]
    async fn fetch_builds_both_requests() {
        let client = ScriptedClient::default().respond(200, OTTAWA).respond(
            200,
            r#"{"weather": [{"main": "Rain", "icon": "10d"}]}"#,
        );
        let api = api(client);

        let key = api.fetch_condition("Ottawa, CA").await.unwrap();
        assert_eq!(key.as_str(), "10");

        let requested = api.client.requested.lock().unwrap();
        assert_eq!(requested.len(), 2);
        assert_eq!(
            requested[0].as_str(),
            "https://weather.test/geo/1.0/direct?q=Ottawa%2C+CA&limit=5&appid=secret+key"
        );
        assert_eq!(
            requested[1].as_str(),
            "https://weather.test/data/2.5/weather?lat=45.4208777&lon=-75.6901106&appid=secret+key"
        );
    }

    #[tokio::test]
    async fn empty_geocode_skips_weather_call() {
        let api = api(ScriptedClient::default().respond(200, "[]"));

        let error = api.fetch_condition("Atlantis").await.unwrap_err();
        assert!(matches!(error, Error::LocationNotFound { city } if city == "Atlantis"));
        assert_eq!(api.client.requested.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn geocode_failures_are_location_not_found() {
        for client in [
            ScriptedClient::default().fail(),
            ScriptedClient::default().respond(401, r#"{"cod": 401}"#),
            ScriptedClient::default().respond(200, "<html>"),
            ScriptedClient::default().respond(200, r#"{"name": "Ottawa"}"#),
            ScriptedClient::default().respond(200, r#"[{"name": "Ottawa"}]"#),
        ] {
            let error = api(client).geocode("Ottawa").await.unwrap_err();
            assert!(matches!(error, Error::LocationNotFound { .. }));
        }
    }

    #[tokio::test]
    async fn weather_failures_become_sentinel() {
        for client in [
            ScriptedClient::default().respond(200, OTTAWA).fail(),
            ScriptedClient::default()
                .respond(200, OTTAWA)
                .respond(500, "oops"),
            ScriptedClient::default()
                .respond(200, OTTAWA)
                .respond(200, "not json"),
        ] {
            let key = api(client).fetch_condition("Ottawa").await.unwrap();
            assert!(key.is_unknown());
        }
    }
}
