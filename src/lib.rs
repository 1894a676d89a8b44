use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use color::ConditionColorTable;
use display::Display;
use render::RenderLoop;
use weather::{HttpClient, OpenWeather};

pub mod color;
pub mod config;
pub mod display;
pub mod easing;
pub mod error;
pub mod render;
pub mod transport;
pub mod weather;

pub use error::{Error, Result};

#[derive(Clone, Debug)]
pub struct Settings {
    /// Time between frames.
    pub tick: Duration,

    /// Upper bound on waiting for the network at start-up.
    pub network_wait: Duration,
}

/// Light the start-up indicator, wait for the network, resolve the color pair for `city`
/// once, then animate until `shutdown` resolves. Only an unresolvable city is an error.
pub async fn run<D, C, F>(
    api: &OpenWeather<C>,
    city: &str,
    mut display: D,
    settings: &Settings,
    shutdown: F,
) -> Result<D>
where
    D: Display,
    C: HttpClient,
    F: Future<Output = ()>,
{
    if let Err(e) = display.on() {
        warn!(error = %e, "Unable to light the start-up indicator.");
    }

    if let Some((host, port)) = transport::endpoint_of(api.base_url()) {
        transport::wait_for_network(&host, port, settings.network_wait).await;
    }

    let key = match api.fetch_condition(city).await {
        Ok(key) => key,
        Err(e) => {
            if let Err(e) = display.off() {
                warn!(error = %e, "Unable to switch off output device.");
            }
            return Err(e);
        }
    };

    let pair = ConditionColorTable::global().lookup(&key);
    info!(
        condition = %key,
        primary = ?pair.primary,
        secondary = ?pair.secondary,
        "Animating."
    );

    Ok(RenderLoop::new(display, pair, settings.tick)
        .run(shutdown)
        .await)
}
