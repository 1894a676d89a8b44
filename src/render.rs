use std::future::Future;
use std::time::Duration;

use smart_leds::RGB8;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::color::{blend_phase, ColorPair};
use crate::display::Display;
use crate::easing::{self, ease};

pub const DEFAULT_TICK: Duration = Duration::from_millis(50);

/// Drives a [`Display`] at a fixed cadence with one color pair for its whole lifetime.
pub struct RenderLoop<D> {
    display: D,
    pair: ColorPair,
    tick: Duration,
    clock: fn() -> u64,
    device_ok: bool,
}

impl<D: Display> RenderLoop<D> {
    pub fn new(display: D, pair: ColorPair, tick: Duration) -> Self {
        Self {
            display,
            pair,
            tick: tick.max(Duration::from_millis(1)),
            clock: easing::wall_clock_millis,
            device_ok: true,
        }
    }

    /// Replace the wall clock with another millisecond source.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// Compute and push the color for `now_millis`. A failed write is logged and left for
    /// the next frame to retry.
    pub fn render_frame(&mut self, now_millis: u64) -> RGB8 {
        let color = blend_phase(&self.pair, ease(now_millis));

        match self.display.draw(color) {
            Ok(()) if !self.device_ok => {
                info!("Output device recovered.");
                self.device_ok = true;
            }
            Ok(()) => {}
            Err(e) if self.device_ok => {
                warn!(error = %e, "Unable to write to output device, retrying next frame.");
                self.device_ok = false;
            }
            Err(e) => debug!(error = %e, "output device still failing"),
        }

        color
    }

    /// Render until `shutdown` resolves, then switch the display off and hand it back.
    pub async fn run<F: Future<Output = ()>>(mut self, shutdown: F) -> D {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = interval.tick() => {
                    let now = (self.clock)();
                    self.render_frame(now);
                }
            }
        }

        info!("Shutting down.");
        if let Err(e) = self.display.off() {
            warn!(error = %e, "Unable to switch off output device.");
        }

        self.display
    }
}
