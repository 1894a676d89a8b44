//! Breathing pulse timing. The phase is recomputed from the clock on every call, so a
//! restarted process picks up the cycle wherever the wall clock says it should be.

use std::f64::consts::PI;

/// Length of a full there-and-back cycle.
pub const CYCLE_MILLIS: u64 = 4000;

/// Length of one direction of travel.
pub const HALF_CYCLE_MILLIS: u64 = CYCLE_MILLIS / 2;

/// Where in the cycle a given instant falls.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Phase {
    /// Eased blend fraction in `[0, 1]`.
    pub fraction: f64,

    /// True while travelling from the primary color to the secondary one.
    pub forward: bool,
}

pub fn ease(now_millis: u64) -> Phase {
    let mut t = now_millis % CYCLE_MILLIS;
    let forward = t < HALF_CYCLE_MILLIS;
    if !forward {
        t -= HALF_CYCLE_MILLIS;
    }

    #[allow(clippy::cast_precision_loss)]
    let u = t as f64 / HALF_CYCLE_MILLIS as f64;

    Phase {
        // ease-in-out sine: zero velocity at both ends of the half cycle
        fraction: (-0.5 * ((PI * u).cos() - 1.)).clamp(0., 1.),
        forward,
    }
}

/// Milliseconds since the Unix epoch.
pub fn wall_clock_millis() -> u64 {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    u64::try_from(nanos).unwrap_or_default()
}
