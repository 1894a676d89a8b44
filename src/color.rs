use std::collections::HashMap;
use std::sync::LazyLock;

pub use smart_leds::RGB8;

use crate::easing::Phase;
use crate::weather::ConditionKey;

/// The two endpoint colors an indicator oscillates between.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ColorPair {
    pub primary: RGB8,
    pub secondary: RGB8,
}

impl ColorPair {
    pub const fn new(primary: (u8, u8, u8), secondary: (u8, u8, u8)) -> Self {
        Self {
            primary: RGB8 {
                r: primary.0,
                g: primary.1,
                b: primary.2,
            },
            secondary: RGB8 {
                r: secondary.0,
                g: secondary.1,
                b: secondary.2,
            },
        }
    }

    /// Red fading to black, shown whenever the condition could not be determined.
    pub const UNKNOWN: Self = Self::new((255, 0, 0), (0, 0, 0));
}

/// Condition key to color pair. Built once, never mutated.
pub struct ConditionColorTable {
    pairs: HashMap<ConditionKey, ColorPair>,
}

static TABLE: LazyLock<ConditionColorTable> = LazyLock::new(ConditionColorTable::new);

impl ConditionColorTable {
    /// Icon category codes as published by OpenWeather, with the palette for each.
    const PALETTE: [(&'static str, ColorPair); 9] = [
        // clear sky
        ("01", ColorPair::new((255, 190, 0), (255, 90, 0))),
        // few clouds
        ("02", ColorPair::new((255, 190, 0), (170, 170, 190))),
        // scattered clouds
        ("03", ColorPair::new((200, 200, 215), (110, 110, 130))),
        // broken clouds
        ("04", ColorPair::new((140, 140, 155), (60, 60, 80))),
        // shower rain
        ("09", ColorPair::new((0, 70, 255), (110, 180, 255))),
        // rain
        ("10", ColorPair::new((0, 0, 255), (0, 150, 150))),
        // thunderstorm
        ("11", ColorPair::new((110, 0, 200), (255, 230, 0))),
        // snow
        ("13", ColorPair::new((255, 255, 255), (100, 190, 255))),
        // mist
        ("50", ColorPair::new((150, 165, 165), (50, 70, 70))),
    ];

    pub fn new() -> Self {
        let mut pairs: HashMap<ConditionKey, ColorPair> = Self::PALETTE
            .iter()
            .map(|(code, pair)| (ConditionKey::from_icon(code), *pair))
            .collect();
        pairs.insert(ConditionKey::unknown(), ColorPair::UNKNOWN);

        Self { pairs }
    }

    /// The process-wide table.
    pub fn global() -> &'static Self {
        &TABLE
    }

    /// Never fails: keys missing from the table resolve to [`ColorPair::UNKNOWN`].
    pub fn lookup(&self, key: &ConditionKey) -> ColorPair {
        self.pairs
            .get(key)
            .copied()
            .unwrap_or(ColorPair::UNKNOWN)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.pairs.len()
    }
}

impl Default for ConditionColorTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Interpolate between the two colors of `pair`. Forward runs primary to secondary as
/// `fraction` goes from 0 to 1, backward runs secondary to primary.
pub fn blend(pair: &ColorPair, fraction: f64, forward: bool) -> RGB8 {
    let (from, to) = if forward {
        (pair.primary, pair.secondary)
    } else {
        (pair.secondary, pair.primary)
    };
    let fraction = if fraction.is_nan() {
        0.
    } else {
        fraction.clamp(0., 1.)
    };

    RGB8 {
        r: lerp_channel(from.r, to.r, fraction),
        g: lerp_channel(from.g, to.g, fraction),
        b: lerp_channel(from.b, to.b, fraction),
    }
}

pub fn blend_phase(pair: &ColorPair, phase: Phase) -> RGB8 {
    blend(pair, phase.fraction, phase.forward)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lerp_channel(from: u8, to: u8, fraction: f64) -> u8 {
    let from = f64::from(from);
    let to = f64::from(to);
    (from + fraction * (to - from)).round().clamp(0., 255.) as u8
}
