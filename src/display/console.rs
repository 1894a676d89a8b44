use std::io::{self, Write};

use smart_leds::RGB8;
use tracing::info;

use super::Display;

/// Prints one `(r, g, b)` line per frame and nothing else.
pub struct Console<W = io::Stdout> {
    out: W,
    pending: Option<RGB8>,
}

impl Console {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Console<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out, pending: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Display for Console<W> {
    type Err = io::Error;

    fn on(&mut self) -> Result<(), Self::Err> {
        info!("Starting up...");
        Ok(())
    }

    fn off(&mut self) -> Result<(), Self::Err> {
        self.pending = None;
        self.out.flush()
    }

    fn set_color(&mut self, color: RGB8) -> Result<(), Self::Err> {
        self.pending = Some(color);
        Ok(())
    }

    fn show(&mut self) -> Result<(), Self::Err> {
        if let Some(RGB8 { r, g, b }) = self.pending.take() {
            writeln!(self.out, "({}, {}, {})", r, g, b)?;
        }
        self.out.flush()
    }

    fn pixel_count(&self) -> usize {
        1
    }
}
