use std::fmt;

use smart_leds::RGB8;

pub mod console;
pub mod ws2812;

pub use console::Console;
pub use ws2812::Ws2812;

/// An ambient color output: a terminal readout or a strip of addressable LEDs.
pub trait Display {
    type Err: fmt::Debug + fmt::Display;

    /// Initialize the device and light the start-up indicator.
    fn on(&mut self) -> Result<(), Self::Err>;

    /// Blank the output and power it down.
    fn off(&mut self) -> Result<(), Self::Err>;

    /// Set every pixel to `color`. Nothing is visible until [`Display::show`].
    fn set_color(&mut self, color: RGB8) -> Result<(), Self::Err>;

    /// Push the pending pixel colors out to the device.
    fn show(&mut self) -> Result<(), Self::Err>;

    /// Get the number of pixels driven by the device.
    fn pixel_count(&self) -> usize;

    fn draw(&mut self, color: RGB8) -> Result<(), Self::Err> {
        self.set_color(color)?;
        self.show()
    }
}
