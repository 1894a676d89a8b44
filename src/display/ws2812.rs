use rppal::{gpio, spi};
use smart_leds::RGB8;
use thiserror::Error;

use super::Display;

#[derive(Debug, Error)]
pub enum LedError {
    #[error("GPIO: {0}")]
    Gpio(#[from] gpio::Error),

    #[error("SPI: {0}")]
    Spi(#[from] spi::Error),

    #[error("short SPI write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },
}

/// WS2812 ("NeoPixel") strip on the Raspberry Pi SPI0 MOSI pin, with a plain status LED
/// that stays lit from power-on until the first frame is shown.
pub struct Ws2812 {
    hardware_interface: Box<dyn HardwareInterface + Send>,
    pixels: Vec<RGB8>,
    brightness: u8,
    buffer: Vec<u8>,
    status_lit: bool,
}

impl Ws2812 {
    const PIN_STATUS: u8 = 27; // Start-up indicator (high = lit)

    const SPI_CLOCK_HZ: u32 = 3_000_000; // 3 MHz = 333 ns, four SPI bits per LED bit

    const LATCH_BYTES: usize = 140; // >280 µs low to latch

    /// A frame has to fit into one spidev transfer (4096 bytes by default); splitting it
    /// would let the strip latch halfway through.
    const MAX_PIXELS: usize = (4096 - Self::LATCH_BYTES) / 12;

    /// Two LED bits per SPI byte: `0` is sent as `1000`, `1` as `1110`.
    const PATTERNS: [u8; 4] = [0b1000_1000, 0b1000_1110, 0b1110_1000, 0b1110_1110];

    const STARTUP_COLOR: RGB8 = RGB8 { r: 0, g: 0, b: 40 };

    pub fn new(pixel_count: usize, brightness: u8) -> Result<Self, LedError> {
        let gpio = gpio::Gpio::new()?;

        Ok(Self::with_interface(
            Box::new(LedHardwareInterface {
                spi: spi::Spi::new(
                    spi::Bus::Spi0,
                    spi::SlaveSelect::Ss0,
                    Self::SPI_CLOCK_HZ,
                    spi::Mode::Mode0,
                )?,
                pin_status: gpio.get(Self::PIN_STATUS)?.into_output_low(),
            }),
            pixel_count,
            brightness,
        ))
    }

    fn with_interface(
        hardware_interface: Box<dyn HardwareInterface + Send>,
        pixel_count: usize,
        brightness: u8,
    ) -> Self {
        let pixel_count = pixel_count.clamp(1, Self::MAX_PIXELS);

        Self {
            hardware_interface,
            pixels: vec![RGB8::default(); pixel_count],
            brightness,
            buffer: Vec::with_capacity(pixel_count * 12 + Self::LATCH_BYTES),
            status_lit: false,
        }
    }

    fn set_status(&mut self, lit: bool) {
        if self.status_lit != lit {
            self.hardware_interface.set_status(if lit {
                gpio::Level::High
            } else {
                gpio::Level::Low
            });
            self.status_lit = lit;
        }
    }

    fn encode(&mut self) {
        self.buffer.clear();
        let corrected = smart_leds::gamma(smart_leds::brightness(
            self.pixels.iter().copied(),
            self.brightness,
        ));
        for pixel in corrected {
            for byte in [pixel.g, pixel.r, pixel.b] {
                for shift in [6, 4, 2, 0] {
                    self.buffer
                        .push(Self::PATTERNS[usize::from((byte >> shift) & 0b11)]);
                }
            }
        }
        self.buffer
            .extend(std::iter::repeat(0x00).take(Self::LATCH_BYTES));
    }

    fn write_buffer(&mut self) -> Result<(), LedError> {
        let written = self.hardware_interface.write_to_spi(&self.buffer)?;
        if written != self.buffer.len() {
            return Err(LedError::ShortWrite {
                written,
                expected: self.buffer.len(),
            });
        }
        Ok(())
    }
}

impl Display for Ws2812 {
    type Err = LedError;

    fn on(&mut self) -> Result<(), Self::Err> {
        self.set_status(true);
        self.set_color(Self::STARTUP_COLOR)?;
        self.encode();
        self.write_buffer()
    }

    fn off(&mut self) -> Result<(), Self::Err> {
        self.set_status(false);
        self.set_color(RGB8::default())?;
        self.encode();
        self.write_buffer()
    }

    fn set_color(&mut self, color: RGB8) -> Result<(), Self::Err> {
        self.pixels.iter_mut().for_each(|pixel| *pixel = color);
        Ok(())
    }

    fn show(&mut self) -> Result<(), Self::Err> {
        self.set_status(false);
        self.encode();
        self.write_buffer()
    }

    fn pixel_count(&self) -> usize {
        self.pixels.len()
    }
}

struct LedHardwareInterface {
    spi: spi::Spi,
    pin_status: gpio::OutputPin,
}

impl HardwareInterface for LedHardwareInterface {
    fn set_status(&mut self, level: gpio::Level) {
        self.pin_status.write(level)
    }

    fn write_to_spi(&mut self, buffer: &[u8]) -> Result<usize, spi::Error> {
        self.spi.write(buffer)
    }
}

trait HardwareInterface {
    fn set_status(&mut self, level: gpio::Level);

    fn write_to_spi(&mut self, data: &[u8]) -> Result<usize, spi::Error>;
}
