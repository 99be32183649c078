//! The 2.13" e-paper panel as a [`PixelSurface`]
//!
//! Drawing goes to an in-memory [`FrameBuffer`] that already has the panel's
//! RAM layout. Committing the page pushes it with a full refresh.

use core::convert::Infallible;

use anyhow::{anyhow, Result};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;
use epd_waveshare::epd2in13_v2::{Epd2in13, HEIGHT, WIDTH};
use epd_waveshare::prelude::WaveshareDisplay;

use crate::surface::{FrameBuffer, PixelSurface};

pub struct EpdSurface<SPI, BUSY, DC, RST, DELAY>
where
    SPI: SpiDevice,
    BUSY: InputPin,
    DC: OutputPin,
    RST: OutputPin,
    DELAY: DelayNs,
{
    epd: Epd2in13<SPI, BUSY, DC, RST, DELAY>,
    spi: SPI,
    delay: DELAY,
    frame: FrameBuffer,
}

impl<SPI, BUSY, DC, RST, DELAY> EpdSurface<SPI, BUSY, DC, RST, DELAY>
where
    SPI: SpiDevice,
    BUSY: InputPin,
    DC: OutputPin,
    RST: OutputPin,
    DELAY: DelayNs,
{
    /// Reset and initialise the panel, starting from a white frame
    pub fn new(mut spi: SPI, busy: BUSY, dc: DC, rst: RST, mut delay: DELAY) -> Result<Self> {
        let epd = Epd2in13::new(&mut spi, busy, dc, rst, &mut delay, None)
            .map_err(|e| anyhow!("Panel init failed: {:?}", e))?;

        Ok(Self {
            epd,
            spi,
            delay,
            frame: FrameBuffer::new(WIDTH, HEIGHT),
        })
    }

    /// What the next commit will push
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }
}

impl<SPI, BUSY, DC, RST, DELAY> OriginDimensions for EpdSurface<SPI, BUSY, DC, RST, DELAY>
where
    SPI: SpiDevice,
    BUSY: InputPin,
    DC: OutputPin,
    RST: OutputPin,
    DELAY: DelayNs,
{
    fn size(&self) -> Size {
        self.frame.size()
    }
}

impl<SPI, BUSY, DC, RST, DELAY> DrawTarget for EpdSurface<SPI, BUSY, DC, RST, DELAY>
where
    SPI: SpiDevice,
    BUSY: InputPin,
    DC: OutputPin,
    RST: OutputPin,
    DELAY: DelayNs,
{
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Infallible>
    where
        I: IntoIterator<Item = Pixel<BinaryColor>>,
    {
        self.frame.draw_iter(pixels)
    }

    fn fill_solid(&mut self, area: &Rectangle, color: BinaryColor) -> Result<(), Infallible> {
        self.frame.fill_solid(area, color)
    }

    fn clear(&mut self, color: BinaryColor) -> Result<(), Infallible> {
        self.frame.clear(color)
    }
}

impl<SPI, BUSY, DC, RST, DELAY> PixelSurface for EpdSurface<SPI, BUSY, DC, RST, DELAY>
where
    SPI: SpiDevice,
    BUSY: InputPin,
    DC: OutputPin,
    RST: OutputPin,
    DELAY: DelayNs,
{
    /// Full refresh with the whole frame. The panel keeps its image without
    /// power, so a failed refresh only leaves the previous face visible.
    fn commit_page(&mut self) -> bool {
        let buffer = self.frame.buffer();
        if let Err(e) = self
            .epd
            .update_and_display_frame(&mut self.spi, buffer, &mut self.delay)
        {
            log::error!("Failed to refresh the panel: {:?}", e);
        }
        false
    }
}

/// The panel wired to the VSPI host of the TTGO T5 V2.3
#[cfg(target_os = "espidf")]
mod ttgo {
    use anyhow::Result;
    use esp_idf_svc::hal::delay::Delay;
    use esp_idf_svc::hal::gpio::{self, Gpio16, Gpio17, Gpio18, Gpio23, Gpio4, Gpio5};
    use esp_idf_svc::hal::spi::{self, SpiDeviceDriver, SpiDriver, SPI3};
    use esp_idf_svc::hal::units::FromValueType;

    use super::EpdSurface;
    use crate::board::Pins;

    pub type Panel = EpdSurface<
        SpiDeviceDriver<'static, SpiDriver<'static>>,
        gpio::PinDriver<'static, Gpio4, gpio::Input>,
        gpio::PinDriver<'static, Gpio17, gpio::Output>,
        gpio::PinDriver<'static, Gpio16, gpio::Output>,
        Delay,
    >;

    pub fn open(
        spi3: SPI3,
        sck: Gpio18,
        mosi: Gpio23,
        cs: Gpio5,
        busy: Gpio4,
        dc: Gpio17,
        rst: Gpio16,
    ) -> Result<Panel> {
        log::info!(
            "Configuring display SPI (SCK {}, MOSI {}, CS {})",
            Pins::EPD_SCK,
            Pins::EPD_MOSI,
            Pins::EPD_CS
        );
        let spi = SpiDeviceDriver::new_single(
            spi3,
            sck,
            mosi,
            Option::<gpio::AnyIOPin>::None, // The panel is write only
            Some(cs),
            &spi::SpiDriverConfig::new(),
            &spi::SpiConfig::new().baudrate(4.MHz().into()),
        )?;

        log::info!(
            "Initialising panel (DC {}, RST {}, BUSY {})",
            Pins::EPD_DC,
            Pins::EPD_RST,
            Pins::EPD_BUSY
        );
        EpdSurface::new(
            spi,
            gpio::PinDriver::input(busy)?,
            gpio::PinDriver::output(dc)?,
            gpio::PinDriver::output(rst)?,
            Delay::default(),
        )
    }
}

#[cfg(target_os = "espidf")]
pub use ttgo::{open, Panel};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::BLACK;
    use embedded_hal::digital::ErrorType as PinErrorType;
    use embedded_hal::spi::{ErrorType as SpiErrorType, Operation};

    /// Collects every byte written on the bus
    #[derive(Default)]
    struct WireSpi {
        written: Vec<u8>,
    }

    impl SpiErrorType for WireSpi {
        type Error = Infallible;
    }

    impl SpiDevice for WireSpi {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
            for operation in operations {
                if let Operation::Write(bytes) = operation {
                    self.written.extend_from_slice(bytes);
                }
            }
            Ok(())
        }
    }

    /// Never busy, ignores writes
    struct IdlePin;

    impl PinErrorType for IdlePin {
        type Error = Infallible;
    }

    impl InputPin for IdlePin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(false)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(true)
        }
    }

    impl OutputPin for IdlePin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    type TestPanel = EpdSurface<WireSpi, IdlePin, IdlePin, IdlePin, NoDelay>;

    fn panel() -> TestPanel {
        EpdSurface::new(WireSpi::default(), IdlePin, IdlePin, IdlePin, NoDelay).unwrap()
    }

    #[test]
    fn test_panel_geometry() {
        let panel = panel();
        assert_eq!(panel.size(), Size::new(122, 250));
        assert_eq!(panel.frame().buffer().len(), 16 * 250);
    }

    #[test]
    fn test_commit_pushes_frame() {
        let mut panel = panel();
        panel.fill_screen(crate::surface::WHITE);
        panel.fill_rect(0, 0, 16, 3, BLACK);
        panel.draw_pixel(121, 249, BLACK);
        assert_eq!(panel.frame().pixel(121, 249), Some(BLACK));

        let before = panel.spi.written.len();
        assert!(!panel.commit_page());

        let frame = panel.frame().buffer().to_vec();
        let pushed = &panel.spi.written[before..];
        assert!(pushed.len() >= frame.len());
        assert!(pushed.windows(frame.len()).any(|window| window == frame.as_slice()));
    }
}
