//! SD card slot, mounted as a FAT volume
//
// See https://github.com/esp-rs/esp-idf-svc/blob/master/examples/sd_spi.rs

use anyhow::Result;
use esp_idf_svc::fs::fatfs::Fatfs;
use esp_idf_svc::hal::gpio::{AnyIOPin, Gpio13, Gpio15, Gpio2, Gpio26};
use esp_idf_svc::hal::sd::spi::SdSpiHostDriver;
use esp_idf_svc::hal::sd::{SdCardConfiguration, SdCardDriver};
use esp_idf_svc::hal::spi::{Dma, SpiDriver, SpiDriverConfig, SPI2};
use esp_idf_svc::io::vfs::MountedFatfs;

use super::Pins;

/// VFS path the card is mounted on
pub const MOUNT_POINT: &str = "/sdcard";

/// Directory holding the `<expression>.bmp` images
pub const FACES_DIR: &str = "/sdcard/faces";

const MAX_OPEN_FILES: usize = 4;

/// Keeps the card mounted for as long as it is alive
pub type SdCard = MountedFatfs<Fatfs<SdCardDriver<SdSpiHostDriver<'static, SpiDriver<'static>>>>>;

pub fn mount(spi2: SPI2, sclk: Gpio13, mosi: Gpio15, miso: Gpio26, cs: Gpio2) -> Result<SdCard> {
    log::info!(
        "Mounting SD card (SCLK {}, MOSI {}, MISO {}, CS {})",
        Pins::SD_SCLK,
        Pins::SD_MOSI,
        Pins::SD_MISO,
        Pins::SD_CS
    );

    let spi = SpiDriver::new(
        spi2,
        sclk,
        mosi,
        Some(miso),
        &SpiDriverConfig::default().dma(Dma::Auto(4096)),
    )?;

    let host = SdSpiHostDriver::new(
        spi,
        Some(cs),
        AnyIOPin::none(),
        AnyIOPin::none(),
        AnyIOPin::none(),
        None,
    )?;
    let card = SdCardDriver::new_spi(host, &SdCardConfiguration::new())?;

    let mounted = MountedFatfs::mount(Fatfs::new_sdcard(0, card)?, MOUNT_POINT, MAX_OPEN_FILES)?;
    log::info!("SD card mounted at {}", MOUNT_POINT);
    Ok(mounted)
}
