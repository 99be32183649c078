//! GPIO assignments of the TTGO T5 V2.3 board

/// Pin configuration constants for the e-paper panel, SD card slot and button
pub struct Pins;

#[allow(dead_code)]
impl Pins {
    // E-paper panel, on the VSPI host
    /// Chip Select pin for the panel
    pub const EPD_CS: u8 = 5;
    /// Data/Command control pin (High for data, Low for command)
    pub const EPD_DC: u8 = 17;
    /// Reset pin for the panel
    pub const EPD_RST: u8 = 16;
    /// Busy status pin (High while the panel refreshes)
    pub const EPD_BUSY: u8 = 4;
    /// SPI Clock pin
    pub const EPD_SCK: u8 = 18;
    /// SPI Master Out Slave In
    pub const EPD_MOSI: u8 = 23;

    // TF Card (SD Card), on the HSPI host
    /// TF Card Chip Select
    pub const SD_CS: u8 = 2;
    /// TF Card Master Out Slave In
    pub const SD_MOSI: u8 = 15;
    /// TF Card Master In Slave Out
    pub const SD_MISO: u8 = 26;
    /// TF Card Clock
    pub const SD_SCLK: u8 = 13;

    /// User button, input only
    pub const BUTTON: u8 = 39;
}
