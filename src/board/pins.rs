//! GPIO |     Function    |      Notes
//! -----+-----------------+----------------------------------
//!  7   | SPI2 MISO       | Flash DO
//!  8   | SPI2 SCK        | Flash CLK
//! 10   | SPI2 MOSI       | Flash DI
//! 12   | Flash CS        | Active low, idles high

// ----- SPI Bus -----
pub const SPI_SCK: u8 = 8;
pub const SPI_MOSI: u8 = 10;
pub const SPI_MISO: u8 = 7;

// ----- SPI NOR Flash -----
pub const FLASH_CS: u8 = 12;
