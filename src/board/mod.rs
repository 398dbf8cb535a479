//! ESP32-C3 wiring for an external SPI NOR flash.
//!
//! Maps the flash chip to SPI2 so that the port layer only ever sees an
//! `embedded_hal::spi::SpiDevice`. Pin numbers are listed in [`pins`].

pub mod pins;

use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::{
    Blocking,
    delay::Delay,
    gpio::{Level, Output, OutputConfig},
    peripherals::Peripherals,
    spi,
    time::Rate,
};

// Type Aliases
pub type SpiBus = spi::master::Spi<'static, Blocking>;
pub type FlashSpi = ExclusiveDevice<SpiBus, Output<'static>, Delay>;

// most SPI NOR parts take 50MHz+ for plain reads; stay conservative
pub const SPI_FREQ_MHZ: u32 = 20;

/// Flash hardware, ready to hand to [`crate::drivers::SpiPort`].
pub struct FlashHw {
    pub spi: FlashSpi,
}

impl FlashHw {
    pub fn init(p: Peripherals) -> Self {
        let cs = Output::new(p.GPIO12, Level::High, OutputConfig::default());

        let spi_cfg = spi::master::Config::default().with_frequency(Rate::from_mhz(SPI_FREQ_MHZ));
        let spi_bus = spi::master::Spi::new(p.SPI2, spi_cfg)
            .unwrap()
            .with_sck(p.GPIO8)
            .with_mosi(p.GPIO10)
            .with_miso(p.GPIO7);

        let spi = ExclusiveDevice::new(spi_bus, cs, Delay::new()).unwrap();

        FlashHw { spi }
    }
}
