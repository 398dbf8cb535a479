// Port-side driver hooks, board-independent.
//
// The flash protocol itself lives in the SFUD core; this side only
// moves bytes over SPI and paces the busy-wait loops.

pub mod spi_port;

pub use spi_port::{RetryConfig, SFUD_SUCCESS, SfudError, SpiPort};
