// Port layer for SFUD (Serial Flash Universal Driver) on small no_std
// targets: where the driver's diagnostics go, and how it talks SPI.

#![cfg_attr(not(test), no_std)]

#[cfg(feature = "esp32c3")]
pub mod board;
pub mod diag;
pub mod drivers;
