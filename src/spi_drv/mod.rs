//! SPI1 wired as the expander's slave port.
//!
//! | signal | pin |
//! |--------|-----|
//! | NSS    | PA4 (plain input, EXTI4) |
//! | SCK    | PA5 |
//! | MISO   | PA6 |
//! | MOSI   | PA7 |

pub mod spi1;

pub use spi1::Spi1Slave;
