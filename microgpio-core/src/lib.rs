//! Hardware independent half of the microGPIO expander firmware.
//!
//! The expander listens as an SPI slave and accepts two byte commands that
//! set the levels of two output groups. Everything here runs on the host as
//! well as on the target so the protocol can be tested without a board.

#![cfg_attr(not(test), no_std)]

use core::convert::Infallible;

pub mod command;
pub mod outputs;
pub mod spi_slave;

pub use command::{Command, Dispatcher, SelectPolicy};
pub use outputs::OutputGroup;
pub use spi_slave::{Latch, ShiftRegister, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E = Infallible> {
  /// A transfer is mid-flight, try again later.
  Busy,
  /// The byte is not a known opcode and was discarded.
  UnknownOpcode(u8),
  /// An output pin refused the write.
  Pin(E),
}
