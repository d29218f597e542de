//! SPI slave transport.
//!
//! The transport is split in two. [`Transport`] owns the shift register and
//! the indicator and is driven from the select-line and transfer-complete
//! interrupts. [`Latch`] is the only state shared with the main loop and
//! holds the last completed byte plus its ready flag.
//!
//! Every field of the latch has exactly one writer:
//!
//! | field      | written by                 | read by              |
//! |------------|----------------------------|----------------------|
//! | `data`     | transfer-complete handler  | main loop            |
//! | `ready`    | handler sets, main clears  | main loop            |
//! | `enabled`  | select handler             | anyone               |
//! | `session`  | select handler             | main loop            |
//! | `conflict` | main loop (`is_busy`)      | anyone               |
//!
//! `ready` is the one exception: the handler sets it and the main loop
//! clears it. A byte that completes before the previous one was consumed
//! overwrites it and the old byte is lost.
//!
//! `data` packs the byte with the window it arrived in (low 24 bits of
//! `session`) so both are published by a single store.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

pub mod sim;
mod transport;

pub use sim::SimShiftRegister;
pub use transport::Transport;

/// Number of clock half-edges that make up one byte.
pub const EDGES_PER_BYTE: u8 = 16;

/// Bits of the session counter kept with each latched byte.
pub const WINDOW_MASK: u32 = 0x00FF_FFFF;

/// The serial shift register of the slave peripheral.
pub trait ShiftRegister {
  /// Zero the edge counter and the data register, dropping any pending
  /// completion.
  fn reset(&mut self);
  /// True while a byte is partially shifted.
  fn is_shifting(&self) -> bool;
  fn read(&self) -> u8;
  /// Stage a byte to be shifted out on the next transfer.
  fn write(&mut self, value: u8);
  /// Turn the data-out line into a driven output.
  fn drive_output(&mut self);
  /// Return the data-out line to high impedance.
  fn float_output(&mut self);
  /// Enable the transfer-complete interrupt.
  fn listen(&mut self);
  fn unlisten(&mut self);
  /// Clear the transfer-complete flag so the next byte can raise it.
  fn acknowledge(&mut self);
}

pub struct Latch {
  data: AtomicU32,
  ready: AtomicBool,
  enabled: AtomicBool,
  session: AtomicU32,
  conflict: AtomicBool,
}

impl Latch {
  pub const fn new() -> Self {
    Latch {
      data: AtomicU32::new(0),
      ready: AtomicBool::new(false),
      enabled: AtomicBool::new(false),
      session: AtomicU32::new(0),
      conflict: AtomicBool::new(false),
    }
  }

  /// True once a complete byte is waiting in the latch.
  pub fn is_ready(&self) -> bool {
    self.ready.load(Ordering::Acquire)
  }

  /// The most recently completed byte. Does not touch the ready flag.
  pub fn get(&self) -> u8 {
    self.data.load(Ordering::Relaxed) as u8
  }

  /// The most recently completed byte together with the window it arrived
  /// in, as returned by [`Latch::window`] at that time.
  pub fn get_stamped(&self) -> (u8, u32) {
    let word = self.data.load(Ordering::Relaxed);
    (word as u8, word >> 8)
  }

  /// Mark the current byte as consumed.
  pub fn clear(&self) {
    self.ready.store(false, Ordering::Release);
  }

  pub fn is_enabled(&self) -> bool {
    self.enabled.load(Ordering::Acquire)
  }

  /// Counts select windows, wrapping. Changes every time the transport is
  /// enabled.
  pub fn session(&self) -> u32 {
    self.session.load(Ordering::Acquire)
  }

  /// The current select window, truncated the way latched bytes carry it.
  pub fn window(&self) -> u32 {
    self.session() & WINDOW_MASK
  }

  /// Whether the last `is_busy` check found a transfer in flight.
  pub fn conflict(&self) -> bool {
    self.conflict.load(Ordering::Relaxed)
  }

  // the data store must land before the flag
  fn publish(&self, byte: u8) {
    // same priority as `open`, so the session cannot move under us
    let window = self.session.load(Ordering::Relaxed) & WINDOW_MASK;
    self.data.store(window << 8 | u32::from(byte), Ordering::Relaxed);
    self.ready.store(true, Ordering::Release);
  }

  fn open(&self) {
    self.ready.store(false, Ordering::Release);
    // single writer, no read-modify-write needed
    let session = self.session.load(Ordering::Relaxed).wrapping_add(1);
    self.session.store(session, Ordering::Release);
    self.enabled.store(true, Ordering::Release);
  }

  fn close(&self) {
    self.enabled.store(false, Ordering::Release);
  }

  fn set_conflict(&self, conflict: bool) {
    self.conflict.store(conflict, Ordering::Relaxed);
  }
}

impl Default for Latch {
  fn default() -> Self {
    Latch::new()
  }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Message {
  SelectAsserted,
  SelectReleased,
  TransferComplete,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Action {
  Enable,
  Disable,
  Store,
  Discard,
}
