use super::{ShiftRegister, EDGES_PER_BYTE};

/// Software model of a slave shift register with an edge counter.
///
/// The master side is driven by hand with [`clock_bit`](Self::clock_bit) or
/// [`clock_byte`](Self::clock_byte). Used to exercise the transport off
/// target.
#[derive(Debug, Default)]
pub struct SimShiftRegister {
  data: u8,
  edges: u8,
  complete: bool,
  driving: bool,
  listening: bool,
}

impl SimShiftRegister {
  pub fn new() -> Self {
    Self::default()
  }

  /// Shift one bit in from the master, MSB first. Returns the bit presented
  /// on data-out, or `None` while the line is floating.
  pub fn clock_bit(&mut self, bit: bool) -> Option<bool> {
    let out = self.data & 0x80 != 0;
    self.data = (self.data << 1) | bit as u8;
    self.edges = (self.edges + 2) % EDGES_PER_BYTE;
    if self.edges == 0 {
      self.complete = true;
    }

    if self.driving {
      Some(out)
    } else {
      None
    }
  }

  /// Shift a whole byte in. Returns the byte presented on data-out, or
  /// `None` if the line floated for any of its bits.
  pub fn clock_byte(&mut self, byte: u8) -> Option<u8> {
    let mut out = Some(0u8);
    for i in (0..8).rev() {
      let bit = self.clock_bit(byte >> i & 1 == 1);
      out = match (out, bit) {
        (Some(acc), Some(b)) => Some(acc << 1 | b as u8),
        _ => None,
      };
    }
    out
  }

  /// A byte completed and the interrupt is enabled.
  pub fn interrupt_pending(&self) -> bool {
    self.complete && self.listening
  }

  pub fn is_driving(&self) -> bool {
    self.driving
  }

  pub fn is_listening(&self) -> bool {
    self.listening
  }
}

impl ShiftRegister for SimShiftRegister {
  fn reset(&mut self) {
    self.edges = 0;
    self.data = 0;
    self.complete = false;
  }

  fn is_shifting(&self) -> bool {
    self.edges != 0
  }

  fn read(&self) -> u8 {
    self.data
  }

  fn write(&mut self, value: u8) {
    self.data = value;
  }

  fn drive_output(&mut self) {
    self.driving = true;
  }

  fn float_output(&mut self) {
    self.driving = false;
  }

  fn listen(&mut self) {
    self.listening = true;
  }

  fn unlisten(&mut self) {
    self.listening = false;
  }

  fn acknowledge(&mut self) {
    self.complete = false;
  }
}
