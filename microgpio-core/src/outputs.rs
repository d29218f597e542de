use embedded_hal::digital::v2::OutputPin;

/// A set of up to eight pins written together as one value. Bit `i` of the
/// value drives `pins[i]`; bits above `N` are ignored.
pub struct OutputGroup<P, const N: usize> {
  pins: [P; N],
  level: u8,
}

impl<P: OutputPin, const N: usize> OutputGroup<P, N> {
  pub const MASK: u8 = ((1u16 << N) - 1) as u8;

  pub fn new(pins: [P; N]) -> Self {
    OutputGroup {
      pins,
      level: 0,
    }
  }

  pub fn write(&mut self, value: u8) -> Result<(), P::Error> {
    let value = value & Self::MASK;

    for (i, pin) in self.pins.iter_mut().enumerate() {
      if value >> i & 1 == 1 {
        pin.set_high()?;
      } else {
        pin.set_low()?;
      }
    }

    self.level = value;
    Ok(())
  }

  /// Last value written.
  pub fn level(&self) -> u8 {
    self.level
  }

  pub fn release(self) -> [P; N] {
    self.pins
  }
}
