use embedded_hal::digital::v2::OutputPin;

use crate::spi_slave::{
  Action,
  Latch,
  Message,
  ShiftRegister,
};
use crate::Error;

pub struct Transport<'a, S, L> {
  pub usi: S,
  led: L,
  latch: &'a Latch,
  state: State,
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum State {
  Disabled,
  Enabled,
}

impl<'a, S, L> Transport<'a, S, L>
where
  S: ShiftRegister,
  L: OutputPin,
{
  pub fn new(usi: S, led: L, latch: &'a Latch) -> Self {
    Transport {
      usi,
      led,
      latch,
      state: State::Disabled,
    }
  }

  /// Put the lines into their deselected state. Call once before the
  /// select interrupt is unmasked.
  pub fn init(&mut self) -> Result<(), L::Error> {
    self.state = State::Disabled;
    self.disarm()
  }

  /// Select line changed. `asserted` is the logical level, so an active-low
  /// line reads as asserted when the pin is low.
  pub fn on_select(&mut self, asserted: bool) -> Result<(), L::Error> {
    if asserted {
      self.handle(Message::SelectAsserted)
    } else {
      self.handle(Message::SelectReleased)
    }
  }

  /// Shift register overflowed, eight bits are in.
  pub fn on_transfer_complete(&mut self) -> Result<(), L::Error> {
    self.handle(Message::TransferComplete)
  }

  pub fn enable(&mut self) -> Result<(), L::Error> {
    self.handle(Message::SelectAsserted)
  }

  /// Safe mid-byte, the partial byte is dropped.
  pub fn disable(&mut self) -> Result<(), L::Error> {
    self.handle(Message::SelectReleased)
  }

  pub fn is_enabled(&self) -> bool {
    self.state == State::Enabled
  }

  /// True while a byte is part way through the shift register. Records the
  /// result in the latch's conflict flag.
  pub fn is_busy(&self) -> bool {
    let busy = self.usi.is_shifting();
    self.latch.set_conflict(busy);
    busy
  }

  /// Stage a byte for the master to clock out. Staging is refused while a
  /// byte is in flight since the same register holds the incoming bits.
  ///
  /// Enabling the transport zeroes the register, so stage after select.
  pub fn put(&mut self, value: u8) -> Result<(), Error> {
    if self.is_busy() {
      return Err(Error::Busy);
    }

    self.usi.write(value);
    Ok(())
  }

  /// The last completed byte. The ready flag is left for the caller.
  pub fn get(&self) -> u8 {
    self.latch.get()
  }

  pub fn latch(&self) -> &'a Latch {
    self.latch
  }

  fn handle(&mut self, msg: Message) -> Result<(), L::Error> {
    let action;
    (self.state, action) = self.state.next(&msg);

    match action {
      Action::Enable => self.arm(),
      Action::Disable => self.disarm(),
      Action::Store => {
        let byte = self.usi.read();
        self.latch.publish(byte);
        self.usi.acknowledge();
        Ok(())
      }
      Action::Discard => {
        self.usi.acknowledge();
        Ok(())
      }
    }
  }

  fn arm(&mut self) -> Result<(), L::Error> {
    // stale edges from before select must not count
    self.usi.reset();
    self.usi.drive_output();
    self.usi.listen();
    self.latch.open();
    self.led.set_high()
  }

  fn disarm(&mut self) -> Result<(), L::Error> {
    self.usi.float_output();
    self.usi.unlisten();
    self.latch.close();
    self.led.set_low()
  }
}

impl State {
  pub fn next(self, msg: &Message) -> (State, Action) {
    match (self, msg) {
      // a repeated select restarts the window
      (_s, Message::SelectAsserted) => {
        (State::Enabled, Action::Enable)
      }
      (_s, Message::SelectReleased) => {
        (State::Disabled, Action::Disable)
      }
      (State::Enabled, Message::TransferComplete) => {
        (State::Enabled, Action::Store)
      }
      (State::Disabled, Message::TransferComplete) => {
        (State::Disabled, Action::Discard)
      }
    }
  }
}
