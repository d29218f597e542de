//! Two byte command protocol.
//!
//! Every command is an opcode byte followed by one argument byte:
//!
//! | opcode | argument                                   |
//! |--------|--------------------------------------------|
//! | `D`    | written verbatim to the 8 pin group        |
//! | `B`    | low three bits written to the 3 pin group  |
//!
//! Anything else in opcode position is discarded and the very next byte is
//! tried as an opcode again.

use embedded_hal::digital::v2::OutputPin;

use crate::outputs::OutputGroup;
use crate::spi_slave::Latch;
use crate::Error;

pub const OPCODE_SET_D: u8 = b'D';
pub const OPCODE_SET_B: u8 = b'B';

/// Bits of a `B` argument that reach the pins.
pub const GROUP_B_MASK: u8 = 0b0000_0111;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Command {
  SetD(u8),
  SetB(u8),
}

impl Command {
  /// Bytes in the order the host clocks them out.
  pub fn to_bytes(self) -> [u8; 2] {
    match self {
      Command::SetD(v) => [OPCODE_SET_D, v],
      Command::SetB(v) => [OPCODE_SET_B, v],
    }
  }

  pub fn parse(bytes: [u8; 2]) -> Result<Command, Error> {
    Opcode::from_byte(bytes[0])
      .map(|op| op.with(bytes[1]))
      .ok_or(Error::UnknownOpcode(bytes[0]))
  }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Opcode {
  SetD,
  SetB,
}

impl Opcode {
  pub fn from_byte(byte: u8) -> Option<Opcode> {
    match byte {
      OPCODE_SET_D => Some(Opcode::SetD),
      OPCODE_SET_B => Some(Opcode::SetB),
      _ => None,
    }
  }

  fn with(self, arg: u8) -> Command {
    match self {
      Opcode::SetD => Command::SetD(arg),
      Opcode::SetB => Command::SetB(arg & GROUP_B_MASK),
    }
  }
}

/// What to do with the sequence position when the master opens a new select
/// window in the middle of a command.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SelectPolicy {
  /// Keep waiting for the argument. A byte from the new window is taken as
  /// the stale command's argument.
  Preserve,
  /// Drop the half received command, the new window starts on an opcode.
  Resync,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum State {
  AwaitingOpcode,
  AwaitingArgument(Opcode),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Action {
  Wait,
  Reject(u8),
  Apply(Command),
}

pub struct Dispatcher<D, B> {
  group_d: OutputGroup<D, 8>,
  group_b: OutputGroup<B, 3>,
  policy: SelectPolicy,
  state: State,
  window: u32,
}

impl<D, B, E> Dispatcher<D, B>
where
  D: OutputPin<Error = E>,
  B: OutputPin<Error = E>,
{
  pub fn new(group_d: OutputGroup<D, 8>, group_b: OutputGroup<B, 3>, policy: SelectPolicy) -> Self {
    Dispatcher {
      group_d,
      group_b,
      policy,
      state: State::AwaitingOpcode,
      window: 0,
    }
  }

  /// Drive both groups low and wait for an opcode.
  pub fn init(&mut self) -> Result<(), Error<E>> {
    self.reset();
    self.group_d.write(0).map_err(Error::Pin)?;
    self.group_b.write(0).map_err(Error::Pin)?;
    Ok(())
  }

  /// Forget any half received command.
  pub fn reset(&mut self) {
    self.state = State::AwaitingOpcode;
  }

  pub fn is_awaiting_argument(&self) -> bool {
    match self.state {
      State::AwaitingArgument(_) => true,
      State::AwaitingOpcode => false,
    }
  }

  /// Consume the latched byte if there is one.
  ///
  /// Returns the command that completed with this byte, `None` if nothing
  /// was waiting or the byte was an opcode. A poll with nothing waiting
  /// still notices a new select window.
  pub fn poll(&mut self, latch: &Latch) -> Result<Option<Command>, Error<E>> {
    if !latch.is_ready() {
      self.enter_window(latch.window());
      return Ok(None);
    }

    // the byte is judged by the window it arrived in, not the current one
    let (byte, window) = latch.get_stamped();
    self.enter_window(window);

    let result = self.feed(byte);
    latch.clear();
    result
  }

  fn enter_window(&mut self, window: u32) {
    if window == self.window {
      return;
    }
    self.window = window;
    if self.policy == SelectPolicy::Resync {
      self.reset();
    }
  }

  pub fn feed(&mut self, byte: u8) -> Result<Option<Command>, Error<E>> {
    let action;
    (self.state, action) = self.state.next(byte);

    match action {
      Action::Wait => Ok(None),
      Action::Reject(op) => Err(Error::UnknownOpcode(op)),
      Action::Apply(cmd) => {
        self.apply(cmd)?;
        Ok(Some(cmd))
      }
    }
  }

  pub fn apply(&mut self, cmd: Command) -> Result<(), Error<E>> {
    let result = match cmd {
      Command::SetD(v) => self.group_d.write(v),
      Command::SetB(v) => self.group_b.write(v & GROUP_B_MASK),
    };
    result.map_err(Error::Pin)
  }

  pub fn level_d(&self) -> u8 {
    self.group_d.level()
  }

  pub fn level_b(&self) -> u8 {
    self.group_b.level()
  }
}

impl State {
  pub fn next(self, byte: u8) -> (State, Action) {
    match (self, Opcode::from_byte(byte)) {
      (State::AwaitingOpcode, Some(op)) => {
        (State::AwaitingArgument(op), Action::Wait)
      }
      (State::AwaitingOpcode, None) => {
        (State::AwaitingOpcode, Action::Reject(byte))
      }
      (State::AwaitingArgument(op), _) => {
        (State::AwaitingOpcode, Action::Apply(op.with(byte)))
      }
    }
  }
}
