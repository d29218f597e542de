use embedded_hal_mock::pin::{
  Mock as PinMock,
  State as PinState,
  Transaction as PinTransaction,
};
use embedded_hal_mock::MockError;

use microgpio_core::{
  Command,
  Dispatcher,
  Error,
  Latch,
  OutputGroup,
  SelectPolicy,
  Transport,
};
use microgpio_core::spi_slave::SimShiftRegister;

fn group<const N: usize>(writes: &[u8]) -> [PinMock; N] {
  core::array::from_fn(|i| {
    let expectations: Vec<PinTransaction> = writes.iter()
      .map(|w| {
        if *w >> i & 1 == 1 {
          PinTransaction::set(PinState::High)
        } else {
          PinTransaction::set(PinState::Low)
        }
      })
      .collect();
    PinMock::new(&expectations)
  })
}

/// One slave on a simulated bus, with the master side driven by the test.
struct Bus {
  latch: &'static Latch,
  transport: Transport<'static, SimShiftRegister, PinMock>,
  dispatcher: Dispatcher<PinMock, PinMock>,
  led: PinMock,
  d: [PinMock; 8],
  b: [PinMock; 3],
}

impl Bus {
  fn new(windows: usize, d_writes: &[u8], b_writes: &[u8], policy: SelectPolicy) -> Self {
    let latch: &'static Latch = Box::leak(Box::new(Latch::new()));

    let mut indicator = vec![PinTransaction::set(PinState::Low)];
    for _ in 0..windows {
      indicator.push(PinTransaction::set(PinState::High));
      indicator.push(PinTransaction::set(PinState::Low));
    }
    let led = PinMock::new(&indicator);

    let d = group::<8>(d_writes);
    let b = group::<3>(b_writes);

    let mut transport = Transport::new(SimShiftRegister::new(), led.clone(), latch);
    transport.init().unwrap();

    let dispatcher = Dispatcher::new(
      OutputGroup::new(d.clone()),
      OutputGroup::new(b.clone()),
      policy,
    );

    Bus { latch, transport, dispatcher, led, d, b }
  }

  fn select(&mut self) {
    self.transport.on_select(true).unwrap();
  }

  fn deselect(&mut self) {
    self.transport.on_select(false).unwrap();
  }

  /// Clock a byte in and let the slave finish handling it.
  fn send(&mut self, byte: u8) -> Result<Option<Command>, Error<MockError>> {
    self.clock(byte);
    self.dispatcher.poll(self.latch)
  }

  /// Clock a byte in without giving the main loop a turn.
  fn clock(&mut self, byte: u8) {
    self.transport.usi.clock_byte(byte);
    if self.transport.usi.interrupt_pending() {
      self.transport.on_transfer_complete().unwrap();
    }
  }

  fn done(mut self) {
    self.led.done();
    for pin in self.d.iter_mut().chain(self.b.iter_mut()) {
      pin.done();
    }
  }
}

#[test]
fn set_mask_and_reject() {
  let mut bus = Bus::new(1, &[0x2A], &[0x07], SelectPolicy::Resync);

  bus.select();
  assert_eq!(bus.send(b'D'), Ok(None));
  assert_eq!(bus.send(0x2A), Ok(Some(Command::SetD(0x2A))));
  assert_eq!(bus.dispatcher.level_d(), 0x2A);

  assert_eq!(bus.send(b'B'), Ok(None));
  assert_eq!(bus.send(0xFF), Ok(Some(Command::SetB(0x07))));
  assert_eq!(bus.dispatcher.level_b(), 0x07);

  assert_eq!(bus.send(b'Q'), Err(Error::UnknownOpcode(b'Q')));
  assert_eq!(bus.send(0x01), Err(Error::UnknownOpcode(0x01)));
  assert_eq!(bus.dispatcher.level_d(), 0x2A);
  assert_eq!(bus.dispatcher.level_b(), 0x07);
  bus.deselect();

  bus.done();
}

#[test]
fn host_encoded_commands_apply() {
  let mut bus = Bus::new(2, &[0b0010_0101], &[0x03], SelectPolicy::Resync);

  for cmd in [Command::SetD(0b0010_0101), Command::SetB(0x03)].iter() {
    bus.select();
    let [op, arg] = cmd.to_bytes();
    bus.send(op).unwrap();
    assert_eq!(bus.send(arg), Ok(Some(*cmd)));
    bus.deselect();
  }

  bus.done();
}

#[test]
fn outputs_survive_deselect() {
  let mut bus = Bus::new(2, &[0x99], &[], SelectPolicy::Resync);

  bus.select();
  bus.send(b'D').unwrap();
  bus.send(0x99).unwrap();
  bus.deselect();
  bus.select();
  assert_eq!(bus.dispatcher.level_d(), 0x99);
  bus.deselect();

  bus.done();
}

#[test]
fn deselect_floats_data_line_mid_command() {
  let mut bus = Bus::new(1, &[], &[], SelectPolicy::Preserve);

  bus.select();
  assert!(bus.transport.usi.is_driving());
  bus.send(b'D').unwrap();
  assert!(bus.dispatcher.is_awaiting_argument());

  bus.deselect();
  assert!(!bus.transport.usi.is_driving());
  assert!(!bus.latch.is_enabled());

  bus.done();
}

#[test]
fn bytes_outside_select_window_are_ignored() {
  let mut bus = Bus::new(1, &[0x0F], &[], SelectPolicy::Resync);

  assert_eq!(bus.send(b'D'), Ok(None));
  assert!(!bus.dispatcher.is_awaiting_argument());

  bus.select();
  bus.send(b'D').unwrap();
  assert_eq!(bus.send(0x0F), Ok(Some(Command::SetD(0x0F))));
  bus.deselect();

  bus.done();
}

#[test]
fn reselect_mid_command_starts_fresh_with_resync() {
  let mut bus = Bus::new(2, &[], &[0x05], SelectPolicy::Resync);

  bus.select();
  bus.send(b'D').unwrap();
  bus.deselect();

  bus.select();
  assert_eq!(bus.send(b'B'), Ok(None));
  assert_eq!(bus.send(0x05), Ok(Some(Command::SetB(0x05))));
  bus.deselect();

  bus.done();
}

#[test]
fn many_empty_windows_still_start_fresh_with_resync() {
  let windows = 1 + 256 + 1;
  let mut bus = Bus::new(windows, &[], &[0x05], SelectPolicy::Resync);

  bus.select();
  bus.send(b'D').unwrap();
  bus.deselect();

  // a byte's worth of windows with no traffic and no main loop turn
  for _ in 0..256 {
    bus.select();
    bus.deselect();
  }

  bus.select();
  assert_eq!(bus.send(b'B'), Ok(None));
  assert_eq!(bus.send(0x05), Ok(Some(Command::SetB(0x05))));
  bus.deselect();

  bus.done();
}

#[test]
fn idle_poll_after_reselect_drops_half_command() {
  let mut bus = Bus::new(2, &[], &[], SelectPolicy::Resync);

  bus.select();
  bus.send(b'D').unwrap();
  assert!(bus.dispatcher.is_awaiting_argument());
  bus.deselect();

  bus.select();
  assert_eq!(bus.dispatcher.poll(bus.latch), Ok(None));
  assert!(!bus.dispatcher.is_awaiting_argument());
  bus.deselect();

  bus.done();
}

#[test]
fn reselect_mid_command_keeps_stale_opcode_with_preserve() {
  // the new window's opcode is taken as the old command's argument
  let mut bus = Bus::new(2, &[b'B'], &[], SelectPolicy::Preserve);

  bus.select();
  bus.send(b'D').unwrap();
  bus.deselect();

  bus.select();
  assert_eq!(bus.send(b'B'), Ok(Some(Command::SetD(b'B'))));
  assert_eq!(bus.send(0x05), Err(Error::UnknownOpcode(0x05)));
  bus.deselect();

  bus.done();
}

#[test]
fn unconsumed_byte_is_overwritten() {
  let mut bus = Bus::new(1, &[], &[], SelectPolicy::Resync);

  bus.select();
  bus.clock(b'D');
  bus.clock(0x2A);
  assert_eq!(bus.dispatcher.poll(bus.latch), Err(Error::UnknownOpcode(0x2A)));
  assert_eq!(bus.dispatcher.poll(bus.latch), Ok(None));
  bus.deselect();

  bus.done();
}
