//! microGPIO: an SPI slave GPIO expander on the STM32F4-Discovery.
//!
//! The host selects the board on PA4 (active low) and clocks in two byte
//! commands. `D` writes PE0..PE7, `B` writes PB0..PB2. The green LED (PD12)
//! is lit while the board is selected.

#![no_main]
#![no_std]

mod constants;
mod spi_drv;
mod util;

use embedded_hal::digital::v2::InputPin;
use stm32f4xx_hal::{
  prelude::*,
  stm32,
  gpio::gpioa,
  gpio::gpiob,
  gpio::gpiod,
  gpio::gpioe,
  gpio::Edge,
  gpio::ExtiPin,
  gpio::Input,
  gpio::Output,
  gpio::PullUp,
  gpio::PushPull,
};

use microgpio_core::{
  Dispatcher,
  Error,
  Latch,
  OutputGroup,
  Transport,
};

use panic_semihosting as _;

use crate::spi_drv::Spi1Slave;
use crate::util::debugger;

// written by the SPI1 and EXTI4 handlers, drained by idle
static LATCH: Latch = Latch::new();

type Indicator = gpiod::PD12<Output<PushPull>>;
type SelectPin = gpioa::PA4<Input<PullUp>>;
type GroupD = gpioe::PE<Output<PushPull>>;
type GroupB = gpiob::PB<Output<PushPull>>;

#[rtic::app(
  device = stm32f4xx_hal::stm32,
  peripherals = true
)]
const APP: () = {
  struct Resources {
    transport: Transport<'static, Spi1Slave, Indicator>,
    select: SelectPin,
    dispatcher: Dispatcher<GroupD, GroupB>,
  }

  #[init]
  fn init(cx: init::Context) -> init::LateResources {

    debugger::init();
    debugger::print("init", None);

    // device specific peripherals
    let device: stm32::Peripherals = cx.device;
    let mut syscfg = device.SYSCFG;
    let mut exti = device.EXTI;

    device.RCC.apb2enr.modify(|_, w| w.syscfgen().set_bit());
    let rcc = device.RCC.constrain();
    let _clocks = rcc.cfgr.sysclk(constants::CPU_FREQ.hz()).freeze();

    let gpioa = device.GPIOA.split();
    let gpiob = device.GPIOB.split();
    let gpiod = device.GPIOD.split();
    let gpioe = device.GPIOE.split();

    // MISO is floated again by the transport until the first select
    let _sck = gpioa.pa5.into_alternate_af5();
    let _miso = gpioa.pa6.into_alternate_af5();
    let _mosi = gpioa.pa7.into_alternate_af5();

    // select idles high through the pull-up
    let mut select = gpioa.pa4.into_pull_up_input();
    select.make_interrupt_source(&mut syscfg);
    select.trigger_on_edge(&mut exti, Edge::RISING_FALLING);
    select.enable_interrupt(&mut exti);

    let indicator = gpiod.pd12.into_push_pull_output();

    let mut transport = Transport::new(Spi1Slave::new(device.SPI1), indicator, &LATCH);
    transport.init().unwrap();

    let group_d = OutputGroup::new([
      gpioe.pe0.into_push_pull_output().downgrade(),
      gpioe.pe1.into_push_pull_output().downgrade(),
      gpioe.pe2.into_push_pull_output().downgrade(),
      gpioe.pe3.into_push_pull_output().downgrade(),
      gpioe.pe4.into_push_pull_output().downgrade(),
      gpioe.pe5.into_push_pull_output().downgrade(),
      gpioe.pe6.into_push_pull_output().downgrade(),
      gpioe.pe7.into_push_pull_output().downgrade(),
    ]);
    let group_b = OutputGroup::new([
      gpiob.pb0.into_push_pull_output().downgrade(),
      gpiob.pb1.into_push_pull_output().downgrade(),
      gpiob.pb2.into_push_pull_output().downgrade(),
    ]);

    let mut dispatcher = Dispatcher::new(group_d, group_b, constants::SELECT_POLICY);
    match dispatcher.init() {
      Ok(()) => (),
      Err(Error::Pin(e)) => match e {},
      Err(_) => (),
    }

    // a master already holding select gets its window now, not at the next edge
    if select.is_low().unwrap() {
      transport.on_select(true).unwrap();
    }

    init::LateResources {
      transport,
      select,
      dispatcher,
    }
  }

  #[task(binds = EXTI4, priority = 1, resources = [transport, select])]
  fn exti4(cx: exti4::Context) {
    let select = cx.resources.select;
    select.clear_interrupt_pending_bit();

    // active low
    let asserted = select.is_low().unwrap();
    cx.resources.transport.on_select(asserted).unwrap();
  }

  #[task(binds = SPI1, priority = 1, resources = [transport])]
  fn spi1(cx: spi1::Context) {
    cx.resources.transport.on_transfer_complete().unwrap();
  }

  #[idle(resources = [dispatcher])]
  fn idle(cx: idle::Context) -> ! {
    let dispatcher = cx.resources.dispatcher;

    loop {
      // busy poll, a byte must be taken before the next one lands
      match dispatcher.poll(&LATCH) {
        Ok(_) => (),
        Err(Error::UnknownOpcode(op)) => {
          debugger::print("Rejected opcode: ", Some(op.into()));
        }
        Err(Error::Pin(e)) => match e {},
        Err(Error::Busy) => (),
      }
    }
  }
};
