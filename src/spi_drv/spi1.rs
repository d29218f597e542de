use stm32f4xx_hal::stm32;

use microgpio_core::ShiftRegister;

/// SPI1 in slave mode, 8 bit frames, MSB first, mode 0.
///
/// The NSS pin is not used by the peripheral. Slave selection is software
/// managed through SSI so the select interrupt decides when bits count.
pub struct Spi1Slave {
  spi: stm32::SPI1,
}

impl Spi1Slave {
  pub fn new(spi: stm32::SPI1) -> Self {
    let rcc = unsafe { &(*stm32::RCC::ptr()) };
    rcc.apb2enr.modify(|_, w| w.spi1en().set_bit());

    spi.cr2.write(|w| w.rxneie().clear_bit());
    spi.cr1.write(|w| w
      .bidimode().clear_bit()
      .dff().clear_bit()
      .lsbfirst().clear_bit()
      .cpol().clear_bit()
      .cpha().clear_bit()
      .mstr().clear_bit()
      .ssm().set_bit()
      .ssi().set_bit()
      .spe().set_bit()
    );

    Spi1Slave { spi }
  }

  fn gpioa() -> &'static stm32::gpioa::RegisterBlock {
    // MODER6 is only touched from the select and SPI1 handlers, which share
    // a priority
    unsafe { &(*stm32::GPIOA::ptr()) }
  }
}

impl ShiftRegister for Spi1Slave {
  fn reset(&mut self) {
    // toggling SPE drops a partially shifted frame
    self.spi.cr1.modify(|_, w| w.spe().clear_bit());
    let _ = self.spi.dr.read();
    let _ = self.spi.sr.read();
    self.spi.cr1.modify(|_, w| w.ssi().clear_bit().spe().set_bit());
    self.spi.dr.write(|w| unsafe { w.bits(0) });
  }

  fn is_shifting(&self) -> bool {
    self.spi.sr.read().bsy().bit_is_set()
  }

  fn read(&self) -> u8 {
    self.spi.dr.read().bits() as u8
  }

  fn write(&mut self, value: u8) {
    self.spi.dr.write(|w| unsafe { w.bits(u32::from(value)) });
  }

  fn drive_output(&mut self) {
    Self::gpioa().moder.modify(|_, w| w.moder6().alternate());
  }

  fn float_output(&mut self) {
    let gpioa = Self::gpioa();
    gpioa.moder.modify(|_, w| w.moder6().input());
    gpioa.pupdr.modify(|_, w| w.pupdr6().floating());
  }

  fn listen(&mut self) {
    self.spi.cr2.modify(|_, w| w.rxneie().set_bit());
  }

  fn unlisten(&mut self) {
    self.spi.cr2.modify(|_, w| w.rxneie().clear_bit());
    self.spi.cr1.modify(|_, w| w.ssi().set_bit());
  }

  fn acknowledge(&mut self) {
    // RXNE clears on the data read; an overrun needs DR then SR
    if self.spi.sr.read().ovr().bit_is_set() {
      let _ = self.spi.dr.read();
      let _ = self.spi.sr.read();
    }
  }
}
