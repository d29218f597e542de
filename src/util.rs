pub mod debugger {
  use core::sync::atomic::{AtomicBool, Ordering};
  use cortex_m_semihosting::hprint;

  static ENABLED: AtomicBool = AtomicBool::new(false);

  /// Semihosting halts the core without a debugger, so printing is only
  /// turned on when DHCSR.C_DEBUGEN is set at boot.
  pub fn init() {
    let addr = 0xE000EDF0usize;
    let r = addr as *const u32;
    if unsafe { core::ptr::read_volatile(r) } & 1 == 1 {
      ENABLED.store(true, Ordering::Relaxed);
    }
  }

  pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
  }

  pub fn print(s: &'static str, arg: Option<u32>) {
    if is_enabled() {
      match arg {
        Some(arg) => hprint!("{}{}\n", s, arg).ok(),
        None => hprint!("{}\n", s).ok(),
      };
    }
  }
}
