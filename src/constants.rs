use microgpio_core::SelectPolicy;

pub const CPU_FREQ: u32 = 168_000_000;

// a new select window always starts on an opcode, even mid-command
pub const SELECT_POLICY: SelectPolicy = SelectPolicy::Resync;
