use std::time::Duration;

/// default CPU rate, in instructions per second
pub const DEFAULT_CPU_HZ: u32 = 700;

/// display and timer rate; fixed by the hardware
pub const FRAME_HZ: u32 = 60;

/// What survives a program load.
///
/// Memory is always cleared (and the font re-installed) and the program
/// counter always moved to the program start; the policy decides what happens
/// to everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetPolicy {
    /// registers, index, stack, timers, keypad, display and any pending key
    /// wait are left as they were
    #[default]
    MemoryOnly,
    /// everything goes back to its power-on value
    Full,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// CPU steps per second. Must be non-zero.
    pub cpu_hz: u32,
    pub reset_policy: ResetPolicy,
    /// Maximum call depth. `None` leaves the stack unbounded; otherwise a
    /// call beyond the limit is a `StackOverflow`.
    pub stack_limit: Option<usize>,
    /// Seed for the random opcode. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
    /// Largest elapsed time a single scheduler tick will account for.
    /// Anything above is dropped. `None` drains every catch-up frame.
    pub max_catch_up: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cpu_hz: DEFAULT_CPU_HZ,
            reset_policy: ResetPolicy::default(),
            stack_limit: None,
            rng_seed: None,
            max_catch_up: None,
        }
    }
}

impl Config {
    /// steps per frame, as a real number; for display only
    pub fn steps_per_frame(&self) -> f64 {
        self.cpu_hz as f64 / FRAME_HZ as f64
    }
}
