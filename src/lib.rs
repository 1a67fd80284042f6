//!
//! ## Design
//!
//! * a CHIP-8 virtual machine: 4K memory, V0-VF, I, PC, call stack, delay and
//!   sound timers, 64x32 mono display, 16-key hex pad
//! * CPU and frame clocks are independent: instructions run at a configurable
//!   rate (700Hz by default), timers and repaints at a fixed 60Hz
//! * abstract display, input and sound so alternatives can be plugged in;
//!   starting with TUI in-console
//! * FX0A never blocks the caller; it polls the keypad on every step
//! * errors stop the machine; the host decides what happens next
//!
//! Model
//!
//! ```text
//! Machine
//!  |-- interpreter(config, keypad)
//!  |    |-- VM state: memory, registers, stack, timers, display
//!  |    `-- instruction set: decode opcode -> Instruction, execute
//!  |-- scheduler(cpu rate)
//!  |-- display, sound (injected)
//!  `-- main loop
//!       |-- input.poll(keypad)
//!       |-- for event in scheduler.advance(elapsed) {
//!       |     CpuStep => interpreter.step()
//!       |     Frame   => tick timers; display.draw(frame); speaker.update()
//!       |   }
//!       `-- sleep(1ms)
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod machine;
pub mod memory;
pub mod scheduler;
pub mod sound;
pub mod state;
pub mod timer;

pub use config::{Config, ResetPolicy};
pub use error::VmError;
pub use interpreter::{Chip8Interpreter, StepOutcome};
pub use machine::{Machine, TickReport};
