//! # interpreter
//!
//! CHIP-8 machine state, as seen by a program:
//!  V0-VF  sixteen 8 bit registers; VF doubles as carry/borrow/collision flag
//!  I      16 bit index register, used by everything that touches memory
//!  PC     program counter; 0x200 on load, advanced by 2 before execution
//!  stack  return addresses for 2NNN/00EE
//!  DT/ST  delay and sound timers, counted down by the frame clock
//!  keypad 16 keys, read as a bitmask
//!
//! One `step()` fetches, decodes and executes exactly one opcode. FX0A does
//! not block: it parks the interpreter in a waiting state and each later
//! `step()` checks the keypad until a key has been delivered.

use crate::config::{Config, ResetPolicy};
use crate::display::FrameBuffer;
use crate::error::VmError;
use crate::input::Keypad;
use crate::instruction::Instruction;
use crate::memory::{Chip8MemoryMap, MemoryMap};
use crate::state::{VmState, FLAG};
use crate::timer::Timers;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;

/// what a single step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// ran an instruction that left the screen alone
    Executed(Instruction),
    /// ran a clear or draw; the screen wants repainting
    Redraw(Instruction),
    /// FX0A is still waiting; nothing ran
    AwaitingKey,
    /// FX0A finished: `key` went into register `reg`
    KeyDelivered { reg: u8, key: u8 },
}

impl StepOutcome {
    pub fn redraw(&self) -> bool {
        matches!(self, StepOutcome::Redraw(_))
    }
}

pub struct Chip8Interpreter {
    state: VmState,
    rng: StdRng,
    reset_policy: ResetPolicy,
    stack_limit: Option<usize>,
    instructions: u64,
}

impl Chip8Interpreter {
    pub fn new(config: &Config) -> Chip8Interpreter {
        Self::with_keypad(config, Keypad::new())
    }

    /// build around a keypad some input collaborator already holds
    pub fn with_keypad(config: &Config, keypad: Keypad) -> Chip8Interpreter {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Chip8Interpreter {
            state: VmState::new(keypad),
            rng,
            reset_policy: config.reset_policy,
            stack_limit: config.stack_limit,
            instructions: 0,
        }
    }

    /// load a chip8 program at 0x200, replacing whatever was in memory
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), VmError> {
        self.state.memory.load_program(program)?;
        self.state.reset(self.reset_policy);
        log::debug!(
            "loaded {} byte program ({:?} reset)",
            program.len(),
            self.reset_policy
        );
        Ok(())
    }

    /// load a chip8 program from a reader
    pub fn load_program_from(&mut self, reader: &mut impl io::Read) -> Result<(), VmError> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.load_program(&buf)
    }

    pub fn state(&self) -> &VmState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut VmState {
        &mut self.state
    }

    pub fn display(&self) -> &FrameBuffer {
        &self.state.display
    }

    pub fn keypad(&self) -> &Keypad {
        &self.state.keypad
    }

    pub fn timers(&self) -> &Timers {
        &self.state.timers
    }

    /// is a FX0A waiting for a key?
    pub fn awaiting_key(&self) -> bool {
        self.state.awaiting_key.is_some()
    }

    /// instructions executed so far
    pub fn instructions(&self) -> u64 {
        self.instructions
    }

    /// one 60Hz frame's worth of timer countdown
    pub fn tick_timers(&mut self) {
        self.state.timers.tick_delay();
        self.state.timers.tick_sound();
    }

    /// fetch, decode and execute one instruction
    pub fn step(&mut self) -> Result<StepOutcome, VmError> {
        if let Some(reg) = self.state.awaiting_key {
            return Ok(match self.state.keypad.take_delivered() {
                Some(key) => {
                    self.state.registers[reg as usize] = key;
                    self.state.awaiting_key = None;
                    StepOutcome::KeyDelivered { reg, key }
                }
                None => StepOutcome::AwaitingKey,
            });
        }

        let pc = self.state.program_counter;
        let opcode = self
            .state
            .memory
            .get_word(pc)
            .map_err(|_| VmError::OutOfBoundsFetch { pc })?;
        let instruction =
            Instruction::decode(opcode).ok_or(VmError::UnsupportedOpcode { opcode, pc })?;
        log::trace!("{:#05X}: {:04X}  {}", pc, opcode, instruction);

        self.state.program_counter = pc.wrapping_add(2);
        self.run(instruction, pc)
    }

    /// Execute an instruction as though it had just been fetched from the
    /// current PC. The PC is not advanced first.
    pub fn execute(&mut self, instruction: Instruction) -> Result<StepOutcome, VmError> {
        let pc = self.state.program_counter;
        self.run(instruction, pc)
    }

    fn run(&mut self, instruction: Instruction, pc: u16) -> Result<StepOutcome, VmError> {
        use Instruction::*;

        self.instructions += 1;
        let s = &mut self.state;
        // rewrite memory errors with the address of this instruction
        let at = |e: VmError| match e {
            VmError::MemoryOutOfBounds { addr, .. } => VmError::MemoryOutOfBounds { addr, pc },
            e => e,
        };

        match instruction {
            ClearScreen => {
                s.display.clear();
                return Ok(StepOutcome::Redraw(instruction));
            }
            Return => {
                s.program_counter = s.stack.pop().ok_or(VmError::StackUnderflow { pc })?;
            }
            Jump(nnn) => s.program_counter = nnn,
            Call(nnn) => {
                if let Some(limit) = self.stack_limit {
                    if s.stack.len() >= limit {
                        return Err(VmError::StackOverflow { pc, limit });
                    }
                }
                s.stack.push(s.program_counter);
                s.program_counter = nnn;
            }
            SkipEqImm(x, nn) => s.skip_if(s.v(x.index()) == nn),
            SkipNeImm(x, nn) => s.skip_if(s.v(x.index()) != nn),
            SkipEqReg(x, y) => s.skip_if(s.v(x.index()) == s.v(y.index())),
            SkipNeReg(x, y) => s.skip_if(s.v(x.index()) != s.v(y.index())),
            LoadImm(x, nn) => s.registers[x.index()] = nn,
            AddImm(x, nn) => s.registers[x.index()] = s.v(x.index()).wrapping_add(nn),
            Copy(x, y) => s.registers[x.index()] = s.v(y.index()),
            Or(x, y) => s.registers[x.index()] |= s.v(y.index()),
            And(x, y) => s.registers[x.index()] &= s.v(y.index()),
            Xor(x, y) => s.registers[x.index()] ^= s.v(y.index()),
            AddReg(x, y) => {
                let (sum, carry) = s.v(x.index()).overflowing_add(s.v(y.index()));
                s.registers[x.index()] = sum;
                s.set_flag(carry);
            }
            SubReg(x, y) => {
                let (vx, vy) = (s.v(x.index()), s.v(y.index()));
                s.registers[x.index()] = vx.wrapping_sub(vy);
                s.set_flag(vx >= vy);
            }
            ShiftRight(x) => {
                let vx = s.v(x.index());
                s.registers[x.index()] = vx >> 1;
                s.registers[FLAG] = vx & 1;
            }
            SubRev(x, y) => {
                let (vx, vy) = (s.v(x.index()), s.v(y.index()));
                s.registers[x.index()] = vy.wrapping_sub(vx);
                s.set_flag(vy >= vx);
            }
            ShiftLeft(x) => {
                let vx = s.v(x.index());
                s.registers[x.index()] = vx << 1;
                s.registers[FLAG] = (vx >> 7) & 1;
            }
            SetIndex(nnn) => s.index = nnn,
            JumpOffset(nnn) => s.program_counter = nnn + s.v(0) as u16,
            Random(x, nn) => s.registers[x.index()] = self.rng.gen::<u8>() & nn,
            Draw(x, y, n) => {
                let (vx, vy) = (s.v(x.index()) as usize, s.v(y.index()) as usize);
                let sprite = s.memory.get_ro_slice(s.index, n as usize).map_err(at)?;
                let collision = s.display.xor_sprite(vx, vy, sprite);
                s.set_flag(collision);
                return Ok(StepOutcome::Redraw(instruction));
            }
            SkipKey(x) => s.skip_if(s.keypad.is_pressed(s.v(x.index()))),
            SkipNotKey(x) => s.skip_if(!s.keypad.is_pressed(s.v(x.index()))),
            ReadDelay(x) => s.registers[x.index()] = s.timers.delay,
            WaitKey(x) => {
                // only a press that arrives from now on counts
                s.keypad.clear_delivered();
                s.awaiting_key = Some(x.0);
            }
            SetDelay(x) => s.timers.delay = s.v(x.index()),
            SetSound(x) => s.timers.sound = s.v(x.index()),
            AddIndex(x) => s.index = s.index.wrapping_add(s.v(x.index()) as u16),
            FontAddr(x) => s.index = Chip8MemoryMap::glyph_addr(s.v(x.index())),
            StoreBcd(x) => {
                let vx = s.v(x.index());
                s.memory
                    .write(&[vx / 100, vx / 10 % 10, vx % 10], s.index)
                    .map_err(at)?;
            }
            StoreRegs(x) => {
                let regs = s.registers;
                s.memory.write(&regs[..=x.index()], s.index).map_err(at)?;
            }
            LoadRegs(x) => {
                let bytes = s.memory.get_ro_slice(s.index, x.index() + 1).map_err(at)?;
                s.registers[..=x.index()].copy_from_slice(bytes);
            }
        }
        Ok(StepOutcome::Executed(instruction))
    }
}
