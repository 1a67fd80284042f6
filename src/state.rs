use crate::config::ResetPolicy;
use crate::display::FrameBuffer;
use crate::input::Keypad;
use crate::memory::{Chip8MemoryMap, PROGRAM_ADDR};
use crate::timer::Timers;

/// register used as the carry/borrow/collision flag
pub const FLAG: usize = 0xF;

/// Everything the machine knows. Owned by the interpreter and only ever
/// reached through `&mut`.
pub struct VmState {
    pub memory: Chip8MemoryMap,
    /// V0..VF
    pub registers: [u8; 16],
    /// I
    pub index: u16,
    pub program_counter: u16,
    /// return addresses, most recent last
    pub stack: Vec<u16>,
    pub timers: Timers,
    pub keypad: Keypad,
    pub display: FrameBuffer,
    /// destination register of a pending FX0A
    pub awaiting_key: Option<u8>,
}

impl Default for VmState {
    fn default() -> Self {
        Self::new(Keypad::new())
    }
}

impl VmState {
    /// power-on state: font loaded, everything else zero, PC at 0x200
    pub fn new(keypad: Keypad) -> Self {
        VmState {
            memory: Chip8MemoryMap::new(),
            registers: [0; 16],
            index: 0,
            program_counter: PROGRAM_ADDR,
            stack: Vec::new(),
            timers: Timers::default(),
            keypad,
            display: FrameBuffer::new(),
            awaiting_key: None,
        }
    }

    /// Prepare for a freshly loaded program. Memory contents are the
    /// caller's job; this moves the PC and applies `policy` to the rest.
    pub fn reset(&mut self, policy: ResetPolicy) {
        self.program_counter = PROGRAM_ADDR;
        if policy == ResetPolicy::Full {
            self.registers = [0; 16];
            self.index = 0;
            self.stack.clear();
            self.timers = Timers::default();
            self.keypad.reset();
            self.display.clear();
            self.awaiting_key = None;
        }
    }

    pub fn v(&self, reg: usize) -> u8 {
        self.registers[reg]
    }

    /// step over the next instruction when `cond` holds
    pub fn skip_if(&mut self, cond: bool) {
        if cond {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
    }

    pub fn set_flag(&mut self, flag: bool) {
        self.registers[FLAG] = flag as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirty() -> VmState {
        let mut s = VmState::default();
        s.registers[3] = 9;
        s.index = 0x300;
        s.program_counter = 0x456;
        s.stack.push(0x202);
        s.timers.delay = 4;
        s.keypad.press(2);
        s.display.xor_sprite(0, 0, &[0xFF]);
        s.awaiting_key = Some(1);
        s
    }

    #[test]
    fn test_power_on() {
        let s = VmState::default();
        assert_eq!(s.program_counter, 0x200);
        assert_eq!(s.registers, [0; 16]);
        assert!(s.stack.is_empty());
        assert!(s.display.is_blank());
        assert_eq!(s.awaiting_key, None);
    }

    #[test]
    fn test_memory_only_reset_keeps_state() {
        let mut s = dirty();
        s.reset(ResetPolicy::MemoryOnly);
        assert_eq!(s.program_counter, 0x200);
        assert_eq!(s.registers[3], 9);
        assert_eq!(s.index, 0x300);
        assert_eq!(s.stack, vec![0x202]);
        assert_eq!(s.timers.delay, 4);
        assert!(s.keypad.is_pressed(2));
        assert!(!s.display.is_blank());
        assert_eq!(s.awaiting_key, Some(1));
    }

    #[test]
    fn test_full_reset_clears_everything() {
        let mut s = dirty();
        s.reset(ResetPolicy::Full);
        assert_eq!(s.program_counter, 0x200);
        assert_eq!(s.registers, [0; 16]);
        assert_eq!(s.index, 0);
        assert!(s.stack.is_empty());
        assert_eq!(s.timers, Timers::default());
        assert_eq!(s.keypad.state(), 0);
        assert!(s.display.is_blank());
        assert_eq!(s.awaiting_key, None);
    }

    #[test]
    fn test_set_flag() {
        let mut s = VmState::default();
        s.set_flag(true);
        assert_eq!(s.v(FLAG), 1);
        s.set_flag(false);
        assert_eq!(s.v(FLAG), 0);
    }
}
