use std::io;
use thiserror::Error;

/// Everything that can stop the machine. None of these are recovered from
/// internally; the host decides whether to reset or exit.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("unsupported opcode {opcode:#06X} at {pc:#05X}")]
    UnsupportedOpcode { opcode: u16, pc: u16 },

    #[error("return with an empty call stack at {pc:#05X}")]
    StackUnderflow { pc: u16 },

    #[error("call stack exceeded {limit} entries at {pc:#05X}")]
    StackOverflow { pc: u16, limit: usize },

    #[error("program counter {pc:#06X} is outside memory")]
    OutOfBoundsFetch { pc: u16 },

    #[error("memory access at {addr:#06X} is out of bounds (instruction at {pc:#05X})")]
    MemoryOutOfBounds { addr: usize, pc: u16 },

    #[error("program is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl VmError {
    /// the address of the offending instruction, where there is one
    pub fn pc(&self) -> Option<u16> {
        match self {
            VmError::UnsupportedOpcode { pc, .. }
            | VmError::StackUnderflow { pc }
            | VmError::StackOverflow { pc, .. }
            | VmError::OutOfBoundsFetch { pc }
            | VmError::MemoryOutOfBounds { pc, .. } => Some(*pc),
            VmError::RomTooLarge { .. } | VmError::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_opcode_message() {
        let e = VmError::UnsupportedOpcode {
            opcode: 0x5121,
            pc: 0x200,
        };
        assert_eq!(e.to_string(), "unsupported opcode 0x5121 at 0x200");
        assert_eq!(e.pc(), Some(0x200));
    }

    #[test]
    fn test_io_error_has_no_pc() {
        let e: VmError = io::Error::new(io::ErrorKind::Other, "gone").into();
        assert_eq!(e.pc(), None);
        assert!(e.to_string().contains("gone"));
    }
}
