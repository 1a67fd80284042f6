use crate::error::VmError;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// how much RAM we have
pub const RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded; everything below is the interpreter's
pub const PROGRAM_ADDR: u16 = 0x0200;

/// the largest program image that fits
pub const MAX_PROGRAM_BYTES: usize = RAM_SIZE_BYTES - PROGRAM_ADDR as usize;

/// where the hex font lives; FX29 relies on this being zero
pub const FONT_ADDR: u16 = 0x0000;

/// bytes per font glyph
pub const FONT_GLYPH_BYTES: u16 = 5;

/// Byte-addressed memory with bounds-checked accessors.
pub trait MemoryMap {
    /// write a chunk of bytes into "RAM"
    fn write(&mut self, data: &[u8], addr: u16) -> Result<(), VmError> {
        let bytes = self.get_rw_slice(addr, data.len())?;
        bytes.copy_from_slice(data);
        Ok(())
    }

    /// get a two-byte big-endian word
    fn get_word(&self, addr: u16) -> Result<u16, VmError> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], VmError>;

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], VmError>;
}

/// The 4K CHIP-8 memory map:
///   0x0000-0x004f  hex font
///   0x0050-0x01ff  interpreter (unused)
///   0x0200-0x0fff  program
///
/// Bounds errors report `pc: 0`; the interpreter rewrites them with the
/// address of the instruction that made the access.
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
}

impl MemoryMap for Chip8MemoryMap {
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], VmError> {
        let a = Self::check(addr, len)?;
        Ok(&mut self.bytes[a..(a + len)])
    }
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], VmError> {
        let a = Self::check(addr, len)?;
        Ok(&self.bytes[a..(a + len)])
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl Chip8MemoryMap {
    /// zeroed memory with the font installed
    pub fn new() -> Self {
        let mut mm = Chip8MemoryMap {
            bytes: vec![0u8; RAM_SIZE_BYTES].into_boxed_slice(),
        };
        mm.install_font();
        mm
    }

    /// clear everything, then put the font back
    pub fn clear(&mut self) {
        self.bytes.fill(0);
        self.install_font();
    }

    /// replace memory contents with a program image at 0x200
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), VmError> {
        if program.len() > MAX_PROGRAM_BYTES {
            return Err(VmError::RomTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_BYTES,
            });
        }
        self.clear();
        self.write(program, PROGRAM_ADDR)
    }

    /// a single byte
    pub fn get_byte(&self, addr: u16) -> Result<u8, VmError> {
        Ok(self.get_ro_slice(addr, 1)?[0])
    }

    /// address of the glyph for hex digit `digit`
    pub fn glyph_addr(digit: u8) -> u16 {
        FONT_ADDR + digit as u16 * FONT_GLYPH_BYTES
    }

    fn install_font(&mut self) {
        let a = FONT_ADDR as usize;
        self.bytes[a..a + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
    }

    fn check(addr: u16, len: usize) -> Result<usize, VmError> {
        let a = addr as usize;
        if a + len > RAM_SIZE_BYTES {
            // report the first byte that falls off the end
            return Err(VmError::MemoryOutOfBounds {
                addr: a.max(RAM_SIZE_BYTES),
                pc: 0,
            });
        }
        Ok(a)
    }
}

const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
