use std::fmt;

/// V0..VF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reg(pub u8);

impl Reg {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{:X}", self.0)
    }
}

/// One decoded CHIP-8 instruction. X/Y are register operands, `nn` an 8-bit
/// immediate, `nnn` a 12-bit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1NNN
    Jump(u16),
    /// 2NNN
    Call(u16),
    /// 3XNN
    SkipEqImm(Reg, u8),
    /// 4XNN
    SkipNeImm(Reg, u8),
    /// 5XY0
    SkipEqReg(Reg, Reg),
    /// 6XNN
    LoadImm(Reg, u8),
    /// 7XNN
    AddImm(Reg, u8),
    /// 8XY0
    Copy(Reg, Reg),
    /// 8XY1
    Or(Reg, Reg),
    /// 8XY2
    And(Reg, Reg),
    /// 8XY3
    Xor(Reg, Reg),
    /// 8XY4
    AddReg(Reg, Reg),
    /// 8XY5
    SubReg(Reg, Reg),
    /// 8XY6; Y is ignored
    ShiftRight(Reg),
    /// 8XY7
    SubRev(Reg, Reg),
    /// 8XYE; Y is ignored
    ShiftLeft(Reg),
    /// 9XY0
    SkipNeReg(Reg, Reg),
    /// ANNN
    SetIndex(u16),
    /// BNNN
    JumpOffset(u16),
    /// CXNN
    Random(Reg, u8),
    /// DXYN
    Draw(Reg, Reg, u8),
    /// EX9E
    SkipKey(Reg),
    /// EXA1
    SkipNotKey(Reg),
    /// FX07
    ReadDelay(Reg),
    /// FX0A
    WaitKey(Reg),
    /// FX15
    SetDelay(Reg),
    /// FX18
    SetSound(Reg),
    /// FX1E
    AddIndex(Reg),
    /// FX29
    FontAddr(Reg),
    /// FX33
    StoreBcd(Reg),
    /// FX55
    StoreRegs(Reg),
    /// FX65
    LoadRegs(Reg),
}

impl Instruction {
    /// Decode a raw opcode. `None` means the bit pattern isn't in the
    /// instruction set.
    pub fn decode(opcode: u16) -> Option<Instruction> {
        use Instruction::*;

        let x = Reg(((opcode & 0x0F00) >> 8) as u8);
        let y = Reg(((opcode & 0x00F0) >> 4) as u8);
        let n = (opcode & 0x000F) as u8;
        let nn = (opcode & 0x00FF) as u8;
        let nnn = opcode & 0x0FFF;

        let i = match opcode >> 12 {
            0x0 => match opcode {
                0x00E0 => ClearScreen,
                0x00EE => Return,
                _ => return None,
            },
            0x1 => Jump(nnn),
            0x2 => Call(nnn),
            0x3 => SkipEqImm(x, nn),
            0x4 => SkipNeImm(x, nn),
            0x5 if n == 0 => SkipEqReg(x, y),
            0x6 => LoadImm(x, nn),
            0x7 => AddImm(x, nn),
            0x8 => match n {
                0x0 => Copy(x, y),
                0x1 => Or(x, y),
                0x2 => And(x, y),
                0x3 => Xor(x, y),
                0x4 => AddReg(x, y),
                0x5 => SubReg(x, y),
                0x6 => ShiftRight(x),
                0x7 => SubRev(x, y),
                0xE => ShiftLeft(x),
                _ => return None,
            },
            0x9 if n == 0 => SkipNeReg(x, y),
            0xA => SetIndex(nnn),
            0xB => JumpOffset(nnn),
            0xC => Random(x, nn),
            0xD => Draw(x, y, n),
            0xE => match nn {
                0x9E => SkipKey(x),
                0xA1 => SkipNotKey(x),
                _ => return None,
            },
            0xF => match nn {
                0x07 => ReadDelay(x),
                0x0A => WaitKey(x),
                0x15 => SetDelay(x),
                0x18 => SetSound(x),
                0x1E => AddIndex(x),
                0x29 => FontAddr(x),
                0x33 => StoreBcd(x),
                0x55 => StoreRegs(x),
                0x65 => LoadRegs(x),
                _ => return None,
            },
            _ => return None,
        };
        Some(i)
    }
}

/// conventional mnemonics, as used by most CHIP-8 assemblers
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump(a) => write!(f, "JP {:#05X}", a),
            Call(a) => write!(f, "CALL {:#05X}", a),
            SkipEqImm(x, nn) => write!(f, "SE {}, {:#04X}", x, nn),
            SkipNeImm(x, nn) => write!(f, "SNE {}, {:#04X}", x, nn),
            SkipEqReg(x, y) => write!(f, "SE {}, {}", x, y),
            LoadImm(x, nn) => write!(f, "LD {}, {:#04X}", x, nn),
            AddImm(x, nn) => write!(f, "ADD {}, {:#04X}", x, nn),
            Copy(x, y) => write!(f, "LD {}, {}", x, y),
            Or(x, y) => write!(f, "OR {}, {}", x, y),
            And(x, y) => write!(f, "AND {}, {}", x, y),
            Xor(x, y) => write!(f, "XOR {}, {}", x, y),
            AddReg(x, y) => write!(f, "ADD {}, {}", x, y),
            SubReg(x, y) => write!(f, "SUB {}, {}", x, y),
            ShiftRight(x) => write!(f, "SHR {}", x),
            SubRev(x, y) => write!(f, "SUBN {}, {}", x, y),
            ShiftLeft(x) => write!(f, "SHL {}", x),
            SkipNeReg(x, y) => write!(f, "SNE {}, {}", x, y),
            SetIndex(a) => write!(f, "LD I, {:#05X}", a),
            JumpOffset(a) => write!(f, "JP V0, {:#05X}", a),
            Random(x, nn) => write!(f, "RND {}, {:#04X}", x, nn),
            Draw(x, y, n) => write!(f, "DRW {}, {}, {}", x, y, n),
            SkipKey(x) => write!(f, "SKP {}", x),
            SkipNotKey(x) => write!(f, "SKNP {}", x),
            ReadDelay(x) => write!(f, "LD {}, DT", x),
            WaitKey(x) => write!(f, "LD {}, K", x),
            SetDelay(x) => write!(f, "LD DT, {}", x),
            SetSound(x) => write!(f, "LD ST, {}", x),
            AddIndex(x) => write!(f, "ADD I, {}", x),
            FontAddr(x) => write!(f, "LD F, {}", x),
            StoreBcd(x) => write!(f, "LD B, {}", x),
            StoreRegs(x) => write!(f, "LD [I], {}", x),
            LoadRegs(x) => write!(f, "LD {}, [I]", x),
        }
    }
}

/// Walk a program image two bytes at a time, yielding the load address, raw
/// opcode and decoded instruction. A trailing odd byte is ignored.
pub fn disassemble(
    program: &[u8],
    base: u16,
) -> impl Iterator<Item = (u16, u16, Option<Instruction>)> + '_ {
    program.chunks_exact(2).enumerate().map(move |(i, pair)| {
        let opcode = u16::from_be_bytes([pair[0], pair[1]]);
        (
            base.wrapping_add(2 * i as u16),
            opcode,
            Instruction::decode(opcode),
        )
    })
}
