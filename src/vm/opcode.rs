//! Contract opcode set and gas cost table

/// Single-byte contract opcodes.
///
/// `PUSH` is followed by an 8-byte little-endian immediate; `JMP` and
/// `JMPIF` by a 4-byte little-endian absolute code offset. `0x11`/`0x12`
/// (`CALL`/`RET`) are reserved and rejected by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// No operation
    Nop = 0x00,
    /// Push an 8-byte little-endian immediate
    Push = 0x01,
    /// Discard the top of stack
    Pop = 0x02,
    /// Wrapping addition
    Add = 0x03,
    /// Wrapping subtraction
    Sub = 0x04,
    /// Wrapping multiplication
    Mul = 0x05,
    /// Unsigned division; divisor of zero faults
    Div = 0x06,
    /// Unsigned remainder; divisor of zero faults
    Mod = 0x07,
    /// Bitwise and
    And = 0x08,
    /// Bitwise or
    Or = 0x09,
    /// Bitwise xor
    Xor = 0x0A,
    /// Bitwise complement
    Not = 0x0B,
    /// Equality, pushes 0 or 1
    Eq = 0x0C,
    /// Unsigned less-than, pushes 0 or 1
    Lt = 0x0D,
    /// Unsigned greater-than, pushes 0 or 1
    Gt = 0x0E,
    /// Unconditional jump to an absolute offset
    Jmp = 0x0F,
    /// Jump if the popped condition is non-zero
    JmpIf = 0x10,
    /// Load 8 bytes from scratch memory at a popped address
    Load = 0x13,
    /// Store 8 bytes to scratch memory
    Store = 0x14,
    /// Hash a scratch-memory range, push the low 64 bits
    Hash = 0x15,
    /// Signature verification stub, always pushes 1
    Verify = 0x16,
    /// Terminate execution
    Halt = 0xFF,
}

impl Opcode {
    /// Decode a byte into an opcode.
    ///
    /// Returns `None` for unknown bytes and for the reserved `CALL`/`RET`
    /// encodings.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Nop),
            0x01 => Some(Self::Push),
            0x02 => Some(Self::Pop),
            0x03 => Some(Self::Add),
            0x04 => Some(Self::Sub),
            0x05 => Some(Self::Mul),
            0x06 => Some(Self::Div),
            0x07 => Some(Self::Mod),
            0x08 => Some(Self::And),
            0x09 => Some(Self::Or),
            0x0A => Some(Self::Xor),
            0x0B => Some(Self::Not),
            0x0C => Some(Self::Eq),
            0x0D => Some(Self::Lt),
            0x0E => Some(Self::Gt),
            0x0F => Some(Self::Jmp),
            0x10 => Some(Self::JmpIf),
            0x13 => Some(Self::Load),
            0x14 => Some(Self::Store),
            0x15 => Some(Self::Hash),
            0x16 => Some(Self::Verify),
            0xFF => Some(Self::Halt),
            _ => None,
        }
    }

    /// Width of the inline operand in bytes (0, 4, or 8)
    pub fn operand_width(self) -> usize {
        match self {
            Self::Push => 8,
            Self::Jmp | Self::JmpIf => 4,
            _ => 0,
        }
    }

    /// Fixed gas cost charged before the instruction executes
    pub fn gas_cost(self) -> u64 {
        match self {
            Self::Nop => 1,
            Self::Push => 3,
            Self::Pop => 2,
            Self::Add | Self::Sub => 3,
            Self::Mul | Self::Div | Self::Mod => 5,
            Self::And | Self::Or | Self::Xor | Self::Not => 3,
            Self::Eq | Self::Lt | Self::Gt => 3,
            Self::Jmp => 3,
            Self::JmpIf => 4,
            Self::Load => 3,
            Self::Store => 5,
            Self::Hash => 30,
            Self::Verify => 100,
            Self::Halt => 0,
        }
    }

    /// Assembly mnemonic
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Nop => "NOP",
            Self::Push => "PUSH",
            Self::Pop => "POP",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Mod => "MOD",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Not => "NOT",
            Self::Eq => "EQ",
            Self::Lt => "LT",
            Self::Gt => "GT",
            Self::Jmp => "JMP",
            Self::JmpIf => "JMPIF",
            Self::Load => "LOAD",
            Self::Store => "STORE",
            Self::Hash => "HASH",
            Self::Verify => "VERIFY",
            Self::Halt => "HALT",
        }
    }
}
