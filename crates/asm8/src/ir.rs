//! Intermediate representation: registers, conditions, opcodes, operands
//! and statements.
//!
//! The opcode table in this module is the single source of truth for the
//! machine's instruction set. The parser reads each opcode's [`Form`] to
//! validate operand shapes and the encoder reads its base word and
//! [`ConditionSlot`] to pack the final 16-bit instruction.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::error::Span;

// ─── Registers ─────────────────────────────────────────────

/// One of the seven general-purpose 8-bit registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Register {
    /// `r0`
    R0,
    /// `r1`
    R1,
    /// `r2`
    R2,
    /// `r3`
    R3,
    /// `r4`
    R4,
    /// `r5`
    R5,
    /// `r6`
    R6,
}

impl Register {
    /// All registers in index order.
    pub const ALL: [Register; 7] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
    ];

    /// Register number, `0..=6`.
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Register for a number in `0..=6`.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Value stored in a 4-bit register field: `index + 1`.
    ///
    /// Field value 0 means "no register" to the decoder.
    #[inline]
    pub fn field(self) -> u16 {
        u16::from(self.index()) + 1
    }

    /// Inverse of [`Register::field`].
    pub fn from_field(field: u16) -> Option<Self> {
        match field {
            1..=7 => Self::from_index(field as u8 - 1),
            _ => None,
        }
    }

    /// Parse a register name (`r0`..`r6`, case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        if bytes.len() == 2 && (bytes[0] == b'r' || bytes[0] == b'R') {
            match bytes[1] {
                b'0'..=b'6' => Self::from_index(bytes[1] - b'0'),
                _ => None,
            }
        } else {
            None
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.index())
    }
}

/// Two consecutive registers used as one 16-bit address, written high first
/// (`r1r0` is `r1:r0`).
///
/// Only the low register is encoded; the high register is always the next
/// register up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegisterPair {
    low: Register,
}

impl RegisterPair {
    /// Build a pair from its high and low halves. Returns `None` unless
    /// `high` is exactly the register after `low`.
    pub fn new(high: Register, low: Register) -> Option<Self> {
        if high.index() == low.index() + 1 {
            Some(Self { low })
        } else {
            None
        }
    }

    /// The register holding the low byte of the address.
    #[inline]
    pub fn low(self) -> Register {
        self.low
    }

    /// The register holding the high byte of the address.
    #[inline]
    pub fn high(self) -> Register {
        // `new` guarantees low < r6
        Register::from_index(self.low.index() + 1).unwrap_or(Register::R6)
    }

    /// Value stored in the register field: the low register's field value.
    #[inline]
    pub fn field(self) -> u16 {
        self.low.field()
    }

    /// Inverse of [`RegisterPair::field`].
    pub fn from_field(field: u16) -> Option<Self> {
        let low = Register::from_field(field)?;
        let high = Register::from_index(low.index() + 1)?;
        Self::new(high, low)
    }
}

impl fmt::Display for RegisterPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.high(), self.low)
    }
}

// ─── Conditions ────────────────────────────────────────────

/// Condition suffix of a conditional instruction (`b.nz`, `cmv.ult`, ...).
///
/// Aliases (`eq`/`z`, `uge`/`c`, ...) are distinct variants so that listings
/// reproduce the spelling used in the source, but they share a [`code`].
///
/// [`code`]: Condition::code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Condition {
    /// Carry set.
    C,
    /// Carry clear.
    Nc,
    /// Zero set.
    Z,
    /// Zero clear.
    Nz,
    /// Sign set.
    S,
    /// Sign clear.
    Ns,
    /// Overflow set.
    O,
    /// Overflow clear.
    No,
    /// Equal (`Z`).
    Eq,
    /// Not equal (`¬Z`).
    Ne,
    /// Unsigned greater or equal (`C`).
    Uge,
    /// Unsigned less than (`¬C`).
    Ult,
    /// Unsigned less or equal (`¬C ∨ Z`).
    Ule,
    /// Unsigned greater than (`C ∧ ¬Z`).
    Ugt,
    /// Signed less than (`S ≠ O`).
    Slt,
    /// Signed greater or equal (`S = O`).
    Sge,
    /// Signed less or equal (`Z ∨ S ≠ O`).
    Sle,
    /// Signed greater than (`¬Z ∧ S = O`).
    Sgt,
}

impl Condition {
    /// Every suffix the assembler accepts.
    pub const ALL: [Condition; 18] = [
        Condition::C,
        Condition::Nc,
        Condition::Z,
        Condition::Nz,
        Condition::S,
        Condition::Ns,
        Condition::O,
        Condition::No,
        Condition::Eq,
        Condition::Ne,
        Condition::Uge,
        Condition::Ult,
        Condition::Ule,
        Condition::Ugt,
        Condition::Slt,
        Condition::Sge,
        Condition::Sle,
        Condition::Sgt,
    ];

    /// 4-bit predicate code understood by the branch unit.
    pub fn code(self) -> u16 {
        match self {
            Condition::C | Condition::Uge => 0b0010,
            Condition::Nc | Condition::Ult => 0b0011,
            Condition::Z | Condition::Eq => 0b0100,
            Condition::Nz | Condition::Ne => 0b0101,
            Condition::S => 0b0110,
            Condition::Ns => 0b0111,
            Condition::O => 0b1000,
            Condition::No => 0b1001,
            Condition::Ule => 0b1010,
            Condition::Ugt => 0b1011,
            Condition::Slt => 0b1100,
            Condition::Sge => 0b1101,
            Condition::Sle => 0b1110,
            Condition::Sgt => 0b1111,
        }
    }

    /// The suffix as written after the `.`.
    pub fn suffix(self) -> &'static str {
        match self {
            Condition::C => "c",
            Condition::Nc => "nc",
            Condition::Z => "z",
            Condition::Nz => "nz",
            Condition::S => "s",
            Condition::Ns => "ns",
            Condition::O => "o",
            Condition::No => "no",
            Condition::Eq => "eq",
            Condition::Ne => "ne",
            Condition::Uge => "uge",
            Condition::Ult => "ult",
            Condition::Ule => "ule",
            Condition::Ugt => "ugt",
            Condition::Slt => "slt",
            Condition::Sge => "sge",
            Condition::Sle => "sle",
            Condition::Sgt => "sgt",
        }
    }

    /// Look up a suffix (case-insensitive).
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.suffix().eq_ignore_ascii_case(suffix))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

// ─── Opcodes ───────────────────────────────────────────────

/// Operand signature of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Form {
    /// No operands.
    Bare,
    /// `rd`
    Rd,
    /// `rd, rs`
    RdRs,
    /// `rd, imm8` (−128..=255)
    RdImm8,
    /// `rd, simm4` (−8..=7)
    RdSimm4,
    /// `rs`
    Rs,
    /// `rHrL` register pair holding an absolute address
    Rs16,
    /// Relative target: label, local label reference, or signed literal.
    Rel8,
}

impl Form {
    /// Operand kinds in source order.
    pub fn operands(self) -> &'static [OperandKind] {
        const REG: OperandKind = OperandKind::Register;
        match self {
            Form::Bare => &[],
            Form::Rd | Form::Rs => &[REG],
            Form::RdRs => &[REG, REG],
            Form::RdImm8 | Form::RdSimm4 => &[REG, OperandKind::Immediate],
            Form::Rs16 => &[OperandKind::RegisterPair],
            Form::Rel8 => &[OperandKind::Target],
        }
    }
}

/// Shape of a single operand, used for parse-time validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// A general register.
    Register,
    /// A register pair.
    RegisterPair,
    /// A numeric literal.
    Immediate,
    /// A label reference or a signed literal displacement.
    Target,
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperandKind::Register => "register",
            OperandKind::RegisterPair => "register pair",
            OperandKind::Immediate => "immediate",
            OperandKind::Target => "jump target",
        })
    }
}

/// Where a conditional opcode stores its condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConditionSlot {
    /// Bits 4..=7, the `rd` slot (branches).
    Rd,
    /// Bits 12..=15, the minor opcode slot (`cmv`, `cldi`).
    Minor,
}

/// Static description of one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    /// Canonical mnemonic.
    pub name: &'static str,
    /// Operand signature.
    pub form: Form,
    /// All fixed bits of the instruction word.
    pub base: u16,
    /// `Some` for the conditional family; the suffix is then mandatory.
    pub condition: Option<ConditionSlot>,
}

/// Every mnemonic of the instruction set, plus the `halt` pseudo-instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Opcode {
    /// No operation.
    Nop,
    /// Load an 8-bit immediate into a register.
    Ldi,
    /// Copy one register into another.
    Mv,
    /// Absolute jump through a register pair (alias `jabsr`).
    Jr,
    /// Relative jump (alias `jreli`).
    J,
    /// Relative jump by a register (alias `jrelr`).
    Jro,
    /// Conditional absolute jump through a register pair.
    Br,
    /// Conditional relative jump.
    B,
    /// Conditional relative jump by a register.
    Bro,
    /// Write a register to the LCD command port.
    Lcdcw,
    /// Write a register to the LCD data port.
    Lcddw,
    /// Read the LCD command port into a register.
    Lcdcr,
    /// Read the LCD data port into a register.
    Lcddr,
    /// Bitwise complement.
    Not,
    /// Two's-complement negation.
    Neg,
    /// Logical shift left.
    Shll,
    /// Shift left through carry.
    Shlc,
    /// Logical shift right.
    Shrl,
    /// Shift right through carry.
    Shrc,
    /// Arithmetic shift right.
    Shra,
    /// Swap a register with the flags.
    Fswap,
    /// Read the flags into a register.
    Fr,
    /// Write a register to the flags.
    Fw,
    /// `rd += rs`
    Add,
    /// `rd += rs + carry`
    Addc,
    /// `rd -= rs`
    Sub,
    /// `rd -= rs + borrow`
    Subc,
    /// `rd &= rs`
    And,
    /// `rd |= rs`
    Or,
    /// `rd ^= rs`
    Xor,
    /// Set flags from `rd - rs`, discarding the result.
    Cmp,
    /// Set flags from `rd & rs`, discarding the result.
    Test,
    /// `rd += simm4 + carry`
    Addci,
    /// `rd ^= simm4`
    Xori,
    /// Set flags from `rd - simm4`.
    Cmpi,
    /// `rd += imm8`
    Addi,
    /// `rd &= imm8`
    Andi,
    /// `rd |= imm8`
    Ori,
    /// Set flags from `rd & imm8`.
    Testi,
    /// Conditional register move.
    Cmv,
    /// Conditional load of a 4-bit signed immediate.
    Cldi,
    /// Pseudo-instruction: `j 0`, a jump to itself.
    Halt,
}

const fn op(name: &'static str, form: Form, base: u16) -> OpcodeInfo {
    OpcodeInfo {
        name,
        form,
        base,
        condition: None,
    }
}

const fn cond_op(name: &'static str, form: Form, base: u16, slot: ConditionSlot) -> OpcodeInfo {
    OpcodeInfo {
        name,
        form,
        base,
        condition: Some(slot),
    }
}

impl Opcode {
    /// All opcodes, in table order.
    pub const ALL: [Opcode; 42] = [
        Opcode::Nop,
        Opcode::Ldi,
        Opcode::Mv,
        Opcode::Jr,
        Opcode::J,
        Opcode::Jro,
        Opcode::Br,
        Opcode::B,
        Opcode::Bro,
        Opcode::Lcdcw,
        Opcode::Lcddw,
        Opcode::Lcdcr,
        Opcode::Lcddr,
        Opcode::Not,
        Opcode::Neg,
        Opcode::Shll,
        Opcode::Shlc,
        Opcode::Shrl,
        Opcode::Shrc,
        Opcode::Shra,
        Opcode::Fswap,
        Opcode::Fr,
        Opcode::Fw,
        Opcode::Add,
        Opcode::Addc,
        Opcode::Sub,
        Opcode::Subc,
        Opcode::And,
        Opcode::Or,
        Opcode::Xor,
        Opcode::Cmp,
        Opcode::Test,
        Opcode::Addci,
        Opcode::Xori,
        Opcode::Cmpi,
        Opcode::Addi,
        Opcode::Andi,
        Opcode::Ori,
        Opcode::Testi,
        Opcode::Cmv,
        Opcode::Cldi,
        Opcode::Halt,
    ];

    /// Static encoding information.
    pub const fn info(self) -> OpcodeInfo {
        use ConditionSlot::{Minor, Rd as InRd};
        use Form::*;
        match self {
            Opcode::Nop => op("nop", Bare, 0x0000),
            Opcode::Ldi => op("ldi", RdImm8, 0x0008),
            Opcode::Mv => op("mv", RdRs, 0x1000),
            Opcode::Jr => op("jr", Rs16, 0x3000),
            Opcode::J => op("j", Rel8, 0x0009),
            Opcode::Jro => op("jro", Rs, 0x2000),
            Opcode::Br => cond_op("br", Rs16, 0x3000, InRd),
            Opcode::B => cond_op("b", Rel8, 0x0009, InRd),
            Opcode::Bro => cond_op("bro", Rs, 0x2000, InRd),
            Opcode::Lcdcw => op("lcdcw", Rd, 0x4000),
            Opcode::Lcddw => op("lcddw", Rd, 0x4100),
            Opcode::Lcdcr => op("lcdcr", Rd, 0x4200),
            Opcode::Lcddr => op("lcddr", Rd, 0x4300),
            Opcode::Not => op("not", Rd, 0x0001),
            Opcode::Neg => op("neg", Rd, 0x0101),
            Opcode::Shll => op("shll", Rd, 0x0201),
            Opcode::Shlc => op("shlc", Rd, 0x0301),
            Opcode::Shrl => op("shrl", Rd, 0x0401),
            Opcode::Shrc => op("shrc", Rd, 0x0501),
            Opcode::Shra => op("shra", Rd, 0x0601),
            Opcode::Fswap => op("fswap", Rd, 0x0701),
            Opcode::Fr => op("fr", Rd, 0x0801),
            Opcode::Fw => op("fw", Rd, 0x0901),
            Opcode::Add => op("add", RdRs, 0x1001),
            Opcode::Addc => op("addc", RdRs, 0x2001),
            Opcode::Sub => op("sub", RdRs, 0x3001),
            Opcode::Subc => op("subc", RdRs, 0x4001),
            Opcode::And => op("and", RdRs, 0x5001),
            Opcode::Or => op("or", RdRs, 0x6001),
            Opcode::Xor => op("xor", RdRs, 0x7001),
            Opcode::Cmp => op("cmp", RdRs, 0x8001),
            Opcode::Test => op("test", RdRs, 0x9001),
            Opcode::Addci => op("addci", RdSimm4, 0xA001),
            Opcode::Xori => op("xori", RdSimm4, 0xB001),
            Opcode::Cmpi => op("cmpi", RdSimm4, 0xC001),
            Opcode::Addi => op("addi", RdImm8, 0x000C),
            Opcode::Andi => op("andi", RdImm8, 0x000D),
            Opcode::Ori => op("ori", RdImm8, 0x000E),
            Opcode::Testi => op("testi", RdImm8, 0x000F),
            Opcode::Cmv => cond_op("cmv", RdRs, 0x0002, Minor),
            Opcode::Cldi => cond_op("cldi", RdSimm4, 0x0003, Minor),
            Opcode::Halt => op("halt", Bare, 0x0009),
        }
    }

    /// Canonical mnemonic.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Look up a mnemonic or alias (case-insensitive, without suffix).
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        let mut buf = [0u8; 8];
        if name.len() > buf.len() {
            return None;
        }
        buf[..name.len()].copy_from_slice(name.as_bytes());
        buf[..name.len()].make_ascii_lowercase();
        let lower = core::str::from_utf8(&buf[..name.len()]).ok()?;
        match lower {
            "jabsr" => return Some(Opcode::Jr),
            "jreli" => return Some(Opcode::J),
            "jrelr" => return Some(Opcode::Jro),
            _ => {}
        }
        Self::ALL.iter().copied().find(|o| o.name() == lower)
    }

    /// Whether the opcode belongs to the conditional family.
    pub fn is_conditional(self) -> bool {
        self.info().condition.is_some()
    }

    /// Whether the opcode expands to a different real instruction.
    pub fn is_pseudo(self) -> bool {
        matches!(self, Opcode::Halt)
    }

    /// The 4-bit ALU operation code consumed by the hardware decode table.
    ///
    /// Unary operations carry it in bits 8..=11, binary and 4-bit immediate
    /// operations in bits 12..=15. `None` for non-ALU opcodes.
    pub fn alu_op(self) -> Option<u8> {
        let info = self.info();
        if info.base & 0xF != 0x1 {
            return None;
        }
        match info.form {
            Form::Rd => Some(((info.base >> 8) & 0xF) as u8),
            Form::RdRs | Form::RdSimm4 => Some((info.base >> 12) as u8),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Operands ──────────────────────────────────────────────

/// Base a numeric literal was written in; kept for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Radix {
    /// `42`
    #[default]
    Decimal,
    /// `0x2A`
    Hex,
    /// `0o52`
    Octal,
    /// `0b101010`
    Binary,
}

/// A numeric literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Immediate {
    /// Value including sign; range checks happen in the encoder.
    pub value: i64,
    /// Source base.
    pub radix: Radix,
}

impl Immediate {
    /// A decimal literal.
    pub fn new(value: i64) -> Self {
        Self {
            value,
            radix: Radix::Decimal,
        }
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.value < 0 { "-" } else { "" };
        let mag = self.value.unsigned_abs();
        match self.radix {
            Radix::Decimal => write!(f, "{}{}", sign, mag),
            Radix::Hex => write!(f, "{}0x{:02X}", sign, mag),
            Radix::Octal => write!(f, "{}0o{:o}", sign, mag),
            Radix::Binary => write!(f, "{}0b{:b}", sign, mag),
        }
    }
}

/// Search direction of a local label reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// `Nf`
    Forward,
    /// `Nb`
    Backward,
}

/// A symbolic jump target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SymbolRef {
    /// A named label.
    Global(String),
    /// A reusable single-digit label, searched in one direction.
    Local {
        /// The digit, `0..=9`.
        digit: u8,
        /// Search direction.
        direction: Direction,
    },
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolRef::Global(name) => f.write_str(name),
            SymbolRef::Local { digit, direction } => {
                let d = match direction {
                    Direction::Forward => 'f',
                    Direction::Backward => 'b',
                };
                write!(f, "{}{}", digit, d)
            }
        }
    }
}

/// An instruction operand before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    /// `r3`
    Register(Register),
    /// `r1r0`
    RegisterPair(RegisterPair),
    /// A numeric literal (also a literal relative displacement).
    Immediate(Immediate),
    /// A label reference.
    Symbol(SymbolRef),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(r) => write!(f, "{}", r),
            Operand::RegisterPair(p) => write!(f, "{}", p),
            Operand::Immediate(i) => write!(f, "{}", i),
            Operand::Symbol(s) => write!(f, "{}", s),
        }
    }
}

/// An operand together with the source text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Located {
    /// The operand.
    pub operand: Operand,
    /// Where it was written.
    pub span: Span,
}

// ─── Statements ────────────────────────────────────────────

/// A parsed machine instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    /// The opcode (aliases are already folded).
    pub opcode: Opcode,
    /// Condition suffix; present exactly for the conditional family.
    pub condition: Option<Condition>,
    /// Operands in source order, shaped per the opcode's [`Form`].
    pub operands: Vec<Located>,
    /// Source location of the mnemonic.
    pub span: Span,
    /// Address assigned by the layout pass.
    pub address: Option<u16>,
}

impl Instruction {
    /// Mnemonic with its suffix, e.g. `b.nz`.
    pub fn mnemonic(&self) -> Mnemonic<'_> {
        Mnemonic(self)
    }

    /// Operand list as written in a listing, e.g. `r0, 0x2A`.
    pub fn operand_text(&self) -> OperandText<'_> {
        OperandText(self)
    }
}

/// Display adapter returned by [`Instruction::mnemonic`].
pub struct Mnemonic<'a>(&'a Instruction);

impl fmt::Display for Mnemonic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.condition {
            Some(cond) => write!(f, "{}.{}", self.0.opcode, cond),
            None => write!(f, "{}", self.0.opcode),
        }
    }
}

/// Display adapter returned by [`Instruction::operand_text`].
pub struct OperandText<'a>(&'a Instruction);

impl fmt::Display for OperandText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let relative = self.0.opcode.info().form == Form::Rel8;
        for (i, arg) in self.0.operands.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match &arg.operand {
                Operand::Immediate(imm) if relative && imm.value >= 0 => write!(f, "+{}", imm)?,
                other => write!(f, "{}", other)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operands.is_empty() {
            write!(f, "{}", self.mnemonic())
        } else {
            write!(f, "{} {}", self.mnemonic(), self.operand_text())
        }
    }
}

/// Name of a label definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LabelName {
    /// A unique named label.
    Global(String),
    /// A reusable single-digit label.
    Local(u8),
}

impl fmt::Display for LabelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelName::Global(name) => f.write_str(name),
            LabelName::Local(digit) => write!(f, "{}", digit),
        }
    }
}

/// A label definition (`loop:` or `1:`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Label {
    /// Label name.
    pub name: LabelName,
    /// Source location.
    pub span: Span,
    /// Address assigned by the layout pass.
    pub address: Option<u16>,
}

/// `.org ADDRESS`: set the location counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrgDirective {
    /// Requested address; range-checked during layout.
    pub target: Immediate,
    /// Source location.
    pub span: Span,
}

/// A parsed assembly statement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Statement {
    /// A label definition.
    Label(Label),
    /// A placement directive.
    Org(OrgDirective),
    /// A machine instruction.
    Instruction(Instruction),
}

impl Statement {
    /// Source location.
    pub fn span(&self) -> Span {
        match self {
            Statement::Label(l) => l.span,
            Statement::Org(o) => o.span,
            Statement::Instruction(i) => i.span,
        }
    }

    /// Address assigned by the layout pass (`None` before layout and for
    /// directives).
    pub fn address(&self) -> Option<u16> {
        match self {
            Statement::Label(l) => l.address,
            Statement::Org(_) => None,
            Statement::Instruction(i) => i.address,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Label(l) => write!(f, "{}:", l.name),
            Statement::Org(o) => write!(f, ".org {}", o.target),
            Statement::Instruction(i) => write!(f, "{}", i),
        }
    }
}
