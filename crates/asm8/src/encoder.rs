//! Instruction encoder (pass 2).
//!
//! Turns one laid-out [`Instruction`] into its 16-bit word. Every opcode is
//! its base word from [`Opcode::info`] with the operand fields OR-ed in:
//!
//! ```text
//!  15    12 11     8 7      4 3      0
//! +--------+--------+--------+--------+
//! |   f1   |   rs   |   rd   |   f0   |
//! +--------+--------+--------+--------+
//! |      imm8       |
//! +-----------------+
//! ```

use alloc::format;
use alloc::string::ToString;

use crate::error::{AsmError, Span};
use crate::ir::*;
use crate::resolver::SymbolTable;

/// Accepted range of an 8-bit immediate (signed or unsigned spelling).
pub const IMM8_RANGE: (i64, i64) = (-128, 255);
/// Accepted range of a 4-bit signed immediate.
pub const SIMM4_RANGE: (i64, i64) = (-8, 7);
/// Accepted range of a relative displacement.
pub const REL8_RANGE: (i64, i64) = (-128, 127);

const RD_SHIFT: u16 = 4;
const RS_SHIFT: u16 = 8;
const F1_SHIFT: u16 = 12;
const IMM8_SHIFT: u16 = 8;

/// Result of encoding one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoded {
    /// The instruction word.
    pub word: u16,
    /// Resolved address of a symbolic relative target, for listings.
    pub target: Option<u16>,
}

/// Encode `instr`, placed at `address`, resolving labels through `symbols`.
///
/// # Errors
///
/// - [`AsmError::UnresolvedSymbol`] for an unknown label;
/// - [`AsmError::ImmediateOutOfRange`] for an immediate that does not fit;
/// - [`AsmError::DisplacementOutOfRange`] for a relative target more than a
///   signed byte away;
/// - [`AsmError::Syntax`] if the operands do not match the opcode's form
///   (the parser normally rejects these earlier).
pub fn encode_instruction(
    instr: &Instruction,
    address: u16,
    symbols: &SymbolTable,
) -> Result<Encoded, AsmError> {
    let info = instr.opcode.info();
    let mut word = info.base;
    let mut target = None;

    match info.form {
        Form::Bare => {}
        Form::Rd => {
            word |= register(instr, 0)?.field() << RD_SHIFT;
        }
        Form::RdRs => {
            word |= register(instr, 0)?.field() << RD_SHIFT;
            word |= register(instr, 1)?.field() << RS_SHIFT;
        }
        Form::RdImm8 => {
            word |= register(instr, 0)?.field() << RD_SHIFT;
            let value = immediate(instr, 1, IMM8_RANGE)?;
            word |= u16::from(value as u8) << IMM8_SHIFT;
        }
        Form::RdSimm4 => {
            word |= register(instr, 0)?.field() << RD_SHIFT;
            let value = immediate(instr, 1, SIMM4_RANGE)?;
            word |= ((value & 0xF) as u16) << RS_SHIFT;
        }
        Form::Rs => {
            word |= register(instr, 0)?.field() << RS_SHIFT;
        }
        Form::Rs16 => {
            word |= pair(instr, 0)?.field() << RS_SHIFT;
        }
        Form::Rel8 => {
            let (disp, resolved) = displacement(instr, address, symbols)?;
            word |= u16::from(disp as u8) << IMM8_SHIFT;
            target = resolved;
        }
    }

    if let Some(slot) = info.condition {
        let cond = instr.condition.ok_or_else(|| AsmError::Syntax {
            msg: format!(
                "'{}' requires a condition suffix (e.g. '{}.z')",
                instr.opcode, instr.opcode
            ),
            span: instr.span,
        })?;
        word |= match slot {
            ConditionSlot::Rd => cond.code() << RD_SHIFT,
            ConditionSlot::Minor => cond.code() << F1_SHIFT,
        };
    }

    Ok(Encoded { word, target })
}

fn operand(instr: &Instruction, index: usize) -> Result<&Located, AsmError> {
    instr.operands.get(index).ok_or_else(|| AsmError::Syntax {
        msg: format!("'{}' is missing operand {}", instr.mnemonic(), index + 1),
        span: instr.span,
    })
}

fn mismatch(instr: &Instruction, kind: OperandKind, span: Span) -> AsmError {
    AsmError::Syntax {
        msg: format!("expected {} operand for '{}'", kind, instr.mnemonic()),
        span,
    }
}

fn register(instr: &Instruction, index: usize) -> Result<Register, AsmError> {
    let arg = operand(instr, index)?;
    match arg.operand {
        Operand::Register(r) => Ok(r),
        _ => Err(mismatch(instr, OperandKind::Register, arg.span)),
    }
}

fn pair(instr: &Instruction, index: usize) -> Result<RegisterPair, AsmError> {
    let arg = operand(instr, index)?;
    match arg.operand {
        Operand::RegisterPair(p) => Ok(p),
        _ => Err(mismatch(instr, OperandKind::RegisterPair, arg.span)),
    }
}

fn immediate(instr: &Instruction, index: usize, (min, max): (i64, i64)) -> Result<i64, AsmError> {
    let arg = operand(instr, index)?;
    let Operand::Immediate(imm) = arg.operand else {
        return Err(mismatch(instr, OperandKind::Immediate, arg.span));
    };
    if imm.value < min || imm.value > max {
        return Err(AsmError::ImmediateOutOfRange {
            value: imm.value,
            min,
            max,
            span: arg.span,
        });
    }
    Ok(imm.value)
}

/// Signed displacement of the relative operand, measured from the branch's
/// own address. A literal is taken as the displacement itself.
fn displacement(
    instr: &Instruction,
    address: u16,
    symbols: &SymbolTable,
) -> Result<(i64, Option<u16>), AsmError> {
    let arg = operand(instr, 0)?;
    let (disp, target) = match &arg.operand {
        Operand::Immediate(imm) => (imm.value, None),
        Operand::Symbol(sym) => {
            let target = symbols.resolve(sym, address, arg.span)?;
            (i64::from(target) - i64::from(address), Some(target))
        }
        _ => return Err(mismatch(instr, OperandKind::Target, arg.span)),
    };
    let (min, max) = REL8_RANGE;
    if disp < min || disp > max {
        return Err(AsmError::DisplacementOutOfRange {
            target: arg.operand.to_string(),
            disp,
            span: arg.span,
        });
    }
    Ok((disp, target))
}

/// Field view of an encoded word, following the same slot layout the
/// encoder packs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fields(pub u16);

impl Fields {
    /// Bits 0..=3.
    pub fn f0(self) -> u16 {
        self.0 & 0xF
    }

    /// Bits 4..=7.
    pub fn rd(self) -> u16 {
        (self.0 >> RD_SHIFT) & 0xF
    }

    /// Bits 8..=11.
    pub fn rs(self) -> u16 {
        (self.0 >> RS_SHIFT) & 0xF
    }

    /// Bits 12..=15.
    pub fn f1(self) -> u16 {
        self.0 >> F1_SHIFT
    }

    /// Bits 8..=15 as an unsigned byte.
    pub fn imm8(self) -> u8 {
        (self.0 >> IMM8_SHIFT) as u8
    }

    /// Bits 8..=15 as a signed displacement.
    pub fn disp8(self) -> i8 {
        self.imm8() as i8
    }

    /// Target of a relative jump placed at `address`, if it stays inside
    /// the address space.
    pub fn relative_target(self, address: u16) -> Option<u16> {
        let target = i32::from(address) + i32::from(self.disp8());
        u16::try_from(target).ok()
    }
}
