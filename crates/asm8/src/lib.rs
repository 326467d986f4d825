//! # asm8: Two-Pass Assembler for an 8-bit CPU
//!
//! `asm8` turns assembly text for a small 8-bit CPU (seven registers, 16-bit
//! instruction words, 16-bit addresses) into the exact instruction stream
//! the processor executes.
//!
//! ## Quick Start
//!
//! ```rust
//! use asm8::assemble_flat;
//!
//! let code = assemble_flat("ldi r0, 0x00\nhalt").unwrap();
//! assert_eq!(code, vec![0x18, 0x00, 0x09, 0x00]);
//! ```
//!
//! ## Features
//!
//! - **Two passes**: layout assigns every label an address, then each
//!   instruction is encoded against the finished symbol table.
//! - **Local labels**: reusable `1:` definitions referenced as `1b` / `1f`.
//! - **Sparse output**: `.org` may jump anywhere and gaps are never filled
//!   by the assembler. Overlapping instructions are an error.
//! - **`no_std` + `alloc`**: embeddable, `std` only adds `std::error::Error`.
//!
//! ## Source syntax
//!
//! ```text
//! # comment            // comment            /* block */
//! start:               label, may share a line with an instruction
//!     ldi r0, -42      8-bit immediate, signed or unsigned spelling
//!     add r0, r1
//!     b.nz 1f          conditional branch to the next `1:`
//!     jr r1r0          absolute jump through a register pair, high first
//! 1:  halt
//! .org 0x100           move the location counter
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
// ── Pedantic lint policy ─────────────────────────────────────────────────
// Instruction fields are packed with narrowing casts between integer widths
// (i64→u8, u16→u8) and dense hex literals; the lints below are expected.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap,
    clippy::unreadable_literal,
    clippy::match_same_arms,
    clippy::wildcard_imports,
    clippy::enum_glob_use,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args,
    clippy::doc_markdown,
    clippy::similar_names,
    clippy::too_many_lines,
    clippy::single_match_else,
    clippy::manual_let_else,
    clippy::missing_errors_doc,
    clippy::format_push_string
)]

extern crate alloc;

/// Public assembler API: the `Assembler` builder and `AssemblyResult`.
pub mod assembler;
/// Instruction encoder (pass 2): field packing and displacement computation.
pub mod encoder;
/// Error types and source-span diagnostics.
pub mod error;
/// Sparse program image and collision detection.
pub mod image;
/// Intermediate representation: registers, conditions, opcodes, statements.
pub mod ir;
/// Zero-copy lexer (tokenizer) with span tracking.
pub mod lexer;
/// Statement parser producing IR statements.
pub mod parser;
/// Address layout and label resolution (pass 1).
pub mod resolver;

// Re-exports
pub use assembler::{Assembler, AssemblyResult, ResourceLimits};
pub use encoder::Fields;
pub use error::{AsmError, Span};
pub use image::ProgramImage;
pub use ir::{
    Condition, Direction, Form, Immediate, Instruction, Label, LabelName, Opcode, Operand,
    OrgDirective, Radix, Register, RegisterPair, Statement, SymbolRef,
};

use alloc::vec::Vec;

/// Assemble a string of assembly into a sparse program image.
///
/// Semicolons or newlines separate statements.
/// Labels are defined with a trailing colon: `loop:`
///
/// # Errors
///
/// Returns the first [`AsmError`] found: a lexical or syntax error, an
/// unresolved or duplicate label, an out-of-range operand, or overlapping
/// instructions.
///
/// # Examples
///
/// ```rust
/// use asm8::assemble;
///
/// let image = assemble("nop\n.org 0x20\nhalt").unwrap();
/// assert_eq!(image.len(), 2);
/// assert_eq!(image.get(0x20), Some(0x0009));
/// assert_eq!(image.get(0x10), None);
/// ```
pub fn assemble(source: &str) -> Result<ProgramImage, AsmError> {
    let mut asm = Assembler::new();
    asm.emit(source)?;
    Ok(asm.finish()?.into_image())
}

/// Assemble into a flat little-endian byte image starting at address 0,
/// with gaps zero-filled.
///
/// # Errors
///
/// Returns [`AsmError`] on assembly failure (see [`assemble`] for details).
///
/// # Examples
///
/// ```rust
/// use asm8::assemble_flat;
///
/// let code = assemble_flat("jreli +18").unwrap();
/// assert_eq!(code, vec![0x09, 0x12]);
/// ```
pub fn assemble_flat(source: &str) -> Result<Vec<u8>, AsmError> {
    Ok(assemble(source)?.to_bytes(0))
}
