//! Public assembler API: builder pattern and one-shot assembly.
//!
//! This module ties together the lexer, parser, layout pass and encoder
//! into a fluent API for assembling code.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::encoder;
use crate::error::AsmError;
use crate::image::{ImageBuilder, ProgramImage};
use crate::ir::*;
use crate::parser;
use crate::resolver;

/// The result of a successful assembly operation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct AssemblyResult {
    /// The assembled program.
    image: ProgramImage,
    /// Global label addresses, sorted by address.
    labels: Vec<(String, u16)>,
    /// Rendered listing lines, one per statement (empty unless enabled).
    listing: Vec<String>,
}

impl AssemblyResult {
    /// The program image.
    ///
    /// # Examples
    ///
    /// ```
    /// use asm8::Assembler;
    ///
    /// let mut asm = Assembler::new();
    /// asm.emit("ldi r0, 0x00")?;
    /// let result = asm.finish()?;
    /// assert_eq!(result.image().get(0), Some(0x0018));
    /// # Ok::<(), asm8::AsmError>(())
    /// ```
    pub fn image(&self) -> &ProgramImage {
        &self.image
    }

    /// Consume and return the program image.
    pub fn into_image(self) -> ProgramImage {
        self.image
    }

    /// Flat little-endian bytes from address 0, gaps filled with `fill`.
    ///
    /// # Examples
    ///
    /// ```
    /// use asm8::Assembler;
    ///
    /// let mut asm = Assembler::new();
    /// asm.emit(".org 2\nhalt")?;
    /// let result = asm.finish()?;
    /// assert_eq!(result.to_bytes(0xFF), [0xFF, 0xFF, 0x09, 0x00]);
    /// # Ok::<(), asm8::AsmError>(())
    /// ```
    pub fn to_bytes(&self, fill: u8) -> Vec<u8> {
        self.image.to_bytes(fill)
    }

    /// Global labels and their addresses, sorted by address.
    ///
    /// # Examples
    ///
    /// ```
    /// use asm8::Assembler;
    ///
    /// let mut asm = Assembler::new();
    /// asm.emit("start: nop\nloop: j loop")?;
    /// let result = asm.finish()?;
    /// assert_eq!(
    ///     result.labels(),
    ///     &[(String::from("start"), 0), (String::from("loop"), 2)]
    /// );
    /// # Ok::<(), asm8::AsmError>(())
    /// ```
    pub fn labels(&self) -> &[(String, u16)] {
        &self.labels
    }

    /// Look up a global label's address.
    pub fn label_address(&self, name: &str) -> Option<u16> {
        self.labels
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, addr)| addr)
    }

    /// Human-readable listing, one line per source statement.
    ///
    /// Empty unless [`Assembler::enable_listing`] was called.
    ///
    /// ```text
    /// 0000:        start:
    /// 0000:  2A18  ldi      r0, 0x2A
    /// 0002:  FE09  j        start  # -> 0000
    /// ```
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for line in &self.listing {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Configurable resource limits for defense against pathological input.
///
/// All limits default to values far beyond what fits in a 64 KiB program.
///
/// # Examples
///
/// ```rust
/// use asm8::{Assembler, AsmError, ResourceLimits};
///
/// let mut asm = Assembler::new();
/// asm.limits(ResourceLimits {
///     max_statements: 2,
///     ..ResourceLimits::default()
/// });
/// let err = asm.emit("nop\nnop\nnop").unwrap_err();
/// assert!(matches!(err, AsmError::ResourceLimitExceeded { .. }));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceLimits {
    /// Maximum input source bytes per `emit()` call. Default: 64 MiB.
    pub max_source_bytes: usize,
    /// Maximum number of parsed statements across all `emit()` calls.
    /// Default: 1,000,000.
    pub max_statements: usize,
    /// Maximum number of label definitions (global and local).
    /// Default: 100,000.
    pub max_labels: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_source_bytes: 64 * 1024 * 1024,
            max_statements: 1_000_000,
            max_labels: 100_000,
        }
    }
}

/// Builder-pattern assembler.
///
/// Every `emit()` call adds source text to one assembly unit; labels are
/// shared across calls. Nothing is resolved until [`finish`](Self::finish).
///
/// # Examples
///
/// ```rust
/// use asm8::Assembler;
///
/// let mut asm = Assembler::new();
/// asm.emit("ldi r0, 1").unwrap();
/// asm.emit("loop: addi r0, 1\nb.nc loop").unwrap();
/// let result = asm.finish().unwrap();
/// assert_eq!(result.image().len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct Assembler {
    statements: Vec<Statement>,
    /// Whether to render listing lines in `finish()`.
    /// Off by default to avoid per-statement String allocations.
    listing_enabled: bool,
    resource_limits: ResourceLimits,
    statement_count: usize,
    label_count: usize,
    /// Accepted `emit` calls; the next one becomes source number `sources`.
    sources: u32,
}

impl Assembler {
    /// Create an empty assembler with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set resource limits for defense against pathological inputs.
    ///
    /// See [`ResourceLimits`] for the available limits and their defaults.
    pub fn limits(&mut self, limits: ResourceLimits) -> &mut Self {
        self.resource_limits = limits;
        self
    }

    /// Render a listing during `finish()`, see [`AssemblyResult::listing`].
    pub fn enable_listing(&mut self) -> &mut Self {
        self.listing_enabled = true;
        self
    }

    /// Parse assembly source text and add it to the unit.
    ///
    /// Spans in the parsed text, and in any error it causes later, carry the
    /// index of this call among the accepted ones (see
    /// [`AsmError::with_sources`]).
    ///
    /// # Errors
    ///
    /// Returns [`AsmError`] on lexical or syntax errors, or if resource
    /// limits are exceeded.
    pub fn emit(&mut self, source: &str) -> Result<&mut Self, AsmError> {
        if source.len() > self.resource_limits.max_source_bytes {
            return Err(AsmError::ResourceLimitExceeded {
                resource: String::from("source bytes"),
                limit: self.resource_limits.max_source_bytes,
            });
        }
        let index = self.sources;
        let mut statements = parser::parse_str(source).map_err(|e| e.in_source(index))?;

        // Counters only move once the whole emit is accepted.
        let statement_count = self.statement_count + statements.len();
        if statement_count > self.resource_limits.max_statements {
            return Err(AsmError::ResourceLimitExceeded {
                resource: String::from("statements"),
                limit: self.resource_limits.max_statements,
            });
        }
        let label_count = self.label_count
            + statements
                .iter()
                .filter(|s| matches!(s, Statement::Label(_)))
                .count();
        if label_count > self.resource_limits.max_labels {
            return Err(AsmError::ResourceLimitExceeded {
                resource: String::from("labels"),
                limit: self.resource_limits.max_labels,
            });
        }

        tracing::debug!(statements = statements.len(), "parsed source");
        self.statement_count = statement_count;
        self.label_count = label_count;
        self.sources += 1;
        if index > 0 {
            for stmt in &mut statements {
                stamp_source(stmt, index);
            }
        }
        self.statements.extend(statements);
        Ok(self)
    }

    /// Number of statements collected so far.
    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    /// Discard all collected source, keeping limits and options.
    pub fn reset(&mut self) -> &mut Self {
        self.statements.clear();
        self.statement_count = 0;
        self.label_count = 0;
        self.sources = 0;
        self
    }

    /// Resolve labels, encode every instruction and build the image.
    ///
    /// # Errors
    ///
    /// Returns the first [`AsmError`] found: a duplicate or unresolved
    /// label, an operand out of range, or overlapping instructions.
    pub fn finish(mut self) -> Result<AssemblyResult, AsmError> {
        tracing::debug!(statements = self.statements.len(), "layout pass");
        let symbols = resolver::layout(&mut self.statements)?;
        tracing::debug!(
            globals = symbols.global_count(),
            locals = symbols.local_count(),
            "layout done"
        );

        let mut image = ImageBuilder::new();
        let mut listing = Vec::new();
        for stmt in &self.statements {
            match stmt {
                Statement::Instruction(instr) => {
                    let Some(address) = instr.address else {
                        continue;
                    };
                    let encoded = encoder::encode_instruction(instr, address, &symbols)?;
                    tracing::trace!(
                        address,
                        word = encoded.word,
                        instruction = %instr,
                        "encoded"
                    );
                    image.place(address, encoded.word, instr.span)?;
                    if self.listing_enabled {
                        listing.push(instruction_line(instr, address, encoded));
                    }
                }
                Statement::Label(label) if self.listing_enabled => {
                    listing.push(format!(
                        "{:04X}:        {}",
                        label.address.unwrap_or_default(),
                        stmt
                    ));
                }
                Statement::Org(org) if self.listing_enabled => {
                    listing.push(format!("{:04X}:        {}", org.target.value, stmt));
                }
                _ => {}
            }
        }
        tracing::debug!(words = image.len(), "encode pass done");

        Ok(AssemblyResult {
            image: image.finish(),
            labels: symbols.globals_by_address(),
            listing,
        })
    }
}

fn stamp_source(stmt: &mut Statement, source: u32) {
    match stmt {
        Statement::Label(label) => label.span = label.span.in_source(source),
        Statement::Org(org) => org.span = org.span.in_source(source),
        Statement::Instruction(instr) => {
            instr.span = instr.span.in_source(source);
            for operand in &mut instr.operands {
                operand.span = operand.span.in_source(source);
            }
        }
    }
}

fn instruction_line(instr: &Instruction, address: u16, encoded: encoder::Encoded) -> String {
    let mnemonic = format!("{}", instr.mnemonic());
    let operands = format!("{}", instr.operand_text());
    let mut line = if operands.is_empty() {
        format!("{:04X}:  {:04X}  {}", address, encoded.word, mnemonic)
    } else {
        format!(
            "{:04X}:  {:04X}  {:<9}{}",
            address, encoded.word, mnemonic, operands
        )
    };
    if let Some(target) = encoded.target {
        line.push_str(&format!("  # -> {:04X}", target));
    }
    line
}
