//! Address layout and label resolution (pass 1).
//!
//! [`layout`] walks the statement list once, maintaining the location
//! counter, assigning an address to every label and instruction, and
//! building the [`SymbolTable`]. The table is read-only afterwards; the
//! encoder queries it through [`SymbolTable::resolve`].

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::string::ToString;
use alloc::vec::Vec;

use crate::error::{AsmError, Span};
use crate::ir::{Direction, LabelName, Statement, SymbolRef};

/// Size of every instruction word in bytes.
pub const WORD_BYTES: u32 = 2;

/// Highest address an instruction may start at; its second byte sits at 0xFFFF.
pub const MAX_INSTRUCTION_ADDRESS: u32 = 0xFFFE;

/// A global label definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GlobalDef {
    address: u16,
    span: Span,
}

/// Reusable single-digit labels (`1:` / `1b` / `1f`).
///
/// Definitions are kept per digit in source order. Lookups are by address,
/// not by position in the source, so that a `.org` that moves the location
/// counter backward is handled consistently.
#[derive(Debug, Clone, Default)]
struct LocalLabels {
    defs: BTreeMap<u8, Vec<u16>>,
}

impl LocalLabels {
    fn define(&mut self, digit: u8, address: u16) {
        self.defs.entry(digit).or_default().push(address);
    }

    /// Smallest definition address at or after `from`. Ties go to the
    /// earliest definition in source order.
    fn forward(&self, digit: u8, from: u32) -> Option<u16> {
        let mut best: Option<u16> = None;
        for &addr in self.defs.get(&digit)? {
            if u32::from(addr) >= from && best.map_or(true, |b| addr < b) {
                best = Some(addr);
            }
        }
        best
    }

    /// Largest definition address strictly before `before`.
    fn backward(&self, digit: u8, before: u16) -> Option<u16> {
        let mut best: Option<u16> = None;
        for &addr in self.defs.get(&digit)? {
            if addr < before && best.map_or(true, |b| addr > b) {
                best = Some(addr);
            }
        }
        best
    }

    fn count(&self) -> usize {
        self.defs.values().map(Vec::len).sum()
    }
}

/// Label addresses collected during layout.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    globals: BTreeMap<String, GlobalDef>,
    locals: LocalLabels,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a global label.
    ///
    /// # Errors
    ///
    /// Returns [`AsmError::DuplicateLabel`] if `name` is already defined.
    pub fn define_global(&mut self, name: &str, address: u16, span: Span) -> Result<(), AsmError> {
        if let Some(existing) = self.globals.get(name) {
            return Err(AsmError::DuplicateLabel {
                label: String::from(name),
                span,
                first_span: existing.span,
            });
        }
        self.globals
            .insert(String::from(name), GlobalDef { address, span });
        Ok(())
    }

    /// Record one occurrence of a local label. Redefinition is allowed.
    pub fn define_local(&mut self, digit: u8, address: u16) {
        self.locals.define(digit, address);
    }

    /// Address of a global label.
    pub fn global(&self, name: &str) -> Option<u16> {
        self.globals.get(name).map(|d| d.address)
    }

    /// Number of global labels.
    pub fn global_count(&self) -> usize {
        self.globals.len()
    }

    /// Number of local label occurrences.
    pub fn local_count(&self) -> usize {
        self.locals.count()
    }

    /// Global labels sorted by address, then name.
    pub fn globals_by_address(&self) -> Vec<(String, u16)> {
        let mut out: Vec<(String, u16)> = self
            .globals
            .iter()
            .map(|(name, def)| (name.clone(), def.address))
            .collect();
        out.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    /// Resolve a symbolic target referenced by the instruction at `from`.
    ///
    /// - a global name resolves to its unique definition;
    /// - `Nf` resolves to the lowest definition of `N` at or after the
    ///   following instruction (`from + 2`);
    /// - `Nb` resolves to the highest definition of `N` strictly below `from`.
    ///
    /// # Errors
    ///
    /// Returns [`AsmError::UnresolvedSymbol`] when no definition matches.
    pub fn resolve(&self, sym: &SymbolRef, from: u16, span: Span) -> Result<u16, AsmError> {
        let found = match sym {
            SymbolRef::Global(name) => self.global(name),
            SymbolRef::Local {
                digit,
                direction: Direction::Forward,
            } => self.locals.forward(*digit, u32::from(from) + WORD_BYTES),
            SymbolRef::Local {
                digit,
                direction: Direction::Backward,
            } => self.locals.backward(*digit, from),
        };
        found.ok_or_else(|| AsmError::UnresolvedSymbol {
            label: sym.to_string(),
            span,
        })
    }
}

/// Assign addresses to every statement and collect label definitions.
///
/// The location counter starts at 0, advances by one word per instruction
/// and is overwritten by `.org`. Gaps left by `.org` are not filled.
///
/// # Errors
///
/// - [`AsmError::DuplicateLabel`] for a redefined global label;
/// - [`AsmError::ImmediateOutOfRange`] for a `.org` outside `0..=0xFFFF`;
/// - [`AsmError::AddressOutOfRange`] for an instruction or label past the
///   end of the address space.
pub fn layout(statements: &mut [Statement]) -> Result<SymbolTable, AsmError> {
    let mut symbols = SymbolTable::new();
    let mut lc: u32 = 0;

    for stmt in statements.iter_mut() {
        match stmt {
            Statement::Label(label) => {
                let address = u16::try_from(lc).map_err(|_| AsmError::AddressOutOfRange {
                    address: lc,
                    span: label.span,
                })?;
                label.address = Some(address);
                match &label.name {
                    LabelName::Global(name) => {
                        symbols.define_global(name, address, label.span)?;
                    }
                    LabelName::Local(digit) => symbols.define_local(*digit, address),
                }
            }
            Statement::Org(org) => {
                let target = org.target.value;
                if !(0..=0xFFFF).contains(&target) {
                    return Err(AsmError::ImmediateOutOfRange {
                        value: target,
                        min: 0,
                        max: 0xFFFF,
                        span: org.span,
                    });
                }
                tracing::trace!(from = lc, to = target, "placement directive");
                lc = target as u32;
            }
            Statement::Instruction(instr) => {
                if lc > MAX_INSTRUCTION_ADDRESS {
                    return Err(AsmError::AddressOutOfRange {
                        address: lc,
                        span: instr.span,
                    });
                }
                instr.address = Some(lc as u16);
                lc += WORD_BYTES;
            }
        }
    }

    Ok(symbols)
}
