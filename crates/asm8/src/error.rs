//! Error types and source span tracking for diagnostics.

#[allow(unused_imports)]
use alloc::format;
use alloc::string::String;
use core::fmt;

/// Source location for diagnostics.
///
/// Tracks the line, column, byte offset, and length of a token or construct
/// in the original assembly source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (byte offset within line).
    pub col: u32,
    /// 0-based byte offset from start of source.
    pub offset: usize,
    /// Byte length of the spanned region.
    pub len: usize,
    /// Which `emit` call the text came from, counting from 0.
    pub source: u32,
}

impl Span {
    /// Create a new span.
    #[must_use]
    pub fn new(line: u32, col: u32, offset: usize, len: usize) -> Self {
        Self {
            line,
            col,
            offset,
            len,
            source: 0,
        }
    }

    /// The same location, attributed to source text number `source`.
    #[must_use]
    pub fn in_source(self, source: u32) -> Self {
        Self { source, ..self }
    }

    /// A dummy span for constructs with no source text.
    #[must_use]
    pub fn dummy() -> Self {
        Self::default()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Assembly error with source location and descriptive message.
///
/// Assembly of a unit is all-or-nothing: the first error aborts and no
/// program image is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AsmError {
    /// Malformed token or unterminated block comment.
    Lex {
        /// What went wrong.
        msg: String,
        /// Source location of the offending text.
        span: Span,
    },

    /// Wrong operand shape or arity, or a misplaced condition suffix.
    Syntax {
        /// The syntax error message (expected vs. found).
        msg: String,
        /// Source location of the syntax error.
        span: Span,
    },

    /// A label reference with no matching definition.
    ///
    /// For local references (`1f`, `2b`) this means no definition of the
    /// digit exists in the requested direction.
    UnresolvedSymbol {
        /// The reference as written.
        label: String,
        /// Source location of the reference.
        span: Span,
    },

    /// Global label was defined more than once.
    DuplicateLabel {
        /// The duplicated label name.
        label: String,
        /// Source location of the duplicate definition.
        span: Span,
        /// Source location of the first definition.
        first_span: Span,
    },

    /// Immediate value does not fit its field.
    ImmediateOutOfRange {
        /// The literal value as written.
        value: i64,
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// Source location of the immediate.
        span: Span,
    },

    /// Relative jump or branch target is more than a signed byte away.
    DisplacementOutOfRange {
        /// The target as written (label name or literal).
        target: String,
        /// The displacement that did not fit.
        disp: i64,
        /// Source location of the operand.
        span: Span,
    },

    /// An instruction word overlaps one that was already placed.
    AddressCollision {
        /// Address of the new instruction.
        address: u16,
        /// Source location of the new instruction.
        span: Span,
        /// Source location of the instruction already occupying the space.
        first_span: Span,
    },

    /// An instruction would extend past the end of the 16-bit address space.
    AddressOutOfRange {
        /// Location counter at the instruction.
        address: u32,
        /// Source location of the instruction.
        span: Span,
    },

    /// A configurable resource limit was exceeded.
    ResourceLimitExceeded {
        /// Human-readable name of the resource (e.g. "statements", "labels").
        resource: String,
        /// The configured limit that was exceeded.
        limit: usize,
    },
}

impl AsmError {
    /// Source location of the error, if it has one.
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        match self {
            AsmError::Lex { span, .. }
            | AsmError::Syntax { span, .. }
            | AsmError::UnresolvedSymbol { span, .. }
            | AsmError::DuplicateLabel { span, .. }
            | AsmError::ImmediateOutOfRange { span, .. }
            | AsmError::DisplacementOutOfRange { span, .. }
            | AsmError::AddressCollision { span, .. }
            | AsmError::AddressOutOfRange { span, .. } => Some(*span),
            AsmError::ResourceLimitExceeded { .. } => None,
        }
    }

    /// Attribute every span of the error to source text number `source`.
    #[must_use]
    pub fn in_source(mut self, source: u32) -> Self {
        match &mut self {
            AsmError::DuplicateLabel {
                span, first_span, ..
            }
            | AsmError::AddressCollision {
                span, first_span, ..
            } => {
                *span = span.in_source(source);
                *first_span = first_span.in_source(source);
            }
            AsmError::Lex { span, .. }
            | AsmError::Syntax { span, .. }
            | AsmError::UnresolvedSymbol { span, .. }
            | AsmError::ImmediateOutOfRange { span, .. }
            | AsmError::DisplacementOutOfRange { span, .. }
            | AsmError::AddressOutOfRange { span, .. } => *span = span.in_source(source),
            AsmError::ResourceLimitExceeded { .. } => {}
        }
        self
    }

    /// Render the error with every location prefixed by the name of its
    /// source, `names[span.source]`.
    ///
    /// ```
    /// let mut asm = asm8::Assembler::new();
    /// asm.emit("nop")?;
    /// asm.emit(".org 0\nhalt")?;
    /// let err = asm.finish().unwrap_err();
    /// assert_eq!(
    ///     err.with_sources(&["boot.s", "main.s"]).to_string(),
    ///     "main.s:2:1: instruction at 0x0000 overlaps instruction placed at boot.s:1:1"
    /// );
    /// # Ok::<(), asm8::AsmError>(())
    /// ```
    pub fn with_sources<'a, S: AsRef<str>>(&'a self, names: &'a [S]) -> Sourced<'a, S> {
        Sourced { error: self, names }
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: &[&str] = &[];
        fmt::Display::fmt(&Sourced { error: self, names }, f)
    }
}

/// An [`AsmError`] rendered with source names, see [`AsmError::with_sources`].
pub struct Sourced<'a, S> {
    error: &'a AsmError,
    names: &'a [S],
}

/// A span prefixed with its source name when one is known.
struct At<'a, S> {
    span: Span,
    names: &'a [S],
}

impl<S: AsRef<str>> fmt::Display for At<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.names.get(self.span.source as usize) {
            Some(name) => write!(f, "{}:{}", name.as_ref(), self.span),
            None => write!(f, "{}", self.span),
        }
    }
}

impl<S: AsRef<str>> fmt::Display for Sourced<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = |span: &Span| At {
            span: *span,
            names: self.names,
        };
        match self.error {
            AsmError::Lex { msg, span } => write!(f, "{}: {}", at(span), msg),
            AsmError::Syntax { msg, span } => write!(f, "{}: {}", at(span), msg),
            AsmError::UnresolvedSymbol { label, span } => {
                write!(f, "{}: unresolved symbol '{}'", at(span), label)
            }
            AsmError::DuplicateLabel {
                label,
                span,
                first_span,
            } => {
                write!(
                    f,
                    "{}: duplicate label '{}' (first defined at {})",
                    at(span),
                    label,
                    at(first_span)
                )
            }
            AsmError::ImmediateOutOfRange {
                value,
                min,
                max,
                span,
            } => {
                write!(
                    f,
                    "{}: immediate value {} out of range [{}..{}]",
                    at(span),
                    value,
                    min,
                    max
                )
            }
            AsmError::DisplacementOutOfRange { target, disp, span } => {
                write!(
                    f,
                    "{}: jump target '{}' out of range (displacement={}, allowed -128..127)",
                    at(span),
                    target,
                    disp
                )
            }
            AsmError::AddressCollision {
                address,
                span,
                first_span,
            } => {
                write!(
                    f,
                    "{}: instruction at 0x{:04X} overlaps instruction placed at {}",
                    at(span),
                    address,
                    at(first_span)
                )
            }
            AsmError::AddressOutOfRange { address, span } => {
                write!(
                    f,
                    "{}: instruction at 0x{:X} does not fit in the 16-bit address space",
                    at(span),
                    address
                )
            }
            AsmError::ResourceLimitExceeded { resource, limit } => {
                write!(
                    f,
                    "resource limit exceeded: {} (limit: {})",
                    resource, limit
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AsmError {}
