//! Lexer for assembly source text.
//!
//! The lexer tokenizes assembly source into a stream of [`Token`]s, each
//! carrying its [`Span`] so that error messages can point back to the exact
//! location in the original input. Registers, register pairs and mnemonics
//! (with their condition suffix) are classified here; operand shapes are
//! checked by the parser.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::str;

use crate::error::{AsmError, Span};
use crate::ir::{Condition, Direction, Opcode, Radix, Register};

/// A token produced by the lexer.
///
/// Token text is borrowed from the source string, so lexing does no
/// per-token heap allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'src> {
    /// Token classification.
    pub kind: TokenKind,
    /// Source text of the token.
    pub text: Cow<'src, str>,
    /// Source location.
    pub span: Span,
}

impl<'src> Token<'src> {
    /// Returns the token text as a `&str`.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The type of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// An identifier that is not a mnemonic or register: a label reference.
    Ident,
    /// A mnemonic, with its condition suffix if one was written.
    Mnemonic {
        /// Opcode (aliases folded).
        opcode: Opcode,
        /// Suffix after the `.`.
        condition: Option<Condition>,
    },
    /// `r0`..`r6`
    Register(Register),
    /// Two register names written together, high first (`r1r0`).
    /// Consecutiveness is checked by the parser.
    RegisterPair {
        /// First-named register.
        high: Register,
        /// Second-named register.
        low: Register,
    },
    /// A numeric literal with its sign applied.
    Number(i64, Radix),
    /// A directive (starts with `.`).
    Directive,
    /// Label definition (`name:`).
    LabelDef,
    /// Local label definition (`1:`).
    LocalLabelDef(u8),
    /// Local label reference (`1f` / `1b`).
    LocalLabelRef(u8, Direction),
    /// Comma separator.
    Comma,
    /// A newline or `;` (statement separator).
    Newline,
    /// End of input.
    Eof,
}

/// Tokenize assembly source text into a vector of tokens.
///
/// The lexer recognizes:
/// - Mnemonics, optionally with a condition suffix (`b.nz`)
/// - Registers (`r0`..`r6`) and register pairs (`r1r0`)
/// - Numeric literals with optional sign (decimal, hex `0x`, binary `0b`,
///   octal `0o`, `_` separators)
/// - Directives (`.org`)
/// - Label definitions (`name:`, `1:`) and local references (`1f`, `1b`)
/// - Comments: `#` and `//` to end of line, `/* ... */` blocks
/// - Newlines and semicolons as statement separators
///
/// # Errors
///
/// Returns `Err(AsmError::Lex)` for an unrecognised character, a malformed
/// number, an unknown condition suffix, a multi-digit local label, or an
/// unterminated block comment.
pub fn tokenize<'s>(source: &'s str) -> Result<Vec<Token<'s>>, AsmError> {
    // Heuristic: ~4 chars per token on average (mnemonics, registers, punctuation).
    let mut tokens = Vec::with_capacity(source.len() / 3 + 1);
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut pos = 0;
    let mut line: u32 = 1;
    let mut col: u32 = 1;
    let mut line_start = 0usize;

    while pos < len {
        let ch = bytes[pos];

        // Skip whitespace (but not newlines)
        if ch == b' ' || ch == b'\t' || ch == b'\r' {
            pos += 1;
            col += 1;
            continue;
        }

        // Newline
        if ch == b'\n' {
            tokens.push(Token {
                kind: TokenKind::Newline,
                text: Cow::Borrowed("\n"),
                span: Span::new(line, col, pos, 1),
            });
            pos += 1;
            line += 1;
            col = 1;
            line_start = pos;
            continue;
        }

        // Semicolon as statement separator
        if ch == b';' {
            tokens.push(Token {
                kind: TokenKind::Newline,
                text: Cow::Borrowed(";"),
                span: Span::new(line, col, pos, 1),
            });
            pos += 1;
            col += 1;
            continue;
        }

        // Line comments: `#` or `//` to EOL
        if ch == b'#' || (ch == b'/' && pos + 1 < len && bytes[pos + 1] == b'/') {
            while pos < len && bytes[pos] != b'\n' {
                pos += 1;
            }
            col = (pos - line_start) as u32 + 1;
            continue;
        }

        // Block comment: skip to matching */
        if ch == b'/' && pos + 1 < len && bytes[pos + 1] == b'*' {
            let comment_start_line = line;
            let comment_start_col = col;
            let comment_start_pos = pos;
            pos += 2;
            col += 2;
            while pos + 1 < len && !(bytes[pos] == b'*' && bytes[pos + 1] == b'/') {
                if bytes[pos] == b'\n' {
                    line += 1;
                    col = 1;
                    line_start = pos + 1;
                } else {
                    col += 1;
                }
                pos += 1;
            }
            if pos + 1 < len {
                pos += 2; // skip */
                col += 2;
            } else {
                return Err(AsmError::Lex {
                    msg: String::from("unterminated block comment"),
                    span: Span::new(comment_start_line, comment_start_col, comment_start_pos, 2),
                });
            }
            continue;
        }

        // Comma
        if ch == b',' {
            tokens.push(Token {
                kind: TokenKind::Comma,
                text: Cow::Borrowed(","),
                span: Span::new(line, col, pos, 1),
            });
            pos += 1;
            col += 1;
            continue;
        }

        // Signed number: the sign must touch the digits
        if (ch == b'-' || ch == b'+') && pos + 1 < len && bytes[pos + 1].is_ascii_digit() {
            let start = pos;
            let start_col = col;
            pos += 1; // skip sign
            let (value, radix) = parse_number_at(bytes, &mut pos, line, start_col, start)?;
            let value = if ch == b'-' { -value } else { value };
            tokens.push(Token {
                kind: TokenKind::Number(value, radix),
                text: Cow::Borrowed(slice_str(bytes, start, pos)),
                span: Span::new(line, start_col, start, pos - start),
            });
            col = (pos - line_start) as u32 + 1;
            continue;
        }

        // Directive (starts with '.')
        if ch == b'.' {
            let start = pos;
            let start_col = col;
            pos += 1;
            col += 1;
            while pos < len && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
                col += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Directive,
                text: Cow::Borrowed(slice_str(bytes, start, pos)),
                span: Span::new(line, start_col, start, pos - start),
            });
            continue;
        }

        // Number or local label
        if ch.is_ascii_digit() {
            let start = pos;
            let start_col = col;

            let mut temp = pos;
            while temp < len && bytes[temp].is_ascii_digit() {
                temp += 1;
            }
            // Local label definition: `1:`. Only single digits, since
            // references can only name one digit.
            if temp < len && bytes[temp] == b':' {
                if temp != start + 1 {
                    return Err(AsmError::Lex {
                        msg: alloc::format!(
                            "local labels must be a single digit (0-9), got `{}`",
                            slice_str(bytes, start, temp)
                        ),
                        span: Span::new(line, start_col, start, temp - start + 1),
                    });
                }
                pos = temp + 1; // past the ':'
                col = (pos - line_start) as u32 + 1;
                tokens.push(Token {
                    kind: TokenKind::LocalLabelDef(ch - b'0'),
                    text: Cow::Borrowed(slice_str(bytes, start, pos)),
                    span: Span::new(line, start_col, start, pos - start),
                });
                continue;
            }
            // Local label reference: `1f` / `1b`, not followed by more word characters.
            // `0b` followed by a binary digit is a binary literal instead.
            if temp == start + 1
                && temp < len
                && (bytes[temp] == b'f' || bytes[temp] == b'b')
                && !(temp + 1 < len && is_word_byte(bytes[temp + 1]))
            {
                pos = temp + 1;
                col = (pos - line_start) as u32 + 1;
                let direction = if bytes[temp] == b'f' {
                    Direction::Forward
                } else {
                    Direction::Backward
                };
                tokens.push(Token {
                    kind: TokenKind::LocalLabelRef(ch - b'0', direction),
                    text: Cow::Borrowed(slice_str(bytes, start, pos)),
                    span: Span::new(line, start_col, start, pos - start),
                });
                continue;
            }

            let (value, radix) = parse_number_at(bytes, &mut pos, line, start_col, start)?;
            tokens.push(Token {
                kind: TokenKind::Number(value, radix),
                text: Cow::Borrowed(slice_str(bytes, start, pos)),
                span: Span::new(line, start_col, start, pos - start),
            });
            col = (pos - line_start) as u32 + 1;
            continue;
        }

        // Identifier: mnemonic, register, label definition or reference
        if ch.is_ascii_alphabetic() || ch == b'_' {
            let start = pos;
            let start_col = col;
            while pos < len && is_word_byte(bytes[pos]) {
                pos += 1;
            }
            let word_end = pos;

            // Condition suffix: `b.nz`
            if pos < len && bytes[pos] == b'.' {
                pos += 1;
                while pos < len && is_word_byte(bytes[pos]) {
                    pos += 1;
                }
                let span = Span::new(line, start_col, start, pos - start);
                let base = slice_str(bytes, start, word_end);
                let suffix = slice_str(bytes, word_end + 1, pos);
                let Some(opcode) = Opcode::from_mnemonic(base) else {
                    return Err(AsmError::Lex {
                        msg: alloc::format!("unknown mnemonic '{}'", base),
                        span,
                    });
                };
                let Some(condition) = Condition::from_suffix(suffix) else {
                    return Err(AsmError::Lex {
                        msg: alloc::format!("unknown condition suffix '.{}'", suffix),
                        span,
                    });
                };
                tokens.push(Token {
                    kind: TokenKind::Mnemonic {
                        opcode,
                        condition: Some(condition),
                    },
                    text: Cow::Borrowed(slice_str(bytes, start, pos)),
                    span,
                });
                col = (pos - line_start) as u32 + 1;
                continue;
            }

            let text = slice_str(bytes, start, pos);

            // Followed by ':' → label definition
            if pos < len && bytes[pos] == b':' {
                pos += 1; // consume ':'
                tokens.push(Token {
                    kind: TokenKind::LabelDef,
                    text: Cow::Borrowed(text),
                    span: Span::new(line, start_col, start, pos - start),
                });
                col = (pos - line_start) as u32 + 1;
                continue;
            }

            tokens.push(Token {
                kind: classify_word(text),
                text: Cow::Borrowed(text),
                span: Span::new(line, start_col, start, pos - start),
            });
            col = (pos - line_start) as u32 + 1;
            continue;
        }

        // Unknown character
        let shown = source[pos..].chars().next().unwrap_or('?');
        return Err(AsmError::Lex {
            msg: alloc::format!("unexpected character '{}'", shown),
            span: Span::new(line, col, pos, shown.len_utf8()),
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        text: Cow::Borrowed(""),
        span: Span::new(line, col, pos, 0),
    });

    Ok(tokens)
}

#[inline]
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// The source is valid UTF-8 and every cut point sits on an ASCII byte.
#[inline]
fn slice_str(bytes: &[u8], start: usize, end: usize) -> &str {
    str::from_utf8(&bytes[start..end]).unwrap_or("")
}

/// Classify a bare word as register, register pair, mnemonic or identifier.
fn classify_word(text: &str) -> TokenKind {
    if let Some(reg) = Register::parse(text) {
        return TokenKind::Register(reg);
    }
    if text.len() == 4 {
        if let (Some(high), Some(low)) = (Register::parse(&text[..2]), Register::parse(&text[2..])) {
            return TokenKind::RegisterPair { high, low };
        }
    }
    if let Some(opcode) = Opcode::from_mnemonic(text) {
        return TokenKind::Mnemonic {
            opcode,
            condition: None,
        };
    }
    TokenKind::Ident
}

/// Parse an unsigned number starting at `pos` in `bytes`. Advances `pos`
/// past the number. `token_start` is where the token began (including any
/// sign) and is used for spans.
#[inline]
fn parse_number_at(
    bytes: &[u8],
    pos: &mut usize,
    span_line: u32,
    span_col: u32,
    token_start: usize,
) -> Result<(i64, Radix), AsmError> {
    let len = bytes.len();

    let (radix, base) = if bytes[*pos] == b'0' && *pos + 1 < len {
        match bytes[*pos + 1] {
            b'x' | b'X' => (Radix::Hex, 16),
            b'o' | b'O' => (Radix::Octal, 8),
            b'b' | b'B' => (Radix::Binary, 2),
            _ => (Radix::Decimal, 10),
        }
    } else {
        (Radix::Decimal, 10)
    };
    if radix != Radix::Decimal {
        *pos += 2;
    }

    let digits_start = *pos;
    while *pos < len && is_word_byte(bytes[*pos]) {
        *pos += 1;
    }
    let raw = slice_str(bytes, digits_start, *pos);
    let span = Span::new(span_line, span_col, token_start, *pos - token_start);

    let mut value: i64 = 0;
    let mut seen_digit = false;
    for c in raw.chars() {
        if c == '_' {
            continue;
        }
        let Some(d) = c.to_digit(base) else {
            return Err(AsmError::Lex {
                msg: alloc::format!(
                    "invalid digit '{}' in base-{} number '{}'",
                    c,
                    base,
                    slice_str(bytes, token_start, *pos)
                ),
                span,
            });
        };
        seen_digit = true;
        value = value
            .checked_mul(i64::from(base))
            .and_then(|v| v.checked_add(i64::from(d)))
            .ok_or_else(|| AsmError::Lex {
                msg: alloc::format!(
                    "number '{}' is too large",
                    slice_str(bytes, token_start, *pos)
                ),
                span,
            })?;
    }
    if !seen_digit {
        return Err(AsmError::Lex {
            msg: alloc::format!("expected base-{} digits", base),
            span,
        });
    }
    Ok((value, radix))
}
