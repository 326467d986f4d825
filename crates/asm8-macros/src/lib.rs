//! Compile-time assembly proc-macros for [`asm8`](https://crates.io/crates/asm8).
//!
//! Provides [`asm_bytes!`] and [`asm_words!`], which assemble a source literal
//! at compile time and expand to the flat program image as a `'static`
//! constant. Gaps left by `.org` are filled with zero.
//!
//! # Usage
//!
//! ```rust,ignore
//! use asm8_macros::{asm_bytes, asm_words};
//!
//! // Little-endian ROM bytes
//! const BOOT: &[u8] = asm_bytes!("ldi r0, 0x2A\nhalt");
//!
//! // The same program as instruction words
//! const BOOT_WORDS: &[u16] = asm_words!("ldi r0, 0x2A\nhalt");
//! ```

use proc_macro::TokenStream;

/// Assemble source text at compile time, producing a `&'static [u8]` byte slice.
///
/// # Syntax
///
/// ```rust,ignore
/// asm_bytes!("assembly source")
/// ```
///
/// # Examples
///
/// ```rust,ignore
/// use asm8_macros::asm_bytes;
///
/// // Single instruction
/// const NOP: &[u8] = asm_bytes!("nop");
/// assert_eq!(NOP, &[0x00, 0x00]);
///
/// // Multi-instruction with labels
/// const CODE: &[u8] = asm_bytes!("
///     start:
///         ldi r0, 1
///         j start
/// ");
/// ```
///
/// # Compile-time errors
///
/// If the assembly source contains errors, the macro emits a compile-time error
/// with the full `AsmError` diagnostic message.
#[proc_macro]
pub fn asm_bytes(input: TokenStream) -> TokenStream {
    match asm_bytes_impl(input) {
        Ok(ts) => ts,
        Err(err) => err.into_compile_error(),
    }
}

/// Assemble source text at compile time, producing a `&'static [u16]` of
/// instruction words.
///
/// Word `i` of the slice holds the bytes at addresses `2 * i` and `2 * i + 1`,
/// so the slice indexes the same memory the CPU fetches from.
///
/// # Examples
///
/// ```rust,ignore
/// use asm8_macros::asm_words;
///
/// const HALT: &[u16] = asm_words!("halt");
/// assert_eq!(HALT, &[0x0009]);
/// ```
#[proc_macro]
pub fn asm_words(input: TokenStream) -> TokenStream {
    match asm_words_impl(input) {
        Ok(ts) => ts,
        Err(err) => err.into_compile_error(),
    }
}

// ─── Implementation ─────────────────────────────────────────────────────────

struct MacroInput {
    source: String,
    /// Span of the source literal for error reporting.
    source_span: proc_macro::Span,
}

fn parse_input(input: TokenStream) -> Result<MacroInput, syn_free::Error> {
    let mut tokens = input.into_iter().peekable();

    if tokens.peek().is_none() {
        return Err(syn_free::Error::new("expected assembly source string"));
    }
    let (source, source_span) = parse_string_literal(&mut tokens)?;

    // A trailing comma is tolerated, anything else is not.
    if let Some(proc_macro::TokenTree::Punct(p)) = tokens.peek() {
        if p.as_char() == ',' {
            tokens.next();
        }
    }
    if let Some(extra) = tokens.next() {
        return Err(syn_free::Error::with_span(
            extra.span(),
            "unexpected extra tokens after source string",
        ));
    }

    Ok(MacroInput {
        source,
        source_span,
    })
}

fn asm_bytes_impl(input: TokenStream) -> Result<TokenStream, syn_free::Error> {
    let mi = parse_input(input)?;
    let bytes = do_assemble(&mi)?;
    slice_expr("u8", &bytes, |b| format!("{b:#04X}u8"))
}

fn asm_words_impl(input: TokenStream) -> Result<TokenStream, syn_free::Error> {
    let mi = parse_input(input)?;
    let bytes = do_assemble(&mi)?;
    let words: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]))
        .collect();
    slice_expr("u16", &words, |w| format!("{w:#06X}u16"))
}

fn do_assemble(mi: &MacroInput) -> Result<Vec<u8>, syn_free::Error> {
    asm8::assemble_flat(&mi.source)
        .map_err(|e| syn_free::Error::with_span(mi.source_span, &format!("assembly error: {e}")))
}

fn parse_string_literal(
    tokens: &mut std::iter::Peekable<proc_macro::token_stream::IntoIter>,
) -> Result<(String, proc_macro::Span), syn_free::Error> {
    let tt = tokens
        .next()
        .ok_or_else(|| syn_free::Error::new("expected string literal"))?;
    let proc_macro::TokenTree::Literal(lit) = &tt else {
        return Err(syn_free::Error::with_span(
            tt.span(),
            "expected string literal",
        ));
    };
    let raw = lit.to_string();
    if let Some(rest) = raw.strip_prefix('r') {
        let hashes = rest.chars().take_while(|&c| c == '#').count();
        let fence = "#".repeat(hashes);
        let content = rest[hashes..]
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix(&format!("\"{fence}")))
            .ok_or_else(|| syn_free::Error::with_span(tt.span(), "malformed raw string"))?;
        return Ok((content.to_string(), tt.span()));
    }
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| syn_free::Error::with_span(tt.span(), "expected string literal"))?;
    Ok((unescape_string(inner), tt.span()))
}

fn unescape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('0') => out.push('\0'),
            // Line continuation: drop the newline and leading whitespace.
            Some('\n') => {
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn slice_expr<T>(
    ty: &str,
    items: &[T],
    render: impl Fn(&T) -> String,
) -> Result<TokenStream, syn_free::Error> {
    let inner = items.iter().map(render).collect::<Vec<_>>().join(", ");
    let code = format!("{{ const IMAGE: &[{ty}] = &[{inner}]; IMAGE }}");
    code.parse()
        .map_err(|_| syn_free::Error::new("internal error: generated image did not parse"))
}

// ─── Minimal syn-free error type ─────────────────────────────────────────────
// The input is a single string literal; parsing it from
// `proc_macro::TokenStream` directly keeps `syn` out of the build.

mod syn_free {
    use proc_macro::{Delimiter, Group, Ident, Literal, Punct, Spacing, Span, TokenStream, TokenTree};

    pub struct Error {
        message: String,
        span: Option<Span>,
    }

    impl Error {
        pub fn new(msg: &str) -> Self {
            Self {
                message: msg.to_string(),
                span: None,
            }
        }

        pub fn with_span(span: Span, msg: &str) -> Self {
            Self {
                message: msg.to_string(),
                span: Some(span),
            }
        }

        /// Builds `compile_error!("...")` token by token so no fallible
        /// re-parse is needed.
        pub fn into_compile_error(self) -> TokenStream {
            let span = self.span.unwrap_or_else(Span::call_site);
            let mut message = Literal::string(&self.message);
            message.set_span(span);
            let mut group = Group::new(
                Delimiter::Parenthesis,
                TokenStream::from(TokenTree::Literal(message)),
            );
            group.set_span(span);
            let mut bang = Punct::new('!', Spacing::Alone);
            bang.set_span(span);
            [
                TokenTree::Ident(Ident::new("compile_error", span)),
                TokenTree::Punct(bang),
                TokenTree::Group(group),
            ]
            .into_iter()
            .collect()
        }
    }
}
