//! Statement parser.
//!
//! Converts a stream of [`Token`]s from the lexer into a [`Statement`] list.
//! Operand shapes are validated against each opcode's [`Form`]; value ranges
//! and symbol existence are left to the layout and encoding passes.

use alloc::string::String;
use alloc::string::ToString;
use alloc::vec::Vec;

use crate::error::{AsmError, Span};
use crate::ir::*;
use crate::lexer::{Token, TokenKind};

/// Zero-allocation ASCII-lowercase into a caller-provided stack buffer.
/// Returns `&str` of the lowered text. Inputs longer than `buf` are truncated.
#[inline]
fn to_lower_buf<'b>(s: &str, buf: &'b mut [u8]) -> &'b str {
    let len = s.len().min(buf.len());
    buf[..len].copy_from_slice(&s.as_bytes()[..len]);
    buf[..len].make_ascii_lowercase();
    core::str::from_utf8(&buf[..len]).unwrap_or("")
}

/// Parse a token stream into a list of IR statements.
///
/// # Errors
///
/// Returns `Err(AsmError::Syntax)` if the token stream contains an
/// unexpected token, an unknown directive, a malformed operand list, a
/// missing condition suffix on a conditional mnemonic, or a suffix on an
/// unconditional one.
pub fn parse(tokens: &[Token<'_>]) -> Result<Vec<Statement>, AsmError> {
    let mut parser = Parser::new(tokens);
    parser.parse_program()
}

/// Convenience: parse assembly text directly into statements.
///
/// # Errors
///
/// Returns the first lexing or parsing error.
pub fn parse_str(source: &str) -> Result<Vec<Statement>, AsmError> {
    let tokens = crate::lexer::tokenize(source)?;
    parse(&tokens)
}

struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token<'a>]) -> Self {
        Self { tokens, pos: 0 }
    }

    #[inline]
    fn peek(&self) -> &Token<'a> {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    #[inline]
    fn advance(&mut self) -> &Token<'a> {
        let tok = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    #[inline]
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.peek().kind == TokenKind::Eof
    }

    #[inline]
    fn skip_newlines(&mut self) {
        while !self.at_end() && self.peek().kind == TokenKind::Newline {
            self.advance();
        }
    }

    fn parse_program(&mut self) -> Result<Vec<Statement>, AsmError> {
        if self.tokens.is_empty() {
            return Ok(Vec::new());
        }
        // Heuristic: ~3 tokens per statement on average.
        let mut stmts = Vec::with_capacity(self.tokens.len() / 3 + 1);
        self.skip_newlines();
        while !self.at_end() {
            stmts.push(self.parse_statement()?);
            self.skip_newlines();
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> Result<Statement, AsmError> {
        let tok = self.advance().clone();

        match tok.kind {
            // A label may share its line with the statement that follows.
            TokenKind::LabelDef => Ok(Statement::Label(Label {
                name: LabelName::Global(tok.text.to_string()),
                span: tok.span,
                address: None,
            })),
            TokenKind::LocalLabelDef(digit) => Ok(Statement::Label(Label {
                name: LabelName::Local(digit),
                span: tok.span,
                address: None,
            })),

            TokenKind::Directive => {
                let stmt = self.parse_directive(&tok)?;
                self.expect_statement_end()?;
                Ok(stmt)
            }

            TokenKind::Mnemonic { opcode, condition } => {
                let instr = self.parse_instruction(opcode, condition, tok.span)?;
                self.expect_statement_end()?;
                Ok(Statement::Instruction(instr))
            }

            TokenKind::Ident => Err(AsmError::Syntax {
                msg: alloc::format!("unknown mnemonic '{}'", tok.text),
                span: tok.span,
            }),

            _ => Err(AsmError::Syntax {
                msg: alloc::format!("unexpected {}", describe(&tok)),
                span: tok.span,
            }),
        }
    }

    fn parse_directive(&mut self, tok: &Token<'a>) -> Result<Statement, AsmError> {
        let mut dir_buf = [0u8; 16];
        let dir = to_lower_buf(&tok.text, &mut dir_buf);

        match dir {
            ".org" => {
                let arg = self.advance().clone();
                match arg.kind {
                    TokenKind::Number(value, radix) => Ok(Statement::Org(OrgDirective {
                        target: Immediate { value, radix },
                        span: tok.span,
                    })),
                    _ => Err(AsmError::Syntax {
                        msg: alloc::format!("expected address after .org, found {}", describe(&arg)),
                        span: arg.span,
                    }),
                }
            }
            _ => Err(AsmError::Syntax {
                msg: alloc::format!("unknown directive '{}'", tok.text),
                span: tok.span,
            }),
        }
    }

    fn parse_instruction(
        &mut self,
        opcode: Opcode,
        condition: Option<Condition>,
        span: Span,
    ) -> Result<Instruction, AsmError> {
        let info = opcode.info();
        match (info.condition, condition) {
            (Some(_), None) => {
                return Err(AsmError::Syntax {
                    msg: alloc::format!(
                        "'{}' requires a condition suffix (e.g. '{}.z')",
                        info.name,
                        info.name
                    ),
                    span,
                });
            }
            (None, Some(cond)) => {
                return Err(AsmError::Syntax {
                    msg: alloc::format!(
                        "'{}' does not take a condition suffix, found '.{}'",
                        info.name,
                        cond
                    ),
                    span,
                });
            }
            _ => {}
        }

        let kinds = info.form.operands();
        let mut operands = Vec::with_capacity(kinds.len());
        for (i, &kind) in kinds.iter().enumerate() {
            if i > 0 {
                let tok = self.advance().clone();
                if tok.kind != TokenKind::Comma {
                    return Err(AsmError::Syntax {
                        msg: alloc::format!(
                            "expected ',' before {} operand of '{}', found {}",
                            kind,
                            info.name,
                            describe(&tok)
                        ),
                        span: tok.span,
                    });
                }
            }
            operands.push(self.parse_operand(kind, info.name)?);
        }

        Ok(Instruction {
            opcode,
            condition,
            operands,
            span,
            address: None,
        })
    }

    fn parse_operand(&mut self, kind: OperandKind, mnemonic: &str) -> Result<Located, AsmError> {
        let tok = self.advance().clone();
        let operand = match (kind, &tok.kind) {
            (OperandKind::Register, TokenKind::Register(r)) => Operand::Register(*r),
            (OperandKind::RegisterPair, TokenKind::RegisterPair { high, low }) => {
                match RegisterPair::new(*high, *low) {
                    Some(pair) => Operand::RegisterPair(pair),
                    None => {
                        return Err(AsmError::Syntax {
                            msg: alloc::format!(
                                "registers in a register pair must be consecutive, high first; found '{}'",
                                tok.text
                            ),
                            span: tok.span,
                        });
                    }
                }
            }
            (OperandKind::Immediate | OperandKind::Target, TokenKind::Number(value, radix)) => {
                Operand::Immediate(Immediate {
                    value: *value,
                    radix: *radix,
                })
            }
            // Any bare word names a label here, including ones spelled like a
            // mnemonic or register.
            (
                OperandKind::Target,
                TokenKind::Ident
                | TokenKind::Register(_)
                | TokenKind::RegisterPair { .. }
                | TokenKind::Mnemonic {
                    condition: None,
                    ..
                },
            ) => Operand::Symbol(SymbolRef::Global(tok.text.to_string())),
            (OperandKind::Target, TokenKind::LocalLabelRef(digit, direction)) => {
                Operand::Symbol(SymbolRef::Local {
                    digit: *digit,
                    direction: *direction,
                })
            }
            _ => {
                return Err(AsmError::Syntax {
                    msg: alloc::format!(
                        "expected {} operand for '{}', found {}",
                        kind,
                        mnemonic,
                        describe(&tok)
                    ),
                    span: tok.span,
                });
            }
        };
        Ok(Located {
            operand,
            span: tok.span,
        })
    }

    fn expect_statement_end(&mut self) -> Result<(), AsmError> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Newline | TokenKind::Eof => Ok(()),
            _ => Err(AsmError::Syntax {
                msg: alloc::format!("expected end of statement, found {}", describe(tok)),
                span: tok.span,
            }),
        }
    }
}

/// Human-readable token description for "found ..." messages.
fn describe(tok: &Token<'_>) -> String {
    match tok.kind {
        TokenKind::Newline if tok.text() == "\n" => String::from("end of line"),
        TokenKind::Eof => String::from("end of input"),
        _ => alloc::format!("'{}'", tok.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn parse_one(src: &str) -> Statement {
        let stmts = parse_str(src).unwrap();
        assert_eq!(
            stmts.len(),
            1,
            "expected 1 statement, got {}: {:?}",
            stmts.len(),
            stmts
        );
        stmts.into_iter().next().unwrap()
    }

    fn parse_instr(src: &str) -> Instruction {
        match parse_one(src) {
            Statement::Instruction(i) => i,
            s => panic!("expected instruction, got {:?}", s),
        }
    }

    fn operands(instr: &Instruction) -> Vec<Operand> {
        instr.operands.iter().map(|l| l.operand.clone()).collect()
    }

    fn syntax_err(src: &str) -> String {
        match parse_str(src).unwrap_err() {
            AsmError::Syntax { msg, .. } => msg,
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn parse_nop() {
        let i = parse_instr("nop");
        assert_eq!(i.opcode, Opcode::Nop);
        assert!(i.operands.is_empty());
        assert_eq!(i.address, None);
    }

    #[test]
    fn parse_two_registers() {
        let i = parse_instr("add r3, r4");
        assert_eq!(i.opcode, Opcode::Add);
        assert_eq!(
            operands(&i),
            vec![
                Operand::Register(Register::R3),
                Operand::Register(Register::R4)
            ]
        );
    }

    #[test]
    fn parse_register_immediate() {
        let i = parse_instr("ldi r0, 0x2A");
        assert_eq!(
            operands(&i)[1],
            Operand::Immediate(Immediate {
                value: 42,
                radix: Radix::Hex
            })
        );
        assert_eq!(i.operands[1].span, Span::new(1, 9, 8, 4));
    }

    #[test]
    fn parse_register_pair() {
        let i = parse_instr("jr r3r2");
        let pair = RegisterPair::new(Register::R3, Register::R2).unwrap();
        assert_eq!(operands(&i), vec![Operand::RegisterPair(pair)]);
    }

    #[test]
    fn parse_register_pair_not_consecutive() {
        assert!(syntax_err("jr r2r0").contains("must be consecutive"));
        assert!(syntax_err("jabsr r0r1").contains("must be consecutive"));
    }

    #[test]
    fn parse_alias_folds_to_canonical() {
        assert_eq!(parse_instr("jreli +18").opcode, Opcode::J);
        assert_eq!(parse_instr("jrelr r2").opcode, Opcode::Jro);
        assert_eq!(parse_instr("jabsr r1r0").opcode, Opcode::Jr);
    }

    #[test]
    fn parse_relative_targets() {
        let i = parse_instr("j loop");
        assert_eq!(
            operands(&i),
            vec![Operand::Symbol(SymbolRef::Global("loop".into()))]
        );
        let i = parse_instr("b.c 2f");
        assert_eq!(i.condition, Some(Condition::C));
        assert_eq!(
            operands(&i),
            vec![Operand::Symbol(SymbolRef::Local {
                digit: 2,
                direction: Direction::Forward
            })]
        );
        let i = parse_instr("j -4");
        assert_eq!(operands(&i), vec![Operand::Immediate(Immediate::new(-4))]);
    }

    #[test]
    fn missing_condition_suffix() {
        assert_eq!(
            syntax_err("b loop"),
            "'b' requires a condition suffix (e.g. 'b.z')"
        );
        assert!(syntax_err("cmv r0, r1").contains("requires a condition suffix"));
        assert!(syntax_err("br r1r0").contains("requires a condition suffix"));
    }

    #[test]
    fn unexpected_condition_suffix() {
        assert_eq!(
            syntax_err("add.z r0, r1"),
            "'add' does not take a condition suffix, found '.z'"
        );
        assert!(syntax_err("j.nz 1f").contains("does not take a condition suffix"));
    }

    #[test]
    fn wrong_operand_kind() {
        assert_eq!(
            syntax_err("mv r0, 5"),
            "expected register operand for 'mv', found '5'"
        );
        assert_eq!(
            syntax_err("ldi r0, r1"),
            "expected immediate operand for 'ldi', found 'r1'"
        );
        assert_eq!(
            syntax_err("jr r1"),
            "expected register pair operand for 'jr', found 'r1'"
        );
        assert_eq!(
            syntax_err("ldi r0, foo"),
            "expected immediate operand for 'ldi', found 'foo'"
        );
    }

    #[test]
    fn reserved_words_as_jump_targets() {
        for (src, name) in [
            ("j test", "test"),
            ("b.z b", "b"),
            ("j r0", "r0"),
            ("jreli r1r0", "r1r0"),
            ("j HALT", "HALT"),
        ] {
            assert_eq!(
                operands(&parse_instr(src)),
                vec![Operand::Symbol(SymbolRef::Global(name.into()))],
                "{src}"
            );
        }
        assert!(syntax_err("j b.z").contains("expected jump target operand"));
    }

    #[test]
    fn wrong_arity() {
        assert_eq!(
            syntax_err("add r0"),
            "expected ',' before register operand of 'add', found end of input"
        );
        assert_eq!(
            syntax_err("not r0, r1"),
            "expected end of statement, found ','"
        );
        assert_eq!(syntax_err("nop r0"), "expected end of statement, found 'r0'");
    }

    #[test]
    fn unknown_mnemonic() {
        assert_eq!(syntax_err("mov r0, r1"), "unknown mnemonic 'mov'");
    }

    #[test]
    fn labels_share_lines() {
        let stmts = parse_str("start: 1: nop\nend:").unwrap();
        assert_eq!(stmts.len(), 4);
        assert!(matches!(
            &stmts[0],
            Statement::Label(Label { name: LabelName::Global(n), .. }) if n == "start"
        ));
        assert!(matches!(
            &stmts[1],
            Statement::Label(Label {
                name: LabelName::Local(1),
                ..
            })
        ));
        assert!(matches!(&stmts[2], Statement::Instruction(_)));
        assert!(matches!(&stmts[3], Statement::Label(_)));
    }

    #[test]
    fn org_directive() {
        match parse_one(".ORG 0x20") {
            Statement::Org(org) => assert_eq!(org.target.value, 0x20),
            s => panic!("expected org, got {:?}", s),
        }
        assert_eq!(
            syntax_err(".org loop"),
            "expected address after .org, found 'loop'"
        );
        assert_eq!(syntax_err(".byte 1"), "unknown directive '.byte'");
    }

    #[test]
    fn semicolons_and_comments() {
        let stmts = parse_str("nop; nop # two\n/* three */ nop // four").unwrap();
        assert_eq!(stmts.len(), 3);
    }

    #[test]
    fn statement_display_round_trip() {
        for src in ["ldi r0, 0x2A", "b.nz 1b", "cldi.ult r2, -3", "jr r1r0", "j +18"] {
            let stmt = parse_one(src);
            assert_eq!(alloc::format!("{}", stmt), src);
        }
    }
}
