//! Integration tests for asm8.
//!
//! These tests exercise the public API end-to-end, verifying that assembly
//! source text is correctly translated into the expected instruction words.

use asm8::{assemble, assemble_flat, AsmError, Assembler, Fields, RegisterPair, Span};

fn words(src: &str) -> Vec<(u16, u16)> {
    assemble(src).unwrap().iter().collect()
}

// ============================================================================
// One-Shot API
// ============================================================================

#[test]
fn one_shot_nop() {
    assert_eq!(assemble_flat("nop").unwrap(), vec![0x00, 0x00]);
}

#[test]
fn one_shot_halt() {
    assert_eq!(assemble_flat("halt").unwrap(), vec![0x09, 0x00]);
}

#[test]
fn one_shot_empty_source() {
    assert!(assemble("").unwrap().is_empty());
    assert!(assemble("# only a comment\n/* and a block */\n").unwrap().is_empty());
}

#[test]
fn one_shot_little_endian() {
    assert_eq!(assemble_flat("ldi r3, 0x42").unwrap(), vec![0x48, 0x42]);
}

#[test]
fn semicolon_separates_statements() {
    assert_eq!(
        words("nop; halt; ldi r0, 1"),
        [(0, 0x0000), (2, 0x0009), (4, 0x0118)]
    );
}

// ============================================================================
// Concrete scenarios
// ============================================================================

/// `ldi` at 0, six moves, then a literal relative jump at 14 landing on 0x20.
#[test]
fn scenario_literal_relative_jump() {
    let src = "\
    ldi r0, 0x00
    mv r1, r0
    mv r2, r0
    mv r3, r0
    mv r4, r0
    mv r5, r0
    mv r6, r0
    jreli +18
";
    let image = assemble(src).unwrap();
    assert_eq!(image.len(), 8);
    assert_eq!(image.get(0), Some(0x0018));
    for (i, addr) in (2..=12).step_by(2).enumerate() {
        let word = image.get(addr).unwrap();
        assert_eq!(Fields(word).rd(), i as u16 + 2, "rd of mv at {addr}");
        assert_eq!(Fields(word).rs(), 1, "rs of mv at {addr}");
    }
    let jump = image.get(14).unwrap();
    assert_eq!(jump, 0x1209);
    assert_eq!(Fields(jump).disp8(), 18);
    assert_eq!(Fields(jump).relative_target(14), Some(0x20));
}

/// Two definitions of `1:`; forward and backward references pick the
/// nearest in the right direction.
#[test]
fn scenario_local_labels() {
    let src = "\
1:  nop
    j 1f
    nop
    j 1b
.org 0x20
1:  nop
target:
";
    let mut asm = Assembler::new();
    asm.emit(src).unwrap();
    let result = asm.finish().unwrap();
    let image = result.image();

    let forward = image.get(2).unwrap();
    assert_eq!(Fields(forward).relative_target(2), Some(0x20));
    let backward = image.get(6).unwrap();
    assert_eq!(Fields(backward).relative_target(6), Some(0));
    assert_eq!(result.label_address("target"), Some(0x22));
}

/// A forward local reference from the very first word.
#[test]
fn scenario_forward_local_from_origin() {
    let image = assemble("j 1f\n1: halt").unwrap();
    let jump = image.get(0).unwrap();
    assert_eq!(jump, 0x0209);
    assert_eq!(Fields(jump).relative_target(0), Some(2));
    assert_eq!(image.get(2), Some(0x0009));
}

/// Labels may be spelled like mnemonics, condition mnemonics or registers,
/// and are found again from any jump-target operand.
#[test]
fn labels_spelled_like_reserved_words() {
    assert_eq!(words("test: nop"), [(0, 0x0000)]);

    let image = assemble("test: nop\nj test").unwrap();
    assert_eq!(Fields(image.get(2).unwrap()).relative_target(2), Some(0));

    let image = assemble("b: nop\nb.z b").unwrap();
    assert_eq!(Fields(image.get(2).unwrap()).relative_target(2), Some(0));

    let image = assemble("r0: nop\nj r0").unwrap();
    assert_eq!(Fields(image.get(2).unwrap()).relative_target(2), Some(0));

    let image = assemble("j r1r0\nr1r0: halt").unwrap();
    assert_eq!(Fields(image.get(0).unwrap()).relative_target(0), Some(2));
}

#[test]
fn scenario_negative_immediate() {
    let neg = assemble("ldi r0, -42").unwrap().get(0).unwrap();
    let pos = assemble("ldi r0, 214").unwrap().get(0).unwrap();
    assert_eq!(neg, pos);
    assert_eq!(Fields(neg).imm8(), 214);
    let plain = assemble("ldi r0, 42").unwrap().get(0).unwrap();
    assert_eq!(Fields(plain).imm8(), 42);
}

#[test]
fn scenario_org_leaves_gap() {
    let image = assemble("nop\nnop\nnop\nnop\n.org 0x20\nhalt").unwrap();
    for addr in 8..0x20 {
        assert_eq!(image.get(addr), None, "address {addr:#x} should be empty");
    }
    assert_eq!(image.get(0x20), Some(0x0009));
    let flat = image.to_bytes(0xAA);
    assert_eq!(flat.len(), 0x22);
    assert!(flat[8..0x20].iter().all(|&b| b == 0xAA));
}

// ============================================================================
// Encoding families
// ============================================================================

#[test]
fn alu_family() {
    let src = "\
    not r0
    neg r1
    shll r2
    shlc r3
    shrl r4
    shrc r5
    shra r6
    fswap r0
    fr r1
    fw r2
";
    let expected = [
        0x0011, 0x0121, 0x0231, 0x0341, 0x0451, 0x0561, 0x0671, 0x0711, 0x0821, 0x0931,
    ];
    let got: Vec<u16> = words(src).into_iter().map(|(_, w)| w).collect();
    assert_eq!(got, expected);
}

#[test]
fn binary_alu_family() {
    let src = "\
    add r0, r1
    addc r0, r1
    sub r0, r1
    subc r0, r1
    and r0, r1
    or r0, r1
    xor r0, r1
    cmp r0, r1
    test r0, r1
";
    let got: Vec<u16> = words(src).into_iter().map(|(_, w)| w).collect();
    let expected: Vec<u16> = (1..=9).map(|op| (op << 12) | 0x0211).collect();
    assert_eq!(got, expected);
}

#[test]
fn immediate_family() {
    assert_eq!(
        words("addi r0, 1\nandi r0, 0x0F\nori r0, 0x80\ntesti r0, -1"),
        [(0, 0x011C), (2, 0x0F1D), (4, 0x801E), (6, 0xFF1F)]
    );
    assert_eq!(
        words("addci r1, 3\nxori r1, -8\ncmpi r1, 0"),
        [(0, 0xA321), (2, 0xB821), (4, 0xC021)]
    );
}

#[test]
fn jump_family() {
    assert_eq!(
        words("jr r1r0\njabsr r3r2\njro r4\njrelr r5"),
        [(0, 0x3100), (2, 0x3300), (4, 0x2500), (6, 0x2600)]
    );
}

#[test]
fn conditional_family() {
    assert_eq!(
        words("br.ult r5r4\nbro.sle r0\ncmv.ugt r1, r2\ncldi.no r3, 7"),
        [(0, 0x3530), (2, 0x21E0), (4, 0xB322), (6, 0x9743)]
    );
}

#[test]
fn mnemonics_and_registers_case_insensitive() {
    assert_eq!(words("LDI R1, 0X10\nB.NZ 0"), words("ldi r1, 0x10\nb.nz 0"));
}

#[test]
fn numeric_bases() {
    let src = "ldi r0, 0b1010\nldi r0, 0o12\nldi r0, 10\nldi r0, 0xA\nldi r0, 1_0";
    let image = assemble(src).unwrap();
    let values: Vec<u8> = image.iter().map(|(_, w)| Fields(w).imm8()).collect();
    assert_eq!(values, [10, 10, 10, 10, 10]);
}

#[test]
fn register_pair_round_trip() {
    let pairs = ["r1r0", "r2r1", "r3r2", "r4r3", "r5r4", "r6r5"];
    for (low, text) in pairs.iter().enumerate() {
        let word = assemble(&format!("jr {text}")).unwrap().get(0).unwrap();
        let pair = RegisterPair::from_field(Fields(word).rs()).unwrap();
        assert_eq!(pair.low().index() as usize, low);
        assert_eq!(pair.high().index() as usize, low + 1);
        assert_eq!(pair.to_string(), *text);
    }
}

// ============================================================================
// Builder API
// ============================================================================

#[test]
fn builder_emit_and_finish() {
    let mut asm = Assembler::new();
    asm.emit("main:").unwrap();
    asm.emit("  ldi r0, 3").unwrap();
    asm.emit("1: addi r0, -1\n  b.nz 1b").unwrap();
    asm.emit("  jr r1r0").unwrap();
    let result = asm.finish().unwrap();
    assert_eq!(result.image().len(), 4);
    assert_eq!(result.labels(), &[(String::from("main"), 0)]);
    assert_eq!(Fields(result.image().get(4).unwrap()).disp8(), -2);
}

#[test]
fn builder_into_image() {
    let mut asm = Assembler::new();
    asm.emit(".org 0x100\nstart: halt").unwrap();
    let image = asm.finish().unwrap().into_image();
    assert_eq!(image.start(), Some(0x100));
    assert_eq!(image.end(), 0x102);
}

#[test]
fn builder_listing() {
    let mut asm = Assembler::new();
    asm.enable_listing();
    asm.emit("loop: b.z loop").unwrap();
    let listing = asm.finish().unwrap().listing();
    assert_eq!(
        listing,
        "0000:        loop:\n0000:  0049  b.z      loop  # -> 0000\n"
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn error_unknown_mnemonic() {
    let err = assemble("frobnicate r0").unwrap_err();
    assert!(matches!(err, AsmError::Syntax { .. } | AsmError::Lex { .. }));
    assert_eq!(err.span().map(|s| s.line), Some(1));
}

#[test]
fn error_unterminated_block_comment() {
    let err = assemble("nop\n/* never closed\nnop").unwrap_err();
    assert!(matches!(err, AsmError::Lex { .. }));
    assert_eq!(err.span(), Some(Span::new(2, 1, 4, 2)));
}

#[test]
fn error_missing_condition_suffix() {
    assert!(matches!(
        assemble("b loop\nloop: nop"),
        Err(AsmError::Syntax { .. })
    ));
}

#[test]
fn error_unexpected_condition_suffix() {
    assert!(matches!(
        assemble("add.z r0, r1"),
        Err(AsmError::Syntax { .. })
    ));
}

#[test]
fn error_wrong_operand_kind() {
    assert!(matches!(
        assemble("mv r0, 5"),
        Err(AsmError::Syntax { .. })
    ));
    assert!(matches!(assemble("jr r0"), Err(AsmError::Syntax { .. })));
    assert!(matches!(assemble("jr r0r1"), Err(AsmError::Syntax { .. })));
    assert!(matches!(assemble("ldi r0"), Err(AsmError::Syntax { .. })));
    assert!(matches!(assemble("nop r0"), Err(AsmError::Syntax { .. })));
}

#[test]
fn error_unresolved_symbol() {
    assert_eq!(
        assemble("j missing").unwrap_err(),
        AsmError::UnresolvedSymbol {
            label: "missing".into(),
            span: Span::new(1, 3, 2, 7),
        }
    );
    assert!(matches!(
        assemble("1: j 1f"),
        Err(AsmError::UnresolvedSymbol { .. })
    ));
    assert!(matches!(
        assemble("j 1b\n1: nop"),
        Err(AsmError::UnresolvedSymbol { .. })
    ));
}

#[test]
fn error_duplicate_label() {
    assert!(matches!(
        assemble("a: nop\na: nop"),
        Err(AsmError::DuplicateLabel { .. })
    ));
}

#[test]
fn error_immediate_out_of_range() {
    assert!(matches!(
        assemble("ldi r0, 256"),
        Err(AsmError::ImmediateOutOfRange { value: 256, .. })
    ));
    assert!(matches!(
        assemble("ldi r0, -129"),
        Err(AsmError::ImmediateOutOfRange { value: -129, .. })
    ));
}

#[test]
fn error_displacement_out_of_range() {
    let err = assemble("j far\n.org 0x80\nfar: nop").unwrap_err();
    assert!(matches!(
        err,
        AsmError::DisplacementOutOfRange { disp: 128, .. }
    ));
    assert!(err.to_string().contains("'far'"));
}

#[test]
fn error_org_backward_collision() {
    let err = assemble("nop\nnop\nnop\n.org 2\nnop").unwrap_err();
    assert!(matches!(
        err,
        AsmError::AddressCollision { address: 2, .. }
    ));
    let err = assemble("nop\nnop\n.org 1\nnop").unwrap_err();
    assert!(matches!(err, AsmError::AddressCollision { address: 1, .. }));
}

#[test]
fn error_messages_carry_position() {
    let err = assemble("nop\n  ldi r0, 300").unwrap_err();
    assert_eq!(
        err.to_string(),
        "2:11: immediate value 300 out of range [-128..255]"
    );
}
