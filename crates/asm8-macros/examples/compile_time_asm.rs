//! Compile-time assembly with `asm_bytes!` and `asm_words!` macros.
//!
//! These macros assemble programs at compile time, producing `&'static [u8]`
//! or `&'static [u16]` ROM images with zero runtime overhead.
//!
//! Run with: `cargo run --example compile_time_asm -p asm8-macros`

use asm8_macros::{asm_bytes, asm_words};

// ── Compile-time constants ──────────────────────────────────────────────

/// Clear every register, then stop.
const RESET: &[u8] = asm_bytes!(
    "
    ldi r0, 0
    mv r1, r0
    mv r2, r0
    mv r3, r0
    mv r4, r0
    mv r5, r0
    mv r6, r0
    halt
"
);

/// Count r0 down from 10 using a local label.
const COUNTDOWN: &[u8] = asm_bytes!(
    "
    ldi r0, 10
1:  addi r0, -1
    b.nz 1b
    halt
"
);

/// Interrupt-style layout: a jump at 0 and the handler at 0x10.
const VECTORED: &[u16] = asm_words!(
    r#"
    j main
.org 0x10
main:
    ldi r1, 0x80
    cmv.ult r2, r1
    halt
"#
);

fn main() {
    println!("=== Compile-Time Assembly Demo ===\n");

    println!("Reset routine ({} bytes):", RESET.len());
    print_hex("  ", RESET);

    println!("\nCountdown ({} bytes):", COUNTDOWN.len());
    print_hex("  ", COUNTDOWN);

    println!("\nVectored program ({} words):", VECTORED.len());
    for (i, word) in VECTORED.iter().enumerate() {
        if *word != 0 {
            println!("  {:04X}: {word:04X}", i * 2);
        }
    }

    assert_eq!(&RESET[RESET.len() - 2..], &[0x09, 0x00]);
    println!("\nAll compile-time images verified.");
}

fn print_hex(prefix: &str, bytes: &[u8]) {
    print!("{prefix}");
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            print!(" ");
        }
        print!("{b:02X}");
    }
    println!();
}
