//! Basic assembly example. Demonstrates the one-shot and builder APIs.
//!
//! Run with: `cargo run --example basic`

use asm8::{assemble, assemble_flat, Assembler};

fn main() {
    println!("=== asm8 basic example ===\n");

    // --- One-shot assembly ---
    println!("1. One-shot assembly (ldi r0, 42; halt):");
    let bytes = assemble_flat("ldi r0, 42\nhalt").unwrap();
    print_hex("   ", &bytes);

    // --- Builder API ---
    println!("\n2. Builder API (count down from 10):");
    let mut asm = Assembler::new();
    asm.enable_listing();
    asm.emit(
        r#"
entry:
    ldi r0, 10
    ldi r1, 0
loop:
    addi r1, 1          # r1 counts up
    addi r0, -1         # r0 counts down
    b.nz loop
    halt
"#,
    )
    .unwrap();

    let result = asm.finish().unwrap();
    print_hex("   ", &result.to_bytes(0));

    // Label addresses
    println!("\n   Labels:");
    for (name, addr) in result.labels() {
        println!("   {}: 0x{:04X}", name, addr);
    }

    // Listing output
    println!("\n   Listing:");
    for line in result.listing().lines() {
        println!("   {}", line);
    }

    // --- Placement and local labels ---
    println!("\n3. Sparse image with .org and local labels:");
    let image = assemble(
        r#"
    j main
.org 0x10
main:
1:  cmpi r2, 0
    b.eq 2f
    addi r2, -1
    j 1b
2:  halt
"#,
    )
    .unwrap();
    for (addr, word) in image.iter() {
        println!("   {:04X}: {:04X}", addr, word);
    }
    println!(
        "   flat size: {} bytes ({} words placed)",
        image.end(),
        image.len()
    );

    println!("\n=== Done! ===");
}

fn print_hex(prefix: &str, bytes: &[u8]) {
    print!("{}", prefix);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && i % 16 == 0 {
            println!();
            print!("{}", prefix);
        }
        print!("{:02X} ", b);
    }
    println!();
}
