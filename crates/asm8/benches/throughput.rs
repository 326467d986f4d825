//! Performance benchmarks for `asm8`.
//!
//! Measures:
//! - Single instruction latency per operand form
//! - Multi-instruction throughput (bytes of source text per second)
//! - Label-heavy workloads (global and local labels)
//! - Flat export of a sparse image
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use asm8::{assemble, Assembler};

// ─── Single-Instruction Latency ──────────────────────────────────────────────

fn bench_single_instruction(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_instruction");

    group.bench_function("nop", |b| b.iter(|| assemble(black_box("nop")).unwrap()));

    group.bench_function("ldi_imm8", |b| {
        b.iter(|| assemble(black_box("ldi r3, 0x2A")).unwrap())
    });

    group.bench_function("add_reg_reg", |b| {
        b.iter(|| assemble(black_box("add r0, r1")).unwrap())
    });

    group.bench_function("cldi_cond_simm4", |b| {
        b.iter(|| assemble(black_box("cldi.ult r2, -3")).unwrap())
    });

    group.bench_function("jr_pair", |b| {
        b.iter(|| assemble(black_box("jr r1r0")).unwrap())
    });

    group.bench_function("branch_to_label", |b| {
        b.iter(|| assemble(black_box("top: b.nz top")).unwrap())
    });

    group.finish();
}

// ─── Multi-Instruction Throughput ─────────────────────────────────────────────

/// Generate a block of N instructions (no labels).
fn gen_block(n: usize) -> String {
    let mut s = String::with_capacity(n * 16);
    for i in 0..n {
        match i % 6 {
            0 => s.push_str("mv r0, r1\n"),
            1 => s.push_str("add r2, r3\n"),
            2 => s.push_str("ldi r4, 0x7F\n"),
            3 => s.push_str("xori r5, -2\n"),
            4 => s.push_str("cmv.sgt r6, r0\n"),
            5 => s.push_str("shll r1\n"),
            _ => unreachable!(),
        }
    }
    s
}

fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");

    for n in [100, 1_000, 10_000] {
        let src = gen_block(n);
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_function(format!("{n}_instructions"), |b| {
            b.iter(|| assemble(black_box(&src)).unwrap())
        });
    }

    group.finish();
}

// ─── Label-Heavy Workloads ──────────────────────────────────────────────────

/// N global labels, each followed by a branch back to the previous one.
fn gen_label_heavy(n_labels: usize) -> String {
    let mut s = String::with_capacity(n_labels * 32);
    s.push_str("l0: nop\n");
    for i in 1..n_labels {
        s.push_str(&format!("l{i}: b.z l{}\n", i - 1));
    }
    s
}

/// Loops built from reusable local labels.
fn gen_local_labels(n_loops: usize) -> String {
    let mut s = String::with_capacity(n_loops * 48);
    for _ in 0..n_loops {
        s.push_str("1: addi r0, -1\n   b.nz 1b\n   b.z 2f\n2: nop\n");
    }
    s
}

fn bench_labels(c: &mut Criterion) {
    let mut group = c.benchmark_group("labels");

    let globals = gen_label_heavy(1_000);
    group.bench_function("1000_global_labels", |b| {
        b.iter(|| assemble(black_box(&globals)).unwrap())
    });

    let locals = gen_local_labels(1_000);
    group.bench_function("1000_local_loops", |b| {
        b.iter(|| assemble(black_box(&locals)).unwrap())
    });

    group.finish();
}

// ─── Builder and Export ─────────────────────────────────────────────────────

fn bench_builder(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder");

    let chunks: Vec<String> = (0..10).map(|_| gen_block(100)).collect();
    group.bench_function("ten_emits_with_listing", |b| {
        b.iter(|| {
            let mut asm = Assembler::new();
            asm.enable_listing();
            for chunk in &chunks {
                asm.emit(black_box(chunk)).unwrap();
            }
            asm.finish().unwrap().listing()
        })
    });

    let sparse = assemble("nop\n.org 0x8000\nnop\n.org 0xFFFE\nhalt").unwrap();
    group.bench_function("flat_export_64k", |b| {
        b.iter(|| black_box(&sparse).to_bytes(0xFF))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_instruction,
    bench_throughput,
    bench_labels,
    bench_builder
);
criterion_main!(benches);
