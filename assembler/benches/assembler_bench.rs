//! Assembler benchmarks.
//!
//! Measures the PHF mnemonic lookups, instruction encoding, symbol table
//! operations and the full two-pass pipeline.
//!
//! Run with:
//! ```bash
//! cargo bench
//! cargo bench --bench assembler_bench -- --save-baseline master
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hack_assembler::{SymbolTable, assemble, code, symbol_table::FIRST_VARIABLE_ADDRESS};

/// PHF-backed mnemonic lookups.
fn bench_code_lookups(c: &mut Criterion) {
    let mut group = c.benchmark_group("code_lookups");
    group.throughput(Throughput::Elements(4));

    group.bench_function("dest_lookup_hot", |b| {
        b.iter(|| {
            black_box(code::dest("AMD").unwrap());
            black_box(code::dest("D").unwrap());
            black_box(code::dest("M").unwrap());
            black_box(code::dest("").unwrap());
        });
    });

    group.bench_function("comp_lookup_hot", |b| {
        b.iter(|| {
            black_box(code::comp("D+1").unwrap());
            black_box(code::comp("D&M").unwrap());
            black_box(code::comp("M-D").unwrap());
            black_box(code::comp("0").unwrap());
        });
    });

    group.bench_function("encode_compute_hot", |b| {
        b.iter(|| {
            black_box(code::encode_compute(Some("D"), "D+1", Some("JMP")).unwrap());
        });
    });

    group.finish();
}

/// A-instruction binary rendering.
fn bench_a_instruction(c: &mut Criterion) {
    let mut group = c.benchmark_group("a_instruction");

    group.bench_function("encode_small_address", |b| {
        b.iter(|| black_box(code::encode_address(100)));
    });

    group.bench_function("encode_max_address", |b| {
        b.iter(|| black_box(code::encode_address(32767)));
    });

    group.throughput(Throughput::Elements(100));
    group.bench_function("encode_batch_100", |b| {
        b.iter(|| {
            for i in 0..100 {
                black_box(code::encode_address(i));
            }
        });
    });

    group.finish();
}

/// Symbol table lookup and allocation paths.
fn bench_symbol_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("symbol_table");

    group.bench_function("lookup_predefined_hot", |b| {
        let table = SymbolTable::new();
        b.iter(|| {
            black_box(table.get("SP"));
            black_box(table.get("R15"));
            black_box(table.get("SCREEN"));
        });
    });

    group.bench_function("get_or_insert_existing", |b| {
        let mut table = SymbolTable::new();
        table.insert("LOOP", 100);
        let mut next = FIRST_VARIABLE_ADDRESS;
        b.iter(|| {
            black_box(table.get_or_insert("LOOP", &mut next));
        });
    });

    group.bench_function("get_or_insert_new", |b| {
        let mut counter = 0u32;
        b.iter(|| {
            let mut table = SymbolTable::new();
            let mut next = FIRST_VARIABLE_ADDRESS;
            black_box(table.get_or_insert(&format!("VAR{counter}"), &mut next));
            counter += 1;
        });
    });

    group.finish();
}

/// Full two-pass assembly of realistic programs.
fn bench_full_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_assembly");

    let small = "@2\nD=A\n@3\nD=D+A\n@0\nM=D\n";

    let medium = "\
@100
D=A
@i
M=D
(LOOP)
@i
D=M
@END
D;JEQ
@i
M=M-1
@LOOP
0;JMP
(END)
@END
0;JMP
";

    group.throughput(Throughput::Elements(small.lines().count() as u64));
    group.bench_function("pipeline_small", |b| {
        b.iter(|| assemble(black_box(small)).unwrap());
    });

    group.throughput(Throughput::Elements(medium.lines().count() as u64));
    group.bench_function("pipeline_medium", |b| {
        b.iter(|| assemble(black_box(medium)).unwrap());
    });

    // Stress test: the medium program repeated, labels renamed per copy
    let large: String = (0..10)
        .map(|i| medium.replace("LOOP", &format!("LOOP{i}")).replace("END", &format!("END{i}")))
        .collect();
    group.throughput(Throughput::Elements(large.lines().count() as u64));
    group.bench_with_input(
        BenchmarkId::new("pipeline_large", large.lines().count()),
        &large,
        |b, prog| {
            b.iter(|| assemble(black_box(prog)).unwrap());
        },
    );

    group.finish();
}

criterion_group!(
    benches,
    bench_code_lookups,
    bench_a_instruction,
    bench_symbol_table,
    bench_full_assembly,
);

criterion_main!(benches);
