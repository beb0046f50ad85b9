//! Benchmarks for the two table families
//!
//! Covers the hot paths a runtime leans on: ASCII and high-codepoint point
//! lookups, bulk range writes, run-coalescing scans, and hash table
//! insert/lookup against a std::HashMap baseline.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::HashMap;

use valtab::{CharTable, HashTable, HashTest, MAX_CODEPOINT};

const LOOKUPS: usize = 1_000;

fn build_syntaxish_table() -> CharTable<i64> {
    let mut table = CharTable::new(0);
    table.set_range(0, MAX_CODEPOINT, Some(1));
    table.set_range('a' as u32, 'z' as u32, Some(2));
    table.set_range('0' as u32, '9' as u32, Some(3));
    table.set_range(0x4E00, 0x9FFF, Some(4));
    table.set(0x4E2D, Some(5));
    table
}

fn bench_char_table_point_lookup(c: &mut Criterion) {
    let table = build_syntaxish_table();
    let mut group = c.benchmark_group("char_table_point_lookup");
    group.throughput(Throughput::Elements(LOOKUPS as u64));

    group.bench_function("ascii", |b| {
        b.iter(|| {
            let mut acc = 0i64;
            for i in 0..LOOKUPS {
                acc += table.get(black_box((i % 128) as u32)).unwrap_or(0);
            }
            acc
        })
    });

    group.bench_function("cjk", |b| {
        b.iter(|| {
            let mut acc = 0i64;
            for i in 0..LOOKUPS {
                acc += table.get(black_box(0x4E00 + (i % 0x100) as u32)).unwrap_or(0);
            }
            acc
        })
    });

    group.finish();
}

fn bench_char_table_range_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("char_table_range_fill");
    for span in [0x80u32, 0x1000, 0x10000] {
        group.bench_with_input(BenchmarkId::from_parameter(span), &span, |b, &span| {
            b.iter(|| {
                let mut table: CharTable<i64> = CharTable::new(0);
                table.set_range(0x100, 0x100 + span - 1, Some(7));
                black_box(table.get(0x100))
            })
        });
    }
    group.finish();
}

fn bench_char_table_run_scan(c: &mut Criterion) {
    let table = build_syntaxish_table();
    c.bench_function("char_table_run_scan", |b| {
        b.iter(|| {
            let mut runs = 0usize;
            let mut cursor = 0u32;
            loop {
                let mut from = 0;
                let mut to = MAX_CODEPOINT;
                let _ = black_box(table.get_with_run(cursor, &mut from, &mut to));
                runs += 1;
                if to >= MAX_CODEPOINT {
                    break;
                }
                cursor = to + 1;
            }
            runs
        })
    });
}

fn bench_hash_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_insert");
    for size in [100usize, 10_000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("valtab", size), &size, |b, &size| {
            b.iter(|| {
                let mut table: HashTable<i64> = HashTable::with_test(HashTest::Eql);
                for i in 0..size as i64 {
                    table.put(black_box(i), black_box(i * 2)).unwrap();
                }
                table.len()
            })
        });

        group.bench_with_input(BenchmarkId::new("std::HashMap", size), &size, |b, &size| {
            b.iter(|| {
                let mut map = HashMap::new();
                for i in 0..size as i64 {
                    map.insert(black_box(i), black_box(i * 2));
                }
                map.len()
            })
        });
    }
    group.finish();
}

fn bench_hash_lookup(c: &mut Criterion) {
    let mut table: HashTable<i64> = HashTable::with_test(HashTest::Eql);
    let mut map = HashMap::new();
    for i in 0..10_000i64 {
        table.put(i, i * 2).unwrap();
        map.insert(i, i * 2);
    }

    let mut group = c.benchmark_group("hash_lookup");
    group.throughput(Throughput::Elements(LOOKUPS as u64));

    group.bench_function("valtab", |b| {
        b.iter(|| {
            let mut acc = 0i64;
            for i in 0..LOOKUPS as i64 {
                acc += table.get(black_box(&i)).unwrap().copied().unwrap_or(0);
            }
            acc
        })
    });

    group.bench_function("std::HashMap", |b| {
        b.iter(|| {
            let mut acc = 0i64;
            for i in 0..LOOKUPS as i64 {
                acc += map.get(black_box(&i)).copied().unwrap_or(0);
            }
            acc
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_char_table_point_lookup,
    bench_char_table_range_fill,
    bench_char_table_run_scan,
    bench_hash_insert,
    bench_hash_lookup
);
criterion_main!(benches);
