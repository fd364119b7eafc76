//! Benchmarks for rule compilation and scanning throughput

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use munch::text::LineCol;
use munch::{Lexer, LexerBuilder, TokenCode};

fn rule_set() -> LexerBuilder {
    let mut builder = LexerBuilder::new();
    builder.add_macro("DIGIT", "[0-9]");
    builder.add_macro("ALPHA", "[a-zA-Z]");
    let rules: &[&str] = &[
        "{DIGIT}+%",
        "#{ALPHA}+",
        "{DIGIT}+\\.{DIGIT}+e{DIGIT}+",
        "0x[0-9a-fA-F]+u?",
        "{ALPHA}({ALPHA}|{DIGIT}|-)*:",
    ];
    for (line, pattern) in rules.iter().enumerate() {
        builder
            .add_rule(pattern, LineCol::new(line as u32, 0), TokenCode::new(100 + line as u32))
            .expect("bench rule should compile");
    }
    for (line, text) in ["<=", ">=", "==", "->", "::"].iter().enumerate() {
        builder
            .add_str(text, LineCol::new(10 + line as u32, 0), TokenCode::new(200 + line as u32))
            .expect("bench operator should compile");
    }
    builder
}

fn build_lexer() -> Lexer {
    rule_set().build().expect("bench rule set should build")
}

fn sample_input() -> String {
    let line = "width 75% #ff0 12.5e3 item-a: count <= 0x1Fu -> total == 42\n";
    line.repeat(200)
}

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile_rule_set", |b| {
        b.iter(|| {
            let lexer = build_lexer();
            black_box(lexer.dfa_state_count())
        });
    });
}

fn bench_cold_scan(c: &mut Criterion) {
    // Fresh lexer each pass, so subset construction runs inside the loop
    let input = sample_input();
    c.bench_function("scan_cold", |b| {
        b.iter(|| {
            let mut lexer = build_lexer();
            let tokens: Vec<_> = lexer
                .tokenize(black_box(&input))
                .expect("bench input should scan");
            black_box(tokens.len())
        });
    });
}

fn bench_warm_scan(c: &mut Criterion) {
    // One lexer reused, so the ASCII transition cache stays hot
    let input = sample_input();
    let mut lexer = build_lexer();
    lexer.tokenize(&input).expect("warmup should scan");

    c.bench_function("scan_warm", |b| {
        b.iter(|| {
            let tokens = lexer
                .tokenize(black_box(&input))
                .expect("bench input should scan");
            black_box(tokens.len())
        });
    });
}

fn bench_baseline_only(c: &mut Criterion) {
    let input = "ident 42 3.5 \"text\" 'c' 0xFF other_name 100\n".repeat(200);
    let mut lexer = LexerBuilder::new().build().expect("empty rule set should build");

    c.bench_function("scan_baseline_only", |b| {
        b.iter(|| {
            let tokens = lexer
                .tokenize(black_box(&input))
                .expect("bench input should scan");
            black_box(tokens.len())
        });
    });
}

criterion_group!(
    benches,
    bench_compile,
    bench_cold_scan,
    bench_warm_scan,
    bench_baseline_only
);
criterion_main!(benches);
