//! Evaluation benchmarks
//!
//! Compares immediate and deferred evaluation of the same rule sets.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fieldcheck::{evaluate, evaluate_deferred, Builtin, FieldRule, OutputMode, RuleSet, Validator};
use serde_json::json;

/// A typical signup form: a few valid fields and a few failing ones
fn signup_form() -> RuleSet {
    RuleSet::from_value(json!({
        "username": "ada_lovelace",
        "first_name": "Ada",
        "last_name": "Lovelace1",
        "age": "36",
        "scores": [90, "85", 77],
        "zip": "",
    }))
    .rule("username", FieldRule::required().with_predicate(Builtin::AlphaNumeric))
    .rule("first_name", FieldRule::required().with_predicate(Builtin::Alpha))
    .rule("last_name", FieldRule::required().with_predicate(Builtin::Alpha))
    .rule("age", FieldRule::required().with_predicate(Builtin::Numeric))
    .rule("scores", FieldRule::optional().with_predicate(Builtin::NumericArray))
    .rule("zip", FieldRule::required().with_predicate(Builtin::Numeric))
    .rule("email", FieldRule::required())
}

fn bench_immediate(c: &mut Criterion) {
    let mut group = c.benchmark_group("immediate");
    let form = signup_form();
    let batch: Vec<RuleSet> = (0..16).map(|_| signup_form()).collect();

    group.bench_function("single_rule_set", |b| {
        b.iter(|| evaluate(black_box(&form)).unwrap())
    });

    group.bench_function("batch_of_16", |b| {
        b.iter(|| evaluate(black_box(batch.as_slice())).unwrap())
    });

    group.bench_function("render_error_mode", |b| {
        let validator = Validator::with_mode(OutputMode::Error);
        b.iter(|| validator.validate(black_box(&form)).unwrap())
    });

    group.finish();
}

fn bench_deferred(c: &mut Criterion) {
    let mut group = c.benchmark_group("deferred");
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let form = signup_form();
    let batch: Vec<RuleSet> = (0..16).map(|_| signup_form()).collect();

    group.bench_function("single_rule_set", |b| {
        b.iter(|| runtime.block_on(evaluate_deferred(black_box(&form))).unwrap())
    });

    group.bench_function("batch_of_16", |b| {
        b.iter(|| {
            runtime
                .block_on(evaluate_deferred(black_box(batch.as_slice())))
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_immediate, bench_deferred);
criterion_main!(benches);
