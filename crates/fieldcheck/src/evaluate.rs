//! Rule evaluation.
//!
//! [`evaluate`] runs a batch on the calling thread. [`evaluate_deferred`] fans
//! every field out as its own task on the tokio runtime and joins the results
//! back in rule order. Both produce the same violations for the same input.

use crate::error::{ExecutionFault, Result};
use crate::predicates::{is_numeric, string_form};
use crate::rule::{Batch, FieldRule, RuleSet};
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tokio::task::JoinSet;

/// Message for a required field with no usable value.
pub fn required_message(field: &str) -> String {
    format!("{field} is required")
}

/// Message for a value its predicate rejected.
pub fn invalid_message(field: &str, value: &Value) -> String {
    format!("{} is not a valid value for {field}", string_form(value))
}

/// Whether a source value counts as missing.
///
/// Strings are missing when empty. Every other value is missing unless it is
/// numeric, so absent, `null`, booleans, arrays and objects never satisfy a
/// required rule.
pub fn is_missing(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => s.is_empty(),
        Some(other) => !is_numeric(other),
        None => true,
    }
}

/// Check one field against its rule.
fn check_field(field: &str, rule: &FieldRule, value: Option<&Value>) -> Result<Option<String>> {
    let missing = is_missing(value);

    if rule.is_required() && missing {
        return Ok(Some(required_message(field)));
    }

    let (Some(value), Some(predicate)) = (value, rule.validator()) else {
        return Ok(None);
    };
    if missing {
        return Ok(None);
    }

    match predicate.check(value) {
        Ok(true) => Ok(None),
        Ok(false) => Ok(Some(invalid_message(field, value))),
        Err(source) => {
            trace_error!(field, error = %source, "validator failed");
            Err(ExecutionFault::predicate(field, source))
        }
    }
}

fn check_rule_set(rule_set: &RuleSet, violations: &mut Vec<String>) -> Result<()> {
    for (field, rule) in rule_set.rules() {
        if let Some(violation) = check_field(field, rule, rule_set.source().get(field))? {
            violations.push(violation);
        }
    }
    Ok(())
}

/// Evaluate a batch on the calling thread.
///
/// Returns the violations of every rule set, concatenated in batch order. A
/// failing predicate stops evaluation and returns its fault.
pub fn evaluate<'a>(batch: impl Into<Batch<'a>>) -> Result<Vec<String>> {
    let batch = batch.into();
    let mut violations = Vec::new();

    for rule_set in batch.rule_sets() {
        check_rule_set(rule_set, &mut violations)?;
    }

    trace_debug!(
        rule_sets = batch.len(),
        violations = violations.len(),
        "evaluated batch"
    );
    Ok(violations)
}

/// Evaluate a batch as independent tasks on the tokio runtime.
///
/// Each field of each rule set is one task. Results are settled by position,
/// so the output matches [`evaluate`] regardless of completion order: a fault
/// or panic is raised only once every field before it has finished, and the
/// earliest one in rule order wins. Raising it aborts the tasks still
/// outstanding. Borrowed batches are cloned, since the tasks own their rule sets.
pub async fn evaluate_deferred<'a>(batch: impl Into<Batch<'a>>) -> Result<Vec<String>> {
    let batch = batch.into();
    let rule_sets = batch.len();
    let mut tasks = JoinSet::new();
    let mut slots = 0;

    for rule_set in batch.into_owned() {
        let rule_set = Arc::new(rule_set);
        for index in 0..rule_set.len() {
            let rule_set = Arc::clone(&rule_set);
            let slot = slots;
            slots += 1;
            tasks.spawn(async move {
                // Panics are carried back with the slot so they settle in order
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    match rule_set.entry(index) {
                        Some((field, rule, value)) => check_field(field, rule, value),
                        None => Ok(None),
                    }
                }));
                (slot, outcome)
            });
        }
    }

    let mut pending: Vec<Option<thread::Result<Result<Option<String>>>>> =
        (0..slots).map(|_| None).collect();
    let mut violations = Vec::new();
    let mut settled = 0;

    while let Some(joined) = tasks.join_next().await {
        let (slot, outcome) = match joined {
            Ok(done) => done,
            Err(error) if error.is_panic() => panic::resume_unwind(error.into_panic()),
            Err(error) => return Err(ExecutionFault::from(error)),
        };
        pending[slot] = Some(outcome);

        // Returning drops the JoinSet, which aborts the remaining tasks
        while let Some(outcome) = pending.get_mut(settled).and_then(Option::take) {
            match outcome {
                Ok(checked) => violations.extend(checked?),
                Err(payload) => panic::resume_unwind(payload),
            }
            settled += 1;
        }
    }

    trace_debug!(
        rule_sets,
        work_items = slots,
        violations = violations.len(),
        "evaluated deferred batch"
    );
    #[cfg(not(feature = "tracing"))]
    let _ = rule_sets;
    Ok(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::Builtin;
    use crate::rule::Predicate;
    use serde_json::json;
    use std::time::Duration;

    fn scenario() -> RuleSet {
        RuleSet::from_value(json!({
            "key0": "test",
            "key1": null,
            "key2": "test2",
            "key3": "test3"
        }))
        .rule("key0", FieldRule::required().with_validator(|_| false))
        .rule("key1", FieldRule::required().with_validator(|_| true))
        .rule("key2", FieldRule::optional().with_validator(|_| false))
    }

    #[test]
    fn missing_values() {
        assert!(is_missing(None));
        assert!(is_missing(Some(&Value::Null)));
        assert!(is_missing(Some(&json!(""))));
        assert!(is_missing(Some(&json!(true))));
        assert!(is_missing(Some(&json!({}))));
        assert!(is_missing(Some(&json!([1]))));
        assert!(!is_missing(Some(&json!("x"))));
        assert!(!is_missing(Some(&json!(" "))));
        assert!(!is_missing(Some(&json!(0))));
        assert!(!is_missing(Some(&json!(-2.5))));
    }

    #[test]
    fn scenario_violations_in_rule_order() {
        let violations = evaluate(scenario()).unwrap();
        assert_eq!(
            violations,
            vec![
                "test is not a valid value for key0",
                "key1 is required",
                "test2 is not a valid value for key2",
            ]
        );
    }

    #[test]
    fn required_missing_field_skips_predicate() {
        let rules = RuleSet::default().rule(
            "name",
            FieldRule::required().with_predicate(Predicate::fallible(|_| {
                Err::<bool, _>("should not run")
            })),
        );

        assert_eq!(evaluate(rules).unwrap(), vec!["name is required"]);
    }

    #[test]
    fn optional_missing_field_skips_predicate() {
        let rules = RuleSet::from_value(json!({ "nick": "" }))
            .rule("nick", FieldRule::optional().with_validator(|_| false))
            .rule("age", FieldRule::optional().with_validator(|_| false));

        assert!(evaluate(rules).unwrap().is_empty());
    }

    #[test]
    fn field_without_predicate_only_checks_presence() {
        let rules = RuleSet::from_value(json!({ "name": "anything at all" }))
            .rule("name", FieldRule::required());

        assert!(evaluate(rules).unwrap().is_empty());
    }

    #[test]
    fn numbers_satisfy_required_and_render_in_messages() {
        let rules = RuleSet::from_value(json!({ "age": 12, "score": 9.5 }))
            .rule("age", FieldRule::required().with_predicate(Builtin::Alpha))
            .rule("score", FieldRule::required().with_predicate(Builtin::Numeric));

        assert_eq!(
            evaluate(rules).unwrap(),
            vec!["12 is not a valid value for age"]
        );
    }

    #[test]
    fn whole_float_renders_without_fraction() {
        let rules = RuleSet::from_value(json!({ "age": 36.0 }))
            .rule("age", FieldRule::required().with_predicate(Builtin::Alpha));

        assert_eq!(
            evaluate(&rules).unwrap(),
            vec!["36 is not a valid value for age"]
        );
    }

    #[test]
    fn required_boolean_is_never_satisfied() {
        let rules = RuleSet::from_value(json!({ "agreed": true }))
            .rule("agreed", FieldRule::required());

        assert_eq!(evaluate(rules).unwrap(), vec!["agreed is required"]);
    }

    #[test]
    fn batch_concatenates_in_order() {
        let first = RuleSet::default().rule("a", FieldRule::required());
        let second = RuleSet::default()
            .rule("b", FieldRule::required())
            .rule("c", FieldRule::required());

        assert_eq!(
            evaluate(vec![first, second]).unwrap(),
            vec!["a is required", "b is required", "c is required"]
        );
    }

    #[test]
    fn predicate_fault_aborts_evaluation() {
        let rules = RuleSet::from_value(json!({ "a": "x", "b": "y" }))
            .rule(
                "a",
                FieldRule::required()
                    .with_predicate(Predicate::fallible(|_| Err::<bool, _>("lookup failed"))),
            )
            .rule("b", FieldRule::required().with_validator(|_| false));

        let fault = evaluate(rules).unwrap_err();
        assert_eq!(fault.field(), Some("a"));
    }

    #[tokio::test]
    async fn deferred_matches_immediate() {
        let immediate = evaluate(scenario()).unwrap();
        let deferred = evaluate_deferred(scenario()).await.unwrap();
        assert_eq!(immediate, deferred);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn deferred_preserves_order_across_workers() {
        let rule_sets: Vec<RuleSet> = (0..8)
            .map(|set| {
                (0..16).fold(RuleSet::default(), |rules, field| {
                    rules.rule(format!("s{set}f{field}"), FieldRule::required())
                })
            })
            .collect();

        let expected: Vec<String> = (0..8)
            .flat_map(|set| (0..16).map(move |field| format!("s{set}f{field} is required")))
            .collect();

        assert_eq!(evaluate_deferred(rule_sets).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn deferred_surfaces_fault() {
        let rules = RuleSet::from_value(json!({ "a": "x" })).rule(
            "a",
            FieldRule::optional().with_predicate(Predicate::fallible(|_| Err::<bool, _>("boom"))),
        );

        let fault = evaluate_deferred(rules).await.unwrap_err();
        assert!(matches!(fault, ExecutionFault::Predicate { ref field, .. } if field == "a"));
    }

    fn slow_fault(delay: Duration, message: &'static str) -> Predicate {
        Predicate::fallible(move |_| {
            std::thread::sleep(delay);
            Err::<bool, _>(message)
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn deferred_reports_earliest_fault_in_rule_order() {
        let rules = RuleSet::from_value(json!({ "a": "x", "b": "y", "c": "z" }))
            .rule(
                "a",
                FieldRule::required().with_predicate(slow_fault(Duration::from_millis(200), "slow")),
            )
            .rule("b", FieldRule::required().with_predicate(slow_fault(Duration::ZERO, "fast")))
            .rule("c", FieldRule::required().with_validator(|_| false));

        let immediate = evaluate(&rules).unwrap_err();
        let deferred = evaluate_deferred(&rules).await.unwrap_err();

        assert_eq!(immediate.field(), Some("a"));
        assert_eq!(deferred.field(), immediate.field());
        assert_eq!(deferred.to_string(), immediate.to_string());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[should_panic(expected = "checker crashed")]
    async fn deferred_resumes_earlier_panic_before_later_fault() {
        let rules = RuleSet::from_value(json!({ "a": "x", "b": "y" }))
            .rule(
                "a",
                FieldRule::required().with_validator(|_| {
                    std::thread::sleep(Duration::from_millis(100));
                    panic!("checker crashed")
                }),
            )
            .rule("b", FieldRule::required().with_predicate(slow_fault(Duration::ZERO, "fast")));

        let _ = evaluate_deferred(&rules).await;
    }

    #[tokio::test]
    async fn deferred_empty_batch() {
        assert!(evaluate_deferred(Batch::default()).await.unwrap().is_empty());
        assert!(evaluate_deferred(RuleSet::default()).await.unwrap().is_empty());
    }
}
