//! Rule sets: the per-field rules and the source record they are checked against.

use crate::error::BoxError;
use crate::predicates::Builtin;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

type CheckFn = dyn Fn(&Value) -> Result<bool, BoxError> + Send + Sync;

/// A boolean check attached to a field.
///
/// Predicates are cheap to clone and shared between clones of a rule set.
/// Most predicates cannot fail and are built with [`Predicate::new`]; a check
/// that depends on something outside the value (a lookup table, a parser that
/// can error) uses [`Predicate::fallible`], and its errors surface as
/// [`ExecutionFault`](crate::ExecutionFault)s rather than violations.
#[derive(Clone)]
pub struct Predicate {
    check: Arc<CheckFn>,
}

impl Predicate {
    /// Wrap an infallible check.
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(move |value| Ok(check(value))),
        }
    }

    /// Wrap a check that may fail.
    pub fn fallible<F, E>(check: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            check: Arc::new(move |value| check(value).map_err(Into::into)),
        }
    }

    /// Run the predicate against a value.
    pub fn check(&self, value: &Value) -> Result<bool, BoxError> {
        (self.check)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Whether a field must be present, and the predicate its value must satisfy.
#[derive(Debug, Clone, Default)]
pub struct FieldRule {
    required: bool,
    validator: Option<Predicate>,
}

impl FieldRule {
    /// Create a rule from its parts.
    pub fn new(required: bool, validator: Option<Predicate>) -> Self {
        Self {
            required,
            validator,
        }
    }

    /// A rule for a field that must be present.
    pub fn required() -> Self {
        Self::new(true, None)
    }

    /// A rule for a field that may be missing.
    pub fn optional() -> Self {
        Self::new(false, None)
    }

    /// Attach an infallible check to the rule.
    pub fn with_validator<F>(self, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.with_predicate(Predicate::new(check))
    }

    /// Attach a predicate to the rule.
    pub fn with_predicate(mut self, predicate: impl Into<Predicate>) -> Self {
        self.validator = Some(predicate.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn validator(&self) -> Option<&Predicate> {
        self.validator.as_ref()
    }
}

/// A source record paired with the rules its fields are checked against.
///
/// Rules are evaluated in insertion order. Fields present in the source but
/// without a rule are ignored; fields with a rule but absent from the source
/// are treated as missing.
///
/// ```rust,ignore
/// use fieldcheck::{Builtin, FieldRule, RuleSet};
/// use serde_json::json;
///
/// let rules = RuleSet::from_value(json!({ "name": "ada", "age": "x" }))
///     .rule("name", FieldRule::required().with_predicate(Builtin::Alpha))
///     .rule("age", FieldRule::optional().with_predicate(Builtin::Numeric));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    source: Map<String, Value>,
    rules: IndexMap<String, FieldRule>,
}

impl RuleSet {
    /// Create a rule set with no rules over a source record.
    pub fn new(source: Map<String, Value>) -> Self {
        Self {
            source,
            rules: IndexMap::new(),
        }
    }

    /// Create a rule set from an existing rule map.
    pub fn with_rules(source: Map<String, Value>, rules: IndexMap<String, FieldRule>) -> Self {
        Self { source, rules }
    }

    /// Create a rule set over a JSON value.
    ///
    /// Anything other than an object has no fields, so every rule will see a
    /// missing value.
    pub fn from_value(source: Value) -> Self {
        match source {
            Value::Object(map) => Self::new(map),
            other => {
                trace_warn!(
                    kind = value_kind(&other),
                    "rule set source is not an object; treating it as empty"
                );
                #[cfg(not(feature = "tracing"))]
                let _ = other;
                Self::default()
            }
        }
    }

    /// Parse a declarative rule set from JSON. See [`RuleSpec`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let spec: RuleSpec = serde_json::from_str(json)?;
        Ok(spec.into_rule_set())
    }

    /// Add or replace the rule for a field.
    ///
    /// Replacing keeps the field's original position in the evaluation order.
    pub fn rule(mut self, field: impl Into<String>, rule: FieldRule) -> Self {
        self.rules.insert(field.into(), rule);
        self
    }

    pub fn source(&self) -> &Map<String, Value> {
        &self.source
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.rules.iter().map(|(field, rule)| (field.as_str(), rule))
    }

    /// Look up the field name, rule and source value at a position in the
    /// evaluation order.
    pub(crate) fn entry(&self, index: usize) -> Option<(&str, &FieldRule, Option<&Value>)> {
        self.rules
            .get_index(index)
            .map(|(field, rule)| (field.as_str(), rule, self.source.get(field)))
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(feature = "tracing")]
fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One rule set or an ordered sequence of them.
///
/// Evaluation concatenates the violations of each rule set in order. A batch
/// built from references borrows the rule sets; only deferred evaluation,
/// which hands them to runtime tasks, takes owned copies.
#[derive(Debug, Clone, Default)]
pub struct Batch<'a>(Cow<'a, [RuleSet]>);

impl<'a> Batch<'a> {
    pub fn new(rule_sets: Vec<RuleSet>) -> Self {
        Self(Cow::Owned(rule_sets))
    }

    pub fn rule_sets(&self) -> &[RuleSet] {
        &self.0
    }

    /// Total number of field rules across the batch.
    pub fn rule_count(&self) -> usize {
        self.0.iter().map(RuleSet::len).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn into_owned(self) -> Vec<RuleSet> {
        self.0.into_owned()
    }
}

impl From<RuleSet> for Batch<'_> {
    fn from(rule_set: RuleSet) -> Self {
        Self(Cow::Owned(vec![rule_set]))
    }
}

impl<'a> From<&'a RuleSet> for Batch<'a> {
    fn from(rule_set: &'a RuleSet) -> Self {
        Self(Cow::Borrowed(std::slice::from_ref(rule_set)))
    }
}

impl From<Vec<RuleSet>> for Batch<'_> {
    fn from(rule_sets: Vec<RuleSet>) -> Self {
        Self(Cow::Owned(rule_sets))
    }
}

impl<'a> From<&'a Vec<RuleSet>> for Batch<'a> {
    fn from(rule_sets: &'a Vec<RuleSet>) -> Self {
        Self(Cow::Borrowed(rule_sets))
    }
}

impl<'a> From<&'a [RuleSet]> for Batch<'a> {
    fn from(rule_sets: &'a [RuleSet]) -> Self {
        Self(Cow::Borrowed(rule_sets))
    }
}

impl<const N: usize> From<[RuleSet; N]> for Batch<'_> {
    fn from(rule_sets: [RuleSet; N]) -> Self {
        Self(Cow::Owned(rule_sets.into()))
    }
}

impl<'a> From<&'a Batch<'_>> for Batch<'a> {
    fn from(batch: &'a Batch<'_>) -> Self {
        Self(Cow::Borrowed(batch.rule_sets()))
    }
}

impl FromIterator<RuleSet> for Batch<'_> {
    fn from_iter<I: IntoIterator<Item = RuleSet>>(iter: I) -> Self {
        Self(Cow::Owned(iter.into_iter().collect()))
    }
}

/// Declarative form of a [`RuleSet`], loadable from configuration.
///
/// ```json
/// {
///   "source": { "name": "ada", "age": "36" },
///   "validator": {
///     "name": { "required": true, "validator": "alpha" },
///     "age":  { "validator": "isNumeric" }
///   }
/// }
/// ```
///
/// `validator` names one of the [`Builtin`] predicates. An unknown name, or a
/// value that is not a string, leaves the field without a predicate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuleSpec {
    #[serde(default)]
    pub source: Map<String, Value>,
    #[serde(default)]
    pub validator: IndexMap<String, FieldRuleSpec>,
}

/// Declarative form of a [`FieldRule`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldRuleSpec {
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<Value>,
}

impl FieldRuleSpec {
    /// Resolve the named predicate, if any.
    fn into_rule(self, field: &str) -> FieldRule {
        let predicate = match self.validator {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => match Builtin::from_name(&name) {
                Some(builtin) => Some(builtin.predicate()),
                None => {
                    trace_warn!(field, validator = %name, "unknown validator; field has no predicate");
                    None
                }
            },
            Some(_) => {
                trace_warn!(field, "validator is not a name; field has no predicate");
                None
            }
        };
        #[cfg(not(feature = "tracing"))]
        let _ = field;

        FieldRule::new(self.required, predicate)
    }
}

impl RuleSpec {
    /// Build the executable rule set.
    pub fn into_rule_set(self) -> RuleSet {
        let rules = self
            .validator
            .into_iter()
            .map(|(field, spec)| {
                let rule = spec.into_rule(&field);
                (field, rule)
            })
            .collect();

        RuleSet::with_rules(self.source, rules)
    }
}

impl From<RuleSpec> for RuleSet {
    fn from(spec: RuleSpec) -> Self {
        spec.into_rule_set()
    }
}
