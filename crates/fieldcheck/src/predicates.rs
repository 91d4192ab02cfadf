//! Built-in value predicates.
//!
//! Pure classifiers over JSON values. They are used by the evaluator to decide
//! whether a value is present, and can be attached to fields as validators
//! through [`Builtin`].

use crate::rule::Predicate;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;

// Pre-compiled regex patterns
static NUMERIC_REGEX: OnceLock<Regex> = OnceLock::new();
static ALPHA_REGEX: OnceLock<Regex> = OnceLock::new();
static ALPHA_NUMERIC_REGEX: OnceLock<Regex> = OnceLock::new();

fn numeric_regex() -> &'static Regex {
    NUMERIC_REGEX.get_or_init(|| Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)$").unwrap())
}

fn alpha_regex() -> &'static Regex {
    ALPHA_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z]+$").unwrap())
}

fn alpha_numeric_regex() -> &'static Regex {
    // ASCII word characters only; `\w` would also accept Unicode letters
    ALPHA_NUMERIC_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap())
}

/// Render a value the way it appears in violation messages and the way the
/// text predicates see it.
///
/// Strings are used verbatim. Numbers use the shortest round-trip form with no
/// trailing `.0`, switching to exponent notation below `1e-6` and from `1e21`
/// (`36.0` renders as `36`, `1e21` as `1e+21`). Everything else uses its
/// compact JSON form, so `null` renders as `null` and `[1,2]` as `[1,2]`.
pub fn string_form(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => Cow::Owned(float_form(f)),
            _ => Cow::Owned(n.to_string()),
        },
        other => Cow::Owned(other.to_string()),
    }
}

fn float_form(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value < 0.0 {
        return format!("-{}", float_form(-value));
    }

    // `{:e}` gives the shortest round-trip digits, e.g. `1.25e-7`
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };
    let digits = mantissa.replace('.', "");
    let len = digits.len() as i32;
    let point = exponent + 1;

    if len <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - len) as usize))
    } else if 0 < point && point <= 21 {
        let (whole, fraction) = digits.split_at(point as usize);
        format!("{whole}.{fraction}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat(-point as usize))
    } else {
        let sign = if exponent > 0 { "+" } else { "" };
        format!("{mantissa}e{sign}{exponent}")
    }
}

/// Returns true if the value is a number or a decimal numeric string.
///
/// Accepted strings are an optional sign followed by digits with an optional
/// fractional part (`"12"`, `"-3.5"`, `"7."`) or by a fractional part alone
/// (`"+.5"`). Whitespace, exponents and any other character reject the string.
pub fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => numeric_regex().is_match(s),
        _ => false,
    }
}

/// Returns true if the string form consists of one or more ASCII letters.
pub fn is_alpha(value: &Value) -> bool {
    alpha_regex().is_match(&string_form(value))
}

/// Returns true if the string form consists of one or more ASCII letters,
/// digits or underscores.
pub fn is_alpha_numeric(value: &Value) -> bool {
    alpha_numeric_regex().is_match(&string_form(value))
}

/// Returns true if the value is a non-empty array whose elements are all numeric.
pub fn is_numeric_array(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty() && items.iter().all(is_numeric),
        _ => false,
    }
}

/// The predicates shipped with the crate, addressable by name.
///
/// Names are matched case-insensitively and accept both the short form
/// (`"alpha"`) and the `is`-prefixed form (`"isAlpha"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Numeric,
    Alpha,
    AlphaNumeric,
    NumericArray,
}

impl Builtin {
    /// All built-in predicates.
    pub const ALL: [Builtin; 4] = [
        Builtin::Numeric,
        Builtin::Alpha,
        Builtin::AlphaNumeric,
        Builtin::NumericArray,
    ];

    /// Look a predicate up by name.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "");
        let normalized = normalized.strip_prefix("is").unwrap_or(&normalized);

        match normalized {
            "numeric" => Some(Self::Numeric),
            "alpha" => Some(Self::Alpha),
            "alphanumeric" => Some(Self::AlphaNumeric),
            "numericarray" => Some(Self::NumericArray),
            _ => None,
        }
    }

    /// Canonical name of the predicate.
    pub fn name(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Alpha => "alpha",
            Self::AlphaNumeric => "alphanumeric",
            Self::NumericArray => "numeric_array",
        }
    }

    /// Run the predicate.
    pub fn check(self, value: &Value) -> bool {
        match self {
            Self::Numeric => is_numeric(value),
            Self::Alpha => is_alpha(value),
            Self::AlphaNumeric => is_alpha_numeric(value),
            Self::NumericArray => is_numeric_array(value),
        }
    }

    /// Wrap the predicate so it can be attached to a field rule.
    pub fn predicate(self) -> Predicate {
        Predicate::new(move |value| self.check(value))
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Builtin> for Predicate {
    fn from(builtin: Builtin) -> Self {
        builtin.predicate()
    }
}
