//! # fieldcheck
//!
//! Field validation for request handlers. A [`RuleSet`] pairs a source record
//! (a JSON object) with per-field rules: whether the field is required, and an
//! optional [`Predicate`] its value must satisfy. A [`Validator`] evaluates one
//! or more rule sets and renders the violations in the [`OutputMode`] it was
//! built with.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fieldcheck::prelude::*;
//! use serde_json::json;
//!
//! let validator = Validator::new(ValidatorConfig::errors_returned_as("error"))?;
//!
//! let rules = RuleSet::from_value(json!({ "name": "ada", "age": "old" }))
//!     .rule("name", FieldRule::required().with_predicate(Builtin::Alpha))
//!     .rule("age", FieldRule::required().with_predicate(Builtin::Numeric))
//!     .rule("email", FieldRule::required());
//!
//! let rendered = validator.validate(&rules)?;
//! let error = rendered.as_error().unwrap();
//! assert_eq!(error.status(), http::StatusCode::BAD_REQUEST);
//! assert_eq!(error.message(), "old is not a valid value for age, email is required");
//! ```
//!
//! ## Rules
//!
//! For each rule, in insertion order:
//!
//! - a value is missing when it is absent, an empty string, or a non-string
//!   that is not numeric
//! - a required field with a missing value reports `"<field> is required"`
//! - otherwise a present value rejected by the predicate reports
//!   `"<value> is not a valid value for <field>"`
//!
//! ## Output modes
//!
//! - `string` (default) - violations joined with `", "`
//! - `array` - the violations as a list
//! - `error` - a [`BadRequest`] (status 400) whose message is the joined
//!   violations, or `"Bad request"` when there are none
//!
//! Validation runs either on the calling thread ([`Validator::validate`]) or
//! as one tokio task per field ([`Validator::validate_async`]); both return
//! the same result.

#[macro_use]
mod tracing_macros;

mod error;
mod evaluate;
mod format;
pub mod predicates;
mod rule;
mod validator;

pub use error::{BoxError, ConfigError, ExecutionFault, Result};
pub use evaluate::{evaluate, evaluate_deferred, is_missing};
pub use format::{format, BadRequest, OutputMode, Rendered};
pub use predicates::{is_alpha, is_alpha_numeric, is_numeric, is_numeric_array, Builtin};
pub use rule::{Batch, FieldRule, FieldRuleSpec, Predicate, RuleSet, RuleSpec};
pub use validator::{Validator, ValidatorConfig, ERRORS_RETURNED_AS_ENV};

/// Prelude module for validation
pub mod prelude {
    pub use crate::error::{ConfigError, ExecutionFault};
    pub use crate::format::{BadRequest, OutputMode, Rendered};
    pub use crate::predicates::Builtin;
    pub use crate::rule::{FieldRule, Predicate, RuleSet};
    pub use crate::validator::{Validator, ValidatorConfig};
}
