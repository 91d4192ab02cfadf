//! The validator: an output mode bound to rule evaluation.

use crate::error::{ConfigError, Result};
use crate::evaluate::{evaluate, evaluate_deferred};
use crate::format::{format, OutputMode, Rendered};
use crate::predicates;
use crate::rule::Batch;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Environment variable read by [`ValidatorConfig::from_env`].
pub const ERRORS_RETURNED_AS_ENV: &str = "FIELDCHECK_ERRORS_RETURNED_AS";

/// Options for building a [`Validator`].
///
/// Deserializes from `{"errorsReturnedAs": "array"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorConfig {
    /// `string` (default), `error` or `array`, in any case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors_returned_as: Option<String>,
}

impl ValidatorConfig {
    /// Config with an explicit output mode name.
    pub fn errors_returned_as(mode: impl Into<String>) -> Self {
        Self {
            errors_returned_as: Some(mode.into()),
        }
    }

    /// Read the output mode from `FIELDCHECK_ERRORS_RETURNED_AS`.
    ///
    /// An unset or empty variable leaves the default in place.
    pub fn from_env() -> Self {
        let errors_returned_as = std::env::var(ERRORS_RETURNED_AS_ENV)
            .ok()
            .filter(|value| !value.is_empty());
        Self { errors_returned_as }
    }

    /// Resolve the configured output mode.
    pub fn output_mode(&self) -> Result<OutputMode, ConfigError> {
        match self.errors_returned_as.as_deref() {
            None | Some("") => Ok(OutputMode::default()),
            Some(name) => name.parse(),
        }
    }
}

/// Validates rule sets and renders the violations in a fixed output mode.
///
/// The mode is chosen at construction and never changes. A validator holds no
/// other state, so it can be cloned freely and shared between tasks.
///
/// ```rust,ignore
/// use fieldcheck::{FieldRule, Rendered, RuleSet, Validator, ValidatorConfig};
/// use serde_json::json;
///
/// let validator = Validator::new(ValidatorConfig::errors_returned_as("array"))?;
/// let rules = RuleSet::from_value(json!({ "name": "" }))
///     .rule("name", FieldRule::required());
///
/// assert_eq!(
///     validator.validate(&rules)?,
///     Rendered::Array(vec!["name is required".to_string()])
/// );
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Validator {
    mode: OutputMode,
}

impl Validator {
    /// Create a validator from configuration.
    ///
    /// Fails if `errors_returned_as` is not one of `string`, `error`, `array`.
    pub fn new(config: ValidatorConfig) -> Result<Self, ConfigError> {
        let mode = config.output_mode().map_err(|error| {
            trace_error!(%error, "invalid validator configuration");
            error
        })?;
        Ok(Self::with_mode(mode))
    }

    /// Create a validator for a known output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Validate a rule set, or a sequence of them, on the calling thread.
    ///
    /// Violations are reported through the returned [`Rendered`] value; `Err`
    /// is reserved for predicates that failed to run.
    pub fn validate<'a>(&self, batch: impl Into<Batch<'a>>) -> Result<Rendered> {
        let violations = evaluate(batch)?;
        Ok(format(violations, self.mode))
    }

    /// Validate with every field checked as a separate task on the tokio runtime.
    ///
    /// Produces the same result as [`validate`](Self::validate).
    pub async fn validate_async<'a>(&self, batch: impl Into<Batch<'a>>) -> Result<Rendered> {
        let violations = evaluate_deferred(batch).await?;
        Ok(format(violations, self.mode))
    }

    /// Validate in deferred mode and hand the outcome to `completion`.
    ///
    /// `completion` is called exactly once, with either the rendered result or
    /// the fault that aborted evaluation.
    pub async fn validate_with<'a, F>(&self, batch: impl Into<Batch<'a>>, completion: F)
    where
        F: FnOnce(Result<Rendered>),
    {
        completion(self.validate_async(batch).await);
    }

    /// See [`predicates::is_numeric`].
    pub fn is_numeric(&self, value: &Value) -> bool {
        predicates::is_numeric(value)
    }

    /// See [`predicates::is_alpha`].
    pub fn is_alpha(&self, value: &Value) -> bool {
        predicates::is_alpha(value)
    }

    /// See [`predicates::is_alpha_numeric`].
    pub fn is_alpha_numeric(&self, value: &Value) -> bool {
        predicates::is_alpha_numeric(value)
    }

    /// See [`predicates::is_numeric_array`].
    pub fn is_numeric_array(&self, value: &Value) -> bool {
        predicates::is_numeric_array(value)
    }
}

impl TryFrom<ValidatorConfig> for Validator {
    type Error = ConfigError;

    fn try_from(config: ValidatorConfig) -> Result<Self, Self::Error> {
        Self::new(config)
    }
}
