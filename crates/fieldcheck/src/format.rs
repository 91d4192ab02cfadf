//! Rendering of violation lists.

use crate::error::ConfigError;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator used when joining violations into one message.
pub const SEPARATOR: &str = ", ";

/// Message of a bad-request result with no violations.
pub const DEFAULT_BAD_REQUEST_MESSAGE: &str = "Bad request";

/// Shape of a rendered validation result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// The violations as a list.
    Array,
    /// The violations joined with `", "`.
    #[default]
    String,
    /// A 400 bad-request value carrying the joined violations.
    Error,
}

impl OutputMode {
    /// Accepted modes, in the order they are reported in configuration errors.
    pub const ALL: [OutputMode; 3] = [OutputMode::String, OutputMode::Error, OutputMode::Array];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::String => "string",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    /// Parse a mode name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownReturnType {
                value: normalized,
                expected: Self::ALL.map(OutputMode::as_str).join(", "),
            })
    }
}

/// A bad-request result.
///
/// This is an ordinary value: validation hands it back through `Ok`, and it
/// is up to the caller to turn it into a response. It implements
/// [`std::error::Error`] so a handler can forward it with `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadRequest {
    message: String,
}

impl BadRequest {
    /// Build the result for a list of violations.
    pub fn from_violations(violations: &[String]) -> Self {
        let message = if violations.is_empty() {
            DEFAULT_BAD_REQUEST_MESSAGE.to_string()
        } else {
            violations.join(SEPARATOR)
        };
        Self { message }
    }

    /// Always 400 Bad Request.
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status(), self.message)
    }
}

impl std::error::Error for BadRequest {}

/// Internal error structure for JSON serialization.
#[derive(Serialize)]
struct ErrorBody<'a> {
    #[serde(rename = "type")]
    error_type: &'static str,
    status: u16,
    message: &'a str,
}

#[derive(Serialize)]
struct ErrorWrapper<'a> {
    error: ErrorBody<'a>,
}

/// Serializes to `{"error": {"type": "bad_request", "status": 400, "message": ...}}`.
impl Serialize for BadRequest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ErrorWrapper {
            error: ErrorBody {
                error_type: "bad_request",
                status: self.status().as_u16(),
                message: &self.message,
            },
        }
        .serialize(serializer)
    }
}

/// A validation result rendered for one [`OutputMode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Rendered {
    Array(Vec<String>),
    String(String),
    Error(BadRequest),
}

impl Rendered {
    /// The mode this result was rendered for.
    pub fn mode(&self) -> OutputMode {
        match self {
            Self::Array(_) => OutputMode::Array,
            Self::String(_) => OutputMode::String,
            Self::Error(_) => OutputMode::Error,
        }
    }

    pub fn as_array(&self) -> Option<&[String]> {
        match self {
            Self::Array(violations) => Some(violations.as_slice()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&BadRequest> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Whether the result reports no violations.
    ///
    /// An error-mode result is never clean: it carries a bad request even
    /// when nothing failed.
    pub fn is_clean(&self) -> bool {
        match self {
            Self::Array(violations) => violations.is_empty(),
            Self::String(message) => message.is_empty(),
            Self::Error(_) => false,
        }
    }
}

/// Render violations for a mode.
pub fn format(violations: Vec<String>, mode: OutputMode) -> Rendered {
    match mode {
        OutputMode::Array => Rendered::Array(violations),
        OutputMode::String => Rendered::String(violations.join(SEPARATOR)),
        OutputMode::Error => Rendered::Error(BadRequest::from_violations(&violations)),
    }
}
