//! # Error Types — Validation Results and Failures
//!
//! Three error classes flow through crosscheck, and they never mix:
//!
//! - [`ValidationError`] is *data*. A failed business rule produces one, the
//!   combinators accumulate them, and container validators re-tag their
//!   paths on the way up. They are never thrown.
//! - [`UsageError`] is author misuse detected while building descriptors or
//!   extending a field mapping. It aborts construction; no partial result
//!   is produced.
//! - [`RunError`] is a leaf validator that could not finish (an external
//!   lookup failed, options had the wrong shape). It propagates out of the
//!   whole validation pass.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Outcome of running a validator: the ordered errors, empty on success.
pub type ValidationResult = Result<Vec<ValidationError>, RunError>;

/// Structured reason attached to a [`ValidationError`].
///
/// `name` identifies the failed rule (`"type"`, `"present"`, `"absent"`,
/// ...); `details` carries rule-specific arguments such as the expected
/// type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Rule identifier.
    pub name: String,
    /// Rule-specific arguments, `null` when the rule has none.
    pub details: Value,
}

impl ErrorMessage {
    /// Create a message with explicit details.
    pub fn new(name: impl Into<String>, details: Value) -> Self {
        Self {
            name: name.into(),
            details,
        }
    }

    /// Create a message with `null` details.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Value::Null)
    }
}

/// A single failed rule, tagged with the path to the offending value.
///
/// Paths are built bottom-up: a leaf reports `[]` relative to the value it
/// was handed, and every container it sits in prepends its own key or
/// index. Read top-down, the path goes from root to leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Root-to-leaf path segments.
    pub path: Vec<String>,
    /// Why the value was rejected.
    pub message: ErrorMessage,
}

impl ValidationError {
    /// An error at the root of the value under test.
    pub fn new(message: ErrorMessage) -> Self {
        Self {
            path: Vec::new(),
            message,
        }
    }

    /// An error at an explicit path.
    pub fn at<I, S>(path: I, message: ErrorMessage) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            message,
        }
    }

    /// Return this error with `segment` prepended to its path.
    pub fn prefixed(mut self, segment: impl Into<String>) -> Self {
        self.path.insert(0, segment.into());
        self
    }

    /// Dotted form of the path (`a.b.0.c`), empty for the root.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.message.name)?;
        } else {
            write!(f, "{}: {}", self.dotted_path(), self.message.name)?;
        }
        if !self.message.details.is_null() {
            write!(f, " ({})", self.message.details)?;
        }
        Ok(())
    }
}

/// A leaf validator could not produce a result.
#[derive(Error, Debug)]
pub enum RunError {
    /// The validator's own check failed (e.g. an external lookup errored).
    #[error("validator '{validator}' failed: {source}")]
    Validator {
        /// Name of the failing validator.
        validator: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The factory was handed options of the wrong shape.
    #[error("validator '{validator}' received unsupported options: {reason}")]
    InvalidOptions {
        /// Name of the factory.
        validator: String,
        /// What was expected.
        reason: String,
    },
}

impl RunError {
    /// Wrap an arbitrary failure raised inside validator `validator`.
    pub fn validator(
        validator: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Validator {
            validator: validator.into(),
            source: source.into(),
        }
    }
}

/// Author misuse detected while building or extending validations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// `on()` called with no contexts.
    #[error("you must provide at least one validation context")]
    MissingContexts,

    /// `keys()` called with no keys.
    #[error("you must provide at least one dependent key")]
    MissingKeys,

    /// A plain builder list was given for a field the parent already defines.
    #[error("`{field}` already has existing validations; use `append()` or `replace()` to add or completely replace validations")]
    AmbiguousExtension {
        /// The field named in the extension.
        field: String,
    },

    /// `append()`, `replace()` or `remove()` targeted a field the parent
    /// does not define.
    #[error("cannot use `{directive}()` when there are no existing validations defined for `{field}`")]
    NoExistingValidations {
        /// The directive that was misused.
        directive: &'static str,
        /// The field named in the extension.
        field: String,
    },

    /// `append()` with an empty list.
    #[error("cannot use `append()` to add zero validations for `{field}`")]
    EmptyAppend {
        /// The field named in the extension.
        field: String,
    },

    /// `replace()` with an empty list.
    #[error("cannot use `replace()` to remove all validations for `{field}`")]
    EmptyReplace {
        /// The field named in the extension.
        field: String,
    },
}
