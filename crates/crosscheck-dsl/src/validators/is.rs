//! Type guards.
//!
//! Each guard accepts a single JSON kind and otherwise reports one error
//! `{ name: "type", details: "<kind>" }` at the root of the checked value.
//! The builders carry the refined output type, so a guard can head an
//! `and_then` chain whose later stages expect that kind.
//!
//! [`is_present`] is the odd one out: it accepts anything but `null` and
//! reports `{ name: "present" }`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use crosscheck_core::{
    Environment, ErrorMessage, Options, RunError, ValidationError, ValidationResult, Validator,
    ValidatorFactory,
};
use serde_json::{Map, Number, Value};

use crate::builder::ValidationBuilder;

/// JSON value kinds a guard can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `{ ... }`
    Object,
    /// `[ ... ]`
    Array,
    /// Any JSON number, integer or float.
    Number,
    /// A JSON string.
    String,
    /// `true` or `false`.
    Boolean,
}

impl ValueKind {
    /// Every kind, in declaration order.
    pub const ALL: [ValueKind; 5] = [
        ValueKind::Object,
        ValueKind::Array,
        ValueKind::Number,
        ValueKind::String,
        ValueKind::Boolean,
    ];

    /// The kind as reported in error details.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }

    /// The registered rule name of the guard for this kind.
    pub fn guard_name(&self) -> &'static str {
        match self {
            Self::Object => "is-object",
            Self::Array => "is-array",
            Self::Number => "is-number",
            Self::String => "is-string",
            Self::Boolean => "is-boolean",
        }
    }

    /// Whether `value` is of this kind.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Factory for the guard of one [`ValueKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeGuard {
    kind: ValueKind,
}

impl TypeGuard {
    /// The guard requiring `kind`.
    pub fn new(kind: ValueKind) -> Self {
        Self { kind }
    }

    /// The kind this guard requires.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

struct TypeGuardValidator {
    kind: ValueKind,
}

#[async_trait]
impl Validator for TypeGuardValidator {
    async fn run(&self, value: &Value, _context: Option<&str>) -> ValidationResult {
        if self.kind.matches(value) {
            return Ok(Vec::new());
        }
        Ok(vec![ValidationError::new(ErrorMessage::new(
            "type",
            Value::String(self.kind.as_str().to_string()),
        ))])
    }
}

impl ValidatorFactory for TypeGuard {
    fn name(&self) -> &str {
        self.kind.guard_name()
    }

    fn create<'a>(
        &'a self,
        _env: &'a dyn Environment,
        _options: &'a Options,
    ) -> Result<Box<dyn Validator + 'a>, RunError> {
        Ok(Box::new(TypeGuardValidator { kind: self.kind }))
    }
}

/// Factory for the `is-present` check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenceGuard;

impl PresenceGuard {
    /// Registered rule name.
    pub const NAME: &'static str = "is-present";
}

struct PresenceValidator;

#[async_trait]
impl Validator for PresenceValidator {
    async fn run(&self, value: &Value, _context: Option<&str>) -> ValidationResult {
        if value.is_null() {
            Ok(vec![ValidationError::new(ErrorMessage::named("present"))])
        } else {
            Ok(Vec::new())
        }
    }
}

impl ValidatorFactory for PresenceGuard {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn create<'a>(
        &'a self,
        _env: &'a dyn Environment,
        _options: &'a Options,
    ) -> Result<Box<dyn Validator + 'a>, RunError> {
        Ok(Box::new(PresenceValidator))
    }
}

fn guard<U>(kind: ValueKind) -> ValidationBuilder<Value, U> {
    ValidationBuilder::new(Arc::new(TypeGuard::new(kind)), Options::None)
}

/// Accepts JSON objects.
pub fn is_object() -> ValidationBuilder<Value, Map<String, Value>> {
    guard(ValueKind::Object)
}

/// Accepts JSON arrays.
pub fn is_array() -> ValidationBuilder<Value, Vec<Value>> {
    guard(ValueKind::Array)
}

/// Accepts JSON numbers.
pub fn is_number() -> ValidationBuilder<Value, Number> {
    guard(ValueKind::Number)
}

/// Accepts JSON strings.
pub fn is_string() -> ValidationBuilder<Value, String> {
    guard(ValueKind::String)
}

/// Accepts JSON booleans.
pub fn is_boolean() -> ValidationBuilder<Value, bool> {
    guard(ValueKind::Boolean)
}

/// Rejects `null`, which is also what an absent field reads as.
pub fn is_present() -> ValidationBuilder<Value, Value> {
    ValidationBuilder::new(Arc::new(PresenceGuard), Options::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosscheck_core::validate_json;
    use serde_json::json;

    fn type_error(kind: &str) -> Vec<ValidationError> {
        vec![ValidationError::new(ErrorMessage::new("type", json!(kind)))]
    }

    #[tokio::test]
    async fn test_guards_accept_their_kind() {
        let cases = [
            (is_object().build(), json!({"a": 1})),
            (is_array().build(), json!([1, 2])),
            (is_number().build(), json!(1.5)),
            (is_string().build(), json!("x")),
            (is_boolean().build(), json!(false)),
        ];
        for (descriptor, value) in &cases {
            let errors = validate_json(value, descriptor, None).await.unwrap();
            assert!(errors.is_empty(), "{} rejected {value}", descriptor.name());
        }
    }

    #[tokio::test]
    async fn test_guards_report_expected_kind() {
        let errors = validate_json(&json!("1"), &is_number().build(), None).await.unwrap();
        assert_eq!(errors, type_error("number"));

        let errors = validate_json(&json!(null), &is_object().build(), None).await.unwrap();
        assert_eq!(errors, type_error("object"));

        let errors = validate_json(&json!({}), &is_array().build(), None).await.unwrap();
        assert_eq!(errors, type_error("array"));
    }

    #[tokio::test]
    async fn test_is_present_rejects_null_only() {
        let descriptor = is_present().build();
        for value in [json!(0), json!(""), json!(false), json!([])] {
            assert!(validate_json(&value, &descriptor, None).await.unwrap().is_empty());
        }
        let errors = validate_json(&json!(null), &descriptor, None).await.unwrap();
        assert_eq!(errors, vec![ValidationError::new(ErrorMessage::named("present"))]);
    }

    #[test]
    fn test_guard_names() {
        let names: Vec<_> = ValueKind::ALL.iter().map(|k| k.guard_name()).collect();
        assert_eq!(
            names,
            vec!["is-object", "is-array", "is-number", "is-string", "is-boolean"]
        );
        assert_eq!(is_string().build().name(), "is-string");
    }
}
