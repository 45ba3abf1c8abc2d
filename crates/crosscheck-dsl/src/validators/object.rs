//! # Object Validators
//!
//! Validators over JSON objects, configured with an ordered
//! [`FieldDescriptors`] shape.
//!
//! - `fields` runs each field's descriptor against the field's value (an
//!   absent field reads as `null`) and prefixes the field name onto every
//!   error path.
//! - `all-fields-present` reports `present` at each declared field missing
//!   from the value.
//! - `no-fields-extra` reports `absent` at each key the shape does not
//!   declare.
//!
//! `object` guards the kind and then runs `fields`; `strict_object` also
//! runs both presence checks, and only descends into fields once the key
//! set is exactly the declared one.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use crosscheck_core::{
    validate, Environment, ErrorMessage, FieldDescriptors, Options, RunError, ValidationError,
    ValidationResult, Validator, ValidatorFactory,
};
use serde_json::{Map, Value};

use crate::builder::ValidationBuilder;
use crate::validators::is::is_object;

/// The refined type of a value that passed an object guard.
pub type Record = Map<String, Value>;

fn shape<'a>(validator: &str, options: &'a Options) -> Result<&'a FieldDescriptors, RunError> {
    options.as_fields().ok_or_else(|| RunError::InvalidOptions {
        validator: validator.to_string(),
        reason: "expected per-field descriptors".to_string(),
    })
}

/// Factory for the `fields` validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldsFactory;

impl FieldsFactory {
    /// Registered rule name.
    pub const NAME: &'static str = "fields";
}

struct FieldsValidator<'a> {
    env: &'a dyn Environment,
    shape: &'a FieldDescriptors,
}

#[async_trait]
impl Validator for FieldsValidator<'_> {
    async fn run(&self, value: &Value, context: Option<&str>) -> ValidationResult {
        let mut errors = Vec::new();
        for (field, descriptor) in self.shape.iter() {
            let field_value = self
                .env
                .get(value, field)
                .unwrap_or(Cow::Owned(Value::Null));
            let field_errors = validate(self.env, &field_value, descriptor, context).await?;
            errors.extend(field_errors.into_iter().map(|e| e.prefixed(field)));
        }
        Ok(errors)
    }
}

impl ValidatorFactory for FieldsFactory {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn create<'a>(
        &'a self,
        env: &'a dyn Environment,
        options: &'a Options,
    ) -> Result<Box<dyn Validator + 'a>, RunError> {
        Ok(Box::new(FieldsValidator {
            env,
            shape: shape(Self::NAME, options)?,
        }))
    }
}

/// Factory for the `all-fields-present` validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllFieldsPresentFactory;

impl AllFieldsPresentFactory {
    /// Registered rule name.
    pub const NAME: &'static str = "all-fields-present";
}

struct AllFieldsPresentValidator<'a> {
    env: &'a dyn Environment,
    shape: &'a FieldDescriptors,
}

#[async_trait]
impl Validator for AllFieldsPresentValidator<'_> {
    async fn run(&self, value: &Value, _context: Option<&str>) -> ValidationResult {
        let keys = self.env.keys(value);
        Ok(self
            .shape
            .names()
            .filter(|field| !keys.iter().any(|k| k == field))
            .map(|field| ValidationError::at([field], ErrorMessage::named("present")))
            .collect())
    }
}

impl ValidatorFactory for AllFieldsPresentFactory {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn create<'a>(
        &'a self,
        env: &'a dyn Environment,
        options: &'a Options,
    ) -> Result<Box<dyn Validator + 'a>, RunError> {
        Ok(Box::new(AllFieldsPresentValidator {
            env,
            shape: shape(Self::NAME, options)?,
        }))
    }
}

/// Factory for the `no-fields-extra` validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFieldsExtraFactory;

impl NoFieldsExtraFactory {
    /// Registered rule name.
    pub const NAME: &'static str = "no-fields-extra";
}

struct NoFieldsExtraValidator<'a> {
    env: &'a dyn Environment,
    shape: &'a FieldDescriptors,
}

#[async_trait]
impl Validator for NoFieldsExtraValidator<'_> {
    async fn run(&self, value: &Value, _context: Option<&str>) -> ValidationResult {
        Ok(self
            .env
            .keys(value)
            .into_iter()
            .filter(|key| !self.shape.contains(key))
            .map(|key| ValidationError::at([key], ErrorMessage::named("absent")))
            .collect())
    }
}

impl ValidatorFactory for NoFieldsExtraFactory {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn create<'a>(
        &'a self,
        env: &'a dyn Environment,
        options: &'a Options,
    ) -> Result<Box<dyn Validator + 'a>, RunError> {
        Ok(Box::new(NoFieldsExtraValidator {
            env,
            shape: shape(Self::NAME, options)?,
        }))
    }
}

/// Validate each declared field with its descriptor.
pub fn fields(shape: FieldDescriptors) -> ValidationBuilder<Record, Record> {
    ValidationBuilder::new(Arc::new(FieldsFactory), Options::Fields(shape))
}

/// Require every declared field to be present.
pub fn all_fields_present(shape: FieldDescriptors) -> ValidationBuilder<Record, Record> {
    ValidationBuilder::new(Arc::new(AllFieldsPresentFactory), Options::Fields(shape))
}

/// Reject keys the shape does not declare.
pub fn no_fields_extra(shape: FieldDescriptors) -> ValidationBuilder<Record, Record> {
    ValidationBuilder::new(Arc::new(NoFieldsExtraFactory), Options::Fields(shape))
}

/// `is_object().and_then(fields(shape))`.
pub fn object(shape: FieldDescriptors) -> ValidationBuilder<Value, Record> {
    is_object().and_then(fields(shape))
}

/// An object whose keys are exactly the declared fields, each of which is
/// then validated.
pub fn strict_object(shape: FieldDescriptors) -> ValidationBuilder<Value, Record> {
    is_object()
        .and_then(all_fields_present(shape.clone()).and_also(no_fields_extra(shape.clone())))
        .and_then(fields(shape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::is::{is_number, is_string};
    use crosscheck_core::{validate_json, CombinatorKind, Descriptor};
    use serde_json::json;

    fn person() -> FieldDescriptors {
        FieldDescriptors::new()
            .with("name", is_string())
            .with("age", is_number())
    }

    fn rendered(errors: &[ValidationError]) -> Vec<String> {
        errors.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_fields_prefix_field_name() {
        let errors = validate_json(&json!({"name": 1, "age": "x"}), &object(person()).build(), None)
            .await
            .unwrap();
        assert_eq!(
            rendered(&errors),
            vec!["name: type (\"string\")", "age: type (\"number\")"]
        );
    }

    #[tokio::test]
    async fn test_absent_field_reads_as_null() {
        let errors = validate_json(&json!({"name": "ada"}), &object(person()).build(), None)
            .await
            .unwrap();
        assert_eq!(
            errors,
            vec![ValidationError::at(["age"], ErrorMessage::new("type", json!("number")))]
        );
    }

    #[tokio::test]
    async fn test_object_guard_stops_chain() {
        let errors = validate_json(&json!([1]), &object(person()).build(), None)
            .await
            .unwrap();
        assert_eq!(
            errors,
            vec![ValidationError::new(ErrorMessage::new("type", json!("object")))]
        );
    }

    #[tokio::test]
    async fn test_strict_object_reports_missing_and_extra() {
        let errors = validate_json(
            &json!({"name": "ada", "email": "a@b"}),
            &strict_object(person()).build(),
            None,
        )
        .await
        .unwrap();
        assert_eq!(
            errors,
            vec![
                ValidationError::at(["age"], ErrorMessage::named("present")),
                ValidationError::at(["email"], ErrorMessage::named("absent")),
            ]
        );
    }

    #[tokio::test]
    async fn test_extra_fields_reported_in_document_order() {
        let value: Value =
            serde_json::from_str(r#"{"zeta": 1, "name": "ada", "alpha": 2, "age": 3}"#).unwrap();
        let errors = validate_json(&value, &no_fields_extra(person()).build(), None)
            .await
            .unwrap();
        assert_eq!(rendered(&errors), vec!["zeta: absent", "alpha: absent"]);
    }

    #[tokio::test]
    async fn test_strict_object_descends_when_keys_match() {
        let descriptor = strict_object(person()).build();
        assert_eq!(descriptor.combinator(), CombinatorKind::Chain);

        let errors = validate_json(&json!({"name": "ada", "age": true}), &descriptor, None)
            .await
            .unwrap();
        assert_eq!(rendered(&errors), vec!["age: type (\"number\")"]);

        let ok = validate_json(&json!({"name": "ada", "age": 36}), &descriptor, None)
            .await
            .unwrap();
        assert!(ok.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_options_shape_is_run_error() {
        let descriptor = Descriptor::leaf(Arc::new(FieldsFactory), Options::Value(json!(1)));
        let err = validate_json(&json!({}), &descriptor, None).await.unwrap_err();
        assert!(matches!(
            err,
            RunError::InvalidOptions { ref validator, .. } if validator == "fields"
        ));
    }
}
