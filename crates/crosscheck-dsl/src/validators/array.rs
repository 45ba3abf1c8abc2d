//! Array validators.
//!
//! `items` runs one element descriptor against every element, in index
//! order, and prefixes the element index onto each error path. A value
//! that is not an array yields no errors; pair it with `is_array` (as
//! [`array`] does) to reject other kinds.

use std::sync::Arc;

use async_trait::async_trait;
use crosscheck_core::{
    validate, Descriptor, Environment, Options, RunError, ValidationResult, Validator,
    ValidatorFactory,
};
use serde_json::Value;

use crate::builder::ValidationBuilder;
use crate::validators::is::is_array;

/// Factory for the `items` validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemsFactory;

impl ItemsFactory {
    /// Registered rule name.
    pub const NAME: &'static str = "items";
}

struct ItemsValidator<'a> {
    env: &'a dyn Environment,
    element: &'a Descriptor,
}

#[async_trait]
impl Validator for ItemsValidator<'_> {
    async fn run(&self, value: &Value, context: Option<&str>) -> ValidationResult {
        let Some(elements) = value.as_array() else {
            return Ok(Vec::new());
        };
        let mut errors = Vec::new();
        for (index, element) in elements.iter().enumerate() {
            let element_errors = validate(self.env, element, self.element, context).await?;
            let segment = index.to_string();
            errors.extend(element_errors.into_iter().map(|e| e.prefixed(segment.as_str())));
        }
        Ok(errors)
    }
}

impl ValidatorFactory for ItemsFactory {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn create<'a>(
        &'a self,
        env: &'a dyn Environment,
        options: &'a Options,
    ) -> Result<Box<dyn Validator + 'a>, RunError> {
        let element = options
            .as_descriptor()
            .ok_or_else(|| RunError::InvalidOptions {
                validator: Self::NAME.to_string(),
                reason: "expected an element descriptor".to_string(),
            })?;
        Ok(Box::new(ItemsValidator { env, element }))
    }
}

/// Validate every element with `element`.
pub fn items<U>(element: ValidationBuilder<Value, U>) -> ValidationBuilder<Vec<Value>, Vec<U>> {
    ValidationBuilder::new(
        Arc::new(ItemsFactory),
        Options::Descriptor(Box::new(element.build())),
    )
}

/// `is_array().and_then(items(element))`.
pub fn array<U>(element: ValidationBuilder<Value, U>) -> ValidationBuilder<Value, Vec<U>> {
    is_array().and_then(items(element))
}
