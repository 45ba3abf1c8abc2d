//! # Leaf Validator Contract
//!
//! Every concrete rule plugs into the engine through two traits:
//!
//! - [`ValidatorFactory`]: a pure function `(environment, options) ->
//!   validator`. Factories are shared (`Arc`) and identified by name.
//! - [`Validator`]: the runnable produced by a factory. `run` is
//!   asynchronous so a rule may await an external check; it resolves to the
//!   ordered errors for the value it was handed, or a [`RunError`].

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::descriptor::Options;
use crate::env::Environment;
use crate::error::{RunError, ValidationError, ValidationResult};

/// A runnable validation behavior.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Validate `value` under the active `context`.
    async fn run(&self, value: &Value, context: Option<&str>) -> ValidationResult;
}

/// Constructs [`Validator`]s from descriptor options.
pub trait ValidatorFactory: Send + Sync + fmt::Debug {
    /// Stable identifier. Two factories with the same name are the same rule.
    fn name(&self) -> &str;

    /// Build a validator bound to `env` and `options`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::InvalidOptions`] if `options` do not have the
    /// shape this factory expects.
    fn create<'a>(
        &'a self,
        env: &'a dyn Environment,
        options: &'a Options,
    ) -> Result<Box<dyn Validator + 'a>, RunError>;
}

/// Adapts a synchronous check function into a [`ValidatorFactory`].
///
/// The function receives the value and the descriptor options and returns
/// its errors directly; it never suspends.
pub struct FnFactory<F> {
    name: String,
    check: F,
}

impl<F> FnFactory<F>
where
    F: Fn(&Value, &Options) -> Vec<ValidationError> + Send + Sync,
{
    /// Create a factory named `name` around `check`.
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> fmt::Debug for FnFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFactory")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F> ValidatorFactory for FnFactory<F>
where
    F: Fn(&Value, &Options) -> Vec<ValidationError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn create<'a>(
        &'a self,
        _env: &'a dyn Environment,
        options: &'a Options,
    ) -> Result<Box<dyn Validator + 'a>, RunError> {
        Ok(Box::new(FnValidator {
            check: &self.check,
            options,
        }))
    }
}

struct FnValidator<'a, F> {
    check: &'a F,
    options: &'a Options,
}

#[async_trait]
impl<F> Validator for FnValidator<'_, F>
where
    F: Fn(&Value, &Options) -> Vec<ValidationError> + Send + Sync,
{
    async fn run(&self, value: &Value, _context: Option<&str>) -> ValidationResult {
        Ok((self.check)(value, self.options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::JsonEnvironment;
    use crate::error::ErrorMessage;
    use serde_json::json;

    #[tokio::test]
    async fn test_fn_factory_passes_options_through() {
        let factory = FnFactory::new("min", |value: &Value, options: &Options| {
            let min = options.as_value().and_then(Value::as_i64).unwrap_or(0);
            if value.as_i64().unwrap_or(0) < min {
                vec![ValidationError::new(ErrorMessage::new("min", json!(min)))]
            } else {
                Vec::new()
            }
        });
        assert_eq!(factory.name(), "min");

        let options = Options::Value(json!(3));
        let validator = factory.create(&JsonEnvironment, &options).unwrap();
        assert!(validator.run(&json!(5), None).await.unwrap().is_empty());

        let errors = validator.run(&json!(1), None).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message.details, json!(3));
    }

    #[test]
    fn test_fn_factory_debug_shows_name_only() {
        let factory = FnFactory::new("noop", |_: &Value, _: &Options| Vec::new());
        let rendered = format!("{factory:?}");
        assert!(rendered.contains("noop"));
    }
}
