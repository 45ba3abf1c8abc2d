//! # Combinators
//!
//! The four composite behaviors. Each is a [`Validator`] bound to an
//! environment and its child descriptors; running it recurses into the
//! [`engine`](crate::engine) once per child, with the same value and the
//! same active context.
//!
//! | Combinator | Children run | Result |
//! |------------|--------------|--------|
//! | [`Chain`]  | in order, until one fails | the first failure, else `[]` |
//! | [`And`]    | all, in order | every failure, concatenated |
//! | [`Or`]     | in order, until one succeeds | `[]`, else every failure concatenated |
//! | [`MapError`] | the one child | `[]`, else `transform(failures)` |
//!
//! Children are awaited strictly one after another. A child that suspends
//! holds up its siblings; ordering and short-circuiting are part of the
//! contract, not an artifact of scheduling.

use async_trait::async_trait;
use serde_json::Value;

use crate::descriptor::{Descriptor, ErrorTransform};
use crate::engine::validate;
use crate::env::Environment;
use crate::error::ValidationResult;
use crate::validator::Validator;

/// Fail fast: later children assume earlier ones passed.
pub struct Chain<'a> {
    env: &'a dyn Environment,
    descriptors: &'a [Descriptor],
}

impl<'a> Chain<'a> {
    /// Bind `descriptors` to `env`.
    pub fn new(env: &'a dyn Environment, descriptors: &'a [Descriptor]) -> Self {
        Self { env, descriptors }
    }
}

#[async_trait]
impl Validator for Chain<'_> {
    async fn run(&self, value: &Value, context: Option<&str>) -> ValidationResult {
        for descriptor in self.descriptors {
            let errors = validate(self.env, value, descriptor, context).await?;
            if !errors.is_empty() {
                return Ok(errors);
            }
        }
        Ok(Vec::new())
    }
}

/// Independent rules: report everything.
pub struct And<'a> {
    env: &'a dyn Environment,
    descriptors: &'a [Descriptor],
}

impl<'a> And<'a> {
    /// Bind `descriptors` to `env`.
    pub fn new(env: &'a dyn Environment, descriptors: &'a [Descriptor]) -> Self {
        Self { env, descriptors }
    }
}

#[async_trait]
impl Validator for And<'_> {
    async fn run(&self, value: &Value, context: Option<&str>) -> ValidationResult {
        let mut result = Vec::new();
        for descriptor in self.descriptors {
            result.extend(validate(self.env, value, descriptor, context).await?);
        }
        Ok(result)
    }
}

/// Alternatives: the first success wins.
///
/// When every alternative fails, their errors are concatenated in
/// declaration order so no failure reason is lost. An empty `Or` succeeds.
pub struct Or<'a> {
    env: &'a dyn Environment,
    descriptors: &'a [Descriptor],
}

impl<'a> Or<'a> {
    /// Bind `descriptors` to `env`.
    pub fn new(env: &'a dyn Environment, descriptors: &'a [Descriptor]) -> Self {
        Self { env, descriptors }
    }
}

#[async_trait]
impl Validator for Or<'_> {
    async fn run(&self, value: &Value, context: Option<&str>) -> ValidationResult {
        let mut failures = Vec::new();
        for descriptor in self.descriptors {
            let errors = validate(self.env, value, descriptor, context).await?;
            if errors.is_empty() {
                return Ok(Vec::new());
            }
            failures.extend(errors);
        }
        Ok(failures)
    }
}

/// Rewrites the errors of a failing child. Success passes through and the
/// transform is not called.
pub struct MapError<'a> {
    env: &'a dyn Environment,
    descriptor: &'a Descriptor,
    transform: &'a ErrorTransform,
}

impl<'a> MapError<'a> {
    /// Bind `descriptor` and `transform` to `env`.
    pub fn new(
        env: &'a dyn Environment,
        descriptor: &'a Descriptor,
        transform: &'a ErrorTransform,
    ) -> Self {
        Self {
            env,
            descriptor,
            transform,
        }
    }
}

#[async_trait]
impl Validator for MapError<'_> {
    async fn run(&self, value: &Value, context: Option<&str>) -> ValidationResult {
        let errors = validate(self.env, value, self.descriptor, context).await?;
        if errors.is_empty() {
            Ok(errors)
        } else {
            Ok(self.transform.apply(errors))
        }
    }
}
