//! # Execution Engine
//!
//! Interprets a [`Descriptor`] against a value:
//!
//! 1. A descriptor restricted to contexts that do not include the active
//!    one is inert: the result is `[]` and its factory is never invoked.
//! 2. Otherwise the descriptor is resolved to a [`Validator`] (composite
//!    kinds to the [`combinators`](crate::combinators), leaves through
//!    their factory) and run with the value and the active context.
//! 3. Composite validators recurse into step 1 for each child.
//!
//! [`validate`] returns a boxed future so that recursion through
//! composite descriptors has a finite future type.

use futures::future::BoxFuture;
use serde_json::Value;

use crate::combinators::{And, Chain, MapError, Or};
use crate::descriptor::{Descriptor, DescriptorKind};
use crate::env::{Environment, JsonEnvironment};
use crate::error::{RunError, ValidationResult};
use crate::validator::Validator;

/// Resolve `descriptor` to the validator it describes.
///
/// # Errors
///
/// Propagates [`RunError::InvalidOptions`] from a leaf factory that rejects
/// its options.
pub fn resolve<'a>(
    env: &'a dyn Environment,
    descriptor: &'a Descriptor,
) -> Result<Box<dyn Validator + 'a>, RunError> {
    match descriptor.kind() {
        DescriptorKind::Chain(children) => Ok(Box::new(Chain::new(env, children))),
        DescriptorKind::And(children) => Ok(Box::new(And::new(env, children))),
        DescriptorKind::Or(children) => Ok(Box::new(Or::new(env, children))),
        DescriptorKind::MapError {
            descriptor,
            transform,
        } => Ok(Box::new(MapError::new(env, descriptor, transform))),
        DescriptorKind::Leaf { factory, options } => factory.create(env, options),
    }
}

/// Validate `value` against `descriptor` under the active `context`.
///
/// # Errors
///
/// A [`RunError`] raised by any validator in the tree aborts the pass and
/// is returned unchanged.
pub fn validate<'a>(
    env: &'a dyn Environment,
    value: &'a Value,
    descriptor: &'a Descriptor,
    context: Option<&'a str>,
) -> BoxFuture<'a, ValidationResult> {
    Box::pin(async move {
        if !descriptor.is_active(context) {
            tracing::trace!(
                descriptor = descriptor.name(),
                context = context.unwrap_or("<none>"),
                "descriptor not active in context, skipping"
            );
            return Ok(Vec::new());
        }

        let validator = resolve(env, descriptor)?;
        let errors = validator.run(value, context).await?;
        tracing::debug!(
            descriptor = descriptor.name(),
            kind = %descriptor.combinator(),
            errors = errors.len(),
            "descriptor evaluated"
        );
        Ok(errors)
    })
}

/// [`validate`] with the stock [`JsonEnvironment`].
pub async fn validate_json(
    value: &Value,
    descriptor: &Descriptor,
    context: Option<&str>,
) -> ValidationResult {
    validate(&JsonEnvironment, value, descriptor, context).await
}
