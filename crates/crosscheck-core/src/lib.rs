//! # crosscheck-core — Validation Descriptor Algebra
//!
//! The runtime half of crosscheck. Validation rules are described as an
//! immutable tree of [`Descriptor`]s and interpreted against a
//! `serde_json::Value` by the [`engine`], producing an ordered list of
//! path-tagged [`ValidationError`]s. An empty list means the value is
//! acceptable.
//!
//! ## Layers (leaves first)
//!
//! - **Descriptor** (`descriptor.rs`): behavior tag, options, contexts and
//!   dependent keys. Inert data, no logic.
//! - **Leaf contract** (`validator.rs`): [`ValidatorFactory`] builds a
//!   [`Validator`] from an environment and options; validators run
//!   asynchronously.
//! - **Environment** (`env.rs`): how to read a key out of a value.
//! - **Combinators** (`combinators.rs`): `chain`, `and`, `or`, `map_error`.
//! - **Engine** (`engine.rs`): context filtering, resolution, recursion.
//!
//! ## Crate Policy
//!
//! - Evaluation order is declaration order. Nothing runs in parallel.
//! - Validation failures are data ([`ValidationError`]); only a validator
//!   that cannot finish produces a [`RunError`].
//! - No `.unwrap()` outside tests.

pub mod combinators;
pub mod descriptor;
pub mod engine;
pub mod env;
pub mod error;
pub mod validator;

pub use descriptor::{
    CombinatorKind, Descriptor, DescriptorKind, ErrorTransform, FieldDescriptors, Options,
};
pub use engine::{resolve, validate, validate_json};
pub use env::{Environment, JsonEnvironment};
pub use error::{ErrorMessage, RunError, UsageError, ValidationError, ValidationResult};
pub use validator::{FnFactory, Validator, ValidatorFactory};
