//! # crosscheck-dsl — Authoring Validations
//!
//! The layer applications write against. Validations are composed with an
//! immutable builder algebra, grouped per field into mappings, derived from
//! one another with explicit extension directives, and optionally loaded
//! from YAML/JSON rule sets. Everything lowers to
//! [`crosscheck_core::Descriptor`] trees and runs on the core engine.
//!
//! ## Builders (`builder`)
//!
//! [`ValidationBuilder`] wraps a descriptor and offers `and_also`, `or`,
//! `and_then`, `catch`, `on` and `keys`. Each returns a new builder;
//! composing with the matching operator flattens instead of nesting.
//!
//! ## Structural validators (`validators`)
//!
//! Type guards (`is_object`, `is_array`, ..., `is_present`), object
//! validators (`fields`, `all_fields_present`, `no_fields_extra`, `object`,
//! `strict_object`) and array validators (`items`, `array`). Container validators prefix the
//! field name or element index onto nested error paths.
//!
//! ## Mappings and extension (`mapping`, `extend`)
//!
//! [`FieldValidations`] maps fields to rule lists. [`extend`] derives a new
//! mapping from a parent with `append`, `replace` and `remove`, rejecting
//! ambiguous redefinitions with a [`UsageError`].
//!
//! ## Rule-set configuration (`config`)
//!
//! [`RuleSetConfig`] is the serde form of a mapping, lowered through a
//! [`FactoryRegistry`] of named leaf factories.
//!
//! ## Crate Policy
//!
//! - Depends only on `crosscheck-core` internally.
//! - Builders, descriptors and mappings are never mutated after
//!   construction; every operation returns a new value.
//! - Misuse is reported as [`UsageError`] at construction time, never
//!   deferred to validation.

pub mod builder;
pub mod config;
pub mod extend;
pub mod mapping;
pub mod validators;

pub use builder::{build, validates, ValidationBuilder};
pub use config::{
    ConfigError, DirectiveSpec, FactoryRegistry, FieldSpec, FieldSpecs, RuleSetConfig, RuleSpec,
};
pub use extend::{append, extend, introduce, remove, replace, Extension};
pub use mapping::{on_all, validations, FieldValidations, Rules};
pub use validators::{
    all_fields_present, array, fields, is_array, is_boolean, is_number, is_object, is_present,
    is_string, items, no_fields_extra, object, strict_object, Record, ValueKind,
};

pub use crosscheck_core::UsageError;
