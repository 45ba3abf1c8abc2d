//! # Validation Descriptors
//!
//! A [`Descriptor`] is inert data: which behavior to run, how it is
//! configured, the contexts it is active in, and the fields it depends on.
//! It has no logic of its own; the [`engine`](crate::engine) interprets it.
//!
//! ## Combinator tagging
//!
//! Composite behaviors are tagged variants of [`DescriptorKind`] rather
//! than opaque factories, so the builder layer can recognize "this is
//! already an `and`" and flatten further composition into it, and
//! equality/cloning work across crate boundaries without comparing
//! function pointers.
//!
//! ## Immutability
//!
//! Descriptors expose no mutating accessors. The `with_*` methods consume
//! the receiver and return a new value, so a descriptor that has been
//! shared (cloned into a builder, a field mapping, a parent rule set) can
//! never be changed underneath its other owners.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ValidationError;
use crate::validator::ValidatorFactory;

/// Pure function applied to a non-empty error list by `map_error`.
#[derive(Clone)]
pub struct ErrorTransform(Arc<dyn Fn(Vec<ValidationError>) -> Vec<ValidationError> + Send + Sync>);

impl ErrorTransform {
    /// Wrap a transform function.
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(Vec<ValidationError>) -> Vec<ValidationError> + Send + Sync + 'static,
    {
        Self(Arc::new(transform))
    }

    /// Apply the transform.
    pub fn apply(&self, errors: Vec<ValidationError>) -> Vec<ValidationError> {
        (self.0)(errors)
    }
}

impl fmt::Debug for ErrorTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorTransform(..)")
    }
}

impl PartialEq for ErrorTransform {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// The combinator tag of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombinatorKind {
    /// Sequential, stops at the first failing child.
    Chain,
    /// Sequential, runs every child and concatenates.
    And,
    /// Sequential, stops at the first succeeding child.
    Or,
    /// Runs one child and rewrites its errors.
    MapError,
    /// A rule provided by a [`ValidatorFactory`].
    Leaf,
}

impl CombinatorKind {
    /// Descriptor name used for composite kinds.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chain => "chain",
            Self::And => "and",
            Self::Or => "or",
            Self::MapError => "map-error",
            Self::Leaf => "leaf",
        }
    }
}

impl fmt::Display for CombinatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration handed to a leaf factory.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Options {
    /// The rule takes no configuration.
    #[default]
    None,
    /// Arbitrary JSON configuration (`length: 6`, `{ tlds: [...] }`).
    Value(Value),
    /// A single nested descriptor, e.g. the element rule of `items`.
    Descriptor(Box<Descriptor>),
    /// Ordered per-field descriptors, e.g. the shape of `fields`.
    Fields(FieldDescriptors),
}

impl Options {
    /// The JSON configuration, if that is what these options hold.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The nested descriptor, if that is what these options hold.
    pub fn as_descriptor(&self) -> Option<&Descriptor> {
        match self {
            Self::Descriptor(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    /// The per-field descriptors, if that is what these options hold.
    pub fn as_fields(&self) -> Option<&FieldDescriptors> {
        match self {
            Self::Fields(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<Value> for Options {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Field name → descriptor, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldDescriptors {
    entries: Vec<(String, Descriptor)>,
}

impl FieldDescriptors {
    /// An empty shape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a shape with `field` set to `descriptor`.
    ///
    /// Re-declaring a field keeps its original position.
    pub fn with(mut self, field: impl Into<String>, descriptor: impl Into<Descriptor>) -> Self {
        let field = field.into();
        let descriptor = descriptor.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = descriptor,
            None => self.entries.push((field, descriptor)),
        }
        self
    }

    /// Look up a field.
    pub fn get(&self, field: &str) -> Option<&Descriptor> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, descriptor)| descriptor)
    }

    /// Whether `field` is declared.
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Declared field names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Declared fields and their descriptors, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Descriptor)> {
        self.entries.iter().map(|(name, d)| (name.as_str(), d))
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, D> FromIterator<(K, D)> for FieldDescriptors
where
    K: Into<String>,
    D: Into<Descriptor>,
{
    fn from_iter<I: IntoIterator<Item = (K, D)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |shape, (field, descriptor)| shape.with(field, descriptor))
    }
}

/// What a descriptor runs.
#[derive(Clone)]
pub enum DescriptorKind {
    /// Run children in order, stop at the first failure.
    Chain(Vec<Descriptor>),
    /// Run every child in order, concatenate failures.
    And(Vec<Descriptor>),
    /// Run children in order, stop at the first success.
    Or(Vec<Descriptor>),
    /// Run `descriptor`, pass failures through `transform`.
    MapError {
        /// The wrapped descriptor.
        descriptor: Box<Descriptor>,
        /// Applied only when `descriptor` fails.
        transform: ErrorTransform,
    },
    /// A rule from an external factory.
    Leaf {
        /// The factory constructing the rule.
        factory: Arc<dyn ValidatorFactory>,
        /// Its configuration.
        options: Options,
    },
}

impl DescriptorKind {
    /// The combinator tag.
    pub fn combinator(&self) -> CombinatorKind {
        match self {
            Self::Chain(_) => CombinatorKind::Chain,
            Self::And(_) => CombinatorKind::And,
            Self::Or(_) => CombinatorKind::Or,
            Self::MapError { .. } => CombinatorKind::MapError,
            Self::Leaf { .. } => CombinatorKind::Leaf,
        }
    }
}

impl fmt::Debug for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chain(children) => f.debug_tuple("Chain").field(children).finish(),
            Self::And(children) => f.debug_tuple("And").field(children).finish(),
            Self::Or(children) => f.debug_tuple("Or").field(children).finish(),
            Self::MapError { descriptor, .. } => f
                .debug_struct("MapError")
                .field("descriptor", descriptor)
                .finish_non_exhaustive(),
            Self::Leaf { factory, options } => f
                .debug_struct("Leaf")
                .field("factory", &factory.name())
                .field("options", options)
                .finish(),
        }
    }
}

impl PartialEq for DescriptorKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Chain(a), Self::Chain(b))
            | (Self::And(a), Self::And(b))
            | (Self::Or(a), Self::Or(b)) => a == b,
            (
                Self::MapError {
                    descriptor: a,
                    transform: ta,
                },
                Self::MapError {
                    descriptor: b,
                    transform: tb,
                },
            ) => a == b && ta == tb,
            (
                Self::Leaf {
                    factory: fa,
                    options: oa,
                },
                Self::Leaf {
                    factory: fb,
                    options: ob,
                },
            ) => fa.name() == fb.name() && oa == ob,
            _ => false,
        }
    }
}

/// An immutable validation descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    name: String,
    kind: DescriptorKind,
    contexts: Vec<String>,
    keys: Vec<String>,
}

impl Descriptor {
    fn composite(kind: DescriptorKind) -> Self {
        Self {
            name: kind.combinator().as_str().to_string(),
            kind,
            contexts: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// A leaf rule, named after its factory.
    pub fn leaf(factory: Arc<dyn ValidatorFactory>, options: Options) -> Self {
        Self {
            name: factory.name().to_string(),
            kind: DescriptorKind::Leaf { factory, options },
            contexts: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// `chain` over `children`.
    pub fn chain(children: Vec<Descriptor>) -> Self {
        Self::composite(DescriptorKind::Chain(children))
    }

    /// `and` over `children`.
    pub fn and(children: Vec<Descriptor>) -> Self {
        Self::composite(DescriptorKind::And(children))
    }

    /// `or` over `children`.
    pub fn or(children: Vec<Descriptor>) -> Self {
        Self::composite(DescriptorKind::Or(children))
    }

    /// `map_error` around `descriptor`.
    pub fn map_error(descriptor: Descriptor, transform: ErrorTransform) -> Self {
        Self::composite(DescriptorKind::MapError {
            descriptor: Box::new(descriptor),
            transform,
        })
    }

    /// This descriptor restricted to `contexts` (empty = always active).
    pub fn with_contexts(self, contexts: Vec<String>) -> Self {
        Self { contexts, ..self }
    }

    /// This descriptor with dependent `keys`.
    pub fn with_keys(self, keys: Vec<String>) -> Self {
        Self { keys, ..self }
    }

    /// Descriptor name (factory name or combinator name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What this descriptor runs.
    pub fn kind(&self) -> &DescriptorKind {
        &self.kind
    }

    /// The combinator tag.
    pub fn combinator(&self) -> CombinatorKind {
        self.kind.combinator()
    }

    /// Contexts this descriptor is restricted to.
    pub fn contexts(&self) -> &[String] {
        &self.contexts
    }

    /// Dependent field names.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Child descriptors of a `chain`/`and`/`or`.
    pub fn children(&self) -> Option<&[Descriptor]> {
        match &self.kind {
            DescriptorKind::Chain(children)
            | DescriptorKind::And(children)
            | DescriptorKind::Or(children) => Some(children),
            _ => None,
        }
    }

    /// Whether this descriptor runs under `context`.
    ///
    /// Unrestricted descriptors always run; restricted ones run only when
    /// the active context is one of theirs.
    pub fn is_active(&self, context: Option<&str>) -> bool {
        if self.contexts.is_empty() {
            return true;
        }
        context.is_some_and(|active| self.contexts.iter().any(|c| c == active))
    }
}
