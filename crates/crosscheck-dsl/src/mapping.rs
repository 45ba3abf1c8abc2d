//! # Field Validation Mappings
//!
//! A [`FieldValidations`] maps field names to ordered lists of rules, the
//! form an application uses to declare "what a valid `User` looks like".
//! Each list is an implicit `and`: every rule runs and every failure is
//! reported.
//!
//! ## Rule lists
//!
//! [`Rules`] accepts whatever an author naturally writes for one field: a
//! single builder, a list of builders, lowered descriptors, or a mix via
//! the [`rules!`](crate::rules) macro. Builders of different input and
//! output types may share one list because they are lowered on entry.
//!
//! ## Dependent keys
//!
//! A rule declared with `keys([...])` depends on other fields (a
//! confirmation depends on the field it confirms). [`dependents_of`]
//! answers "which fields must be revalidated when this one changes".
//!
//! [`dependents_of`]: FieldValidations::dependents_of

use crosscheck_core::{
    validate, Descriptor, DescriptorKind, Environment, FieldDescriptors, Options, UsageError,
    ValidationResult,
};
use serde_json::Value;

use crate::builder::ValidationBuilder;
use crate::validators::object::fields;

/// The ordered rules for one field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rules(Vec<Descriptor>);

impl Rules {
    /// An empty rule list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return these rules with `rule` appended.
    pub fn with(mut self, rule: impl Into<Descriptor>) -> Self {
        self.0.push(rule.into());
        self
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list has no rules.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The rules as lowered descriptors.
    pub fn as_slice(&self) -> &[Descriptor] {
        &self.0
    }

    /// Consume the list, yielding its descriptors.
    pub fn into_descriptors(self) -> Vec<Descriptor> {
        self.0
    }
}

impl From<Descriptor> for Rules {
    fn from(descriptor: Descriptor) -> Self {
        Self(vec![descriptor])
    }
}

impl From<Vec<Descriptor>> for Rules {
    fn from(descriptors: Vec<Descriptor>) -> Self {
        Self(descriptors)
    }
}

impl<T, U> From<ValidationBuilder<T, U>> for Rules {
    fn from(builder: ValidationBuilder<T, U>) -> Self {
        Self(vec![builder.build()])
    }
}

impl<T, U> From<Vec<ValidationBuilder<T, U>>> for Rules {
    fn from(builders: Vec<ValidationBuilder<T, U>>) -> Self {
        builders.iter().map(ValidationBuilder::build).collect()
    }
}

impl<T, U, const N: usize> From<[ValidationBuilder<T, U>; N]> for Rules {
    fn from(builders: [ValidationBuilder<T, U>; N]) -> Self {
        builders.iter().map(ValidationBuilder::build).collect()
    }
}

impl FromIterator<Descriptor> for Rules {
    fn from_iter<I: IntoIterator<Item = Descriptor>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build a [`Rules`] list from builders or descriptors of any types.
///
/// ```ignore
/// let name = rules![is_string(), validates(presence, Options::None)];
/// ```
#[macro_export]
macro_rules! rules {
    ($($rule:expr),* $(,)?) => {
        $crate::Rules::new()$(.with($rule))*
    };
}

/// Field name → ordered rules, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldValidations {
    entries: Vec<(String, Vec<Descriptor>)>,
}

impl FieldValidations {
    /// An empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: Vec<(String, Vec<Descriptor>)>) -> Self {
        Self { entries }
    }

    /// Return a mapping with `field` set to `rules`.
    ///
    /// Re-declaring a field replaces its rules in place.
    pub fn with_field(mut self, field: impl Into<String>, rules: impl Into<Rules>) -> Self {
        let field = field.into();
        let descriptors = rules.into().into_descriptors();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = descriptors,
            None => self.entries.push((field, descriptors)),
        }
        self
    }

    /// The rules declared for `field`.
    pub fn get(&self, field: &str) -> Option<&[Descriptor]> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, rules)| rules.as_slice())
    }

    /// Whether `field` is declared, even with an empty rule list.
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Each field with its rules, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Descriptor])> {
        self.entries
            .iter()
            .map(|(name, rules)| (name.as_str(), rules.as_slice()))
    }

    /// Declared field names, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no field is declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fields with a rule that declares `key` as a dependency, in
    /// declaration order. Nested descriptors are searched too.
    pub fn dependents_of(&self, key: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, rules)| rules.iter().any(|rule| depends_on(rule, key)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Lower the mapping to a single `fields` descriptor: each field's
    /// rules become one `and`.
    pub fn to_descriptor(&self) -> Descriptor {
        let shape: FieldDescriptors = self
            .entries
            .iter()
            .map(|(name, rules)| (name.clone(), Descriptor::and(rules.clone())))
            .collect();
        fields(shape).build()
    }

    /// Validate an object value against every field's rules.
    ///
    /// # Errors
    ///
    /// Propagates the first [`RunError`](crosscheck_core::RunError) raised
    /// by any rule.
    pub async fn validate(
        &self,
        env: &dyn Environment,
        value: &Value,
        context: Option<&str>,
    ) -> ValidationResult {
        let descriptor = self.to_descriptor();
        validate(env, value, &descriptor, context).await
    }
}

/// Whether `descriptor` or anything it wraps declares `key`.
///
/// Descends through combinators, `catch` wrappers and the descriptors a
/// container leaf carries in its options (`items`, `fields`).
fn depends_on(descriptor: &Descriptor, key: &str) -> bool {
    if descriptor.keys().iter().any(|k| k == key) {
        return true;
    }
    match descriptor.kind() {
        DescriptorKind::Chain(children)
        | DescriptorKind::And(children)
        | DescriptorKind::Or(children) => children.iter().any(|child| depends_on(child, key)),
        DescriptorKind::MapError { descriptor, .. } => depends_on(descriptor, key),
        DescriptorKind::Leaf { options, .. } => match options {
            Options::Descriptor(nested) => depends_on(nested, key),
            Options::Fields(shape) => shape.iter().any(|(_, nested)| depends_on(nested, key)),
            Options::None | Options::Value(_) => false,
        },
    }
}

/// Build a mapping from `(field, rules)` pairs.
pub fn validations<I, K, R>(entries: I) -> FieldValidations
where
    I: IntoIterator<Item = (K, R)>,
    K: Into<String>,
    R: Into<Rules>,
{
    entries
        .into_iter()
        .fold(FieldValidations::new(), |acc, (field, rules)| {
            acc.with_field(field, rules)
        })
}

/// Restrict every rule in `rules` to `contexts`.
///
/// # Errors
///
/// [`UsageError::MissingContexts`] if `contexts` is empty.
pub fn on_all<I, S>(contexts: I, rules: impl Into<Rules>) -> Result<Rules, UsageError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let contexts: Vec<String> = contexts.into_iter().map(Into::into).collect();
    if contexts.is_empty() {
        return Err(UsageError::MissingContexts);
    }
    Ok(rules
        .into()
        .into_descriptors()
        .into_iter()
        .map(|rule| rule.with_contexts(contexts.clone()))
        .collect())
}
