//! # Extending Field Mappings
//!
//! [`extend`] derives a child mapping from a parent without touching the
//! parent. Each field in the extension set carries exactly one directive:
//!
//! | Directive | Parent defines field | Parent lacks field |
//! |-----------|----------------------|--------------------|
//! | plain rules / [`introduce`] | `AmbiguousExtension` | field added |
//! | [`append`] | rules appended | `NoExistingValidations` |
//! | [`replace`] | rules replaced | `NoExistingValidations` |
//! | [`remove`] | rules cleared (field kept, empty) | `NoExistingValidations` |
//!
//! `append` and `replace` with an empty list are rejected
//! (`EmptyAppend`, `EmptyReplace`). Fields the extension does not mention
//! are inherited unchanged.
//!
//! ## Ordering
//!
//! The result lists the parent's fields first, in the parent's order, then
//! newly introduced fields in extension order. When a field appears more
//! than once in one extension set, the later directive wins.
//!
//! ## Errors
//!
//! The first misuse aborts the whole extension: parent fields are checked
//! in parent order, then new fields in extension order. No partial mapping
//! is produced.

use crosscheck_core::{Descriptor, UsageError};

use crate::builder::ValidationBuilder;
use crate::mapping::{FieldValidations, Rules};

/// What an extension does to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    /// Define a field the parent does not have.
    Introduce(Rules),
    /// Add rules after the parent's.
    Append(Rules),
    /// Discard the parent's rules and use these.
    Replace(Rules),
    /// Keep the field with no rules.
    Remove,
}

impl Extension {
    /// The directive name used in error messages.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Introduce(_) => "introduce",
            Self::Append(_) => "append",
            Self::Replace(_) => "replace",
            Self::Remove => "remove",
        }
    }
}

impl From<Rules> for Extension {
    fn from(rules: Rules) -> Self {
        Self::Introduce(rules)
    }
}

impl From<Descriptor> for Extension {
    fn from(descriptor: Descriptor) -> Self {
        Self::Introduce(descriptor.into())
    }
}

impl<T, U> From<ValidationBuilder<T, U>> for Extension {
    fn from(builder: ValidationBuilder<T, U>) -> Self {
        Self::Introduce(builder.into())
    }
}

impl<T, U> From<Vec<ValidationBuilder<T, U>>> for Extension {
    fn from(builders: Vec<ValidationBuilder<T, U>>) -> Self {
        Self::Introduce(builders.into())
    }
}

impl<T, U, const N: usize> From<[ValidationBuilder<T, U>; N]> for Extension {
    fn from(builders: [ValidationBuilder<T, U>; N]) -> Self {
        Self::Introduce(builders.into())
    }
}

/// Define a new field. Equivalent to passing the rules directly.
pub fn introduce(rules: impl Into<Rules>) -> Extension {
    Extension::Introduce(rules.into())
}

/// Add `rules` after the parent's rules for the field.
pub fn append(rules: impl Into<Rules>) -> Extension {
    Extension::Append(rules.into())
}

/// Replace the parent's rules for the field with `rules`.
pub fn replace(rules: impl Into<Rules>) -> Extension {
    Extension::Replace(rules.into())
}

/// Clear the parent's rules for the field.
pub fn remove() -> Extension {
    Extension::Remove
}

fn merge(
    field: &str,
    existing: &[Descriptor],
    extension: Extension,
) -> Result<Vec<Descriptor>, UsageError> {
    match extension {
        Extension::Introduce(_) => Err(UsageError::AmbiguousExtension {
            field: field.to_string(),
        }),
        Extension::Append(rules) if rules.is_empty() => Err(UsageError::EmptyAppend {
            field: field.to_string(),
        }),
        Extension::Append(rules) => Ok(existing
            .iter()
            .cloned()
            .chain(rules.into_descriptors())
            .collect()),
        Extension::Replace(rules) if rules.is_empty() => Err(UsageError::EmptyReplace {
            field: field.to_string(),
        }),
        Extension::Replace(rules) => Ok(rules.into_descriptors()),
        Extension::Remove => Ok(Vec::new()),
    }
}

fn introduce_field(field: &str, extension: Extension) -> Result<Vec<Descriptor>, UsageError> {
    match extension {
        Extension::Introduce(rules) => Ok(rules.into_descriptors()),
        other => Err(UsageError::NoExistingValidations {
            directive: other.directive(),
            field: field.to_string(),
        }),
    }
}

/// Derive a new mapping from `parent` and an extension set.
///
/// # Errors
///
/// Returns the first [`UsageError`] found; see the module docs for the
/// directive rules.
pub fn extend<I, K, E>(
    parent: &FieldValidations,
    extensions: I,
) -> Result<FieldValidations, UsageError>
where
    I: IntoIterator<Item = (K, E)>,
    K: Into<String>,
    E: Into<Extension>,
{
    let mut pending: Vec<(String, Extension)> = Vec::new();
    for (field, extension) in extensions {
        let field = field.into();
        let extension = extension.into();
        match pending.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = extension,
            None => pending.push((field, extension)),
        }
    }

    let mut merged = Vec::with_capacity(parent.len() + pending.len());
    for (field, existing) in parent.iter() {
        let descriptors = match pending.iter().position(|(name, _)| name == field) {
            Some(index) => {
                let (_, extension) = pending.remove(index);
                tracing::debug!(
                    field,
                    directive = extension.directive(),
                    "extending inherited field"
                );
                merge(field, existing, extension)?
            }
            None => existing.to_vec(),
        };
        merged.push((field.to_string(), descriptors));
    }

    for (field, extension) in pending {
        tracing::debug!(
            field = field.as_str(),
            directive = extension.directive(),
            "introducing field"
        );
        let descriptors = introduce_field(&field, extension)?;
        merged.push((field, descriptors));
    }

    Ok(FieldValidations::from_entries(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::validates;
    use crosscheck_core::{FnFactory, Options};
    use serde_json::Value;
    use std::sync::Arc;

    fn rule(name: &str) -> ValidationBuilder {
        validates(
            Arc::new(FnFactory::new(name, |_: &Value, _: &Options| Vec::new())),
            Options::None,
        )
    }

    fn names(mapping: &FieldValidations, field: &str) -> Vec<String> {
        mapping
            .get(field)
            .unwrap_or_default()
            .iter()
            .map(|d| d.name().to_string())
            .collect()
    }

    fn user() -> FieldValidations {
        FieldValidations::new()
            .with_field("name", rule("presence"))
            .with_field("email", [rule("presence"), rule("email")])
    }

    #[test]
    fn test_unmentioned_fields_inherited() {
        let child = extend(&user(), Vec::<(String, Extension)>::new()).unwrap();
        assert_eq!(child, user());
    }

    #[test]
    fn test_introduce_new_field() {
        let child = extend(&user(), [("password", rule("length"))]).unwrap();
        assert_eq!(
            child.field_names().collect::<Vec<_>>(),
            vec!["name", "email", "password"]
        );
        assert_eq!(names(&child, "password"), vec!["length"]);
    }

    #[test]
    fn test_plain_rules_on_existing_field_are_ambiguous() {
        let err = extend(&user(), [("email", rule("uniqueness"))]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "`email` already has existing validations; use `append()` or `replace()` to add or completely replace validations"
        );
    }

    #[test]
    fn test_append_and_replace() {
        let child = extend(
            &user(),
            [
                ("email", append(rule("uniqueness"))),
                ("name", replace(rule("length"))),
            ],
        )
        .unwrap();
        assert_eq!(names(&child, "email"), vec!["presence", "email", "uniqueness"]);
        assert_eq!(names(&child, "name"), vec!["length"]);
        assert_eq!(child.field_names().collect::<Vec<_>>(), vec!["name", "email"]);
    }

    #[test]
    fn test_remove_keeps_field_empty() {
        let child = extend(&user(), [("email", remove())]).unwrap();
        assert!(child.contains("email"));
        assert!(names(&child, "email").is_empty());
    }

    #[test]
    fn test_directives_require_existing_field() {
        for (extension, directive) in [
            (append(rule("a")), "append"),
            (replace(rule("a")), "replace"),
            (remove(), "remove"),
        ] {
            let err = extend(&user(), [("password", extension)]).unwrap_err();
            assert_eq!(
                err,
                UsageError::NoExistingValidations {
                    directive,
                    field: "password".into()
                }
            );
        }
    }

    #[test]
    fn test_empty_append_and_replace_rejected() {
        let err = extend(&user(), [("email", append(Rules::new()))]).unwrap_err();
        assert_eq!(err, UsageError::EmptyAppend { field: "email".into() });
        let err = extend(&user(), [("email", replace(Rules::new()))]).unwrap_err();
        assert_eq!(err, UsageError::EmptyReplace { field: "email".into() });
    }

    #[test]
    fn test_later_directive_wins() {
        let child = extend(
            &user(),
            [("email", append(rule("a"))), ("email", replace(rule("b")))],
        )
        .unwrap();
        assert_eq!(names(&child, "email"), vec!["b"]);
    }

    #[test]
    fn test_parent_untouched_by_failed_extension() {
        let parent = user();
        let before = parent.clone();
        assert!(extend(&parent, [("email", append(rule("x"))), ("nope", remove())]).is_err());
        assert_eq!(parent, before);
    }
}
