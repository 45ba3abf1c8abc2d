//! # Declarative Rule Sets
//!
//! Field mappings can be written as data (YAML or JSON) and lowered with a
//! [`FactoryRegistry`] that resolves rule names to leaf factories. Field
//! order in the document is preserved.
//!
//! ```yaml
//! fields:
//!   name:
//!     - rule: is-string
//!   email:
//!     - rule: is-string
//!     - rule: format
//!       options: { pattern: email }
//!       on: [create]
//!   emailConfirmation:
//!     rule: confirmation
//!     keys: [email]
//! ```
//!
//! A rule set can also extend an existing mapping. A field's value may
//! then be a directive instead of a rule list:
//!
//! ```yaml
//! fields:
//!   email: { append: [{ rule: uniqueness }] }
//!   name: { replace: [{ rule: length, options: 3 }] }
//!   nickname: remove
//! ```
//!
//! Directives follow the same rules as [`extend`](crate::extend::extend).

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crosscheck_core::{Options, UsageError, ValidatorFactory};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::builder::{validates, ValidationBuilder};
use crate::extend::{extend, Extension};
use crate::mapping::{FieldValidations, Rules};
use crate::validators::is::{PresenceGuard, TypeGuard, ValueKind};

/// Errors raised while loading or lowering a rule set.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A rule names a factory the registry does not know.
    #[error("unknown rule '{rule}' for field '{field}'")]
    UnknownRule {
        /// Field the rule was declared on.
        field: String,
        /// The unresolved rule name.
        rule: String,
    },

    /// The rule-set file could not be read or parsed.
    #[error("rule-set load error for '{path}': {reason}")]
    Load {
        /// Path to the rule-set file.
        path: String,
        /// Reason the file could not be loaded.
        reason: String,
    },

    /// The rule-set document is malformed.
    #[error("invalid rule-set document: {reason}")]
    Parse {
        /// Parser diagnostic.
        reason: String,
    },

    /// The rule set misuses the builder or extension directives.
    #[error("usage error: {0}")]
    Usage(#[from] UsageError),
}

/// Rule name → leaf factory.
#[derive(Clone, Default)]
pub struct FactoryRegistry {
    factories: HashMap<String, Arc<dyn ValidatorFactory>>,
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("rules", &self.names())
            .finish()
    }
}

impl FactoryRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the `is-*` guards.
    pub fn with_type_guards() -> Self {
        ValueKind::ALL
            .iter()
            .fold(Self::new(), |registry, kind| {
                registry.with(Arc::new(TypeGuard::new(*kind)))
            })
            .with(Arc::new(PresenceGuard))
    }

    /// Return this registry with `factory` registered under its name.
    pub fn with(mut self, factory: Arc<dyn ValidatorFactory>) -> Self {
        self.register(factory);
        self
    }

    /// Register `factory` under its name, returning any factory it displaced.
    pub fn register(
        &mut self,
        factory: Arc<dyn ValidatorFactory>,
    ) -> Option<Arc<dyn ValidatorFactory>> {
        let name = factory.name().to_string();
        let previous = self.factories.insert(name.clone(), factory);
        if previous.is_some() {
            tracing::warn!(rule = %name, "replacing registered validator factory");
        }
        previous
    }

    /// The factory registered as `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ValidatorFactory>> {
        self.factories.get(name).cloned()
    }

    /// Registered rule names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// One rule invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    /// Registered factory name.
    pub rule: String,
    /// Options handed to the factory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
    /// Contexts the rule is restricted to; empty means always active.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on: Vec<String>,
    /// Fields the rule depends on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
}

impl RuleSpec {
    /// Resolve this rule against `registry`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownRule`] if the rule is not registered.
    pub fn to_builder(
        &self,
        field: &str,
        registry: &FactoryRegistry,
    ) -> Result<ValidationBuilder, ConfigError> {
        let factory = registry
            .get(&self.rule)
            .ok_or_else(|| ConfigError::UnknownRule {
                field: field.to_string(),
                rule: self.rule.clone(),
            })?;
        let options = self.options.clone().map(Options::Value).unwrap_or_default();
        let mut builder = validates(factory, options);
        if !self.on.is_empty() {
            builder = builder.on(self.on.iter().cloned())?;
        }
        if !self.keys.is_empty() {
            builder = builder.keys(self.keys.iter().cloned())?;
        }
        Ok(builder)
    }
}

fn lower_rules(
    field: &str,
    specs: &[RuleSpec],
    registry: &FactoryRegistry,
) -> Result<Rules, ConfigError> {
    specs
        .iter()
        .map(|spec| spec.to_builder(field, registry).map(|b| b.build()))
        .collect::<Result<Vec<_>, _>>()
        .map(Rules::from)
}

/// An extension directive in a rule-set document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveSpec {
    /// `append: [...]`: add rules after the inherited ones.
    Append(Vec<RuleSpec>),
    /// `replace: [...]`: discard the inherited rules.
    Replace(Vec<RuleSpec>),
    /// `remove`: keep the field with no rules.
    Remove,
}

/// What a rule-set document says about one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    /// An ordered rule list.
    Rules(Vec<RuleSpec>),
    /// A single rule.
    Rule(RuleSpec),
    /// An extension directive.
    Directive(DirectiveSpec),
}

impl FieldSpec {
    fn to_extension(
        &self,
        field: &str,
        registry: &FactoryRegistry,
    ) -> Result<Extension, ConfigError> {
        Ok(match self {
            Self::Rules(specs) => Extension::Introduce(lower_rules(field, specs, registry)?),
            Self::Rule(spec) => {
                Extension::Introduce(lower_rules(field, std::slice::from_ref(spec), registry)?)
            }
            Self::Directive(DirectiveSpec::Append(specs)) => {
                Extension::Append(lower_rules(field, specs, registry)?)
            }
            Self::Directive(DirectiveSpec::Replace(specs)) => {
                Extension::Replace(lower_rules(field, specs, registry)?)
            }
            Self::Directive(DirectiveSpec::Remove) => Extension::Remove,
        })
    }
}

/// Field name → [`FieldSpec`], in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldSpecs(Vec<(String, FieldSpec)>);

impl FieldSpecs {
    /// Each field with its spec, in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.0.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the document declares no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for FieldSpecs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, spec) in &self.0 {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldSpecs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedFields;

        impl<'de> Visitor<'de> for OrderedFields {
            type Value = FieldSpecs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to rules")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldSpecs, A::Error> {
                let mut entries: Vec<(String, FieldSpec)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, spec)) = access.next_entry::<String, FieldSpec>()? {
                    match entries.iter_mut().find(|(existing, _)| *existing == name) {
                        Some(entry) => entry.1 = spec,
                        None => entries.push((name, spec)),
                    }
                }
                Ok(FieldSpecs(entries))
            }
        }

        deserializer.deserialize_map(OrderedFields)
    }
}

/// A rule-set document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSetConfig {
    /// Per-field rules or directives.
    #[serde(default)]
    pub fields: FieldSpecs,
}

impl RuleSetConfig {
    /// Parse a YAML rule set. An empty document is an empty rule set.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed YAML or an unexpected shape.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::warn!("empty rule-set document");
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            reason: format!("invalid YAML: {e}"),
        })
    }

    /// Parse a JSON rule set.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed JSON or an unexpected shape.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            reason: format!("invalid JSON: {e}"),
        })
    }

    /// Load a rule set from disk. `.yaml`/`.yml` files are read as YAML,
    /// anything else as JSON.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Load`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let load_error = |reason: String| ConfigError::Load {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| load_error(format!("cannot read file: {e}")))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let parsed = match ext {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        };
        let config = parsed.map_err(|e| load_error(e.to_string()))?;
        tracing::debug!(path = %path.display(), fields = config.fields.len(), "loaded rule set");
        Ok(config)
    }

    /// Lower this rule set to a fresh mapping.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownRule`] for unregistered rules, and
    /// [`ConfigError::Usage`] if the document uses a directive (there is
    /// nothing to extend).
    pub fn into_validations(
        &self,
        registry: &FactoryRegistry,
    ) -> Result<FieldValidations, ConfigError> {
        self.extend_validations(&FieldValidations::new(), registry)
    }

    /// Lower this rule set as an extension of `parent`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownRule`] for unregistered rules, and
    /// [`ConfigError::Usage`] for directive misuse.
    pub fn extend_validations(
        &self,
        parent: &FieldValidations,
        registry: &FactoryRegistry,
    ) -> Result<FieldValidations, ConfigError> {
        let extensions = self
            .fields
            .iter()
            .map(|(field, spec)| Ok((field.to_string(), spec.to_extension(field, registry)?)))
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(extend(parent, extensions)?)
    }
}
