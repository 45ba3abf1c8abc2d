//! # Builder Algebra
//!
//! [`ValidationBuilder`] is the author-facing way to compose descriptors.
//! Every operator borrows the receiver and returns a new builder, so one
//! base builder can be extended in several directions without the branches
//! affecting each other.
//!
//! ## Shapes
//!
//! A builder is one of five shapes: a base (a single leaf or `map_error`
//! descriptor), an `and`, an `or`, a `chain`, or a context-scoped wrapper
//! around one of those. Composing with the operator that matches the
//! receiver's shape appends to its child list instead of nesting:
//!
//! ```text
//! a.and_also(b).and_also(c)   => and[a, b, c]
//! a.and_then(b).and_then(c)   => chain[a, b, c]
//! a.and_also(b).or(c)         => or[and[a, b], c]
//! a.catch(f).catch(g)         => map_error(map_error(a, f), g)
//! ```
//!
//! A context-scoped builder is opaque to flattening: composing it nests
//! the scoped descriptor as a child of a new composite, and the composite
//! is scoped to the same contexts. Outside them the whole result is inert.
//!
//! ## Type tracking
//!
//! `ValidationBuilder<T, U>` validates a `T` and, on success, vouches that
//! the value is a `U`. The parameters are phantom; values are always
//! `serde_json::Value` at run time. `and_then` feeds the receiver's `U`
//! into the next stage's input, so `is_object().and_then(fields(..))`
//! type-checks while `is_string().and_then(fields(..))` does not.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crosscheck_core::{
    Descriptor, DescriptorKind, ErrorTransform, Options, UsageError, ValidationError,
    ValidatorFactory,
};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Base(Descriptor),
    And(Vec<Descriptor>),
    Or(Vec<Descriptor>),
    Chain(Vec<Descriptor>),
    On {
        inner: Box<Node>,
        contexts: Vec<String>,
    },
}

impl Node {
    fn lower(&self) -> Descriptor {
        match self {
            Node::Base(descriptor) => descriptor.clone(),
            Node::And(children) => Descriptor::and(children.clone()),
            Node::Or(children) => Descriptor::or(children.clone()),
            Node::Chain(children) => Descriptor::chain(children.clone()),
            Node::On { inner, contexts } => inner.lower().with_contexts(contexts.clone()),
        }
    }
}

impl Node {
    /// Wrap `node` in this node's contexts, if it has any.
    fn scope(&self, node: Node) -> Node {
        match self {
            Node::On { contexts, .. } => Node::On {
                inner: Box::new(node),
                contexts: contexts.clone(),
            },
            _ => node,
        }
    }
}

fn appended(children: &[Descriptor], next: Descriptor) -> Vec<Descriptor> {
    children.iter().cloned().chain(std::iter::once(next)).collect()
}

/// An immutable, composable description of a validation.
pub struct ValidationBuilder<T = Value, U = T> {
    node: Node,
    keys: Vec<String>,
    _types: PhantomData<fn(T) -> U>,
}

impl<T, U> Clone for ValidationBuilder<T, U> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            keys: self.keys.clone(),
            _types: PhantomData,
        }
    }
}

impl<T, U> fmt::Debug for ValidationBuilder<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationBuilder")
            .field("node", &self.node)
            .field("keys", &self.keys)
            .finish()
    }
}

impl<T, U> ValidationBuilder<T, U> {
    fn from_parts(node: Node, keys: Vec<String>) -> Self {
        Self {
            node,
            keys,
            _types: PhantomData,
        }
    }

    /// A base builder around `factory` configured with `options`.
    pub fn new(factory: Arc<dyn ValidatorFactory>, options: impl Into<Options>) -> Self {
        Self::from_parts(Node::Base(Descriptor::leaf(factory, options.into())), Vec::new())
    }

    /// Rebuild a builder from an existing descriptor.
    ///
    /// The combinator tag selects the shape, so composing the result keeps
    /// flattening into an existing `and`/`or`/`chain`. A descriptor with
    /// contexts comes back as a context-scoped builder.
    pub fn from_descriptor(descriptor: &Descriptor) -> Self {
        let node = match descriptor.kind() {
            DescriptorKind::And(children) => Node::And(children.clone()),
            DescriptorKind::Or(children) => Node::Or(children.clone()),
            DescriptorKind::Chain(children) => Node::Chain(children.clone()),
            DescriptorKind::MapError { .. } | DescriptorKind::Leaf { .. } => Node::Base(
                descriptor
                    .clone()
                    .with_contexts(Vec::new())
                    .with_keys(Vec::new()),
            ),
        };
        let node = if descriptor.contexts().is_empty() {
            node
        } else {
            Node::On {
                inner: Box::new(node),
                contexts: descriptor.contexts().to_vec(),
            }
        };
        Self::from_parts(node, descriptor.keys().to_vec())
    }

    /// Run `other` as well, reporting the failures of both.
    pub fn and_also<U2>(&self, other: ValidationBuilder<T, U2>) -> ValidationBuilder<T, U> {
        match &self.node {
            Node::And(children) => ValidationBuilder::from_parts(
                Node::And(appended(children, other.build())),
                self.keys.clone(),
            ),
            node => ValidationBuilder::from_parts(
                node.scope(Node::And(vec![self.build(), other.build()])),
                Vec::new(),
            ),
        }
    }

    /// Accept the value if either this or `other` accepts it.
    ///
    /// Which branch succeeded is not known statically, so the result only
    /// vouches for the input type.
    pub fn or<U2>(&self, other: ValidationBuilder<T, U2>) -> ValidationBuilder<T, T> {
        match &self.node {
            Node::Or(children) => ValidationBuilder::from_parts(
                Node::Or(appended(children, other.build())),
                self.keys.clone(),
            ),
            node => ValidationBuilder::from_parts(
                node.scope(Node::Or(vec![self.build(), other.build()])),
                Vec::new(),
            ),
        }
    }

    /// Run `next` only if this validation passes; `next` may assume the
    /// refined type `U`.
    pub fn and_then<U2>(&self, next: ValidationBuilder<U, U2>) -> ValidationBuilder<T, U2> {
        match &self.node {
            Node::Chain(children) => ValidationBuilder::from_parts(
                Node::Chain(appended(children, next.build())),
                self.keys.clone(),
            ),
            node => ValidationBuilder::from_parts(
                node.scope(Node::Chain(vec![self.build(), next.build()])),
                Vec::new(),
            ),
        }
    }

    /// Rewrite this validation's errors when it fails.
    ///
    /// `transform` is never called on success, and its output replaces the
    /// original errors entirely. Each `catch` adds its own wrapper, which
    /// keeps the receiver's contexts and keys.
    pub fn catch<F>(&self, transform: F) -> ValidationBuilder<T, U>
    where
        F: Fn(Vec<ValidationError>) -> Vec<ValidationError> + Send + Sync + 'static,
    {
        let wrapper = Node::Base(Descriptor::map_error(self.build(), ErrorTransform::new(transform)));
        ValidationBuilder::from_parts(self.node.scope(wrapper), self.keys.clone())
    }

    /// Restrict this validation to the given contexts.
    ///
    /// Calling `on` on an already scoped builder replaces its contexts.
    ///
    /// # Errors
    ///
    /// [`UsageError::MissingContexts`] if `contexts` is empty.
    pub fn on<I, S>(&self, contexts: I) -> Result<ValidationBuilder<T, U>, UsageError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let contexts: Vec<String> = contexts.into_iter().map(Into::into).collect();
        if contexts.is_empty() {
            return Err(UsageError::MissingContexts);
        }
        let inner = match &self.node {
            Node::On { inner, .. } => inner.clone(),
            node => Box::new(node.clone()),
        };
        Ok(ValidationBuilder::from_parts(
            Node::On { inner, contexts },
            self.keys.clone(),
        ))
    }

    /// Declare the fields this validation depends on.
    ///
    /// # Errors
    ///
    /// [`UsageError::MissingKeys`] if `keys` is empty.
    pub fn keys<I, S>(&self, keys: I) -> Result<ValidationBuilder<T, U>, UsageError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Err(UsageError::MissingKeys);
        }
        Ok(ValidationBuilder::from_parts(self.node.clone(), keys))
    }

    /// Lower this builder to a descriptor.
    pub fn build(&self) -> Descriptor {
        self.node.lower().with_keys(self.keys.clone())
    }
}

impl<T, U> From<ValidationBuilder<T, U>> for Descriptor {
    fn from(builder: ValidationBuilder<T, U>) -> Self {
        builder.build()
    }
}

impl<T, U> From<&ValidationBuilder<T, U>> for Descriptor {
    fn from(builder: &ValidationBuilder<T, U>) -> Self {
        builder.build()
    }
}

/// A base builder over untyped JSON.
pub fn validates(factory: Arc<dyn ValidatorFactory>, options: impl Into<Options>) -> ValidationBuilder {
    ValidationBuilder::new(factory, options)
}

/// Lower `builder` to a descriptor.
pub fn build<T, U>(builder: &ValidationBuilder<T, U>) -> Descriptor {
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosscheck_core::{validate_json, CombinatorKind, ErrorMessage, FnFactory};
    use serde_json::json;

    fn factory(name: &str) -> Arc<dyn ValidatorFactory> {
        Arc::new(FnFactory::new(name, |_: &Value, _: &Options| Vec::new()))
    }

    fn rule(name: &str) -> ValidationBuilder {
        validates(factory(name), Options::None)
    }

    fn leaf(name: &str) -> Descriptor {
        Descriptor::leaf(factory(name), Options::None)
    }

    fn scoped(d: Descriptor, contexts: &[&str]) -> Descriptor {
        d.with_contexts(contexts.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn test_validates_builds_leaf() {
        let d = validates(factory("length"), json!(6)).build();
        assert_eq!(d.name(), "length");
        assert_eq!(d, Descriptor::leaf(factory("length"), Options::Value(json!(6))));
    }

    #[test]
    fn test_and_also_flattens() {
        let d = rule("a").and_also(rule("b")).and_also(rule("c")).build();
        assert_eq!(d, Descriptor::and(vec![leaf("a"), leaf("b"), leaf("c")]));
    }

    #[test]
    fn test_or_flattens() {
        let d = rule("a").or(rule("b")).or(rule("c")).build();
        assert_eq!(d, Descriptor::or(vec![leaf("a"), leaf("b"), leaf("c")]));
    }

    #[test]
    fn test_and_then_flattens() {
        let d = rule("a").and_then(rule("b")).and_then(rule("c")).build();
        assert_eq!(d, Descriptor::chain(vec![leaf("a"), leaf("b"), leaf("c")]));
    }

    #[test]
    fn test_mixed_operators_nest() {
        let d = rule("a").and_also(rule("b")).or(rule("c")).build();
        assert_eq!(
            d,
            Descriptor::or(vec![Descriptor::and(vec![leaf("a"), leaf("b")]), leaf("c")])
        );

        let d = rule("a").and_then(rule("b").and_also(rule("c"))).build();
        assert_eq!(
            d,
            Descriptor::chain(vec![leaf("a"), Descriptor::and(vec![leaf("b"), leaf("c")])])
        );
    }

    #[test]
    fn test_catch_never_flattens() {
        let d = rule("a")
            .catch(|errors| errors)
            .catch(|_| vec![ValidationError::new(ErrorMessage::named("x"))])
            .build();
        assert_eq!(d.combinator(), CombinatorKind::MapError);
        match d.kind() {
            DescriptorKind::MapError { descriptor, .. } => {
                assert_eq!(descriptor.combinator(), CombinatorKind::MapError);
            }
            other => panic!("expected map-error, got {other:?}"),
        }
    }

    #[test]
    fn test_on_requires_context() {
        let err = rule("presence").on(Vec::<String>::new()).unwrap_err();
        assert_eq!(err, UsageError::MissingContexts);
        assert_eq!(err.to_string(), "you must provide at least one validation context");
    }

    #[test]
    fn test_on_scopes_same_behavior() {
        let d = rule("presence").on(["create", "update"]).unwrap().build();
        assert_eq!(d, scoped(leaf("presence"), &["create", "update"]));
    }

    #[test]
    fn test_on_replaces_contexts() {
        let d = rule("presence")
            .on(["create"])
            .unwrap()
            .on(["update"])
            .unwrap()
            .build();
        assert_eq!(d, scoped(leaf("presence"), &["update"]));
    }

    #[test]
    fn test_on_does_not_mutate_base() {
        let presence = rule("presence");
        let before = presence.build();
        let with_context = presence.on(["create"]).unwrap();
        assert_eq!(presence.build(), before);
        assert_eq!(with_context.build(), scoped(leaf("presence"), &["create"]));
    }

    #[test]
    fn test_keys_do_not_mutate_base() {
        let presence = rule("presence");
        let before = presence.build();
        let with_keys = presence.keys(["firstName", "lastName"]).unwrap();
        assert_eq!(presence.build(), before);
        assert_eq!(
            with_keys.build().keys().to_vec(),
            vec!["firstName".to_string(), "lastName".to_string()]
        );
    }

    #[test]
    fn test_keys_require_one() {
        let err = rule("confirmation").keys(Vec::<&str>::new()).unwrap_err();
        assert_eq!(err, UsageError::MissingKeys);
    }

    #[test]
    fn test_branches_from_one_base_are_independent() {
        let base = rule("a").and_also(rule("b"));
        let left = base.and_also(rule("c"));
        let right = base.and_also(rule("d"));

        assert_eq!(base.build(), Descriptor::and(vec![leaf("a"), leaf("b")]));
        assert_eq!(left.build(), Descriptor::and(vec![leaf("a"), leaf("b"), leaf("c")]));
        assert_eq!(right.build(), Descriptor::and(vec![leaf("a"), leaf("b"), leaf("d")]));
    }

    #[test]
    fn test_scoped_builder_nests_when_composed() {
        let d = rule("a").on(["create"]).unwrap().and_also(rule("b")).build();
        assert_eq!(
            d,
            scoped(
                Descriptor::and(vec![scoped(leaf("a"), &["create"]), leaf("b")]),
                &["create"]
            )
        );

        let d = rule("a").on(["create"]).unwrap().or(rule("b")).build();
        assert_eq!(
            d,
            scoped(
                Descriptor::or(vec![scoped(leaf("a"), &["create"]), leaf("b")]),
                &["create"]
            )
        );

        let d = rule("a").on(["create"]).unwrap().and_then(rule("b")).build();
        assert_eq!(d.contexts().to_vec(), vec!["create".to_string()]);
        assert_eq!(d.combinator(), CombinatorKind::Chain);
    }

    #[test]
    fn test_scoped_catch_keeps_contexts() {
        let d = rule("a").on(["create"]).unwrap().catch(|errors| errors).build();
        assert_eq!(d.combinator(), CombinatorKind::MapError);
        assert_eq!(d.contexts().to_vec(), vec!["create".to_string()]);
    }

    #[test]
    fn test_catch_keeps_keys() {
        let d = rule("confirmation")
            .keys(["email"])
            .unwrap()
            .catch(|errors| errors)
            .build();
        assert_eq!(d.combinator(), CombinatorKind::MapError);
        assert_eq!(d.keys().to_vec(), vec!["email".to_string()]);
    }

    fn failing(name: &'static str) -> ValidationBuilder {
        validates(
            Arc::new(FnFactory::new(name, move |_: &Value, _: &Options| {
                vec![ValidationError::new(ErrorMessage::named(name))]
            })),
            Options::None,
        )
    }

    #[tokio::test]
    async fn test_composed_scoped_builder_is_inert_outside_its_contexts() {
        let d = failing("a").on(["create"]).unwrap().and_also(failing("b")).build();

        let errors = validate_json(&json!(null), &d, Some("update")).await.unwrap();
        assert!(errors.is_empty());

        let errors = validate_json(&json!(null), &d, Some("create")).await.unwrap();
        let names: Vec<_> = errors.iter().map(|e| e.message.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let caught = failing("a")
            .on(["create"])
            .unwrap()
            .catch(|_| vec![ValidationError::new(ErrorMessage::named("c"))])
            .build();
        let errors = validate_json(&json!(null), &caught, Some("update")).await.unwrap();
        assert!(errors.is_empty());
    }

    #[test]
    fn test_scoped_composite_keeps_children() {
        let d = rule("a")
            .and_also(rule("b"))
            .on(["create"])
            .unwrap()
            .build();
        assert_eq!(
            d,
            scoped(Descriptor::and(vec![leaf("a"), leaf("b")]), &["create"])
        );
    }

    #[test]
    fn test_from_descriptor_round_trips_and_flattens() {
        let original = rule("a").and_also(rule("b")).build();
        let rebuilt = ValidationBuilder::<Value>::from_descriptor(&original);
        assert_eq!(rebuilt.build(), original);
        assert_eq!(
            rebuilt.and_also(rule("c")).build(),
            Descriptor::and(vec![leaf("a"), leaf("b"), leaf("c")])
        );

        let scoped_keyed = rule("confirmation")
            .keys(["email"])
            .unwrap()
            .on(["create"])
            .unwrap()
            .build();
        let rebuilt = ValidationBuilder::<Value>::from_descriptor(&scoped_keyed);
        assert_eq!(rebuilt.build(), scoped_keyed);
    }

    #[test]
    fn test_build_free_function() {
        let builder = rule("a").and_then(rule("b"));
        assert_eq!(build(&builder), builder.build());
        assert_eq!(Descriptor::from(&builder), builder.build());
    }
}
