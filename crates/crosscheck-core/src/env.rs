//! # Execution Environment
//!
//! Container validators never index values themselves. They ask the
//! [`Environment`] to read a key out of a value, which keeps the reflection
//! strategy outside the core. [`JsonEnvironment`] is the stock
//! implementation over `serde_json::Value`.

use std::borrow::Cow;

use serde_json::Value;

/// Read access to keyed values, supplied by the caller of a validation pass.
pub trait Environment: Send + Sync {
    /// Read `key` out of `value`. `None` means the key is absent.
    fn get<'v>(&self, value: &'v Value, key: &str) -> Option<Cow<'v, Value>>;

    /// The keys actually present on `value`, in document order.
    /// Non-indexable values have none.
    fn keys(&self, value: &Value) -> Vec<String> {
        match value {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

/// Plain JSON indexing: object members by name, array elements by decimal
/// index.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEnvironment;

impl Environment for JsonEnvironment {
    fn get<'v>(&self, value: &'v Value, key: &str) -> Option<Cow<'v, Value>> {
        match value {
            Value::Object(map) => map.get(key).map(Cow::Borrowed),
            Value::Array(items) => key
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .map(Cow::Borrowed),
            _ => None,
        }
    }
}
