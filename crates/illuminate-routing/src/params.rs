//! Bound route parameters.
//!
//! Parameter values start life as raw path/host captures and may be
//! replaced by binders with decoded values or loaded domain entities. The
//! bag preserves declaration order (domain parameters first, then uri
//! parameters) so handlers can consume values positionally.

use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

/// A single bound parameter value.
#[derive(Clone)]
pub enum ParamValue {
    /// A raw capture from the path or host.
    Str(String),
    /// Declared but not supplied (unmatched optional with no default).
    Null,
    /// A structured value, typically a back-filled default.
    Json(Value),
    /// A domain entity loaded by a binder.
    Entity(Arc<dyn Any + Send + Sync>),
}

impl ParamValue {
    /// Wrap a loaded entity.
    pub fn entity<T: Any + Send + Sync>(value: T) -> Self {
        Self::Entity(Arc::new(value))
    }

    /// The string form, for raw captures and JSON strings.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether this slot is unfilled.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Downcast an entity value.
    #[must_use]
    pub fn downcast_entity<T: Any + Send + Sync>(&self) -> Option<&T> {
        match self {
            Self::Entity(entity) => entity.downcast_ref(),
            _ => None,
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Null, Self::Null) => true,
            (Self::Json(a), Self::Json(b)) => a == b,
            (Self::Entity(a), Self::Entity(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Null => f.write_str("Null"),
            Self::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Self::Entity(_) => f.write_str("Entity(..)"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// An ordered name/value bag of bound parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    items: Vec<(String, ParamValue)>,
}

impl Parameters {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.items
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Set a parameter, replacing in place if already present.
    pub fn set(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        if let Some(slot) = self.items.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.items.push((name, value));
        }
    }

    /// Remove a parameter by name.
    pub fn forget(&mut self, name: &str) {
        self.items.retain(|(n, _)| n != name);
    }

    /// Iterate pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.items.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Parameter names in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Values in declaration order with null slots removed, the shape
    /// handed to positional handler arguments.
    #[must_use]
    pub fn positional(&self) -> Vec<ParamValue> {
        self.items
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(_, v)| v.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_replaces_in_place() {
        let mut params = Parameters::new();
        params.set("id", ParamValue::Str("5".into()));
        params.set("page", ParamValue::Null);
        params.set("id", ParamValue::Json(json!(5)));

        assert_eq!(params.len(), 2);
        assert_eq!(params.names(), vec!["id", "page"]);
        assert_eq!(params.get("id"), Some(&ParamValue::Json(json!(5))));
    }

    #[test]
    fn test_positional_skips_nulls() {
        let mut params = Parameters::new();
        params.set("a", ParamValue::Str("1".into()));
        params.set("b", ParamValue::Null);
        params.set("c", ParamValue::Str("3".into()));

        let positional = params.positional();
        assert_eq!(positional.len(), 2);
        assert_eq!(positional[0].as_str(), Some("1"));
        assert_eq!(positional[1].as_str(), Some("3"));
    }

    #[test]
    fn test_entity_downcast_and_identity_eq() {
        #[derive(Debug, PartialEq)]
        struct User {
            id: u64,
        }

        let value = ParamValue::entity(User { id: 7 });
        assert_eq!(value.downcast_entity::<User>(), Some(&User { id: 7 }));
        assert!(value.downcast_entity::<String>().is_none());

        let clone = value.clone();
        assert_eq!(value, clone);
        assert_ne!(value, ParamValue::entity(User { id: 7 }));
    }

    #[test]
    fn test_forget_removes() {
        let mut params = Parameters::new();
        params.set("id", ParamValue::Str("5".into()));
        params.forget("id");
        assert!(params.is_empty());
        assert!(params.get("id").is_none());
    }
}
