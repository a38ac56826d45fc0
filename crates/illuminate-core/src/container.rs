//! Container collaborator: string-keyed and type-keyed resolution.
//!
//! The routing core never owns application wiring; it only needs a
//! capability to resolve controllers, middleware, and binders by name, and
//! handler collaborators by type. [`Resolver`] is that seam; [`Container`]
//! is the in-crate implementation used by default and in tests.

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Capability interface for string-keyed instance resolution.
///
/// Injected into the controller dispatcher, the middleware pipeline, and
/// the binder registry; never accessed through process-wide globals.
pub trait Resolver: Send + Sync {
    /// Resolve a shared instance registered under `key`.
    fn resolve(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>>;
}

/// Resolve and downcast a clonable instance in one step.
///
/// Returns `None` when the key is unbound or bound to a different type.
#[must_use]
pub fn resolve_as<T: Clone + Send + Sync + 'static>(
    resolver: &dyn Resolver,
    key: &str,
) -> Option<T> {
    resolver
        .resolve(key)?
        .downcast::<T>()
        .ok()
        .map(|arc| (*arc).clone())
}

/// A minimal instance container.
///
/// Holds shared instances under string keys (controllers, middleware,
/// binders) and under their `TypeId` (handler collaborators resolved by
/// type). Registration happens before serving; lookups are lock-read only.
#[derive(Default)]
pub struct Container {
    named: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
    typed: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Container {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a clonable instance under a string key.
    pub fn bind<T: Clone + Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.named.write().insert(key.into(), Arc::new(value));
    }

    /// Bind a clonable instance under its own type.
    pub fn bind_type<T: Clone + Send + Sync + 'static>(&self, value: T) {
        self.typed.write().insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Resolve an instance bound under its own type.
    #[must_use]
    pub fn resolve_type<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.typed
            .read()
            .get(&TypeId::of::<T>())
            .cloned()?
            .downcast::<T>()
            .ok()
            .map(|arc| (*arc).clone())
    }

    /// Whether a string key is bound.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.named.read().contains_key(key)
    }
}

impl Resolver for Container {
    fn resolve(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.named.read().get(key).cloned()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("named", &self.named.read().len())
            .field("typed", &self.typed.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_resolve_named() {
        let container = Container::new();
        container.bind("greeting", "hello".to_string());
        assert!(container.has("greeting"));
        let value: Option<String> = resolve_as(&container, "greeting");
        assert_eq!(value.as_deref(), Some("hello"));
    }

    #[test]
    fn test_resolve_missing_key() {
        let container = Container::new();
        let value: Option<String> = resolve_as(&container, "nope");
        assert!(value.is_none());
    }

    #[test]
    fn test_resolve_wrong_type() {
        let container = Container::new();
        container.bind("n", 7_u32);
        let value: Option<String> = resolve_as(&container, "n");
        assert!(value.is_none());
    }

    #[test]
    fn test_bind_and_resolve_typed() {
        #[derive(Clone, PartialEq, Debug)]
        struct Pool(&'static str);

        let container = Container::new();
        container.bind_type(Pool("db"));
        assert_eq!(container.resolve_type::<Pool>(), Some(Pool("db")));
        assert!(container.resolve_type::<String>().is_none());
    }

    #[test]
    fn test_shared_trait_objects() {
        trait Service: Send + Sync {
            fn id(&self) -> u32;
        }
        struct Impl;
        impl Service for Impl {
            fn id(&self) -> u32 {
                42
            }
        }

        let container = Container::new();
        let service: Arc<dyn Service> = Arc::new(Impl);
        container.bind("service", service);
        let resolved: Arc<dyn Service> = resolve_as(&container, "service").unwrap();
        assert_eq!(resolved.id(), 42);
    }
}
