//! Parameter binders.
//!
//! After a route's raw captures are bound, registered binders replace
//! string captures with richer values: decoded strings, loaded entities,
//! or anything else a closure produces. A binder may be a closure, a
//! container-resolved [`Binder`] target, or a model loader with a
//! configurable missing-entity fallback.

use crate::params::{ParamValue, Parameters};
use crate::route::Route;
use illuminate_core::{Container, HttpError, resolve_as};
use std::collections::HashMap;
use std::sync::Arc;

/// A container-resolvable binder target.
pub trait Binder: Send + Sync {
    /// Produce the bound value for a raw capture.
    ///
    /// # Errors
    ///
    /// Any error aborts dispatch for this request; `NotFound` is the
    /// conventional result for a missing entity.
    fn call(&self, method: &str, value: &str, route: &Route) -> Result<ParamValue, HttpError>;
}

type BinderClosure = Arc<dyn Fn(&str, &Route) -> Result<ParamValue, HttpError> + Send + Sync>;

enum BinderEntry {
    Closure(BinderClosure),
    Named { target: String, method: String },
}

/// Per-parameter-name binder registrations.
pub struct BinderRegistry {
    binders: HashMap<String, BinderEntry>,
    container: Arc<Container>,
}

impl BinderRegistry {
    /// An empty registry resolving named targets from `container`.
    #[must_use]
    pub fn new(container: Arc<Container>) -> Self {
        Self {
            binders: HashMap::new(),
            container,
        }
    }

    /// Bind a parameter name to a closure.
    pub fn bind<F>(&mut self, key: impl Into<String>, binder: F)
    where
        F: Fn(&str, &Route) -> Result<ParamValue, HttpError> + Send + Sync + 'static,
    {
        self.binders
            .insert(key.into(), BinderEntry::Closure(Arc::new(binder)));
    }

    /// Bind a parameter name to a container target, `Target@method` form
    /// (`bind` when the method part is omitted).
    pub fn bind_name(&mut self, key: impl Into<String>, reference: &str) {
        let (target, method) = match reference.split_once('@') {
            Some((target, method)) => (target.to_string(), method.to_string()),
            None => (reference.to_string(), "bind".to_string()),
        };
        self.binders
            .insert(key.into(), BinderEntry::Named { target, method });
    }

    /// Bind a parameter name to an entity loader; a missing entity
    /// becomes `NotFound`.
    pub fn model<F>(&mut self, key: impl Into<String>, loader: F)
    where
        F: Fn(&str) -> Option<ParamValue> + Send + Sync + 'static,
    {
        self.bind(key, move |value, _route| {
            loader(value).ok_or(HttpError::NotFound)
        });
    }

    /// Bind an entity loader with a custom missing-entity fallback.
    pub fn model_with<F, M>(&mut self, key: impl Into<String>, loader: F, missing: M)
    where
        F: Fn(&str) -> Option<ParamValue> + Send + Sync + 'static,
        M: Fn(&str) -> HttpError + Send + Sync + 'static,
    {
        self.bind(key, move |value, _route| {
            loader(value).ok_or_else(|| missing(value))
        });
    }

    /// Whether a binder is registered for a parameter name.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.binders.contains_key(key)
    }

    /// Run one binder against a raw capture.
    ///
    /// # Errors
    ///
    /// The binder's own error, or `HandlerFault` when a named target is
    /// not bound in the container.
    pub fn resolve(
        &self,
        key: &str,
        value: &str,
        route: &Route,
    ) -> Result<ParamValue, HttpError> {
        match self.binders.get(key) {
            None => Ok(ParamValue::Str(value.to_string())),
            Some(BinderEntry::Closure(binder)) => binder(value, route),
            Some(BinderEntry::Named { target, method }) => {
                let binder: Arc<dyn Binder> = resolve_as(self.container.as_ref(), target)
                    .ok_or_else(|| {
                        HttpError::fault(format!("binder target `{target}` is not bound"))
                    })?;
                binder.call(method, value, route)
            }
        }
    }

    /// Replace registered string captures in a bound parameter bag.
    ///
    /// Only `Str` values are rebound; defaults, nulls, and already-bound
    /// entities pass through.
    ///
    /// # Errors
    ///
    /// The first binder error aborts the pass.
    pub fn apply(&self, params: &mut Parameters, route: &Route) -> Result<(), HttpError> {
        let targets: Vec<(String, String)> = params
            .iter()
            .filter(|(name, _)| self.has(name))
            .filter_map(|(name, value)| match value {
                ParamValue::Str(raw) => Some((name.to_string(), raw.clone())),
                _ => None,
            })
            .collect();

        for (name, raw) in targets {
            let bound = self.resolve(&name, &raw, route)?;
            params.set(name, bound);
        }
        Ok(())
    }
}

impl std::fmt::Debug for BinderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinderRegistry")
            .field("binders", &self.binders.len())
            .finish_non_exhaustive()
    }
}
