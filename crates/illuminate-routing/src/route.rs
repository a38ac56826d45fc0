//! Route definition and parameter binding.
//!
//! A [`Route`] pairs a verb set and uri template with an [`Action`] and
//! carries the declarative attributes accumulated at registration: name,
//! middleware references, `where` constraints, parameter defaults, filter
//! references, domain and scheme requirements. Compilation to a regex
//! matcher is deferred until first match and memoized.
//!
//! Structural mistakes (malformed templates, duplicate parameter names,
//! invalid constraints) panic at registration so a bad table never starts
//! serving. Request-time conditions are always `Result` values.

use crate::compiler::{self, CompiledRoute};
use crate::params::{ParamValue, Parameters};
use illuminate_core::{HttpError, Method, Request, ResponseValue};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// The callable form of a closure route action.
pub type RouteHandler = dyn Fn(&mut Request, &Parameters) -> Result<ResponseValue, HttpError> + Send + Sync;

/// What a route runs when it matches.
#[derive(Clone)]
pub enum Action {
    /// An inline handler.
    Closure(Arc<RouteHandler>),
    /// A container-resolved controller action.
    Controller {
        /// The controller binding name.
        name: String,
        /// The action method on that controller.
        method: String,
    },
}

impl Action {
    /// Wrap an inline handler.
    pub fn closure<F>(handler: F) -> Self
    where
        F: Fn(&mut Request, &Parameters) -> Result<ResponseValue, HttpError>
            + Send
            + Sync
            + 'static,
    {
        Self::Closure(Arc::new(handler))
    }

    /// Parse a `Controller@method` reference.
    ///
    /// # Panics
    ///
    /// Panics when the reference has no `@method` part; a dangling
    /// controller reference is a registration defect.
    #[must_use]
    pub fn controller(reference: &str) -> Self {
        match reference.split_once('@') {
            Some((name, method)) if !name.is_empty() && !method.is_empty() => Self::Controller {
                name: name.to_string(),
                method: method.to_string(),
            },
            _ => panic!("malformed controller reference `{reference}`, expected `Name@method`"),
        }
    }

    /// Build a controller action from its two parts.
    pub fn to(name: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Controller {
            name: name.into(),
            method: method.into(),
        }
    }

    /// The `Controller@method` form, for the action index.
    #[must_use]
    pub fn reference(&self) -> Option<String> {
        match self {
            Self::Closure(_) => None,
            Self::Controller { name, method } => Some(format!("{name}@{method}")),
        }
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closure(_) => f.write_str("Closure(..)"),
            Self::Controller { name, method } => f
                .debug_struct("Controller")
                .field("name", name)
                .field("method", method)
                .finish(),
        }
    }
}

/// A registered route.
pub struct Route {
    methods: Vec<Method>,
    uri: String,
    domain: Option<String>,
    action: Action,
    name: Option<String>,
    middleware: Vec<String>,
    wheres: HashMap<String, String>,
    defaults: HashMap<String, Value>,
    before_filters: Vec<(String, Vec<String>)>,
    after_filters: Vec<(String, Vec<String>)>,
    secure: Option<bool>,
    compiled: OnceLock<CompiledRoute>,
}

impl Route {
    /// Register a route over an explicit verb set.
    ///
    /// `GET` routes implicitly serve `HEAD`. The uri is stored trimmed of
    /// surrounding slashes, with `/` for the root.
    ///
    /// # Panics
    ///
    /// Panics on an empty verb set or a malformed template (unterminated
    /// placeholder, invalid or duplicate parameter name).
    #[must_use]
    pub fn new(methods: Vec<Method>, uri: &str, action: Action) -> Self {
        assert!(!methods.is_empty(), "route `{uri}` has no methods");

        let mut verbs: Vec<Method> = Vec::with_capacity(methods.len() + 1);
        for method in methods {
            if !verbs.contains(&method) {
                verbs.push(method);
            }
        }
        if verbs.contains(&Method::Get) && !verbs.contains(&Method::Head) {
            verbs.push(Method::Head);
        }

        let route = Self {
            methods: verbs,
            uri: trim_uri(uri),
            domain: None,
            action,
            name: None,
            middleware: Vec::new(),
            wheres: HashMap::new(),
            defaults: HashMap::new(),
            before_filters: Vec::new(),
            after_filters: Vec::new(),
            secure: None,
            compiled: OnceLock::new(),
        };
        route.validate_templates();
        route
    }

    /// A `GET` (and implicit `HEAD`) route.
    #[must_use]
    pub fn get(uri: &str, action: Action) -> Self {
        Self::new(vec![Method::Get], uri, action)
    }

    /// A `POST` route.
    #[must_use]
    pub fn post(uri: &str, action: Action) -> Self {
        Self::new(vec![Method::Post], uri, action)
    }

    /// A `PUT` route.
    #[must_use]
    pub fn put(uri: &str, action: Action) -> Self {
        Self::new(vec![Method::Put], uri, action)
    }

    /// A `PATCH` route.
    #[must_use]
    pub fn patch(uri: &str, action: Action) -> Self {
        Self::new(vec![Method::Patch], uri, action)
    }

    /// A `DELETE` route.
    #[must_use]
    pub fn delete(uri: &str, action: Action) -> Self {
        Self::new(vec![Method::Delete], uri, action)
    }

    /// An `OPTIONS` route.
    #[must_use]
    pub fn options(uri: &str, action: Action) -> Self {
        Self::new(vec![Method::Options], uri, action)
    }

    /// Assign the route name used for reverse lookup.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Reference a named middleware pipe.
    #[must_use]
    pub fn with_middleware(mut self, name: impl Into<String>) -> Self {
        self.middleware.push(name.into());
        self
    }

    /// Constrain a parameter with a regex.
    ///
    /// # Panics
    ///
    /// Panics when the constraint is not a valid regex.
    #[must_use]
    pub fn where_(mut self, key: impl Into<String>, pattern: impl Into<String>) -> Self {
        let key = key.into();
        let pattern = pattern.into();
        if let Err(err) = regex::Regex::new(&format!("^(?:{pattern})$")) {
            panic!("invalid `where` constraint for `{key}`: {err}");
        }
        self.wheres.insert(key, pattern);
        self
    }

    /// Back-fill value for an unmatched optional parameter.
    #[must_use]
    pub fn with_default(mut self, key: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(key.into(), value);
        self
    }

    /// Bind the route to a domain template.
    ///
    /// # Panics
    ///
    /// Panics when the domain template is malformed or repeats a uri
    /// parameter name.
    #[must_use]
    pub fn on_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self.compiled = OnceLock::new();
        self.validate_templates();
        self
    }

    /// Require HTTPS.
    #[must_use]
    pub fn https(mut self) -> Self {
        self.secure = Some(true);
        self
    }

    /// Require plain HTTP.
    #[must_use]
    pub fn http(mut self) -> Self {
        self.secure = Some(false);
        self
    }

    /// Attach a named before filter.
    #[must_use]
    pub fn before(mut self, name: impl Into<String>) -> Self {
        self.before_filters.push((name.into(), Vec::new()));
        self
    }

    /// Attach a named before filter with arguments (`role:admin` style).
    #[must_use]
    pub fn before_with(mut self, name: impl Into<String>, args: Vec<String>) -> Self {
        self.before_filters.push((name.into(), args));
        self
    }

    /// Attach a named after filter.
    #[must_use]
    pub fn after(mut self, name: impl Into<String>) -> Self {
        self.after_filters.push((name.into(), Vec::new()));
        self
    }

    /// Attach a named after filter with arguments.
    #[must_use]
    pub fn after_with(mut self, name: impl Into<String>, args: Vec<String>) -> Self {
        self.after_filters.push((name.into(), args));
        self
    }

    /// The verb set this route serves, implicit `HEAD` included.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Whether the route serves a verb.
    #[must_use]
    pub fn serves(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }

    /// The trimmed uri template.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The domain template, if bound.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// The route name, if assigned.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The route action.
    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Named middleware references in attach order.
    #[must_use]
    pub fn middleware(&self) -> &[String] {
        &self.middleware
    }

    /// Per-parameter regex constraints.
    #[must_use]
    pub fn wheres(&self) -> &HashMap<String, String> {
        &self.wheres
    }

    /// Parameter defaults.
    #[must_use]
    pub fn defaults(&self) -> &HashMap<String, Value> {
        &self.defaults
    }

    /// Named before filters with their arguments.
    #[must_use]
    pub fn before_filters(&self) -> &[(String, Vec<String>)] {
        &self.before_filters
    }

    /// Named after filters with their arguments.
    #[must_use]
    pub fn after_filters(&self) -> &[(String, Vec<String>)] {
        &self.after_filters
    }

    /// The scheme requirement: `Some(true)` https-only, `Some(false)`
    /// http-only, `None` either.
    #[must_use]
    pub fn secure(&self) -> Option<bool> {
        self.secure
    }

    /// The memoized compiled matcher.
    ///
    /// # Panics
    ///
    /// Panics when compilation fails. Templates and constraints are
    /// re-validated by every builder and mutator that touches them, so a
    /// failure here cannot be reached through the public surface.
    pub fn compiled(&self) -> &CompiledRoute {
        self.compiled.get_or_init(|| {
            match compiler::compile(&self.uri, self.domain.as_deref(), &self.wheres) {
                Ok(compiled) => compiled,
                Err(err) => panic!("route `{}` failed to compile: {err}", self.uri),
            }
        })
    }

    /// Bind a matched request into a parameter bag.
    ///
    /// All declared parameters appear in declaration order (domain first).
    /// Path captures win over host captures; unmatched optionals take
    /// their default or stay null.
    #[must_use]
    pub fn bind(&self, request: &Request) -> Parameters {
        let compiled = self.compiled();
        let mut params = Parameters::new();
        for name in compiled.parameters() {
            params.set(name.clone(), ParamValue::Null);
        }

        if let Some(captures) = compiled.uri_captures(request.trimmed_path()) {
            for (name, value) in captures {
                if let Some(value) = value {
                    params.set(name, ParamValue::Str(value));
                }
            }
        }

        if let Some(host) = request.host() {
            if let Some(captures) = compiled.domain_captures(host) {
                for (name, value) in captures {
                    let unfilled = params.get(&name).is_none_or(ParamValue::is_null);
                    if let (Some(value), true) = (value, unfilled) {
                        params.set(name, ParamValue::Str(value));
                    }
                }
            }
        }

        for name in compiled.parameters() {
            let unfilled = params.get(name).is_none_or(ParamValue::is_null);
            if unfilled {
                if let Some(default) = self.defaults.get(name) {
                    params.set(name.clone(), ParamValue::Json(default.clone()));
                }
            }
        }

        params
    }

    pub(crate) fn prefix_uri(&mut self, prefix: &str) {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            return;
        }
        self.uri = if self.uri == "/" {
            prefix.to_string()
        } else {
            format!("{prefix}/{}", self.uri)
        };
        self.compiled = OnceLock::new();
        self.validate_templates();
    }

    pub(crate) fn prepend_namespace(&mut self, namespace: &str) {
        if namespace.is_empty() {
            return;
        }
        if let Action::Controller { name, .. } = &mut self.action {
            // A leading backslash marks the reference as absolute.
            if let Some(absolute) = name.strip_prefix('\\') {
                *name = absolute.to_string();
            } else {
                *name = format!("{namespace}\\{name}");
            }
        }
    }

    pub(crate) fn prefix_name(&mut self, prefix: &str) {
        if prefix.is_empty() {
            return;
        }
        if let Some(name) = &self.name {
            self.name = Some(format!("{prefix}{name}"));
        }
    }

    pub(crate) fn prepend_middleware(&mut self, names: &[String]) {
        let mut merged = names.to_vec();
        merged.extend(self.middleware.drain(..));
        self.middleware = merged;
    }

    pub(crate) fn merge_wheres(&mut self, wheres: &HashMap<String, String>) {
        for (key, pattern) in wheres {
            self.wheres
                .entry(key.clone())
                .or_insert_with(|| pattern.clone());
        }
        self.compiled = OnceLock::new();
        self.validate_templates();
    }

    pub(crate) fn ensure_where(&mut self, key: &str, pattern: &str) {
        self.wheres
            .entry(key.to_string())
            .or_insert_with(|| pattern.to_string());
    }

    pub(crate) fn set_domain_if_unset(&mut self, domain: &str) {
        if self.domain.is_none() {
            self.domain = Some(domain.to_string());
            self.compiled = OnceLock::new();
            self.validate_templates();
        }
    }

    /// Run the full compile eagerly and panic on a structural defect, so
    /// a bad template can never surface during dispatch.
    fn validate_templates(&self) {
        if let Err(err) = compiler::compile(&self.uri, self.domain.as_deref(), &self.wheres) {
            panic!("route `{}` failed to compile: {err}", self.uri);
        }
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("methods", &self.methods)
            .field("uri", &self.uri)
            .field("domain", &self.domain)
            .field("name", &self.name)
            .field("action", &self.action)
            .field("middleware", &self.middleware)
            .finish_non_exhaustive()
    }
}

fn trim_uri(uri: &str) -> String {
    let trimmed = uri.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
