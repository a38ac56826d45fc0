//! The route table.
//!
//! Routes are indexed three ways at add time: per-method by the exact
//! `domain + uri` string for O(1) static lookup, by name, and by
//! controller reference. Matching is two-phase: the fast path probes the
//! static index with `host + path` then bare `path` and re-runs the full
//! validator chain on any hit, falling back to a linear scan in
//! registration order so earlier routes shadow later ones.
//!
//! When nothing matches the requested verb but some route matches the
//! path under another verb, an `OPTIONS` request gets a synthesized
//! 200 route carrying an `Allow` header and every other verb gets
//! `MethodNotAllowed`; only a path nobody serves is `NotFound`.

use crate::route::{Action, Route};
use crate::validators::{self, RouteValidator};
use illuminate_core::{AllowedMethods, HttpError, Method, Request, Response, ResponseValue};
use std::collections::HashMap;
use std::sync::Arc;

/// The registered route table with its match indexes.
pub struct RouteCollection {
    routes: HashMap<Method, HashMap<String, Arc<Route>>>,
    all_routes: Vec<Arc<Route>>,
    name_index: HashMap<String, Arc<Route>>,
    action_index: HashMap<String, Arc<Route>>,
    validators: Vec<Box<dyn RouteValidator>>,
}

impl RouteCollection {
    /// An empty table with the standard validator chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            all_routes: Vec::new(),
            name_index: HashMap::new(),
            action_index: HashMap::new(),
            validators: validators::default_chain(),
        }
    }

    /// Add a route, indexing it under every verb it serves.
    pub fn add(&mut self, route: Route) -> Arc<Route> {
        let route = Arc::new(route);
        let key = format!("{}{}", route.domain().unwrap_or(""), route.uri());
        for method in route.methods() {
            self.routes
                .entry(*method)
                .or_default()
                .insert(key.clone(), Arc::clone(&route));
        }
        if let Some(name) = route.name() {
            self.name_index.insert(name.to_string(), Arc::clone(&route));
        }
        if let Some(reference) = route.action().reference() {
            self.action_index.insert(reference, Arc::clone(&route));
        }
        self.all_routes.push(Arc::clone(&route));
        route
    }

    /// Reverse lookup by route name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Arc<Route>> {
        self.name_index.get(name)
    }

    /// Reverse lookup by `Controller@method` reference.
    #[must_use]
    pub fn get_by_action(&self, reference: &str) -> Option<&Arc<Route>> {
        self.action_index.get(reference)
    }

    /// All routes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.all_routes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.all_routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all_routes.is_empty()
    }

    /// Match a request to a route.
    ///
    /// # Errors
    ///
    /// `MethodNotAllowed` when only other verbs serve the path, `NotFound`
    /// when nothing does.
    pub fn match_request(&self, request: &Request) -> Result<Arc<Route>, HttpError> {
        let method = request.method();
        let path = request.trimmed_path();

        if let Some(by_method) = self.routes.get(&method) {
            let mut keys: Vec<String> = Vec::with_capacity(2);
            if let Some(host) = request.host() {
                keys.push(format!("{host}{path}"));
            }
            keys.push(path.to_string());

            // Fast path: exact-key hits still run the full chain, the key
            // only narrows the candidates.
            for key in &keys {
                if let Some(route) = by_method.get(key) {
                    if self.matches_route(route, request, true) {
                        tracing::trace!(uri = route.uri(), "route matched via static index");
                        return Ok(Arc::clone(route));
                    }
                }
            }
        }

        for route in &self.all_routes {
            if route.serves(method) && self.matches_route(route, request, true) {
                tracing::trace!(uri = route.uri(), "route matched via scan");
                return Ok(Arc::clone(route));
            }
        }

        let alternates: Vec<Method> = Method::all()
            .iter()
            .copied()
            .filter(|&verb| verb != method)
            .filter(|&verb| {
                self.all_routes
                    .iter()
                    .any(|r| r.serves(verb) && self.matches_route(r, request, false))
            })
            .collect();

        if alternates.is_empty() {
            return Err(HttpError::NotFound);
        }

        let allowed = AllowedMethods::new(alternates);
        if method == Method::Options {
            return Ok(self.options_route(request, &allowed));
        }
        Err(HttpError::MethodNotAllowed { allowed })
    }

    /// Run the validator chain; `including_method` is off when probing
    /// alternate verbs.
    fn matches_route(&self, route: &Route, request: &Request, including_method: bool) -> bool {
        self.validators
            .iter()
            .filter(|v| including_method || !v.validates_method())
            .all(|v| v.matches(route, request))
    }

    /// Synthesize the self-answering `OPTIONS` route for a served path.
    fn options_route(&self, request: &Request, allowed: &AllowedMethods) -> Arc<Route> {
        let header = allowed.header_value();
        Arc::new(Route::new(
            vec![Method::Options],
            request.trimmed_path(),
            Action::closure(move |_req, _params| {
                Ok(ResponseValue::Response(
                    Response::ok().header("allow", header.clone().into_bytes()),
                ))
            }),
        ))
    }
}

impl Default for RouteCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RouteCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteCollection")
            .field("routes", &self.all_routes.len())
            .field("named", &self.name_index.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(uri: &str, tag: &'static str) -> Route {
        Route::get(uri, Action::closure(move |_req, _params| Ok(tag.into())))
    }

    fn body_of(route: &Arc<Route>) -> String {
        let Action::Closure(handler) = route.action() else {
            panic!("expected closure action");
        };
        let mut req = Request::new(Method::Get, "/");
        let params = crate::params::Parameters::new();
        let response = handler(&mut req, &params).unwrap().prepare();
        response.body_ref().as_text().unwrap().to_string()
    }

    #[test]
    fn test_static_route_matches_via_index() {
        let mut collection = RouteCollection::new();
        collection.add(tagged("users/all", "static"));
        collection.add(tagged("users/{id}", "dynamic"));

        let request = Request::new(Method::Get, "/users/all");
        let matched = collection.match_request(&request).unwrap();
        assert_eq!(body_of(&matched), "static");
    }

    #[test]
    fn test_dynamic_route_matches_via_scan() {
        let mut collection = RouteCollection::new();
        collection.add(tagged("users/{id}", "dynamic"));

        let request = Request::new(Method::Get, "/users/42");
        let matched = collection.match_request(&request).unwrap();
        assert_eq!(body_of(&matched), "dynamic");
    }

    #[test]
    fn test_first_registered_route_wins() {
        let mut collection = RouteCollection::new();
        collection.add(tagged("users/{id}", "first"));
        collection.add(tagged("users/{slug}", "second"));

        let request = Request::new(Method::Get, "/users/7");
        let matched = collection.match_request(&request).unwrap();
        assert_eq!(body_of(&matched), "first");
    }

    #[test]
    fn test_head_served_by_get_route() {
        let mut collection = RouteCollection::new();
        collection.add(tagged("users", "list"));

        let request = Request::new(Method::Head, "/users");
        assert!(collection.match_request(&request).is_ok());
    }

    #[test]
    fn test_method_not_allowed_lists_alternates() {
        let mut collection = RouteCollection::new();
        collection.add(tagged("users", "list"));
        collection.add(Route::put(
            "users",
            Action::closure(|_req, _params| Ok(ResponseValue::Empty)),
        ));

        let request = Request::new(Method::Delete, "/users");
        let err = collection.match_request(&request).unwrap_err();
        let HttpError::MethodNotAllowed { allowed } = err else {
            panic!("expected MethodNotAllowed, got {err:?}");
        };
        assert_eq!(allowed.header_value(), "GET, HEAD, PUT");
    }

    #[test]
    fn test_options_gets_synthesized_allow_response() {
        let mut collection = RouteCollection::new();
        collection.add(tagged("users", "list"));

        let request = Request::new(Method::Options, "/users");
        let matched = collection.match_request(&request).unwrap();
        assert!(matched.serves(Method::Options));

        let Action::Closure(handler) = matched.action() else {
            panic!("expected closure action");
        };
        let mut req = Request::new(Method::Options, "/users");
        let response = handler(&mut req, &crate::params::Parameters::new())
            .unwrap()
            .prepare();
        let allow = response.header_value("allow").unwrap();
        assert_eq!(std::str::from_utf8(allow).unwrap(), "GET, HEAD");
    }

    #[test]
    fn test_unserved_path_is_not_found() {
        let collection = RouteCollection::new();
        let request = Request::new(Method::Get, "/ghost");
        assert!(matches!(
            collection.match_request(&request).unwrap_err(),
            HttpError::NotFound
        ));
    }

    #[test]
    fn test_domain_bound_routes_share_a_uri() {
        let mut collection = RouteCollection::new();
        collection.add(tagged("dash", "plain").on_domain("a.myapp.com"));
        collection.add(tagged("dash", "other").on_domain("b.myapp.com"));

        let request = Request::new(Method::Get, "/dash").with_host("b.myapp.com");
        let matched = collection.match_request(&request).unwrap();
        assert_eq!(matched.domain(), Some("b.myapp.com"));
    }

    #[test]
    fn test_reverse_lookups() {
        let mut collection = RouteCollection::new();
        collection.add(tagged("users", "list").named("users.index"));
        collection.add(Route::post("users", Action::to("UserController", "store")));

        assert!(collection.get_by_name("users.index").is_some());
        assert!(collection.get_by_action("UserController@store").is_some());
        assert!(collection.get_by_name("ghost").is_none());
    }
}
