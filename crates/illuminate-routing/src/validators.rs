//! Route/request match validators.
//!
//! Each validator checks one aspect of a candidate route against the
//! request. The collection runs the full chain for normal matching and
//! skips method-sensitive validators when probing alternate verbs for a
//! 405 response.

use crate::route::Route;
use illuminate_core::Request;

/// One aspect of route/request compatibility.
pub trait RouteValidator: Send + Sync {
    /// Whether the route is compatible with the request on this aspect.
    fn matches(&self, route: &Route, request: &Request) -> bool;

    /// Whether this validator is sensitive to the request method.
    fn validates_method(&self) -> bool {
        false
    }
}

/// Verb-set membership.
#[derive(Debug, Default)]
pub struct MethodValidator;

impl RouteValidator for MethodValidator {
    fn matches(&self, route: &Route, request: &Request) -> bool {
        route.serves(request.method())
    }

    fn validates_method(&self) -> bool {
        true
    }
}

/// Scheme requirement (`https()` / `http()` routes).
#[derive(Debug, Default)]
pub struct SchemeValidator;

impl RouteValidator for SchemeValidator {
    fn matches(&self, route: &Route, request: &Request) -> bool {
        match route.secure() {
            None => true,
            Some(true) => request.secure(),
            Some(false) => !request.secure(),
        }
    }
}

/// Domain template match.
#[derive(Debug, Default)]
pub struct HostValidator;

impl RouteValidator for HostValidator {
    fn matches(&self, route: &Route, request: &Request) -> bool {
        route.compiled().is_domain_match(request.host())
    }
}

/// Path template match.
#[derive(Debug, Default)]
pub struct UriValidator;

impl RouteValidator for UriValidator {
    fn matches(&self, route: &Route, request: &Request) -> bool {
        route.compiled().is_uri_match(request.trimmed_path())
    }
}

/// The standard chain, cheapest checks first.
#[must_use]
pub fn default_chain() -> Vec<Box<dyn RouteValidator>> {
    vec![
        Box::new(MethodValidator),
        Box::new(SchemeValidator),
        Box::new(HostValidator),
        Box::new(UriValidator),
    ]
}
