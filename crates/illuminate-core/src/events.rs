//! Filter bus: the event-style broadcaster for dispatch hooks.
//!
//! Four hook points exist around dispatch:
//!
//! 1. Global `before` filters — ordered broadcast; the first non-null
//!    result becomes the response and matching is skipped.
//! 2. The `matched` notification — fired once after a route matches and
//!    its parameters are bound.
//! 3. Named filters — registered once, referenced by routes (with optional
//!    arguments) as route-scoped before/after hooks.
//! 4. Global `after` filters — run on every prepared response.

use crate::request::Request;
use crate::response::{Response, ResponseValue};
use std::collections::HashMap;
use std::sync::Arc;

/// A global before filter. A `Some` result short-circuits dispatch.
pub type BeforeFilter = Arc<dyn Fn(&mut Request) -> Option<ResponseValue> + Send + Sync>;

/// A global after filter, run against every prepared response.
pub type AfterFilter = Arc<dyn Fn(&Request, &mut Response) + Send + Sync>;

/// A named route-scoped before filter with route-supplied arguments.
pub type NamedBeforeFilter =
    Arc<dyn Fn(&mut Request, &[String]) -> Option<ResponseValue> + Send + Sync>;

/// A named route-scoped after filter with route-supplied arguments.
pub type NamedAfterFilter = Arc<dyn Fn(&Request, &mut Response, &[String]) + Send + Sync>;

/// A listener for the route-matched notification.
pub type MatchedListener = Arc<dyn Fn(&Request) + Send + Sync>;

/// Registry and dispatcher for all filter hooks.
///
/// Owned by the router instance; filters are registered before serving and
/// only read during dispatch.
#[derive(Default)]
pub struct FilterBus {
    before: Vec<BeforeFilter>,
    after: Vec<AfterFilter>,
    named_before: HashMap<String, NamedBeforeFilter>,
    named_after: HashMap<String, NamedAfterFilter>,
    matched: Vec<MatchedListener>,
}

impl FilterBus {
    /// Create an empty filter bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a global before filter.
    pub fn before<F>(&mut self, filter: F)
    where
        F: Fn(&mut Request) -> Option<ResponseValue> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(filter));
    }

    /// Register a global after filter.
    pub fn after<F>(&mut self, filter: F)
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.after.push(Arc::new(filter));
    }

    /// Register a named before filter referenced by routes.
    pub fn define<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: Fn(&mut Request, &[String]) -> Option<ResponseValue> + Send + Sync + 'static,
    {
        self.named_before.insert(name.into(), Arc::new(filter));
    }

    /// Register a named after filter referenced by routes.
    pub fn define_after<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: Fn(&Request, &mut Response, &[String]) + Send + Sync + 'static,
    {
        self.named_after.insert(name.into(), Arc::new(filter));
    }

    /// Subscribe to the route-matched notification.
    pub fn on_matched<F>(&mut self, listener: F)
    where
        F: Fn(&Request) + Send + Sync + 'static,
    {
        self.matched.push(Arc::new(listener));
    }

    /// Run global before filters in registration order.
    ///
    /// Returns the first non-null result, which becomes the response.
    #[must_use]
    pub fn run_global_before(&self, request: &mut Request) -> Option<ResponseValue> {
        for filter in &self.before {
            if let Some(result) = filter(request) {
                return Some(result);
            }
        }
        None
    }

    /// Run all global after filters in registration order.
    pub fn run_global_after(&self, request: &Request, response: &mut Response) {
        for filter in &self.after {
            filter(request, response);
        }
    }

    /// Run one named before filter, if registered.
    #[must_use]
    pub fn run_named_before(
        &self,
        name: &str,
        request: &mut Request,
        args: &[String],
    ) -> Option<ResponseValue> {
        self.named_before.get(name).and_then(|f| f(request, args))
    }

    /// Run one named after filter, if registered.
    pub fn run_named_after(
        &self,
        name: &str,
        request: &Request,
        response: &mut Response,
        args: &[String],
    ) {
        if let Some(filter) = self.named_after.get(name) {
            filter(request, response, args);
        }
    }

    /// Broadcast the route-matched notification.
    pub fn run_matched(&self, request: &Request) {
        for listener in &self.matched {
            listener(request);
        }
    }
}

impl std::fmt::Debug for FilterBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterBus")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .field("named_before", &self.named_before.len())
            .field("named_after", &self.named_after.len())
            .field("matched", &self.matched.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_before_first_non_null_wins() {
        let mut bus = FilterBus::new();
        bus.before(|_req| None);
        bus.before(|_req| Some("early".into()));
        bus.before(|_req| Some("late".into()));

        let mut req = Request::new(Method::Get, "/");
        let result = bus.run_global_before(&mut req).unwrap();
        assert_eq!(result.prepare().body_ref().as_text(), Some("early"));
    }

    #[test]
    fn test_after_filters_run_in_order() {
        let mut bus = FilterBus::new();
        bus.after(|_req, resp| {
            *resp = resp.clone().header("x-first", b"1".to_vec());
        });
        bus.after(|_req, resp| {
            *resp = resp.clone().header("x-second", b"2".to_vec());
        });

        let req = Request::new(Method::Get, "/");
        let mut resp = Response::ok();
        bus.run_global_after(&req, &mut resp);
        assert!(resp.header_value("x-first").is_some());
        assert!(resp.header_value("x-second").is_some());
    }

    #[test]
    fn test_named_filter_receives_args() {
        let mut bus = FilterBus::new();
        bus.define("role", |_req, args| {
            if args.contains(&"admin".to_string()) {
                None
            } else {
                Some("denied".into())
            }
        });

        let mut req = Request::new(Method::Get, "/");
        assert!(
            bus.run_named_before("role", &mut req, &["admin".to_string()])
                .is_none()
        );
        assert!(
            bus.run_named_before("role", &mut req, &["guest".to_string()])
                .is_some()
        );
    }

    #[test]
    fn test_unknown_named_filter_is_noop() {
        let bus = FilterBus::new();
        let mut req = Request::new(Method::Get, "/");
        assert!(bus.run_named_before("ghost", &mut req, &[]).is_none());
    }

    #[test]
    fn test_matched_broadcast() {
        static HITS: AtomicUsize = AtomicUsize::new(0);
        let mut bus = FilterBus::new();
        bus.on_matched(|_req| {
            HITS.fetch_add(1, Ordering::SeqCst);
        });
        bus.on_matched(|_req| {
            HITS.fetch_add(1, Ordering::SeqCst);
        });

        bus.run_matched(&Request::new(Method::Get, "/"));
        assert_eq!(HITS.load(Ordering::SeqCst), 2);
    }
}
