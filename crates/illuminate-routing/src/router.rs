//! The router: registration surface and dispatch orchestration.
//!
//! Registration (routes, groups, resources, binders, filters, patterns)
//! happens before serving and freezes the table; dispatch then reads the
//! frozen state only. One dispatch is one straight-line pass:
//!
//! 1. asset probe (bypasses routing entirely)
//! 2. global before filters (first non-null result wins)
//! 3. match, bind parameters, run binders
//! 4. route before filters
//! 5. middleware pipeline around the route handler
//! 6. route after filters, then global after filters
//!
//! Every early exit except a route-before short-circuit still flows
//! through the global after filters.

use crate::binding::{Binder, BinderRegistry};
use crate::collection::RouteCollection;
use crate::controller::{Controller, ControllerDispatcher};
use crate::group::{GroupAttributes, GroupStack};
use crate::http_pipeline::{Pipe, PipeSpec, RequestPipeline};
use crate::params::ParamValue;
use crate::resource::{self, ResourceOptions};
use crate::route::{Action, Route};
use illuminate_core::{
    Container, DefaultExceptionRenderer, ExceptionRenderer, FilterBus, HttpError, Method, Request,
    Response, ResponseValue,
};
use std::sync::Arc;

/// The matched-route summary deposited into the request's extensions
/// before filters and middleware run.
#[derive(Debug, Clone)]
pub struct CurrentRoute {
    /// The route name, if assigned.
    pub name: Option<String>,
    /// The trimmed uri template.
    pub uri: String,
    /// The verbs the route serves.
    pub methods: Vec<Method>,
}

impl CurrentRoute {
    /// The matched-route summary for a request, if one has matched.
    #[must_use]
    pub fn of(request: &Request) -> Option<&Self> {
        request.get_extension::<Self>()
    }
}

type AssetProbe = Arc<dyn Fn(&Request) -> Option<Response> + Send + Sync>;

/// The routing engine.
pub struct Router {
    container: Arc<Container>,
    routes: RouteCollection,
    binders: BinderRegistry,
    patterns: Vec<(String, String)>,
    groups: GroupStack,
    filters: FilterBus,
    renderer: Arc<dyn ExceptionRenderer>,
    asset_probe: Option<AssetProbe>,
    dispatcher: ControllerDispatcher,
}

impl Router {
    /// A router over a fresh container.
    #[must_use]
    pub fn new() -> Self {
        Self::with_container(Arc::new(Container::new()))
    }

    /// A router over a shared container.
    #[must_use]
    pub fn with_container(container: Arc<Container>) -> Self {
        Self {
            binders: BinderRegistry::new(Arc::clone(&container)),
            dispatcher: ControllerDispatcher::new(Arc::clone(&container)),
            container,
            routes: RouteCollection::new(),
            patterns: Vec::new(),
            groups: GroupStack::default(),
            filters: FilterBus::new(),
            renderer: Arc::new(DefaultExceptionRenderer),
            asset_probe: None,
        }
    }

    /// The container shared with controllers, middleware, and binders.
    #[must_use]
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Replace the exception renderer.
    pub fn set_exception_renderer(&mut self, renderer: Arc<dyn ExceptionRenderer>) {
        self.renderer = renderer;
    }

    /// Install the asset probe checked before routing.
    pub fn set_asset_probe<F>(&mut self, probe: F)
    where
        F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
    {
        self.asset_probe = Some(Arc::new(probe));
    }

    // ---- registration ----------------------------------------------------

    /// Register a route, applying the active group frame and global
    /// patterns.
    pub fn add(&mut self, mut route: Route) -> Arc<Route> {
        if let Some(attrs) = self.groups.current() {
            attrs.apply_to(&mut route);
        }
        for (key, pattern) in &self.patterns {
            route.ensure_where(key, pattern);
        }
        tracing::debug!(uri = route.uri(), methods = ?route.methods(), "route registered");
        self.routes.add(route)
    }

    /// Register a `GET` (and implicit `HEAD`) route.
    pub fn get(&mut self, uri: &str, action: Action) -> Arc<Route> {
        self.add(Route::get(uri, action))
    }

    /// Register a `POST` route.
    pub fn post(&mut self, uri: &str, action: Action) -> Arc<Route> {
        self.add(Route::post(uri, action))
    }

    /// Register a `PUT` route.
    pub fn put(&mut self, uri: &str, action: Action) -> Arc<Route> {
        self.add(Route::put(uri, action))
    }

    /// Register a `PATCH` route.
    pub fn patch(&mut self, uri: &str, action: Action) -> Arc<Route> {
        self.add(Route::patch(uri, action))
    }

    /// Register a `DELETE` route.
    pub fn delete(&mut self, uri: &str, action: Action) -> Arc<Route> {
        self.add(Route::delete(uri, action))
    }

    /// Register an `OPTIONS` route.
    pub fn options(&mut self, uri: &str, action: Action) -> Arc<Route> {
        self.add(Route::options(uri, action))
    }

    /// Register a route answering every common verb.
    pub fn any(&mut self, uri: &str, action: Action) -> Arc<Route> {
        self.add(Route::new(
            vec![
                Method::Get,
                Method::Head,
                Method::Post,
                Method::Put,
                Method::Patch,
                Method::Delete,
                Method::Options,
            ],
            uri,
            action,
        ))
    }

    /// Register a route over an explicit verb set.
    pub fn match_methods(&mut self, methods: &[Method], uri: &str, action: Action) -> Arc<Route> {
        self.add(Route::new(methods.to_vec(), uri, action))
    }

    /// Run `body` with the given group attributes active; nested calls
    /// merge into the enclosing frame.
    ///
    /// The frame is popped on every exit path, so a panic inside `body`
    /// cannot leak attributes onto routes registered afterwards.
    pub fn group<F>(&mut self, attributes: GroupAttributes, body: F)
    where
        F: FnOnce(&mut Self),
    {
        struct OpenFrame<'a>(&'a mut Router);

        impl Drop for OpenFrame<'_> {
            fn drop(&mut self) {
                self.0.groups.pop();
            }
        }

        self.groups.push(attributes);
        let mut frame = OpenFrame(self);
        body(&mut *frame.0);
    }

    /// Register the conventional CRUD routes for a resource.
    pub fn resource(&mut self, name: &str, controller: &str, options: ResourceOptions) {
        for route in resource::routes_for(name, controller, &options) {
            self.add(route);
        }
    }

    /// Register a global parameter constraint applied to routes added
    /// after this call; route and group constraints win.
    ///
    /// # Panics
    ///
    /// Panics when the pattern is not a valid regex.
    pub fn pattern(&mut self, key: impl Into<String>, pattern: impl Into<String>) {
        let key = key.into();
        let pattern = pattern.into();
        if let Err(err) = regex::Regex::new(&format!("^(?:{pattern})$")) {
            panic!("invalid global pattern for `{key}`: {err}");
        }
        self.patterns.push((key, pattern));
    }

    /// Bind a parameter name to a closure binder.
    pub fn bind<F>(&mut self, key: impl Into<String>, binder: F)
    where
        F: Fn(&str, &Route) -> Result<ParamValue, HttpError> + Send + Sync + 'static,
    {
        self.binders.bind(key, binder);
    }

    /// Bind a parameter name to a container-resolved binder target.
    pub fn bind_name(&mut self, key: impl Into<String>, reference: &str) {
        self.binders.bind_name(key, reference);
    }

    /// Bind an entity loader; a missing entity becomes a 404.
    pub fn model<F>(&mut self, key: impl Into<String>, loader: F)
    where
        F: Fn(&str) -> Option<ParamValue> + Send + Sync + 'static,
    {
        self.binders.model(key, loader);
    }

    /// Bind an entity loader with a custom missing-entity fallback.
    pub fn model_with<F, M>(&mut self, key: impl Into<String>, loader: F, missing: M)
    where
        F: Fn(&str) -> Option<ParamValue> + Send + Sync + 'static,
        M: Fn(&str) -> HttpError + Send + Sync + 'static,
    {
        self.binders.model_with(key, loader, missing);
    }

    /// Register a global before filter.
    pub fn before<F>(&mut self, filter: F)
    where
        F: Fn(&mut Request) -> Option<ResponseValue> + Send + Sync + 'static,
    {
        self.filters.before(filter);
    }

    /// Register a global after filter.
    pub fn after<F>(&mut self, filter: F)
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.filters.after(filter);
    }

    /// Define a named before filter routes can reference.
    pub fn filter<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: Fn(&mut Request, &[String]) -> Option<ResponseValue> + Send + Sync + 'static,
    {
        self.filters.define(name, filter);
    }

    /// Define a named after filter routes can reference.
    pub fn filter_after<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: Fn(&Request, &mut Response, &[String]) + Send + Sync + 'static,
    {
        self.filters.define_after(name, filter);
    }

    /// Subscribe to the route-matched notification.
    pub fn on_matched<F>(&mut self, listener: F)
    where
        F: Fn(&Request) + Send + Sync + 'static,
    {
        self.filters.on_matched(listener);
    }

    /// Bind a middleware pipe under a name routes can reference.
    pub fn register_middleware(&self, name: impl Into<String>, pipe: Arc<dyn Pipe>) {
        self.container.bind(name, pipe);
    }

    /// Bind a controller under the name routes reference.
    pub fn register_controller(&self, name: impl Into<String>, controller: Arc<dyn Controller>) {
        self.container.bind(name, controller);
    }

    /// Bind a binder target under the name `bind_name` references.
    pub fn register_binder(&self, name: impl Into<String>, binder: Arc<dyn Binder>) {
        self.container.bind(name, binder);
    }

    /// Reverse lookup by route name.
    #[must_use]
    pub fn route_by_name(&self, name: &str) -> Option<&Arc<Route>> {
        self.routes.get_by_name(name)
    }

    /// Reverse lookup by `Controller@method` reference.
    #[must_use]
    pub fn route_by_action(&self, reference: &str) -> Option<&Arc<Route>> {
        self.routes.get_by_action(reference)
    }

    /// The registered route table.
    #[must_use]
    pub fn routes(&self) -> &RouteCollection {
        &self.routes
    }

    // ---- dispatch --------------------------------------------------------

    /// Dispatch a request to a response.
    ///
    /// Never returns an error: every failure is rendered into a response
    /// at the boundary where it surfaced.
    pub fn dispatch(&self, mut request: Request) -> Response {
        debug_assert!(self.groups.is_empty(), "dispatch inside an open route group");
        let span = tracing::debug_span!(
            "dispatch",
            method = %request.method(),
            path = request.path(),
        );
        let _guard = span.enter();

        if let Some(probe) = &self.asset_probe {
            if let Some(response) = probe(&request) {
                tracing::debug!("request served by asset probe");
                return self.finish(&request, response);
            }
        }

        if let Some(early) = self.filters.run_global_before(&mut request) {
            tracing::debug!("request short-circuited by global before filter");
            let response = early.prepare();
            return self.finish(&request, response);
        }

        let response = self.dispatch_to_route(&mut request);
        self.finish(&request, response)
    }

    fn dispatch_to_route(&self, request: &mut Request) -> Response {
        let route = match self.routes.match_request(request) {
            Ok(route) => route,
            Err(err) => return self.renderer.render(err),
        };

        let mut params = route.bind(request);
        if let Err(err) = self.binders.apply(&mut params, &route) {
            return self.renderer.render(err);
        }

        request.insert_extension(CurrentRoute {
            name: route.name().map(ToString::to_string),
            uri: route.uri().to_string(),
            methods: route.methods().to_vec(),
        });
        self.filters.run_matched(request);

        for (name, args) in route.before_filters() {
            if let Some(early) = self.filters.run_named_before(name, request, args) {
                return early.prepare();
            }
        }

        let pipeline = RequestPipeline::new(Arc::clone(&self.container), Arc::clone(&self.renderer))
            .through(self.gather_middleware(&route));

        let handler_route = Arc::clone(&route);
        let dispatcher = self.dispatcher.clone();
        let mut response = pipeline.run(request, move |req| match handler_route.action() {
            Action::Closure(handler) => handler(req, &params),
            Action::Controller { name, method } => dispatcher.dispatch(name, method, req, &params),
        });

        for (name, args) in route.after_filters() {
            self.filters.run_named_after(name, request, &mut response, args);
        }
        response
    }

    /// Route middleware first, then controller-declared middleware that
    /// covers the action, duplicates removed.
    fn gather_middleware(&self, route: &Route) -> Vec<PipeSpec> {
        let mut names: Vec<String> = route.middleware().to_vec();
        if let Action::Controller { name, method } = route.action() {
            for declared in self.dispatcher.middleware_for(name, method) {
                if !names.contains(&declared) {
                    names.push(declared);
                }
            }
        }
        names.into_iter().map(PipeSpec::Named).collect()
    }

    fn finish(&self, request: &Request, mut response: Response) -> Response {
        self.filters.run_global_after(request, &mut response);
        response
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}
