//! Expressive HTTP routing and dispatch, Laravel style.
//!
//! This facade crate re-exports the full public surface of the engine:
//! route registration with groups, resources, and parameter binders, an
//! onion middleware pipeline with per-stage exception boundaries, and a
//! container-backed controller dispatcher.
//!
//! # Quick start
//!
//! ```
//! use illuminate_rust::prelude::*;
//!
//! let mut router = Router::new();
//! router.get("users/{id}", Action::closure(|_req, params| {
//!     let id = params.get("id").and_then(ParamValue::as_str).unwrap_or("?");
//!     Ok(format!("user {id}").into())
//! }));
//!
//! let response = router.dispatch(Request::new(Method::Get, "/users/7"));
//! assert_eq!(response.body_ref().as_text(), Some("user 7"));
//! ```

#![forbid(unsafe_code)]

pub use illuminate_core::{
    AllowedMethods, Container, DefaultExceptionRenderer, ExceptionRenderer, FilterBus, HttpError,
    InvalidMethod, Method, Next, PipeFn, Pipeline, Request, Resolver, Response, ResponseBody,
    ResponseValue, Scheme, StatusCode, normalize_path, resolve_as,
};
pub use illuminate_routing::{
    Action, ActionContext, Binder, BinderRegistry, CompiledRoute, Controller,
    ControllerDispatcher, ControllerMiddleware, CurrentRoute, GroupAttributes, ParamValue,
    Parameters, PatternError, Pipe, PipeNext, PipeSpec, RequestPipeline, ResourceOptions, Route,
    RouteCollection, RouteHandler, RouteValidator, Router, compile,
};

/// The types most applications need, in one import.
pub mod prelude {
    pub use illuminate_core::{
        Container, HttpError, Method, Request, Response, ResponseValue, Scheme, StatusCode,
    };
    pub use illuminate_routing::{
        Action, ActionContext, Controller, ControllerMiddleware, CurrentRoute, GroupAttributes,
        ParamValue, Parameters, Pipe, PipeNext, PipeSpec, ResourceOptions, Route, Router,
    };
}
