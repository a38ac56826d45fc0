//! Route matching and dispatch for illuminate_rust.
//!
//! The crate is organized around one registration surface and one
//! dispatch path:
//!
//! - [`compiler`]: uri/domain templates to anchored regex matchers
//! - [`route`] / [`params`]: route definitions and bound parameters
//! - [`collection`] / [`validators`]: the indexed route table and its
//!   match chain
//! - [`group`] / [`resource`]: attribute stacking and CRUD expansion
//! - [`binding`]: parameter binders and entity loading
//! - [`controller`]: container-resolved controller actions
//! - [`http_pipeline`]: the middleware onion with per-stage exception
//!   boundaries
//! - [`router`]: the orchestrator tying it all together

#![forbid(unsafe_code)]

pub mod binding;
pub mod collection;
pub mod compiler;
pub mod controller;
pub mod group;
pub mod http_pipeline;
pub mod params;
pub mod resource;
pub mod route;
pub mod router;
pub mod validators;

pub use binding::{Binder, BinderRegistry};
pub use collection::RouteCollection;
pub use compiler::{CompiledRoute, PatternError, compile};
pub use controller::{ActionContext, Controller, ControllerDispatcher, ControllerMiddleware};
pub use group::GroupAttributes;
pub use http_pipeline::{Pipe, PipeNext, PipeSpec, RequestPipeline};
pub use params::{ParamValue, Parameters};
pub use resource::ResourceOptions;
pub use route::{Action, Route, RouteHandler};
pub use router::{CurrentRoute, Router};
pub use validators::{
    HostValidator, MethodValidator, RouteValidator, SchemeValidator, UriValidator,
};
