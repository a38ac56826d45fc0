//! Core types and traits for the illuminate_rust routing engine.
//!
//! This crate provides the fundamental building blocks:
//! - [`Request`] and [`Response`] types with raw-return coercion
//! - The [`HttpError`] taxonomy and [`ExceptionRenderer`] seam
//! - The [`Container`]/[`Resolver`] collaborator interface
//! - The [`FilterBus`] event broadcaster for dispatch hooks
//! - The generic onion [`Pipeline`](pipeline::Pipeline)
//!
//! # Design Principles
//!
//! - Registration-time state is frozen before serving; dispatch reads only
//! - No process-wide globals; collaborators are injected
//! - Request-time failures are values (`Result` + `?`), never panics

#![forbid(unsafe_code)]

pub mod container;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod request;
pub mod response;

pub use container::{Container, Resolver, resolve_as};
pub use error::{AllowedMethods, DefaultExceptionRenderer, ExceptionRenderer, HttpError};
pub use events::{
    AfterFilter, BeforeFilter, FilterBus, MatchedListener, NamedAfterFilter, NamedBeforeFilter,
};
pub use pipeline::{Next, PipeFn, Pipeline};
pub use request::{InvalidMethod, Method, Request, Scheme, normalize_path};
pub use response::{Response, ResponseBody, ResponseValue, StatusCode};
