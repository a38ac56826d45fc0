//! The HTTP-specialized middleware pipeline.
//!
//! Specializes the generic onion pipeline for request dispatch: every
//! stage (each pipe and the terminal route handler) runs inside an
//! exception boundary. A stage's `Err` is translated into a concrete
//! `Response` right there, so outer pipes always see a response come back
//! from `next` and their post-`next` code still runs. A deliberate
//! `ShortCircuit` unwraps to its carried response with no translation; a
//! panic becomes a `HandlerFault` before translation.
//!
//! Pipes reference container bindings by name (`"auth"` or
//! `"throttle:60,1"`), or are supplied inline as closures or trait-object
//! instances.

use illuminate_core::{
    Container, ExceptionRenderer, HttpError, Request, Response, ResponseValue, resolve_as,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// The continuation a pipe invokes to pass the request inward.
pub type PipeNext<'a> = Box<dyn FnOnce(&mut Request) -> Result<Response, HttpError> + 'a>;

/// A middleware stage.
pub trait Pipe: Send + Sync {
    /// Handle the request, usually by invoking `next` and decorating its
    /// response. Not calling `next` short-circuits the remaining stages
    /// and the route handler.
    ///
    /// # Errors
    ///
    /// An `Err` is rendered into a response at this stage's boundary.
    fn handle(
        &self,
        request: &mut Request,
        next: PipeNext<'_>,
        args: &[String],
    ) -> Result<Response, HttpError>;
}

type PipeClosure =
    Arc<dyn Fn(&mut Request, PipeNext<'_>) -> Result<Response, HttpError> + Send + Sync>;

/// How a pipeline stage is supplied.
#[derive(Clone)]
pub enum PipeSpec {
    /// An inline closure.
    Closure(PipeClosure),
    /// A container binding reference, `name` or `name:arg1,arg2`.
    Named(String),
    /// A pre-built instance, run with no arguments.
    Instance(Arc<dyn Pipe>),
}

impl PipeSpec {
    /// An inline closure stage.
    pub fn closure<F>(pipe: F) -> Self
    where
        F: Fn(&mut Request, PipeNext<'_>) -> Result<Response, HttpError> + Send + Sync + 'static,
    {
        Self::Closure(Arc::new(pipe))
    }

    /// A named reference stage.
    pub fn named(reference: impl Into<String>) -> Self {
        Self::Named(reference.into())
    }

    /// A pre-built instance stage.
    #[must_use]
    pub fn instance(pipe: Arc<dyn Pipe>) -> Self {
        Self::Instance(pipe)
    }
}

impl std::fmt::Debug for PipeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closure(_) => f.write_str("Closure(..)"),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Instance(_) => f.write_str("Instance(..)"),
        }
    }
}

/// A request's trip through its middleware into the route handler.
pub struct RequestPipeline {
    container: Arc<Container>,
    renderer: Arc<dyn ExceptionRenderer>,
    pipes: Vec<PipeSpec>,
}

impl RequestPipeline {
    /// An empty pipeline over the given collaborators.
    #[must_use]
    pub fn new(container: Arc<Container>, renderer: Arc<dyn ExceptionRenderer>) -> Self {
        Self {
            container,
            renderer,
            pipes: Vec::new(),
        }
    }

    /// Append stages in execution order.
    #[must_use]
    pub fn through(mut self, pipes: impl IntoIterator<Item = PipeSpec>) -> Self {
        self.pipes.extend(pipes);
        self
    }

    /// Append one stage.
    #[must_use]
    pub fn pipe(mut self, spec: PipeSpec) -> Self {
        self.pipes.push(spec);
        self
    }

    /// Run the request through all stages into the route handler.
    ///
    /// The handler's raw return value is coerced before the stages unwind,
    /// so post-`next` code in every pipe sees a concrete response.
    pub fn run<F>(self, request: &mut Request, destination: F) -> Response
    where
        F: FnOnce(&mut Request) -> Result<ResponseValue, HttpError>,
    {
        let renderer = Arc::clone(&self.renderer);
        let terminal = move |req: &mut Request| -> Response {
            let outcome = capture_panics(AssertUnwindSafe(|| {
                destination(req).map(ResponseValue::prepare)
            }));
            settle(renderer.as_ref(), outcome)
        };

        let mut chain: Box<dyn FnOnce(&mut Request) -> Response + '_> = Box::new(terminal);
        for spec in self.pipes.into_iter().rev() {
            let inner = chain;
            let container = Arc::clone(&self.container);
            let renderer = Arc::clone(&self.renderer);
            chain = Box::new(move |req: &mut Request| {
                let next: PipeNext<'_> = Box::new(move |r: &mut Request| Ok(inner(r)));
                let outcome = capture_panics(AssertUnwindSafe(|| {
                    run_spec(&spec, container.as_ref(), req, next)
                }));
                settle(renderer.as_ref(), outcome)
            });
        }
        chain(request)
    }
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("pipes", &self.pipes)
            .finish_non_exhaustive()
    }
}

fn run_spec(
    spec: &PipeSpec,
    container: &Container,
    request: &mut Request,
    next: PipeNext<'_>,
) -> Result<Response, HttpError> {
    match spec {
        PipeSpec::Closure(pipe) => pipe(request, next),
        PipeSpec::Instance(pipe) => pipe.handle(request, next, &[]),
        PipeSpec::Named(reference) => {
            let (name, args) = parse_reference(reference);
            let pipe: Arc<dyn Pipe> = resolve_as(container, name)
                .ok_or_else(|| HttpError::fault(format!("middleware `{name}` is not bound")))?;
            pipe.handle(request, next, &args)
        }
    }
}

/// Split `name:arg1,arg2` into its binding name and arguments.
fn parse_reference(reference: &str) -> (&str, Vec<String>) {
    match reference.split_once(':') {
        Some((name, rest)) => {
            let args = rest
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect();
            (name, args)
        }
        None => (reference, Vec::new()),
    }
}

fn capture_panics<F>(stage: AssertUnwindSafe<F>) -> Result<Response, HttpError>
where
    F: FnOnce() -> Result<Response, HttpError>,
{
    panic::catch_unwind(stage).unwrap_or_else(|payload| Err(HttpError::HandlerFault(panic_message(&payload))))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Per-stage boundary: short-circuits unwrap untranslated, everything
/// else an `Err` carries goes through the renderer.
fn settle(renderer: &dyn ExceptionRenderer, outcome: Result<Response, HttpError>) -> Response {
    match outcome {
        Ok(response) => response,
        Err(HttpError::ShortCircuit(response)) => response,
        Err(error) => renderer.render(error),
    }
}
