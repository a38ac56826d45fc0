//! Error taxonomy for the routing core.
//!
//! Request-time failures are [`HttpError`] values propagated with `?` and
//! translated into responses by an [`ExceptionRenderer`] at the pipeline
//! boundary. Structural mistakes (bad patterns, unbalanced groups) are
//! programming defects and fail fast at registration time instead.

use crate::request::Method;
use crate::response::{Response, StatusCode};
use thiserror::Error;

/// Normalized allow-list of methods for a 405 or a synthesized OPTIONS
/// response.
///
/// - Adds `HEAD` if `GET` is present.
/// - Sorts and de-duplicates for stable output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedMethods {
    methods: Vec<Method>,
}

impl AllowedMethods {
    /// Create a normalized allow list.
    #[must_use]
    pub fn new(mut methods: Vec<Method>) -> Self {
        if methods.contains(&Method::Get) && !methods.contains(&Method::Head) {
            methods.push(Method::Head);
        }
        methods.sort_by_key(method_order);
        methods.dedup();
        Self { methods }
    }

    /// Access the normalized methods.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Check whether a method is allowed.
    #[must_use]
    pub fn contains(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }

    /// Format as an HTTP `Allow` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        let mut out = String::new();
        for (idx, method) in self.methods.iter().enumerate() {
            if idx > 0 {
                out.push_str(", ");
            }
            out.push_str(method.as_str());
        }
        out
    }
}

fn method_order(method: &Method) -> u8 {
    match *method {
        Method::Get => 0,
        Method::Head => 1,
        Method::Post => 2,
        Method::Put => 3,
        Method::Delete => 4,
        Method::Patch => 5,
        Method::Options => 6,
        Method::Trace => 7,
    }
}

/// A request-time routing or dispatch failure.
#[derive(Debug, Error)]
pub enum HttpError {
    /// No route matches method, uri, host, and scheme.
    #[error("no route matched the request")]
    NotFound,

    /// The uri matches under at least one other verb.
    #[error("method not allowed (allow: {})", allowed.header_value())]
    MethodNotAllowed {
        /// The verbs that do match this uri.
        allowed: AllowedMethods,
    },

    /// A handler-prepared response escaping the pipeline; not a failure.
    /// Unwrapped to its carried response with no translation.
    #[error("deliberate short-circuit response")]
    ShortCircuit(Response),

    /// Any other failure raised by a handler or pipe.
    #[error("handler fault: {0}")]
    HandlerFault(String),
}

impl HttpError {
    /// A fault with the given description.
    #[must_use]
    pub fn fault(message: impl Into<String>) -> Self {
        Self::HandlerFault(message.into())
    }

    /// Wrap a response for deliberate early return through the pipeline.
    #[must_use]
    pub fn short_circuit(response: Response) -> Self {
        Self::ShortCircuit(response)
    }
}

/// Translates [`HttpError`] values into responses at the pipeline boundary.
pub trait ExceptionRenderer: Send + Sync {
    /// Produce the response for a request-time failure.
    ///
    /// `ShortCircuit` must unwrap to its carried response untranslated.
    fn render(&self, error: HttpError) -> Response;
}

/// Default renderer: 404 / 405 with `Allow` / 500.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExceptionRenderer;

impl ExceptionRenderer for DefaultExceptionRenderer {
    fn render(&self, error: HttpError) -> Response {
        match error {
            HttpError::NotFound => {
                Response::with_status(StatusCode::NOT_FOUND).body_text("Not Found")
            }
            HttpError::MethodNotAllowed { allowed } => {
                Response::with_status(StatusCode::METHOD_NOT_ALLOWED)
                    .header("allow", allowed.header_value().into_bytes())
                    .body_text("Method Not Allowed")
            }
            HttpError::ShortCircuit(response) => response,
            HttpError::HandlerFault(message) => {
                tracing::error!(fault = %message, "handler fault");
                Response::with_status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body_text("Internal Server Error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_methods_implies_head() {
        let allowed = AllowedMethods::new(vec![Method::Post, Method::Get]);
        assert!(allowed.contains(Method::Head));
        assert_eq!(allowed.header_value(), "GET, HEAD, POST");
    }

    #[test]
    fn test_allowed_methods_dedup() {
        let allowed = AllowedMethods::new(vec![Method::Put, Method::Put, Method::Delete]);
        assert_eq!(allowed.methods(), &[Method::Put, Method::Delete]);
    }

    #[test]
    fn test_render_not_found() {
        let resp = DefaultExceptionRenderer.render(HttpError::NotFound);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_render_method_not_allowed_carries_allow_header() {
        let allowed = AllowedMethods::new(vec![Method::Post]);
        let resp = DefaultExceptionRenderer.render(HttpError::MethodNotAllowed { allowed });
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.header_value("allow"), Some(&b"POST"[..]));
    }

    #[test]
    fn test_render_short_circuit_untranslated() {
        let carried = Response::with_status(StatusCode::FORBIDDEN).body_text("nope");
        let resp = DefaultExceptionRenderer.render(HttpError::ShortCircuit(carried));
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(resp.body_ref().as_text(), Some("nope"));
    }

    #[test]
    fn test_render_fault_is_500() {
        let resp = DefaultExceptionRenderer.render(HttpError::fault("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
