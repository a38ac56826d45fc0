//! HTTP request types.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::str::FromStr;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// HEAD
    Head,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
    /// TRACE
    Trace,
}

impl Method {
    /// All supported methods, in a stable order.
    #[must_use]
    pub fn all() -> [Method; 8] {
        [
            Self::Get,
            Self::Head,
            Self::Post,
            Self::Put,
            Self::Patch,
            Self::Delete,
            Self::Options,
            Self::Trace,
        ]
    }

    /// The uppercase wire representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown HTTP method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown HTTP method `{0}`")]
pub struct InvalidMethod(pub String);

impl FromStr for Method {
    type Err = InvalidMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            "TRACE" => Ok(Self::Trace),
            other => Err(InvalidMethod(other.to_string())),
        }
    }
}

/// Request scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// Plain HTTP.
    #[default]
    Http,
    /// TLS.
    Https,
}

impl Scheme {
    /// The lowercase wire representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// An HTTP request as seen by the routing core.
///
/// The routing engine only consumes method, scheme, host, and path; body and
/// header plumbing belong to the transport boundary. A `TypeId`-keyed
/// extension map lets middleware and the router deposit per-request state
/// (the matched route lands here after matching).
#[derive(Debug)]
pub struct Request {
    method: Method,
    scheme: Scheme,
    host: Option<String>,
    path: String,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Request {
    /// Create a new request with the given method and path.
    ///
    /// The path is normalized: duplicate slashes collapse and a leading
    /// slash is guaranteed.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            scheme: Scheme::Http,
            host: None,
            path: normalize_path(&path.into()),
            extensions: HashMap::new(),
        }
    }

    /// Set the request host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the request scheme.
    #[must_use]
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// The HTTP method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// The request scheme.
    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Whether the request arrived over TLS.
    #[must_use]
    pub fn secure(&self) -> bool {
        self.scheme == Scheme::Https
    }

    /// The request host, if known.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// The normalized request path, always with a leading slash.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path with surrounding slashes trimmed, `/` for the root.
    ///
    /// This is the form route templates are stored in, used as the
    /// fast-path lookup key. No percent-decoding happens here; the path
    /// is matched as given.
    #[must_use]
    pub fn trimmed_path(&self) -> &str {
        let trimmed = self.path.trim_matches('/');
        if trimmed.is_empty() { "/" } else { trimmed }
    }

    /// Insert a typed extension value.
    pub fn insert_extension<T: Any + Send + Sync>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a typed extension value.
    #[must_use]
    pub fn get_extension<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// Remove a typed extension value.
    pub fn remove_extension<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }
}

/// Collapse duplicate slashes and guarantee a leading slash.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    let mut prev_slash = true;
    for ch in path.chars() {
        if ch == '/' {
            if !prev_slash {
                out.push('/');
            }
            prev_slash = true;
        } else {
            out.push(ch);
            prev_slash = false;
        }
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("users"), "/users");
        assert_eq!(normalize_path("//users///5/"), "/users/5");
        assert_eq!(normalize_path("/users/5"), "/users/5");
    }

    #[test]
    fn test_trimmed_path() {
        let req = Request::new(Method::Get, "/users/5/");
        assert_eq!(req.path(), "/users/5");
        assert_eq!(req.trimmed_path(), "users/5");

        let root = Request::new(Method::Get, "/");
        assert_eq!(root.trimmed_path(), "/");
    }

    #[test]
    fn test_method_parse_roundtrip() {
        for method in Method::all() {
            assert_eq!(method.as_str().parse::<Method>().unwrap(), method);
        }
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, PartialEq)]
        struct Marker(u32);

        let mut req = Request::new(Method::Get, "/");
        assert!(req.get_extension::<Marker>().is_none());
        req.insert_extension(Marker(7));
        assert_eq!(req.get_extension::<Marker>(), Some(&Marker(7)));
        assert_eq!(req.remove_extension::<Marker>(), Some(Marker(7)));
        assert!(req.get_extension::<Marker>().is_none());
    }

    #[test]
    fn test_secure() {
        let req = Request::new(Method::Get, "/").with_scheme(Scheme::Https);
        assert!(req.secure());
        assert!(!Request::new(Method::Get, "/").secure());
    }
}
