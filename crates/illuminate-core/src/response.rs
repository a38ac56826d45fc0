//! HTTP response types and raw-return coercion.
//!
//! Handlers may return a fully-built [`Response`] or a raw value (text,
//! JSON) carried by [`ResponseValue`]; the router coerces the raw value
//! into a `Response` before any "after" filters run.

use serde::Serialize;

/// HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    /// 200 OK
    pub const OK: Self = Self(200);
    /// 201 Created
    pub const CREATED: Self = Self(201);
    /// 204 No Content
    pub const NO_CONTENT: Self = Self(204);
    /// 301 Moved Permanently
    pub const MOVED_PERMANENTLY: Self = Self(301);
    /// 302 Found
    pub const FOUND: Self = Self(302);
    /// 400 Bad Request
    pub const BAD_REQUEST: Self = Self(400);
    /// 401 Unauthorized
    pub const UNAUTHORIZED: Self = Self(401);
    /// 403 Forbidden
    pub const FORBIDDEN: Self = Self(403);
    /// 404 Not Found
    pub const NOT_FOUND: Self = Self(404);
    /// 405 Method Not Allowed
    pub const METHOD_NOT_ALLOWED: Self = Self(405);
    /// 500 Internal Server Error
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);

    /// Create a status code from a raw `u16`.
    #[must_use]
    pub fn new(code: u16) -> Self {
        Self(code)
    }

    /// The numeric status code.
    #[must_use]
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// Whether this is a 2xx status.
    #[must_use]
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResponseBody {
    /// Empty body.
    #[default]
    Empty,
    /// Bytes body.
    Bytes(Vec<u8>),
}

impl ResponseBody {
    /// Body length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Bytes(bytes) => bytes.len(),
        }
    }

    /// Whether the body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The body as a UTF-8 string, if it is one.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Empty => Some(""),
            Self::Bytes(bytes) => std::str::from_utf8(bytes).ok(),
        }
    }
}

/// An HTTP response.
#[derive(Debug, Clone, Default)]
pub struct Response {
    status: Option<StatusCode>,
    headers: Vec<(String, Vec<u8>)>,
    body: ResponseBody,
}

impl Response {
    /// Create a 200 OK response with no body.
    #[must_use]
    pub fn ok() -> Self {
        Self::with_status(StatusCode::OK)
    }

    /// Create a 204 No Content response.
    #[must_use]
    pub fn no_content() -> Self {
        Self::with_status(StatusCode::NO_CONTENT)
    }

    /// Create a response with the given status and no body.
    #[must_use]
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status: Some(status),
            headers: Vec::new(),
            body: ResponseBody::Empty,
        }
    }

    /// Set the status code.
    #[must_use]
    pub fn status_code(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a plain-text body with its content type.
    #[must_use]
    pub fn body_text(mut self, text: impl Into<String>) -> Self {
        self.body = ResponseBody::Bytes(text.into().into_bytes());
        self.header("content-type", b"text/plain; charset=utf-8".to_vec())
    }

    /// Set a raw bytes body.
    #[must_use]
    pub fn body(mut self, body: ResponseBody) -> Self {
        self.body = body;
        self
    }

    /// Set a JSON body from a `serde_json::Value`.
    #[must_use]
    pub fn json(mut self, value: &serde_json::Value) -> Self {
        self.body = ResponseBody::Bytes(value.to_string().into_bytes());
        self.header("content-type", b"application/json".to_vec())
    }

    /// The status code (200 when never set).
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// All headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, Vec<u8>)] {
        &self.headers
    }

    /// The first header value for `name` (case-insensitive).
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }

    /// The response body.
    #[must_use]
    pub fn body_ref(&self) -> &ResponseBody {
        &self.body
    }

    /// Decompose into status, headers, and body.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, Vec<(String, Vec<u8>)>, ResponseBody) {
        (self.status.unwrap_or(StatusCode::OK), self.headers, self.body)
    }
}

/// A raw handler return value, coerced into a [`Response`] by the router.
///
/// Strings become `text/plain` responses, JSON values become
/// `application/json`, `Empty` becomes an empty 200.
#[derive(Debug)]
pub enum ResponseValue {
    /// A fully-built response, passed through untouched.
    Response(Response),
    /// Plain text.
    Text(String),
    /// A JSON document.
    Json(serde_json::Value),
    /// Nothing; coerces to an empty 200.
    Empty,
}

impl ResponseValue {
    /// Serialize any `Serialize` value into a JSON response value.
    pub fn json_of<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Coerce into a concrete [`Response`].
    #[must_use]
    pub fn prepare(self) -> Response {
        match self {
            Self::Response(response) => response,
            Self::Text(text) => Response::ok().body_text(text),
            Self::Json(value) => Response::ok().json(&value),
            Self::Empty => Response::ok(),
        }
    }
}

impl From<Response> for ResponseValue {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl From<String> for ResponseValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ResponseValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<serde_json::Value> for ResponseValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<StatusCode> for ResponseValue {
    fn from(status: StatusCode) -> Self {
        Self::Response(Response::with_status(status))
    }
}

impl From<()> for ResponseValue {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_builder() {
        let resp = Response::ok()
            .header("x-custom", b"1".to_vec())
            .body_text("hello");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.header_value("X-Custom"), Some(&b"1"[..]));
        assert_eq!(resp.body_ref().as_text(), Some("hello"));
    }

    #[test]
    fn test_text_coercion() {
        let resp = ResponseValue::from("hi").prepare();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body_ref().as_text(), Some("hi"));
        assert_eq!(
            resp.header_value("content-type"),
            Some(&b"text/plain; charset=utf-8"[..])
        );
    }

    #[test]
    fn test_json_coercion() {
        let resp = ResponseValue::from(json!({"id": 5})).prepare();
        assert_eq!(
            resp.header_value("content-type"),
            Some(&b"application/json"[..])
        );
        assert_eq!(resp.body_ref().as_text(), Some(r#"{"id":5}"#));
    }

    #[test]
    fn test_json_of_serialize() {
        #[derive(Serialize)]
        struct Item {
            id: u32,
        }
        let value = ResponseValue::json_of(&Item { id: 9 }).unwrap();
        let resp = value.prepare();
        assert_eq!(resp.body_ref().as_text(), Some(r#"{"id":9}"#));
    }

    #[test]
    fn test_empty_coercion() {
        let resp = ResponseValue::Empty.prepare();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.body_ref().is_empty());
    }
}
