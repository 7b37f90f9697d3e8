//! Incoming HTTP request type.
//!
//! The body is read off the wire exactly once, by the server, into a
//! [`Bytes`] buffer. Everything downstream (handlers, the payload logger)
//! shares that buffer; cloning it bumps a reference count, it does not copy.

use std::collections::HashMap;

use bytes::Bytes;
use http::Uri;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::method::Method;

/// An incoming HTTP request with its body fully buffered.
///
/// The method is kept as it arrived on the wire, so a request with a method
/// greeter does not route can still be logged and answered.
pub struct Request {
    pub(crate) method: http::Method,
    pub(crate) uri: Uri,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    /// Builds a request by hand. The server uses [`Request::from_parts`];
    /// this is for driving a [`Router`](crate::Router) in-process.
    pub fn new(method: Method, uri: Uri) -> Self {
        let query = parse_query(&uri);
        Self {
            method: method.into(),
            uri,
            headers: Vec::new(),
            query,
            body: Bytes::new(),
            params: HashMap::new(),
        }
    }

    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        let headers = parts.headers.iter()
            .map(|(k, v)| (k.as_str().to_owned(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let query = parse_query(&parts.uri);
        Self { method: parts.method, uri: parts.uri, headers, query, body, params: HashMap::new() }
    }

    /// Appends a header. Returns `self` for chaining.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Replaces the body. Returns `self` for chaining.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub(crate) fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// `None` for methods outside RFC 9110, e.g. WebDAV's `PROPFIND`.
    pub fn method(&self) -> Option<Method> { Method::try_from(&self.method).ok() }
    pub fn method_name(&self) -> &str { self.method.as_str() }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn query_pairs(&self) -> &[(String, String)] { &self.query }
    pub fn body(&self) -> &[u8] { &self.body }

    /// A cheap handle on the buffered body.
    pub fn body_bytes(&self) -> Bytes { self.body.clone() }

    /// Case-insensitive header lookup. Returns the first value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First value of a query-string parameter.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The `charset` parameter of the `content-type` header, if any.
    pub fn charset(&self) -> Option<&str> {
        self.header("content-type").and_then(charset_of)
    }

    /// Deserializes the body as JSON. An empty body is a validation error.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        if self.body.is_empty() {
            return Err(ApiError::Validation("request body is required".to_owned()));
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::Validation(format!("malformed JSON body: {e}")))
    }
}

fn parse_query(uri: &Uri) -> Vec<(String, String)> {
    uri.query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

/// Extracts `charset` from a `content-type` value such as
/// `application/json; charset=UTF-8`.
pub(crate) fn charset_of(content_type: &str) -> Option<&str> {
    content_type.split(';')
        .skip(1)
        .filter_map(|p| p.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, v)| v.trim().trim_matches('"'))
}
