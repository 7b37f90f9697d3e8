//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. You register a path, you
//! get a handler. Middleware registered with [`Router::layer`] wraps every
//! dispatch, including 404 and 405 fallbacks.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// One radix tree per HTTP method. Build it once at startup; pass it to
/// [`Server::serve`](crate::Server::serve). Every registration returns `self`
/// so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    layers: Arc<[Arc<dyn Middleware>]>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), layers: Arc::from([]) }
    }

    /// Adds `handler` under `method` and `path`.
    ///
    /// ```rust,no_run
    /// # use greeter::{Method, Request, Response, Router};
    /// # async fn greet(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::Get, "/greeting", greet)
    ///     .on(Method::Post, "/greeting", greet);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or is already registered for
    /// `method`. Routes are fixed at startup, so this is a programming error.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.add(method, path, handler)
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::Post, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::Put, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::Patch, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::Delete, path, handler)
    }

    pub fn options(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::Options, path, handler)
    }

    pub fn head(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::Head, path, handler)
    }

    /// Appends a middleware. The first layer added is the outermost.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        let added: Arc<dyn Middleware> = Arc::new(middleware);
        self.layers = self.layers.iter().cloned().chain([added]).collect();
        self
    }

    fn add(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
        self
    }

    /// Routes one request through the middleware chain to its endpoint.
    pub async fn handle(&self, req: Request) -> Response {
        let found = req.method().and_then(|m| self.lookup(m, req.path()));
        let (endpoint, req) = match found {
            Some((handler, params)) => (handler, req.with_params(params)),
            None => (self.fallback(req.method(), req.path()), req),
        };

        Next::new(Arc::clone(&self.layers), endpoint).run(req).await
    }

    /// Answers `req` with `status` without routing it. The middleware chain
    /// still runs.
    pub(crate) async fn reject(&self, req: Request, status: Status) -> Response {
        let endpoint = (move |_req: Request| async move { status }).into_boxed_handler();
        Next::new(Arc::clone(&self.layers), endpoint).run(req).await
    }

    pub(crate) fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// Methods that have a route matching `path`.
    fn allowed(&self, path: &str) -> Vec<Method> {
        Method::ALL.into_iter()
            .filter(|m| self.routes.get(m).is_some_and(|tree| tree.at(path).is_ok()))
            .collect()
    }

    /// `405` with an `allow` header when the path exists under another method,
    /// `404` otherwise. A method outside RFC 9110 is always `405`.
    fn fallback(&self, method: Option<Method>, path: &str) -> BoxedHandler {
        let allowed = self.allowed(path);
        if allowed.is_empty() {
            let status = if method.is_some() { Status::NotFound } else { Status::MethodNotAllowed };
            return (move |_req: Request| async move { status }).into_boxed_handler();
        }

        let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
        (move |_req: Request| {
            let allow = allow.clone();
            async move {
                Response::builder()
                    .status(Status::MethodNotAllowed)
                    .header("allow", &allow)
                    .no_body()
            }
        })
        .into_boxed_handler()
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
