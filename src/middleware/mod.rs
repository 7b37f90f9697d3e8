//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns. A middleware receives the [`Request`] and a [`Next`]
//! handle; it may inspect or replace the request, call `next.run(req)` to
//! invoke the rest of the chain, then inspect or replace the response.
//!
//! ```text
//! server ─▶ layer 0 ─▶ layer 1 ─▶ … ─▶ endpoint (route handler, 404 or 405)
//!        ◀─         ◀─         ◀─   ◀─
//! ```
//!
//! Layers run in registration order on the way in and in reverse on the way
//! out. The endpoint is always reached through the full chain, including for
//! unmatched paths.
//!
//! Built-in middleware:
//! - [`payload::PayloadLogging`]: debug logging of request/response payloads

pub mod payload;

use std::sync::Arc;

use crate::handler::BoxedHandler;
use crate::request::Request;

pub use crate::handler::BoxFuture;

/// A request/response interceptor.
pub trait Middleware: Send + Sync + 'static {
    /// Handles one request. Implementations must call [`Next::run`] exactly
    /// once unless they short-circuit with their own response.
    fn handle(&self, req: Request, next: Next) -> BoxFuture;
}

/// The remainder of the middleware chain, ending at the endpoint.
pub struct Next {
    chain: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    endpoint: BoxedHandler,
}

impl Next {
    pub(crate) fn new(chain: Arc<[Arc<dyn Middleware>]>, endpoint: BoxedHandler) -> Self {
        Self { chain, index: 0, endpoint }
    }

    /// Runs the next layer, or the endpoint once the chain is exhausted.
    pub fn run(self, req: Request) -> BoxFuture {
        match self.chain.get(self.index) {
            Some(layer) => {
                let layer = Arc::clone(layer);
                let rest = Next {
                    chain: self.chain,
                    index: self.index + 1,
                    endpoint: self.endpoint,
                };
                layer.handle(req, rest)
            }
            None => self.endpoint.call(req),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::Uri;

    use super::*;
    use crate::handler::Handler;
    use crate::method::Method;
    use crate::response::Response;

    struct Tag(&'static str, Arc<Mutex<Vec<String>>>);

    impl Middleware for Tag {
        fn handle(&self, req: Request, next: Next) -> BoxFuture {
            let name = self.0;
            let log = Arc::clone(&self.1);
            Box::pin(async move {
                log.lock().unwrap().push(format!("{name} in"));
                let res = next.run(req).await;
                log.lock().unwrap().push(format!("{name} out"));
                res
            })
        }
    }

    #[tokio::test]
    async fn layers_nest_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain: Arc<[Arc<dyn Middleware>]> = Arc::from(vec![
            Arc::new(Tag("a", Arc::clone(&log))) as Arc<dyn Middleware>,
            Arc::new(Tag("b", Arc::clone(&log))) as Arc<dyn Middleware>,
        ]);
        let endpoint = {
            let log = Arc::clone(&log);
            move |_req: Request| {
                log.lock().unwrap().push("endpoint".to_owned());
                async { Response::text("done") }
            }
        }
        .into_boxed_handler();

        let res = Next::new(chain, endpoint)
            .run(Request::new(Method::Get, Uri::from_static("/")))
            .await;

        assert_eq!(res.body(), b"done");
        assert_eq!(*log.lock().unwrap(), ["a in", "b in", "endpoint", "b out", "a out"]);
    }
}
