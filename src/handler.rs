//! Handler trait and type erasure.
//!
//! # How async handlers are stored
//!
//! The router holds handlers of *different* types in a single
//! `HashMap<Method, Tree>`, and the greeting routes are closures that each
//! capture their own `Arc<GreetingService>`. Collections hold one concrete
//! type, so **trait objects** (`dyn ErasedHandler`) hide the concrete handler
//! type behind a common interface.
//!
//! The chain from user code to vtable call is:
//!
//! ```text
//! move |req| async move { svc.greet() }           ← route closure
//!        ↓ router.get("/greeting", …)
//! closure.into_boxed_handler()                     ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(closure))                     ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req)  at request time               ← one vtable dispatch
//!        ↓
//! Box::pin(async { fut.await.into_response() })    ← BoxFuture
//! ```
//!
//! The same [`BoxFuture`] type is what [`Middleware`](crate::middleware::Middleware)
//! implementations return, so the endpoint and every layer around it share
//! one calling convention.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Erased types ──────────────────────────────────────────────────────────────

/// The future every handler and middleware layer resolves to.
///
/// Boxed and pinned so futures of different concrete types fit one slot;
/// `Send + 'static` so hyper can drive it on any worker thread.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Object-safe call interface behind [`BoxedHandler`].
///
/// Public only because it shows up in [`Handler::into_boxed_handler`].
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A handler as the router stores it. Cloning is one atomic increment.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Handler ───────────────────────────────────────────────────────────────────

/// Anything that can serve a route.
///
/// Satisfied automatically by:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// move |req: Request| async move { … }   // returning impl IntoResponse
/// ```
///
/// Sealed: the blanket impl below is the only implementation.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Bridges a concrete `F` to [`ErasedHandler`].
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::Uri;

    use super::*;
    use crate::method::Method;
    use crate::status::Status;

    async fn reject(_req: Request) -> Status {
        Status::BadRequest
    }

    #[tokio::test]
    async fn async_fn_is_a_handler() {
        let h = reject.into_boxed_handler();
        let res = h.call(Request::new(Method::Get, Uri::from_static("/"))).await;
        assert_eq!(res.status_code(), 400);
    }

    #[tokio::test]
    async fn closure_keeps_its_captured_state() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = {
            let hits = Arc::clone(&hits);
            move |_req: Request| {
                let n = hits.fetch_add(1, Ordering::Relaxed) + 1;
                async move { format!("hit {n}") }
            }
        }
        .into_boxed_handler();

        h.call(Request::new(Method::Get, Uri::from_static("/"))).await;
        let res = h.call(Request::new(Method::Get, Uri::from_static("/"))).await;
        assert_eq!(res.body(), b"hit 2");
        assert_eq!(hits.load(Ordering::Relaxed), 2);
    }
}
