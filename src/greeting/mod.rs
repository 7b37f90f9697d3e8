//! The greeting endpoints.
//!
//! | Route | Verbs | Input |
//! |---|---|---|
//! | `/greeting` | GET, POST | `?name=` (ignored) |
//! | `/greeting/post` | GET, POST | JSON [`Person`] body |
//! | `/greeting/put` | PUT | `?id=` + JSON [`Person`] body |
//! | `/greeting/patch` | PATCH | `?id=` + JSON [`Person`] body |
//! | `/greeting/delete` | DELETE | `?id=` |
//! | `/greeting/options` | OPTIONS | — |
//! | `/greeting/head` | HEAD | `?id=` |
//!
//! Every route answers with a JSON [`Greeting`].

mod model;
mod service;

use std::sync::Arc;

pub use model::{DecimalId, Greeting, Person};
pub use service::{GreetingService, SequenceCounter};

use crate::error::ApiError;
use crate::handler::Handler;
use crate::method::Method;
use crate::request::Request;
use crate::response::Json;
use crate::router::Router;

/// Registers every greeting route on `router`, all sharing `service`.
pub fn routes(router: Router, service: Arc<GreetingService>) -> Router {
    let svc = || Arc::clone(&service);
    router
        .on(Method::Get, "/greeting", endpoint(svc(), |s, _| Ok(s.greet())))
        .on(Method::Post, "/greeting", endpoint(svc(), |s, _| Ok(s.greet())))
        .on(Method::Get, "/greeting/post", endpoint(svc(), post))
        .on(Method::Post, "/greeting/post", endpoint(svc(), post))
        .put("/greeting/put", endpoint(svc(), |s, req| s.put(query_id(req)?, &req.json()?)))
        .patch("/greeting/patch", endpoint(svc(), |s, req| Ok(s.patch(&query_id(req)?, &req.json()?))))
        .delete("/greeting/delete", endpoint(svc(), |s, req| Ok(s.delete(&query_id(req)?))))
        .options("/greeting/options", endpoint(svc(), |s, _| Ok(s.options())))
        .head("/greeting/head", endpoint(svc(), |s, req| Ok(s.head(&query_id(req)?))))
}

fn post(s: &GreetingService, req: &Request) -> Result<Greeting, ApiError> {
    Ok(s.post(&req.json()?))
}

/// Adapts a synchronous greeting operation into a route handler.
fn endpoint<F>(service: Arc<GreetingService>, op: F) -> impl Handler
where
    F: Fn(&GreetingService, &Request) -> Result<Greeting, ApiError> + Send + Sync + 'static,
{
    move |req: Request| {
        let result = op(&service, &req).map(Json);
        async move { result }
    }
}

/// The required `id` query parameter.
fn query_id(req: &Request) -> Result<DecimalId, ApiError> {
    req.query("id")
        .ok_or_else(|| ApiError::Validation("missing query parameter `id`".to_owned()))?
        .parse()
}
