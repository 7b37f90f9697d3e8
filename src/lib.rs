//! # greeter
//!
//! A small HTTP service that answers greetings on every common verb, with an
//! optional payload logger for debugging what goes over the wire.
//!
//! ## Pieces
//!
//! - [`greeting`]: the routes and the [`GreetingService`] state they share
//!   (a sequence counter and an id → name registry).
//! - [`middleware::payload`]: logs request and response bodies at `DEBUG`
//!   without stealing them from the handler or the client.
//! - The HTTP plumbing underneath: a [`Router`] of radix trees, type-erased
//!   handlers, a middleware chain, and a hyper [`Server`] with graceful
//!   shutdown.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use greeter::{GreetingService, PayloadLogging, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = greeter::app(Arc::new(GreetingService::new()), PayloadLogging::new(true));
//!
//!     Server::bind(([127, 0, 0, 1], 8080).into()).serve(app).await.unwrap();
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod config;
pub mod greeting;
pub mod health;
pub mod middleware;

use std::sync::Arc;

pub use config::Config;
pub use error::{ApiError, Error};
pub use greeting::{Greeting, GreetingService, Person};
pub use handler::Handler;
pub use method::Method;
pub use middleware::payload::PayloadLogging;
pub use request::Request;
pub use response::{IntoResponse, Json, Response};
pub use router::Router;
pub use server::Server;
pub use status::Status;

/// The full application: greeting routes, health probes, payload logging.
pub fn app(service: Arc<GreetingService>, payload: PayloadLogging) -> Router {
    let router = Router::new()
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness)
        .layer(payload);
    greeting::routes(router, service)
}
