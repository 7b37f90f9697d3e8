//! The status codes greeter emits.
//!
//! A [`Status`] converts to its numeric code with `u16::from` and is itself a
//! valid handler return value:
//!
//! ```rust
//! use greeter::{Response, Status};
//!
//! Response::status(Status::BadRequest);
//!
//! async fn gone(_req: greeter::Request) -> Status {
//!     Status::NotFound
//! }
//! ```

#[allow(clippy::enum_variant_names)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // 2xx
    Ok,                  // 200

    // 4xx
    BadRequest,          // 400
    NotFound,            // 404
    MethodNotAllowed,    // 405

    // 5xx
    InternalServerError, // 500
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok                  => 200,
            Status::BadRequest          => 400,
            Status::NotFound            => 404,
            Status::MethodNotAllowed    => 405,
            Status::InternalServerError => 500,
        }
    }
}
