//! Error types.
//!
//! Two families live here and they never mix:
//!
//! - [`Error`]: infrastructure failures: binding a port, accepting a
//!   connection, reading the configuration file. Returned from startup code.
//! - [`ApiError`]: the closed set of things a request can get wrong. Handlers
//!   return it in a `Result`; it converts into an HTTP response on the way out.

use thiserror::Error;

use crate::response::{IntoResponse, Response};
use crate::status::Status;

/// The error type returned by greeter's fallible startup operations.
///
/// Application-level errors are expressed as [`ApiError`] values and end up as
/// HTTP responses, not as `Error`s.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(String),
}

/// Request-level failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Missing or malformed input: query parameters, JSON bodies.
    #[error("{0}")]
    Validation(String),

    /// Raised by `PUT /greeting/put` when the query id and the payload id
    /// compare equal.
    #[error("id must be equal")]
    IdMismatch,

    /// Bytes that could not be decoded with the declared charset.
    #[error("{0}")]
    Encoding(String),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::IdMismatch    => "id_mismatch",
            Self::Encoding(_)   => "encoding",
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Validation(_) => Status::BadRequest,
            Self::IdMismatch    => Status::InternalServerError,
            Self::Encoding(_)   => Status::InternalServerError,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        Response::builder()
            .status(self.status())
            .json(body.to_string().into_bytes())
    }
}
