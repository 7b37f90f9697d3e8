//! Debug logging of request and response payloads.
//!
//! When verbose, [`PayloadLogging`] emits two `DEBUG` records under the
//! [`TARGET`] target for every request: one describing the request (URI,
//! headers, query parameters, body) and one describing the response (status,
//! headers, body). When not verbose it forwards the request untouched and
//! costs nothing.
//!
//! # Reading a body twice
//!
//! The request body is already buffered by the server, so capturing it is a
//! reference-count bump on the same [`Bytes`]. The handler reads its copy, the
//! logger reads the other.
//!
//! The response is the other way round: its body is moved *out* of the
//! response into a [`CapturedResponse`] so the logger can read it, then
//! [`CapturedResponse::replay`] moves it back. Skipping the replay would send
//! the client an empty body.
//!
//! # Failures
//!
//! A body that cannot be decoded (unsupported charset) is logged at `ERROR`
//! and shown as empty; the request carries on. Logging something that was
//! never captured returns [`PayloadError::NotCaptured`]. None of this ever
//! changes the response the client receives.

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, error, Level};

use crate::error::ApiError;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::request::{charset_of, Request};
use crate::response::Response;

/// The `tracing` target payload records are written under.
pub const TARGET: &str = "greeter::payload";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("{0} was never captured")]
    NotCaptured(&'static str),
}

/// Snapshot of a request taken before it is handed downstream.
#[derive(Clone, Debug)]
pub struct CapturedRequest {
    pub method: String,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
    pub body: Bytes,
    pub charset: Option<String>,
}

impl CapturedRequest {
    pub fn capture(req: &Request) -> Self {
        Self {
            method: req.method_name().to_owned(),
            uri: req.path().to_owned(),
            headers: req.headers().to_vec(),
            params: req.query_pairs().to_vec(),
            body: req.body_bytes(),
            charset: req.charset().map(str::to_owned),
        }
    }

    pub fn body_text(&self) -> Result<String, ApiError> {
        decode_body(&self.body, self.charset.as_deref())
    }
}

/// A response whose body has been moved out for logging.
#[derive(Debug)]
pub struct CapturedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub charset: Option<String>,
}

impl CapturedResponse {
    /// Takes the body out of `res`, leaving it empty until [`replay`](Self::replay).
    pub fn capture(res: &mut Response) -> Self {
        let charset = res.header("content-type").and_then(charset_of).map(str::to_owned);
        Self {
            status: res.status_code(),
            headers: res.headers().to_vec(),
            body: res.take_body(),
            charset,
        }
    }

    pub fn body_text(&self) -> Result<String, ApiError> {
        decode_body(&self.body, self.charset.as_deref())
    }

    /// Copies the buffered body back onto the outgoing response.
    pub fn replay(self, res: &mut Response) {
        res.set_body(self.body);
    }
}

/// Request/response payload logger.
///
/// ```rust,no_run
/// use greeter::Router;
/// use greeter::middleware::payload::PayloadLogging;
///
/// let app = Router::new().layer(PayloadLogging::from_subscriber());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct PayloadLogging {
    verbose: bool,
}

impl PayloadLogging {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Verbose iff the current subscriber has `DEBUG` enabled for [`TARGET`].
    pub fn from_subscriber() -> Self {
        Self::new(tracing::enabled!(target: TARGET, Level::DEBUG))
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Captures the request when verbose; `None` means pass-through.
    pub fn wrap(&self, req: &Request) -> Option<CapturedRequest> {
        self.verbose.then(|| CapturedRequest::capture(req))
    }

    /// Logs both payloads and hands back the response with its body intact.
    ///
    /// Runs whatever the downstream returned, error responses included.
    pub fn finalize(&self, request: Option<&CapturedRequest>, mut response: Response) -> Response {
        if !self.verbose {
            return response;
        }

        if let Err(e) = log_request(request) {
            error!(target: TARGET, "could not read request payload: {e}");
        }

        let captured = CapturedResponse::capture(&mut response);
        if let Err(e) = log_response(Some(&captured)) {
            error!(target: TARGET, "could not read response payload: {e}");
        }
        captured.replay(&mut response);

        response
    }
}

impl Middleware for PayloadLogging {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let this = *self;
        let captured = this.wrap(&req);
        Box::pin(async move {
            let response = next.run(req).await;
            this.finalize(captured.as_ref(), response)
        })
    }
}

/// Writes the request record.
pub fn log_request(captured: Option<&CapturedRequest>) -> Result<(), PayloadError> {
    let req = captured.ok_or(PayloadError::NotCaptured("request"))?;
    let body = req.body_text().unwrap_or_else(|e| {
        error!(target: TARGET, "could not read request body: {e}");
        String::new()
    });

    debug!(
        target: TARGET,
        method = %req.method,
        uri = %req.uri,
        headers = %format_pairs(&req.headers),
        parameters = %format_pairs(&req.params),
        body = %body,
        "request payload"
    );
    Ok(())
}

/// Writes the response record.
pub fn log_response(captured: Option<&CapturedResponse>) -> Result<(), PayloadError> {
    let res = captured.ok_or(PayloadError::NotCaptured("response"))?;
    let body = res.body_text().unwrap_or_else(|e| {
        error!(target: TARGET, "could not read response body: {e}");
        String::new()
    });

    debug!(
        target: TARGET,
        status = res.status,
        headers = %format_pairs(&res.headers),
        body = %body,
        "response payload"
    );
    Ok(())
}

/// Renders `name:[v1, v2]` entries joined by `, `, one entry per distinct
/// name in order of first appearance.
pub fn format_pairs(pairs: &[(String, String)]) -> String {
    let mut grouped: Vec<(&str, Vec<&str>)> = Vec::new();
    for (name, value) in pairs {
        match grouped.iter_mut().find(|(n, _)| *n == name.as_str()) {
            Some((_, values)) => values.push(value.as_str()),
            None => grouped.push((name.as_str(), vec![value.as_str()])),
        }
    }

    grouped.iter()
        .map(|(name, values)| format!("{name}:[{}]", values.join(", ")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decodes a body with the declared charset; UTF-8 when none is declared.
pub fn decode_body(bytes: &[u8], charset: Option<&str>) -> Result<String, ApiError> {
    match charset.map(str::to_ascii_lowercase).as_deref() {
        None | Some("utf-8" | "utf8") => Ok(String::from_utf8_lossy(bytes).into_owned()),
        Some("us-ascii" | "ascii") => Ok(bytes.iter()
            .map(|&b| if b.is_ascii() { char::from(b) } else { char::REPLACEMENT_CHARACTER })
            .collect()),
        Some("iso-8859-1" | "latin1" | "latin-1") => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        Some(other) => Err(ApiError::Encoding(format!("unsupported charset `{other}`"))),
    }
}
