//! HTTP transport types for the platform boundary.
//!
//! # Design
//! Requests and responses are described as plain data. `PlatformClient`
//! builds `HttpRequest` values and parses `HttpResponse` values without ever
//! touching the network; the actual round-trip goes through the `Transport`
//! seam supplied by the embedding application. This keeps every build/parse
//! step deterministic and testable against canned responses.
//!
//! Request bodies are raw bytes: JSON payloads are serialized up front, and
//! storage uploads carry file content as-is. Platform responses are always
//! textual, so `HttpResponse` keeps a `String` body.

use crate::error::AccessError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// An HTTP request described as plain data.
///
/// Built by `PlatformClient::build_*` methods and handed to a `Transport`
/// for execution.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// An HTTP response described as plain data.
///
/// Produced by a `Transport` after executing an `HttpRequest`, then passed
/// to `PlatformClient::parse_*` methods for interpretation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Executes a single HTTP round-trip against the platform.
///
/// Every operation in this crate is a single-shot, sequential call; the
/// transport carries no retry, timeout, or cancellation policy. A transport
/// failure surfaces as `AccessError::Transport`.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, AccessError>;
}
