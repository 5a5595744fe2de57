//! Stateless request builder and response parser for the hosted platform.
//!
//! # Design
//! `PlatformClient` holds only the endpoint configuration and carries no
//! mutable state between calls. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`; the stores execute the round-trip in
//! between through their `Transport`. Operations are grouped by platform
//! surface: identity ([`auth`]), the `todos` table ([`todos`]), and the
//! avatar bucket ([`storage`]).

pub mod auth;
pub mod storage;
pub mod todos;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::PlatformConfig;
use crate::error::AccessError;
use crate::http::HttpResponse;

/// Stateless client for the hosted platform's HTTP surface.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    config: PlatformConfig,
}

impl PlatformClient {
    pub fn new(config: PlatformConfig) -> Self {
        Self { config }
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Headers present on every platform request.
    pub(crate) fn base_headers(&self) -> Vec<(String, String)> {
        vec![("apikey".to_string(), self.config.anon_key.clone())]
    }

    /// Headers for requests made on behalf of a signed-in user.
    pub(crate) fn auth_headers(&self, access_token: &str) -> Vec<(String, String)> {
        let mut headers = self.base_headers();
        headers.push((
            "authorization".to_string(),
            format!("Bearer {access_token}"),
        ));
        headers
    }
}

/// Map a non-expected status to `AccessError::Platform`, extracting the
/// human-readable message from the error body.
pub(crate) fn check_status(response: &HttpResponse, expected: u16) -> Result<(), AccessError> {
    if response.status == expected {
        return Ok(());
    }
    Err(AccessError::Platform {
        status: response.status,
        message: error_message(&response.body),
    })
}

/// Pull the message out of a platform error body.
///
/// The platform is not consistent about the key: identity endpoints use
/// `msg` or `error_description`, the table API uses `message`. The raw body
/// is the fallback so nothing is swallowed.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    body.trim().to_string()
}

pub(crate) fn json_body<T: Serialize>(value: &T) -> Result<Vec<u8>, AccessError> {
    serde_json::to_vec(value).map_err(|e| AccessError::Serialization(e.to_string()))
}

pub(crate) fn parse_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, AccessError> {
    serde_json::from_str(&response.body).map_err(|e| AccessError::Deserialization(e.to_string()))
}

pub(crate) const JSON_CONTENT_TYPE: (&str, &str) = ("content-type", "application/json");

pub(crate) fn owned_header(header: (&str, &str)) -> (String, String) {
    (header.0.to_string(), header.1.to_string())
}
