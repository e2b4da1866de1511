//! HTTP executor
//!
//! Issues exactly one request per scenario step and classifies the result.
//! There are no retries: a transport error becomes a single failed outcome.

mod executor;

pub use executor::ReqwestExecutor;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::common::config::PreviewConfig;
use crate::common::truncate_chars;

/// HTTP methods a step may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully rendered request, ready to send
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

impl RequestSpec {
    pub fn new(method: Method, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout,
        }
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header("Authorization", format!("Bearer {}", token))
    }
}

/// Response body, parsed as JSON when possible
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Parse raw body text, falling back to text for non-JSON payloads
    pub fn parse(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        }
    }

    pub fn json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }
}

/// Structured response of a completed exchange
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl HttpResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: ResponseBody::Json(body),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: ResponseBody::Text(body.into()),
        }
    }

    /// Bounded, human-readable rendering of the body
    pub fn preview(&self, limits: PreviewConfig) -> String {
        match &self.body {
            ResponseBody::Json(value) => {
                let pretty = serde_json::to_string_pretty(value).unwrap_or_default();
                truncate_chars(&pretty, limits.json_chars).to_string()
            }
            ResponseBody::Text(text) => truncate_chars(text, limits.text_chars).to_string(),
        }
    }
}

/// Kind of transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Other,
}

/// The request never produced a response
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Performs a single HTTP exchange
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: &RequestSpec) -> Result<HttpResponse, TransportError>;
}

/// Classify a status code against an optional exact expectation
///
/// An exact expectation wins over the 2xx rule: expecting 201 and
/// receiving 200 fails.
pub fn classify_status(expected: Option<u16>, actual: u16) -> Result<(), String> {
    if let Some(expected) = expected {
        if expected != actual {
            return Err(format!("expected {} got {}", expected, actual));
        }
    }
    if (200..300).contains(&actual) {
        Ok(())
    } else {
        Err(format!("HTTP {}", actual))
    }
}
