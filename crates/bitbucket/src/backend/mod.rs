//! Low-level HTTP backends.
//!
//! This module provides the [`HttpClient`] trait that the [`Transport`]
//! drives. [`http::UreqClient`] talks to the real API;
//! [`MockClient`] replays scripted responses for testing without network
//! access.
//!
//! [`Transport`]: crate::transport::Transport
//!
//! # Testing
//!
//! ```
//! use bitbucket::backend::{HttpClient, HttpRequest, MockClient};
//! use bitbucket::Method;
//!
//! let mock = MockClient::new();
//! mock.push_failure("connection refused");
//! mock.push_response(200, r#"{"values": []}"#);
//!
//! let request = HttpRequest::new(Method::Get, "https://api.example.com/2.0/x");
//! assert!(mock.execute(&request).is_err());
//! assert_eq!(mock.execute(&request).unwrap().status, 200);
//! assert_eq!(mock.requests().len(), 2);
//! ```

pub mod http;

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

/// HTTP verbs used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// List or read.
    Get,
    /// Create.
    Post,
    /// Update or promote.
    Put,
    /// Remove or demote.
    Delete,
}

impl Method {
    /// Upper-case verb as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fully prepared request: headers and body are final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP verb.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Header name/value pairs, in insertion order.
    pub headers: Vec<(String, String)>,
    /// Serialized body, if any.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Create a request without headers or body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Look up a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and raw text of a received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body text (possibly empty).
    pub body: String,
}

/// Backend trait for executing a single HTTP exchange.
///
/// Implementations must return `Ok` for every response received, whatever
/// its status. `Err` means no response arrived at all (connection refused,
/// DNS failure, timeout) and is the only case the transport retries.
pub trait HttpClient: Send + Sync {
    /// Execute one request.
    fn execute(&self, request: &HttpRequest) -> Result<RawResponse, String>;
}

/// Mock client replaying scripted outcomes in order.
///
/// Clones share the script and the captured requests, so a test can keep a
/// handle after boxing one copy into a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    script: Arc<Mutex<VecDeque<Result<RawResponse, String>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockClient {
    /// Create a new mock with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body text.
    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.script.lock().unwrap().push_back(Ok(RawResponse {
            status,
            body: body.into(),
        }));
    }

    /// Queue a JSON response.
    pub fn push_json(&self, status: u16, body: &serde_json::Value) {
        self.push_response(status, body.to_string());
    }

    /// Queue a transport-level failure (no response).
    pub fn push_failure(&self, message: impl Into<String>) {
        self.script.lock().unwrap().push_back(Err(message.into()));
    }

    /// Every request executed so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of scripted outcomes not consumed yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl HttpClient for MockClient {
    fn execute(&self, request: &HttpRequest) -> Result<RawResponse, String> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(format!("mock script exhausted at {} {}", request.method, request.url)))
    }
}
