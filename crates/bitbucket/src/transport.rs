//! Authenticated request execution with bounded retries.
//!
//! The [`Transport`] turns one logical call into at most `retries` HTTP
//! exchanges. Only missing responses are retried; any status the API
//! returns, 2xx or not, ends the call and is handed back to the caller.

use crate::backend::{HttpClient, HttpRequest, Method};
use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};
use std::thread;
use std::time::Duration;

/// Username/password pair sent as HTTP basic auth.
#[derive(Clone)]
pub struct Credentials {
    /// Account username.
    pub username: String,
    /// App password (may be empty).
    pub password: String,
}

impl Credentials {
    /// Create credentials from a username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value of the `Authorization` header.
    #[must_use]
    pub fn basic_auth_header(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Fixed-interval retry policy for transport failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call (at least one is always made).
    pub retries: u32,
    /// Pause between attempts.
    pub sleep: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            sleep: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with custom settings.
    pub fn new(retries: u32, sleep: Duration) -> Self {
        Self { retries, sleep }
    }

    /// Attempts actually made, never zero.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.retries.max(1)
    }
}

/// A received response with its body decoded into an object envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Decoded body, see [`decode_body`].
    pub body: Map<String, Value>,
    /// Attempts it took to get a response.
    pub attempts: u32,
}

impl Response {
    /// Look up a top-level key of the decoded body.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }
}

/// Decode a response body into a uniform object envelope.
///
/// - empty body: `{}`
/// - JSON object: the object itself
/// - any other JSON value: `{"json": value}`
/// - anything else: `{"content": text}`
pub fn decode_body(text: &str) -> Map<String, Value> {
    let mut content = Map::new();
    if text.trim().is_empty() {
        return content;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => object,
        Ok(other) => {
            content.insert("json".to_string(), other);
            content
        }
        Err(_) => {
            content.insert("content".to_string(), Value::String(text.to_string()));
            content
        }
    }
}

/// Executes API calls: auth injection, JSON bodies, retries, decoding.
pub struct Transport {
    client: Box<dyn HttpClient>,
    credentials: Option<Credentials>,
    retry: RetryPolicy,
}

impl Transport {
    /// Create a transport without credentials and with the default retry policy.
    #[must_use]
    pub fn new(client: Box<dyn HttpClient>) -> Self {
        Self {
            client,
            credentials: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Send basic auth with every request.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Current retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Send one logical request.
    ///
    /// A JSON `body` is serialized and gets `Content-Type: application/json`
    /// unless `headers` already carry a content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when no response arrived within the
    /// retry budget. Every received status is returned as `Ok`.
    pub fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Response> {
        let mut request = HttpRequest::new(method, url);
        request.headers = headers
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect();

        if let Some(credentials) = &self.credentials {
            request
                .headers
                .push(("Authorization".to_string(), credentials.basic_auth_header()));
        }

        if let Some(value) = body {
            request.body = Some(serde_json::to_vec(value)?);
            if request.header("content-type").is_none() {
                request
                    .headers
                    .push(("Content-Type".to_string(), "application/json".to_string()));
            }
        }

        let max_attempts = self.retry.max_attempts();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            log::debug!("{method} {url} (attempt {attempt}/{max_attempts})");
            match self.client.execute(&request) {
                Ok(raw) => {
                    log::debug!("{method} {url} -> {}", raw.status);
                    return Ok(Response {
                        status: raw.status,
                        body: decode_body(&raw.body),
                        attempts: attempt,
                    });
                }
                Err(message) => {
                    log::warn!("{method} {url} failed (attempt {attempt}/{max_attempts}): {message}");
                    last_error = message;
                    if attempt < max_attempts {
                        thread::sleep(self.retry.sleep);
                    }
                }
            }
        }

        Err(Error::Transport {
            url: url.to_string(),
            attempts: max_attempts,
            message: last_error,
        })
    }

    /// `GET` without extra headers.
    pub fn get(&self, url: &str) -> Result<Response> {
        self.send(Method::Get, url, &[], None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockClient;
    use serde_json::json;

    fn transport(mock: &MockClient, retries: u32) -> Transport {
        Transport::new(Box::new(mock.clone()))
            .with_retry(RetryPolicy::new(retries, Duration::ZERO))
    }

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 3);
        assert_eq!(policy.sleep, Duration::from_secs(5));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[test]
    fn test_decode_body_envelope() {
        assert!(decode_body("").is_empty());
        assert_eq!(decode_body(r#"{"a": 1}"#)["a"], 1);
        assert_eq!(decode_body("[1, 2]")["json"], json!([1, 2]));
        assert_eq!(decode_body("<html>oops</html>")["content"], "<html>oops</html>");
    }

    #[test]
    fn test_send_retries_until_response() {
        let mock = MockClient::new();
        mock.push_failure("connection refused");
        mock.push_failure("connection refused");
        mock.push_response(200, r#"{"ok": true}"#);

        let response = transport(&mock, 3).get("https://api.example.com/x").unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.attempts, 3);
        assert_eq!(response.get("ok"), Some(&json!(true)));
        assert_eq!(mock.requests().len(), 3);
    }

    #[test]
    fn test_send_gives_up_after_retry_budget() {
        let mock = MockClient::new();
        for _ in 0..5 {
            mock.push_failure("timed out");
        }

        let err = transport(&mock, 3)
            .get("https://api.example.com/x")
            .unwrap_err();
        match err {
            Error::Transport {
                attempts, message, ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(message, "timed out");
            }
            other => panic!("Expected Error::Transport, got {other:?}"),
        }
        assert_eq!(mock.requests().len(), 3);
        assert_eq!(mock.remaining(), 2);
    }

    #[test]
    fn test_send_does_not_retry_error_status() {
        let mock = MockClient::new();
        mock.push_response(500, "Internal Server Error");

        let response = transport(&mock, 3).get("https://api.example.com/x").unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(response.attempts, 1);
        assert_eq!(response.get("content"), Some(&json!("Internal Server Error")));
    }

    #[test]
    fn test_send_injects_basic_auth() {
        let mock = MockClient::new();
        mock.push_response(200, "");

        transport(&mock, 1)
            .with_credentials(Some(Credentials::new("alice", "s3cret")))
            .get("https://api.example.com/x")
            .unwrap();

        let requests = mock.requests();
        let request = &requests[0];
        // base64("alice:s3cret")
        assert_eq!(request.header("authorization"), Some("Basic YWxpY2U6czNjcmV0"));
    }

    #[test]
    fn test_send_without_credentials_has_no_auth() {
        let mock = MockClient::new();
        mock.push_response(200, "");
        transport(&mock, 1).get("https://api.example.com/x").unwrap();
        assert_eq!(mock.requests()[0].header("authorization"), None);
    }

    #[test]
    fn test_send_json_body_sets_content_type() {
        let mock = MockClient::new();
        mock.push_response(201, "{}");

        transport(&mock, 1)
            .send(
                Method::Post,
                "https://api.example.com/x",
                &[],
                Some(&json!({"key": "DB"})),
            )
            .unwrap();

        let requests = mock.requests();
        let request = &requests[0];
        assert_eq!(request.header("content-type"), Some("application/json"));
        let sent: Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(sent, json!({"key": "DB"}));
    }

    #[test]
    fn test_send_keeps_caller_content_type() {
        let mock = MockClient::new();
        mock.push_response(200, "{}");

        transport(&mock, 1)
            .send(
                Method::Put,
                "https://api.example.com/x",
                &[("Content-type", "application/vnd.custom+json")],
                Some(&json!({})),
            )
            .unwrap();

        let requests = mock.requests();
        let request = &requests[0];
        let content_types: Vec<_> = request
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .collect();
        assert_eq!(content_types.len(), 1);
        assert_eq!(request.header("content-type"), Some("application/vnd.custom+json"));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let debug = format!("{:?}", Credentials::new("alice", "s3cret"));
        assert!(debug.contains("alice"));
        assert!(!debug.contains("s3cret"));
    }
}
