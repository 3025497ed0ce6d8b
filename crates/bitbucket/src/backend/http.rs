//! ureq-based HTTP backend.
//!
//! The agent is configured to hand back every status as a normal response;
//! deciding what a 4xx or 5xx means is the caller's job, only "no response"
//! surfaces as an error here.

use super::{HttpClient, HttpRequest, Method, RawResponse};
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP client backed by a ureq agent.
pub struct UreqClient {
    /// HTTP agent for requests.
    agent: ureq::Agent,
}

impl UreqClient {
    /// Create a client whose requests give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl HttpClient for UreqClient {
    fn execute(&self, request: &HttpRequest) -> Result<RawResponse, String> {
        let url = request.url.as_str();
        let headers = &request.headers;
        let body = request.body.as_deref();

        let result = match (request.method, body) {
            (Method::Get, _) => with_headers(self.agent.get(url), headers).call(),
            (Method::Delete, None) => with_headers(self.agent.delete(url), headers).call(),
            (Method::Delete, Some(data)) => with_headers(self.agent.delete(url), headers)
                .force_send_body()
                .send(data),
            (Method::Post, data) => {
                with_headers(self.agent.post(url), headers).send(data.unwrap_or_default())
            }
            (Method::Put, data) => {
                with_headers(self.agent.put(url), headers).send(data.unwrap_or_default())
            }
        };

        let mut response = result.map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| e.to_string())?;

        Ok(RawResponse { status, body })
    }
}
