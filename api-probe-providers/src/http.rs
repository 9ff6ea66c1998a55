// api-probe-providers/src/http.rs
// ============================================================================
// Module: HTTP Service Client
// Description: Blocking reqwest-based client for the service under test.
// Purpose: Deliver synthesized requests with strict limits and timeouts.
// Dependencies: api-probe-core, reqwest, url
// ============================================================================

//! ## Overview
//! The HTTP client joins request paths against a configured base URL, maps
//! engine requests onto the wire, and materializes responses (status,
//! headers, bounded body) back into engine values. Responses are untrusted
//! input: body reads are size-limited and timeouts are always set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use api_probe_core::CancelToken;
use api_probe_core::Method;
use api_probe_core::Request;
use api_probe_core::Response;
use api_probe_core::ServiceClient;
use api_probe_core::TransportError;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use url::Url;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the HTTP service client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL of the service under test.
    pub base_url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent for outbound requests.
    pub user_agent: String,
    /// Maximum response body size accepted, in bytes.
    pub max_response_bytes: usize,
}

impl HttpClientConfig {
    /// Creates a configuration with defaults for the given base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(30),
            user_agent: "api-probe/0.1".to_string(),
            max_response_bytes: 4 * 1024 * 1024,
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Blocking HTTP client for the service under test.
pub struct HttpServiceClient {
    /// Client configuration, including limits.
    config: HttpClientConfig,
    /// Underlying HTTP client.
    client: Client,
}

impl HttpServiceClient {
    /// Creates a new client with the given configuration.
    ///
    /// Redirects are not followed: the engine must observe the service's
    /// own responses, not their targets.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the HTTP client cannot be created.
    pub fn new(config: HttpClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| TransportError::Send(format!("http client build failed: {err}")))?;
        Ok(Self {
            config,
            client,
        })
    }

    /// Joins the request path and query against the base URL.
    fn request_url(&self, request: &Request) -> Result<Url, TransportError> {
        let mut url = self
            .config
            .base_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|err| TransportError::InvalidRequest(format!("bad path: {err}")))?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &request.query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }
}

impl ServiceClient for HttpServiceClient {
    fn send(&self, request: &Request, cancel: &CancelToken) -> Result<Response, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let url = self.request_url(request)?;
        let mut builder = self.client.request(to_reqwest_method(request.method), url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, &body.media_type)
                .body(body.bytes.clone());
        }

        let mut wire_response = builder
            .send()
            .map_err(|err| TransportError::Send(format!("request failed: {err}")))?;

        let status = wire_response.status().as_u16();
        let headers: Vec<(String, String)> = wire_response
            .headers()
            .iter()
            .map(|(name, value)| {
                (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).to_string())
            })
            .collect();
        let content_type = wire_response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = read_limited(&mut wire_response, self.config.max_response_bytes)?;
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        Ok(Response {
            status,
            headers,
            body,
            content_type,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps an engine method onto the wire method.
fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Reads a response body up to the configured limit.
fn read_limited(
    response: &mut reqwest::blocking::Response,
    max_bytes: usize,
) -> Result<Vec<u8>, TransportError> {
    let mut body = Vec::new();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    response
        .by_ref()
        .take(limit.saturating_add(1))
        .read_to_end(&mut body)
        .map_err(|err| TransportError::Send(format!("body read failed: {err}")))?;
    if body.len() > max_bytes {
        return Err(TransportError::Send(format!(
            "response body exceeds limit ({max_bytes} bytes)"
        )));
    }
    Ok(body)
}
