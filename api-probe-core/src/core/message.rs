// api-probe-core/src/core/message.rs
// ============================================================================
// Module: Request and Response Messages
// Description: Concrete HTTP messages exchanged with the service under test.
// Purpose: Provide owned, re-sendable message values for differential probes.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Requests are created by the synthesizer and owned by the orchestrator for
//! the duration of one probe. Bodies are materialized as owned byte buffers
//! so that cloning a request for a repeat probe never depends on re-reading a
//! consumed stream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::method::Method;

// ============================================================================
// SECTION: Request
// ============================================================================

/// Materialized request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Body bytes.
    pub bytes: Vec<u8>,
    /// Media type, e.g. `application/json`.
    pub media_type: String,
}

/// Concrete HTTP request.
///
/// # Invariants
/// - `path` matches exactly one endpoint template in the owning catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Absolute request path.
    pub path: String,
    /// Query pairs in emission order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<(String, String)>,
    /// Header pairs in emission order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    /// Optional materialized body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
}

impl Request {
    /// Returns the first header value with the given name, case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns true when a header with the given name is present.
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
}

// ============================================================================
// SECTION: Response
// ============================================================================

/// Concrete HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Status code.
    pub status: u16,
    /// Header pairs in wire order; repeated names are separate entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    /// Body bytes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<u8>,
    /// Content type, when declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Response {
    /// Returns the first header value with the given name, case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Joins all values of the named header with `", "`, case-insensitive.
    #[must_use]
    pub fn header_joined(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .iter()
            .filter(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    /// Returns all header names present, lower-cased.
    #[must_use]
    pub fn header_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.headers.iter().map(|(name, _)| name.to_ascii_lowercase()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Returns the declared `Content-Length`, when parseable.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length").and_then(|value| value.trim().parse().ok())
    }

    /// Returns true for 2xx status codes.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}
