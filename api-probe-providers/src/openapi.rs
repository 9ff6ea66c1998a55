// api-probe-providers/src/openapi.rs
// ============================================================================
// Module: OpenAPI Document Acquisition
// Description: Fetch or read the OpenAPI description of the service.
// Purpose: Produce the parsed document the endpoint catalog consumes.
// Dependencies: api-probe-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! Services conventionally serve their OpenAPI description over HTTP at a
//! well-known path; tests and offline runs read it from a file instead. Both
//! loaders enforce a size limit and return the parsed `serde_json::Value`
//! that [`api_probe_core::Catalog::load`] consumes. Documents are untrusted
//! input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::info;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Conventional document path on the service under test.
pub const DEFAULT_OPENAPI_PATH: &str = "/swagger/v1/swagger.json";
/// Default maximum accepted document size in bytes.
const DEFAULT_MAX_DOCUMENT_BYTES: usize = 8 * 1024 * 1024;
/// Default fetch timeout.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Document acquisition errors.
#[derive(Debug, Error)]
pub enum OpenApiError {
    /// The fetch URL could not be assembled.
    #[error("invalid document url: {0}")]
    InvalidUrl(String),
    /// The HTTP fetch failed.
    #[error("document fetch failed: {0}")]
    Fetch(String),
    /// The service answered with a non-success status.
    #[error("document fetch returned status {0}")]
    Status(u16),
    /// The file could not be read.
    #[error("document read failed: {0}")]
    Io(String),
    /// The document exceeds the configured size limit.
    #[error("document exceeds size limit ({actual} > {limit} bytes)")]
    TooLarge {
        /// Maximum accepted bytes.
        limit: usize,
        /// Observed size in bytes.
        actual: usize,
    },
    /// The document is not valid JSON.
    #[error("document is not valid json: {0}")]
    Parse(String),
}

// ============================================================================
// SECTION: Loader
// ============================================================================

/// Configuration for document acquisition.
#[derive(Debug, Clone)]
pub struct OpenApiLoaderConfig {
    /// Document path on the service, joined against the base URL.
    pub document_path: String,
    /// Fetch timeout.
    pub timeout: Duration,
    /// Maximum accepted document size in bytes.
    pub max_document_bytes: usize,
}

impl Default for OpenApiLoaderConfig {
    fn default() -> Self {
        Self {
            document_path: DEFAULT_OPENAPI_PATH.to_string(),
            timeout: DEFAULT_FETCH_TIMEOUT,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

/// OpenAPI document loader.
#[derive(Debug, Clone, Default)]
pub struct OpenApiLoader {
    /// Loader configuration.
    config: OpenApiLoaderConfig,
}

impl OpenApiLoader {
    /// Creates a loader with the given configuration.
    #[must_use]
    pub const fn new(config: OpenApiLoaderConfig) -> Self {
        Self {
            config,
        }
    }

    /// Fetches the document from the service under test.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiError`] on fetch, status, size, or parse failure.
    pub fn fetch(&self, base_url: &Url) -> Result<Value, OpenApiError> {
        let url = base_url
            .join(self.config.document_path.trim_start_matches('/'))
            .map_err(|err| OpenApiError::InvalidUrl(err.to_string()))?;
        info!(url = %url, "fetching openapi document");

        let client = Client::builder()
            .timeout(self.config.timeout)
            .build()
            .map_err(|err| OpenApiError::Fetch(err.to_string()))?;
        let response = client.get(url).send().map_err(|err| OpenApiError::Fetch(err.to_string()))?;
        if !response.status().is_success() {
            return Err(OpenApiError::Status(response.status().as_u16()));
        }
        let bytes =
            response.bytes().map_err(|err| OpenApiError::Fetch(err.to_string()))?;
        self.parse_limited(&bytes)
    }

    /// Reads the document from a local file.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiError`] on read, size, or parse failure.
    pub fn from_file(&self, path: &Path) -> Result<Value, OpenApiError> {
        let bytes = fs::read(path).map_err(|err| OpenApiError::Io(err.to_string()))?;
        self.parse_limited(&bytes)
    }

    /// Applies the size limit and parses the document.
    fn parse_limited(&self, bytes: &[u8]) -> Result<Value, OpenApiError> {
        if bytes.len() > self.config.max_document_bytes {
            return Err(OpenApiError::TooLarge {
                limit: self.config.max_document_bytes,
                actual: bytes.len(),
            });
        }
        serde_json::from_slice(bytes).map_err(|err| OpenApiError::Parse(err.to_string()))
    }
}
