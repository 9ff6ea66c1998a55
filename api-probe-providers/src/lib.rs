// api-probe-providers/src/lib.rs
// ============================================================================
// Module: API Probe Providers
// Description: Collaborator implementations for the conformance engine.
// Purpose: Provide an HTTP service client and OpenAPI document acquisition.
// Dependencies: api-probe-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! This crate supplies the engine's two external touchpoints: a blocking
//! HTTP [`api_probe_core::ServiceClient`] built on `reqwest`, and loaders
//! that fetch an OpenAPI 3.x document from the service under test or read it
//! from a local file.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod http;
pub mod openapi;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use http::HttpClientConfig;
pub use http::HttpServiceClient;
pub use openapi::DEFAULT_OPENAPI_PATH;
pub use openapi::OpenApiError;
pub use openapi::OpenApiLoader;
pub use openapi::OpenApiLoaderConfig;
