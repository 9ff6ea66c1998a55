// api-probe-core/src/core/mod.rs
// ============================================================================
// Module: API Probe Core Types
// Description: Canonical endpoint, message, schema, and report structures.
// Purpose: Provide stable, serializable types for conformance checking.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types define the endpoint catalog, value schemas, request/response
//! messages, state snapshots, and report payloads. These types are the
//! canonical source of truth for any derived report surfaces.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod cancel;
pub mod catalog;
pub mod checksum;
pub mod config;
pub mod endpoint;
pub mod identifiers;
pub mod message;
pub mod method;
pub mod pattern;
pub mod report;
pub mod schema;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cancel::CancelToken;
pub use catalog::Catalog;
pub use catalog::CatalogError;
pub use checksum::DEFAULT_HASH_ALGORITHM;
pub use checksum::ChecksumError;
pub use checksum::HashAlgorithm;
pub use checksum::HashDigest;
pub use config::ConfigError;
pub use config::ProbeConfig;
pub use config::StateTrackingConfig;
pub use endpoint::Endpoint;
pub use endpoint::MediaTypeBody;
pub use endpoint::Parameter;
pub use endpoint::ParameterLocation;
pub use identifiers::EntityKind;
pub use message::Request;
pub use message::RequestBody;
pub use message::Response;
pub use method::Method;
pub use pattern::EndpointPattern;
pub use pattern::PatternError;
pub use report::ConformanceReport;
pub use report::PropertyResult;
pub use report::ReportSummary;
pub use report::RequestReport;
pub use schema::ArraySchema;
pub use schema::IntegerSchema;
pub use schema::NumberSchema;
pub use schema::ObjectField;
pub use schema::ObjectSchema;
pub use schema::Schema;
pub use schema::StringFormat;
pub use schema::StringSchema;
pub use time::Timestamp;
