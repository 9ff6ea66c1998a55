// api-probe-core/src/core/endpoint.rs
// ============================================================================
// Module: Endpoint Model
// Description: Normalized endpoints, parameters, and body declarations.
// Purpose: Provide the immutable endpoint shape the engine exercises.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An endpoint is a (method, path template) pair with its declared
//! parameters, optional request body media types, and response schemas.
//! Endpoints are built by the catalog and immutable afterwards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::method::Method;
use crate::core::schema::Schema;

// ============================================================================
// SECTION: Parameters
// ============================================================================

/// Location of a request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterLocation {
    /// Path template segment.
    Path,
    /// Query string pair.
    Query,
    /// Request header.
    Header,
    /// Cookie pair.
    Cookie,
}

/// Declared request parameter.
///
/// # Invariants
/// - Path parameters are always required.
/// - Names are unique per (endpoint, location).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter location.
    pub location: ParameterLocation,
    /// Whether the parameter must be supplied.
    pub required: bool,
    /// Value schema.
    pub schema: Schema,
    /// Optional literal example from the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
}

// ============================================================================
// SECTION: Request Bodies
// ============================================================================

/// Declared request body for one media type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaTypeBody {
    /// Media type, e.g. `application/json`.
    pub media_type: String,
    /// Body value schema.
    pub schema: Schema,
}

// ============================================================================
// SECTION: Endpoint
// ============================================================================

/// Normalized endpoint.
///
/// # Invariants
/// - (path template, method) is unique within a catalog.
/// - `parameters` preserves document declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Path template, possibly containing `{name}` segments.
    pub path_template: String,
    /// HTTP method.
    pub method: Method,
    /// Declared parameters in declaration order.
    pub parameters: Vec<Parameter>,
    /// Declared request bodies by media type, document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub request_bodies: Vec<MediaTypeBody>,
    /// Response schemas keyed by status token (`"200"`, `"default"`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, Option<Schema>>,
}

impl Endpoint {
    /// Returns the declared path parameters in declaration order.
    pub fn path_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|param| param.location == ParameterLocation::Path)
    }

    /// Returns true when the template contains the named `{name}` segment.
    #[must_use]
    pub fn has_template_segment(&self, name: &str) -> bool {
        self.path_template
            .split('/')
            .any(|segment| segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) == Some(name))
    }
}
