// api-probe-core/src/core/catalog.rs
// ============================================================================
// Module: Endpoint Catalog
// Description: OpenAPI parsing into normalized endpoints with lookups.
// Purpose: Enumerate endpoints and match concrete requests to templates.
// Dependencies: serde_json, tracing
// ============================================================================

//! ## Overview
//! The catalog parses an OpenAPI 3.x document into a normalized endpoint
//! sequence and answers two lookups: which methods a concrete path supports,
//! and which endpoint a concrete (path, method) pair belongs to. Parsing is
//! best-effort: endpoints that cannot be parsed are logged and skipped, and
//! the caller receives the surviving set. OpenAPI input is untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::core::endpoint::Endpoint;
use crate::core::endpoint::MediaTypeBody;
use crate::core::endpoint::Parameter;
use crate::core::endpoint::ParameterLocation;
use crate::core::method::Method;
use crate::core::schema::Schema;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum `$ref` hops followed during schema resolution.
const MAX_REF_DEPTH: usize = 16;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog load diagnostics.
///
/// Load itself is best-effort and infallible; these errors describe why an
/// individual endpoint was skipped.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// An operation was not an object.
    #[error("operation {0} {1} is not an object")]
    MalformedOperation(Method, String),
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Normalized endpoint catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Endpoints in document order.
    endpoints: Vec<Endpoint>,
    /// Component schemas by name.
    schemas: BTreeMap<String, Schema>,
}

impl Catalog {
    /// Loads a catalog from a parsed OpenAPI 3.x document.
    ///
    /// Unparsable endpoints are skipped and logged; duplicate
    /// (path, method) pairs keep the first occurrence.
    #[must_use]
    pub fn load(document: &Value) -> Self {
        let schemas = load_component_schemas(document);
        let mut endpoints: Vec<Endpoint> = Vec::new();

        let Some(paths) = document.get("paths").and_then(Value::as_object) else {
            warn!("openapi document has no paths object; catalog is empty");
            return Self {
                endpoints,
                schemas,
            };
        };

        for (path, item) in paths {
            let Some(item) = item.as_object() else {
                warn!(path = path.as_str(), "skipping malformed path item");
                continue;
            };
            let shared_parameters = item
                .get("parameters")
                .and_then(Value::as_array)
                .map(|entries| parse_parameters(entries))
                .unwrap_or_default();

            for method in Method::ALL {
                let key = method.as_str().to_ascii_lowercase();
                let Some(operation) = item.get(&key) else {
                    continue;
                };
                match parse_operation(path, method, operation, &shared_parameters) {
                    Ok(endpoint) => {
                        let duplicate = endpoints.iter().any(|existing| {
                            existing.method == endpoint.method
                                && existing.path_template == endpoint.path_template
                        });
                        if duplicate {
                            warn!(
                                path = path.as_str(),
                                method = method.as_str(),
                                "skipping duplicate endpoint"
                            );
                        } else {
                            endpoints.push(endpoint);
                        }
                    }
                    Err(err) => {
                        warn!(
                            path = path.as_str(),
                            method = method.as_str(),
                            error = %err,
                            "skipping unparsable endpoint"
                        );
                    }
                }
            }
        }

        Self {
            endpoints,
            schemas,
        }
    }

    /// Returns all endpoints in document order.
    #[must_use]
    pub fn all(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Returns the set of methods declared at templates matching the path.
    #[must_use]
    pub fn methods_for(&self, concrete_path: &str) -> BTreeSet<Method> {
        self.endpoints
            .iter()
            .filter(|endpoint| template_matches(&endpoint.path_template, concrete_path))
            .map(|endpoint| endpoint.method)
            .collect()
    }

    /// Returns the endpoint matching a concrete (path, method) pair.
    #[must_use]
    pub fn matches(&self, concrete_path: &str, method: Method) -> Option<&Endpoint> {
        self.endpoints.iter().find(|endpoint| {
            endpoint.method == method && template_matches(&endpoint.path_template, concrete_path)
        })
    }

    /// Resolves `$ref` chains to a concrete schema.
    ///
    /// Unresolvable or cyclic references degrade to an unconstrained string.
    #[must_use]
    pub fn resolve<'a>(&'a self, schema: &'a Schema) -> Schema {
        let mut current = schema;
        for _ in 0 .. MAX_REF_DEPTH {
            match current {
                Schema::Ref(name) => match self.schemas.get(name) {
                    Some(next) => current = next,
                    None => {
                        warn!(name = name.as_str(), "unresolvable schema reference");
                        return Schema::unconstrained_string();
                    }
                },
                other => return other.clone(),
            }
        }
        warn!("schema reference chain exceeded depth limit");
        Schema::unconstrained_string()
    }

    /// Returns the named component schema, if present.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }
}

// ============================================================================
// SECTION: Template Matching
// ============================================================================

/// Returns true when a concrete path matches a `{name}` path template.
///
/// Segment counts must agree; literal segments compare case-insensitively;
/// template segments match any single non-empty concrete segment.
#[must_use]
pub fn template_matches(template: &str, concrete_path: &str) -> bool {
    let template_segments: Vec<&str> = template.split('/').collect();
    let concrete_segments: Vec<&str> = concrete_path.split('/').collect();
    if template_segments.len() != concrete_segments.len() {
        return false;
    }
    template_segments.iter().zip(&concrete_segments).all(|(template_seg, concrete_seg)| {
        if template_seg.starts_with('{') && template_seg.ends_with('}') {
            !concrete_seg.is_empty()
        } else {
            template_seg.eq_ignore_ascii_case(concrete_seg)
        }
    })
}

// ============================================================================
// SECTION: Document Parsing
// ============================================================================

/// Loads `#/components/schemas` into the component table, best-effort.
fn load_component_schemas(document: &Value) -> BTreeMap<String, Schema> {
    document
        .get("components")
        .and_then(|components| components.get("schemas"))
        .and_then(Value::as_object)
        .map(|schemas| {
            schemas
                .iter()
                .map(|(name, fragment)| (name.clone(), Schema::from_openapi(fragment)))
                .collect()
        })
        .unwrap_or_default()
}

/// Parses one operation into an endpoint.
fn parse_operation(
    path: &str,
    method: Method,
    operation: &Value,
    shared_parameters: &[Parameter],
) -> Result<Endpoint, CatalogError> {
    let Some(operation) = operation.as_object() else {
        return Err(CatalogError::MalformedOperation(method, path.to_string()));
    };

    let own_parameters = operation
        .get("parameters")
        .and_then(Value::as_array)
        .map(|entries| parse_parameters(entries))
        .unwrap_or_default();

    // Operation-level parameters override shared path-item parameters with
    // the same (name, location); the rest are inherited.
    let mut parameters: Vec<Parameter> = shared_parameters
        .iter()
        .filter(|shared| {
            !own_parameters
                .iter()
                .any(|own| own.name == shared.name && own.location == shared.location)
        })
        .cloned()
        .collect();
    parameters.extend(own_parameters);

    let request_bodies = operation
        .get("requestBody")
        .and_then(|body| body.get("content"))
        .and_then(Value::as_object)
        .map(|content| {
            content
                .iter()
                .map(|(media_type, declaration)| MediaTypeBody {
                    media_type: media_type.clone(),
                    schema: declaration
                        .get("schema")
                        .map_or_else(Schema::unconstrained_string, Schema::from_openapi),
                })
                .collect()
        })
        .unwrap_or_default();

    let responses = operation
        .get("responses")
        .and_then(Value::as_object)
        .map(|responses| {
            responses
                .iter()
                .map(|(status, declaration)| {
                    let schema = declaration
                        .get("content")
                        .and_then(Value::as_object)
                        .and_then(|content| content.values().next())
                        .and_then(|media| media.get("schema"))
                        .map(Schema::from_openapi);
                    (status.clone(), schema)
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Endpoint {
        path_template: path.to_string(),
        method,
        parameters,
        request_bodies,
        responses,
    })
}

/// Parses a parameter array, skipping malformed entries.
fn parse_parameters(entries: &[Value]) -> Vec<Parameter> {
    let mut parameters: Vec<Parameter> = Vec::new();
    for entry in entries {
        let Some(map) = entry.as_object() else {
            continue;
        };
        let Some(name) = map.get("name").and_then(Value::as_str) else {
            continue;
        };
        let location = match map.get("in").and_then(Value::as_str) {
            Some("path") => ParameterLocation::Path,
            Some("query") => ParameterLocation::Query,
            Some("header") => ParameterLocation::Header,
            Some("cookie") => ParameterLocation::Cookie,
            _ => continue,
        };
        // Name uniqueness per (endpoint, location): first declaration wins.
        if parameters
            .iter()
            .any(|existing| existing.name == name && existing.location == location)
        {
            continue;
        }
        let required = location == ParameterLocation::Path
            || map.get("required").and_then(Value::as_bool).unwrap_or(false);
        let schema = map
            .get("schema")
            .map_or_else(Schema::unconstrained_string, Schema::from_openapi);
        parameters.push(Parameter {
            name: name.to_string(),
            location,
            required,
            schema,
            example: map.get("example").cloned(),
        });
    }
    parameters
}
