// api-probe-core/tests/catalog.rs
// ============================================================================
// Module: Endpoint Catalog Tests
// Description: OpenAPI loading, template matching, and lookups.
// Purpose: Ensure the catalog survives malformed input and matches paths.
// Dependencies: api-probe-core, serde_json
// ============================================================================

//! ## Overview
//! Validates best-effort document loading, segment-wise template matching,
//! and the `methods_for` / `matches` lookups.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use api_probe_core::Catalog;
use api_probe_core::Method;
use api_probe_core::ParameterLocation;
use api_probe_core::catalog::template_matches;
use serde_json::json;

use crate::common::sample_openapi;

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Loads all declared endpoints from the sample document.
#[test]
fn catalog_loads_all_endpoints() {
    let catalog = Catalog::load(&sample_openapi());
    assert_eq!(catalog.all().len(), 8);
    assert!(catalog.matches("/api/users", Method::Post).is_some());
    assert!(catalog.matches("/api/users/42", Method::Delete).is_some());
}

/// Malformed operations are skipped without failing the surviving set.
#[test]
fn catalog_skips_unparsable_endpoints() {
    let document = json!({
        "openapi": "3.0.1",
        "paths": {
            "/api/ok": { "get": { "responses": { "200": {} } } },
            "/api/broken": { "get": "not an object" },
            "/api/alsobad": 17
        }
    });
    let catalog = Catalog::load(&document);
    assert_eq!(catalog.all().len(), 1);
    assert_eq!(catalog.all()[0].path_template, "/api/ok");
}

/// A document without paths yields an empty catalog, not an error.
#[test]
fn catalog_tolerates_missing_paths() {
    let catalog = Catalog::load(&json!({ "openapi": "3.0.1" }));
    assert!(catalog.all().is_empty());
}

/// Path-item parameters are inherited and operation parameters win.
#[test]
fn catalog_merges_shared_parameters() {
    let catalog = Catalog::load(&sample_openapi());
    let endpoint = catalog.matches("/api/users/7", Method::Get).unwrap();
    let path_params: Vec<_> = endpoint
        .parameters
        .iter()
        .filter(|param| param.location == ParameterLocation::Path)
        .collect();
    assert_eq!(path_params.len(), 1);
    assert_eq!(path_params[0].name, "userId");
    assert!(path_params[0].required);
}

/// Component references resolve through the name table.
#[test]
fn catalog_resolves_component_references() {
    let catalog = Catalog::load(&sample_openapi());
    let user = catalog.component("User").unwrap();
    let resolved = catalog.resolve(user);
    let api_probe_core::Schema::Object(object) = resolved else {
        panic!("expected object schema");
    };
    assert!(object.is_required("name"));
    assert!(object.is_required("email"));
    assert!(!object.is_required("age"));
}

// ============================================================================
// SECTION: Template Matching
// ============================================================================

/// Literal segments match case-insensitively, preserving segment counts.
#[test]
fn template_matching_is_case_insensitive() {
    assert!(template_matches("/api/Users", "/API/users"));
    assert!(!template_matches("/api/users", "/api/users/42"));
}

/// Template segments match any single non-empty segment.
#[test]
fn template_segments_match_single_segments() {
    assert!(template_matches("/api/{id}", "/api/42"));
    assert!(!template_matches("/api/{id}", "/api/42/x"));
    assert!(!template_matches("/api/{id}", "/api/"));
}

// ============================================================================
// SECTION: Lookups
// ============================================================================

/// `methods_for` unions every template matching the concrete path.
#[test]
fn methods_for_returns_declared_methods() {
    let catalog = Catalog::load(&sample_openapi());
    let methods = catalog.methods_for("/api/users");
    assert!(methods.contains(&Method::Get));
    assert!(methods.contains(&Method::Post));
    assert!(methods.contains(&Method::Options));
    assert!(!methods.contains(&Method::Delete));

    let methods = catalog.methods_for("/api/users/42");
    assert!(methods.contains(&Method::Put));
    assert!(methods.contains(&Method::Delete));
}

/// `matches` requires both the template and the method to agree.
#[test]
fn matches_requires_method_agreement() {
    let catalog = Catalog::load(&sample_openapi());
    assert!(catalog.matches("/api/posts", Method::Head).is_some());
    assert!(catalog.matches("/api/posts", Method::Delete).is_none());
}
