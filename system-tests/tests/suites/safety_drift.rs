// system-tests/tests/suites/safety_drift.rs
// ============================================================================
// Module: Safety Drift Scenarios
// Description: GET endpoints with audit-log side effects.
// Purpose: Verify safety properties catch and respect exclusions for drift.
// Dependencies: helpers, api-probe-core, api-probe-providers
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use api_probe_core::CancelToken;
use api_probe_core::InMemoryStateSource;
use api_probe_core::StateTrackingConfig;
use serde_json::json;

use crate::helpers::docs;
use crate::helpers::fixture::FixtureResponse;
use crate::helpers::fixture::FixtureService;
use crate::helpers::harness::property_result;
use crate::helpers::harness::tester;
use crate::helpers::harness::tester_with_tracking;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// A user-listing service that writes an audit row on every GET.
fn audited_service(state: &InMemoryStateSource) -> FixtureService {
    state.define_kind("Users", "id");
    state.put_row("Users", "u1", json!({"id": "u1", "name": "Ada"}));
    state.put_row("Users", "u2", json!({"id": "u2", "name": "Grace"}));
    state.define_kind("AuditLog", "id");

    let audit_state = state.clone();
    let counter = AtomicU64::new(0);
    FixtureService::start(move |request| {
        if request.method == "GET" && request.url.starts_with("/api/users") {
            let index = counter.fetch_add(1, Ordering::SeqCst);
            audit_state.put_row(
                "AuditLog",
                format!("audit-{index:04}"),
                json!({"id": format!("audit-{index:04}"), "action": "list-users"}),
            );
            FixtureResponse::with_body(200, r#"[{"id":"u1"},{"id":"u2"}]"#)
        } else {
            FixtureResponse::status(404)
        }
    })
}

// ============================================================================
// SECTION: Scenarios
// ============================================================================

/// A GET with an audit side effect fails the safety property.
#[test]
fn audited_get_fails_safety() {
    let state = InMemoryStateSource::new();
    let service = audited_service(&state);
    let tester = tester(docs::users_get_only(), &service.base_url, state);

    let cancel = CancelToken::new();
    let reports = tester.run_all(1, &cancel);
    assert_eq!(reports.len(), 1);

    let result = property_result(&reports, "GET", "GET Method Safety");
    assert!(!result.passed);
    assert_eq!(result.failure_reason.as_deref(), Some("request caused state changes"));
    assert!(result.details.as_deref().unwrap_or("").contains("AuditLog"));
}

/// Excluding the audit kind makes the same service pass.
#[test]
fn audited_get_passes_with_audit_excluded() {
    let state = InMemoryStateSource::new();
    let service = audited_service(&state);
    let tracking = StateTrackingConfig {
        exclude: ["AuditLog".to_string()].into(),
        ..StateTrackingConfig::default()
    };
    let tester =
        tester_with_tracking(docs::users_get_only(), &service.base_url, state, tracking);

    let cancel = CancelToken::new();
    let reports = tester.run_all(1, &cancel);
    let result = property_result(&reports, "GET", "GET Method Safety");
    assert!(result.passed, "{:?}", result.failure_reason);
}

/// A side-effect-free GET passes with full tracking.
#[test]
fn quiet_get_passes_safety() {
    let state = InMemoryStateSource::new();
    state.define_kind("Users", "id");
    state.put_row("Users", "u1", json!({"id": "u1"}));
    let service = FixtureService::start(|_| FixtureResponse::with_body(200, "[]"));
    let tester = tester(docs::users_get_only(), &service.base_url, state);

    let cancel = CancelToken::new();
    let reports = tester.run_all(1, &cancel);
    let result = property_result(&reports, "GET", "GET Method Safety");
    assert!(result.passed, "{:?}", result.failure_reason);
}
