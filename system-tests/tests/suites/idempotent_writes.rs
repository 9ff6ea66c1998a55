// system-tests/tests/suites/idempotent_writes.rs
// ============================================================================
// Module: Idempotent Write Scenarios
// Description: PUT and DELETE repeat-request behavior end to end.
// Purpose: Verify idempotency properties against live fixture services.
// Dependencies: helpers, api-probe-core, api-probe-providers
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use api_probe_core::CancelToken;
use api_probe_core::InMemoryStateSource;
use serde_json::json;

use crate::helpers::docs;
use crate::helpers::fixture::FixtureResponse;
use crate::helpers::fixture::FixtureService;
use crate::helpers::harness::property_result;
use crate::helpers::harness::tester;

// ============================================================================
// SECTION: Scenarios
// ============================================================================

/// A PUT that appends an audit row on every call is not idempotent.
#[test]
fn audited_put_fails_idempotency() {
    let state = InMemoryStateSource::new();
    state.define_kind("Posts", "id");
    state.put_row("Posts", "1", json!({"id": "1", "title": "first"}));
    state.define_kind("AuditLog", "id");

    let audit_state = state.clone();
    let counter = AtomicU64::new(0);
    let service = FixtureService::start(move |request| {
        if request.method == "PUT" {
            let index = counter.fetch_add(1, Ordering::SeqCst);
            audit_state.put_row(
                "AuditLog",
                format!("audit-{index:04}"),
                json!({"id": format!("audit-{index:04}"), "action": "update-post"}),
            );
            FixtureResponse::with_body(200, r#"{"id":"1","title":"t"}"#)
        } else {
            FixtureResponse::status(404)
        }
    });

    let tester = tester(docs::posts_put(), &service.base_url, state);
    let cancel = CancelToken::new();
    let reports = tester.run_all(1, &cancel);

    let result = property_result(&reports, "PUT", "PUT Method Idempotency");
    assert!(!result.passed);
    assert_eq!(
        result.failure_reason.as_deref(),
        Some("second request caused additional state changes")
    );
}

/// A truly idempotent PUT passes.
#[test]
fn stable_put_passes_idempotency() {
    let state = InMemoryStateSource::new();
    state.define_kind("Posts", "id");
    state.put_row("Posts", "1", json!({"id": "1", "title": "first"}));

    let put_state = state.clone();
    let service = FixtureService::start(move |request| {
        if request.method == "PUT" {
            // Same write every time: replace the row with a fixed value.
            put_state.put_row("Posts", "1", json!({"id": "1", "title": "replaced"}));
            FixtureResponse::with_body(200, r#"{"id":"1"}"#)
        } else {
            FixtureResponse::status(404)
        }
    });

    let tester = tester(docs::posts_put(), &service.base_url, state);
    let cancel = CancelToken::new();
    let reports = tester.run_all(1, &cancel);

    let result = property_result(&reports, "PUT", "PUT Method Idempotency");
    assert!(result.passed, "{:?}", result.failure_reason);
}

/// DELETE answering 200 then 404 is accepted as idempotent.
#[test]
fn delete_success_then_not_found_passes() {
    let state = InMemoryStateSource::new();
    state.define_kind("Posts", "id");
    state.put_row("Posts", "5", json!({"id": "5", "title": "gone soon"}));

    let delete_state = state.clone();
    let service = FixtureService::start(move |request| {
        if request.method == "DELETE" {
            if delete_state.remove_row("Posts", "5") {
                FixtureResponse::status(200)
            } else {
                FixtureResponse::status(404)
            }
        } else {
            FixtureResponse::status(404)
        }
    });

    let tester = tester(docs::posts_delete(), &service.base_url, state);
    let cancel = CancelToken::new();
    let reports = tester.run_all(1, &cancel);

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].request_path, "/api/posts/5");
    let result = property_result(&reports, "DELETE", "DELETE Method Idempotency");
    assert!(result.passed, "{:?}", result.failure_reason);
}

/// DELETE answering 500 on repeat fails the acceptance matrix.
#[test]
fn delete_error_on_repeat_fails() {
    let state = InMemoryStateSource::new();
    state.define_kind("Posts", "id");
    state.put_row("Posts", "5", json!({"id": "5"}));

    let counter = AtomicU64::new(0);
    let service = FixtureService::start(move |request| {
        if request.method == "DELETE" {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                FixtureResponse::status(200)
            } else {
                FixtureResponse::status(500)
            }
        } else {
            FixtureResponse::status(404)
        }
    });

    let tester = tester(docs::posts_delete(), &service.base_url, state);
    let cancel = CancelToken::new();
    let reports = tester.run_all(1, &cancel);

    let result = property_result(&reports, "DELETE", "DELETE Method Idempotency");
    assert!(!result.passed);
    assert!(result.failure_reason.as_deref().unwrap_or("").contains("200 then 500"));
}
