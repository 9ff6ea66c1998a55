// system-tests/tests/suites/allow_headers.rs
// ============================================================================
// Module: Allow Header Scenarios
// Description: OPTIONS accuracy and 405 presence rules end to end.
// Purpose: Verify Allow-header properties against live fixture services.
// Dependencies: helpers, api-probe-core, api-probe-providers
// ============================================================================

use api_probe_core::CancelToken;
use api_probe_core::InMemoryStateSource;
use api_probe_core::Method;
use api_probe_core::Request;

use crate::helpers::docs;
use crate::helpers::fixture::FixtureResponse;
use crate::helpers::fixture::FixtureService;
use crate::helpers::harness::property_result;
use crate::helpers::harness::tester;

// ============================================================================
// SECTION: OPTIONS Accuracy
// ============================================================================

/// OPTIONS without an Allow header fails the accuracy property.
#[test]
fn options_without_allow_fails() {
    let state = InMemoryStateSource::new();
    let service = FixtureService::start(|request| {
        if request.method == "OPTIONS" {
            FixtureResponse::status(200)
        } else {
            FixtureResponse::with_body(200, "[]")
        }
    });

    let tester = tester(docs::users_with_options(), &service.base_url, state);
    let cancel = CancelToken::new();
    let reports = tester.run_all(1, &cancel);

    let result = property_result(&reports, "OPTIONS", "OPTIONS Allow Header");
    assert!(!result.passed);
    assert_eq!(result.failure_reason.as_deref(), Some("missing Allow header"));
}

/// OPTIONS advertising exactly the declared methods passes.
#[test]
fn options_with_accurate_allow_passes() {
    let state = InMemoryStateSource::new();
    let service = FixtureService::start(|request| {
        if request.method == "OPTIONS" {
            FixtureResponse::status(200).header("Allow", "GET, POST, HEAD, OPTIONS")
        } else {
            FixtureResponse::with_body(200, "[]")
        }
    });

    let tester = tester(docs::users_with_options(), &service.base_url, state);
    let cancel = CancelToken::new();
    let reports = tester.run_all(1, &cancel);

    let result = property_result(&reports, "OPTIONS", "OPTIONS Allow Header");
    assert!(result.passed, "{:?}", result.details);
}

/// An Allow header advertising an undeclared method fails with the diff.
#[test]
fn options_with_undeclared_method_fails() {
    let state = InMemoryStateSource::new();
    let service = FixtureService::start(|request| {
        if request.method == "OPTIONS" {
            FixtureResponse::status(200).header("Allow", "GET, POST, HEAD, OPTIONS, DELETE")
        } else {
            FixtureResponse::with_body(200, "[]")
        }
    });

    let tester = tester(docs::users_with_options(), &service.base_url, state);
    let cancel = CancelToken::new();
    let reports = tester.run_all(1, &cancel);

    let result = property_result(&reports, "OPTIONS", "OPTIONS Allow Header");
    assert!(!result.passed);
    assert!(result.details.as_deref().unwrap_or("").contains("undeclared: DELETE"));
}

// ============================================================================
// SECTION: 405 Presence
// ============================================================================

/// A 405 without Allow fails the presence property.
#[test]
fn method_not_allowed_without_allow_fails() {
    let state = InMemoryStateSource::new();
    let service = FixtureService::start(|_| FixtureResponse::status(405));

    let tester = tester(docs::users_patch(), &service.base_url, state);
    let cancel = CancelToken::new();
    let reports = tester.run_all(1, &cancel);

    let result =
        property_result(&reports, "PATCH", "405 Method Not Allowed Allow Header");
    assert!(!result.passed);
    assert_eq!(result.failure_reason.as_deref(), Some("missing Allow header"));
}

/// A 405 carrying any non-empty Allow passes.
#[test]
fn method_not_allowed_with_allow_passes() {
    let state = InMemoryStateSource::new();
    let service =
        FixtureService::start(|_| FixtureResponse::status(405).header("Allow", "GET, POST"));

    let tester = tester(docs::users_patch(), &service.base_url, state);
    let cancel = CancelToken::new();

    let request = Request {
        method: Method::Patch,
        path: "/api/users".to_string(),
        query: Vec::new(),
        headers: Vec::new(),
        body: None,
    };
    let report = tester.check_request(&request, &cancel);
    let result = report
        .property_results
        .iter()
        .find(|result| result.property_name == "405 Method Not Allowed Allow Header")
        .expect("405 property result");
    assert!(result.passed);
}
