// system-tests/tests/suites/head_parity.rs
// ============================================================================
// Module: HEAD Parity Scenarios
// Description: HEAD/GET consistency end to end.
// Purpose: Verify the HEAD body rule and GET parity against fixtures.
// Dependencies: helpers, api-probe-core, api-probe-providers
// ============================================================================

use api_probe_core::CancelToken;
use api_probe_core::InMemoryStateSource;

use crate::helpers::docs;
use crate::helpers::fixture::FixtureResponse;
use crate::helpers::fixture::FixtureService;
use crate::helpers::harness::property_result;
use crate::helpers::harness::tester;

// ============================================================================
// SECTION: Scenarios
// ============================================================================

/// A HEAD response declaring a 17-byte payload fails regardless of GET.
#[test]
fn head_with_payload_fails_consistency() {
    let state = InMemoryStateSource::new();
    // 17 bytes, served for HEAD and GET alike.
    let service =
        FixtureService::start(|_| FixtureResponse::with_body(200, "seventeen bytes!!"));

    let tester = tester(docs::posts_head(), &service.base_url, state);
    let cancel = CancelToken::new();
    let reports = tester.run_all(1, &cancel);

    let result = property_result(&reports, "HEAD", "HEAD-GET Response Consistency");
    assert!(!result.passed);
    let reason = result.failure_reason.as_deref().unwrap_or("");
    assert!(
        reason.contains("body bytes") || reason.contains("Content-Length"),
        "unexpected reason: {reason}"
    );
}

/// A HEAD response mirroring GET's status with no payload passes.
#[test]
fn empty_head_matching_get_passes() {
    let state = InMemoryStateSource::new();
    let service = FixtureService::start(|_| FixtureResponse::status(204));

    let tester = tester(docs::posts_head(), &service.base_url, state);
    let cancel = CancelToken::new();
    let reports = tester.run_all(1, &cancel);

    let result = property_result(&reports, "HEAD", "HEAD-GET Response Consistency");
    assert!(result.passed, "{:?}", result.details);
}
