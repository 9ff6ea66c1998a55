// system-tests/tests/helpers/harness.rs
// ============================================================================
// Module: Scenario Harness
// Description: Builder shortcuts for scenario testers.
// Purpose: Assemble a tester against a fixture service in one call.
// Dependencies: api-probe-core, api-probe-providers
// ============================================================================

use api_probe_core::CancelToken;
use api_probe_core::InMemoryStateSource;
use api_probe_core::ProbeBuilder;
use api_probe_core::RequestReport;
use api_probe_core::StateTrackingConfig;
use api_probe_core::Tester;
use api_probe_providers::HttpClientConfig;
use api_probe_providers::HttpServiceClient;
use serde_json::Value;
use url::Url;

/// Builds a tester for a fixture service with default tracking.
pub fn tester(document: Value, base_url: &Url, state: InMemoryStateSource) -> Tester {
    tester_with_tracking(document, base_url, state, StateTrackingConfig::default())
}

/// Builds a tester for a fixture service with explicit tracking.
pub fn tester_with_tracking(
    document: Value,
    base_url: &Url,
    state: InMemoryStateSource,
    tracking: StateTrackingConfig,
) -> Tester {
    let client = HttpServiceClient::new(HttpClientConfig::new(base_url.clone()))
        .expect("http client");
    ProbeBuilder::new()
        .with_openapi(document)
        .with_service_client(client)
        .with_state_source(state)
        .configure_state_tracking(tracking)
        .build(&CancelToken::new())
        .expect("tester build")
}

/// Finds one property result in a run by request method and property name.
pub fn property_result<'a>(
    reports: &'a [RequestReport],
    method: &str,
    property: &str,
) -> &'a api_probe_core::PropertyResult {
    reports
        .iter()
        .find(|report| report.request_method.as_str() == method)
        .and_then(|report| {
            report
                .property_results
                .iter()
                .find(|result| result.property_name == property)
        })
        .unwrap_or_else(|| panic!("no {property} result for {method}"))
}
