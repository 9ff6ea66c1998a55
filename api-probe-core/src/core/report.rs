// api-probe-core/src/core/report.rs
// ============================================================================
// Module: Conformance Reports
// Description: Per-request and run-level report payloads.
// Purpose: Provide the stable JSON report surface for downstream rendering.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Report types serialize with stable camelCase field names so downstream
//! renderers (HTML, Markdown, dashboards) stay compatible across releases.
//! Rendering itself is out of scope; this module only owns the payload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::method::Method;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Property Results
// ============================================================================

/// Result of one property evaluation against one request/response pair.
///
/// # Invariants
/// - `passed == false` implies `failure_reason` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResult {
    /// Stable property name.
    pub property_name: String,
    /// Human-readable property description.
    pub property_description: String,
    /// RFC citation, e.g. `RFC 7231 §4.2.1`. Empty for business rules.
    pub rfc_reference: String,
    /// Whether the property held.
    pub passed: bool,
    /// Failure reason; set whenever `passed` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Supplementary diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Wall-clock evaluation time in milliseconds.
    pub execution_time_ms: u64,
    /// Optional numeric metrics recorded during evaluation.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, f64>,
}

// ============================================================================
// SECTION: Request Reports
// ============================================================================

/// Aggregated result of one probed request.
///
/// # Invariants
/// - `overall_passed` holds iff every property result passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestReport {
    /// Request method.
    pub request_method: Method,
    /// Request path.
    pub request_path: String,
    /// Observed response status code.
    pub response_status_code: u16,
    /// Conjunction of all property results.
    pub overall_passed: bool,
    /// Number of properties evaluated.
    pub total_properties: usize,
    /// Number of passing properties.
    pub passed_properties: usize,
    /// Number of failing properties.
    pub failed_properties: usize,
    /// Total wall-clock property evaluation time in milliseconds.
    pub execution_time_ms: u64,
    /// Per-property results in evaluation order.
    pub property_results: Vec<PropertyResult>,
}

impl RequestReport {
    /// Assembles a report from property results, computing the aggregates.
    #[must_use]
    pub fn from_results(
        method: Method,
        path: impl Into<String>,
        status: u16,
        property_results: Vec<PropertyResult>,
    ) -> Self {
        let total_properties = property_results.len();
        let passed_properties = property_results.iter().filter(|result| result.passed).count();
        let execution_time_ms = property_results.iter().map(|result| result.execution_time_ms).sum();
        Self {
            request_method: method,
            request_path: path.into(),
            response_status_code: status,
            overall_passed: passed_properties == total_properties,
            total_properties,
            passed_properties,
            failed_properties: total_properties - passed_properties,
            execution_time_ms,
            property_results,
        }
    }
}

// ============================================================================
// SECTION: Run Reports
// ============================================================================

/// Run-level summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Percentage of requests whose reports passed overall.
    pub overall_pass_rate: f64,
    /// Number of probed requests.
    pub total_tests: usize,
    /// Number of requests that passed overall.
    pub passed_tests: usize,
    /// Number of requests with at least one failure.
    pub failed_tests: usize,
    /// Total property evaluations across the run.
    pub total_properties: usize,
    /// Passing property evaluations.
    pub passed_properties: usize,
    /// Failing property evaluations.
    pub failed_properties: usize,
    /// Distinct (method, path) pairs probed.
    pub unique_endpoints: usize,
    /// Percentage of property evaluations that passed.
    pub property_pass_rate: f64,
    /// Mean per-request evaluation time in milliseconds.
    pub average_response_time_ms: f64,
}

/// Run-level conformance report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConformanceReport {
    /// Report title.
    pub title: String,
    /// Generation timestamp, epoch milliseconds.
    pub generated_at: Timestamp,
    /// Aggregated run statistics.
    pub summary: ReportSummary,
    /// Per-request reports.
    pub results: Vec<RequestReport>,
}

impl ConformanceReport {
    /// Builds a run report from per-request results.
    #[must_use]
    pub fn from_results(title: impl Into<String>, results: Vec<RequestReport>) -> Self {
        let total_tests = results.len();
        let passed_tests = results.iter().filter(|result| result.overall_passed).count();
        let total_properties: usize = results.iter().map(|result| result.total_properties).sum();
        let passed_properties: usize = results.iter().map(|result| result.passed_properties).sum();
        let unique_endpoints = results
            .iter()
            .map(|result| (result.request_method, result.request_path.as_str()))
            .collect::<BTreeSet<_>>()
            .len();
        let total_time: u64 = results.iter().map(|result| result.execution_time_ms).sum();

        let percentage = |part: usize, whole: usize| {
            if whole == 0 {
                100.0
            } else {
                (part as f64 / whole as f64) * 100.0
            }
        };

        Self {
            title: title.into(),
            generated_at: Timestamp::now(),
            summary: ReportSummary {
                overall_pass_rate: percentage(passed_tests, total_tests),
                total_tests,
                passed_tests,
                failed_tests: total_tests - passed_tests,
                total_properties,
                passed_properties,
                failed_properties: total_properties - passed_properties,
                unique_endpoints,
                property_pass_rate: percentage(passed_properties, total_properties),
                average_response_time_ms: if total_tests == 0 {
                    0.0
                } else {
                    total_time as f64 / total_tests as f64
                },
            },
            results,
        }
    }
}
