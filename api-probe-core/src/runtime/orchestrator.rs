// api-probe-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Run Orchestrator
// Description: Endpoint-by-endpoint probe loop with report aggregation.
// Purpose: Drive synthesis, sends, and property evaluation with isolation.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The orchestrator walks the catalog, asks the synthesizer for requests,
//! sends each through the service client, and hands the observed pair to the
//! property engine. Property failures never terminate the run; transport
//! failures produce a synthetic failing report and the loop moves on.
//! Endpoints may run in parallel when the operator opts in; requests within
//! one endpoint always run sequentially to preserve property causality.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::thread;

use tracing::warn;

use crate::core::cancel::CancelToken;
use crate::core::catalog::Catalog;
use crate::core::checksum::DEFAULT_HASH_ALGORITHM;
use crate::core::checksum::hash_bytes;
use crate::core::config::ProbeConfig;
use crate::core::endpoint::Endpoint;
use crate::core::message::Request;
use crate::core::pattern::EndpointPattern;
use crate::core::report::PropertyResult;
use crate::core::report::RequestReport;
use crate::interfaces::ServiceClient;
use crate::interfaces::StateSource;
use crate::interfaces::TransportError;
use crate::runtime::engine::PropertyEngine;
use crate::runtime::properties::Property;
use crate::runtime::properties::PropertyContext;
use crate::runtime::sampler::StateSampler;
use crate::runtime::synthesizer::RequestSynthesizer;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Status recorded for transport failures so downstream sorting works.
const TRANSPORT_FAILURE_STATUS: u16 = 500;

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Drives conformance runs over a loaded catalog.
pub struct Orchestrator {
    /// Loaded endpoint catalog.
    catalog: Arc<Catalog>,
    /// Client for the service under test.
    client: Arc<dyn ServiceClient>,
    /// Shared read-only state source.
    state: Arc<dyn StateSource>,
    /// Snapshot sampler.
    sampler: StateSampler,
    /// Registered properties in evaluation order.
    properties: Vec<Arc<dyn Property>>,
    /// Include-only endpoint filters; empty admits all.
    include_patterns: Vec<EndpointPattern>,
    /// Exclusion endpoint filters.
    exclude_patterns: Vec<EndpointPattern>,
    /// Engine configuration.
    config: ProbeConfig,
}

impl Orchestrator {
    /// Creates an orchestrator over validated parts.
    #[must_use]
    #[allow(clippy::too_many_arguments, reason = "assembled once by the builder")]
    pub fn new(
        catalog: Arc<Catalog>,
        client: Arc<dyn ServiceClient>,
        state: Arc<dyn StateSource>,
        properties: Vec<Arc<dyn Property>>,
        include_patterns: Vec<EndpointPattern>,
        exclude_patterns: Vec<EndpointPattern>,
        config: ProbeConfig,
    ) -> Self {
        let sampler = StateSampler::new(config.state_tracking.clone());
        Self {
            catalog,
            client,
            state,
            sampler,
            properties,
            include_patterns,
            exclude_patterns,
            config,
        }
    }

    /// Returns the loaded catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns the registered properties in evaluation order.
    #[must_use]
    pub fn properties(&self) -> &[Arc<dyn Property>] {
        &self.properties
    }

    /// Probes every selected endpoint with up to `max_per_endpoint` requests.
    ///
    /// Cancellation is observed between endpoints and between requests;
    /// reports collected so far are still returned.
    #[must_use]
    pub fn run_all(&self, max_per_endpoint: usize, cancel: &CancelToken) -> Vec<RequestReport> {
        let selected: Vec<&Endpoint> =
            self.catalog.all().iter().filter(|endpoint| self.selects(endpoint)).collect();

        if !self.config.parallel_endpoints || selected.len() < 2 {
            let mut reports = Vec::new();
            for endpoint in selected {
                if cancel.is_cancelled() {
                    break;
                }
                reports.extend(self.run_endpoint(endpoint, max_per_endpoint, cancel));
            }
            return reports;
        }

        let queue: Mutex<VecDeque<&Endpoint>> = Mutex::new(selected.iter().copied().collect());
        let collected: Mutex<Vec<RequestReport>> = Mutex::new(Vec::new());
        let workers = self.config.max_parallel_endpoints.min(selected.len()).max(1);
        thread::scope(|scope| {
            for _ in 0 .. workers {
                scope.spawn(|| {
                    loop {
                        if cancel.is_cancelled() {
                            return;
                        }
                        let next = {
                            let mut guard =
                                queue.lock().unwrap_or_else(PoisonError::into_inner);
                            guard.pop_front()
                        };
                        let Some(endpoint) = next else {
                            return;
                        };
                        let reports = self.run_endpoint(endpoint, max_per_endpoint, cancel);
                        collected
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .extend(reports);
                    }
                });
            }
        });
        collected.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Probes one endpoint sequentially.
    fn run_endpoint(
        &self,
        endpoint: &Endpoint,
        max_per_endpoint: usize,
        cancel: &CancelToken,
    ) -> Vec<RequestReport> {
        let seed = endpoint_seed(self.config.seed, endpoint);
        let mut synthesizer = RequestSynthesizer::new(&self.catalog, self.state.as_ref(), seed);
        let requests = synthesizer.synthesize(endpoint, max_per_endpoint, cancel);

        let mut reports = Vec::with_capacity(requests.len());
        for request in requests {
            if cancel.is_cancelled() {
                break;
            }
            reports.push(self.probe(&request, cancel));
        }
        reports
    }

    /// Sends one request and evaluates the property kit against the pair.
    #[must_use]
    pub fn probe(&self, request: &Request, cancel: &CancelToken) -> RequestReport {
        match self.client.send(request, cancel) {
            Ok(response) => {
                let ctx = PropertyContext {
                    request,
                    response: &response,
                    client: self.client.as_ref(),
                    state: self.state.as_ref(),
                    sampler: &self.sampler,
                    catalog: &self.catalog,
                    cancel,
                };
                PropertyEngine::evaluate(&self.properties, &ctx)
            }
            Err(err) => {
                warn!(
                    method = request.method.as_str(),
                    path = request.path.as_str(),
                    error = %err,
                    "request send failed"
                );
                synthetic_failure_report(request, &err)
            }
        }
    }

    /// Returns true when filters admit the endpoint.
    fn selects(&self, endpoint: &Endpoint) -> bool {
        if !self.include_patterns.is_empty() {
            return self
                .include_patterns
                .iter()
                .any(|pattern| pattern.matches(&endpoint.path_template));
        }
        !self.exclude_patterns.iter().any(|pattern| pattern.matches(&endpoint.path_template))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Derives a stable per-endpoint seed, independent of endpoint order.
fn endpoint_seed(base: u64, endpoint: &Endpoint) -> u64 {
    let digest = hash_bytes(
        DEFAULT_HASH_ALGORITHM,
        format!("{} {}", endpoint.method, endpoint.path_template).as_bytes(),
    );
    let prefix = digest.value.get(.. 16).unwrap_or("0");
    base ^ u64::from_str_radix(prefix, 16).unwrap_or(0)
}

/// Builds the synthetic report recorded for a failed send.
fn synthetic_failure_report(request: &Request, err: &TransportError) -> RequestReport {
    let result = PropertyResult {
        property_name: "Request Failed".to_string(),
        property_description: "The HTTP request could not be completed".to_string(),
        rfc_reference: String::new(),
        passed: false,
        failure_reason: Some(err.to_string()),
        details: None,
        execution_time_ms: 0,
        metrics: std::collections::BTreeMap::new(),
    };
    RequestReport::from_results(
        request.method,
        request.path.clone(),
        TRANSPORT_FAILURE_STATUS,
        vec![result],
    )
}
