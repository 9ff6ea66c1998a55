// api-probe-core/src/runtime/engine.rs
// ============================================================================
// Module: Property Engine
// Description: Sequential property evaluation over one probed pair.
// Purpose: Time, run, and error-contain every registered property.
// Dependencies: crate::{core, runtime::properties}
// ============================================================================

//! ## Overview
//! The engine runs the registered properties, in order, against a single
//! (request, response) pair. Properties are never allowed to terminate the
//! run: an error escaping a check is converted into a failing result with
//! the error text as the reason and its debug rendering as diagnostics.
//! Evaluation is sequential within one pair to preserve state causality;
//! properties share the live state source.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::core::report::PropertyResult;
use crate::core::report::RequestReport;
use crate::runtime::properties::Property;
use crate::runtime::properties::PropertyContext;
use crate::runtime::properties::PropertyOutcome;

// ============================================================================
// SECTION: Property Engine
// ============================================================================

/// Sequential property evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyEngine;

impl PropertyEngine {
    /// Evaluates all properties against one pair and aggregates the report.
    #[must_use]
    pub fn evaluate(
        properties: &[Arc<dyn Property>],
        ctx: &PropertyContext<'_>,
    ) -> RequestReport {
        let mut results = Vec::with_capacity(properties.len());
        for property in properties {
            let started = Instant::now();
            let outcome = match property.check(ctx) {
                Ok(outcome) => outcome,
                Err(err) if err.is_cancelled() => PropertyOutcome::cancelled(),
                Err(err) => {
                    debug!(
                        property = property.name(),
                        error = %err,
                        "property check errored"
                    );
                    PropertyOutcome::fail_with_details(err.to_string(), format!("{err:?}"))
                }
            };
            let elapsed = started.elapsed();
            results.push(PropertyResult {
                property_name: property.name().to_string(),
                property_description: property.description().to_string(),
                rfc_reference: property.rfc_reference().to_string(),
                passed: outcome.passed,
                failure_reason: outcome.failure_reason,
                details: outcome.details,
                execution_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                metrics: outcome.metrics,
            });
        }
        RequestReport::from_results(
            ctx.request.method,
            ctx.request.path.clone(),
            ctx.response.status,
            results,
        )
    }
}
