// api-probe-core/src/runtime/properties/safety.rs
// ============================================================================
// Module: Method Safety Properties
// Description: Safety checks for GET, HEAD, and OPTIONS requests.
// Purpose: Detect observable state changes caused by safe methods.
// Dependencies: crate::runtime::{properties, sampler}
// ============================================================================

//! ## Overview
//! RFC 7231 §4.2.1 requires GET, HEAD, and OPTIONS to be free of observable
//! side effects. The orchestrator has already issued the triggering request
//! before any property runs, so a pre-request snapshot is not available
//! here. These properties instead re-issue the nominally safe request
//! between two captures of their own and fail when anything changed: a safe
//! method must tolerate the repeat by definition, and any drift between the
//! surrounding captures is attributable to it. A design that captured a
//! pre-send snapshot in the orchestrator could avoid the extra probe.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::method::Method;
use crate::runtime::properties::Property;
use crate::runtime::properties::PropertyCategory;
use crate::runtime::properties::PropertyContext;
use crate::runtime::properties::PropertyError;
use crate::runtime::properties::PropertyOutcome;
use crate::runtime::properties::drift_failure;

// ============================================================================
// SECTION: Shared Check
// ============================================================================

/// Runs the capture/probe/capture drift check for one safe method.
fn check_safety(
    target: Method,
    ctx: &PropertyContext<'_>,
) -> Result<PropertyOutcome, PropertyError> {
    if ctx.request.method != target {
        return Ok(PropertyOutcome::not_applicable());
    }
    if ctx.cancel.is_cancelled() {
        return Ok(PropertyOutcome::cancelled());
    }
    let before = ctx.sampler.capture(ctx.state, ctx.cancel)?;
    let probe = ctx.request.clone();
    let _ = ctx.client.send(&probe, ctx.cancel)?;
    let after = ctx.sampler.capture(ctx.state, ctx.cancel)?;
    if let Some(failure) = drift_failure(&before, &after, "request caused state changes") {
        return Ok(failure);
    }
    Ok(PropertyOutcome::pass()
        .with_metric("captureMillisBefore", before.capture_time.as_secs_f64() * 1000.0)
        .with_metric("captureMillisAfter", after.capture_time.as_secs_f64() * 1000.0))
}

// ============================================================================
// SECTION: GET Safety
// ============================================================================

/// GET requests must not change observable state.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetSafetyProperty;

impl Property for GetSafetyProperty {
    fn name(&self) -> &str {
        "GET Method Safety"
    }

    fn description(&self) -> &str {
        "GET requests must not cause observable state changes"
    }

    fn rfc_reference(&self) -> &str {
        "RFC 7231 §4.2.1"
    }

    fn category(&self) -> PropertyCategory {
        PropertyCategory::Safety
    }

    fn check(&self, ctx: &PropertyContext<'_>) -> Result<PropertyOutcome, PropertyError> {
        check_safety(Method::Get, ctx)
    }
}

// ============================================================================
// SECTION: HEAD Safety
// ============================================================================

/// HEAD requests must not change observable state.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadSafetyProperty;

impl Property for HeadSafetyProperty {
    fn name(&self) -> &str {
        "HEAD Method Safety"
    }

    fn description(&self) -> &str {
        "HEAD requests must not cause observable state changes"
    }

    fn rfc_reference(&self) -> &str {
        "RFC 7231 §4.2.1"
    }

    fn category(&self) -> PropertyCategory {
        PropertyCategory::Safety
    }

    fn check(&self, ctx: &PropertyContext<'_>) -> Result<PropertyOutcome, PropertyError> {
        check_safety(Method::Head, ctx)
    }
}

// ============================================================================
// SECTION: OPTIONS Safety
// ============================================================================

/// OPTIONS requests must not change observable state.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionsSafetyProperty;

impl Property for OptionsSafetyProperty {
    fn name(&self) -> &str {
        "OPTIONS Method Safety"
    }

    fn description(&self) -> &str {
        "OPTIONS requests must not cause observable state changes"
    }

    fn rfc_reference(&self) -> &str {
        "RFC 7231 §4.2.1"
    }

    fn category(&self) -> PropertyCategory {
        PropertyCategory::Safety
    }

    fn check(&self, ctx: &PropertyContext<'_>) -> Result<PropertyOutcome, PropertyError> {
        check_safety(Method::Options, ctx)
    }
}
