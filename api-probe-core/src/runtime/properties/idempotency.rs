// api-probe-core/src/runtime/properties/idempotency.rs
// ============================================================================
// Module: Method Idempotency Properties
// Description: Idempotency checks for PUT and DELETE requests.
// Purpose: Verify that repeating a request leaves state and status stable.
// Dependencies: crate::runtime::{properties, sampler}
// ============================================================================

//! ## Overview
//! RFC 7231 §4.2.2 requires PUT and DELETE applied twice to yield the same
//! state as applied once. These properties clone the original request (the
//! body is re-materialized from stored bytes, so the clone is independently
//! sendable), issue it again, and compare state around the repeat as well as
//! the two status codes.

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
// SECTION: PUT Idempotency
// ============================================================================

/// Repeating a successful PUT must not change state or status.
#[derive(Debug, Clone, Copy, Default)]
pub struct PutIdempotencyProperty;

impl Property for PutIdempotencyProperty {
    fn name(&self) -> &str {
        "PUT Method Idempotency"
    }

    fn description(&self) -> &str {
        "PUT requests applied twice must yield the same state as applied once"
    }

    fn rfc_reference(&self) -> &str {
        "RFC 7231 §4.2.2"
    }

    fn category(&self) -> PropertyCategory {
        PropertyCategory::Idempotency
    }

    fn check(&self, ctx: &PropertyContext<'_>) -> Result<PropertyOutcome, PropertyError> {
        if ctx.request.method != Method::Put || !ctx.response.is_success() {
            return Ok(PropertyOutcome::not_applicable());
        }
        if ctx.cancel.is_cancelled() {
            return Ok(PropertyOutcome::cancelled());
        }

        let before = ctx.sampler.capture(ctx.state, ctx.cancel)?;
        let repeat = ctx.request.clone();
        let second = ctx.client.send(&repeat, ctx.cancel)?;
        let after = ctx.sampler.capture(ctx.state, ctx.cancel)?;

        if let Some(failure) =
            drift_failure(&before, &after, "second request caused additional state changes")
        {
            return Ok(failure);
        }
        if ctx.response.status != second.status {
            return Ok(PropertyOutcome::fail(format!(
                "different status codes on repeat: {} vs {}",
                ctx.response.status, second.status
            )));
        }
        Ok(PropertyOutcome::pass())
    }
}

// ============================================================================
// SECTION: DELETE Idempotency
// ============================================================================

/// Repeating a DELETE must not change state; 404 after success is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteIdempotencyProperty;

impl DeleteIdempotencyProperty {
    /// Accepts the observed status pair per the DELETE idempotency matrix.
    ///
    /// Equal statuses always pass; a successful first delete followed by
    /// 404 passes because the resource is simply gone.
    #[must_use]
    pub fn statuses_idempotent(first: u16, second: u16) -> bool {
        first == second || (matches!(first, 200 | 202 | 204) && second == 404)
    }
}

impl Property for DeleteIdempotencyProperty {
    fn name(&self) -> &str {
        "DELETE Method Idempotency"
    }

    fn description(&self) -> &str {
        "DELETE requests applied twice must yield the same state as applied once"
    }

    fn rfc_reference(&self) -> &str {
        "RFC 7231 §4.2.2"
    }

    fn category(&self) -> PropertyCategory {
        PropertyCategory::Idempotency
    }

    fn check(&self, ctx: &PropertyContext<'_>) -> Result<PropertyOutcome, PropertyError> {
        if ctx.request.method != Method::Delete {
            return Ok(PropertyOutcome::not_applicable());
        }
        if ctx.cancel.is_cancelled() {
            return Ok(PropertyOutcome::cancelled());
        }

        let before = ctx.sampler.capture(ctx.state, ctx.cancel)?;
        let repeat = ctx.request.clone();
        let second = ctx.client.send(&repeat, ctx.cancel)?;
        let after = ctx.sampler.capture(ctx.state, ctx.cancel)?;

        if let Some(failure) =
            drift_failure(&before, &after, "second request caused additional state changes")
        {
            return Ok(failure);
        }
        if !Self::statuses_idempotent(ctx.response.status, second.status) {
            return Ok(PropertyOutcome::fail(format!(
                "non-idempotent status pair: {} then {}",
                ctx.response.status, second.status
            )));
        }
        Ok(PropertyOutcome::pass())
    }
}
