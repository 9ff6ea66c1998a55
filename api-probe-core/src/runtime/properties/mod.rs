// api-probe-core/src/runtime/properties/mod.rs
// ============================================================================
// Module: Property Kit
// Description: Property trait, evaluation context, and built-in properties.
// Purpose: Define the predicate surface evaluated against probed pairs.
// Dependencies: crate::{core, interfaces, runtime::sampler}
// ============================================================================

//! ## Overview
//! A property is a predicate over one (request, response) pair and the live
//! collaborators. Built-in properties cover HTTP RFC safety, idempotency,
//! and response consistency; custom properties express business rules. All
//! properties share one interface, so the engine only needs `check`.
//!
//! Properties that need differential evidence may re-enter the service
//! client (extra probe requests) or the state sampler (snapshots before and
//! after a probe); capability composition is by convention, not by type.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod consistency;
pub mod custom;
pub mod idempotency;
pub mod safety;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::cancel::CancelToken;
use crate::core::catalog::Catalog;
use crate::core::message::Request;
use crate::core::message::Response;
use crate::interfaces::ServiceClient;
use crate::interfaces::StateSource;
use crate::interfaces::StateSourceError;
use crate::interfaces::TransportError;
use crate::runtime::sampler::SamplerError;
use crate::runtime::sampler::StateSampler;
use crate::runtime::sampler::StateSnapshot;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use consistency::HeadGetConsistencyProperty;
pub use consistency::MethodNotAllowedAllowProperty;
pub use consistency::OptionsAllowProperty;
pub use consistency::parse_allow_header;
pub use custom::CustomProperty;
pub use custom::CustomPropertyBuilder;
pub use custom::CustomPropertyError;
pub use idempotency::DeleteIdempotencyProperty;
pub use idempotency::PutIdempotencyProperty;
pub use safety::GetSafetyProperty;
pub use safety::HeadSafetyProperty;
pub use safety::OptionsSafetyProperty;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors escaping a property check.
///
/// The engine converts these into failing results rather than terminating
/// the run.
#[derive(Debug, Error)]
pub enum PropertyError {
    /// Snapshot capture failed.
    #[error(transparent)]
    Sampler(#[from] SamplerError),
    /// A probe request failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// State source access failed.
    #[error(transparent)]
    State(#[from] StateSourceError),
    /// A business rule reported an error.
    #[error("business rule error: {0}")]
    Rule(String),
}

impl PropertyError {
    /// Returns true when the underlying cause was cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Sampler(SamplerError::Cancelled) | Self::Transport(TransportError::Cancelled)
        )
    }
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Outcome of one property check.
///
/// # Invariants
/// - `passed == false` implies `failure_reason` is set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyOutcome {
    /// Whether the property held (or was not applicable).
    pub passed: bool,
    /// Failure reason; set whenever `passed` is false.
    pub failure_reason: Option<String>,
    /// Supplementary diagnostics.
    pub details: Option<String>,
    /// Numeric metrics recorded during evaluation.
    pub metrics: BTreeMap<String, f64>,
}

impl PropertyOutcome {
    /// A passing outcome.
    #[must_use]
    pub fn pass() -> Self {
        Self {
            passed: true,
            ..Self::default()
        }
    }

    /// A skip: the property does not apply to this pair.
    #[must_use]
    pub fn not_applicable() -> Self {
        Self {
            passed: true,
            details: Some("N/A".to_string()),
            ..Self::default()
        }
    }

    /// A failing outcome.
    #[must_use]
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            failure_reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// A failing outcome with diagnostics.
    #[must_use]
    pub fn fail_with_details(reason: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            failure_reason: Some(reason.into()),
            details: Some(details.into()),
            ..Self::default()
        }
    }

    /// The uniform cancellation outcome.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::fail("cancelled")
    }

    /// Attaches a numeric metric.
    #[must_use]
    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Collaborators available to a property check.
pub struct PropertyContext<'a> {
    /// The probed request.
    pub request: &'a Request,
    /// The observed response.
    pub response: &'a Response,
    /// Client for extra probe requests.
    pub client: &'a dyn ServiceClient,
    /// Shared read-only state source.
    pub state: &'a dyn StateSource,
    /// Snapshot capture over the state source.
    pub sampler: &'a StateSampler,
    /// Endpoint catalog for declared-method lookups.
    pub catalog: &'a Catalog,
    /// Cancellation token.
    pub cancel: &'a CancelToken,
}

// ============================================================================
// SECTION: Property Trait
// ============================================================================

/// Classification of a property for exclusion filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyCategory {
    /// Safe-method properties (GET/HEAD/OPTIONS).
    Safety,
    /// Idempotent-method properties (PUT/DELETE).
    Idempotency,
    /// Response consistency properties.
    ResponseConsistency,
    /// User-defined business rules.
    Custom,
}

/// A conformance property with a stable identity.
pub trait Property: Send + Sync {
    /// Stable property name, preserved verbatim in reports.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// RFC citation; empty for business rules.
    fn rfc_reference(&self) -> &str;

    /// Category used by exclusion filters.
    fn category(&self) -> PropertyCategory;

    /// Evaluates the property against one pair.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] on collaborator failure; the engine records
    /// it as a failing result.
    fn check(&self, ctx: &PropertyContext<'_>) -> Result<PropertyOutcome, PropertyError>;
}

// ============================================================================
// SECTION: Differential Helpers
// ============================================================================

/// Examines a capture pair for sampling gaps and state drift.
///
/// A kind that failed in both captures makes the comparison meaningless, so
/// the property fails with "sampling unavailable" rather than passing on
/// missing evidence. Otherwise any diff produces a failure carrying the
/// change summary.
pub(crate) fn drift_failure(
    before: &StateSnapshot,
    after: &StateSnapshot,
    reason: &str,
) -> Option<PropertyOutcome> {
    let unavailable: BTreeSet<_> =
        before.failed_kinds.intersection(&after.failed_kinds).collect();
    if !unavailable.is_empty() {
        let kinds =
            unavailable.iter().map(|kind| kind.as_str()).collect::<Vec<_>>().join(", ");
        return Some(PropertyOutcome::fail_with_details(
            "sampling unavailable",
            format!("kinds failing in both captures: {kinds}"),
        ));
    }
    let diff = before.diff(after);
    if diff.has_changes() {
        return Some(PropertyOutcome::fail_with_details(reason, diff.summary()));
    }
    None
}
