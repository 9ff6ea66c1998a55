// api-probe-core/src/runtime/builder.rs
// ============================================================================
// Module: Probe Builder
// Description: Programmatic assembly of a configured tester.
// Purpose: Validate collaborators, filters, and property selection up front.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The builder is the single programmatic entry point: it takes the parsed
//! OpenAPI document, the two collaborators, configuration, endpoint filters,
//! and property exclusions, and produces an immutable [`Tester`]. Programmer
//! misuse (a missing collaborator, an invalid pattern, an assertion-less
//! business rule) surfaces as a [`BuildError`] at build time, never as a
//! panic mid-run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::TypeId;
use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::core::cancel::CancelToken;
use crate::core::catalog::Catalog;
use crate::core::config::ConfigError;
use crate::core::config::ProbeConfig;
use crate::core::config::StateTrackingConfig;
use crate::core::endpoint::Endpoint;
use crate::core::message::Request;
use crate::core::pattern::EndpointPattern;
use crate::core::pattern::PatternError;
use crate::core::report::ConformanceReport;
use crate::core::report::RequestReport;
use crate::interfaces::ServiceClient;
use crate::interfaces::StateSource;
use crate::runtime::orchestrator::Orchestrator;
use crate::runtime::properties::CustomProperty;
use crate::runtime::properties::CustomPropertyBuilder;
use crate::runtime::properties::DeleteIdempotencyProperty;
use crate::runtime::properties::GetSafetyProperty;
use crate::runtime::properties::HeadGetConsistencyProperty;
use crate::runtime::properties::HeadSafetyProperty;
use crate::runtime::properties::MethodNotAllowedAllowProperty;
use crate::runtime::properties::OptionsAllowProperty;
use crate::runtime::properties::OptionsSafetyProperty;
use crate::runtime::properties::Property;
use crate::runtime::properties::PropertyCategory;
use crate::runtime::properties::CustomPropertyError;
use crate::runtime::properties::PutIdempotencyProperty;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Build-time errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No OpenAPI document was supplied.
    #[error("no openapi document configured")]
    MissingOpenApi,
    /// No service client was supplied.
    #[error("no service client configured")]
    MissingServiceClient,
    /// No state source was supplied.
    #[error("no state source configured")]
    MissingStateSource,
    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// An endpoint filter failed to compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),
    /// A business rule failed to finalize.
    #[error(transparent)]
    Rule(#[from] CustomPropertyError),
    /// The build observed cancellation.
    #[error("cancelled")]
    Cancelled,
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Programmatic builder for a configured [`Tester`].
#[derive(Default)]
pub struct ProbeBuilder {
    /// Parsed OpenAPI document.
    openapi: Option<Value>,
    /// Client for the service under test.
    client: Option<Arc<dyn ServiceClient>>,
    /// Read-only state source.
    state: Option<Arc<dyn StateSource>>,
    /// Engine configuration.
    config: ProbeConfig,
    /// Include-only endpoint globs.
    include_patterns: Vec<String>,
    /// Exclusion endpoint globs.
    exclude_patterns: Vec<String>,
    /// Finalized business rules.
    custom: Vec<CustomProperty>,
    /// Deferred business-rule builders, finalized at build time.
    pending_rules: Vec<CustomPropertyBuilder>,
    /// Built-in property types excluded by the operator.
    excluded_types: BTreeSet<TypeId>,
    /// Property categories excluded by the operator.
    excluded_categories: BTreeSet<PropertyCategory>,
}

impl ProbeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies the parsed OpenAPI document.
    #[must_use]
    pub fn with_openapi(mut self, document: Value) -> Self {
        self.openapi = Some(document);
        self
    }

    /// Supplies the service client.
    #[must_use]
    pub fn with_service_client(mut self, client: impl ServiceClient + 'static) -> Self {
        self.client = Some(Arc::new(client));
        self
    }

    /// Supplies the state source.
    #[must_use]
    pub fn with_state_source(mut self, state: impl StateSource + 'static) -> Self {
        self.state = Some(Arc::new(state));
        self
    }

    /// Replaces the engine configuration wholesale.
    #[must_use]
    pub fn with_config(mut self, config: ProbeConfig) -> Self {
        self.config = config;
        self
    }

    /// Configures state tracking.
    #[must_use]
    pub fn configure_state_tracking(mut self, tracking: StateTrackingConfig) -> Self {
        self.config.state_tracking = tracking;
        self
    }

    /// Sets the synthesizer seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Excludes endpoints matching any of the glob patterns.
    #[must_use]
    pub fn exclude_endpoints<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Restricts the run to endpoints matching any of the glob patterns.
    #[must_use]
    pub fn include_only_endpoints<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Registers a finalized business rule.
    #[must_use]
    pub fn add_custom_property(mut self, property: CustomProperty) -> Self {
        self.custom.push(property);
        self
    }

    /// Defines a business rule through its builder; finalized at build time.
    #[must_use]
    pub fn define_business_rule(
        mut self,
        name: impl Into<String>,
        reason: impl Into<String>,
        configure: impl FnOnce(CustomPropertyBuilder) -> CustomPropertyBuilder,
    ) -> Self {
        self.pending_rules.push(configure(CustomPropertyBuilder::new(name, reason)));
        self
    }

    /// Excludes one built-in property by type.
    #[must_use]
    pub fn exclude_built_in_property<T: Property + 'static>(mut self) -> Self {
        self.excluded_types.insert(TypeId::of::<T>());
        self
    }

    /// Excludes all safety properties.
    #[must_use]
    pub fn exclude_all_safety_properties(mut self) -> Self {
        self.excluded_categories.insert(PropertyCategory::Safety);
        self
    }

    /// Excludes all idempotency properties.
    #[must_use]
    pub fn exclude_all_idempotency_properties(mut self) -> Self {
        self.excluded_categories.insert(PropertyCategory::Idempotency);
        self
    }

    /// Excludes all response consistency properties.
    #[must_use]
    pub fn exclude_all_response_consistency_properties(mut self) -> Self {
        self.excluded_categories.insert(PropertyCategory::ResponseConsistency);
        self
    }

    /// Validates everything and assembles the tester.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] on missing collaborators, invalid
    /// configuration, bad filter patterns, or unfinished business rules.
    pub fn build(self, cancel: &CancelToken) -> Result<Tester, BuildError> {
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }
        let document = self.openapi.ok_or(BuildError::MissingOpenApi)?;
        let client = self.client.ok_or(BuildError::MissingServiceClient)?;
        let state = self.state.ok_or(BuildError::MissingStateSource)?;
        self.config.validate()?;

        let include_patterns = compile_patterns(&self.include_patterns)?;
        let exclude_patterns = compile_patterns(&self.exclude_patterns)?;

        let mut properties: Vec<(TypeId, Arc<dyn Property>)> = Vec::new();
        register_built_in(&mut properties, GetSafetyProperty);
        register_built_in(&mut properties, HeadSafetyProperty);
        register_built_in(&mut properties, OptionsSafetyProperty);
        register_built_in(&mut properties, PutIdempotencyProperty);
        register_built_in(&mut properties, DeleteIdempotencyProperty);
        register_built_in(&mut properties, HeadGetConsistencyProperty);
        register_built_in(&mut properties, OptionsAllowProperty);
        register_built_in(&mut properties, MethodNotAllowedAllowProperty);

        let mut selected: Vec<Arc<dyn Property>> = properties
            .into_iter()
            .filter(|(type_id, property)| {
                !self.excluded_types.contains(type_id)
                    && !self.excluded_categories.contains(&property.category())
            })
            .map(|(_, property)| property)
            .collect();
        for property in self.custom {
            selected.push(Arc::new(property));
        }
        for pending in self.pending_rules {
            selected.push(Arc::new(pending.build()?));
        }

        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }
        let catalog = Arc::new(Catalog::load(&document));
        let title = self.config.title.clone();
        let orchestrator = Orchestrator::new(
            catalog,
            client,
            state,
            selected,
            include_patterns,
            exclude_patterns,
            self.config,
        );
        Ok(Tester {
            orchestrator,
            title,
        })
    }
}

/// Compiles glob patterns, failing the build on the first bad one.
fn compile_patterns(patterns: &[String]) -> Result<Vec<EndpointPattern>, PatternError> {
    patterns.iter().map(|pattern| EndpointPattern::compile(pattern)).collect()
}

/// Registers a built-in property with its type identity.
fn register_built_in<T: Property + 'static>(
    properties: &mut Vec<(TypeId, Arc<dyn Property>)>,
    property: T,
) {
    properties.push((TypeId::of::<T>(), Arc::new(property)));
}

// ============================================================================
// SECTION: Tester
// ============================================================================

/// Configured, immutable conformance tester.
pub struct Tester {
    /// Assembled orchestrator.
    orchestrator: Orchestrator,
    /// Report title.
    title: String,
}

impl std::fmt::Debug for Tester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tester")
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

impl Tester {
    /// Probes every selected endpoint with up to `max_per_endpoint` requests.
    #[must_use]
    pub fn run_all(&self, max_per_endpoint: usize, cancel: &CancelToken) -> Vec<RequestReport> {
        self.orchestrator.run_all(max_per_endpoint, cancel)
    }

    /// Probes one concrete request.
    #[must_use]
    pub fn check_request(&self, request: &Request, cancel: &CancelToken) -> RequestReport {
        self.orchestrator.probe(request, cancel)
    }

    /// Returns the loaded endpoints.
    #[must_use]
    pub fn endpoints(&self) -> &[Endpoint] {
        self.orchestrator.catalog().all()
    }

    /// Returns the registered properties in evaluation order.
    pub fn properties(&self) -> impl Iterator<Item = &dyn Property> {
        self.orchestrator.properties().iter().map(|property| property.as_ref())
    }

    /// Builds the run-level report for collected results.
    #[must_use]
    pub fn report(&self, results: Vec<RequestReport>) -> ConformanceReport {
        ConformanceReport::from_results(self.title.clone(), results)
    }
}
