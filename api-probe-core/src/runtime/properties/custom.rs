// api-probe-core/src/runtime/properties/custom.rs
// ============================================================================
// Module: Custom Business Rules
// Description: User-defined properties assembled through a builder.
// Purpose: Express service-specific invariants with the built-in interface.
// Dependencies: crate::{core, interfaces, runtime::properties}
// ============================================================================

//! ## Overview
//! A business rule scopes itself with endpoint glob patterns, a method set,
//! and request predicates; when all gates pass, a mandatory assertion over
//! (request, response, state source) decides the outcome. Rules share the
//! [`Property`] interface with built-ins, so the engine treats them alike.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use crate::core::message::Request;
use crate::core::message::Response;
use crate::core::method::Method;
use crate::core::pattern::EndpointPattern;
use crate::core::pattern::PatternError;
use crate::interfaces::StateSource;
use crate::runtime::properties::Property;
use crate::runtime::properties::PropertyCategory;
use crate::runtime::properties::PropertyContext;
use crate::runtime::properties::PropertyError;
use crate::runtime::properties::PropertyOutcome;

// ============================================================================
// SECTION: Closure Aliases
// ============================================================================

/// Request predicate gating rule applicability.
type RulePredicate = Box<dyn Fn(&Request) -> bool + Send + Sync>;

/// Rule assertion deciding the outcome.
type RuleAssertion =
    Box<dyn Fn(&Request, &Response, &dyn StateSource) -> Result<bool, PropertyError> + Send + Sync>;

// ============================================================================
// SECTION: Custom Property
// ============================================================================

/// Immutable user-defined property.
pub struct CustomProperty {
    /// Rule name, preserved verbatim in reports.
    name: String,
    /// Rule rationale; doubles as description and failure reason.
    reason: String,
    /// Endpoint scope; empty applies to all paths.
    patterns: Vec<EndpointPattern>,
    /// Method scope; empty applies to all methods.
    methods: BTreeSet<Method>,
    /// Applicability predicates; all must hold.
    predicates: Vec<RulePredicate>,
    /// Mandatory assertion.
    assertion: RuleAssertion,
}

impl fmt::Debug for CustomProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomProperty")
            .field("name", &self.name)
            .field("reason", &self.reason)
            .field("patterns", &self.patterns)
            .field("methods", &self.methods)
            .field("predicates", &self.predicates.len())
            .finish_non_exhaustive()
    }
}

impl CustomProperty {
    /// Starts building a rule.
    #[must_use]
    pub fn builder(name: impl Into<String>, reason: impl Into<String>) -> CustomPropertyBuilder {
        CustomPropertyBuilder::new(name, reason)
    }

    /// Returns true when the rule applies to the request.
    fn applies_to(&self, request: &Request) -> bool {
        if !self.methods.is_empty() && !self.methods.contains(&request.method) {
            return false;
        }
        if !self.patterns.is_empty()
            && !self.patterns.iter().any(|pattern| pattern.matches(&request.path))
        {
            return false;
        }
        self.predicates.iter().all(|predicate| predicate(request))
    }
}

impl Property for CustomProperty {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.reason
    }

    fn rfc_reference(&self) -> &str {
        ""
    }

    fn category(&self) -> PropertyCategory {
        PropertyCategory::Custom
    }

    fn check(&self, ctx: &PropertyContext<'_>) -> Result<PropertyOutcome, PropertyError> {
        if !self.applies_to(ctx.request) {
            return Ok(PropertyOutcome::not_applicable());
        }
        if ctx.cancel.is_cancelled() {
            return Ok(PropertyOutcome::cancelled());
        }
        match (self.assertion)(ctx.request, ctx.response, ctx.state) {
            Ok(true) => Ok(PropertyOutcome::pass()),
            Ok(false) => Ok(PropertyOutcome::fail(self.reason.clone())),
            Err(err) if err.is_cancelled() => Ok(PropertyOutcome::cancelled()),
            Err(err) => Ok(PropertyOutcome::fail_with_details(
                self.reason.clone(),
                format!("rule error: {err}"),
            )),
        }
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder errors for custom properties.
#[derive(Debug, thiserror::Error)]
pub enum CustomPropertyError {
    /// The rule has no assertion.
    #[error("business rule {0} has no assertion")]
    MissingAssertion(String),
    /// An endpoint pattern failed to compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Builder for [`CustomProperty`].
pub struct CustomPropertyBuilder {
    name: String,
    reason: String,
    patterns: Vec<String>,
    methods: BTreeSet<Method>,
    predicates: Vec<RulePredicate>,
    assertion: Option<RuleAssertion>,
}

impl CustomPropertyBuilder {
    /// Creates a builder with the mandatory name and reason.
    #[must_use]
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
            patterns: Vec::new(),
            methods: BTreeSet::new(),
            predicates: Vec::new(),
            assertion: None,
        }
    }

    /// Scopes the rule to endpoint glob patterns.
    #[must_use]
    pub fn for_endpoints<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Scopes the rule to specific methods.
    #[must_use]
    pub fn for_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods.extend(methods);
        self
    }

    /// Adds an applicability predicate; all predicates must hold.
    #[must_use]
    pub fn when(mut self, predicate: impl Fn(&Request) -> bool + Send + Sync + 'static) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// Sets the mandatory assertion.
    #[must_use]
    pub fn assert(
        mut self,
        assertion: impl Fn(&Request, &Response, &dyn StateSource) -> Result<bool, PropertyError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.assertion = Some(Box::new(assertion));
        self
    }

    /// Finalizes the rule.
    ///
    /// # Errors
    ///
    /// Returns [`CustomPropertyError`] when the assertion is missing or a
    /// pattern fails to compile.
    pub fn build(self) -> Result<CustomProperty, CustomPropertyError> {
        let assertion = self
            .assertion
            .ok_or_else(|| CustomPropertyError::MissingAssertion(self.name.clone()))?;
        let patterns = self
            .patterns
            .iter()
            .map(|pattern| EndpointPattern::compile(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CustomProperty {
            name: self.name,
            reason: self.reason,
            patterns,
            methods: self.methods,
            predicates: self.predicates,
            assertion,
        })
    }
}
