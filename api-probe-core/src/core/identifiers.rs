// api-probe-core/src/core/identifiers.rs
// ============================================================================
// Module: API Probe Identifiers
// Description: Canonical opaque identifiers for entity kinds.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Entity kinds name collections in the backing store (for example "Users").
//! Identifiers are opaque and serialize as strings; validation happens at the
//! state-source boundary rather than within these simple wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Named collection in the backing persistent store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKind(String);

impl EntityKind {
    /// Creates a new entity kind identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for EntityKind {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityKind {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
