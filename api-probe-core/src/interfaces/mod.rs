// api-probe-core/src/interfaces/mod.rs
// ============================================================================
// Module: API Probe Interfaces
// Description: Backend-agnostic interfaces for transport and state access.
// Purpose: Define the contract surfaces the conformance engine drives.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the engine reaches the service under test and its
//! backing store without embedding a client or a database driver. The engine
//! shares both collaborators read-only across properties; implementations
//! must keep read operations concurrency-safe.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::cancel::CancelToken;
use crate::core::identifiers::EntityKind;
use crate::core::message::Request;
use crate::core::message::Response;

// ============================================================================
// SECTION: Service Client
// ============================================================================

/// Transport errors for request delivery.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be assembled for the wire.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The send failed or the response could not be read.
    #[error("transport error: {0}")]
    Send(String),
    /// The operation observed cancellation.
    #[error("cancelled")]
    Cancelled,
}

/// Client for the service under test.
///
/// Implementations take a borrowed view of the request; bodies are owned
/// byte buffers, so the same request value can be sent repeatedly.
pub trait ServiceClient: Send + Sync {
    /// Sends a request and returns the observed response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the request cannot be delivered.
    fn send(&self, request: &Request, cancel: &CancelToken) -> Result<Response, TransportError>;
}

// ============================================================================
// SECTION: State Source
// ============================================================================

/// Descriptor for one entity kind in the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityKindDescriptor {
    /// Kind name, e.g. `Users`.
    pub name: EntityKind,
    /// Name of the primary key field.
    pub key_field: String,
    /// Opaque backing-type identifier, when the store exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

/// State source errors.
#[derive(Debug, Error)]
pub enum StateSourceError {
    /// The named kind is not known to the source.
    #[error("unknown entity kind: {0}")]
    UnknownKind(String),
    /// The source reported an error.
    #[error("state source error: {0}")]
    Source(String),
}

/// Read-only handle onto the persistent store backing the service.
///
/// Records returned by [`StateSource::list_all`] must use a canonical JSON
/// shape (camelCase field names) and a stable ordering by key, so that
/// checksums over two quiescent captures agree.
pub trait StateSource: Send + Sync {
    /// Enumerates the entity kinds the store exposes.
    ///
    /// # Errors
    ///
    /// Returns [`StateSourceError`] when enumeration fails.
    fn entity_kinds(&self) -> Result<Vec<EntityKindDescriptor>, StateSourceError>;

    /// Counts rows for a kind.
    ///
    /// # Errors
    ///
    /// Returns [`StateSourceError`] when the kind is unknown or the count
    /// query fails.
    fn count(&self, kind: &EntityKind) -> Result<u64, StateSourceError>;

    /// Materializes all rows for a kind, ordered stably by key.
    ///
    /// # Errors
    ///
    /// Returns [`StateSourceError`] when the kind is unknown or the query
    /// fails.
    fn list_all(&self, kind: &EntityKind) -> Result<Vec<Value>, StateSourceError>;

    /// Returns a live key for a kind, when one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StateSourceError`] when the kind is unknown or the query
    /// fails.
    fn random_key(&self, kind: &EntityKind) -> Result<Option<Value>, StateSourceError>;
}
