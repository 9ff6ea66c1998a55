// api-probe-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory State Source
// Description: Simple in-memory state source for tests and embedding.
// Purpose: Provide a deterministic source implementation without external deps.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! This module provides a simple in-memory implementation of [`StateSource`]
//! for tests and local demos. Rows are kept in key order, so listings and
//! checksums are stable. It is not intended for production use; real
//! deployments implement [`StateSource`] against their own store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use serde_json::Value;

use crate::core::identifiers::EntityKind;
use crate::interfaces::EntityKindDescriptor;
use crate::interfaces::StateSource;
use crate::interfaces::StateSourceError;

// ============================================================================
// SECTION: Table Data
// ============================================================================

/// One in-memory collection.
#[derive(Debug, Clone, Default)]
struct Table {
    /// Primary key field name.
    key_field: String,
    /// Rows ordered by key.
    rows: BTreeMap<String, Value>,
}

// ============================================================================
// SECTION: In-Memory Source
// ============================================================================

/// In-memory state source for tests and examples.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateSource {
    /// Tables by kind name, protected by a mutex.
    tables: Arc<Mutex<BTreeMap<String, Table>>>,
}

impl InMemoryStateSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity kind with its key field.
    pub fn define_kind(&self, kind: impl Into<String>, key_field: impl Into<String>) {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables.entry(kind.into()).or_insert_with(|| Table {
            key_field: key_field.into(),
            rows: BTreeMap::new(),
        });
    }

    /// Inserts or replaces a row.
    pub fn put_row(&self, kind: &str, key: impl Into<String>, row: Value) {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables.entry(kind.to_string()).or_default().rows.insert(key.into(), row);
    }

    /// Removes a row, returning whether it existed.
    pub fn remove_row(&self, kind: &str, key: &str) -> bool {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables.get_mut(kind).is_some_and(|table| table.rows.remove(key).is_some())
    }

    /// Returns the current row count for a kind.
    #[must_use]
    pub fn row_count(&self, kind: &str) -> u64 {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables.get(kind).map_or(0, |table| table.rows.len() as u64)
    }
}

impl StateSource for InMemoryStateSource {
    fn entity_kinds(&self) -> Result<Vec<EntityKindDescriptor>, StateSourceError> {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(tables
            .iter()
            .map(|(name, table)| EntityKindDescriptor {
                name: EntityKind::new(name.clone()),
                key_field: table.key_field.clone(),
                type_name: None,
            })
            .collect())
    }

    fn count(&self, kind: &EntityKind) -> Result<u64, StateSourceError> {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables
            .get(kind.as_str())
            .map(|table| table.rows.len() as u64)
            .ok_or_else(|| StateSourceError::UnknownKind(kind.to_string()))
    }

    fn list_all(&self, kind: &EntityKind) -> Result<Vec<Value>, StateSourceError> {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables
            .get(kind.as_str())
            .map(|table| table.rows.values().cloned().collect())
            .ok_or_else(|| StateSourceError::UnknownKind(kind.to_string()))
    }

    fn random_key(&self, kind: &EntityKind) -> Result<Option<Value>, StateSourceError> {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let table = tables
            .get(kind.as_str())
            .ok_or_else(|| StateSourceError::UnknownKind(kind.to_string()))?;
        // First key in stable order keeps seeded synthesis replayable.
        Ok(table.rows.keys().next().cloned().map(Value::String))
    }
}
