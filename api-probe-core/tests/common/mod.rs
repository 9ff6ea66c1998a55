// api-probe-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Helpers
// Description: Shared stubs and fixtures for api-probe-core tests.
// Purpose: Provide scripted collaborators and a sample OpenAPI document.
// Dependencies: api-probe-core, serde_json
// ============================================================================

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::PoisonError;

use api_probe_core::CancelToken;
use api_probe_core::EntityKind;
use api_probe_core::EntityKindDescriptor;
use api_probe_core::Request;
use api_probe_core::Response;
use api_probe_core::ServiceClient;
use api_probe_core::StateSource;
use api_probe_core::StateSourceError;
use api_probe_core::TransportError;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Sample OpenAPI Document
// ============================================================================

/// A small document covering collections, identifiers, and bodies.
pub fn sample_openapi() -> Value {
    json!({
        "openapi": "3.0.1",
        "info": { "title": "Sample", "version": "1.0" },
        "paths": {
            "/api/users": {
                "get": {
                    "parameters": [
                        {
                            "name": "limit",
                            "in": "query",
                            "schema": { "type": "integer", "minimum": 1, "maximum": 50 }
                        }
                    ],
                    "responses": { "200": {} }
                },
                "post": {
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/User" }
                            }
                        }
                    },
                    "responses": { "201": {} }
                },
                "options": { "responses": { "200": {} } }
            },
            "/api/users/{userId}": {
                "parameters": [
                    {
                        "name": "userId",
                        "in": "path",
                        "required": true,
                        "schema": { "type": "string" }
                    }
                ],
                "get": { "responses": { "200": {} } },
                "put": {
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/User" }
                            }
                        }
                    },
                    "responses": { "200": {} }
                },
                "delete": { "responses": { "204": {} } }
            },
            "/api/posts": {
                "head": { "responses": { "200": {} } },
                "get": { "responses": { "200": {} } }
            }
        },
        "components": {
            "schemas": {
                "User": {
                    "type": "object",
                    "required": ["name", "email"],
                    "properties": {
                        "name": { "type": "string", "minLength": 1, "maxLength": 30 },
                        "email": { "type": "string", "format": "email" },
                        "age": { "type": "integer", "minimum": 0, "maximum": 130 }
                    }
                }
            }
        }
    })
}

// ============================================================================
// SECTION: Scripted Service Client
// ============================================================================

/// Service client replaying scripted responses and recording requests.
#[derive(Debug, Default)]
pub struct StubClient {
    /// Scripted responses, consumed front to back.
    responses: Mutex<VecDeque<Response>>,
    /// Fallback response when the script runs dry.
    fallback: Option<Response>,
    /// Every request observed, in order.
    pub sent: Mutex<Vec<Request>>,
}

impl StubClient {
    /// Creates a client answering every request with the same response.
    pub fn always(response: Response) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: Some(response),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Creates a client replaying responses in order, then the last one.
    pub fn scripted(responses: Vec<Response>) -> Self {
        let fallback = responses.last().cloned();
        Self {
            responses: Mutex::new(responses.into()),
            fallback,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Returns how many requests were sent.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl ServiceClient for StubClient {
    fn send(&self, request: &Request, _cancel: &CancelToken) -> Result<Response, TransportError> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());
        let next = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .or_else(|| self.fallback.clone());
        next.ok_or_else(|| TransportError::Send("script exhausted".to_string()))
    }
}

/// Builds a plain response.
pub fn response(status: u16) -> Response {
    Response {
        status,
        headers: Vec::new(),
        body: Vec::new(),
        content_type: None,
    }
}

/// Builds a response with headers.
pub fn response_with_headers(status: u16, headers: &[(&str, &str)]) -> Response {
    Response {
        status,
        headers: headers
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect(),
        body: Vec::new(),
        content_type: None,
    }
}

/// Builds a bare request.
pub fn request(method: api_probe_core::Method, path: &str) -> Request {
    Request {
        method,
        path: path.to_string(),
        query: Vec::new(),
        headers: Vec::new(),
        body: None,
    }
}

// ============================================================================
// SECTION: Scripted State Source
// ============================================================================

/// State source replaying per-kind count sequences.
///
/// Each call to `count` pops the next scripted value; the last value repeats
/// once the sequence is exhausted. Kinds listed in `failing` error on every
/// access.
#[derive(Debug, Default)]
pub struct ScriptedStateSource {
    /// Count sequences by kind.
    counts: Mutex<BTreeMap<String, VecDeque<u64>>>,
    /// Rows by kind, served to checksum queries.
    rows: BTreeMap<String, Vec<Value>>,
    /// Kinds that fail on every access.
    failing: BTreeSet<String>,
}

impl ScriptedStateSource {
    /// Creates a source with constant counts.
    pub fn constant(counts: &[(&str, u64)]) -> Self {
        let mut map = BTreeMap::new();
        for (kind, count) in counts {
            map.insert((*kind).to_string(), VecDeque::from(vec![*count]));
        }
        Self {
            counts: Mutex::new(map),
            rows: BTreeMap::new(),
            failing: BTreeSet::new(),
        }
    }

    /// Creates a source replaying count sequences per kind.
    pub fn sequenced(sequences: &[(&str, &[u64])]) -> Self {
        let mut map = BTreeMap::new();
        for (kind, sequence) in sequences {
            map.insert((*kind).to_string(), sequence.iter().copied().collect());
        }
        Self {
            counts: Mutex::new(map),
            rows: BTreeMap::new(),
            failing: BTreeSet::new(),
        }
    }

    /// Marks a kind as permanently failing.
    pub fn with_failing(mut self, kind: &str) -> Self {
        self.failing.insert(kind.to_string());
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        counts.entry(kind.to_string()).or_default();
        drop(counts);
        self
    }

    /// Sets the rows served for a kind.
    pub fn with_rows(mut self, kind: &str, rows: Vec<Value>) -> Self {
        self.rows.insert(kind.to_string(), rows);
        self
    }
}

impl StateSource for ScriptedStateSource {
    fn entity_kinds(&self) -> Result<Vec<EntityKindDescriptor>, StateSourceError> {
        let counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(counts
            .keys()
            .map(|name| EntityKindDescriptor {
                name: EntityKind::new(name.clone()),
                key_field: "id".to_string(),
                type_name: None,
            })
            .collect())
    }

    fn count(&self, kind: &EntityKind) -> Result<u64, StateSourceError> {
        if self.failing.contains(kind.as_str()) {
            return Err(StateSourceError::Source(format!("{kind} is down")));
        }
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = counts
            .get_mut(kind.as_str())
            .ok_or_else(|| StateSourceError::UnknownKind(kind.to_string()))?;
        let value = if sequence.len() > 1 {
            sequence.pop_front().unwrap_or(0)
        } else {
            sequence.front().copied().unwrap_or(0)
        };
        Ok(value)
    }

    fn list_all(&self, kind: &EntityKind) -> Result<Vec<Value>, StateSourceError> {
        if self.failing.contains(kind.as_str()) {
            return Err(StateSourceError::Source(format!("{kind} is down")));
        }
        Ok(self.rows.get(kind.as_str()).cloned().unwrap_or_default())
    }

    fn random_key(&self, kind: &EntityKind) -> Result<Option<Value>, StateSourceError> {
        if self.failing.contains(kind.as_str()) {
            return Err(StateSourceError::Source(format!("{kind} is down")));
        }
        Ok(self
            .rows
            .get(kind.as_str())
            .and_then(|rows| rows.first())
            .and_then(|row| row.get("id"))
            .cloned())
    }
}
