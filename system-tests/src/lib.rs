// system-tests/src/lib.rs
// ============================================================================
// Module: System Tests
// Description: Test-only crate hosting end-to-end conformance scenarios.
// Purpose: Anchor the integration suites under tests/.
// Dependencies: api-probe-core, api-probe-providers
// ============================================================================

//! ## Overview
//! End-to-end scenario suites live under `tests/`; this library is
//! intentionally empty.
