// api-probe-core/src/core/cancel.rs
// ============================================================================
// Module: Cooperative Cancellation
// Description: Shared cancellation flag threaded through the engine.
// Purpose: Collapse unstarted work promptly when a run is cancelled.
// Dependencies: std
// ============================================================================

//! ## Overview
//! One cancellation token propagates from the top-level call through
//! synthesis, sends, sampling, and property checks. Cancellation is
//! cooperative: in-flight operations finish or fail, unstarted work is
//! skipped, and partial results are still returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

// ============================================================================
// SECTION: Cancel Token
// ============================================================================

/// Clonable cooperative cancellation token.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    /// Shared cancellation flag.
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a new, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation to every clone of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
