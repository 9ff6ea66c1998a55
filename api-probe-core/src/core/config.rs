// api-probe-core/src/core/config.rs
// ============================================================================
// Module: Probe Configuration
// Description: Build-time configuration for sampling and orchestration.
// Purpose: Provide a single validated configuration value with hard limits.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! All knobs (parallelism, timeouts, tracked-entity sets, endpoint filters)
//! travel in one configuration value supplied at build time. There is no
//! process-wide mutable state. Validation fails closed on out-of-range
//! values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default per-sample query timeout.
pub(crate) const DEFAULT_SAMPLE_TIMEOUT: Duration = Duration::from_secs(30);
/// Maximum accepted per-sample query timeout.
pub(crate) const MAX_SAMPLE_TIMEOUT: Duration = Duration::from_secs(600);
/// Maximum accepted sampler parallelism.
pub(crate) const MAX_PARALLELISM: usize = 256;
/// Maximum accepted endpoint-level parallelism.
pub(crate) const MAX_ENDPOINT_PARALLELISM: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Parallelism must be at least one worker.
    #[error("max_parallelism must be at least 1")]
    ZeroParallelism,
    /// Parallelism exceeds the accepted ceiling.
    #[error("max_parallelism {0} exceeds limit {MAX_PARALLELISM}")]
    ParallelismTooLarge(usize),
    /// Endpoint parallelism exceeds the accepted ceiling.
    #[error("max_parallel_endpoints {0} exceeds limit {MAX_ENDPOINT_PARALLELISM}")]
    EndpointParallelismTooLarge(usize),
    /// The per-sample timeout is zero.
    #[error("sample_timeout must be non-zero")]
    ZeroSampleTimeout,
    /// The per-sample timeout exceeds the accepted ceiling.
    #[error("sample_timeout {0:?} exceeds limit {MAX_SAMPLE_TIMEOUT:?}")]
    SampleTimeoutTooLarge(Duration),
}

// ============================================================================
// SECTION: State Tracking
// ============================================================================

/// State tracking configuration for the sampler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTrackingConfig {
    /// Sample per-kind row counts.
    pub track_entity_counts: bool,
    /// Sample per-kind content checksums. Expensive: materializes all rows.
    pub track_entity_checksums: bool,
    /// When non-empty, only these kinds are tracked; wins over `exclude`.
    pub include_only: BTreeSet<String>,
    /// Kinds excluded from tracking.
    pub exclude: BTreeSet<String>,
    /// Maximum kinds sampled concurrently.
    pub max_parallelism: usize,
    /// Per-sample query timeout.
    pub sample_timeout: Duration,
}

impl Default for StateTrackingConfig {
    fn default() -> Self {
        Self {
            track_entity_counts: true,
            track_entity_checksums: false,
            include_only: BTreeSet::new(),
            exclude: BTreeSet::new(),
            max_parallelism: thread::available_parallelism().map_or(1, NonZeroUsize::get),
            sample_timeout: DEFAULT_SAMPLE_TIMEOUT,
        }
    }
}

impl StateTrackingConfig {
    /// Returns true when the named kind should be tracked.
    #[must_use]
    pub fn tracks(&self, kind: &str) -> bool {
        if !self.include_only.is_empty() {
            return self.include_only.contains(kind);
        }
        !self.exclude.contains(kind)
    }

    /// Validates ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parallelism == 0 {
            return Err(ConfigError::ZeroParallelism);
        }
        if self.max_parallelism > MAX_PARALLELISM {
            return Err(ConfigError::ParallelismTooLarge(self.max_parallelism));
        }
        if self.sample_timeout.is_zero() {
            return Err(ConfigError::ZeroSampleTimeout);
        }
        if self.sample_timeout > MAX_SAMPLE_TIMEOUT {
            return Err(ConfigError::SampleTimeoutTooLarge(self.sample_timeout));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Probe Configuration
// ============================================================================

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// State tracking configuration.
    pub state_tracking: StateTrackingConfig,
    /// Run distinct endpoints in parallel. Per-endpoint concurrency stays 1.
    pub parallel_endpoints: bool,
    /// Worker count when endpoint parallelism is enabled.
    pub max_parallel_endpoints: usize,
    /// Seed for the request synthesizer.
    pub seed: u64,
    /// Report title.
    pub title: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            state_tracking: StateTrackingConfig::default(),
            parallel_endpoints: false,
            max_parallel_endpoints: thread::available_parallelism().map_or(1, NonZeroUsize::get),
            seed: 0,
            title: "API Conformance Report".to_string(),
        }
    }
}

impl ProbeConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.state_tracking.validate()?;
        if self.max_parallel_endpoints == 0 {
            return Err(ConfigError::ZeroParallelism);
        }
        if self.max_parallel_endpoints > MAX_ENDPOINT_PARALLELISM {
            return Err(ConfigError::EndpointParallelismTooLarge(self.max_parallel_endpoints));
        }
        Ok(())
    }
}
