// crates/rule-store-core/src/telemetry.rs
// ============================================================================
// Module: Rule Store Telemetry
// Description: Observability hooks for rule store operations.
// Purpose: Provide operation events and latency buckets without hard deps.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module exposes a thin metrics interface for rule store operations.
//! It stays dependency-light so deployments can plug in Prometheus or
//! OpenTelemetry without redesign. Events carry counts and labels only, never
//! rule field values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default latency buckets in milliseconds for rule store histograms.
pub const STORE_LATENCY_BUCKETS_MS: &[u64] =
    &[1, 2, 5, 10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000];

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// Rule store operation classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StoreOperation {
    /// Connection and schema creation.
    Open,
    /// Full rule load.
    LoadPolicy,
    /// Full rule replace.
    SavePolicy,
    /// Single rule insert.
    AddPolicy,
    /// Exact rule removal.
    RemovePolicy,
    /// Filtered rule removal.
    RemoveFilteredPolicy,
    /// Readiness probe.
    Readiness,
    /// Connection release.
    Close,
}

impl StoreOperation {
    /// Returns a stable label for the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::LoadPolicy => "load_policy",
            Self::SavePolicy => "save_policy",
            Self::AddPolicy => "add_policy",
            Self::RemovePolicy => "remove_policy",
            Self::RemoveFilteredPolicy => "remove_filtered_policy",
            Self::Readiness => "readiness",
            Self::Close => "close",
        }
    }
}

/// Rule store operation outcome classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StoreOutcome {
    /// Successful operation.
    Ok,
    /// Failed operation.
    Error,
}

impl StoreOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Rule store metric event payload.
///
/// # Invariants
/// - `error_kind` is `Some` exactly when `outcome` is [`StoreOutcome::Error`].
/// - `rows` counts rows forwarded (loads) or affected (writes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreMetricEvent {
    /// Operation performed.
    pub operation: StoreOperation,
    /// Operation outcome.
    pub outcome: StoreOutcome,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Rows loaded or affected.
    pub rows: u64,
    /// Wall-clock duration of the operation.
    pub latency: Duration,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for rule store operations.
pub trait StoreMetrics: Send + Sync {
    /// Records one completed operation.
    fn record_operation(&self, event: StoreMetricEvent);
}

/// No-op metrics sink.
///
/// # Invariants
/// - Metrics are intentionally discarded.
pub struct NoopMetrics;

impl StoreMetrics for NoopMetrics {
    fn record_operation(&self, _event: StoreMetricEvent) {}
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the upper bound of the latency bucket for `latency`.
///
/// Latencies past the last bucket map to `u64::MAX`.
#[must_use]
pub fn latency_bucket_ms(latency: Duration) -> u64 {
    let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
    STORE_LATENCY_BUCKETS_MS.iter().copied().find(|bound| millis <= *bound).unwrap_or(u64::MAX)
}
