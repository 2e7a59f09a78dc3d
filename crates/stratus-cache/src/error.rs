//! Cache error types.

use stratus_core::{SelectorError, WorkloadKey};
use thiserror::Error;

/// Result type alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Recoverable errors the cache surfaces to callers.
///
/// Corruption of the cache itself (node accounting that no longer matches
/// confirmed state) is not represented here; it panics, because scheduling
/// decisions taken on top of corrupt accounting cannot be trusted.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("workload {0} is already in the cache and cannot be assumed")]
    AlreadyAssumed(WorkloadKey),

    #[error("workload {0} is not assumed and cannot be forgotten")]
    NotAssumed(WorkloadKey),

    #[error("workload {0} is already in added state")]
    AlreadyAdded(WorkloadKey),

    #[error("workload {0} is not in the cache")]
    NotAdded(WorkloadKey),

    #[error("workload {key} was assumed on {assumed_node} but submitted for {submitted_node}")]
    NodeMismatch {
        key: WorkloadKey,
        assumed_node: String,
        submitted_node: String,
    },

    #[error("node {0} is not tracked by the cache")]
    UnknownNode(String),

    #[error("workload {workload} is not accounted to node {node}")]
    WorkloadNotFound { workload: WorkloadKey, node: String },

    #[error("invalid disruption-budget selector: {0}")]
    Selector(#[from] SelectorError),
}
