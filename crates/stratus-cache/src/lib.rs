//! stratus-cache — the scheduler-side cluster state cache.
//!
//! An in-memory projection of cluster state (nodes, workloads, disruption
//! budgets) the stratus scheduler consults while deciding placement. The
//! scheduler commits decisions here optimistically ("assume") before the
//! control plane confirms them, so pipelined decisions never double-book
//! a node; a background reaper bounds the cost of confirmations that
//! never arrive.
//!
//! # Architecture
//!
//! ```text
//! Cache (one mutex over everything)
//!   ├── nodes: name → NodeInfo (workloads, resource sums, generation)
//!   ├── workload states: key → cached object + expiry bookkeeping
//!   ├── assumed set: keys awaiting authoritative confirmation
//!   ├── budgets: id → DisruptionBudget
//!   └── reaper task (1s period, bound to a shutdown signal)
//! ```
//!
//! The scheduling hot path never touches the mutex directly; it works on
//! clones maintained through [`Cache::update_node_info_map`], which
//! re-clones only nodes whose generation moved.

pub mod cache;
pub mod error;
pub mod node_info;
mod resize;

pub use cache::{Cache, CacheConfig, Snapshot};
pub use error::{CacheError, CacheResult};
pub use node_info::{
    NodeInfo, Resource, TransientInfo, DEFAULT_MEMORY_REQUEST, DEFAULT_MILLI_CPU_REQUEST,
};
