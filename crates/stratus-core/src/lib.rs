//! stratus-core — domain types for the stratus workload orchestrator.
//!
//! These types are the shared vocabulary between the control plane, the
//! scheduler, and the scheduler cache: workloads (the schedulable unit),
//! node descriptors, disruption budgets, resource quantities, and label
//! selectors. All of them are plain serializable values; ownership of a
//! `Workload` or `Node` means owning an independent copy.

pub mod budget;
pub mod labels;
pub mod node;
pub mod resource;
pub mod workload;

pub use budget::DisruptionBudget;
pub use labels::{LabelSelector, Labels, Selector, SelectorError, SelectorOperator, SelectorRequirement};
pub use node::Node;
pub use resource::{ResourceKind, ResourceList};
pub use workload::*;
