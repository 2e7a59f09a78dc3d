//! Workloads — the schedulable unit.
//!
//! A `Workload` is the cache's copy of the API object: identity, the node
//! it is (or will be) assigned to, per-container resource demands, and the
//! in-place resize bookkeeping the scheduler cache maintains.

use serde::{Deserialize, Serialize};

use crate::labels::Labels;
use crate::resource::ResourceList;

/// Stable identifier for a workload across its lifetime:
/// `{namespace}/{uid}`. Two objects with the same key refer to the same
/// workload.
pub type WorkloadKey = String;

/// The schedulable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    /// Unique identity assigned by the control plane.
    pub uid: String,
    pub namespace: String,
    pub name: String,
    /// The node this workload is assigned to; empty while unscheduled.
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub labels: Labels,
    pub phase: WorkloadPhase,
    pub containers: Vec<Container>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Opaque version stamped by the control plane on every write.
    #[serde(default)]
    pub resource_version: String,
    /// Set when deletion has been requested; the workload is winding down.
    #[serde(default)]
    pub deletion_timestamp: Option<u64>,
    #[serde(default)]
    pub resize_policy: ResizePolicy,
    /// In-place resize request and bookkeeping; absent for most workloads.
    #[serde(default)]
    pub resize: Option<ResizeSpec>,
}

impl Workload {
    /// The stable cache key for this workload.
    pub fn key(&self) -> WorkloadKey {
        format!("{}/{}", self.namespace, self.uid)
    }
}

/// One container of a workload, with its declared resource demands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub requests: ResourceList,
    #[serde(default)]
    pub limits: ResourceList,
}

/// Workload lifecycle phase as reported by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// An observed condition reported on a workload's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub kind: ConditionKind,
    pub status: ConditionStatus,
    /// Free-form detail. For [`ConditionKind::ResizeStatus`] this carries
    /// the action-version the report correlates with.
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Ready,
    Scheduled,
    /// Outcome report for an in-place resize action.
    ResizeStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

// ── In-place resize ───────────────────────────────────────────────

/// How a workload wants resize requests handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizePolicy {
    /// Resize in place when capacity allows, otherwise reschedule.
    #[default]
    InPlacePreferred,
    /// Resize in place or not at all.
    InPlaceOnly,
    /// Always restart (reschedule) to apply new resources.
    Restart,
}

/// A resize request plus the bookkeeping the cache stamps onto it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeSpec {
    /// Per-container resource changes being requested; emptied once the
    /// cache has decided on an action.
    #[serde(default)]
    pub request: Vec<ContainerResources>,
    /// The decision taken for the most recent request.
    #[serde(default)]
    pub action: ResizeAction,
    /// Resource-version at decision time; status conditions quote it so
    /// reports correlate with exactly the action they describe.
    #[serde(default)]
    pub action_version: String,
    /// Saved pre-resize values, kept until the action's outcome is known.
    #[serde(default)]
    pub rollback: Vec<ContainerResources>,
}

impl ResizeSpec {
    /// A bare request with no action decided yet.
    pub fn requesting(request: Vec<ContainerResources>) -> Self {
        Self {
            request,
            ..Self::default()
        }
    }
}

/// Resource requirements for one named container, used both for resize
/// requests and for rollback records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerResources {
    pub name: String,
    #[serde(default)]
    pub requests: ResourceList,
    #[serde(default)]
    pub limits: ResourceList,
}

/// Decision taken by the cache for a resize request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeAction {
    /// No decision taken.
    #[default]
    None,
    /// Resources were rewritten in place; awaiting the outcome report.
    Update,
    /// The outcome report for an `Update` has been processed.
    UpdateDone,
    /// The workload must be rescheduled to apply the new resources.
    Reschedule,
    /// In-place resize impossible and policy forbids rescheduling.
    NonePerPolicy,
    /// Rescheduling would violate a disruption budget; retry later.
    NonePerBudgetViolation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_namespace_scoped_uid() {
        let w = Workload {
            uid: "c1a9".into(),
            namespace: "prod".into(),
            name: "web-0".into(),
            node_name: "node-1".into(),
            labels: Labels::new(),
            phase: WorkloadPhase::Running,
            containers: vec![],
            conditions: vec![],
            resource_version: "17".into(),
            deletion_timestamp: None,
            resize_policy: ResizePolicy::default(),
            resize: None,
        };
        assert_eq!(w.key(), "prod/c1a9");
    }

    #[test]
    fn resize_policy_defaults_to_in_place_preferred() {
        assert_eq!(ResizePolicy::default(), ResizePolicy::InPlacePreferred);
    }

    #[test]
    fn resize_spec_requesting_carries_no_action() {
        let spec = ResizeSpec::requesting(vec![ContainerResources {
            name: "app".into(),
            requests: ResourceList::new(),
            limits: ResourceList::new(),
        }]);
        assert_eq!(spec.action, ResizeAction::None);
        assert!(spec.rollback.is_empty());
        assert_eq!(spec.request.len(), 1);
    }
}
