//! Disruption budgets.

use serde::{Deserialize, Serialize};

use crate::labels::{LabelSelector, Labels};

/// Bounds how many workloads of a labeled group may be concurrently
/// unavailable. The scheduler consults these before voluntarily
/// disrupting a running workload (e.g. rescheduling it for a resize).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisruptionBudget {
    /// Stable unique identifier assigned by the control plane.
    pub id: String,
    pub namespace: String,
    pub name: String,
    /// The budget object's own labels (registry queries filter on these).
    #[serde(default)]
    pub labels: Labels,
    /// Selects the workloads the budget protects.
    #[serde(default)]
    pub selector: LabelSelector,
    /// How many more voluntary disruptions are currently allowed.
    pub disruptions_allowed: i32,
}
