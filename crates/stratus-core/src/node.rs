//! Node descriptor.

use serde::{Deserialize, Serialize};

use crate::labels::Labels;
use crate::resource::ResourceList;

/// The authoritative descriptor of a cluster node, as published by the
/// control plane. The scheduler cache stores its own copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub labels: Labels,
    /// Resources the scheduler may hand out on this node.
    #[serde(default)]
    pub allocatable: ResourceList,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Labels::new(),
            allocatable: ResourceList::new(),
        }
    }
}
