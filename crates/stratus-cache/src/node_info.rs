//! Per-node aggregate view.
//!
//! A [`NodeInfo`] is the cache's canonical record for one node: the
//! workloads accounted to it, their summed resource demands, and a
//! generation counter consumers use to detect staleness. Resource sums are
//! maintained incrementally on add/remove rather than recomputed.

use std::collections::BTreeMap;

use stratus_core::{Node, ResourceKind, ResourceList, Workload};

use crate::error::{CacheError, CacheResult};

/// Floor applied to the non-zero CPU request of a container that declares
/// none, in milli-units.
pub const DEFAULT_MILLI_CPU_REQUEST: i64 = 100;

/// Floor applied to the non-zero memory request of a container that
/// declares none, in bytes.
pub const DEFAULT_MEMORY_REQUEST: i64 = 200 * 1024 * 1024;

/// Summed resource vector over a set of workloads (or one workload's
/// containers). CPU in milli-units, memory and storage in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resource {
    pub milli_cpu: i64,
    pub memory: i64,
    pub ephemeral_storage: i64,
    /// Extended resources by name.
    pub extended: BTreeMap<String, i64>,
}

impl Resource {
    /// Build a vector from a single resource list.
    pub fn from_list(list: &ResourceList) -> Self {
        let mut res = Self::default();
        res.add(list);
        res
    }

    /// Add each quantity of `list` into this vector.
    pub fn add(&mut self, list: &ResourceList) {
        for (kind, quantity) in list {
            match kind {
                ResourceKind::Cpu => self.milli_cpu += quantity,
                ResourceKind::Memory => self.memory += quantity,
                ResourceKind::EphemeralStorage => self.ephemeral_storage += quantity,
                ResourceKind::Extended(name) => {
                    *self.extended.entry(name.clone()).or_insert(0) += quantity;
                }
            }
        }
    }

    fn add_vec(&mut self, other: &Resource) {
        self.milli_cpu += other.milli_cpu;
        self.memory += other.memory;
        self.ephemeral_storage += other.ephemeral_storage;
        for (name, quantity) in &other.extended {
            *self.extended.entry(name.clone()).or_insert(0) += quantity;
        }
    }

    fn sub_vec(&mut self, other: &Resource) {
        self.milli_cpu -= other.milli_cpu;
        self.memory -= other.memory;
        self.ephemeral_storage -= other.ephemeral_storage;
        for (name, quantity) in &other.extended {
            *self.extended.entry(name.clone()).or_insert(0) -= quantity;
        }
    }
}

/// Per-scheduling-cycle scratch carried on a [`NodeInfo`], reset at the
/// snapshot-to-map handoff when the feature toggle is on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransientInfo {
    pub requested_volumes: i64,
    pub allocatable_volumes: i64,
}

impl TransientInfo {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Compute a workload's summed request vector and its non-zero CPU/memory
/// totals (containers declaring zero on a dimension count as the floor
/// value, so they do not look free to packing heuristics).
fn calculate_resource(workload: &Workload) -> (Resource, i64, i64) {
    let mut requested = Resource::default();
    let mut non_zero_cpu = 0;
    let mut non_zero_memory = 0;
    for container in &workload.containers {
        requested.add(&container.requests);

        let cpu = container.requests.get(&ResourceKind::Cpu).copied().unwrap_or(0);
        non_zero_cpu += if cpu == 0 { DEFAULT_MILLI_CPU_REQUEST } else { cpu };

        let memory = container.requests.get(&ResourceKind::Memory).copied().unwrap_or(0);
        non_zero_memory += if memory == 0 { DEFAULT_MEMORY_REQUEST } else { memory };
    }
    (requested, non_zero_cpu, non_zero_memory)
}

/// The cache's canonical per-node record.
///
/// Cloning produces a structurally independent copy (all data is owned);
/// clones are handed to scheduler workers and snapshots and are never
/// referenced by the cache afterward.
#[derive(Debug, Clone, Default)]
pub struct NodeInfo {
    /// The authoritative descriptor; absent when workloads referenced the
    /// node before it was observed.
    node: Option<Node>,
    /// Workloads currently accounted to this node.
    workloads: Vec<Workload>,
    requested: Resource,
    non_zero_requested: Resource,
    allocatable: Resource,
    /// Bumped on every structural mutation.
    generation: u64,
    transient: Option<TransientInfo>,
}

impl NodeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self) -> Option<&Node> {
        self.node.as_ref()
    }

    pub fn workloads(&self) -> &[Workload] {
        &self.workloads
    }

    /// Summed requests of all accounted workloads.
    pub fn requested(&self) -> &Resource {
        &self.requested
    }

    /// Like [`requested`](Self::requested), with floors substituted for
    /// zero-request containers.
    pub fn non_zero_requested(&self) -> &Resource {
        &self.non_zero_requested
    }

    /// Allocatable resources from the node descriptor.
    pub fn allocatable(&self) -> &Resource {
        &self.allocatable
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn transient(&self) -> Option<&TransientInfo> {
        self.transient.as_ref()
    }

    pub(crate) fn transient_mut(&mut self) -> Option<&mut TransientInfo> {
        self.transient.as_mut()
    }

    /// Account `workload` to this node.
    pub fn add_workload(&mut self, workload: &Workload) {
        let (requested, non_zero_cpu, non_zero_memory) = calculate_resource(workload);
        self.requested.add_vec(&requested);
        self.non_zero_requested.milli_cpu += non_zero_cpu;
        self.non_zero_requested.memory += non_zero_memory;
        self.workloads.push(workload.clone());
        self.generation += 1;
    }

    /// Stop accounting the workload with `workload`'s key to this node.
    ///
    /// The resource sums are reduced by the stored copy's demands, so the
    /// sums always equal the literal sum over the remaining workloads.
    pub fn remove_workload(&mut self, workload: &Workload) -> CacheResult<()> {
        let key = workload.key();
        let Some(position) = self.workloads.iter().position(|w| w.key() == key) else {
            return Err(CacheError::WorkloadNotFound {
                workload: key,
                node: workload.node_name.clone(),
            });
        };
        let removed = self.workloads.swap_remove(position);
        let (requested, non_zero_cpu, non_zero_memory) = calculate_resource(&removed);
        self.requested.sub_vec(&requested);
        self.non_zero_requested.milli_cpu -= non_zero_cpu;
        self.non_zero_requested.memory -= non_zero_memory;
        self.generation += 1;
        Ok(())
    }

    /// Store the node descriptor and recompute allocatable.
    ///
    /// Idempotent on equivalent descriptors, but still bumps the
    /// generation so consumers re-read.
    pub fn set_node(&mut self, node: &Node) {
        self.allocatable = Resource::from_list(&node.allocatable);
        self.transient = Some(TransientInfo::default());
        self.node = Some(node.clone());
        self.generation += 1;
    }

    /// Clear the node descriptor. The workload accounting stays; workload
    /// events arrive on a different watch and may still reference this
    /// node.
    pub fn remove_node(&mut self) {
        self.node = None;
        self.allocatable = Resource::default();
        self.transient = None;
        self.generation += 1;
    }
}
