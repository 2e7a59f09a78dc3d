//! Resource quantities.
//!
//! Quantities are plain integers: CPU in milli-units (1000 = one core),
//! memory and ephemeral storage in bytes. Extended resources (GPUs,
//! vendor devices) carry their own name and an opaque count.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single resource dimension.
///
/// Serializes as its canonical name ("cpu", "memory", "ephemeral-storage",
/// or the extended resource's own name) so a [`ResourceList`] is a plain
/// string-keyed map on the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    /// CPU, in milli-units.
    Cpu,
    /// Memory, in bytes.
    Memory,
    /// Ephemeral (node-local scratch) storage, in bytes.
    EphemeralStorage,
    /// An extended resource identified by vendor name (e.g. "vendor.io/gpu").
    Extended(String),
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Cpu => f.write_str("cpu"),
            ResourceKind::Memory => f.write_str("memory"),
            ResourceKind::EphemeralStorage => f.write_str("ephemeral-storage"),
            ResourceKind::Extended(name) => f.write_str(name),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "cpu" => ResourceKind::Cpu,
            "memory" => ResourceKind::Memory,
            "ephemeral-storage" => ResourceKind::EphemeralStorage,
            other => ResourceKind::Extended(other.to_string()),
        })
    }
}

impl Serialize for ResourceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().expect("resource kind parsing is infallible"))
    }
}

/// Per-container (or per-workload) resource quantities.
///
/// Absent keys mean "not requested" on that dimension. An empty list is a
/// workload that declares nothing at all.
pub type ResourceList = BTreeMap<ResourceKind, i64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extended_resources_are_distinct_keys() {
        let mut rl = ResourceList::new();
        rl.insert(ResourceKind::Extended("vendor.io/gpu".into()), 2);
        rl.insert(ResourceKind::Extended("vendor.io/fpga".into()), 1);
        rl.insert(ResourceKind::Cpu, 500);

        assert_eq!(rl.len(), 3);
        assert_eq!(rl.get(&ResourceKind::Extended("vendor.io/gpu".into())), Some(&2));
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in [
            ResourceKind::Cpu,
            ResourceKind::Memory,
            ResourceKind::EphemeralStorage,
            ResourceKind::Extended("vendor.io/gpu".into()),
        ] {
            let parsed: ResourceKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn resource_list_round_trips_through_json() {
        let mut rl = ResourceList::new();
        rl.insert(ResourceKind::Cpu, 250);
        rl.insert(ResourceKind::Memory, 512 * 1024 * 1024);
        rl.insert(ResourceKind::Extended("vendor.io/gpu".into()), 1);

        let json = serde_json::to_string(&rl).unwrap();
        let back: ResourceList = serde_json::from_str(&json).unwrap();
        assert_eq!(rl, back);
    }
}
