//! In-place vertical-resize decision engine.
//!
//! On a confirmed update of a running workload carrying a resize request,
//! the cache decides whether to rewrite the reservation in place, defer to
//! a reschedule, or refuse. The decision lives inside the cache because
//! only the cache knows the authoritative per-node aggregate reservations;
//! deciding outside would duplicate the accounting and race against
//! concurrent assumes.

use std::collections::HashMap;

use tracing::{debug, error};

use stratus_core::{
    ConditionKind, ConditionStatus, ContainerResources, ResizeAction, ResizePolicy, Selector,
    Workload,
};

use crate::cache::CacheState;
use crate::error::{CacheError, CacheResult};
use crate::node_info::Resource;

impl CacheState {
    /// Decide what to do about `new`'s resize request. Runs between the
    /// old object's de-accounting and the new object's re-accounting, so
    /// the node's requested vector excludes this workload. The decision
    /// (action, action-version, any in-place rewrite) is stamped onto
    /// `new` and mirrored onto the cache's own copy.
    pub(crate) fn process_resize(&mut self, old: &Workload, new: &mut Workload) -> CacheResult<()> {
        if !self.nodes.contains_key(&new.node_name) {
            error!(
                workload = %new.key(),
                node = %new.node_name,
                "resize decision targets an untracked node"
            );
            return Err(CacheError::UnknownNode(new.node_name.clone()));
        }
        let policy = new.resize_policy;

        self.process_resize_status(old, new);

        let request_pending = new.resize.as_ref().is_some_and(|r| !r.request.is_empty());
        if !request_pending {
            return Ok(());
        }

        if policy == ResizePolicy::Restart {
            if let Some(resize) = new.resize.as_mut() {
                resize.request.clear();
                resize.action_version = new.resource_version.clone();
                resize.action = ResizeAction::Reschedule;
            }
            debug!(workload = %new.key(), "rescheduling workload per restart resize policy");
            return Ok(());
        }

        let (changes, prospective) = resize_requirements(new);
        if let Some(resize) = new.resize.as_mut() {
            resize.request.clear();
        }

        let Some(node) = self.nodes.get(&new.node_name) else {
            return Err(CacheError::UnknownNode(new.node_name.clone()));
        };
        let allocatable = node.allocatable().clone();
        let requested = node.requested().clone();

        if allocatable.milli_cpu > prospective.milli_cpu + requested.milli_cpu
            && allocatable.memory > prospective.memory + requested.memory
        {
            self.commit_in_place(old, new, &changes);
            return Ok(());
        }

        if let Some(resize) = new.resize.as_mut() {
            resize.action_version = new.resource_version.clone();
        }

        if policy == ResizePolicy::InPlaceOnly {
            if let Some(resize) = new.resize.as_mut() {
                resize.action = ResizeAction::NonePerPolicy;
            }
            debug!(
                workload = %new.key(),
                node = %new.node_name,
                allocatable_cpu = allocatable.milli_cpu,
                allocatable_memory = allocatable.memory,
                requested_cpu = prospective.milli_cpu,
                requested_memory = prospective.memory,
                "in-place resize rejected by policy"
            );
            return Ok(());
        }

        if !new.labels.is_empty() {
            if !self.budget_allows_disruption(new)? {
                // Controller retries will revisit the request later.
                if let Some(resize) = new.resize.as_mut() {
                    resize.action = ResizeAction::NonePerBudgetViolation;
                }
                return Ok(());
            }
            debug!(workload = %new.key(), "rescheduling workload, within disruption budget");
        }
        if let Some(resize) = new.resize.as_mut() {
            resize.action = ResizeAction::Reschedule;
        }
        Ok(())
    }

    /// Process the outcome report for a previously stamped action. A
    /// failure report rolls the resource values back to the saved ones;
    /// either way the action is marked done and the rollback record
    /// cleared. Only the first resize-status condition is considered.
    fn process_resize_status(&mut self, old: &Workload, new: &mut Workload) {
        let Some(resize) = new.resize.as_ref() else {
            return;
        };
        let action_version = resize.action_version.clone();
        let has_rollback = !resize.rollback.is_empty();

        let conditions = new.conditions.clone();
        for condition in conditions {
            if condition.kind != ConditionKind::ResizeStatus {
                continue;
            }
            if condition.message == action_version {
                if condition.status == ConditionStatus::False && has_rollback {
                    debug!(
                        workload = %old.key(),
                        "restoring resource values after a failed resize attempt"
                    );
                    self.rollback_resources(old, new);
                }
                if let Some(resize) = new.resize.as_mut() {
                    resize.action_version = new.resource_version.clone();
                    resize.action = ResizeAction::UpdateDone;
                    resize.rollback.clear();
                }
            }
            break;
        }
    }

    /// Restore each named container's requests/limits from the rollback
    /// record, on both the incoming and the cached workload objects.
    fn rollback_resources(&mut self, old: &Workload, new: &mut Workload) {
        let rollback = new
            .resize
            .as_ref()
            .map(|r| r.rollback.clone())
            .unwrap_or_default();
        let key = old.key();
        for (index, container) in new.containers.iter_mut().enumerate() {
            let Some(saved) = rollback.iter().find(|r| r.name == container.name) else {
                continue;
            };
            if !saved.requests.is_empty() {
                container.requests = saved.requests.clone();
            }
            if !saved.limits.is_empty() {
                container.limits = saved.limits.clone();
            }
            if let Some(state) = self.workload_states.get_mut(&key) {
                if let Some(cached) = state.workload.containers.get_mut(index) {
                    if !saved.requests.is_empty() {
                        cached.requests = saved.requests.clone();
                    }
                    if !saved.limits.is_empty() {
                        cached.limits = saved.limits.clone();
                    }
                }
            }
        }
    }

    /// Rewrite each named container's requests/limits in place, saving
    /// pre-resize values for rollback, and stamp the `Update` action.
    fn commit_in_place(
        &mut self,
        old: &Workload,
        new: &mut Workload,
        changes: &HashMap<String, ContainerResources>,
    ) {
        let mut rollback = Vec::new();
        for container in new.containers.iter_mut() {
            let Some(change) = changes.get(&container.name) else {
                continue;
            };
            rollback.push(ContainerResources {
                name: container.name.clone(),
                requests: container.requests.clone(),
                limits: container.limits.clone(),
            });
            for (kind, quantity) in &change.requests {
                container.requests.insert(kind.clone(), *quantity);
            }
            for (kind, quantity) in &change.limits {
                container.limits.insert(kind.clone(), *quantity);
            }
        }

        // Mirror the overlay onto the cache's own copy.
        let key = old.key();
        if let Some(state) = self.workload_states.get_mut(&key) {
            for (index, container) in new.containers.iter().enumerate() {
                let Some(change) = changes.get(&container.name) else {
                    continue;
                };
                if let Some(cached) = state.workload.containers.get_mut(index) {
                    for (kind, quantity) in &change.requests {
                        cached.requests.insert(kind.clone(), *quantity);
                    }
                    for (kind, quantity) in &change.limits {
                        cached.limits.insert(kind.clone(), *quantity);
                    }
                }
            }
        }

        if let Some(resize) = new.resize.as_mut() {
            resize.action_version = new.resource_version.clone();
            resize.action = ResizeAction::Update;
            resize.rollback = rollback;
        }
    }

    /// True if no matching disruption budget forbids disrupting the
    /// workload. Budgets whose selector is empty or does not match are
    /// irrelevant; a selector that fails to compile aborts the decision.
    pub(crate) fn budget_allows_disruption(&self, workload: &Workload) -> CacheResult<bool> {
        for budget in self.budgets.values() {
            let selector = match Selector::try_from(&budget.selector) {
                Ok(selector) => selector,
                Err(err) => {
                    error!(
                        budget = %budget.name,
                        error = %err,
                        "failed to compile disruption-budget selector"
                    );
                    return Err(CacheError::Selector(err));
                }
            };
            if selector.is_empty() || !selector.matches(&workload.labels) {
                continue;
            }
            if budget.disruptions_allowed <= 0 {
                debug!(
                    workload = %workload.name,
                    budget = %budget.name,
                    "rescheduling would violate disruption budget"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Index the per-container changes by name and compute the workload's
/// prospective aggregate request with those changes overlaid.
fn resize_requirements(workload: &Workload) -> (HashMap<String, ContainerResources>, Resource) {
    let mut changes = HashMap::new();
    if let Some(resize) = &workload.resize {
        for change in &resize.request {
            changes.insert(change.name.clone(), change.clone());
        }
    }
    let mut prospective = Resource::default();
    for container in &workload.containers {
        let mut requests = container.requests.clone();
        if let Some(change) = changes.get(&container.name) {
            for (kind, quantity) in &change.requests {
                requests.insert(kind.clone(), *quantity);
            }
        }
        prospective.add(&requests);
    }
    (changes, prospective)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use stratus_core::{
        Condition, Container, DisruptionBudget, LabelSelector, Labels, Node, ResizeSpec,
        ResourceKind, ResourceList, WorkloadPhase,
    };

    use super::*;
    use crate::cache::{Cache, CacheConfig};

    const GIB: i64 = 1 << 30;

    fn test_cache() -> Cache {
        Cache::without_reaper(CacheConfig::new(Duration::from_secs(10)))
    }

    fn test_node(name: &str, cpu: i64, memory: i64) -> Node {
        let mut node = Node::new(name);
        node.allocatable.insert(ResourceKind::Cpu, cpu);
        node.allocatable.insert(ResourceKind::Memory, memory);
        node
    }

    fn running_workload(uid: &str, node: &str, cpu: i64, memory: i64) -> Workload {
        Workload {
            uid: uid.to_string(),
            namespace: "default".to_string(),
            name: format!("wl-{uid}"),
            node_name: node.to_string(),
            labels: Labels::new(),
            phase: WorkloadPhase::Running,
            containers: vec![Container {
                name: "app".to_string(),
                requests: ResourceList::from([
                    (ResourceKind::Cpu, cpu),
                    (ResourceKind::Memory, memory),
                ]),
                limits: ResourceList::new(),
            }],
            conditions: vec![],
            resource_version: "1".to_string(),
            deletion_timestamp: None,
            resize_policy: ResizePolicy::default(),
            resize: None,
        }
    }

    fn resize_to(cpu: i64, memory: i64) -> ResizeSpec {
        ResizeSpec::requesting(vec![ContainerResources {
            name: "app".to_string(),
            requests: ResourceList::from([
                (ResourceKind::Cpu, cpu),
                (ResourceKind::Memory, memory),
            ]),
            limits: ResourceList::new(),
        }])
    }

    fn node_requested(cache: &Cache, node: &str) -> (i64, i64) {
        let s = cache.locked();
        let info = &s.nodes[node];
        (info.requested().milli_cpu, info.requested().memory)
    }

    /// Node has room: the resize is committed in place.
    #[test]
    fn resize_within_capacity_updates_in_place() {
        let cache = test_cache();
        cache.add_node(&test_node("n1", 2000, 4 * GIB));
        let old = running_workload("a", "n1", 500, GIB);
        cache.add_workload(&old).unwrap();

        let mut new = old.clone();
        new.resource_version = "2".to_string();
        new.resize = Some(resize_to(800, GIB + GIB / 2));

        cache.update_workload(&old, &mut new).unwrap();

        let resize = new.resize.as_ref().unwrap();
        assert_eq!(resize.action, ResizeAction::Update);
        assert_eq!(resize.action_version, "2");
        assert!(resize.request.is_empty());
        // Pre-resize values are saved for rollback.
        assert_eq!(resize.rollback.len(), 1);
        assert_eq!(resize.rollback[0].requests.get(&ResourceKind::Cpu), Some(&500));
        assert_eq!(resize.rollback[0].requests.get(&ResourceKind::Memory), Some(&GIB));

        // Both the incoming and the cached object carry the new values.
        assert_eq!(new.containers[0].requests.get(&ResourceKind::Cpu), Some(&800));
        let cached = cache.get_workload(&old).unwrap();
        assert_eq!(cached.containers[0].requests.get(&ResourceKind::Cpu), Some(&800));

        assert_eq!(node_requested(&cache, "n1"), (800, GIB + GIB / 2));
    }

    /// Capacity exceeded under InPlaceOnly: nothing changes.
    #[test]
    fn resize_beyond_capacity_refused_per_policy() {
        let cache = test_cache();
        cache.add_node(&test_node("n1", 2000, 4 * GIB));
        let mut old = running_workload("a", "n1", 500, GIB);
        old.resize_policy = ResizePolicy::InPlaceOnly;
        cache.add_workload(&old).unwrap();

        let mut new = old.clone();
        new.resource_version = "2".to_string();
        new.resize = Some(resize_to(2500, GIB));

        cache.update_workload(&old, &mut new).unwrap();

        let resize = new.resize.as_ref().unwrap();
        assert_eq!(resize.action, ResizeAction::NonePerPolicy);
        assert_eq!(resize.action_version, "2");
        assert!(resize.rollback.is_empty());

        assert_eq!(new.containers[0].requests.get(&ResourceKind::Cpu), Some(&500));
        let cached = cache.get_workload(&old).unwrap();
        assert_eq!(cached.containers[0].requests.get(&ResourceKind::Cpu), Some(&500));
        assert_eq!(node_requested(&cache, "n1"), (500, GIB));
    }

    /// A tie on either dimension is not enough; the check is strict.
    #[test]
    fn resize_to_exact_capacity_is_refused() {
        let cache = test_cache();
        cache.add_node(&test_node("n1", 2000, 4 * GIB));
        let old = running_workload("a", "n1", 500, GIB);
        cache.add_workload(&old).unwrap();

        let mut new = old.clone();
        new.resource_version = "2".to_string();
        new.resize = Some(resize_to(2000, GIB));

        cache.update_workload(&old, &mut new).unwrap();
        assert_eq!(new.resize.as_ref().unwrap().action, ResizeAction::Reschedule);
        assert_eq!(node_requested(&cache, "n1"), (500, GIB));
    }

    /// Capacity exceeded under InPlacePreferred with no budgets in the
    /// way: defer to a reschedule.
    #[test]
    fn resize_beyond_capacity_falls_back_to_reschedule() {
        let cache = test_cache();
        cache.add_node(&test_node("n1", 2000, 4 * GIB));
        let old = running_workload("a", "n1", 500, GIB);
        cache.add_workload(&old).unwrap();

        let mut new = old.clone();
        new.resource_version = "2".to_string();
        new.resize = Some(resize_to(2500, GIB));

        cache.update_workload(&old, &mut new).unwrap();
        assert_eq!(new.resize.as_ref().unwrap().action, ResizeAction::Reschedule);
        assert_eq!(new.resize.as_ref().unwrap().action_version, "2");
    }

    /// Reschedule blocked by an exhausted disruption budget.
    #[test]
    fn reschedule_blocked_by_disruption_budget() {
        let cache = test_cache();
        cache.add_node(&test_node("n1", 2000, 4 * GIB));
        cache.add_budget(&DisruptionBudget {
            id: "b1".to_string(),
            namespace: "default".to_string(),
            name: "web-budget".to_string(),
            labels: Labels::new(),
            selector: LabelSelector::matching("app", "web"),
            disruptions_allowed: 0,
        });

        let mut old = running_workload("a", "n1", 500, GIB);
        old.labels = BTreeMap::from([("app".to_string(), "web".to_string())]);
        cache.add_workload(&old).unwrap();

        let mut new = old.clone();
        new.resource_version = "2".to_string();
        new.resize = Some(resize_to(2500, GIB));

        cache.update_workload(&old, &mut new).unwrap();
        assert_eq!(
            new.resize.as_ref().unwrap().action,
            ResizeAction::NonePerBudgetViolation
        );
    }

    /// A budget that does not select the workload does not block it.
    #[test]
    fn unrelated_budget_does_not_block_reschedule() {
        let cache = test_cache();
        cache.add_node(&test_node("n1", 2000, 4 * GIB));
        cache.add_budget(&DisruptionBudget {
            id: "b1".to_string(),
            namespace: "default".to_string(),
            name: "db-budget".to_string(),
            labels: Labels::new(),
            selector: LabelSelector::matching("app", "db"),
            disruptions_allowed: 0,
        });

        let mut old = running_workload("a", "n1", 500, GIB);
        old.labels = BTreeMap::from([("app".to_string(), "web".to_string())]);
        cache.add_workload(&old).unwrap();

        let mut new = old.clone();
        new.resource_version = "2".to_string();
        new.resize = Some(resize_to(2500, GIB));

        cache.update_workload(&old, &mut new).unwrap();
        assert_eq!(new.resize.as_ref().unwrap().action, ResizeAction::Reschedule);
    }

    /// An invalid budget selector aborts the decision with an error.
    #[test]
    fn invalid_budget_selector_fails_the_decision() {
        let cache = test_cache();
        cache.add_node(&test_node("n1", 2000, 4 * GIB));
        cache.add_budget(&DisruptionBudget {
            id: "b1".to_string(),
            namespace: "default".to_string(),
            name: "broken-budget".to_string(),
            labels: Labels::new(),
            selector: LabelSelector {
                match_labels: BTreeMap::new(),
                match_expressions: vec![stratus_core::SelectorRequirement {
                    key: "app".to_string(),
                    operator: stratus_core::SelectorOperator::In,
                    values: vec![],
                }],
            },
            disruptions_allowed: 1,
        });

        let mut old = running_workload("a", "n1", 500, GIB);
        old.labels = BTreeMap::from([("app".to_string(), "web".to_string())]);
        cache.add_workload(&old).unwrap();

        let mut new = old.clone();
        new.resource_version = "2".to_string();
        new.resize = Some(resize_to(2500, GIB));

        let err = cache.update_workload(&old, &mut new).unwrap_err();
        assert!(matches!(err, CacheError::Selector(_)));
        // The update itself still re-accounted the workload.
        assert_eq!(node_requested(&cache, "n1"), (500, GIB));
    }

    /// Restart policy never resizes in place.
    #[test]
    fn restart_policy_always_reschedules() {
        let cache = test_cache();
        cache.add_node(&test_node("n1", 2000, 4 * GIB));
        let mut old = running_workload("a", "n1", 500, GIB);
        old.resize_policy = ResizePolicy::Restart;
        cache.add_workload(&old).unwrap();

        let mut new = old.clone();
        new.resource_version = "2".to_string();
        new.resize = Some(resize_to(600, GIB));

        cache.update_workload(&old, &mut new).unwrap();
        let resize = new.resize.as_ref().unwrap();
        assert_eq!(resize.action, ResizeAction::Reschedule);
        assert_eq!(resize.action_version, "2");
        assert!(resize.request.is_empty());
        assert_eq!(node_requested(&cache, "n1"), (500, GIB));
    }

    /// A failure report for the stamped action rolls the values back.
    #[test]
    fn failed_resize_report_rolls_back() {
        let cache = test_cache();
        cache.add_node(&test_node("n1", 2000, 4 * GIB));
        let old = running_workload("a", "n1", 500, GIB);
        cache.add_workload(&old).unwrap();

        let mut resized = old.clone();
        resized.resource_version = "2".to_string();
        resized.resize = Some(resize_to(800, GIB));
        cache.update_workload(&old, &mut resized).unwrap();
        assert_eq!(resized.resize.as_ref().unwrap().action, ResizeAction::Update);

        // The node agent reports failure against action-version "2".
        let mut reported = resized.clone();
        reported.resource_version = "3".to_string();
        reported.conditions = vec![Condition {
            kind: ConditionKind::ResizeStatus,
            status: ConditionStatus::False,
            message: "2".to_string(),
        }];

        cache.update_workload(&resized, &mut reported).unwrap();

        let resize = reported.resize.as_ref().unwrap();
        assert_eq!(resize.action, ResizeAction::UpdateDone);
        assert_eq!(resize.action_version, "3");
        assert!(resize.rollback.is_empty());

        assert_eq!(reported.containers[0].requests.get(&ResourceKind::Cpu), Some(&500));
        let cached = cache.get_workload(&old).unwrap();
        assert_eq!(cached.containers[0].requests.get(&ResourceKind::Cpu), Some(&500));
        assert_eq!(node_requested(&cache, "n1"), (500, GIB));
    }

    /// A success report just closes out the action.
    #[test]
    fn successful_resize_report_marks_done() {
        let cache = test_cache();
        cache.add_node(&test_node("n1", 2000, 4 * GIB));
        let old = running_workload("a", "n1", 500, GIB);
        cache.add_workload(&old).unwrap();

        let mut resized = old.clone();
        resized.resource_version = "2".to_string();
        resized.resize = Some(resize_to(800, GIB));
        cache.update_workload(&old, &mut resized).unwrap();

        let mut reported = resized.clone();
        reported.resource_version = "3".to_string();
        reported.conditions = vec![Condition {
            kind: ConditionKind::ResizeStatus,
            status: ConditionStatus::True,
            message: "2".to_string(),
        }];

        cache.update_workload(&resized, &mut reported).unwrap();

        let resize = reported.resize.as_ref().unwrap();
        assert_eq!(resize.action, ResizeAction::UpdateDone);
        assert!(resize.rollback.is_empty());
        // The applied values stay.
        assert_eq!(reported.containers[0].requests.get(&ResourceKind::Cpu), Some(&800));
        assert_eq!(node_requested(&cache, "n1"), (800, GIB));
    }

    /// A report for some other action-version is ignored.
    #[test]
    fn stale_resize_report_is_ignored() {
        let cache = test_cache();
        cache.add_node(&test_node("n1", 2000, 4 * GIB));
        let old = running_workload("a", "n1", 500, GIB);
        cache.add_workload(&old).unwrap();

        let mut resized = old.clone();
        resized.resource_version = "2".to_string();
        resized.resize = Some(resize_to(800, GIB));
        cache.update_workload(&old, &mut resized).unwrap();

        let mut reported = resized.clone();
        reported.resource_version = "3".to_string();
        reported.conditions = vec![Condition {
            kind: ConditionKind::ResizeStatus,
            status: ConditionStatus::False,
            message: "999".to_string(),
        }];

        cache.update_workload(&resized, &mut reported).unwrap();

        let resize = reported.resize.as_ref().unwrap();
        assert_eq!(resize.action, ResizeAction::Update);
        assert_eq!(resize.rollback.len(), 1);
        assert_eq!(reported.containers[0].requests.get(&ResourceKind::Cpu), Some(&800));
    }

    /// Updating the lone workload of a descriptor-less node drops the
    /// NodeInfo before the decision runs; the error is surfaced but the
    /// workload is still re-accounted.
    #[test]
    fn resize_on_untracked_node_errors() {
        let cache = test_cache();
        let old = running_workload("a", "n1", 500, GIB);
        cache.add_workload(&old).unwrap();

        let mut new = old.clone();
        new.resource_version = "2".to_string();
        new.resize = Some(resize_to(800, GIB));

        let err = cache.update_workload(&old, &mut new).unwrap_err();
        assert!(matches!(err, CacheError::UnknownNode(_)));
        assert_eq!(node_requested(&cache, "n1"), (500, GIB));
        assert_eq!(new.resize.as_ref().unwrap().action, ResizeAction::None);
    }

    /// The engine does not run for non-running workloads.
    #[test]
    fn resize_is_skipped_for_pending_workloads() {
        let cache = test_cache();
        cache.add_node(&test_node("n1", 2000, 4 * GIB));
        let mut old = running_workload("a", "n1", 500, GIB);
        old.phase = WorkloadPhase::Pending;
        cache.add_workload(&old).unwrap();

        let mut new = old.clone();
        new.resource_version = "2".to_string();
        new.resize = Some(resize_to(800, GIB));

        cache.update_workload(&old, &mut new).unwrap();
        assert_eq!(new.resize.as_ref().unwrap().action, ResizeAction::None);
        assert!(!new.resize.as_ref().unwrap().request.is_empty());
        assert_eq!(node_requested(&cache, "n1"), (500, GIB));
    }

    /// The engine does not run once deletion has been requested.
    #[test]
    fn resize_is_skipped_for_deleting_workloads() {
        let cache = test_cache();
        cache.add_node(&test_node("n1", 2000, 4 * GIB));
        let old = running_workload("a", "n1", 500, GIB);
        cache.add_workload(&old).unwrap();

        let mut new = old.clone();
        new.resource_version = "2".to_string();
        new.deletion_timestamp = Some(1_700_000_000);
        new.resize = Some(resize_to(800, GIB));

        cache.update_workload(&old, &mut new).unwrap();
        assert_eq!(new.resize.as_ref().unwrap().action, ResizeAction::None);
    }

    /// The engine can be disabled wholesale through configuration.
    #[test]
    fn resize_is_skipped_when_disabled() {
        let mut config = CacheConfig::new(Duration::from_secs(10));
        config.vertical_resize = false;
        let cache = Cache::without_reaper(config);
        cache.add_node(&test_node("n1", 2000, 4 * GIB));
        let old = running_workload("a", "n1", 500, GIB);
        cache.add_workload(&old).unwrap();

        let mut new = old.clone();
        new.resource_version = "2".to_string();
        new.resize = Some(resize_to(800, GIB));

        cache.update_workload(&old, &mut new).unwrap();
        assert_eq!(new.resize.as_ref().unwrap().action, ResizeAction::None);
        assert_eq!(node_requested(&cache, "n1"), (500, GIB));
    }
}
