//! The scheduler cache.
//!
//! An in-memory, concurrency-safe projection of cluster state (nodes,
//! workloads, disruption budgets) the scheduler consults while deciding
//! placement. Its central mechanism is the assumed-workload lifecycle:
//! the scheduler commits a placement decision here optimistically, before
//! the control plane has confirmed it, so later decisions see the
//! reservation and do not double-book resources. A background reaper
//! evicts assumed workloads whose confirmation never arrived.
//!
//! Every operation takes one coarse mutex for the duration of its work.
//! The cache is not on the scheduling algorithm's inner loop (the
//! incremental clone path of [`Cache::update_node_info_map`] feeds that),
//! and global exclusion keeps the state-machine invariants simple.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, error, trace, warn};

use stratus_core::{DisruptionBudget, Node, Selector, Workload, WorkloadKey, WorkloadPhase};

use crate::error::{CacheError, CacheResult};
use crate::node_info::NodeInfo;

/// Interval between reaper passes over the assumed set.
const CLEAN_ASSUMED_PERIOD: Duration = Duration::from_secs(1);

/// Cache construction parameters.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an assumed workload whose binding has finished may wait
    /// for its authoritative confirmation before the reaper evicts it.
    pub ttl: Duration,
    /// Run the in-place vertical-resize decision engine on updates.
    pub vertical_resize: bool,
    /// Reset per-cycle transient node info at node-map handoff.
    pub transient_node_info: bool,
}

impl CacheConfig {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            vertical_resize: true,
            transient_node_info: false,
        }
    }
}

/// Tracking record for one workload.
pub(crate) struct WorkloadState {
    /// The cache's own copy of the workload object.
    pub(crate) workload: Workload,
    /// Absolute expiry time; set only while assumed with binding finished.
    pub(crate) deadline: Option<Instant>,
    /// Blocks expiry while the commit round-trip is still in flight.
    pub(crate) binding_finished: bool,
}

/// Everything the cache mutex guards.
pub(crate) struct CacheState {
    pub(crate) config: CacheConfig,
    pub(crate) nodes: HashMap<String, NodeInfo>,
    pub(crate) workload_states: HashMap<WorkloadKey, WorkloadState>,
    pub(crate) assumed: HashSet<WorkloadKey>,
    pub(crate) budgets: HashMap<String, DisruptionBudget>,
}

/// Structurally independent copy of the cache, for non-critical consumers.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub nodes: HashMap<String, NodeInfo>,
    pub assumed: HashSet<WorkloadKey>,
    pub budgets: HashMap<String, DisruptionBudget>,
}

/// The scheduler-side cluster state cache.
///
/// Construction spawns the expiration reaper, bound to the supplied
/// shutdown signal; drop the sender or send `true` to stop it.
pub struct Cache {
    state: Arc<Mutex<CacheState>>,
    period: Duration,
}

impl Cache {
    /// Create a cache with the default configuration and start the
    /// assumed-workload reaper. Must be called within a tokio runtime.
    pub fn new(ttl: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self::with_config(CacheConfig::new(ttl), shutdown)
    }

    /// Create a cache with an explicit configuration and start the reaper.
    pub fn with_config(config: CacheConfig, shutdown: watch::Receiver<bool>) -> Self {
        let cache = Self::without_reaper(config);
        cache.spawn_reaper(shutdown);
        cache
    }

    /// Construct without starting the reaper. Tests drive expiry
    /// deterministically through [`CacheState::cleanup_assumed`].
    pub(crate) fn without_reaper(config: CacheConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState {
                config,
                nodes: HashMap::new(),
                workload_states: HashMap::new(),
                assumed: HashSet::new(),
                budgets: HashMap::new(),
            })),
            period: CLEAN_ASSUMED_PERIOD,
        }
    }

    fn spawn_reaper(&self, mut shutdown: watch::Receiver<bool>) {
        let state = Arc::clone(&self.state);
        let period = self.period;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        lock(&state).cleanup_assumed(Instant::now());
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            debug!("assumed-workload reaper stopping");
                            break;
                        }
                    }
                }
            }
        });
    }

    pub(crate) fn locked(&self) -> MutexGuard<'_, CacheState> {
        lock(&self.state)
    }

    // ── Assumed-workload lifecycle ─────────────────────────────────

    /// Optimistically commit a placement decision.
    ///
    /// The workload's effect on node accounting is visible to all
    /// subsequent operations immediately, before the control plane has
    /// confirmed anything.
    pub fn assume(&self, workload: &Workload) -> CacheResult<()> {
        let key = workload.key();
        let mut s = self.locked();
        if s.workload_states.contains_key(&key) {
            return Err(CacheError::AlreadyAssumed(key));
        }
        s.add_to_node(workload);
        s.assumed.insert(key.clone());
        s.workload_states.insert(
            key,
            WorkloadState {
                workload: workload.clone(),
                deadline: None,
                binding_finished: false,
            },
        );
        Ok(())
    }

    /// Signal that the commit-to-control-plane round-trip has ended,
    /// arming expiration. Idempotent; a no-op if the workload is unknown
    /// or the authoritative add already raced ahead.
    pub fn finish_binding(&self, workload: &Workload) -> CacheResult<()> {
        self.finish_binding_at(workload, Instant::now())
    }

    /// `finish_binding` with an injected clock, for deterministic tests.
    pub(crate) fn finish_binding_at(&self, workload: &Workload, now: Instant) -> CacheResult<()> {
        let key = workload.key();
        let mut s = self.locked();
        trace!(workload = %key, "binding finished, assumed entry may expire");
        let ttl = s.config.ttl;
        if s.assumed.contains(&key) {
            if let Some(state) = s.workload_states.get_mut(&key) {
                state.binding_finished = true;
                state.deadline = Some(now + ttl);
            }
        }
        Ok(())
    }

    /// Roll back an assumed placement after a failed commit. Only assumed
    /// workloads can be forgotten.
    pub fn forget(&self, workload: &Workload) -> CacheResult<()> {
        let key = workload.key();
        let mut s = self.locked();
        if let Some(state) = s.workload_states.get(&key) {
            if state.workload.node_name != workload.node_name {
                return Err(CacheError::NodeMismatch {
                    key,
                    assumed_node: state.workload.node_name.clone(),
                    submitted_node: workload.node_name.clone(),
                });
            }
        }
        if !(s.workload_states.contains_key(&key) && s.assumed.contains(&key)) {
            return Err(CacheError::NotAssumed(key));
        }
        s.remove_from_node(workload)?;
        s.assumed.remove(&key);
        s.workload_states.remove(&key);
        Ok(())
    }

    // ── Authoritative workload events ──────────────────────────────

    /// Apply an authoritative add. Promotes a matching assumed entry to
    /// confirmed (moving it between nodes if the confirmation disagrees
    /// with the assumption), or re-creates an entry the reaper already
    /// expired.
    pub fn add_workload(&self, workload: &Workload) -> CacheResult<()> {
        let key = workload.key();
        let mut s = self.locked();
        if !s.workload_states.contains_key(&key) {
            // The assumed entry expired (or was never assumed through this
            // cache); add it back.
            s.add_to_node(workload);
            s.workload_states.insert(
                key,
                WorkloadState {
                    workload: workload.clone(),
                    deadline: None,
                    binding_finished: false,
                },
            );
            return Ok(());
        }
        if !s.assumed.contains(&key) {
            return Err(CacheError::AlreadyAdded(key));
        }

        let cached = match s.workload_states.get(&key) {
            Some(state) => state.workload.clone(),
            None => return Err(CacheError::NotAdded(key)),
        };
        if cached.node_name != workload.node_name {
            // Confirmed on a different node than assumed; move the
            // accounting before clearing the assumption.
            warn!(
                workload = %key,
                assumed_node = %cached.node_name,
                node = %workload.node_name,
                "workload was assumed on one node but confirmed on another"
            );
            if let Err(err) = s.remove_from_node(&cached) {
                error!(workload = %key, error = %err, "failed to release assumed accounting");
            }
            s.add_to_node(workload);
        }
        s.assumed.remove(&key);
        if let Some(state) = s.workload_states.get_mut(&key) {
            state.deadline = None;
            state.workload = workload.clone();
        }
        Ok(())
    }

    /// Apply an authoritative update. The new workload is taken by `&mut`
    /// because the resize decision engine stamps its decision (and any
    /// in-place resource rewrite) onto it for the event feed to observe.
    ///
    /// Panics if the update names a different node than the confirmed
    /// state: node accounting can no longer be trusted and neither can
    /// any scheduling decision built on it.
    pub fn update_workload(&self, old: &Workload, new: &mut Workload) -> CacheResult<()> {
        let key = old.key();
        let mut s = self.locked();
        // An assumed workload has no update event; the authoritative add
        // must arrive first and confirm it.
        let confirmed = match s.workload_states.get(&key) {
            Some(state) if !s.assumed.contains(&key) => {
                if state.workload.node_name != new.node_name {
                    error!(
                        workload = %key,
                        cached_node = %state.workload.node_name,
                        new_node = %new.node_name,
                        "workload updated on a different node than previously added to"
                    );
                    panic!("scheduler cache is corrupted and can badly affect scheduling decisions");
                }
                true
            }
            _ => false,
        };
        if !confirmed {
            return Err(CacheError::NotAdded(key));
        }
        s.update_locked(old, new)
    }

    /// Apply an authoritative remove, releasing the workload's
    /// accounting. Same corruption rule as [`Cache::update_workload`].
    pub fn remove_workload(&self, workload: &Workload) -> CacheResult<()> {
        let key = workload.key();
        let mut s = self.locked();
        let cached = match s.workload_states.get(&key) {
            Some(state) if !s.assumed.contains(&key) => {
                if state.workload.node_name != workload.node_name {
                    error!(
                        workload = %key,
                        cached_node = %state.workload.node_name,
                        node = %workload.node_name,
                        "workload removed on a different node than previously added to"
                    );
                    panic!("scheduler cache is corrupted and can badly affect scheduling decisions");
                }
                state.workload.clone()
            }
            _ => return Err(CacheError::NotAdded(key)),
        };
        s.remove_from_node(&cached)?;
        s.workload_states.remove(&key);
        Ok(())
    }

    // ── Read-only queries ──────────────────────────────────────────

    /// Whether the workload is currently in the assumed phase.
    pub fn is_assumed(&self, workload: &Workload) -> bool {
        let s = self.locked();
        s.assumed.contains(&workload.key())
    }

    /// The cache's copy of the workload, cloned out.
    pub fn get_workload(&self, workload: &Workload) -> CacheResult<Workload> {
        let key = workload.key();
        let s = self.locked();
        s.workload_states
            .get(&key)
            .map(|state| state.workload.clone())
            .ok_or(CacheError::NotAdded(key))
    }

    /// All cached workloads matching the label selector.
    pub fn list(&self, selector: &Selector) -> Vec<Workload> {
        self.filtered_list(|_| true, selector)
    }

    /// All cached workloads passing `filter` and matching the selector.
    /// Iteration order is unspecified.
    pub fn filtered_list<F>(&self, filter: F, selector: &Selector) -> Vec<Workload>
    where
        F: Fn(&Workload) -> bool,
    {
        let s = self.locked();
        // The filter is expected to pass most workloads; pre-sizing to the
        // total avoids growth churn without wasting much memory.
        let max_size: usize = s.nodes.values().map(|info| info.workloads().len()).sum();
        let mut out = Vec::with_capacity(max_size);
        for info in s.nodes.values() {
            for workload in info.workloads() {
                if filter(workload) && selector.matches(&workload.labels) {
                    out.push(workload.clone());
                }
            }
        }
        out
    }

    /// Deep copy of nodes, assumed keys, and budgets, taken atomically.
    /// Expensive; not for the scheduling hot path.
    pub fn snapshot(&self) -> Snapshot {
        let s = self.locked();
        Snapshot {
            nodes: s.nodes.clone(),
            assumed: s.assumed.clone(),
            budgets: s.budgets.clone(),
        }
    }

    /// Incrementally reconcile a caller-owned node map with the cache:
    /// entries at the current generation are left alone, changed entries
    /// are re-cloned, entries gone from the cache are dropped. Lets the
    /// scheduler reuse prior-cycle clones.
    pub fn update_node_info_map(&self, map: &mut HashMap<String, NodeInfo>) {
        let mut s = self.locked();
        let reset_transient = s.config.transient_node_info;
        for (name, info) in s.nodes.iter_mut() {
            if reset_transient {
                if let Some(transient) = info.transient_mut() {
                    transient.reset();
                }
            }
            let stale = map
                .get(name)
                .map_or(true, |current| current.generation() != info.generation());
            if stale {
                map.insert(name.clone(), info.clone());
            }
        }
        map.retain(|name, _| s.nodes.contains_key(name));
    }

    /// Whether a caller-held clone still matches the cache's generation
    /// for that node.
    pub fn is_up_to_date(&self, info: &NodeInfo) -> bool {
        let s = self.locked();
        let Some(node) = info.node() else {
            return false;
        };
        s.nodes
            .get(&node.name)
            .is_some_and(|current| current.generation() == info.generation())
    }

    // ── Node descriptor lifecycle ──────────────────────────────────

    pub fn add_node(&self, node: &Node) {
        let mut s = self.locked();
        s.nodes.entry(node.name.clone()).or_default().set_node(node);
    }

    pub fn update_node(&self, _old: &Node, new: &Node) {
        let mut s = self.locked();
        s.nodes.entry(new.name.clone()).or_default().set_node(new);
    }

    /// Clear the node descriptor. The NodeInfo itself is only dropped
    /// once no workloads are accounted to it — workload events arrive on
    /// a different watch and may still be observed after node removal.
    pub fn remove_node(&self, node: &Node) -> CacheResult<()> {
        let mut s = self.locked();
        let Some(info) = s.nodes.get_mut(&node.name) else {
            return Err(CacheError::UnknownNode(node.name.clone()));
        };
        info.remove_node();
        if info.workloads().is_empty() && info.node().is_none() {
            s.nodes.remove(&node.name);
        }
        Ok(())
    }

    // ── Disruption budgets ─────────────────────────────────────────

    pub fn add_budget(&self, budget: &DisruptionBudget) {
        let mut s = self.locked();
        s.budgets.insert(budget.id.clone(), budget.clone());
    }

    /// The registry holds only the current snapshot; an update is an add.
    pub fn update_budget(&self, _old: &DisruptionBudget, new: &DisruptionBudget) {
        self.add_budget(new);
    }

    pub fn remove_budget(&self, budget: &DisruptionBudget) {
        let mut s = self.locked();
        s.budgets.remove(&budget.id);
    }

    /// All budgets whose own labels match the selector.
    pub fn list_budgets(&self, selector: &Selector) -> Vec<DisruptionBudget> {
        let s = self.locked();
        s.budgets
            .values()
            .filter(|budget| selector.matches(&budget.labels))
            .cloned()
            .collect()
    }
}

impl CacheState {
    /// Account the workload to its node, creating the NodeInfo on first
    /// reference. Lock already held.
    pub(crate) fn add_to_node(&mut self, workload: &Workload) {
        self.nodes
            .entry(workload.node_name.clone())
            .or_default()
            .add_workload(workload);
    }

    /// Release the workload from its node, dropping the NodeInfo once it
    /// holds nothing. Lock already held.
    pub(crate) fn remove_from_node(&mut self, workload: &Workload) -> CacheResult<()> {
        let Some(info) = self.nodes.get_mut(&workload.node_name) else {
            return Err(CacheError::UnknownNode(workload.node_name.clone()));
        };
        info.remove_workload(workload)?;
        if info.workloads().is_empty() && info.node().is_none() {
            self.nodes.remove(&workload.node_name);
        }
        Ok(())
    }

    /// Confirmed-update path: release the old accounting, run the resize
    /// engine if it applies, account the new object. A resize error does
    /// not skip the re-accounting.
    pub(crate) fn update_locked(&mut self, old: &Workload, new: &mut Workload) -> CacheResult<()> {
        self.remove_from_node(old)?;
        let mut result = Ok(());
        if self.config.vertical_resize
            && old.phase == WorkloadPhase::Running
            && new.phase == WorkloadPhase::Running
            && new.deletion_timestamp.is_none()
            && new.resize.is_some()
        {
            result = self.process_resize(old, new);
        }
        self.add_to_node(new);
        if let Some(state) = self.workload_states.get_mut(&old.key()) {
            state.workload = new.clone();
        }
        result
    }

    /// One reaper pass: evict every assumed workload whose binding has
    /// finished and whose deadline has passed. Lock already held.
    pub(crate) fn cleanup_assumed(&mut self, now: Instant) {
        // The assumed set stays small.
        let keys: Vec<WorkloadKey> = self.assumed.iter().cloned().collect();
        for key in keys {
            let Some(state) = self.workload_states.get(&key) else {
                error!(workload = %key, "key found in assumed set but missing from workload states");
                panic!("assumed workload {key} has no state entry; the cache is corrupted");
            };
            if !state.binding_finished {
                debug!(workload = %key, "not expiring assumed workload, binding still in progress");
                continue;
            }
            let deadline = state
                .deadline
                .unwrap_or_else(|| panic!("assumed workload {key} finished binding without a deadline"));
            if now > deadline {
                warn!(workload = %key, "assumed workload expired without confirmation");
                let workload = state.workload.clone();
                if let Err(err) = self.expire(&key, &workload) {
                    error!(workload = %key, error = %err, "failed to expire assumed workload");
                }
            }
        }
    }

    fn expire(&mut self, key: &WorkloadKey, workload: &Workload) -> CacheResult<()> {
        self.remove_from_node(workload)?;
        self.assumed.remove(key);
        self.workload_states.remove(key);
        Ok(())
    }
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    // A poisoning panic means an invariant violation was already hit;
    // refuse to keep scheduling on top of it.
    state.lock().expect("cache mutex poisoned")
}
