//! Search nodes and the bounded open/closed node stores
//!
//! A [`NodeStore`] keeps at most one node per discrete state. Priorities
//! live in a binary heap whose entries are tagged with the version of the
//! node they were pushed for; superseding a node leaves its old entry in
//! the heap and `pop` skips it lazily.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use ordered_float::OrderedFloat;

use crate::common::{DState, PlanningError, PlanningResult, Pose2D};

/// Hybrid A* search node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    cstate: Pose2D,
    dstate: DState,
    gcost: f64,
    hcost: f64,
    parent: Option<DState>,
    history: Vec<Pose2D>,
}

impl Node {
    /// Root node of a search; it has no parent and an empty history
    pub fn start(cstate: Pose2D, dstate: DState, hcost: f64) -> Self {
        Self {
            cstate,
            dstate,
            gcost: 0.0,
            hcost,
            parent: None,
            history: Vec::new(),
        }
    }

    /// Node reached from `parent` by following the poses in `history`
    pub fn new(
        cstate: Pose2D,
        dstate: DState,
        gcost: f64,
        hcost: f64,
        parent: DState,
        history: Vec<Pose2D>,
    ) -> Self {
        Self {
            cstate,
            dstate,
            gcost,
            hcost,
            parent: Some(parent),
            history,
        }
    }

    pub fn cstate(&self) -> &Pose2D {
        &self.cstate
    }

    pub fn dstate(&self) -> DState {
        self.dstate
    }

    pub fn gcost(&self) -> f64 {
        self.gcost
    }

    pub fn hcost(&self) -> f64 {
        self.hcost
    }

    pub fn fcost(&self) -> f64 {
        self.gcost + self.hcost
    }

    /// Key of the parent node in the closed store
    pub fn parent(&self) -> Option<DState> {
        self.parent
    }

    /// Poses from the parent's cstate to this node's cstate
    pub fn history(&self) -> &[Pose2D] {
        &self.history
    }

    pub fn is_start(&self) -> bool {
        self.parent.is_none()
    }
}

/// Heap entry ordered by (fcost, hcost, insertion order), smallest first
#[derive(Debug)]
struct QueueEntry {
    fcost: OrderedFloat<f64>,
    hcost: OrderedFloat<f64>,
    version: u64,
    key: DState,
}

impl Eq for QueueEntry {}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .fcost
            .cmp(&self.fcost)
            .then_with(|| other.hcost.cmp(&self.hcost))
            .then_with(|| other.version.cmp(&self.version))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Bounded map from discrete state to node with an fcost priority order
#[derive(Debug)]
pub struct NodeStore {
    queue: BinaryHeap<QueueEntry>,
    nodes: HashMap<DState, (Node, u64)>,
    capacity: usize,
    next_version: u64,
    stale_skips: usize,
}

impl NodeStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: BinaryHeap::new(),
            nodes: HashMap::with_capacity(capacity.min(4096)),
            capacity,
            next_version: 0,
            stale_skips: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of distinct discrete states currently stored
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Priority entries popped and discarded because they were superseded
    pub fn stale_skips(&self) -> usize {
        self.stale_skips
    }

    pub fn contains(&self, key: &DState) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn get(&self, key: &DState) -> Option<&Node> {
        self.nodes.get(key).map(|(node, _)| node)
    }

    /// Insert a node. A node whose discrete state is already stored
    /// supersedes the existing one.
    pub fn push(&mut self, node: Node) -> PlanningResult<()> {
        if !self.nodes.contains_key(&node.dstate) && self.nodes.len() >= self.capacity {
            return Err(PlanningError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.insert(node);
        Ok(())
    }

    /// Overwrite the node stored under `key` (decrease-key by supersession)
    pub fn replace(&mut self, key: &DState, node: Node) -> PlanningResult<()> {
        if !self.nodes.contains_key(key) {
            return Err(PlanningError::KeyNotFound(*key));
        }
        if node.dstate != *key {
            self.nodes.remove(key);
        }
        self.insert(node);
        Ok(())
    }

    /// Remove and return the valid node with the lowest fcost
    pub fn pop(&mut self) -> PlanningResult<Node> {
        while let Some(entry) = self.queue.pop() {
            let current = self.nodes.get(&entry.key).map(|(_, version)| *version);
            if current == Some(entry.version) {
                if let Some((node, _)) = self.nodes.remove(&entry.key) {
                    return Ok(node);
                }
            }
            self.stale_skips += 1;
        }
        Err(PlanningError::EmptyStore)
    }

    /// Iterate over stored nodes in arbitrary order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().map(|(node, _)| node)
    }

    fn insert(&mut self, node: Node) {
        let version = self.next_version;
        self.next_version += 1;
        self.queue.push(QueueEntry {
            fcost: OrderedFloat(node.fcost()),
            hcost: OrderedFloat(node.hcost),
            version,
            key: node.dstate,
        });
        self.nodes.insert(node.dstate, (node, version));
    }
}
