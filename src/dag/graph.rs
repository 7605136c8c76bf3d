//! Dag - name-keyed directed acyclic graph
//!
//! Used for both the raw dependency graph and the structured graph.
//!
//! Performance optimizations:
//! - Arc<str> for zero-cost cloning of node names
//! - FxHashMap for faster hashing (non-crypto, ~2x faster)
//! - SmallVec for stack-allocated small adjacency lists (0-4 items)
//!
//! Iteration is always in insertion order (nodes, then each node's edges),
//! so every traversal and every "first such node" query is deterministic.

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::error::{Result, WeftError};

use super::node::{NodeKind, WorkflowNode};

/// Stack-allocated adjacency: most nodes have 0-4 neighbors
pub type DepVec = SmallVec<[Arc<str>; 4]>;

#[derive(Debug, Clone, Default)]
pub struct Dag {
    nodes: FxHashMap<Arc<str>, WorkflowNode>,
    /// Insertion order
    order: Vec<Arc<str>>,
    /// name -> successor names, in edge insertion order
    successors: FxHashMap<Arc<str>, DepVec>,
    /// name -> predecessor names, in edge insertion order
    predecessors: FxHashMap<Arc<str>, DepVec>,
    edge_count: usize,
}

impl Dag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Option<&WorkflowNode> {
        self.nodes.get(name)
    }

    /// Node names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &Arc<str>> {
        self.order.iter()
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &WorkflowNode> {
        self.order.iter().filter_map(|name| self.nodes.get(name))
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes().filter(move |node| node.kind() == kind)
    }

    /// All edges, grouped by source in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (&Arc<str>, &Arc<str>)> {
        self.order
            .iter()
            .flat_map(move |from| self.successors(from).iter().map(move |to| (from, to)))
    }

    /// Add a vertex. Names are unique; a second node with the same name is an error.
    pub fn add_node(&mut self, node: WorkflowNode) -> Result<Arc<str>> {
        if self.contains(node.name()) {
            return Err(WeftError::DuplicateNode {
                name: node.name().to_string(),
            });
        }
        Ok(self.insert_node(node))
    }

    pub fn remove_node(&mut self, name: &str) -> Option<WorkflowNode> {
        let (key, node) = self.nodes.remove_entry(name)?;
        self.order.retain(|n| n != &key);

        let outgoing = self.successors.remove(&key).unwrap_or_default();
        let incoming = self.predecessors.remove(&key).unwrap_or_default();
        self.edge_count -= outgoing.len() + incoming.len();

        for succ in &outgoing {
            if let Some(preds) = self.predecessors.get_mut(succ) {
                preds.retain(|p| p != &key);
            }
        }
        for pred in &incoming {
            if let Some(succs) = self.successors.get_mut(pred) {
                succs.retain(|s| s != &key);
            }
        }

        Some(node)
    }

    /// Add `from -> to`, refusing any edge that would close a cycle.
    ///
    /// Returns `Ok(false)` when the edge already exists (no parallel edges).
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<bool> {
        let (from_key, to_key) = match (self.key(from), self.key(to)) {
            (Some(f), Some(t)) => (f, t),
            _ => {
                return Err(WeftError::InvariantViolation {
                    reason: format!("edge {from} -> {to} references a node outside the graph"),
                })
            }
        };

        if self.has_edge(from, to) {
            return Ok(false);
        }

        if let Some(path) = self.find_path(to, from) {
            let mut cycle: Vec<&str> = vec![from];
            cycle.extend(path.iter().map(|n| n.as_ref()));
            return Err(WeftError::CycleDetected {
                cycle: cycle.join(" → "),
            });
        }

        self.link(from_key, to_key);
        Ok(true)
    }

    /// Get successors of a node
    #[inline]
    pub fn successors(&self, name: &str) -> &[Arc<str>] {
        static EMPTY: &[Arc<str>] = &[];
        self.successors.get(name).map_or(EMPTY, SmallVec::as_slice)
    }

    /// Get predecessors of a node
    #[inline]
    pub fn predecessors(&self, name: &str) -> &[Arc<str>] {
        static EMPTY: &[Arc<str>] = &[];
        self.predecessors.get(name).map_or(EMPTY, SmallVec::as_slice)
    }

    pub fn in_degree(&self, name: &str) -> usize {
        self.predecessors(name).len()
    }

    pub fn out_degree(&self, name: &str) -> usize {
        self.successors(name).len()
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.successors(from).iter().any(|s| s.as_ref() == to)
    }

    /// Check if there's a path from `from` to `to` (BFS)
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        self.find_path(from, to).is_some()
    }

    /// Nodes with no incoming edges, in insertion order
    pub fn sources(&self) -> impl Iterator<Item = &Arc<str>> {
        self.order.iter().filter(|n| self.in_degree(n) == 0)
    }

    /// Weakly connected components (edges taken as undirected).
    ///
    /// Components are ordered by their first node; members keep insertion order.
    pub fn connected_components(&self) -> Vec<Vec<Arc<str>>> {
        let mut component_of: FxHashMap<&str, usize> = FxHashMap::default();
        let mut count = 0;

        for name in &self.order {
            if component_of.contains_key(name.as_ref()) {
                continue;
            }
            let mut queue: VecDeque<&str> = VecDeque::new();
            component_of.insert(name, count);
            queue.push_back(name);

            while let Some(current) = queue.pop_front() {
                let neighbors = self
                    .successors(current)
                    .iter()
                    .chain(self.predecessors(current));
                for neighbor in neighbors {
                    if !component_of.contains_key(neighbor.as_ref()) {
                        component_of.insert(neighbor, count);
                        queue.push_back(neighbor);
                    }
                }
            }
            count += 1;
        }

        let mut components: Vec<Vec<Arc<str>>> = vec![Vec::new(); count];
        for name in &self.order {
            components[component_of[name.as_ref()]].push(Arc::clone(name));
        }
        components
    }

    /// A new graph holding only `names` and the edges among them
    pub fn induced_subgraph(&self, names: &[Arc<str>]) -> Dag {
        let keep: FxHashSet<&str> = names.iter().map(|n| n.as_ref()).collect();
        let mut sub = Dag::new();

        for name in self.order.iter().filter(|n| keep.contains(n.as_ref())) {
            sub.insert_node(self.nodes[name].clone());
        }
        for name in self.order.iter().filter(|n| keep.contains(n.as_ref())) {
            for succ in self.successors(name) {
                if keep.contains(succ.as_ref()) {
                    sub.link(Arc::clone(name), Arc::clone(succ));
                }
            }
        }

        sub
    }

    /// Pre-order depth-first walk from `root`, successors in edge order.
    ///
    /// Only nodes reachable from `root` are returned.
    pub fn depth_first(&self, root: &str) -> Vec<Arc<str>> {
        let Some(root) = self.key(root) else {
            return Vec::new();
        };

        let mut visited: FxHashSet<Arc<str>> = FxHashSet::default();
        let mut order = vec![Arc::clone(&root)];
        let mut stack: Vec<(Arc<str>, usize)> = vec![(Arc::clone(&root), 0)];
        visited.insert(root);

        loop {
            let next = match stack.last_mut() {
                None => break,
                Some((node, idx)) => {
                    let succs = self.successors(node);
                    if *idx < succs.len() {
                        *idx += 1;
                        Some(Arc::clone(&succs[*idx - 1]))
                    } else {
                        None
                    }
                }
            };

            match next {
                Some(node) => {
                    if visited.insert(Arc::clone(&node)) {
                        order.push(Arc::clone(&node));
                        stack.push((node, 0));
                    }
                }
                None => {
                    stack.pop();
                }
            }
        }

        order
    }

    // ─────────────────────────────────────────────────────────────
    // internals
    // ─────────────────────────────────────────────────────────────

    fn key(&self, name: &str) -> Option<Arc<str>> {
        self.nodes.get_key_value(name).map(|(k, _)| Arc::clone(k))
    }

    fn insert_node(&mut self, node: WorkflowNode) -> Arc<str> {
        let name: Arc<str> = Arc::from(node.name());
        self.order.push(Arc::clone(&name));
        self.successors.insert(Arc::clone(&name), DepVec::new());
        self.predecessors.insert(Arc::clone(&name), DepVec::new());
        self.nodes.insert(Arc::clone(&name), node);
        name
    }

    fn link(&mut self, from: Arc<str>, to: Arc<str>) {
        self.successors
            .entry(Arc::clone(&from))
            .or_default()
            .push(Arc::clone(&to));
        self.predecessors.entry(to).or_default().push(from);
        self.edge_count += 1;
    }

    /// BFS from `from` to `to`, returning the path (both ends included)
    fn find_path(&self, from: &str, to: &str) -> Option<Vec<Arc<str>>> {
        let start = self.key(from)?;
        if from == to {
            return Some(vec![start]);
        }

        let mut parent: FxHashMap<Arc<str>, Arc<str>> = FxHashMap::default();
        let mut visited: FxHashSet<Arc<str>> = FxHashSet::default();
        let mut queue: VecDeque<Arc<str>> = VecDeque::new();

        visited.insert(Arc::clone(&start));
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            for neighbor in self.successors(&current) {
                if !visited.insert(Arc::clone(neighbor)) {
                    continue;
                }
                parent.insert(Arc::clone(neighbor), Arc::clone(&current));
                if neighbor.as_ref() == to {
                    let mut path = vec![Arc::clone(neighbor)];
                    let mut cursor = Arc::clone(neighbor);
                    while let Some(prev) = parent.get(&cursor) {
                        path.push(Arc::clone(prev));
                        cursor = Arc::clone(prev);
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(Arc::clone(neighbor));
            }
        }

        None
    }
}
