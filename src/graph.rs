//! Dependency graph with cycle detection and topological ordering.
//!
//! Nodes are dependency keys; an edge `a -> b` means `a` needs `b` resolved
//! first. Root nodes are keys that were bound explicitly. Traversals are
//! iterative, so deep graphs cannot overflow the stack, and ordered, so
//! the resulting resolution order is deterministic.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use crate::error::{DiError, DiResult};
use crate::key::DependencyKey;

/// The edge at which a traversal found a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleEdge {
    pub from: DependencyKey,
    pub to: DependencyKey,
}

impl CycleEdge {
    pub fn into_error(self) -> DiError {
        DiError::CyclicDependency {
            at: self.to.clone(),
            from: self.from,
            to: self.to,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct DependencyNode {
    depends_on: BTreeSet<DependencyKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Open,
    Closed,
}

#[derive(Debug)]
enum GraphChange {
    NodeCreated(DependencyKey),
    EdgeAdded(DependencyKey, DependencyKey),
    RootMarked(DependencyKey),
}

/// Directed dependency graph over [`DependencyKey`]s.
///
/// # Examples
///
/// ```rust
/// use bindgraph::{DependencyGraph, DependencyKey};
///
/// let service = DependencyKey::named::<()>("service");
/// let store = DependencyKey::named::<()>("store");
///
/// let mut graph = DependencyGraph::new();
/// graph.add_dependency(service.clone(), store.clone(), true);
/// assert!(!graph.has_cycle());
///
/// let order = graph.sorted().unwrap();
/// assert_eq!(&order[..], &[store, service][..]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<DependencyKey, DependencyNode>,
    roots: BTreeSet<DependencyKey>,
    sorted_cache: Option<Rc<[DependencyKey]>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        DependencyGraph::default()
    }

    /// Records that `from` depends on `to`, creating both nodes as needed.
    ///
    /// A self-dependency creates the node but no edge. `is_root` marks
    /// `from` as explicitly bound.
    pub fn add_dependency(&mut self, from: DependencyKey, to: DependencyKey, is_root: bool) {
        let mut journal = Vec::new();
        self.record_dependency(from, to, is_root, &mut journal);
    }

    fn record_dependency(
        &mut self,
        from: DependencyKey,
        to: DependencyKey,
        is_root: bool,
        journal: &mut Vec<GraphChange>,
    ) {
        for key in [&from, &to] {
            if !self.nodes.contains_key(key) {
                self.nodes.insert(key.clone(), DependencyNode::default());
                journal.push(GraphChange::NodeCreated(key.clone()));
            }
        }

        if from != to {
            let inserted = self
                .nodes
                .get_mut(&from)
                .map_or(false, |node| node.depends_on.insert(to.clone()));
            if inserted {
                journal.push(GraphChange::EdgeAdded(from.clone(), to));
            }
        }

        if is_root && self.roots.insert(from.clone()) {
            journal.push(GraphChange::RootMarked(from));
        }

        self.sorted_cache = None;
    }

    fn rollback(&mut self, journal: Vec<GraphChange>) {
        for change in journal.into_iter().rev() {
            match change {
                GraphChange::NodeCreated(key) => {
                    self.nodes.remove(&key);
                }
                GraphChange::EdgeAdded(from, to) => {
                    if let Some(node) = self.nodes.get_mut(&from) {
                        node.depends_on.remove(&to);
                    }
                }
                GraphChange::RootMarked(key) => {
                    self.roots.remove(&key);
                }
            }
        }
        self.sorted_cache = None;
    }

    /// Starts a group of additions that is undone unless committed.
    pub fn transaction(&mut self) -> GraphTransaction<'_> {
        GraphTransaction {
            graph: self,
            journal: Vec::new(),
            committed: false,
        }
    }

    /// Removes the edge `from -> to` and drops either node once nothing
    /// depends on it and it is not a root.
    pub fn remove_dependency(&mut self, from: &DependencyKey, to: &DependencyKey) {
        if let Some(node) = self.nodes.get_mut(from) {
            node.depends_on.remove(to);
        }
        self.prune(from);
        self.prune(to);
        self.sorted_cache = None;
    }

    /// Clears the explicitly-bound mark of `key`.
    pub fn unmark_root(&mut self, key: &DependencyKey) {
        self.roots.remove(key);
        self.prune(key);
        self.sorted_cache = None;
    }

    /// Drops `key` if it is unreferenced and not a root, then the
    /// dependencies that leaves unreferenced in turn.
    fn prune(&mut self, key: &DependencyKey) {
        let mut pending = vec![key.clone()];
        while let Some(key) = pending.pop() {
            let referenced = self.roots.contains(&key)
                || self.nodes.values().any(|node| node.depends_on.contains(&key));
            if referenced {
                continue;
            }
            if let Some(node) = self.nodes.remove(&key) {
                pending.extend(node.depends_on);
            }
        }
    }

    pub fn contains(&self, key: &DependencyKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn is_root(&self, key: &DependencyKey) -> bool {
        self.roots.contains(key)
    }

    pub fn roots(&self) -> impl Iterator<Item = &DependencyKey> + '_ {
        self.roots.iter()
    }

    /// Direct dependencies of `key`; empty for unknown keys.
    pub fn dependencies_of(&self, key: &DependencyKey) -> impl Iterator<Item = &DependencyKey> + '_ {
        self.nodes
            .get(key)
            .into_iter()
            .flat_map(|node| node.depends_on.iter())
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.sorted_cache = None;
    }

    /// The edge closing a cycle, if the graph has one.
    pub fn find_cycle(&self) -> Option<CycleEdge> {
        self.walk(|_| {}).err()
    }

    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// All nodes, every dependency before its dependents.
    ///
    /// The order is cached until the next mutation.
    pub fn sorted(&mut self) -> DiResult<Rc<[DependencyKey]>> {
        if let Some(cached) = &self.sorted_cache {
            return Ok(cached.clone());
        }

        let mut order = Vec::with_capacity(self.nodes.len());
        self.walk(|key| order.push(key.clone()))
            .map_err(CycleEdge::into_error)?;

        let order: Rc<[DependencyKey]> = order.into();
        self.sorted_cache = Some(order.clone());
        Ok(order)
    }

    /// Depth-first post-order over roots first, then every other node.
    /// `on_closed` sees each node once, after all its dependencies.
    fn walk<F>(&self, mut on_closed: F) -> Result<(), CycleEdge>
    where
        F: FnMut(&DependencyKey),
    {
        let mut states: HashMap<&DependencyKey, NodeState> = HashMap::with_capacity(self.nodes.len());

        for start in self.roots.iter().chain(self.nodes.keys()) {
            if states.contains_key(start) {
                continue;
            }
            let node = match self.nodes.get(start) {
                Some(node) => node,
                None => continue,
            };

            states.insert(start, NodeState::Open);
            let mut stack = vec![(start, node.depends_on.iter())];

            loop {
                let next = match stack.last_mut() {
                    Some((_, successors)) => successors.next(),
                    None => break,
                };

                match next {
                    Some(child) => match states.get(child) {
                        None => {
                            states.insert(child, NodeState::Open);
                            match self.nodes.get(child) {
                                Some(child_node) => stack.push((child, child_node.depends_on.iter())),
                                None => {
                                    states.insert(child, NodeState::Closed);
                                    on_closed(child);
                                }
                            }
                        }
                        Some(NodeState::Open) => {
                            let from = stack.last().map_or(child, |(parent, _)| *parent);
                            return Err(CycleEdge {
                                from: from.clone(),
                                to: child.clone(),
                            });
                        }
                        Some(NodeState::Closed) => {}
                    },
                    None => {
                        if let Some((key, _)) = stack.pop() {
                            states.insert(key, NodeState::Closed);
                            on_closed(key);
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// Additions to a [`DependencyGraph`] that are rolled back on drop unless
/// [`commit`](GraphTransaction::commit) is called.
///
/// ```rust
/// use bindgraph::{DependencyGraph, DependencyKey, DiError};
///
/// let a = DependencyKey::named::<()>("a");
/// let b = DependencyKey::named::<()>("b");
///
/// let mut graph = DependencyGraph::new();
/// graph.add_dependency(a.clone(), b.clone(), true);
/// {
///     let mut tx = graph.transaction();
///     let err = tx.add_dependency(b.clone(), a.clone(), true).unwrap_err();
///     assert!(matches!(err, DiError::CyclicDependency { .. }));
/// }
/// assert!(!graph.has_cycle());
/// assert!(!graph.is_root(&b));
/// ```
pub struct GraphTransaction<'g> {
    graph: &'g mut DependencyGraph,
    journal: Vec<GraphChange>,
    committed: bool,
}

impl GraphTransaction<'_> {
    /// Adds the edge and fails if it closes a cycle. The failed edge stays
    /// journaled, so dropping the transaction removes it with the rest.
    pub fn add_dependency(
        &mut self,
        from: DependencyKey,
        to: DependencyKey,
        is_root: bool,
    ) -> DiResult<()> {
        self.graph
            .record_dependency(from.clone(), to.clone(), is_root, &mut self.journal);
        match self.graph.find_cycle() {
            Some(cycle) => Err(DiError::CyclicDependency {
                from,
                to,
                at: cycle.to,
            }),
            None => Ok(()),
        }
    }

    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for GraphTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let journal = std::mem::take(&mut self.journal);
            self.graph.rollback(journal);
        }
    }
}
