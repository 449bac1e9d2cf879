//! The build graph: target storage, closure traversal, topological
//! sorting, and derivation-chain queries.

use std::collections::VecDeque;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::target::{Target, TargetId};
use crate::{GraphError, Result};

/// Configuration for closure traversals, forwarded verbatim by callers
/// that resolve dependencies on behalf of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureConfig {
    /// Whether the root targets themselves appear in the result.
    pub include_roots: bool,
    /// Upper bound on traversal depth. `None` means unbounded; graphs
    /// handed to this crate are finite, so the bound exists to cap path
    /// explosion in very deep graphs, not for correctness.
    pub max_depth: Option<usize>,
}

impl Default for ClosureConfig {
    fn default() -> Self {
        Self {
            include_roots: true,
            max_depth: None,
        }
    }
}

/// The build dependency graph. Immutable after construction.
///
/// Node order is insertion order, which keeps every traversal in this
/// crate deterministic for a deterministically constructed graph.
#[derive(Debug, Default)]
pub struct BuildGraph {
    targets: IndexMap<TargetId, Target>,
}

impl BuildGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a target. Fails if the id is already present.
    pub fn insert(&mut self, target: Target) -> Result<()> {
        if self.targets.contains_key(&target.id) {
            return Err(GraphError::DuplicateTarget(target.id));
        }
        self.targets.insert(target.id.clone(), target);
        Ok(())
    }

    /// Look up a target by id.
    pub fn target(&self, id: &TargetId) -> Result<&Target> {
        self.targets
            .get(id)
            .ok_or_else(|| GraphError::UnknownTarget(id.clone()))
    }

    /// True if the graph contains the given id.
    pub fn contains(&self, id: &TargetId) -> bool {
        self.targets.contains_key(id)
    }

    /// All target ids, in insertion order.
    pub fn target_ids(&self) -> impl Iterator<Item = &TargetId> {
        self.targets.keys()
    }

    /// Number of targets in the graph.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True if the graph holds no targets.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Breadth-first transitive closure of `roots`.
    ///
    /// Visit order is deterministic: roots in the given order, then
    /// their dependencies in declaration order, level by level. Each
    /// target appears at most once.
    pub fn closure(&self, roots: &[TargetId], config: &ClosureConfig) -> Result<Vec<TargetId>> {
        let mut out = Vec::new();
        let mut seen: FxHashSet<TargetId> = FxHashSet::default();
        let mut queue: VecDeque<(TargetId, usize)> = VecDeque::new();

        for root in roots {
            // Unknown roots fail fast rather than silently vanishing.
            self.target(root)?;
            if seen.insert(root.clone()) {
                queue.push_back((root.clone(), 0));
            }
        }

        while let Some((id, depth)) = queue.pop_front() {
            if depth > 0 || config.include_roots {
                out.push(id.clone());
            }
            if let Some(max) = config.max_depth {
                if depth >= max {
                    continue;
                }
            }
            for dep in &self.target(&id)?.dependencies {
                if seen.insert(dep.clone()) {
                    queue.push_back((dep.clone(), depth + 1));
                }
            }
        }

        Ok(out)
    }

    /// Topologically sort the transitive closure of `roots`, most
    /// dependent first.
    ///
    /// Iterating the result in reverse visits every dependency before
    /// any of its dependents, which is the order accumulation passes
    /// want. A dependency cycle is an error.
    pub fn sort_targets(&self, roots: &[TargetId]) -> Result<Vec<TargetId>> {
        let members = self.closure(roots, &ClosureConfig::default())?;
        let member_set: FxHashSet<&TargetId> = members.iter().collect();

        // Kahn's algorithm over the dependency edges restricted to the
        // closure. in_degree counts unprocessed dependencies; a node is
        // emitted once all of its dependencies have been emitted, and
        // the final list is reversed to put dependents first.
        let mut in_degree: IndexMap<&TargetId, usize> = IndexMap::new();
        let mut dependents: IndexMap<&TargetId, Vec<&TargetId>> = IndexMap::new();
        for id in &members {
            in_degree.entry(id).or_insert(0);
            for dep in &self.target(id)?.dependencies {
                if !member_set.contains(dep) {
                    continue;
                }
                *in_degree.entry(id).or_insert(0) += 1;
                dependents.entry(dep).or_default().push(id);
            }
        }

        let mut ready: VecDeque<&TargetId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut sorted: Vec<TargetId> = Vec::with_capacity(members.len());

        while let Some(id) = ready.pop_front() {
            sorted.push(id.clone());
            for dependent in dependents.get(id).into_iter().flatten() {
                let degree = in_degree
                    .get_mut(*dependent)
                    .ok_or_else(|| GraphError::UnknownTarget((*dependent).clone()))?;
                *degree -= 1;
                if *degree == 0 {
                    ready.push_back(*dependent);
                }
            }
        }

        if sorted.len() != members.len() {
            // Some node never reached in-degree zero; name one of them.
            let stuck = in_degree
                .iter()
                .find(|(_, degree)| **degree > 0)
                .map(|(id, _)| (*id).clone());
            if let Some(stuck) = stuck {
                return Err(GraphError::DependencyCycle(stuck));
            }
        }

        sorted.reverse();
        Ok(sorted)
    }

    /// The derivation ancestry of a target: its `derived_from` target,
    /// that target's origin, and so on, nearest first. Empty for a
    /// target that was not generated.
    ///
    /// Derivation is required to be acyclic by the graph's own
    /// invariants; the walk is visited-set guarded anyway, and a cycle
    /// is reported as [`GraphError::DerivationCycle`] rather than
    /// looping.
    pub fn derived_from_chain(&self, id: &TargetId) -> Result<Vec<TargetId>> {
        let mut chain = Vec::new();
        let mut visited: FxHashSet<TargetId> = FxHashSet::default();
        visited.insert(id.clone());

        let mut current = self.target(id)?.derived_from.clone();
        while let Some(origin) = current {
            if !visited.insert(origin.clone()) {
                return Err(GraphError::DerivationCycle(origin));
            }
            current = self.target(&origin)?.derived_from.clone();
            chain.push(origin);
        }
        Ok(chain)
    }

    /// The non-generated root of a target's derivation chain, or the
    /// target itself if it was not generated.
    pub fn concrete_derived_from(&self, id: &TargetId) -> Result<TargetId> {
        let chain = self.derived_from_chain(id)?;
        Ok(chain.into_iter().last().unwrap_or_else(|| id.clone()))
    }
}
