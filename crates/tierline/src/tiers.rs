//! Tier assignment (layer assignment of the Sugiyama framework).
//!
//! Every symbol receives a tier: its depth in the power-flow graph. Symbols
//! without predecessors sit on tier 0 and every other symbol sits one tier
//! below its deepest predecessor (longest-path layering).
//!
//! # Cycle breaking
//!
//! Meshed networks and mis-wired branches produce cycles. A cycle always
//! lives inside one strongly connected component, so each component with
//! more than one node is broken on its own:
//!
//! 1. Start a depth-first traversal at the component's smallest id.
//! 2. Visit successors inside the component in lexical id order.
//! 3. An edge that reaches a node still on the traversal stack closes a
//!    cycle; it is ignored for layering.
//!
//! Roots play no part in the choice. Attaching a source, generator or load
//! to a meshed network never moves the cycle break, and the tiers of the
//! existing symbols stay where they were.
//!
//! The remaining edges form a DAG, so layering always terminates and only
//! ever depends on ids and connectivity.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::{debug, info};
use petgraph::graph::NodeIndex;

use tierline_core::identifier::Id;

use crate::graph::ConnectivityGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    OnStack,
    Done,
}

/// Tier of every node of a [`ConnectivityGraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierAssignment {
    tiers: Vec<u32>,
    ignored_edges: Vec<(NodeIndex, NodeIndex)>,
}

impl TierAssignment {
    /// Assigns tiers to every node of `graph`.
    pub fn assign(graph: &ConnectivityGraph<'_>) -> Self {
        let ignored = find_back_edges(graph);
        let tiers = longest_path_layering(graph, &ignored);

        let mut ignored_edges: Vec<_> = ignored.into_iter().collect();
        ignored_edges.sort();

        if !ignored_edges.is_empty() {
            info!(ignored_edges = ignored_edges.len(); "Broke cycles in connectivity graph");
        }

        let assignment = Self {
            tiers,
            ignored_edges,
        };
        debug!(tiers = assignment.tier_count(); "Tiers assigned");
        assignment
    }

    /// Returns the tier of `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not belong to the graph the assignment was made for.
    pub fn tier(&self, idx: NodeIndex) -> u32 {
        self.tiers[idx.index()]
    }

    /// Returns the deepest tier, or `None` for an empty graph.
    pub fn max_tier(&self) -> Option<u32> {
        self.tiers.iter().copied().max()
    }

    /// Returns the number of tiers in use.
    pub fn tier_count(&self) -> usize {
        self.max_tier().map_or(0, |max| max as usize + 1)
    }

    /// Groups nodes per tier; each row is sorted by node index.
    pub fn rows(&self) -> Vec<Vec<NodeIndex>> {
        let mut rows = vec![Vec::new(); self.tier_count()];
        for (i, &tier) in self.tiers.iter().enumerate() {
            rows[tier as usize].push(NodeIndex::new(i));
        }
        rows
    }

    /// Returns the edges ignored to break cycles, sorted.
    pub fn ignored_edges(&self) -> &[(NodeIndex, NodeIndex)] {
        &self.ignored_edges
    }

    /// Returns the tiers keyed by symbol id.
    pub fn to_map(&self, graph: &ConnectivityGraph<'_>) -> BTreeMap<Id, u32> {
        graph
            .node_indices()
            .map(|idx| (graph.symbol_at(idx).id().clone(), self.tier(idx)))
            .collect()
    }
}

/// Iterative depth-first search, one per cyclic component, collecting the
/// edges that close a cycle.
fn find_back_edges(graph: &ConnectivityGraph<'_>) -> HashSet<(NodeIndex, NodeIndex)> {
    let mut state = vec![VisitState::Unvisited; graph.node_count()];
    let mut component_of = vec![None; graph.node_count()];
    let mut back_edges = HashSet::new();

    let components = graph.cyclic_components();
    for (component_id, component) in components.iter().enumerate() {
        for idx in component {
            component_of[idx.index()] = Some(component_id);
        }
    }

    for (component_id, component) in components.iter().enumerate() {
        let inside = |idx: NodeIndex| -> Vec<NodeIndex> {
            graph
                .successors(idx)
                .into_iter()
                .filter(|succ| component_of[succ.index()] == Some(component_id))
                .collect()
        };

        let Some(&start) = component.first() else {
            continue;
        };
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = vec![(start, inside(start), 0)];
        state[start.index()] = VisitState::OnStack;

        while let Some((node, successors, next)) = stack.last_mut() {
            let node = *node;
            let Some(&successor) = successors.get(*next) else {
                state[node.index()] = VisitState::Done;
                stack.pop();
                continue;
            };
            *next += 1;

            match state[successor.index()] {
                VisitState::Unvisited => {
                    state[successor.index()] = VisitState::OnStack;
                    stack.push((successor, inside(successor), 0));
                }
                VisitState::OnStack => {
                    back_edges.insert((node, successor));
                }
                VisitState::Done => {}
            }
        }

        debug!(
            component_size = component.len(),
            start = graph.symbol_at(start).id().as_str();
            "Broke cycles in component"
        );
    }

    back_edges
}

/// Longest-path layering over all edges except `ignored`.
fn longest_path_layering(
    graph: &ConnectivityGraph<'_>,
    ignored: &HashSet<(NodeIndex, NodeIndex)>,
) -> Vec<u32> {
    let count = graph.node_count();
    let mut tiers = vec![0u32; count];
    let mut in_degree = vec![0usize; count];

    let kept_successors: Vec<Vec<NodeIndex>> = graph
        .node_indices()
        .map(|idx| {
            graph
                .successors(idx)
                .into_iter()
                .filter(|&succ| !ignored.contains(&(idx, succ)))
                .collect()
        })
        .collect();

    for successors in &kept_successors {
        for succ in successors {
            in_degree[succ.index()] += 1;
        }
    }

    let mut frontier: BTreeSet<NodeIndex> = graph
        .node_indices()
        .filter(|idx| in_degree[idx.index()] == 0)
        .collect();

    while let Some(node) = frontier.pop_first() {
        let next_tier = tiers[node.index()] + 1;
        for &succ in &kept_successors[node.index()] {
            tiers[succ.index()] = tiers[succ.index()].max(next_tier);
            in_degree[succ.index()] -= 1;
            if in_degree[succ.index()] == 0 {
                frontier.insert(succ);
            }
        }
    }

    tiers
}
