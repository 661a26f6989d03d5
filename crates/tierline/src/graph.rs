//! Connectivity graph construction.
//!
//! Turns a flat, unordered symbol list into a directed graph whose edges
//! follow the direction of power flow:
//!
//! ```text
//!   Source ──► Bus ──► LineBranch ──► Bus ──► Load
//!             (fromNodeId)   (toNodeId)  (connectedToNodeId)
//! ```
//!
//! The builder only reads connectivity fields. Positions, sizes and service
//! state never influence the graph.
//!
//! # Determinism
//!
//! Nodes are inserted in lexical id order, so a [`NodeIndex`] compares the
//! same way as the id it stands for. Every traversal in the engine sorts by
//! node index and therefore never depends on the order of the input slice.
//!
//! # Reference resolution
//!
//! A reference resolves to a bus whose symbol id matches it, or failing
//! that, to the bus whose element id matches it. References that resolve to
//! nothing, or to a symbol that is not a bus, produce no edge; the referencing
//! symbol simply has fewer neighbours.

use std::collections::BTreeMap;

use log::{debug, trace, warn};
use petgraph::{
    Direction,
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};

use tierline_core::{
    identifier::Id,
    symbol::{ReferenceRole, Symbol},
};

/// Directed connectivity graph over a symbol set.
///
/// Node weights borrow the symbols they stand for; edge weights record the
/// reference field that produced the edge.
#[derive(Debug)]
pub struct ConnectivityGraph<'a> {
    graph: DiGraph<&'a Symbol, ReferenceRole>,
    node_indices: BTreeMap<Id, NodeIndex>,
    duplicates: Vec<&'a Symbol>,
    unresolved: usize,
}

impl<'a> ConnectivityGraph<'a> {
    /// Builds the graph for `symbols`.
    ///
    /// Never fails. When several symbols share an id, the one that sorts
    /// first by its full content is kept and the rest are reported by
    /// [`duplicates`](Self::duplicates).
    pub fn build(symbols: &'a [Symbol]) -> Self {
        let mut sorted: Vec<&'a Symbol> = symbols.iter().collect();
        sorted.sort();

        let mut graph = DiGraph::with_capacity(sorted.len(), sorted.len() * 2);
        let mut node_indices = BTreeMap::new();
        let mut duplicates = Vec::new();

        for symbol in sorted {
            if node_indices.contains_key(symbol.id()) {
                warn!(symbol_id = symbol.id().as_str(); "Duplicate symbol id, keeping first by content");
                duplicates.push(symbol);
                continue;
            }
            let idx = graph.add_node(symbol);
            node_indices.insert(symbol.id().clone(), idx);
        }

        let mut buses_by_element: BTreeMap<&'a Id, NodeIndex> = BTreeMap::new();
        for (id, &idx) in &node_indices {
            let symbol = graph[idx];
            if symbol.is_node() {
                buses_by_element.entry(symbol.element_id()).or_insert(idx);
            }
            trace!(symbol_id = id.as_str(), element_type = symbol.element_type().as_str(); "Added graph node");
        }

        let mut unresolved = 0;
        let referencing: Vec<NodeIndex> = graph.node_indices().collect();
        for idx in referencing {
            let symbol = graph[idx];
            for (role, reference) in symbol.references() {
                let target = node_indices
                    .get(reference)
                    .copied()
                    .filter(|&target| graph[target].is_node())
                    .or_else(|| buses_by_element.get(reference).copied());

                let Some(target) = target.filter(|&target| target != idx) else {
                    debug!(
                        symbol_id = symbol.id().as_str(),
                        reference = reference.as_str();
                        "Reference does not resolve to a bus, skipping edge"
                    );
                    unresolved += 1;
                    continue;
                };

                let (source, sink) = if role.flows_from_target() {
                    (target, idx)
                } else {
                    (idx, target)
                };
                if graph.find_edge(source, sink).is_none() {
                    graph.add_edge(source, sink, role);
                }
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            duplicates = duplicates.len(),
            unresolved;
            "Connectivity graph built"
        );

        Self {
            graph,
            node_indices,
            duplicates,
            unresolved,
        }
    }

    /// Returns the number of distinct symbols in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of resolved connections.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the node index of the symbol with `id`.
    pub fn index(&self, id: &str) -> Option<NodeIndex> {
        self.node_indices.get(id).copied()
    }

    /// Returns the symbol stored at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not belong to this graph.
    pub fn symbol_at(&self, idx: NodeIndex) -> &'a Symbol {
        self.graph[idx]
    }

    /// Returns the symbol with `id`, if present.
    pub fn symbol(&self, id: &str) -> Option<&'a Symbol> {
        self.index(id).map(|idx| self.graph[idx])
    }

    /// Iterates over node indices in lexical id order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Iterates over the kept symbols in lexical id order.
    pub fn symbols(&self) -> impl Iterator<Item = &'a Symbol> + '_ {
        self.graph.node_indices().map(|idx| self.graph[idx])
    }

    /// Returns the direct predecessors of `idx`, sorted.
    pub fn predecessors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.sorted_neighbors(idx, Direction::Incoming)
    }

    /// Returns the direct successors of `idx`, sorted.
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.sorted_neighbors(idx, Direction::Outgoing)
    }

    /// Returns the nodes without incoming edges, sorted.
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect()
    }

    /// Returns the strongly connected components with more than one node.
    ///
    /// Each component is sorted and the components are ordered by their
    /// smallest node. These are exactly the node sets that carry cycles.
    pub fn cyclic_components(&self) -> Vec<Vec<NodeIndex>> {
        let mut components: Vec<Vec<NodeIndex>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|mut component| {
                component.sort();
                component
            })
            .collect();
        components.sort();
        components
    }

    /// Returns every edge as `(source id, target id, role)`, sorted.
    pub fn edges(&self) -> Vec<(&'a Id, &'a Id, ReferenceRole)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_references()
            .map(|edge| {
                (
                    self.graph[edge.source()].id(),
                    self.graph[edge.target()].id(),
                    *edge.weight(),
                )
            })
            .collect();
        edges.sort();
        edges
    }

    /// Returns the symbols dropped because their id was already taken.
    pub fn duplicates(&self) -> &[&'a Symbol] {
        &self.duplicates
    }

    /// Returns how many reference fields did not resolve to a bus.
    pub fn unresolved_references(&self) -> usize {
        self.unresolved
    }

    fn sorted_neighbors(&self, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> =
            self.graph.neighbors_directed(idx, direction).collect();
        neighbors.sort();
        neighbors.dedup();
        neighbors
    }
}
