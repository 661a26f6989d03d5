//! Tierline - Deterministic auto-layout for single-line diagrams.
//!
//! Given the symbols of a single-line diagram (buses, branches, sources,
//! generators and loads), Tierline places every symbol on a grid so that
//! power flows top to bottom, no two symbols sit closer than a configured
//! clearance, and the same input always produces the same output no matter
//! the order the symbols arrive in.
//!
//! The pipeline is:
//!
//! ```text
//! symbols ─► graph ─► tiers ─► placement ─► collision resolver ─► positions
//!              │
//!              └────► topology hash
//! ```
//!
//! Every function here is pure: inputs are borrowed, outputs are freshly
//! allocated, and nothing is cached between calls.

pub mod collision;
pub mod config;
pub mod graph;
pub mod placement;
pub mod tiers;
pub mod topology;

mod error;

pub use tierline_core::{geometry, identifier, symbol};

pub use collision::{
    CollisionPair, CollisionReport, ResolvedPositions, detect_symbol_collisions,
    resolve_symbol_collisions, validate_manual_position,
};
pub use error::LayoutError;
pub use topology::{TopologyHash, compute_topology_hash};

use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::Serialize;

use tierline_core::{
    geometry::{Bounds, Point},
    identifier::Id,
    symbol::Symbol,
};

use config::GeometryConfig;
use graph::ConnectivityGraph;
use placement::Placer;
use tiers::TierAssignment;

/// Output of [`compute_topological_layout`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    positions: BTreeMap<Id, Point>,
    tiers: BTreeMap<Id, u32>,
    collision_report: CollisionReport,
}

impl LayoutResult {
    /// Grid-aligned centre of every symbol, keyed by symbol id.
    pub fn positions(&self) -> &BTreeMap<Id, Point> {
        &self.positions
    }

    /// Tier of every symbol. Tier 0 is the top row.
    pub fn tiers(&self) -> &BTreeMap<Id, u32> {
        &self.tiers
    }

    /// Collisions left in [`positions`](Self::positions) at the configured
    /// clearance. Empty on every successful layout.
    pub fn collision_report(&self) -> &CollisionReport {
        &self.collision_report
    }

    pub fn into_positions(self) -> BTreeMap<Id, Point> {
        self.positions
    }
}

/// Lays out `symbols` top-down by power flow.
///
/// Builds the connectivity graph, assigns tiers, places each row, resolves
/// any remaining collisions at `symbol_clearance` and reports what is left.
/// Grid and spacing come from `config`; it is never modified.
///
/// # Examples
///
/// ```
/// # use tierline::{compute_topological_layout, config::GeometryConfig};
/// # use tierline_core::symbol::Symbol;
/// let symbols = vec![
///     Symbol::load("load-1", "e3", "bus-1"),
///     Symbol::source("src-1", "e1", "bus-1"),
///     Symbol::bus("bus-1", "e2"),
/// ];
///
/// let layout = compute_topological_layout(&symbols, &GeometryConfig::default());
/// let positions = layout.positions();
///
/// assert!(positions["src-1"].y() < positions["bus-1"].y());
/// assert!(positions["bus-1"].y() < positions["load-1"].y());
/// assert!(!layout.collision_report().has_collisions());
/// ```
pub fn compute_topological_layout(symbols: &[Symbol], config: &GeometryConfig) -> LayoutResult {
    info!(symbols = symbols.len(); "Computing topological layout");

    let graph = ConnectivityGraph::build(symbols);
    let tiers = TierAssignment::assign(&graph);
    let placed = Placer::new(config).place(&graph, &tiers);

    let resolved = resolve_symbol_collisions(symbols, &placed, config.symbol_clearance(), config);
    if !resolved.moved().is_empty() {
        debug!(moved = resolved.moved().len(); "Placement needed collision resolution");
    }
    let positions = resolved.into_resolved();

    let collision_report =
        detect_symbol_collisions(symbols, &positions, config.symbol_clearance(), config);
    if collision_report.has_collisions() {
        warn!(
            pairs = collision_report.pairs().len();
            "Layout finished with residual collisions"
        );
    }

    info!(
        symbols = positions.len(),
        tiers = tiers.tier_count(),
        ignored_edges = tiers.ignored_edges().len();
        "Layout computed"
    );

    LayoutResult {
        positions,
        tiers: tiers.to_map(&graph),
        collision_report,
    }
}

/// Checks that layout of `symbols` is reproducible.
///
/// Runs the layout twice on the given order and once on the reversed order
/// and returns `true` when all three agree.
pub fn verify_determinism(symbols: &[Symbol], config: &GeometryConfig) -> bool {
    let first = compute_topological_layout(symbols, config);
    let second = compute_topological_layout(symbols, config);

    let reversed: Vec<Symbol> = symbols.iter().rev().cloned().collect();
    let third = compute_topological_layout(&reversed, config);

    let deterministic = first == second && first == third;
    if !deterministic {
        warn!(symbols = symbols.len(); "Layout is not deterministic");
    }
    deterministic
}

/// Returns the rectangle covering every positioned symbol, or `None` when
/// no symbol has a position.
///
/// Symbols are sized the way the collision detector sizes them. Symbols
/// missing from `positions` are skipped.
pub fn diagram_extent(
    symbols: &[Symbol],
    positions: &BTreeMap<Id, Point>,
    config: &GeometryConfig,
) -> Option<Bounds> {
    let graph = ConnectivityGraph::build(symbols);
    graph
        .symbols()
        .filter_map(|symbol| {
            positions
                .get(symbol.id())
                .map(|&center| center.to_bounds(config.symbol_size(symbol)))
        })
        .reduce(|extent, bounds| extent.merge(&bounds))
}

/// Layout entry points bound to one [`GeometryConfig`].
///
/// # Examples
///
/// ```
/// use tierline::{LayoutEngine, config::GeometryConfig};
/// use tierline_core::symbol::Symbol;
///
/// let engine = LayoutEngine::new(GeometryConfig::default().with_grid_size(20));
/// let symbols = vec![
///     Symbol::bus("bus-1", "e1"),
///     Symbol::generator("gen-1", "e2", "bus-1"),
/// ];
///
/// let layout = engine.layout(&symbols);
/// assert!(layout.positions().values().all(|p| p.is_on_grid(20)));
/// assert!(engine.verify_determinism(&symbols));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: GeometryConfig,
}

impl LayoutEngine {
    pub fn new(config: GeometryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    /// See [`compute_topological_layout`].
    pub fn layout(&self, symbols: &[Symbol]) -> LayoutResult {
        compute_topological_layout(symbols, &self.config)
    }

    /// See [`detect_symbol_collisions`].
    pub fn detect_collisions(
        &self,
        symbols: &[Symbol],
        positions: &BTreeMap<Id, Point>,
        clearance: i32,
    ) -> CollisionReport {
        detect_symbol_collisions(symbols, positions, clearance, &self.config)
    }

    /// See [`resolve_symbol_collisions`].
    pub fn resolve_collisions(
        &self,
        symbols: &[Symbol],
        positions: &BTreeMap<Id, Point>,
        min_offset: i32,
    ) -> ResolvedPositions {
        resolve_symbol_collisions(symbols, positions, min_offset, &self.config)
    }

    /// See [`validate_manual_position`].
    pub fn validate_manual_position(
        &self,
        symbols: &[Symbol],
        positions: &BTreeMap<Id, Point>,
        id: &str,
        proposed: Point,
    ) -> Vec<Id> {
        validate_manual_position(symbols, positions, id, proposed, &self.config)
    }

    /// See [`diagram_extent`].
    pub fn extent(&self, symbols: &[Symbol], positions: &BTreeMap<Id, Point>) -> Option<Bounds> {
        diagram_extent(symbols, positions, &self.config)
    }

    /// See [`compute_topology_hash`].
    ///
    /// Bus width and height are not hashed. A caller that skips relayout
    /// while the hash is unchanged must still compare sizes itself, since a
    /// resized bus can need new positions under the same hash.
    pub fn topology_hash(&self, symbols: &[Symbol]) -> TopologyHash {
        compute_topology_hash(symbols)
    }

    /// See [`verify_determinism`].
    pub fn verify_determinism(&self, symbols: &[Symbol]) -> bool {
        verify_determinism(symbols, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use tierline_core::geometry::Size;

    use super::*;

    #[test]
    fn test_empty_input() {
        let layout = compute_topological_layout(&[], &GeometryConfig::default());
        assert!(layout.positions().is_empty());
        assert!(layout.tiers().is_empty());
        assert!(!layout.collision_report().has_collisions());
        assert!(verify_determinism(&[], &GeometryConfig::default()));
    }

    #[test]
    fn test_dangling_references_still_lay_out() {
        let symbols = vec![
            Symbol::load("load-1", "e1", "nowhere"),
            Symbol::line("line-1", "e2", "ghost-a", "ghost-b"),
        ];
        let layout = compute_topological_layout(&symbols, &GeometryConfig::default());

        assert_eq!(layout.positions().len(), 2);
        assert_eq!(layout.tiers()["load-1"], 0);
        assert_eq!(layout.tiers()["line-1"], 0);
        assert!(!layout.collision_report().has_collisions());
    }

    #[test]
    fn test_duplicate_ids_get_one_position() {
        let symbols = vec![
            Symbol::bus("bus-1", "e1"),
            Symbol::bus("bus-1", "e1"),
            Symbol::load("load-1", "e2", "bus-1"),
        ];
        let layout = compute_topological_layout(&symbols, &GeometryConfig::default());
        assert_eq!(layout.positions().len(), 2);
    }

    #[test]
    fn test_layout_result_serializes_camel_case() {
        let symbols = vec![Symbol::bus("bus-1", "e1")];
        let layout = compute_topological_layout(&symbols, &GeometryConfig::default());
        let json = serde_json::to_value(&layout).unwrap();

        assert_eq!(json["positions"]["bus-1"]["x"], 100);
        assert_eq!(json["tiers"]["bus-1"], 0);
        assert_eq!(json["collisionReport"]["hasCollisions"], false);
    }

    #[test]
    fn test_extent_covers_every_symbol() {
        let config = GeometryConfig::default();
        let symbols = vec![
            Symbol::source("src-1", "e1", "bus-1"),
            Symbol::bus("bus-1", "e2"),
            Symbol::load("load-1", "e3", "bus-1"),
            Symbol::load("load-2", "e4", "bus-1"),
        ];
        let layout = compute_topological_layout(&symbols, &config);
        let extent = diagram_extent(&symbols, layout.positions(), &config).unwrap();

        for symbol in &symbols {
            let bounds = layout.positions()[symbol.id()].to_bounds(config.symbol_size(symbol));
            assert!(extent.min_x() <= bounds.min_x());
            assert!(extent.min_y() <= bounds.min_y());
            assert!(extent.max_x() >= bounds.max_x());
            assert!(extent.max_y() >= bounds.max_y());
        }
        let src = layout.positions()["src-1"].to_bounds(config.symbol_size(&symbols[0]));
        assert_eq!(extent.min_y(), src.min_y());
    }

    #[test]
    fn test_extent_of_single_symbol_is_its_bounds() {
        let config = GeometryConfig::default();
        let bus = Symbol::bus("bus-1", "e1");
        let symbols = vec![bus.clone()];
        let layout = compute_topological_layout(&symbols, &config);

        assert_eq!(
            diagram_extent(&symbols, layout.positions(), &config),
            Some(layout.positions()["bus-1"].to_bounds(config.symbol_size(&bus)))
        );
        assert_eq!(diagram_extent(&symbols, &BTreeMap::new(), &config), None);
    }

    #[test]
    fn test_resized_bus_keeps_hash_but_not_extent() {
        let engine = LayoutEngine::default();
        let narrow = vec![Symbol::bus("bus-1", "e1").with_size(Size::new(120, 20))];
        let wide = vec![Symbol::bus("bus-1", "e1").with_size(Size::new(480, 20))];

        assert_eq!(engine.topology_hash(&narrow), engine.topology_hash(&wide));

        let narrow_extent = engine.extent(&narrow, engine.layout(&narrow).positions());
        let wide_extent = engine.extent(&wide, engine.layout(&wide).positions());
        assert_eq!(narrow_extent.map(Bounds::width), Some(120));
        assert_eq!(wide_extent.map(Bounds::width), Some(480));
    }

    #[test]
    fn test_engine_matches_free_functions() {
        let config = GeometryConfig::default().with_tier_spacing(200);
        let engine = LayoutEngine::new(config);
        let symbols = vec![
            Symbol::source("src-1", "e1", "bus-1"),
            Symbol::bus("bus-1", "e2"),
        ];

        assert_eq!(engine.layout(&symbols), compute_topological_layout(&symbols, &config));
        assert_eq!(engine.topology_hash(&symbols), compute_topology_hash(&symbols));
        let layout = engine.layout(&symbols);
        assert_eq!(
            engine.extent(&symbols, layout.positions()),
            diagram_extent(&symbols, layout.positions(), &config)
        );
        assert_eq!(engine.config().tier_spacing(), 200);
    }
}
