//! Initial placement of tiered symbols.
//!
//! Rows are stacked top-down, one per tier. Within a row, symbols are
//! ordered by their *anchor* (the mean x of their already-placed
//! predecessors) and then by id, and packed left to right:
//!
//! ```text
//!   tier 0        [src-1]
//!                    │
//!   tier 1     [====bus-1====]
//!                 │       │
//!   tier 2    [line-1] [line-2]
//! ```
//!
//! Symbols sharing an anchor are centred as a group under it. Packing keeps
//! at least `horizontal_spacing` between neighbours, and row pitch keeps at
//! least `symbol_clearance` between the tallest symbols of adjacent rows.
//! Centres are rounded *up* to the grid so snapping never eats into the
//! spacing.

use std::collections::BTreeMap;

use log::{debug, trace};
use petgraph::graph::NodeIndex;

use tierline_core::{
    geometry::{Point, Size, snap_up_to_grid},
    identifier::Id,
};

use crate::{config::GeometryConfig, graph::ConnectivityGraph, tiers::TierAssignment};

/// Row-by-row horizontal placer.
pub struct Placer<'c> {
    config: &'c GeometryConfig,
}

/// One symbol waiting to be packed into its row.
#[derive(Debug, Clone, Copy)]
struct RowEntry {
    idx: NodeIndex,
    anchor: Option<i32>,
    size: Size,
}

impl<'c> Placer<'c> {
    /// Create a placer for the given geometry
    pub fn new(config: &'c GeometryConfig) -> Self {
        Self { config }
    }

    /// Computes a grid-aligned centre for every node of `graph`.
    pub fn place(
        &self,
        graph: &ConnectivityGraph<'_>,
        tiers: &TierAssignment,
    ) -> BTreeMap<Id, Point> {
        let rows = tiers.rows();
        let sizes: Vec<Size> = graph
            .symbols()
            .map(|symbol| self.config.symbol_size(symbol))
            .collect();

        let row_ys = self.row_offsets(&rows, &sizes);
        let mut centers: Vec<Option<Point>> = vec![None; graph.node_count()];

        for (tier, row) in rows.iter().enumerate() {
            let mut entries: Vec<RowEntry> = row
                .iter()
                .map(|&idx| RowEntry {
                    idx,
                    anchor: self.anchor(graph, tiers, &centers, idx),
                    size: sizes[idx.index()],
                })
                .collect();
            entries.sort_by_key(|entry| (entry.anchor, entry.idx));

            for (idx, x) in self.pack_row(&entries) {
                centers[idx.index()] = Some(Point::new(x, row_ys[tier]));
            }
            trace!(tier, symbols = row.len(), y = row_ys[tier]; "Placed row");
        }

        let positions: BTreeMap<Id, Point> = graph
            .node_indices()
            .filter_map(|idx| {
                centers[idx.index()].map(|center| (graph.symbol_at(idx).id().clone(), center))
            })
            .collect();

        debug!(symbols = positions.len(), rows = rows.len(); "Initial placement computed");
        positions
    }

    /// Vertical centre of every row.
    fn row_offsets(&self, rows: &[Vec<NodeIndex>], sizes: &[Size]) -> Vec<i32> {
        let grid = self.config.grid_size();
        let clearance = self.config.symbol_clearance().max(0);
        let tallest: Vec<i32> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|idx| sizes[idx.index()].height())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut offsets = Vec::with_capacity(rows.len());
        let mut y = snap_up_to_grid(self.config.origin().y(), grid);
        for (tier, height) in tallest.iter().enumerate() {
            if tier > 0 {
                let previous = tallest[tier - 1];
                // Bounds put the odd unit below the centre.
                let needed = (previous - previous / 2) + height / 2 + clearance;
                let pitch = self.config.tier_spacing().max(needed);
                y = y.saturating_add(snap_up_to_grid(pitch, grid));
            }
            offsets.push(y);
        }
        offsets
    }

    /// Mean x of the predecessors already placed on earlier rows.
    fn anchor(
        &self,
        graph: &ConnectivityGraph<'_>,
        tiers: &TierAssignment,
        centers: &[Option<Point>],
        idx: NodeIndex,
    ) -> Option<i32> {
        let own_tier = tiers.tier(idx);
        let xs: Vec<i64> = graph
            .predecessors(idx)
            .into_iter()
            .filter(|&pred| tiers.tier(pred) < own_tier)
            .filter_map(|pred| centers[pred.index()])
            .map(|center| i64::from(center.x()))
            .collect();
        if xs.is_empty() {
            return None;
        }
        let mean = xs.iter().sum::<i64>().div_euclid(xs.len() as i64);
        i32::try_from(mean).ok()
    }

    /// Packs a sorted row, returning the centre x of every entry.
    fn pack_row(&self, entries: &[RowEntry]) -> Vec<(NodeIndex, i32)> {
        let grid = self.config.grid_size();
        let gap = self.config.horizontal_spacing().max(0);
        let mut placed = Vec::with_capacity(entries.len());
        let mut cursor: Option<i32> = None;

        for group in entries.chunk_by(|a, b| a.anchor == b.anchor) {
            let group_width: i32 = group
                .iter()
                .map(|entry| entry.size.width())
                .sum::<i32>()
                .saturating_add(gap.saturating_mul(group.len() as i32 - 1));

            let mut left = match (group[0].anchor, cursor) {
                (Some(anchor), Some(cursor)) => cursor.max(anchor - group_width / 2),
                (Some(anchor), None) => anchor - group_width / 2,
                (None, Some(cursor)) => cursor,
                (None, None) => self.config.origin().x() - group[0].size.width() / 2,
            };

            for entry in group {
                let half = entry.size.width() / 2;
                let center = snap_up_to_grid(left.saturating_add(half), grid);
                placed.push((entry.idx, center));

                let right = center - half + entry.size.width();
                left = right.saturating_add(gap);
            }
            cursor = Some(left);
        }

        placed
    }
}

#[cfg(test)]
mod tests {
    use tierline_core::symbol::Symbol;

    use super::*;

    fn place(symbols: &[Symbol], config: &GeometryConfig) -> BTreeMap<Id, Point> {
        let graph = ConnectivityGraph::build(symbols);
        let tiers = TierAssignment::assign(&graph);
        Placer::new(config).place(&graph, &tiers)
    }

    fn radial_feeder() -> Vec<Symbol> {
        vec![
            Symbol::source("src-1", "e-src-1", "bus-1"),
            Symbol::bus("bus-1", "e-bus-1"),
            Symbol::line("line-1", "e-line-1", "bus-1", "bus-2"),
            Symbol::bus("bus-2", "e-bus-2"),
            Symbol::load("load-1", "e-load-1", "bus-2"),
        ]
    }

    #[test]
    fn test_radial_feeder_is_a_vertical_chain() {
        let config = GeometryConfig::default();
        let positions = place(&radial_feeder(), &config);

        let ys: Vec<i32> = ["src-1", "bus-1", "line-1", "bus-2", "load-1"]
            .iter()
            .map(|id| positions[*id].y())
            .collect();
        assert_eq!(ys, vec![100, 220, 340, 460, 580]);

        for id in ["src-1", "bus-1", "line-1", "bus-2", "load-1"] {
            assert_eq!(positions[id].x(), 100, "{id} should sit under the source");
        }
    }

    #[test]
    fn test_siblings_are_centred_under_parent() {
        let config = GeometryConfig::default();
        let symbols = vec![
            Symbol::bus("bus-1", "e1"),
            Symbol::load("load-a", "e2", "bus-1"),
            Symbol::load("load-b", "e3", "bus-1"),
        ];
        let positions = place(&symbols, &config);

        // Group width 60 + 40 + 60 = 160, centred under x = 100.
        assert_eq!(positions["load-a"], Point::new(50, 220));
        assert_eq!(positions["load-b"], Point::new(150, 220));
    }

    #[test]
    fn test_roots_are_packed_by_id() {
        let config = GeometryConfig::default();
        let symbols = vec![
            Symbol::bus("bus-c", "e1"),
            Symbol::bus("bus-a", "e2"),
            Symbol::bus("bus-b", "e3"),
        ];
        let positions = place(&symbols, &config);

        assert_eq!(positions["bus-a"].x(), 100);
        assert_eq!(positions["bus-b"].x(), 260);
        assert_eq!(positions["bus-c"].x(), 420);
        assert!(positions.values().all(|p| p.y() == 100));
    }

    #[test]
    fn test_wide_bus_pushes_neighbour() {
        let config = GeometryConfig::default();
        let symbols = vec![
            Symbol::bus("bus-a", "e1").with_size(Size::new(400, 20)),
            Symbol::bus("bus-b", "e2"),
        ];
        let positions = place(&symbols, &config);

        // bus-a spans [-100, 300]; bus-b starts after a 40 gap.
        assert_eq!(positions["bus-a"].x(), 100);
        assert_eq!(positions["bus-b"].x(), 400);
    }

    #[test]
    fn test_tall_rows_increase_pitch() {
        let config = GeometryConfig::default();
        let symbols = vec![
            Symbol::bus("bus-1", "e1").with_size(Size::new(120, 300)),
            Symbol::load("load-1", "e2", "bus-1"),
        ];
        let positions = place(&symbols, &config);

        // 150 + 30 + 20 = 200 > 120.
        assert_eq!(positions["load-1"].y() - positions["bus-1"].y(), 200);
    }

    #[test]
    fn test_positions_are_on_grid() {
        let config = GeometryConfig::default()
            .with_grid_size(25)
            .with_origin(Point::new(33, 47));
        let symbols = vec![
            Symbol::bus("bus-1", "e1").with_size(Size::new(133, 17)),
            Symbol::load("load-1", "e2", "bus-1"),
            Symbol::load("load-2", "e3", "bus-1"),
            Symbol::source("src", "e4", "bus-1"),
        ];
        let positions = place(&symbols, &config);
        assert!(positions.values().all(|p| p.is_on_grid(25)));
    }

    #[test]
    fn test_placement_ignores_input_order() {
        let config = GeometryConfig::default();
        let symbols = radial_feeder();
        let mut reversed = symbols.clone();
        reversed.reverse();

        assert_eq!(place(&symbols, &config), place(&reversed, &config));
    }
}
