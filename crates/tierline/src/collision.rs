//! Collision detection and resolution between symbol bounding boxes.
//!
//! Two symbols collide when the gap between their bounding boxes is smaller
//! than a clearance distance, i.e. when one box inflated by the clearance
//! overlaps the other. Touching at exactly the clearance is not a
//! collision.
//!
//! Both entry points take the symbol list (for sizes) and a position map.
//! A symbol missing from the map is measured at its own stored position.
//! When several symbols share an id only the first by content counts, the
//! same rule the graph builder applies.

use std::collections::BTreeMap;

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use tierline_core::{
    geometry::{Bounds, Point, Size, snap_up_to_grid},
    identifier::Id,
    symbol::Symbol,
};

use crate::config::GeometryConfig;

/// Two colliding symbols, with `a < b`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollisionPair {
    a: Id,
    b: Id,
}

impl CollisionPair {
    /// Creates a pair, ordering the two ids.
    pub fn new(first: Id, second: Id) -> Self {
        if first <= second {
            Self {
                a: first,
                b: second,
            }
        } else {
            Self {
                a: second,
                b: first,
            }
        }
    }

    pub fn a(&self) -> &Id {
        &self.a
    }

    pub fn b(&self) -> &Id {
        &self.b
    }
}

/// Result of a collision check. Pairs are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionReport {
    has_collisions: bool,
    pairs: Vec<CollisionPair>,
}

impl CollisionReport {
    fn from_pairs(mut pairs: Vec<CollisionPair>) -> Self {
        pairs.sort();
        pairs.dedup();
        Self {
            has_collisions: !pairs.is_empty(),
            pairs,
        }
    }

    pub fn has_collisions(&self) -> bool {
        self.has_collisions
    }

    pub fn pairs(&self) -> &[CollisionPair] {
        &self.pairs
    }

    /// Returns `true` if `a` and `b` are reported as colliding.
    pub fn contains(&self, a: &str, b: &str) -> bool {
        self.pairs.iter().any(|pair| {
            (pair.a == *a && pair.b == *b) || (pair.a == *b && pair.b == *a)
        })
    }
}

/// Output of [`resolve_symbol_collisions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPositions {
    resolved: BTreeMap<Id, Point>,
    moved: Vec<Id>,
}

impl ResolvedPositions {
    /// Final grid-aligned centre of every symbol.
    pub fn resolved(&self) -> &BTreeMap<Id, Point> {
        &self.resolved
    }

    /// Ids of the symbols that had to be pushed, sorted.
    pub fn moved(&self) -> &[Id] {
        &self.moved
    }

    pub fn into_resolved(self) -> BTreeMap<Id, Point> {
        self.resolved
    }
}

/// A symbol's id, centre and size, ready for box tests.
#[derive(Debug, Clone, Copy)]
struct SymbolBox<'a> {
    id: &'a Id,
    center: Point,
    size: Size,
}

impl SymbolBox<'_> {
    fn bounds(&self) -> Bounds {
        self.center.to_bounds(self.size)
    }
}

/// Collects one box per distinct id, sorted by id.
fn symbol_boxes<'a>(
    symbols: &'a [Symbol],
    positions: &BTreeMap<Id, Point>,
    config: &GeometryConfig,
) -> Vec<SymbolBox<'a>> {
    let mut sorted: Vec<&'a Symbol> = symbols.iter().collect();
    sorted.sort();
    sorted.dedup_by(|later, earlier| later.id() == earlier.id());

    sorted
        .into_iter()
        .map(|symbol| SymbolBox {
            id: symbol.id(),
            center: positions
                .get(symbol.id())
                .copied()
                .unwrap_or_else(|| symbol.position()),
            size: config.symbol_size(symbol),
        })
        .collect()
}

/// Returns `true` when the boxes are closer than `clearance`.
fn collides(a: Bounds, b: Bounds, clearance: i32) -> bool {
    a.inflate(clearance).overlaps(&b)
}

/// Reports every pair of symbols closer than `clearance`.
///
/// A negative clearance is treated as zero, so plain overlaps are always
/// reported.
///
/// # Examples
///
/// ```
/// # use std::collections::BTreeMap;
/// # use tierline::{collision::detect_symbol_collisions, config::GeometryConfig};
/// # use tierline_core::{geometry::Point, identifier::Id, symbol::Symbol};
/// let symbols = vec![
///     Symbol::load("load-1", "e1", "bus-1"),
///     Symbol::load("load-2", "e2", "bus-1"),
/// ];
/// let positions = BTreeMap::from([
///     (Id::new("load-1"), Point::new(100, 100)),
///     (Id::new("load-2"), Point::new(100, 100)),
/// ]);
///
/// let report = detect_symbol_collisions(&symbols, &positions, 20, &GeometryConfig::default());
/// assert!(report.has_collisions());
/// assert!(report.contains("load-1", "load-2"));
/// ```
pub fn detect_symbol_collisions(
    symbols: &[Symbol],
    positions: &BTreeMap<Id, Point>,
    clearance: i32,
    config: &GeometryConfig,
) -> CollisionReport {
    let clearance = clearance.max(0);
    let mut boxes: Vec<(Bounds, &Id)> = symbol_boxes(symbols, positions, config)
        .into_iter()
        .map(|symbol_box| (symbol_box.bounds(), symbol_box.id))
        .collect();
    boxes.sort_by_key(|(bounds, id)| (bounds.min_x(), *id));

    // Sweep along x: once a box starts beyond the inflated right edge of
    // the current one, no later box can collide with it.
    let mut pairs = Vec::new();
    for (i, (bounds, id)) in boxes.iter().enumerate() {
        let reach = bounds.inflate(clearance).max_x();
        for (other_bounds, other_id) in &boxes[i + 1..] {
            if other_bounds.min_x() >= reach {
                break;
            }
            if collides(*bounds, *other_bounds, clearance) {
                pairs.push(CollisionPair::new((*id).clone(), (*other_id).clone()));
            }
        }
    }

    let report = CollisionReport::from_pairs(pairs);
    debug!(
        symbols = boxes.len(),
        clearance,
        collisions = report.pairs.len();
        "Collision detection finished"
    );
    report
}

/// Pushes symbols apart until no two are closer than `min_offset`.
///
/// Every position is first snapped to the grid. Symbols are then handled
/// in lexical id order: each one is compared with all symbols handled
/// before it and, while it collides with any of them, moved right past the
/// furthest colliding box by a multiple of the grid. Vertical positions,
/// and so tiers, are never changed.
///
/// A symbol only ever moves right, so it passes each earlier box at most
/// once. The work is bounded by the square of the symbol count.
///
/// Already separated, grid-aligned input is returned unchanged.
pub fn resolve_symbol_collisions(
    symbols: &[Symbol],
    positions: &BTreeMap<Id, Point>,
    min_offset: i32,
    config: &GeometryConfig,
) -> ResolvedPositions {
    let grid = config.grid_size();
    let gap = min_offset.max(0);
    let mut boxes = symbol_boxes(symbols, positions, config);
    for symbol_box in &mut boxes {
        symbol_box.center = config.snap_point(symbol_box.center);
    }

    let mut moved = Vec::new();
    for i in 0..boxes.len() {
        let (placed, rest) = boxes.split_at_mut(i);
        let current = &mut rest[0];
        let mut shifted = false;

        for _ in 0..=placed.len() {
            let bounds = current.bounds();
            let Some(required_left) = placed
                .iter()
                .map(SymbolBox::bounds)
                .filter(|other| collides(bounds, *other, gap))
                .map(|other| other.max_x().saturating_add(gap))
                .max()
            else {
                break;
            };

            let shift = snap_up_to_grid(required_left.saturating_sub(bounds.min_x()), grid);
            if shift <= 0 {
                break;
            }
            current.center = current.center.add_point(Point::new(shift, 0));
            shifted = true;
            trace!(symbol_id = current.id.as_str(), shift; "Pushed symbol right");
        }

        if shifted {
            moved.push(current.id.clone());
        }
    }

    if !moved.is_empty() {
        info!(moved = moved.len(), min_offset = gap; "Resolved symbol collisions");
    }

    ResolvedPositions {
        resolved: boxes
            .iter()
            .map(|symbol_box| (symbol_box.id.clone(), symbol_box.center))
            .collect(),
        moved,
    }
}

/// Checks a proposed manual position for `id` against every other symbol.
///
/// The proposal is snapped to the grid first, as it would be when
/// committed. Returns the sorted ids of the symbols it would collide with
/// at the configured clearance; an empty list means the move is safe.
pub fn validate_manual_position(
    symbols: &[Symbol],
    positions: &BTreeMap<Id, Point>,
    id: &str,
    proposed: Point,
    config: &GeometryConfig,
) -> Vec<Id> {
    let boxes = symbol_boxes(symbols, positions, config);
    let Some(moving) = boxes.iter().find(|symbol_box| *symbol_box.id == *id) else {
        return Vec::new();
    };

    let bounds = config.snap_point(proposed).to_bounds(moving.size);
    let clearance = config.symbol_clearance().max(0);
    boxes
        .iter()
        .filter(|other| *other.id != *id)
        .filter(|other| collides(bounds, other.bounds(), clearance))
        .map(|other| other.id.clone())
        .collect()
}
