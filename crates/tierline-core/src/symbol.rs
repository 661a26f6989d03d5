//! Single-line diagram symbol model.
//!
//! A [`Symbol`] is the diagram-visible placement of one electrical element.
//! The connectivity a symbol carries depends on its kind, so the kinds are a
//! tagged sum type ([`SymbolKind`]) and only the variants that reference
//! other symbols carry reference fields:
//!
//! - Buses are node-bearing and reference nothing.
//! - Branches (lines, transformers, switches) reference a `from` and a `to` bus.
//! - Leaves (sources, generators, loads) reference the bus they connect to.
//!
//! The serialized form uses an `elementType` tag and camelCase field names:
//!
//! ```
//! # use tierline_core::symbol::{ElementType, Symbol};
//! let json = r#"{
//!     "id": "line-1",
//!     "elementId": "el-line-1",
//!     "elementType": "LineBranch",
//!     "fromNodeId": "bus-1",
//!     "toNodeId": "bus-2"
//! }"#;
//!
//! let symbol: Symbol = serde_json::from_str(json).unwrap();
//! assert_eq!(symbol.element_type(), ElementType::LineBranch);
//! assert_eq!(symbol.references().count(), 2);
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    geometry::{Point, Size},
    identifier::Id,
};

/// The closed set of electrical element kinds a symbol can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Bus,
    LineBranch,
    TransformerBranch,
    Switch,
    Source,
    Generator,
    Load,
}

impl ElementType {
    /// All element types, in declaration order.
    pub const ALL: [ElementType; 7] = [
        ElementType::Bus,
        ElementType::LineBranch,
        ElementType::TransformerBranch,
        ElementType::Switch,
        ElementType::Source,
        ElementType::Generator,
        ElementType::Load,
    ];

    /// Returns the canonical name used in the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Bus => "Bus",
            ElementType::LineBranch => "LineBranch",
            ElementType::TransformerBranch => "TransformerBranch",
            ElementType::Switch => "Switch",
            ElementType::Source => "Source",
            ElementType::Generator => "Generator",
            ElementType::Load => "Load",
        }
    }

    /// Returns `true` for node-bearing element types that other symbols reference.
    pub fn is_node(self) -> bool {
        matches!(self, ElementType::Bus)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown element type name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown element type `{0}`")]
pub struct UnknownElementType(String);

impl FromStr for ElementType {
    type Err = UnknownElementType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementType::ALL
            .into_iter()
            .find(|element_type| element_type.as_str() == s)
            .ok_or_else(|| UnknownElementType(s.to_string()))
    }
}

/// Optional bounding-box dimensions of a bus symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusGeometry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
}

/// The two bus references of a branch-like symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchConnection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_node_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_node_id: Option<Id>,
}

/// The single bus reference of a leaf symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafConnection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_to_node_id: Option<Id>,
}

/// Kind-specific payload of a symbol, tagged by `elementType`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "elementType")]
pub enum SymbolKind {
    Bus(BusGeometry),
    LineBranch(BranchConnection),
    TransformerBranch(BranchConnection),
    Switch(BranchConnection),
    Source(LeafConnection),
    Generator(LeafConnection),
    Load(LeafConnection),
}

impl SymbolKind {
    /// Returns the element type this kind represents.
    pub fn element_type(&self) -> ElementType {
        match self {
            SymbolKind::Bus(_) => ElementType::Bus,
            SymbolKind::LineBranch(_) => ElementType::LineBranch,
            SymbolKind::TransformerBranch(_) => ElementType::TransformerBranch,
            SymbolKind::Switch(_) => ElementType::Switch,
            SymbolKind::Source(_) => ElementType::Source,
            SymbolKind::Generator(_) => ElementType::Generator,
            SymbolKind::Load(_) => ElementType::Load,
        }
    }
}

/// Which reference field of a symbol a connection comes from.
///
/// The role fixes the direction of power flow along the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReferenceRole {
    /// `fromNodeId` of a branch: the bus feeds the branch.
    FromNode,
    /// `toNodeId` of a branch: the branch feeds the bus.
    ToNode,
    /// `connectedToNodeId` of a source or generator: the leaf feeds the bus.
    Infeed,
    /// `connectedToNodeId` of a load: the bus feeds the leaf.
    Outfeed,
}

impl ReferenceRole {
    /// Returns `true` when power flows from the referenced bus into the
    /// referencing symbol.
    pub fn flows_from_target(self) -> bool {
        matches!(self, ReferenceRole::FromNode | ReferenceRole::Outfeed)
    }

    /// Returns a stable single-byte tag for this role.
    pub fn tag(self) -> u8 {
        match self {
            ReferenceRole::FromNode => b'f',
            ReferenceRole::ToNode => b't',
            ReferenceRole::Infeed => b'i',
            ReferenceRole::Outfeed => b'o',
        }
    }
}

/// A visual placement of one electrical element.
///
/// Symbols order by `id` first, so sorting a symbol list groups duplicates
/// of the same id and puts them in a content-derived order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    id: Id,
    element_id: Id,
    #[serde(default)]
    position: Point,
    #[serde(default = "default_in_service")]
    in_service: bool,
    #[serde(flatten)]
    kind: SymbolKind,
}

fn default_in_service() -> bool {
    true
}

impl Symbol {
    /// Creates a symbol at the origin.
    pub fn new(id: impl Into<Id>, element_id: impl Into<Id>, kind: SymbolKind) -> Self {
        Self {
            id: id.into(),
            element_id: element_id.into(),
            position: Point::default(),
            in_service: true,
            kind,
        }
    }

    /// Creates a bus symbol with default size.
    pub fn bus(id: impl Into<Id>, element_id: impl Into<Id>) -> Self {
        Self::new(id, element_id, SymbolKind::Bus(BusGeometry::default()))
    }

    /// Creates a line branch between two buses.
    pub fn line(
        id: impl Into<Id>,
        element_id: impl Into<Id>,
        from: impl Into<Id>,
        to: impl Into<Id>,
    ) -> Self {
        Self::new(id, element_id, SymbolKind::LineBranch(branch(from, to)))
    }

    /// Creates a transformer branch between two buses.
    pub fn transformer(
        id: impl Into<Id>,
        element_id: impl Into<Id>,
        from: impl Into<Id>,
        to: impl Into<Id>,
    ) -> Self {
        Self::new(id, element_id, SymbolKind::TransformerBranch(branch(from, to)))
    }

    /// Creates a switch between two buses.
    pub fn switch(
        id: impl Into<Id>,
        element_id: impl Into<Id>,
        from: impl Into<Id>,
        to: impl Into<Id>,
    ) -> Self {
        Self::new(id, element_id, SymbolKind::Switch(branch(from, to)))
    }

    /// Creates a source feeding `node`.
    pub fn source(id: impl Into<Id>, element_id: impl Into<Id>, node: impl Into<Id>) -> Self {
        Self::new(id, element_id, SymbolKind::Source(leaf(node)))
    }

    /// Creates a generator feeding `node`.
    pub fn generator(id: impl Into<Id>, element_id: impl Into<Id>, node: impl Into<Id>) -> Self {
        Self::new(id, element_id, SymbolKind::Generator(leaf(node)))
    }

    /// Creates a load fed from `node`.
    pub fn load(id: impl Into<Id>, element_id: impl Into<Id>, node: impl Into<Id>) -> Self {
        Self::new(id, element_id, SymbolKind::Load(leaf(node)))
    }

    /// Sets the position (builder style).
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    /// Sets the service state (builder style).
    pub fn with_in_service(mut self, in_service: bool) -> Self {
        self.in_service = in_service;
        self
    }

    /// Sets an explicit size. Only buses carry a size; other kinds ignore it.
    pub fn with_size(mut self, size: Size) -> Self {
        if let SymbolKind::Bus(geometry) = &mut self.kind {
            geometry.width = Some(size.width());
            geometry.height = Some(size.height());
        }
        self
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn element_id(&self) -> &Id {
        &self.element_id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn in_service(&self) -> bool {
        self.in_service
    }

    pub fn kind(&self) -> &SymbolKind {
        &self.kind
    }

    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    /// Returns `true` if other symbols may reference this one.
    pub fn is_node(&self) -> bool {
        self.element_type().is_node()
    }

    /// Returns the explicit `(width, height)` of a bus, if any were given.
    pub fn explicit_dimensions(&self) -> (Option<i32>, Option<i32>) {
        match &self.kind {
            SymbolKind::Bus(geometry) => (geometry.width, geometry.height),
            _ => (None, None),
        }
    }

    /// Iterates over the reference fields that are present, in field order.
    pub fn references(&self) -> impl Iterator<Item = (ReferenceRole, &Id)> {
        let (first, second) = match &self.kind {
            SymbolKind::Bus(_) => (None, None),
            SymbolKind::LineBranch(conn)
            | SymbolKind::TransformerBranch(conn)
            | SymbolKind::Switch(conn) => (
                conn.from_node_id
                    .as_ref()
                    .map(|id| (ReferenceRole::FromNode, id)),
                conn.to_node_id.as_ref().map(|id| (ReferenceRole::ToNode, id)),
            ),
            SymbolKind::Source(conn) | SymbolKind::Generator(conn) => (
                conn.connected_to_node_id
                    .as_ref()
                    .map(|id| (ReferenceRole::Infeed, id)),
                None,
            ),
            SymbolKind::Load(conn) => (
                conn.connected_to_node_id
                    .as_ref()
                    .map(|id| (ReferenceRole::Outfeed, id)),
                None,
            ),
        };
        first.into_iter().chain(second)
    }
}

fn branch(from: impl Into<Id>, to: impl Into<Id>) -> BranchConnection {
    BranchConnection {
        from_node_id: Some(from.into()),
        to_node_id: Some(to.into()),
    }
}

fn leaf(node: impl Into<Id>) -> LeafConnection {
    LeafConnection {
        connected_to_node_id: Some(node.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_round_trips_through_str() {
        for element_type in ElementType::ALL {
            let parsed: ElementType = element_type.as_str().parse().unwrap();
            assert_eq!(parsed, element_type);
        }
    }

    #[test]
    fn test_unknown_element_type() {
        let err = "Capacitor".parse::<ElementType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown element type `Capacitor`");
    }

    #[test]
    fn test_only_buses_are_nodes() {
        assert!(Symbol::bus("bus-1", "e1").is_node());
        assert!(!Symbol::load("load-1", "e2", "bus-1").is_node());
        assert!(!Symbol::line("line-1", "e3", "bus-1", "bus-2").is_node());
    }

    #[test]
    fn test_branch_references() {
        let symbol = Symbol::transformer("tr-1", "e1", "bus-hv", "bus-lv");
        let refs: Vec<_> = symbol.references().collect();
        assert_eq!(
            refs,
            vec![
                (ReferenceRole::FromNode, &Id::new("bus-hv")),
                (ReferenceRole::ToNode, &Id::new("bus-lv")),
            ]
        );
    }

    #[test]
    fn test_leaf_references_carry_flow_direction() {
        let source = Symbol::source("src-1", "e1", "bus-1");
        let load = Symbol::load("load-1", "e2", "bus-1");

        let (source_role, _) = source.references().next().unwrap();
        let (load_role, _) = load.references().next().unwrap();

        assert_eq!(source_role, ReferenceRole::Infeed);
        assert!(!source_role.flows_from_target());
        assert_eq!(load_role, ReferenceRole::Outfeed);
        assert!(load_role.flows_from_target());
    }

    #[test]
    fn test_missing_references_are_skipped() {
        let symbol = Symbol::new(
            "sw-1",
            "e1",
            SymbolKind::Switch(BranchConnection {
                from_node_id: Some(Id::new("bus-1")),
                to_node_id: None,
            }),
        );
        assert_eq!(symbol.references().count(), 1);
        assert_eq!(Symbol::bus("bus-1", "e2").references().count(), 0);
    }

    #[test]
    fn test_with_size_only_applies_to_buses() {
        let bus = Symbol::bus("bus-1", "e1").with_size(Size::new(300, 10));
        assert_eq!(bus.explicit_dimensions(), (Some(300), Some(10)));

        let load = Symbol::load("load-1", "e2", "bus-1").with_size(Size::new(300, 10));
        assert_eq!(load.explicit_dimensions(), (None, None));
    }

    #[test]
    fn test_builder_defaults() {
        let symbol = Symbol::bus("bus-1", "e1");
        assert!(symbol.in_service());
        assert!(symbol.position().is_zero());

        let moved = symbol
            .with_position(Point::new(40, 60))
            .with_in_service(false);
        assert_eq!(moved.position(), Point::new(40, 60));
        assert!(!moved.in_service());
    }

    #[test]
    fn test_deserialize_tagged_symbols() {
        let json = r#"[
            {"id": "src-1", "elementId": "e-src", "elementType": "Source", "connectedToNodeId": "bus-1"},
            {"id": "bus-1", "elementId": "e-bus", "elementType": "Bus", "width": 240,
             "position": {"x": 10, "y": 20}, "inService": false},
            {"id": "line-1", "elementId": "e-line", "elementType": "LineBranch", "fromNodeId": "bus-1"}
        ]"#;

        let symbols: Vec<Symbol> = serde_json::from_str(json).unwrap();
        assert_eq!(symbols.len(), 3);

        assert_eq!(symbols[0], Symbol::source("src-1", "e-src", "bus-1"));
        assert_eq!(symbols[1].explicit_dimensions(), (Some(240), None));
        assert_eq!(symbols[1].position(), Point::new(10, 20));
        assert!(!symbols[1].in_service());
        assert_eq!(symbols[2].element_type(), ElementType::LineBranch);
        assert_eq!(symbols[2].references().count(), 1);
    }

    #[test]
    fn test_serialize_uses_element_type_tag() {
        let symbol = Symbol::load("load-1", "e-load", "bus-2");
        let value = serde_json::to_value(&symbol).unwrap();
        assert_eq!(value["elementType"], "Load");
        assert_eq!(value["connectedToNodeId"], "bus-2");
        assert_eq!(value["elementId"], "e-load");
    }
}
