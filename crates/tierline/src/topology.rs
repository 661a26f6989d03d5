//! Topology fingerprinting.
//!
//! The hash covers exactly what the connectivity graph is built from:
//!
//! ```text
//! record(symbol) = len ++ id ++ len ++ elementId ++ len ++ elementType
//!                  ++ count ++ { tag ++ len ++ target }*
//! hash           = SHA-256(count ++ { len ++ record }*  over sorted records)
//! ```
//!
//! Records are sorted before hashing, so the input order does not matter.
//! Positions, bus dimensions and `inService` are not part of a record, so
//! moving or resizing a symbol leaves the hash unchanged. Reference fields
//! are hashed as written rather than as resolved edges; rewiring a field
//! always changes the hash, even when both targets would resolve to the
//! same bus.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

use tierline_core::symbol::Symbol;

/// SHA-256 fingerprint of a symbol set's topology.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopologyHash([u8; 32]);

/// Error returned when parsing a [`TopologyHash`] from text.
#[derive(Debug, Error)]
#[error("invalid topology hash: {0}")]
pub struct ParseTopologyHashError(#[from] hex::FromHexError);

impl TopologyHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex form of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 32]> for TopologyHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for TopologyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TopologyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopologyHash({})", self.to_hex())
    }
}

impl FromStr for TopologyHash {
    type Err = ParseTopologyHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for TopologyHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TopologyHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

fn push_field(record: &mut Vec<u8>, bytes: &[u8]) {
    record.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    record.extend_from_slice(bytes);
}

/// Serializes the topology-relevant fields of one symbol.
fn canonical_record(symbol: &Symbol) -> Vec<u8> {
    let mut record = Vec::new();
    push_field(&mut record, symbol.id().as_str().as_bytes());
    push_field(&mut record, symbol.element_id().as_str().as_bytes());
    push_field(&mut record, symbol.element_type().as_str().as_bytes());

    let references: Vec<_> = symbol.references().collect();
    record.extend_from_slice(&(references.len() as u64).to_le_bytes());
    for (role, target) in references {
        record.push(role.tag());
        push_field(&mut record, target.as_str().as_bytes());
    }
    record
}

/// Computes the topology fingerprint of `symbols`.
///
/// Every symbol contributes a record, including repeated ids, so adding a
/// symbol always changes the result.
///
/// Bus width and height are left out. An unchanged hash does not mean an
/// unchanged layout: callers that gate relayout on the hash must compare
/// bus sizes as well.
///
/// # Examples
///
/// ```
/// # use tierline::topology::compute_topology_hash;
/// # use tierline_core::{geometry::Point, symbol::Symbol};
/// let symbols = vec![
///     Symbol::bus("bus-1", "e1"),
///     Symbol::load("load-1", "e2", "bus-1"),
/// ];
/// let moved = vec![
///     Symbol::load("load-1", "e2", "bus-1").with_position(Point::new(400, 20)),
///     Symbol::bus("bus-1", "e1"),
/// ];
///
/// assert_eq!(compute_topology_hash(&symbols), compute_topology_hash(&moved));
/// ```
pub fn compute_topology_hash(symbols: &[Symbol]) -> TopologyHash {
    let mut records: Vec<Vec<u8>> = symbols.iter().map(canonical_record).collect();
    records.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update((records.len() as u64).to_le_bytes());
    for record in &records {
        hasher.update((record.len() as u64).to_le_bytes());
        hasher.update(record);
    }
    TopologyHash(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use tierline_core::geometry::{Point, Size};

    use super::*;

    fn feeder() -> Vec<Symbol> {
        vec![
            Symbol::source("src-1", "e-src", "bus-1"),
            Symbol::bus("bus-1", "e-bus-1"),
            Symbol::line("line-1", "e-line", "bus-1", "bus-2"),
            Symbol::bus("bus-2", "e-bus-2"),
            Symbol::load("load-1", "e-load", "bus-2"),
        ]
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(compute_topology_hash(&feeder()), compute_topology_hash(&feeder()));
    }

    #[test]
    fn test_empty_set_has_a_hash() {
        let empty = compute_topology_hash(&[]);
        assert_ne!(empty, compute_topology_hash(&feeder()));
        assert_eq!(empty.to_hex().len(), 64);
    }

    #[test]
    fn test_hash_ignores_order() {
        let mut reversed = feeder();
        reversed.reverse();
        assert_eq!(compute_topology_hash(&feeder()), compute_topology_hash(&reversed));
    }

    #[test]
    fn test_hash_ignores_geometry_and_service_state() {
        let edited: Vec<Symbol> = feeder()
            .into_iter()
            .map(|symbol| {
                let symbol = symbol
                    .with_position(Point::new(-300, 900))
                    .with_in_service(false);
                if symbol.is_node() {
                    symbol.with_size(Size::new(500, 40))
                } else {
                    symbol
                }
            })
            .collect();
        assert_eq!(compute_topology_hash(&feeder()), compute_topology_hash(&edited));
    }

    #[test]
    fn test_adding_a_symbol_changes_hash() {
        let mut extended = feeder();
        extended.push(Symbol::load("load-2", "e-load-2", "bus-2"));
        assert_ne!(compute_topology_hash(&feeder()), compute_topology_hash(&extended));
    }

    #[test]
    fn test_duplicate_symbol_changes_hash() {
        let mut doubled = feeder();
        doubled.push(Symbol::bus("bus-1", "e-bus-1"));
        assert_ne!(compute_topology_hash(&feeder()), compute_topology_hash(&doubled));
    }

    #[test]
    fn test_rewiring_changes_hash() {
        let mut rewired = feeder();
        rewired[4] = Symbol::load("load-1", "e-load", "bus-1");
        assert_ne!(compute_topology_hash(&feeder()), compute_topology_hash(&rewired));

        let mut swapped = feeder();
        swapped[2] = Symbol::line("line-1", "e-line", "bus-2", "bus-1");
        assert_ne!(compute_topology_hash(&feeder()), compute_topology_hash(&swapped));
    }

    #[test]
    fn test_element_type_changes_hash() {
        let mut retyped = feeder();
        retyped[2] = Symbol::transformer("line-1", "e-line", "bus-1", "bus-2");
        assert_ne!(compute_topology_hash(&feeder()), compute_topology_hash(&retyped));
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        let a = vec![Symbol::bus("ab", "c")];
        let b = vec![Symbol::bus("a", "bc")];
        assert_ne!(compute_topology_hash(&a), compute_topology_hash(&b));
    }

    #[test]
    fn test_hex_round_trip() {
        let hash = compute_topology_hash(&feeder());
        let parsed: TopologyHash = hash.to_string().parse().unwrap();
        assert_eq!(parsed, hash);

        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{hash}\""));
        assert!("not-hex".parse::<TopologyHash>().is_err());
    }
}
