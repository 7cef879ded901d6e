#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic value types shared by the hotspot toolchain.
//!
//! These types describe *where* things are: the identifier of a block
//! polygon, a longitude/latitude point, and a rectangular bounding box.
//! They carry no geometry library dependency so that every crate in the
//! workspace can use them.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a block polygon (e.g. a census block GEOID).
///
/// Ids are stored as text. Ordering puts purely numeric ids first, compared
/// by numeric value, followed by every other id compared lexically. This is
/// the order used whenever blocks are written out in sorted form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawBlockId", into = "String")]
pub struct BlockId(String);

impl BlockId {
    /// Creates a block id from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is made only of ASCII digits.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }

    fn significant_digits(&self) -> &str {
        let trimmed = self.0.trim_start_matches('0');
        if trimmed.is_empty() { "0" } else { trimmed }
    }
}

impl Ord for BlockId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_numeric(), other.is_numeric()) {
            (true, true) => {
                let (a, b) = (self.significant_digits(), other.significant_digits());
                a.len()
                    .cmp(&b.len())
                    .then_with(|| a.cmp(b))
                    .then_with(|| self.0.cmp(&other.0))
            }
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for BlockId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BlockId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for BlockId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<BlockId> for String {
    fn from(value: BlockId) -> Self {
        value.0
    }
}

/// Block ids arrive either as JSON strings or as bare integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBlockId {
    Text(String),
    Number(u64),
}

impl From<RawBlockId> for BlockId {
    fn from(raw: RawBlockId) -> Self {
        match raw {
            RawBlockId::Text(s) => Self(s),
            RawBlockId::Number(n) => Self(n.to_string()),
        }
    }
}

/// A longitude/latitude pair in the same coordinate system as the block
/// polygons (WGS84 for census data).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    /// Longitude (x).
    pub longitude: f64,
    /// Latitude (y).
    pub latitude: f64,
}

impl Point {
    /// Creates a point from `GeoJSON`-ordered coordinates.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Bit-exact key for memoizing lookups of this point.
    #[must_use]
    pub const fn key(&self) -> PointKey {
        PointKey(self.longitude.to_bits(), self.latitude.to_bits())
    }
}

/// Hashable, totally ordered stand-in for a [`Point`].
///
/// Two points share a key only if both coordinates are bit-for-bit equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointKey(u64, u64);

/// Rectangular area given by its south-west and north-east corners.
///
/// Serialized as `[west, south, east, north]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Whether `point` lies strictly inside the box. Points on an edge are
    /// outside.
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        self.west < point.longitude
            && point.longitude < self.east
            && self.south < point.latitude
            && point.latitude < self.north
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([west, south, east, north]: [f64; 4]) -> Self {
        Self::new(west, south, east, north)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.west, b.south, b.east, b.north]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_sort_by_value() {
        let mut ids: Vec<BlockId> = ["10", "9", "100", "09"].into_iter().map(BlockId::from).collect();
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(BlockId::as_str).collect();
        assert_eq!(sorted, vec!["09", "9", "10", "100"]);
    }

    #[test]
    fn numeric_ids_sort_before_text_ids() {
        let mut ids: Vec<BlockId> = ["b", "10", "A", "2"].into_iter().map(BlockId::from).collect();
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(BlockId::as_str).collect();
        assert_eq!(sorted, vec!["2", "10", "A", "b"]);
    }

    #[test]
    fn mixed_ordering_is_transitive() {
        let a = BlockId::from("10");
        let b = BlockId::from("9");
        let c = BlockId::from("1a");
        assert!(b < a);
        assert!(a < c);
        assert!(b < c);
    }

    #[test]
    fn block_id_deserializes_from_number_or_string() {
        let from_num: BlockId = serde_json::from_str("480850301001000").unwrap();
        let from_str: BlockId = serde_json::from_str("\"480850301001000\"").unwrap();
        assert_eq!(from_num, from_str);
        assert_eq!(serde_json::to_string(&from_num).unwrap(), "\"480850301001000\"");
    }

    #[test]
    fn bounding_box_is_strict() {
        let bbox = BoundingBox::new(-97.4, 32.9, -96.8, 33.4);
        assert!(bbox.contains(&Point::new(-97.0, 33.0)));
        assert!(!bbox.contains(&Point::new(-97.4, 33.0)));
        assert!(!bbox.contains(&Point::new(-97.0, 33.4)));
        assert!(!bbox.contains(&Point::new(-98.0, 33.0)));
    }

    #[test]
    fn bounding_box_serializes_as_array() {
        let bbox = BoundingBox::new(-97.399_786, 32.989_759, -96.834_612, 33.413_174);
        let json = serde_json::to_string(&bbox).unwrap();
        assert_eq!(json, "[-97.399786,32.989759,-96.834612,33.413174]");
        let back: BoundingBox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bbox);
    }

    #[test]
    fn point_key_is_bit_exact() {
        assert_eq!(Point::new(1.5, 2.5).key(), Point::new(1.5, 2.5).key());
        assert_ne!(Point::new(1.5, 2.5).key(), Point::new(2.5, 1.5).key());
    }
}
