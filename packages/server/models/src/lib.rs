#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the hotspot query server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the graph and index types so the API contract can evolve
//! independently.

use hotspot_geography_models::{BlockId, BoundingBox};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// The configured area of interest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlace {
    /// Human-readable name.
    pub name: String,
    /// `[west, south, east, north]`.
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    /// Number of blocks loaded into the spatial index.
    pub block_count: usize,
}

/// Query parameters for the interaction endpoint.
///
/// `edges` is kept as text so that an unknown mode can be reported with a
/// specific message instead of a generic extractor error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionQueryParams {
    /// Query latitude.
    pub latitude: f64,
    /// Query longitude.
    pub longitude: f64,
    /// `directed` or `undirected`.
    pub edges: String,
}

/// One block in an interaction profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBlock {
    /// Block identifier.
    pub block_id: BlockId,
    /// Interaction strength relative to the strongest neighbour, in `(0, 1]`.
    pub weight: f64,
    /// Block polygon, when the block is present in the spatial index.
    pub geometry: Option<geojson::Geometry>,
}

/// Interaction profile of the block containing the queried point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInteraction {
    /// Query latitude, echoed back.
    pub latitude: f64,
    /// Query longitude, echoed back.
    pub longitude: f64,
    /// Whether only outgoing edges were considered.
    pub directed: bool,
    /// Block containing the point, if any.
    pub source_id: Option<BlockId>,
    /// Interacting blocks, strongest first.
    pub blocks: Vec<ApiBlock>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_serializes_box_as_array() {
        let place = ApiPlace {
            name: "Denton County".to_string(),
            bbox: BoundingBox::new(-97.5, 33.0, -96.5, 33.5),
            block_count: 3,
        };
        let json = serde_json::to_value(&place).unwrap();
        assert_eq!(json["box"], serde_json::json!([-97.5, 33.0, -96.5, 33.5]));
        assert_eq!(json["blockCount"], 3);
    }

    #[test]
    fn interaction_uses_camel_case_and_null_source() {
        let response = ApiInteraction {
            latitude: 33.2,
            longitude: -97.1,
            directed: false,
            source_id: None,
            blocks: Vec::new(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["sourceId"], serde_json::Value::Null);
        assert_eq!(json["directed"], false);
        assert_eq!(json["blocks"], serde_json::json!([]));
    }

    #[test]
    fn block_id_serializes_as_string() {
        let block = ApiBlock {
            block_id: BlockId::from("481210201001000"),
            weight: 0.5,
            geometry: None,
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["blockId"], "481210201001000");
        assert_eq!(json["weight"], 0.5);
    }
}
