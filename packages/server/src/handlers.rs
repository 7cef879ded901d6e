//! HTTP handler functions for the hotspot API.

use actix_web::{HttpResponse, web};
use hotspot_geography_models::Point;
use hotspot_interaction::EdgeMode;
use hotspot_server_models::{
    ApiBlock, ApiHealth, ApiInteraction, ApiPlace, InteractionQueryParams,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/place`
///
/// Returns the configured area of interest and the number of loaded blocks.
pub async fn place(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiPlace {
        name: state.place.name.clone(),
        bbox: state.place.bbox,
        block_count: state.blocks.len(),
    })
}

/// `GET /api/interaction/blocks`
///
/// Resolves the queried point to its block and returns that block's
/// normalized interaction profile, with each neighbour's polygon attached.
/// A point outside every block, or a block with no recorded transitions,
/// yields an empty list.
pub async fn interaction_blocks(
    state: web::Data<AppState>,
    params: web::Query<InteractionQueryParams>,
) -> HttpResponse {
    let Ok(mode) = params.edges.parse::<EdgeMode>() else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("Unknown edges value '{}'; expected 'directed' or 'undirected'", params.edges)
        }));
    };
    if !params.latitude.is_finite() || !params.longitude.is_finite() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Latitude and longitude must be finite numbers"
        }));
    }

    let point = Point::new(params.longitude, params.latitude);
    let source_id = state.blocks.resolve(&point).cloned();
    let profile = source_id
        .as_ref()
        .map(|source| state.interactions.profile(source, mode))
        .unwrap_or_default();

    log::info!(
        "Interaction query ({}, {}) edges={mode} source={} blocks={}",
        params.latitude,
        params.longitude,
        source_id.as_ref().map_or("-", |id| id.as_str()),
        profile.len()
    );

    let blocks: Vec<ApiBlock> = profile
        .into_iter()
        .map(|weighted| {
            let geometry = state
                .blocks
                .get(&weighted.block_id)
                .map(|block| geojson::Geometry::new(geojson::Value::from(&block.geometry)));
            ApiBlock {
                block_id: weighted.block_id,
                weight: weighted.weight,
                geometry,
            }
        })
        .collect();

    HttpResponse::Ok().json(ApiInteraction {
        latitude: params.latitude,
        longitude: params.longitude,
        directed: mode.is_directed(),
        source_id,
        blocks,
    })
}
