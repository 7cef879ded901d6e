#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web query server for the block interaction graph.
//!
//! Loads the block polygons and the persisted interaction graph once at
//! startup and answers point queries against them. Both structures are
//! immutable after loading and shared between workers through `Arc`.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use hotspot_config::{Config, PlaceConfig};
use hotspot_interaction::{CodecError, InteractionIndex};
use hotspot_spatial::{BlockIndex, SpatialError};

/// Errors that can occur while starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The block archive could not be loaded.
    #[error(transparent)]
    Spatial(#[from] SpatialError),

    /// The interaction graph could not be loaded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The HTTP server failed to bind or run.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState {
    /// Block polygons for point resolution and geometry lookup.
    pub blocks: Arc<BlockIndex>,
    /// Interaction graph with its prebuilt transpose.
    pub interactions: Arc<InteractionIndex>,
    /// The configured area of interest.
    pub place: PlaceConfig,
}

impl AppState {
    /// Loads the block archive and interaction graph named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if either file cannot be loaded.
    pub fn load(config: &Config) -> Result<Self, ServerError> {
        log::info!("Loading block polygons...");
        let blocks = BlockIndex::new(hotspot_spatial::load_blocks(&config.census.blocks)?);
        log::info!("Indexed {} blocks", blocks.len());

        log::info!("Loading interaction graph...");
        let graph = hotspot_interaction::load_from_path(&config.graph.path)?;
        let interactions = InteractionIndex::new(graph);

        Ok(Self {
            blocks: Arc::new(blocks),
            interactions: Arc::new(interactions),
            place: config.place.clone(),
        })
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/place", web::get().to(handlers::place))
            .route(
                "/interaction/blocks",
                web::get().to(handlers::interaction_blocks),
            ),
    );
}

/// Response compression, applied only when `enabled`. Clients that do not
/// send `Accept-Encoding: gzip` always get identity responses.
#[must_use]
pub fn compression(enabled: bool) -> middleware::Condition<middleware::Compress> {
    middleware::Condition::new(enabled, middleware::Compress::default())
}

/// Initializes `pretty_env_logger` from `RUST_LOG`, falling back to debug
/// level when `debug` is set and `RUST_LOG` is not.
pub fn init_logger(debug: bool) {
    if debug && std::env::var_os("RUST_LOG").is_none() {
        pretty_env_logger::formatted_builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        pretty_env_logger::init_custom_env("RUST_LOG");
    }
}

/// Starts the query server.
///
/// Loads the block archive and graph, then serves the API until the
/// process is stopped. The caller provides the async runtime and the
/// logger.
///
/// # Errors
///
/// Returns [`ServerError`] if loading fails or the HTTP server fails to
/// bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let state = web::Data::new(AppState::load(&config)?);
    let (bind_addr, port) = config.web.resolved_bind();
    let gzip = config.web.gzip;

    log::info!("Starting server on {bind_addr}:{port} (gzip: {gzip})");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(compression(gzip))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}
