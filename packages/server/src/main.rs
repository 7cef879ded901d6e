#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone query server binary.
//!
//! Reads `hotspot.toml` (or the path in `HOTSPOT_CONFIG`) and serves the
//! interaction API.

use std::path::PathBuf;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::var_os("HOTSPOT_CONFIG")
        .map_or_else(|| PathBuf::from(hotspot_config::DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = hotspot_config::load_or_create(&path)?;

    hotspot_server::init_logger(config.web.debug);
    hotspot_server::run_server(config).await?;

    Ok(())
}
