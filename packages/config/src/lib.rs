#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Configuration file for the hotspot toolchain.
//!
//! Settings live in a TOML file (`hotspot.toml` by default). Every section
//! and key is optional; missing values fall back to [`Config::default`].
//! When the file does not exist, [`load_or_create`] writes the defaults so
//! the user has something to edit.
//!
//! ```toml
//! [place]
//! name = "Denton County"
//! box = [-97.399786, 32.989759, -96.834612, 33.413174]
//!
//! [filter]
//! directory = "PATH/TO/CHECKIN/ARCHIVES"
//! output = "checkins-filtered.json.bz2"
//! msg_interval = 10000
//!
//! [census]
//! blocks = "census-blocks.tsv.bz2"
//!
//! [checkins]
//! archive = "checkins-filtered.json.bz2"
//!
//! [graph]
//! path = "census-block-interactions.tsv"
//!
//! [web]
//! bind_addr = "127.0.0.1"
//! port = 8080
//! debug = false
//! gzip = false
//! ```

use std::path::{Path, PathBuf};

use hotspot_geography_models::BoundingBox;
use serde::{Deserialize, Serialize};

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "hotspot.toml";

/// Errors that can occur while loading or creating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the schema.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// Path of the offending file.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// The defaults could not be rendered as TOML.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// No configuration existed, so a default one was written.
    #[error("Configuration file not found; wrote defaults to {path}. Please edit it and rerun.")]
    Created {
        /// Where the default file was written.
        path: String,
    },
}

/// Full configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Area of interest.
    pub place: PlaceConfig,
    /// Archive filtering.
    pub filter: FilterConfig,
    /// Block polygons.
    pub census: CensusConfig,
    /// Check-in input for the graph build.
    pub checkins: CheckinsConfig,
    /// Persisted interaction graph.
    pub graph: GraphConfig,
    /// Query server.
    pub web: WebConfig,
}

/// Area of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceConfig {
    /// Human-readable name of the area.
    pub name: String,
    /// Bounding box of the area, `[west, south, east, north]`.
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

impl Default for PlaceConfig {
    fn default() -> Self {
        Self {
            name: "Denton County".to_string(),
            bbox: BoundingBox::new(-97.399_786, 32.989_759, -96.834_612, 33.413_174),
        }
    }
}

/// Archive filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Directory holding the raw archives.
    pub directory: PathBuf,
    /// Filtered output archive.
    pub output: PathBuf,
    /// Records between status log lines.
    pub msg_interval: u64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("PATH/TO/CHECKIN/ARCHIVES"),
            output: PathBuf::from("checkins-filtered.json.bz2"),
            msg_interval: 10_000,
        }
    }
}

/// Block polygons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CensusConfig {
    /// Block archive (`<id>\t<GeoJSON>` per line).
    pub blocks: PathBuf,
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            blocks: PathBuf::from("census-blocks.tsv.bz2"),
        }
    }
}

/// Check-in input for the graph build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckinsConfig {
    /// Check-in archive, usually the output of the filter step.
    pub archive: PathBuf,
}

impl Default for CheckinsConfig {
    fn default() -> Self {
        Self {
            archive: PathBuf::from("checkins-filtered.json.bz2"),
        }
    }
}

/// Persisted interaction graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Graph file written by the build and read by the server.
    pub path: PathBuf,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("census-block-interactions.tsv"),
        }
    }
}

/// Query server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to listen on.
    pub port: u16,
    /// Enables debug-level logging when `RUST_LOG` is unset.
    pub debug: bool,
    /// Compresses responses for clients that accept it.
    pub gzip: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            debug: false,
            gzip: false,
        }
    }
}

impl WebConfig {
    /// Bind address and port, with `BIND_ADDR` and `PORT` from the
    /// environment taking precedence over the file.
    #[must_use]
    pub fn resolved_bind(&self) -> (String, u16) {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| self.bind_addr.clone());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(self.port);
        (bind_addr, port)
    }
}

impl Config {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `text` is not a valid configuration.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: "<string>".to_string(),
            source: e,
        })
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if rendering fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reads the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// Reads the configuration at `path`, writing the defaults there first if
/// the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Created`] after writing a default file, so the
/// caller can stop and let the user edit it. Otherwise returns any error
/// from [`Config::load`].
pub fn load_or_create(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        return Config::load(path);
    }

    log::warn!("Configuration file {} not found; creating one", path.display());
    let text = Config::default().to_toml_string()?;
    std::fs::write(path, text).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    Err(ConfigError::Created {
        path: path.display().to_string(),
    })
}
