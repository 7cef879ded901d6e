//! Subcommand implementations.
//!
//! Each function runs one step of the toolchain against the loaded
//! configuration. They are synchronous; `main` moves the heavy ones onto
//! blocking threads.

use std::path::{Path, PathBuf};

use hotspot_checkin::progress::ProgressCallback;
use hotspot_checkin::{ArchiveStats, CheckinError, InBox, combine_filter, group_by_user, read_archives};
use hotspot_cli_utils::{IndicatifProgress, MultiProgress};
use hotspot_config::{Config, ConfigError};
use hotspot_geography_models::{BlockId, Point};
use hotspot_interaction::{
    BuildStats, CodecError, EdgeMode, InteractionGraph, InteractionGraphBuilder,
    InteractionIndex, WeightedBlock,
};
use hotspot_server::ServerError;
use hotspot_spatial::{BlockIndex, SpatialError};

/// Errors surfaced by the command line.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A check-in archive could not be read or written.
    #[error(transparent)]
    Checkin(#[from] CheckinError),

    /// The block archive could not be read.
    #[error(transparent)]
    Spatial(#[from] SpatialError),

    /// The interaction graph could not be read or written.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The query server failed.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Output could not be rendered.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A blocking task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Combines the raw archives into one, keeping records inside the
/// configured bounding box.
///
/// # Errors
///
/// Returns [`CliError::Checkin`] if an archive cannot be read or the output
/// cannot be written.
pub fn filter(
    config: &Config,
    directory: Option<PathBuf>,
    output: Option<PathBuf>,
    multi: &MultiProgress,
) -> Result<ArchiveStats, CliError> {
    let directory = directory.unwrap_or_else(|| config.filter.directory.clone());
    let output = output.unwrap_or_else(|| config.filter.output.clone());

    log::info!(
        "Keeping records inside {} {:?}",
        config.place.name,
        <[f64; 4]>::from(config.place.bbox)
    );
    let progress = IndicatifProgress::archives_bar(multi, "Filtering archives");
    let stats = combine_filter(
        &directory,
        &output,
        &[&InBox(config.place.bbox)],
        config.filter.msg_interval,
        &progress,
    )?;

    Ok(stats)
}

/// Builds the interaction graph from check-in archives and writes it to
/// the configured graph path.
///
/// Reads `archives`, or the configured check-in archive when empty.
///
/// # Errors
///
/// Returns [`CliError`] if any input cannot be read or the graph cannot be
/// written.
pub fn build(
    config: &Config,
    archives: &[PathBuf],
    multi: &MultiProgress,
) -> Result<(BuildStats, InteractionGraph), CliError> {
    let blocks = BlockIndex::new(hotspot_spatial::load_blocks(&config.census.blocks)?);
    log::info!("Indexed {} blocks", blocks.len());

    let paths: Vec<&Path> = if archives.is_empty() {
        vec![config.checkins.archive.as_path()]
    } else {
        archives.iter().map(PathBuf::as_path).collect()
    };
    let progress = IndicatifProgress::lines_spinner(multi, "Reading check-ins");
    let (checkins, archive_stats) = read_archives(&paths, &progress)?;
    log::info!("{archive_stats}");

    let trails = group_by_user(&checkins);
    log::info!("Grouped {} check-ins into {} user trails", checkins.len(), trails.len());

    let users = IndicatifProgress::archives_bar(multi, "Resolving trails");
    users.set_total(trails.len() as u64);

    let mut builder =
        InteractionGraphBuilder::new(&blocks).with_log_interval(config.filter.msg_interval);
    for trail in trails.values() {
        builder.add_trail(trail);
        users.inc(1);
    }
    let stats = builder.stats();
    let graph = builder.finish();
    users.finish(format!("Recorded {} transitions", stats.transitions));

    hotspot_interaction::dump_to_path(&graph, &config.graph.path)?;

    Ok((stats, graph))
}

/// Resolves `point` and returns its block with the block's interaction
/// profile.
///
/// # Errors
///
/// Returns [`CliError`] if the block archive or graph cannot be loaded.
pub fn query(
    config: &Config,
    point: Point,
    mode: EdgeMode,
) -> Result<(Option<BlockId>, Vec<WeightedBlock>), CliError> {
    let blocks = BlockIndex::new(hotspot_spatial::load_blocks(&config.census.blocks)?);
    let index = InteractionIndex::new(hotspot_interaction::load_from_path(&config.graph.path)?);

    let source = blocks.resolve(&point).cloned();
    let profile = source
        .as_ref()
        .map(|id| index.profile(id, mode))
        .unwrap_or_default();

    Ok((source, profile))
}

/// Loads the persisted graph.
///
/// # Errors
///
/// Returns [`CliError::Codec`] if the graph cannot be read.
pub fn load_graph(config: &Config) -> Result<InteractionGraph, CliError> {
    Ok(hotspot_interaction::load_from_path(&config.graph.path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotspot_cli_utils::ProgressDrawTarget;

    fn hidden_multi() -> MultiProgress {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    }

    const BLOCKS: &str = concat!(
        "1\t{\"type\":\"Polygon\",\"coordinates\":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}\n",
        "2\t{\"type\":\"Polygon\",\"coordinates\":[[[1,0],[2,0],[2,1],[1,1],[1,0]]]}\n",
        "3\t{\"type\":\"Polygon\",\"coordinates\":[[[2,0],[3,0],[3,1],[2,1],[2,0]]]}\n",
    );

    fn checkin(user: u64, lon: f64) -> String {
        format!(r#"{{"coordinates":{{"coordinates":[{lon},0.5]}},"user":{{"id":{user}}}}}"#)
    }

    fn fixture(name: &str) -> (PathBuf, Config) {
        let tmp = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        std::fs::write(tmp.join("blocks.tsv"), BLOCKS).unwrap();
        let lines = [
            checkin(7, 0.5),
            checkin(7, 1.5),
            checkin(8, 2.5),
            checkin(7, 2.5),
            checkin(8, 0.5),
            checkin(9, 9.0),
        ];
        std::fs::write(tmp.join("checkins.json"), lines.join("\n")).unwrap();

        let mut config = Config::default();
        config.census.blocks = tmp.join("blocks.tsv");
        config.checkins.archive = tmp.join("checkins.json");
        config.graph.path = tmp.join("out").join("graph.tsv");
        (tmp, config)
    }

    #[test]
    fn build_writes_graph_and_query_reads_it_back() {
        let (tmp, config) = fixture("hotspot_cli_build_test");
        let multi = hidden_multi();

        let (stats, graph) = build(&config, &[], &multi).unwrap();
        assert_eq!(stats.users, 3);
        assert_eq!(stats.transitions, 3);
        assert!(config.graph.path.exists());
        assert_eq!(load_graph(&config).unwrap(), graph);

        let (source, directed) = query(&config, Point::new(0.5, 0.5), EdgeMode::Directed).unwrap();
        assert_eq!(source, Some(BlockId::from("1")));
        let ids: Vec<&str> = directed.iter().map(|b| b.block_id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);

        let (_, undirected) = query(&config, Point::new(0.5, 0.5), EdgeMode::Undirected).unwrap();
        let ids: Vec<&str> = undirected.iter().map(|b| b.block_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn query_outside_every_block_is_empty() {
        let (tmp, config) = fixture("hotspot_cli_query_test");
        build(&config, &[], &hidden_multi()).unwrap();

        let (source, profile) = query(&config, Point::new(9.0, 9.0), EdgeMode::Undirected).unwrap();
        assert_eq!(source, None);
        assert!(profile.is_empty());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_graph_is_a_codec_error() {
        let mut config = Config::default();
        config.graph.path = PathBuf::from("/nonexistent/graph.tsv");
        assert!(matches!(load_graph(&config), Err(CliError::Codec(_))));
    }
}
