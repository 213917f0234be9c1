//! Command-line interface for the map data-quality checks.
#![forbid(unsafe_code)]

mod connectivity;
mod crossings;
mod data_model;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mapcheck_core::{CheckError, DataModel, DataModelSpec, Feature, ModelError, explode};
use mapcheck_io::{GeoJsonError, read_collection};
use serde::Serialize;
use thiserror::Error;

pub use connectivity::ConnectivityArgs;
pub use crossings::CrossingsArgs;
pub use data_model::DataModelArgs;

/// Run the checker with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::DataModel(args) => data_model::run(args),
        Command::Connectivity(args) => connectivity::run(args),
        Command::Crossings(args) => crossings::run(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "mapcheck",
    about = "Data-quality checks for map feature extracts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate feature tags against a data model.
    DataModel(DataModelArgs),
    /// Label features reachable from tagged seed features.
    Connectivity(ConnectivityArgs),
    /// Detect and classify crossings between two feature classes.
    Crossings(CrossingsArgs),
}

/// Errors emitted by the checker CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile { field: &'static str, path: PathBuf },
    /// A feature collection could not be read or written.
    #[error(transparent)]
    Collection(#[from] GeoJsonError),
    /// The data-model rules file could not be read.
    #[error("failed to read data model {path}: {source}")]
    ModelFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The data-model rules file is not valid JSON.
    #[error("failed to parse data model {path}: {source}")]
    ModelParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The data-model rules are malformed.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// A check rejected its parameters.
    #[error(transparent)]
    Check(#[from] CheckError),
    /// The summary document could not be written.
    #[error("failed to write summary {path}: {source}")]
    SummaryWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The summary document could not be encoded.
    #[error("failed to encode summary: {0}")]
    SummaryEncode(#[from] serde_json::Error),
}

fn require_existing(path: &Path, field: &'static str) -> Result<(), CliError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        })
    }
}

/// Read a collection and split multi-geometries into postfixed singles.
///
/// The geometric checks only operate on points, lines, and polygons;
/// a Multi* feature fed to them directly would be skipped with a warning.
fn read_single_geometries(path: &Path) -> Result<Vec<Feature>, CliError> {
    Ok(read_collection(path)?.iter().flat_map(explode).collect())
}

fn load_model(path: &Path) -> Result<DataModel, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::ModelFile {
        path: path.to_path_buf(),
        source,
    })?;
    let spec: DataModelSpec =
        serde_json::from_str(&raw).map_err(|source| CliError::ModelParse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(DataModel::from_spec(spec)?)
}

fn write_summary<T: Serialize>(path: &Path, summary: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(summary)?;
    fs::write(path, rendered).map_err(|source| CliError::SummaryWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["mapcheck", "data-model", "--input", "a.geojson"])]
    #[case(&["mapcheck", "connectivity", "--seed-value", "sea", "--seed-value", "lake"])]
    #[case(&["mapcheck", "crossings", "--bridge-key", "bridge"])]
    fn subcommands_parse(#[case] argv: &[&str]) {
        Cli::try_parse_from(argv).unwrap();
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["mapcheck", "frobnicate"]).is_err());
    }

    #[test]
    fn missing_source_file_names_the_flag() {
        let error = require_existing(Path::new("/nonexistent/raw.geojson"), "input").unwrap_err();
        assert!(error.to_string().contains("input"));
        assert!(error.to_string().contains("/nonexistent/raw.geojson"));
    }

    #[test]
    fn malformed_model_file_is_a_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_model(&path).unwrap_err(),
            CliError::ModelParse { .. }
        ));
    }

    #[test]
    fn invalid_range_fails_model_loading() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        fs::write(
            &path,
            r#"{"types": {}, "ranges": {"width": [1.0]}, "conditions": {}}"#,
        )
        .unwrap();
        assert!(matches!(
            load_model(&path).unwrap_err(),
            CliError::Model(_)
        ));
    }
}
