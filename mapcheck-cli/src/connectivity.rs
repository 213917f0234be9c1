//! The `connectivity` subcommand: label every feature reachable from a
//! tagged seed and write the labelled collection back out.

use std::path::PathBuf;

use clap::Parser;
use log::info;
use mapcheck_core::{ConnectivityOptions, trace_connectivity};
use mapcheck_io::write_collection;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{CliError, read_single_geometries, require_existing};

const ARG_INPUT: &str = "input";
const ARG_OUTPUT: &str = "output";
const ARG_SEED_KEY: &str = "seed-key";
const ARG_SEED_VALUE: &str = "seed-value";
const ARG_TOLERANCE: &str = "tolerance";
const ENV_INPUT: &str = "MAPCHECK_CMDS_CONNECTIVITY_INPUT";
const ENV_OUTPUT: &str = "MAPCHECK_CMDS_CONNECTIVITY_OUTPUT";
const ENV_SEED_KEY: &str = "MAPCHECK_CMDS_CONNECTIVITY_SEED_KEY";
const ENV_SEED_VALUE: &str = "MAPCHECK_CMDS_CONNECTIVITY_SEED_VALUE";
const ENV_TOLERANCE: &str = "MAPCHECK_CMDS_CONNECTIVITY_TOLERANCE";

pub(crate) fn run(args: ConnectivityArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    config.execute()
}

/// CLI arguments for the `connectivity` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Propagate seed labels across geometrically touching \
                  features. Options can come from CLI flags, configuration \
                  files, or environment variables.",
    about = "Label features reachable from tagged seed features"
)]
#[ortho_config(prefix = "MAPCHECK")]
pub struct ConnectivityArgs {
    /// Path to the GeoJSON collection to trace.
    #[arg(long = ARG_INPUT, value_name = "path")]
    #[serde(default)]
    input: Option<PathBuf>,
    /// Where to write the labelled collection.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    output: Option<PathBuf>,
    /// Property identifying candidate seed features.
    #[arg(long = ARG_SEED_KEY, value_name = "key")]
    #[serde(default)]
    seed_key: Option<String>,
    /// Seed value; repeat the flag for several.
    #[arg(long = ARG_SEED_VALUE, value_name = "value")]
    #[serde(default)]
    seed_value: Vec<String>,
    /// Distance under which two geometries are treated as touching.
    #[arg(long = ARG_TOLERANCE, value_name = "distance")]
    #[serde(default)]
    tolerance: Option<f64>,
    /// Upper bound on frontier visits per run.
    #[arg(long, value_name = "count")]
    #[serde(default)]
    max_visits: Option<usize>,
}

impl ConnectivityArgs {
    fn into_config(self) -> Result<ConnectivityConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ConnectivityConfig::try_from(merged)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ConnectivityConfig {
    input: PathBuf,
    output: PathBuf,
    options: ConnectivityOptions,
}

impl ConnectivityConfig {
    fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.input, ARG_INPUT)
    }

    fn execute(&self) -> Result<(), CliError> {
        let features = read_single_geometries(&self.input)?;
        let traced = trace_connectivity(&features, &self.options)?;
        write_collection(&self.output, &traced)?;
        info!(
            "connectivity check: {} feature(s) written to {}",
            traced.len(),
            self.output.display()
        );
        Ok(())
    }
}

impl TryFrom<ConnectivityArgs> for ConnectivityConfig {
    type Error = CliError;

    fn try_from(args: ConnectivityArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_INPUT,
        })?;
        let output = args.output.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT,
            env: ENV_OUTPUT,
        })?;
        let seed_key = args.seed_key.ok_or(CliError::MissingArgument {
            field: ARG_SEED_KEY,
            env: ENV_SEED_KEY,
        })?;
        if args.seed_value.is_empty() {
            return Err(CliError::MissingArgument {
                field: ARG_SEED_VALUE,
                env: ENV_SEED_VALUE,
            });
        }
        let tolerance = args.tolerance.ok_or(CliError::MissingArgument {
            field: ARG_TOLERANCE,
            env: ENV_TOLERANCE,
        })?;
        let mut options = ConnectivityOptions::new(seed_key, args.seed_value, tolerance);
        options.max_visits = args.max_visits;
        Ok(Self {
            input,
            output,
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapcheck_core::{CONNECTED_KEY, PropertyValue};
    use mapcheck_io::read_collection;
    use std::fs;
    use tempfile::TempDir;

    fn full_args() -> ConnectivityArgs {
        ConnectivityArgs {
            input: Some(PathBuf::from("raw.geojson")),
            output: Some(PathBuf::from("traced.geojson")),
            seed_key: Some("outlet".to_owned()),
            seed_value: vec!["sea".to_owned()],
            tolerance: Some(0.1),
            max_visits: None,
        }
    }

    #[test]
    fn conversion_carries_all_options() {
        let mut args = full_args();
        args.seed_value.push("lake".to_owned());
        args.max_visits = Some(10_000);
        let config = ConnectivityConfig::try_from(args).unwrap();
        assert_eq!(config.options.seed_key, "outlet");
        assert_eq!(config.options.seed_values, vec!["sea", "lake"]);
        assert_eq!(config.options.tolerance, 0.1);
        assert_eq!(config.options.max_visits, Some(10_000));
    }

    #[test]
    fn empty_seed_values_are_rejected() {
        let mut args = full_args();
        args.seed_value.clear();
        assert!(matches!(
            ConnectivityConfig::try_from(args).unwrap_err(),
            CliError::MissingArgument {
                field: "seed-value",
                ..
            }
        ));
    }

    #[test]
    fn non_positive_tolerance_fails_the_run() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.geojson");
        fs::write(&input, r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        let mut args = full_args();
        args.input = Some(input);
        args.output = Some(dir.path().join("traced.geojson"));
        args.tolerance = Some(0.0);
        let config = ConnectivityConfig::try_from(args).unwrap();
        assert!(matches!(config.execute(), Err(CliError::Check(_))));
    }

    #[test]
    fn executes_end_to_end() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.geojson");
        let output = dir.path().join("traced.geojson");
        fs::write(
            &input,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature",
                 "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 0.0]]},
                 "properties": {"osm_id": "w1", "outlet": "sea"}},
                {"type": "Feature",
                 "geometry": {"type": "LineString", "coordinates": [[1.05, 0.0], [2.0, 0.0]]},
                 "properties": {"osm_id": "w2"}}
            ]}"#,
        )
        .unwrap();
        let mut args = full_args();
        args.input = Some(input);
        args.output = Some(output.clone());
        let config = ConnectivityConfig::try_from(args).unwrap();
        config.validate_sources().unwrap();
        config.execute().unwrap();

        let traced = read_collection(&output).unwrap();
        assert!(traced
            .iter()
            .all(|feature| feature.get(CONNECTED_KEY)
                == Some(&PropertyValue::Text("sea".to_owned()))));
    }

    #[test]
    fn multi_geometries_are_split_before_tracing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.geojson");
        let output = dir.path().join("traced.geojson");
        fs::write(
            &input,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature",
                 "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 0.0]]},
                 "properties": {"osm_id": "w1", "outlet": "sea"}},
                {"type": "Feature",
                 "geometry": {"type": "MultiLineString", "coordinates": [
                    [[1.05, 0.0], [2.0, 0.0]],
                    [[2.05, 0.0], [3.0, 0.0]]
                 ]},
                 "properties": {"osm_id": "w2"}}
            ]}"#,
        )
        .unwrap();
        let mut args = full_args();
        args.input = Some(input);
        args.output = Some(output.clone());
        let config = ConnectivityConfig::try_from(args).unwrap();
        config.execute().unwrap();

        let traced = read_collection(&output).unwrap();
        // The multi splits into two postfixed singles, both reachable.
        assert_eq!(traced.len(), 3);
        assert!(traced
            .iter()
            .all(|feature| feature.get(CONNECTED_KEY)
                == Some(&PropertyValue::Text("sea".to_owned()))));
    }
}
