//! The `crossings` subcommand: cross two feature classes and write one
//! classified point feature per intersection vertex.

use std::path::PathBuf;

use clap::Parser;
use log::info;
use mapcheck_core::{CrossingOptions, TagFilter, find_crossings};
use mapcheck_io::write_collection;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{CliError, read_single_geometries, require_existing, write_summary};

const ARG_INPUT_A: &str = "input-a";
const ARG_INPUT_B: &str = "input-b";
const ARG_OUTPUT: &str = "output";
const ARG_BRIDGE_KEY: &str = "bridge-key";
const ARG_TUNNEL_KEY: &str = "tunnel-key";
const ENV_INPUT_A: &str = "MAPCHECK_CMDS_CROSSINGS_INPUT_A";
const ENV_INPUT_B: &str = "MAPCHECK_CMDS_CROSSINGS_INPUT_B";
const ENV_OUTPUT: &str = "MAPCHECK_CMDS_CROSSINGS_OUTPUT";
const ENV_BRIDGE_KEY: &str = "MAPCHECK_CMDS_CROSSINGS_BRIDGE_KEY";
const ENV_TUNNEL_KEY: &str = "MAPCHECK_CMDS_CROSSINGS_TUNNEL_KEY";

pub(crate) fn run(args: CrossingsArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    config.execute()
}

/// CLI arguments for the `crossings` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Detect crossings between two feature classes and classify \
                  each one by its structural tags. Options can come from CLI \
                  flags, configuration files, or environment variables.",
    about = "Detect and classify crossings between two feature classes"
)]
#[ortho_config(prefix = "MAPCHECK")]
pub struct CrossingsArgs {
    /// Path to the first class (e.g. roads).
    #[arg(long = ARG_INPUT_A, value_name = "path")]
    #[serde(default)]
    input_a: Option<PathBuf>,
    /// Path to the second class (e.g. waterways).
    #[arg(long = ARG_INPUT_B, value_name = "path")]
    #[serde(default)]
    input_b: Option<PathBuf>,
    /// Where to write the crossing records.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    output: Option<PathBuf>,
    /// Where to write the classification summary, if anywhere.
    #[arg(long, value_name = "path")]
    #[serde(default)]
    summary: Option<PathBuf>,
    /// Property marking a bridge on the first class.
    #[arg(long = ARG_BRIDGE_KEY, value_name = "key")]
    #[serde(default)]
    bridge_key: Option<String>,
    /// Accepted bridge value; repeat for several. Absent means any
    /// non-empty value counts.
    #[arg(long, value_name = "value")]
    #[serde(default)]
    bridge_value: Vec<String>,
    /// Property marking a tunnel on the second class.
    #[arg(long = ARG_TUNNEL_KEY, value_name = "key")]
    #[serde(default)]
    tunnel_key: Option<String>,
    /// Accepted tunnel value; repeat for several.
    #[arg(long, value_name = "value")]
    #[serde(default)]
    tunnel_value: Vec<String>,
    /// Name of the first class in the paired id properties.
    #[arg(long, value_name = "label")]
    #[serde(default)]
    label_a: Option<String>,
    /// Name of the second class.
    #[arg(long, value_name = "label")]
    #[serde(default)]
    label_b: Option<String>,
}

impl CrossingsArgs {
    fn into_config(self) -> Result<CrossingsConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        CrossingsConfig::try_from(merged)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CrossingsConfig {
    input_a: PathBuf,
    input_b: PathBuf,
    output: PathBuf,
    summary: Option<PathBuf>,
    options: CrossingOptions,
}

impl CrossingsConfig {
    fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.input_a, ARG_INPUT_A)?;
        require_existing(&self.input_b, ARG_INPUT_B)?;
        Ok(())
    }

    fn execute(&self) -> Result<(), CliError> {
        let features_a = read_single_geometries(&self.input_a)?;
        let features_b = read_single_geometries(&self.input_b)?;
        let report = find_crossings(&features_a, &features_b, &self.options);
        write_collection(&self.output, &report.records)?;
        if let Some(path) = &self.summary {
            write_summary(path, &report.summary)?;
        }
        info!(
            "crossing check: {} record(s) written to {}, {} undocumented pair(s)",
            report.records.len(),
            self.output.display(),
            report.summary.undocumented
        );
        Ok(())
    }
}

fn structural_filter(key: String, values: Vec<String>) -> TagFilter {
    if values.is_empty() {
        TagFilter::present(key)
    } else {
        TagFilter::one_of(key, values)
    }
}

impl TryFrom<CrossingsArgs> for CrossingsConfig {
    type Error = CliError;

    fn try_from(args: CrossingsArgs) -> Result<Self, Self::Error> {
        let input_a = args.input_a.ok_or(CliError::MissingArgument {
            field: ARG_INPUT_A,
            env: ENV_INPUT_A,
        })?;
        let input_b = args.input_b.ok_or(CliError::MissingArgument {
            field: ARG_INPUT_B,
            env: ENV_INPUT_B,
        })?;
        let output = args.output.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT,
            env: ENV_OUTPUT,
        })?;
        let bridge_key = args.bridge_key.ok_or(CliError::MissingArgument {
            field: ARG_BRIDGE_KEY,
            env: ENV_BRIDGE_KEY,
        })?;
        let tunnel_key = args.tunnel_key.ok_or(CliError::MissingArgument {
            field: ARG_TUNNEL_KEY,
            env: ENV_TUNNEL_KEY,
        })?;
        let mut options = CrossingOptions::new(
            structural_filter(bridge_key, args.bridge_value),
            structural_filter(tunnel_key, args.tunnel_value),
        );
        if let Some(label) = args.label_a {
            options.label_a = label;
        }
        if let Some(label) = args.label_b {
            options.label_b = label;
        }
        Ok(Self {
            input_a,
            input_b,
            output,
            summary: args.summary,
            options,
        })
    }
}
