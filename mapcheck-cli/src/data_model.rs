//! The `data-model` subcommand: validate feature tags against a rules
//! file and write the flagged collection back out.

use std::path::PathBuf;

use clap::Parser;
use log::info;
use mapcheck_core::{ValidateOptions, ValidationSummary, check_data_model};
use mapcheck_io::{read_collection, write_collection};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{CliError, load_model, require_existing, write_summary};

const ARG_INPUT: &str = "input";
const ARG_MODEL: &str = "model";
const ARG_OUTPUT: &str = "output";
const ENV_INPUT: &str = "MAPCHECK_CMDS_DATA_MODEL_INPUT";
const ENV_MODEL: &str = "MAPCHECK_CMDS_DATA_MODEL_MODEL";
const ENV_OUTPUT: &str = "MAPCHECK_CMDS_DATA_MODEL_OUTPUT";

const DEFAULT_FLAG_SUFFIX: &str = "_flag";

pub(crate) fn run(args: DataModelArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    config.execute()
}

/// CLI arguments for the `data-model` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Validate feature tags against a declarative data model. \
                  Paths can come from CLI flags, configuration files, or \
                  environment variables.",
    about = "Validate feature tags against a data model"
)]
#[ortho_config(prefix = "MAPCHECK")]
pub struct DataModelArgs {
    /// Path to the GeoJSON collection to check.
    #[arg(long = ARG_INPUT, value_name = "path")]
    #[serde(default)]
    input: Option<PathBuf>,
    /// Path to the JSON data-model rules.
    #[arg(long = ARG_MODEL, value_name = "path")]
    #[serde(default)]
    model: Option<PathBuf>,
    /// Where to write the checked collection.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    output: Option<PathBuf>,
    /// Where to write the flag-distribution summary, if anywhere.
    #[arg(long, value_name = "path")]
    #[serde(default)]
    summary: Option<PathBuf>,
    /// Emit raw governed values instead of their coerced form.
    #[arg(long)]
    #[serde(default)]
    keep_original: bool,
    /// Suffix appended to governed keys for their flag property.
    #[arg(long, value_name = "suffix")]
    #[serde(default)]
    flag_suffix: Option<String>,
}

impl DataModelArgs {
    fn into_config(self) -> Result<DataModelConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        DataModelConfig::try_from(merged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DataModelConfig {
    input: PathBuf,
    model: PathBuf,
    output: PathBuf,
    summary: Option<PathBuf>,
    keep_original: bool,
    flag_suffix: String,
}

impl DataModelConfig {
    fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.input, ARG_INPUT)?;
        require_existing(&self.model, ARG_MODEL)?;
        Ok(())
    }

    fn execute(&self) -> Result<(), CliError> {
        let model = load_model(&self.model)?;
        let features = read_collection(&self.input)?;
        let options = ValidateOptions {
            keep_original: self.keep_original,
            flag_suffix: self.flag_suffix.clone(),
            ..ValidateOptions::default()
        };
        let checked = check_data_model(&features, &model, &options);
        write_collection(&self.output, &checked)?;
        if let Some(path) = &self.summary {
            let summary = ValidationSummary::tally(&checked, &model, &self.flag_suffix);
            write_summary(path, &summary)?;
        }
        info!(
            "data-model check: {} feature(s) written to {}",
            checked.len(),
            self.output.display()
        );
        Ok(())
    }
}

impl TryFrom<DataModelArgs> for DataModelConfig {
    type Error = CliError;

    fn try_from(args: DataModelArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_INPUT,
        })?;
        let model = args.model.ok_or(CliError::MissingArgument {
            field: ARG_MODEL,
            env: ENV_MODEL,
        })?;
        let output = args.output.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT,
            env: ENV_OUTPUT,
        })?;
        Ok(Self {
            input,
            model,
            output,
            summary: args.summary,
            keep_original: args.keep_original,
            flag_suffix: args
                .flag_suffix
                .unwrap_or_else(|| DEFAULT_FLAG_SUFFIX.to_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapcheck_core::PropertyValue;
    use rstest::rstest;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn args(input: Option<&Path>, model: Option<&Path>, output: Option<&Path>) -> DataModelArgs {
        DataModelArgs {
            input: input.map(Path::to_path_buf),
            model: model.map(Path::to_path_buf),
            output: output.map(Path::to_path_buf),
            ..DataModelArgs::default()
        }
    }

    #[test]
    fn missing_output_is_reported_with_env_hint() {
        let error = DataModelConfig::try_from(args(
            Some(Path::new("raw.geojson")),
            Some(Path::new("model.json")),
            None,
        ))
        .unwrap_err();
        assert!(matches!(
            error,
            CliError::MissingArgument {
                field: "output",
                env: ENV_OUTPUT,
            }
        ));
    }

    #[rstest]
    #[case(None, "_flag")]
    #[case(Some("_check"), "_check")]
    fn flag_suffix_defaults(#[case] given: Option<&str>, #[case] expected: &str) {
        let mut parsed = args(
            Some(Path::new("raw.geojson")),
            Some(Path::new("model.json")),
            Some(Path::new("out.geojson")),
        );
        parsed.flag_suffix = given.map(str::to_owned);
        let config = DataModelConfig::try_from(parsed).unwrap();
        assert_eq!(config.flag_suffix, expected);
    }

    #[test]
    fn executes_end_to_end() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.geojson");
        let model = dir.path().join("model.json");
        let output = dir.path().join("checked.geojson");
        let summary = dir.path().join("summary.json");
        fs::write(
            &input,
            r#"{"type": "FeatureCollection", "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
                "properties": {"width": "4.2"}
            }]}"#,
        )
        .unwrap();
        fs::write(
            &model,
            r#"{"types": {"width": "real"}, "ranges": {"width": [0.5, 30.0]}, "conditions": {}}"#,
        )
        .unwrap();

        let config = DataModelConfig {
            input,
            model,
            output: output.clone(),
            summary: Some(summary.clone()),
            keep_original: false,
            flag_suffix: DEFAULT_FLAG_SUFFIX.to_owned(),
        };
        config.validate_sources().unwrap();
        config.execute().unwrap();

        let checked = read_collection(&output).unwrap();
        assert_eq!(
            checked[0].get("width_flag"),
            Some(&PropertyValue::Integer(0))
        );
        assert_eq!(checked[0].get("width"), Some(&PropertyValue::Real(4.2)));
        let rendered = fs::read_to_string(&summary).unwrap();
        let tallies: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(tallies["keys"]["width"]["correct"], 1);
    }
}
