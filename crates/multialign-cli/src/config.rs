use crate::cli::AlignArgs;
use crate::error::{CliError, Result};
use crate::utils::parser::{self, ParseError};
use multialign::core::alignment::selection::AtomSelection;
use multialign::engine::config::{BatchConfig, BatchConfigBuilder, FailurePolicy};
use multialign::engine::workers::WorkerRequest;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialParallelismConfig {
    #[serde(rename = "num-threads")]
    num_threads: Option<i64>,
    #[serde(rename = "numeric-threads")]
    numeric_threads: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialAlignmentConfig {
    #[serde(rename = "fit-selection")]
    fit_selection: Option<AtomSelection>,
    #[serde(rename = "rmsd-selection")]
    rmsd_selection: Option<AtomSelection>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialRunConfig {
    #[serde(rename = "fail-fast")]
    fail_fast: Option<bool>,
    report: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    parallelism: Option<PartialParallelismConfig>,
    alignment: Option<PartialAlignmentConfig>,
    run: Option<PartialRunConfig>,
}

/// Everything a run needs once file, `--set` and flag values are merged.
#[derive(Debug)]
pub struct RunSettings {
    pub batch: BatchConfig,
    pub report: Option<PathBuf>,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let to_cli_error = |source: anyhow::Error| CliError::FileParsing {
            path: path.to_path_buf(),
            source,
        };
        let content = std::fs::read_to_string(path).map_err(|e| to_cli_error(e.into()))?;
        toml::from_str(&content).map_err(|e| to_cli_error(e.into()))
    }

    /// Loads the file named by `--config`, or starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Merges with precedence `defaults < file < --set < explicit flags`.
    ///
    /// Values left unset everywhere fall through to the library defaults
    /// applied by [`BatchConfigBuilder::build`].
    pub fn merge_with_cli(mut self, args: &AlignArgs) -> Result<RunSettings> {
        self.apply_set_values(&args.set_values)
            .map_err(|e| CliError::Config(e.to_string()))?;

        let parallelism = self.parallelism.take().unwrap_or_default();
        let alignment = self.alignment.take().unwrap_or_default();
        let run = self.run.take().unwrap_or_default();

        let mut builder = BatchConfigBuilder::new().output_dir(args.outdir.clone());

        if let Some(raw) = args.num_threads.or(parallelism.num_threads) {
            let workers =
                WorkerRequest::from_raw(raw).map_err(|e| CliError::Config(e.to_string()))?;
            builder = builder.workers(workers);
        }
        if let Some(threads) = args.numeric_threads.or(parallelism.numeric_threads) {
            builder = builder.numeric_threads(threads);
        }
        if let Some(selection) = args.fit_selection.clone().or(alignment.fit_selection) {
            builder = builder.fit_selection(selection);
        }
        if let Some(selection) = args.rmsd_selection.clone().or(alignment.rmsd_selection) {
            builder = builder.rmsd_selection(selection);
        }
        // The flag can only switch fail-fast on; the file may set either value.
        if let Some(fail_fast) = args.fail_fast.then_some(true).or(run.fail_fast) {
            builder = builder.failure_policy(if fail_fast {
                FailurePolicy::FailFast
            } else {
                FailurePolicy::Continue
            });
        }

        let batch = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(RunSettings {
            batch,
            report: args.report.clone().or(run.report),
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> std::result::Result<(), ParseError> {
        for kv_pair in set_values {
            let (key, value) = parser::split_key_value(kv_pair)?;

            match key {
                "parallelism.num-threads" => {
                    self.parallelism
                        .get_or_insert_with(Default::default)
                        .num_threads = Some(parser::parse_value(key, value, "an integer")?);
                }
                "parallelism.numeric-threads" => {
                    self.parallelism
                        .get_or_insert_with(Default::default)
                        .numeric_threads =
                        Some(parser::parse_value(key, value, "a positive integer")?);
                }
                "alignment.fit-selection" => {
                    self.alignment
                        .get_or_insert_with(Default::default)
                        .fit_selection = Some(parser::parse_value(key, value, "an atom selection")?);
                }
                "alignment.rmsd-selection" => {
                    self.alignment
                        .get_or_insert_with(Default::default)
                        .rmsd_selection =
                        Some(parser::parse_value(key, value, "an atom selection")?);
                }
                "run.fail-fast" => {
                    self.run.get_or_insert_with(Default::default).fail_fast =
                        Some(parser::parse_value(key, value, "true or false")?);
                }
                "run.report" => {
                    self.run.get_or_insert_with(Default::default).report =
                        Some(PathBuf::from(value));
                }
                _ => return Err(ParseError::UnknownKey(key.to_string())),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use once_cell::sync::Lazy;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    static TEST_DIR: Lazy<TempDir> = Lazy::new(|| tempdir().expect("Failed to create temp dir"));

    fn write_config_file(name: &str, content: &str) -> PathBuf {
        let file_path = TEST_DIR.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn parse_args(extra: &[&str]) -> AlignArgs {
        let mut args = vec!["multialign", "--pdblist", "list.txt", "--outdir", "out"];
        args.extend_from_slice(extra);
        Cli::parse_from(args).align
    }

    #[test]
    fn defaults_apply_without_config_file() {
        let args = parse_args(&[]);
        let settings = PartialConfig::load(None).unwrap().merge_with_cli(&args).unwrap();

        assert_eq!(settings.batch.output_dir, PathBuf::from("out"));
        assert_eq!(settings.batch.parallelism.workers, WorkerRequest::Auto);
        assert_eq!(settings.batch.parallelism.numeric_threads.get(), 1);
        assert_eq!(settings.batch.alignment.fit_selection, AtomSelection::All);
        assert_eq!(settings.batch.alignment.rmsd_selection, AtomSelection::AlphaCarbon);
        assert_eq!(settings.batch.failure_policy, FailurePolicy::Continue);
        assert!(settings.report.is_none());
    }

    #[test]
    fn unset_values_match_library_defaults() {
        let args = parse_args(&[]);
        let settings = PartialConfig::default().merge_with_cli(&args).unwrap();
        let library = BatchConfigBuilder::new()
            .output_dir(PathBuf::from("out"))
            .build()
            .unwrap();
        assert_eq!(settings.batch, library);
    }

    #[test]
    fn fail_fast_flag_overrides_file_but_file_can_disable_it() {
        let config_path = write_config_file(
            "fail_fast_off.toml",
            r#"
            [run]
            fail-fast = false
            "#,
        );

        let args = parse_args(&[]);
        let settings = PartialConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();
        assert_eq!(settings.batch.failure_policy, FailurePolicy::Continue);

        let args = parse_args(&["--fail-fast"]);
        let settings = PartialConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();
        assert_eq!(settings.batch.failure_policy, FailurePolicy::FailFast);
    }

    #[test]
    fn file_values_are_loaded() {
        let config_path = write_config_file(
            "file_values.toml",
            r#"
            [parallelism]
            num-threads = 3
            numeric-threads = 2

            [alignment]
            fit-selection = "backbone"
            rmsd-selection = "name:CA,CB"

            [run]
            fail-fast = true
            report = "report.csv"
            "#,
        );
        let args = parse_args(&[]);
        let settings = PartialConfig::load(Some(&config_path))
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();

        assert_eq!(
            settings.batch.parallelism.workers,
            WorkerRequest::from_raw(3).unwrap()
        );
        assert_eq!(settings.batch.parallelism.numeric_threads.get(), 2);
        assert_eq!(settings.batch.alignment.fit_selection, AtomSelection::Backbone);
        assert_eq!(
            settings.batch.alignment.rmsd_selection,
            AtomSelection::Names(vec!["CA".to_string(), "CB".to_string()])
        );
        assert_eq!(settings.batch.failure_policy, FailurePolicy::FailFast);
        assert_eq!(settings.report, Some(PathBuf::from("report.csv")));
    }

    #[test]
    fn cli_flags_override_set_values_and_file() {
        let config_path = write_config_file(
            "override.toml",
            r#"
            [parallelism]
            num-threads = 3 # Will be overridden

            [alignment]
            fit-selection = "backbone" # Will be overridden by --set
            "#,
        );
        let args = parse_args(&[
            "--num_threads",
            "2",
            "-S",
            "parallelism.num-threads=5",
            "-S",
            "alignment.fit-selection=heavy",
            "--report",
            "cli.csv",
            "-S",
            "run.report=set.csv",
        ]);
        let settings = PartialConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();

        assert_eq!(
            settings.batch.parallelism.workers,
            WorkerRequest::from_raw(2).unwrap()
        );
        assert_eq!(settings.batch.alignment.fit_selection, AtomSelection::HeavyAtoms);
        assert_eq!(settings.report, Some(PathBuf::from("cli.csv")));
    }

    #[test]
    fn invalid_thread_counts_are_rejected() {
        for bad in ["0", "-2"] {
            let args = parse_args(&["--num_threads", bad]);
            let result = PartialConfig::default().merge_with_cli(&args);
            assert!(matches!(result, Err(CliError::Config(_))), "value {bad}");
        }

        let args = parse_args(&["--numeric-threads", "0"]);
        let result = PartialConfig::default().merge_with_cli(&args);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn unknown_set_key_is_rejected() {
        let args = parse_args(&["-S", "alignment.method=quaternion"]);
        let result = PartialConfig::default().merge_with_cli(&args);
        match result {
            Err(CliError::Config(msg)) => assert!(msg.contains("alignment.method")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn invalid_set_value_is_rejected() {
        let args = parse_args(&["-S", "run.fail-fast=sometimes"]);
        let result = PartialConfig::default().merge_with_cli(&args);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn unknown_file_field_is_a_parse_error() {
        let config_path = write_config_file(
            "unknown_field.toml",
            r#"
            [alignment]
            fit-selection = "all"
            weights = "mass"
            "#,
        );
        let result = PartialConfig::from_file(&config_path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn missing_config_file_error_names_the_path() {
        let missing = TEST_DIR.path().join("does_not_exist.toml");
        let result = PartialConfig::load(Some(&missing));
        match result {
            Err(err @ CliError::FileParsing { .. }) => {
                assert!(err.to_string().contains("does_not_exist.toml"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn invalid_selection_in_file_is_a_parse_error() {
        let config_path = write_config_file(
            "bad_selection.toml",
            r#"
            [alignment]
            rmsd-selection = "sidechain"
            "#,
        );
        let result = PartialConfig::from_file(&config_path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
