use clap::{Args, Parser};
use multialign::core::alignment::selection::AtomSelection;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "multialign contributors",
    version,
    about = "multialign - Superimpose a batch of PDB structures onto a common reference in parallel, reporting RMSD before and after each alignment.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    #[command(flatten)]
    pub align: AlignArgs,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Arguments controlling a batch alignment run.
#[derive(Args, Debug)]
pub struct AlignArgs {
    // --- Core Arguments ---
    /// File listing one structure path per line. The first entry is the reference.
    #[arg(long, required = true, value_name = "PATH")]
    pub pdblist: PathBuf,

    /// Directory that receives the reference copy and every aligned target.
    #[arg(long, required = true, value_name = "PATH")]
    pub outdir: PathBuf,

    /// Number of worker threads. -1 uses every available core.
    #[arg(
        short = 'j',
        long = "num_threads",
        visible_alias = "num-threads",
        value_name = "INT",
        allow_negative_numbers = true
    )]
    pub num_threads: Option<i64>,

    // --- Alignment Overrides ---
    /// Slices each task splits its coordinate update into.
    #[arg(long, value_name = "INT")]
    pub numeric_threads: Option<usize>,

    /// Atoms used to compute the superposition: all, backbone, ca, heavy, or name:A,B,...
    #[arg(long, value_name = "SELECTION")]
    pub fit_selection: Option<AtomSelection>,

    /// Atoms used for the before/after RMSD report (same syntax as --fit-selection).
    #[arg(long, value_name = "SELECTION")]
    pub rmsd_selection: Option<AtomSelection>,

    // --- Run Overrides ---
    /// Skip remaining targets after the first failure.
    #[arg(long)]
    pub fail_fast: bool,

    /// Write a per-target CSV report to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S parallelism.numeric-threads=2
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Cli, clap::Error> {
        let mut args = vec!["multialign", "--pdblist", "list.txt", "--outdir", "out"];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args)
    }

    #[test]
    fn minimal_arguments_parse_with_defaults() {
        let cli = parse(&[]).unwrap();

        assert_eq!(cli.align.pdblist, PathBuf::from("list.txt"));
        assert_eq!(cli.align.outdir, PathBuf::from("out"));
        assert_eq!(cli.align.num_threads, None);
        assert!(!cli.align.fail_fast);
        assert!(cli.align.set_values.is_empty());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn thread_count_accepts_all_spellings_and_negative_one() {
        assert_eq!(parse(&["--num_threads", "4"]).unwrap().align.num_threads, Some(4));
        assert_eq!(parse(&["--num-threads", "2"]).unwrap().align.num_threads, Some(2));
        assert_eq!(parse(&["-j", "-1"]).unwrap().align.num_threads, Some(-1));
    }

    #[test]
    fn missing_required_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["multialign", "--outdir", "out"]).is_err());
        assert!(Cli::try_parse_from(["multialign", "--pdblist", "list.txt"]).is_err());
    }

    #[test]
    fn selections_are_parsed() {
        let cli = parse(&["--fit-selection", "backbone", "--rmsd-selection", "name:CA,CB"]).unwrap();
        assert_eq!(cli.align.fit_selection, Some(AtomSelection::Backbone));
        assert_eq!(
            cli.align.rmsd_selection,
            Some(AtomSelection::Names(vec!["CA".to_string(), "CB".to_string()]))
        );
        assert!(parse(&["--fit-selection", "sidechain"]).is_err());
    }

    #[test]
    fn set_values_are_repeatable() {
        let cli = parse(&["-S", "run.fail-fast=true", "--set", "parallelism.num-threads=2"]).unwrap();
        assert_eq!(
            cli.align.set_values,
            vec!["run.fail-fast=true", "parallelism.num-threads=2"]
        );
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(parse(&["-q", "-v"]).is_err());
    }
}
