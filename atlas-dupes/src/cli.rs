use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use atlas_dupes::{
    AnalysisConfig, AnalysisReport, AssetKind, FsSourceConfig, ProjectConfig, analyze_fs, output,
};
use clap::{Parser, ValueEnum};
use colored::Colorize;

use crate::logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "atlas-dupes",
    about = "Find textures that are packed into more than one sprite atlas",
    version
)]
pub struct Cli {
    /// Atlas files or folders containing atlases
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Project root used to resolve GUIDs through .meta files
    #[arg(short = 'p', long = "project", default_value = ".")]
    pub project: PathBuf,

    /// Exclude files matching this glob (repeatable)
    #[arg(short = 'e', long = "exclude")]
    pub exclude: Vec<String>,

    /// Also count references to this asset kind (repeatable)
    #[arg(short = 'k', long = "include-kind", value_parser = parse_kind)]
    pub include_kinds: Vec<AssetKind>,

    /// Only list duplicates whose name or path contains this text (case-insensitive).
    /// Counts, verdict and exit status still cover every duplicate
    #[arg(short = 'f', long = "filter")]
    pub filter: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Maximum size of a single file in bytes
    #[arg(long = "max-file-size")]
    pub max_file_size: Option<u64>,

    /// Follow symbolic links while walking folders
    #[arg(long = "follow-links")]
    pub follow_links: bool,

    /// Exit with status 1 when any duplicate is reported
    #[arg(long = "fail-on-duplicates")]
    pub fail_on_duplicates: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn parse_kind(s: &str) -> Result<AssetKind, String> {
    s.parse()
}

impl Cli {
    fn fs_config(&self) -> FsSourceConfig {
        let mut config = FsSourceConfig::default();
        config.paths.clone_from(&self.paths);
        config.exclude.clone_from(&self.exclude);
        config.follow_links = self.follow_links;
        if let Some(max) = self.max_file_size {
            config.max_file_size = max;
        }
        config
    }

    fn project_config(&self) -> ProjectConfig {
        let mut config = ProjectConfig::default();
        config.root.clone_from(&self.project);
        config
    }

    fn analysis_config(&self) -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        for kind in &self.include_kinds {
            if !config.accepts(*kind) {
                config.accepted_kinds.push(*kind);
            }
        }
        config
    }
}

/// Parse arguments, run one analysis and print the report.
///
/// Returns `Ok(false)` when `--fail-on-duplicates` is set and duplicates were found.
pub fn run() -> Result<bool> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    execute(&cli, &mut std::io::stdout().lock())
}

/// Run the analysis described by `cli` and write the report to `out`.
///
/// # Errors
/// Returns an error if the analysis cannot start or the report cannot be written.
pub fn execute(cli: &Cli, out: &mut dyn Write) -> Result<bool> {
    let report = analyze_fs(&cli.fs_config(), &cli.project_config(), &cli.analysis_config())
        .context("Atlas analysis failed")?;

    match cli.format {
        OutputFormat::Json => output::write_json(&report, out)?,
        OutputFormat::Human => {
            let filter = cli.filter.as_deref().unwrap_or_default();
            output::write_human_filtered(&report, filter, out)?;
            print_verdict(&report);
        }
    }

    Ok(!(cli.fail_on_duplicates && report.has_duplicates()))
}

/// One colored summary line on stderr, so piped stdout stays plain.
fn print_verdict(report: &AnalysisReport) {
    if report.nothing_to_analyze {
        eprintln!("{}", "nothing to analyze".yellow());
    } else if report.has_duplicates() {
        eprintln!(
            "{}",
            format!("{} image(s) shared between atlases", report.duplicates_count())
                .red()
                .bold()
        );
    } else {
        eprintln!("{}", "no shared images".green());
    }
    if !report.scan_errors.is_empty() {
        eprintln!(
            "{}",
            format!("{} file(s) left out, see warnings", report.scan_errors.len()).yellow()
        );
    }
}
