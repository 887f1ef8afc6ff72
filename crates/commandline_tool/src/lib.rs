use anyhow::{Context, Result};
use batch_processor::{BatchConfig, BatchConversionResult, BatchConverter};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use project_analy::{
    GradleProject, ProjectAnalyzer, ProjectStructure, collect_project_files, parse_gradle,
    read_sources,
};
use project_writer::{ProjectWriter, WriteReport};
use single_converter::{ConversionResult, convert_source};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "selenium2pw")]
#[command(version)]
#[command(about = "Selenium Java to Playwright TypeScript", long_about = None)]
pub struct Cli {
    /// Show debug logs on the console and in log/latest.log
    #[arg(long, short = 'd', global = true)]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert one Java test class into a Playwright spec
    ConvertFile {
        /// Java source file (required)
        #[arg(long, short, value_name = "FILE", required = true)]
        input: PathBuf,

        /// Where to write the spec (default: stdout)
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print code and comments as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify the classes of a Selenium project and map their dependencies
    Analyze {
        /// Project root (required)
        #[arg(long, short, value_name = "DIR", required = true)]
        input_dir: PathBuf,

        /// Print the full summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a whole Selenium project into a Playwright project
    ConvertProject {
        /// Project root (required)
        #[arg(long, short, value_name = "DIR", required = true)]
        input_dir: PathBuf,

        /// Output directory (default: <input_dir>_playwright next to the input)
        #[arg(long, short, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Replace a non-empty output directory
        #[arg(long)]
        force: bool,
    },

    /// Print what a Gradle build file declares, as JSON
    InspectBuild {
        /// build.gradle or build.gradle.kts (required)
        #[arg(long, short, value_name = "FILE", required = true)]
        input: PathBuf,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

fn progress_style_bar() -> ProgressStyle {
    ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Convert one Java file.
pub fn run_convert_file(input: &Path) -> Result<ConversionResult> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let result = convert_source(&source);
    info!(
        "Converted {} with {} review comments",
        input.display(),
        result.comments.len()
    );
    Ok(result)
}

/// Read every project file under `input_dir` and analyze the project.
/// Unreadable files are logged and left out.
pub async fn load_project(input_dir: &Path, read_concurrency: usize) -> Result<ProjectStructure> {
    let paths = collect_project_files(input_dir)?;
    info!(
        "Reading {} project files from {}",
        paths.len(),
        input_dir.display()
    );
    let report = read_sources(input_dir, paths, read_concurrency).await;
    for failure in &report.failures {
        warn!("Skipped unreadable file: {failure}");
    }
    let structure = ProjectAnalyzer::new(report.files).analyze();
    if structure.classes.is_empty() {
        warn!("No Java classes found under {}", input_dir.display());
    }
    Ok(structure)
}

pub async fn run_analyze(input_dir: &Path, config: &BatchConfig) -> Result<ProjectStructure> {
    load_project(input_dir, config.read_concurrency).await
}

/// Analyze, convert and write a whole project.
pub async fn run_convert_project(
    input_dir: &Path,
    output_dir: &Path,
    force: bool,
    config: BatchConfig,
) -> Result<(BatchConversionResult, WriteReport)> {
    let structure = load_project(input_dir, config.read_concurrency).await?;

    let progress = ProgressBar::new(structure.classes.len() as u64);
    progress.set_style(progress_style_bar());
    progress.set_message("converting classes");
    let result =
        BatchConverter::new(&structure, config).convert_with_progress(|_| progress.inc(1));
    progress.finish_and_clear();

    let summary = structure.summary();
    let written = ProjectWriter::new(output_dir, force).write(&result, Some(&summary))?;
    Ok((result, written))
}

pub fn run_inspect_build(input: &Path) -> Result<GradleProject> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    Ok(parse_gradle(&content))
}

/// `<parent>/<name>_playwright` next to `input_dir`.
pub fn default_output_dir_for(input_dir: &Path) -> PathBuf {
    let parent = input_dir.parent().unwrap_or_else(|| Path::new("."));
    let dir_name = input_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    parent.join(format!("{}_playwright", dir_name))
}
