//! Writes a converted project to disk.
//!
//! Takes a finished `BatchConversionResult` and lays it out under one output
//! directory: converted classes, scaffolding, copied resources, and a
//! `conversion-report.json` with every review comment and failure.

use anyhow::{bail, Context, Result};
use batch_processor::{BatchConversionResult, BatchSummary, ConversionFailure, Strategy};
use chrono::{DateTime, Utc};
use log::{debug, info};
use project_analy::ProjectSummary;
use serde::Serialize;
use single_converter::ConversionComment;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const REPORT_FILE: &str = "conversion-report.json";

/// Per-file entry of the report. Code is left out; it is on disk.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry<'a> {
    pub file_path: &'a str,
    pub class_name: &'a str,
    pub strategy: Strategy,
    pub comments: &'a [ConversionComment],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub summary: BatchSummary,
    pub files: Vec<ReportEntry<'a>>,
    pub failures: &'a [ConversionFailure],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<&'a ProjectSummary>,
}

impl<'a> ConversionReport<'a> {
    pub fn new(result: &'a BatchConversionResult, analysis: Option<&'a ProjectSummary>) -> Self {
        Self {
            generated_at: Utc::now(),
            summary: result.summary,
            files: result
                .outputs
                .iter()
                .map(|output| ReportEntry {
                    file_path: &output.file_path,
                    class_name: &output.class_name,
                    strategy: output.strategy,
                    comments: &output.comments,
                })
                .collect(),
            failures: &result.failures,
            analysis,
        }
    }
}

/// What [`ProjectWriter::write`] put on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub files_written: usize,
    pub report_path: PathBuf,
}

pub struct ProjectWriter {
    output_path: PathBuf,
    overwrite: bool,
}

impl ProjectWriter {
    /// An existing non-empty output directory is an error unless
    /// `overwrite` is set, in which case it is removed first.
    pub fn new(output_path: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            output_path: output_path.into(),
            overwrite,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn write(
        &self,
        result: &BatchConversionResult,
        analysis: Option<&ProjectSummary>,
    ) -> Result<WriteReport> {
        self.prepare_output_dir()?;

        let mut files_written = 0;
        for output in &result.outputs {
            self.write_file(&output.file_path, &output.converted_code)?;
            files_written += 1;
        }
        for file in result.config_files.iter().chain(&result.resource_files) {
            self.write_file(&file.file_path, &file.content)?;
            files_written += 1;
        }

        let report = ConversionReport::new(result, analysis);
        let report_path = self.output_path.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        fs::write(&report_path, json)
            .with_context(|| format!("Failed to write {}", report_path.display()))?;

        info!(
            "Wrote {} files to {}",
            files_written,
            self.output_path.display()
        );
        Ok(WriteReport {
            files_written,
            report_path,
        })
    }

    fn prepare_output_dir(&self) -> Result<()> {
        if self.output_path.exists() {
            let has_entries = fs::read_dir(&self.output_path)
                .with_context(|| format!("Failed to read {}", self.output_path.display()))?
                .next()
                .is_some();
            if has_entries {
                if !self.overwrite {
                    bail!(
                        "Output directory {} is not empty",
                        self.output_path.display()
                    );
                }
                fs::remove_dir_all(&self.output_path)
                    .context("Failed to clean existing output directory")?;
            }
        }
        fs::create_dir_all(&self.output_path).context("Failed to create output directory")?;
        Ok(())
    }

    fn write_file(&self, relative: &str, content: &str) -> Result<()> {
        let target = self.resolve(relative)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&target, content)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        debug!("Wrote {}", target.display());
        Ok(())
    }

    /// Joins `relative` onto the output directory, refusing anything that
    /// would land outside it.
    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let path = Path::new(relative);
        let inside = path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !inside || relative.is_empty() {
            bail!("Refusing to write outside the output directory: {relative}");
        }
        Ok(self.output_path.join(path))
    }
}
