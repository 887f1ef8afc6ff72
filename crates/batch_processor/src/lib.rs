//! # Project conversion
//!
//! Turns an analyzed Selenium project into a Playwright project: test classes
//! become spec files, page objects become Playwright page-object classes,
//! utility classes become modules of exported functions. Four scaffolding
//! files are always added.
//!
//! Each class converts on its own. A class that fails is recorded in
//! [`BatchConversionResult::failures`] and the rest of the batch carries on.

use serde::Serialize;
use single_converter::ConversionComment;
use thiserror::Error;

pub mod page_object;
pub mod paths;
pub mod pkg_config;
pub mod processor;
pub mod signature;
pub mod templates;
pub mod utility;

pub use pkg_config::BatchConfig;
pub use processor::{BatchConverter, Strategy};

/// Why one class could not be converted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Method {method} of {class} (line {line}) is never closed")]
    UnterminatedMethod {
        class: String,
        method: String,
        line: usize,
    },

    #[error("Conversion of {class} panicked: {message}")]
    Panicked { class: String, message: String },
}

/// One converted class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutput {
    pub file_path: String,
    pub class_name: String,
    pub strategy: Strategy,
    pub original_code: String,
    pub converted_code: String,
    pub comments: Vec<ConversionComment>,
}

/// A file emitted as-is: scaffolding or a copied resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    pub file_path: String,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(file_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionFailure {
    /// Java path of the class that failed.
    pub file_path: String,
    pub error: String,
}

/// Counts over every scanned class. Each class lands in exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_files: usize,
    pub converted_files: usize,
    pub skipped_files: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn is_balanced(&self) -> bool {
        self.converted_files + self.skipped_files + self.errors == self.total_files
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConversionResult {
    pub outputs: Vec<ConversionOutput>,
    pub config_files: Vec<GeneratedFile>,
    pub resource_files: Vec<GeneratedFile>,
    pub summary: BatchSummary,
    pub failures: Vec<ConversionFailure>,
}
