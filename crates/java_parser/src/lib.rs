//! # Java Selenium source extraction
//!
//! Pulls structural fragments out of a Java Selenium test file using plain text
//! patterns: imports, the class signature, methods, element locators, assertions,
//! waits and element actions.
//!
//! ## Core Philosophy
//! - No syntax tree. A bounded set of idioms is recognized, everything else is ignored
//! - Extraction is a pure function of the text: same input, same fragments, same lines
//! - The source text is kept next to the fragments, never rebuilt from them

use thiserror::Error;

pub mod braces;
pub mod extractor;
pub mod fragment;

/// Failures of the low-level scanners. Extraction itself never fails; these
/// surface as `complete: false` on method fragments and to callers that need
/// a balanced block (page-object conversion, build-file reading).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("No opening brace found after offset {0}")]
    NoOpeningBrace(usize),

    #[error("Block opened at line {line} is never closed")]
    UnterminatedBlock { line: usize },
}

pub use braces::{block_body, block_end};
pub use extractor::{extract, package_name, strip_annotations, ExtractedFile, JavaExtractor};
pub use fragment::{
    ActionType, FragmentAttributes, FragmentKind, LocatorKind, MethodInfo, ParsedFragment,
};
