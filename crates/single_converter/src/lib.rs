//! Selenium statement rewriting and single-file Playwright conversion.

pub mod converter;
pub mod expression;
pub mod locator;
pub mod rewriter;

use serde::{Deserialize, Serialize};

/// How urgently a review comment needs attention. `Error` is advisory: no
/// conversion is ever aborted because of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A review note attached to converted output. `line` is the 1-based Java
/// source line, or 0 when the note has no single source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionComment {
    pub line: usize,
    pub text: String,
    #[serde(rename = "type")]
    pub severity: Severity,
}

impl ConversionComment {
    pub fn new(line: usize, text: impl Into<String>, severity: Severity) -> Self {
        Self {
            line,
            text: text.into(),
            severity,
        }
    }
}

/// Generated Playwright code plus every review comment collected on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub code: String,
    pub comments: Vec<ConversionComment>,
}

pub use converter::{convert_extracted, convert_source, PlaywrightConverter};
pub use locator::{convert_locator, convert_locator_on, reverse_locator, LocatorConversion};
pub use rewriter::{rewrite_line, LineRewriter, RewriteContext, RewrittenLine, RuleCategory, MANUAL_MARKER};
