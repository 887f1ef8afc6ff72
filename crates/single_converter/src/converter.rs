//! Single-file conversion: one Selenium test class into one Playwright spec.
//!
//! The output is written in a fixed order (imports, suite, beforeEach, tests,
//! afterEach, close). The order is enforced by [`SuiteWriter`], which only
//! moves forward.

use crate::expression::ts_string;
use crate::rewriter::{LineRewriter, RewriteContext};
use crate::{ConversionComment, ConversionResult, Severity};
use java_parser::{extract, strip_annotations, ExtractedFile, MethodInfo};
use log::{debug, warn};

/// Suite name used when the source has no recognizable class signature.
pub const DEFAULT_SUITE_NAME: &str = "SeleniumTest";

const PLAYWRIGHT_IMPORT: &str = "import { test, expect } from '@playwright/test';";

/// Extract and convert in one step.
pub fn convert_source(source: &str) -> ConversionResult {
    convert_extracted(&extract(source))
}

pub fn convert_extracted(file: &ExtractedFile) -> ConversionResult {
    PlaywrightConverter::new(file).convert()
}

/// The statement lines of a method body with their 1-based source lines.
///
/// Annotations and the signature up to its `{` are dropped, as are blank
/// lines, lines holding a lone brace and the closing brace itself. A body
/// may start on the signature line.
pub fn method_statements(method: &MethodInfo) -> Vec<(usize, &str)> {
    let mut statements = Vec::new();
    let mut opened = false;
    let last = method.body.lines().count().saturating_sub(1);

    for (offset, line) in method.body.lines().enumerate() {
        let source_line = method.body_line + offset;
        let mut trimmed = line.trim();
        if offset == last && method.complete && trimmed != "}" {
            trimmed = trimmed.strip_suffix('}').unwrap_or(trimmed).trim_end();
        }

        if !opened {
            let code = strip_annotations(line);
            if let Some(brace) = code.find('{') {
                opened = true;
                let rest = code[brace + 1..].trim();
                let rest = rest.strip_suffix('}').unwrap_or(rest).trim();
                if !rest.is_empty() {
                    statements.push((source_line, rest));
                }
            }
            continue;
        }

        if trimmed.is_empty() || trimmed == "{" || trimmed == "}" {
            continue;
        }
        statements.push((source_line, trimmed));
    }

    statements
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Start,
    ImportsEmitted,
    SuiteOpened,
    BeforeEachEmitted,
    TestMethodsEmitted,
    AfterEachEmitted,
    SuiteClosed,
}

/// Append-only writer for a `test.describe` module.
struct SuiteWriter {
    out: String,
    stage: Stage,
}

impl SuiteWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            stage: Stage::Start,
        }
    }

    fn advance(&mut self, next: Stage) {
        // tests may repeat, every other stage is entered once
        debug_assert!(
            next > self.stage || (next == Stage::TestMethodsEmitted && self.stage == next),
            "suite stage {:?} after {:?}",
            next,
            self.stage
        );
        self.stage = next;
    }

    fn imports(&mut self) {
        self.advance(Stage::ImportsEmitted);
        self.out.push_str(PLAYWRIGHT_IMPORT);
        self.out.push_str("\n\n");
    }

    fn open(&mut self, suite: &str) {
        self.advance(Stage::SuiteOpened);
        self.out
            .push_str(&format!("test.describe({}, () => {{\n", ts_string(suite)));
    }

    fn block(&mut self, header: &str, lines: &[String]) {
        if self.stage > Stage::SuiteOpened {
            self.out.push('\n');
        }
        self.out.push_str("  ");
        self.out.push_str(header);
        self.out.push_str("async ({ page }) => {\n");
        for line in lines {
            self.out.push_str("    ");
            self.out.push_str(line);
            self.out.push('\n');
        }
        self.out.push_str("  });\n");
    }

    fn before_each(&mut self, lines: &[String]) {
        self.block("test.beforeEach(", lines);
        self.advance(Stage::BeforeEachEmitted);
    }

    fn test(&mut self, name: &str, lines: &[String]) {
        self.block(&format!("test({}, ", ts_string(name)), lines);
        self.advance(Stage::TestMethodsEmitted);
    }

    fn after_each(&mut self, lines: &[String]) {
        self.block("test.afterEach(", lines);
        self.advance(Stage::AfterEachEmitted);
    }

    fn close(mut self) -> String {
        self.advance(Stage::SuiteClosed);
        self.out.push_str("});\n");
        self.out
    }
}

/// Converts one extracted Java test class.
pub struct PlaywrightConverter<'a> {
    file: &'a ExtractedFile,
}

impl<'a> PlaywrightConverter<'a> {
    pub fn new(file: &'a ExtractedFile) -> Self {
        Self { file }
    }

    pub fn convert(&self) -> ConversionResult {
        let ctx = RewriteContext::default();
        let mut rewriter = LineRewriter::new(&ctx);
        let mut comments = Vec::new();

        if self.file.mentions("executeScript") || self.file.mentions("executeAsyncScript") {
            comments.push(ConversionComment::new(
                1,
                "JavaScript execution detected; calls are rewritten to page.evaluate and need review",
                Severity::Info,
            ));
        }

        let suite_name = self.file.class_name().unwrap_or(DEFAULT_SUITE_NAME);
        let methods: Vec<&MethodInfo> = self.file.methods().collect();
        debug!(
            "Converting {} ({} methods)",
            suite_name,
            methods.len()
        );

        let mut suite = SuiteWriter::new();
        suite.imports();
        suite.open(suite_name);

        let setup: Vec<String> = methods
            .iter()
            .filter(|m| m.is_setup_method)
            .flat_map(|m| rewrite_body(&mut rewriter, m))
            .collect();
        if methods.iter().any(|m| m.is_setup_method) {
            suite.before_each(&setup);
        } else {
            suite.before_each(&["// Setup code goes here".to_string()]);
        }

        let tests: Vec<&MethodInfo> = methods
            .iter()
            .copied()
            .filter(|m| m.is_test_method)
            .collect();
        if tests.is_empty() {
            let line = self
                .file
                .class_signature()
                .map_or(1, |class| class.source_line.max(1));
            comments.push(ConversionComment::new(
                line,
                "No test methods found, created a sample test",
                Severity::Warning,
            ));
            suite.test("sample test", &["// Test code goes here".to_string()]);
        }
        for method in tests {
            let body = rewrite_body(&mut rewriter, method);
            suite.test(&method.method_name, &body);
        }

        let teardown: Vec<&MethodInfo> = methods
            .iter()
            .copied()
            .filter(|m| m.is_teardown_method)
            .collect();
        if !teardown.is_empty() {
            let lines: Vec<String> = teardown
                .into_iter()
                .flat_map(|m| rewrite_body(&mut rewriter, m))
                .collect();
            suite.after_each(&lines);
        }

        comments.extend(rewriter.into_comments());
        comments.sort_by_key(|c| c.line);

        let manual = comments
            .iter()
            .filter(|c| c.severity == Severity::Warning)
            .count();
        if manual > 0 {
            warn!("{suite_name}: {manual} statements need manual review");
        }

        ConversionResult {
            code: suite.close(),
            comments,
        }
    }
}

fn rewrite_body(rewriter: &mut LineRewriter<'_>, method: &MethodInfo) -> Vec<String> {
    method_statements(method)
        .into_iter()
        .map(|(line, statement)| rewriter.rewrite(statement, line))
        .collect()
}
