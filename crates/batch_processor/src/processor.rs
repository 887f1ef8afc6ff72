use crate::page_object::convert_page_object;
use crate::paths::{convert_file_path, convert_resource_path, relative_import_path};
use crate::templates::config_files;
use crate::utility::convert_utility;
use crate::{
    BatchConfig, BatchConversionResult, BatchSummary, ConversionFailure, ConversionOutput,
    ConvertError, GeneratedFile,
};
use log::{debug, info, warn};
use project_analy::gradle::{DEFAULT_SOURCE_DIR, DEFAULT_TEST_DIR};
use project_analy::{JavaClassRecord, ProjectStructure};
use rayon::prelude::*;
use serde::Serialize;
use single_converter::{convert_extracted, ConversionResult};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// How a class is converted. Every class gets at most one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    Test,
    PageObject,
    Utility,
}

impl Strategy {
    /// Tests with `@Test` methods win, then page objects, then utilities,
    /// then any remaining test class. `None` means the class is skipped.
    pub fn for_class(class: &JavaClassRecord) -> Option<Self> {
        let has_tests = class.extracted().methods().any(|m| m.is_test_method);
        if class.is_test_class() && has_tests {
            Some(Self::Test)
        } else if class.is_page_object_class() {
            Some(Self::PageObject)
        } else if class.is_utility_class() {
            Some(Self::Utility)
        } else if class.is_test_class() {
            Some(Self::Test)
        } else {
            None
        }
    }
}

enum Outcome {
    Converted(ConversionOutput),
    Failed(ConversionFailure),
    Skipped,
}

/// Converts every class of an analyzed project.
pub struct BatchConverter<'a> {
    structure: &'a ProjectStructure,
    config: BatchConfig,
    roots: Vec<String>,
}

impl<'a> BatchConverter<'a> {
    pub fn new(structure: &'a ProjectStructure, config: BatchConfig) -> Self {
        let mut roots: Vec<String> = structure
            .gradle
            .iter()
            .flat_map(|gradle| gradle.java_roots().map(str::to_string))
            .collect();
        for default in [DEFAULT_SOURCE_DIR, DEFAULT_TEST_DIR] {
            if !roots.iter().any(|root| root == default) {
                roots.push(default.to_string());
            }
        }
        Self {
            structure,
            config,
            roots,
        }
    }

    pub fn convert(&self) -> BatchConversionResult {
        self.convert_with_progress(|_| {})
    }

    /// Like [`convert`](Self::convert), calling `on_class` with each class's
    /// path once it is done. Calls may come from several threads.
    pub fn convert_with_progress<F>(&self, on_class: F) -> BatchConversionResult
    where
        F: Fn(&str) + Sync,
    {
        let classes = &self.structure.classes;
        info!("Converting {} classes", classes.len());

        let convert_all = || {
            classes
                .par_iter()
                .map(|class| {
                    let outcome = self.convert_isolated(class);
                    on_class(&class.file_path);
                    outcome
                })
                .collect::<Vec<_>>()
        };
        let outcomes = match self.thread_pool() {
            Some(pool) => pool.install(convert_all),
            None => convert_all(),
        };

        let mut result = BatchConversionResult {
            config_files: config_files(),
            ..Default::default()
        };
        let mut skipped = 0;
        for outcome in outcomes {
            match outcome {
                Outcome::Converted(output) => result.outputs.push(output),
                Outcome::Failed(failure) => result.failures.push(failure),
                Outcome::Skipped => skipped += 1,
            }
        }

        if self.config.include_resources {
            result.resource_files = self
                .structure
                .resource_files
                .iter()
                .map(|file| {
                    GeneratedFile::new(
                        convert_resource_path(&file.path, &self.roots),
                        file.content.clone(),
                    )
                })
                .collect();
        }

        result.summary = BatchSummary {
            total_files: classes.len(),
            converted_files: result.outputs.len(),
            skipped_files: skipped,
            errors: result.failures.len(),
        };
        debug_assert!(result.summary.is_balanced());
        info!(
            "Converted {} of {} classes ({} skipped, {} failed)",
            result.summary.converted_files,
            result.summary.total_files,
            result.summary.skipped_files,
            result.summary.errors
        );
        result
    }

    fn thread_pool(&self) -> Option<rayon::ThreadPool> {
        if self.config.worker_count == 0 {
            return None;
        }
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_count)
            .build()
        {
            Ok(pool) => Some(pool),
            Err(err) => {
                warn!("Falling back to the global thread pool: {err}");
                None
            }
        }
    }

    /// A panic inside one class's conversion is recorded like any other
    /// failure of that class.
    fn convert_isolated(&self, class: &JavaClassRecord) -> Outcome {
        let Some(strategy) = Strategy::for_class(class) else {
            debug!("Skipping {}: no convertible role", class.file_path);
            return Outcome::Skipped;
        };

        let converted = catch_unwind(AssertUnwindSafe(|| self.convert_class(class, strategy)))
            .unwrap_or_else(|payload| {
                Err(ConvertError::Panicked {
                    class: class.fqn(),
                    message: panic_message(payload.as_ref()),
                })
            });

        match converted {
            Ok(output) => {
                debug!("Converted {} as {:?}", class.file_path, strategy);
                Outcome::Converted(output)
            }
            Err(err) => {
                warn!("Failed to convert {}: {}", class.file_path, err);
                Outcome::Failed(ConversionFailure {
                    file_path: class.file_path.clone(),
                    error: err.to_string(),
                })
            }
        }
    }

    /// Convert one class with the given strategy.
    pub fn convert_class(
        &self,
        class: &JavaClassRecord,
        strategy: Strategy,
    ) -> Result<ConversionOutput, ConvertError> {
        let ConversionResult { code, comments } = match strategy {
            Strategy::Test => convert_extracted(class.extracted()),
            Strategy::PageObject => convert_page_object(class)?,
            Strategy::Utility => convert_utility(class)?,
        };
        let code = self.with_dependency_imports(class, strategy, &code);
        Ok(ConversionOutput {
            file_path: self.output_path(class, strategy),
            class_name: class.class_name.clone(),
            strategy,
            original_code: class.raw_content().to_string(),
            converted_code: code,
            comments,
        })
    }

    pub fn output_path(&self, class: &JavaClassRecord, strategy: Strategy) -> String {
        let suffix = match strategy {
            Strategy::Test => self.config.test_file_suffix.as_str(),
            Strategy::PageObject | Strategy::Utility => ".ts",
        };
        convert_file_path(&class.file_path, &self.roots, suffix)
    }

    /// Import lines for the page objects and utilities `class` depends on,
    /// page objects first, relative to the file `class` converts into.
    pub fn dependency_imports(&self, class: &JavaClassRecord, strategy: Strategy) -> Vec<String> {
        let from = self.output_path(class, strategy);
        let targets: Vec<(&JavaClassRecord, Strategy)> = class
            .dependency_list
            .iter()
            .filter_map(|fqn| self.structure.class_by_fqn(fqn))
            .filter_map(|dep| Strategy::for_class(dep).map(|strategy| (dep, strategy)))
            .collect();

        let mut imports = Vec::new();
        for wanted in [Strategy::PageObject, Strategy::Utility] {
            for (dep, dep_strategy) in targets.iter().filter(|(_, s)| *s == wanted) {
                let path = relative_import_path(&from, &self.output_path(dep, *dep_strategy));
                imports.push(match dep_strategy {
                    Strategy::PageObject => {
                        format!("import {{ {} }} from '{path}';", dep.class_name)
                    }
                    _ => format!("import * as {} from '{path}';", dep.class_name),
                });
            }
        }
        imports
    }

    /// Insert dependency imports after the Playwright import line. Tests get
    /// every dependency; page objects and utilities only the ones their
    /// converted code names.
    fn with_dependency_imports(
        &self,
        class: &JavaClassRecord,
        strategy: Strategy,
        code: &str,
    ) -> String {
        let mut imports = self.dependency_imports(class, strategy);
        if strategy != Strategy::Test {
            imports.retain(|line| {
                imported_name(line).is_some_and(|name| names_identifier(code, name))
            });
        }
        if imports.is_empty() {
            return code.to_string();
        }

        let Some(at) = code
            .find("from '@playwright/test';")
            .and_then(|p| code[p..].find('\n').map(|nl| p + nl + 1))
        else {
            return format!("{}\n{code}", imports.join("\n"));
        };
        format!("{}{}\n{}", &code[..at], imports.join("\n"), &code[at..])
    }
}

/// Binding introduced by an import line from [`BatchConverter::dependency_imports`].
fn imported_name(line: &str) -> Option<&str> {
    let rest = line
        .strip_prefix("import { ")
        .or_else(|| line.strip_prefix("import * as "))?;
    rest.split([' ', '}']).next()
}

/// Whether `name` occurs in `code` as a whole identifier.
fn names_identifier(code: &str, name: &str) -> bool {
    code.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .any(|word| word == name)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
