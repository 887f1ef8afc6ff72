//! Selenium page objects rendered as Playwright page-object classes.
//!
//! Element fields become `readonly` [`Locator`] properties built in the
//! constructor. A field's locator comes from, in order: its `@FindBy`
//! annotation, a `findElement(By...)` assignment to the field, or a `By`
//! field declaration. Fields with none of these get a placeholder locator and
//! a warning.
//!
//! [`Locator`]: https://playwright.dev/docs/api/class-locator

use crate::signature::{parse_parameters, render_parameters, ts_return_type};
use crate::ConvertError;
use java_parser::MethodInfo;
use log::debug;
use once_cell::sync::Lazy;
use project_analy::JavaClassRecord;
use regex::Regex;
use single_converter::converter::method_statements;
use single_converter::{
    convert_locator_on, ConversionComment, ConversionResult, LineRewriter, RewriteContext,
    Severity,
};

pub const PAGE_OBJECT_NOTE: &str =
    "Converted from Selenium Page Object to Playwright Page Object pattern";

static WEB_ELEMENT_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:@\w+(?:\([^)]*\))?\s*)*(?:(?:private|protected|public|final)\s+)*WebElement\s+(\w+)\s*(?:=[^;]*)?;",
    )
    .expect("Invalid WebElement field regex")
});

static BY_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*(?:(?:private|protected|public|final|static)\s+)*By\s+(\w+)\s*=\s*By\.(\w+)\(\s*"((?:[^"\\]|\\.)*)"\s*\)\s*;"#,
    )
    .expect("Invalid By field regex")
});

static FIND_BY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"@FindBy\(\s*(\w+)\s*=\s*"((?:[^"\\]|\\.)*)"\s*\)\s*(?:(?:private|protected|public|final)\s+)*WebElement\s+(\w+)"#,
    )
    .expect("Invalid @FindBy regex")
});

static FIND_BY_HOW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"@FindBy\(\s*how\s*=\s*How\.(\w+)\s*,\s*using\s*=\s*"((?:[^"\\]|\\.)*)"\s*\)\s*(?:(?:private|protected|public|final)\s+)*WebElement\s+(\w+)"#,
    )
    .expect("Invalid @FindBy(how) regex")
});

/// A Selenium locator as written in Java: strategy name and raw literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaLocator {
    pub kind: String,
    pub raw_value: String,
}

/// One element field of a page object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementField {
    pub name: String,
    /// 1-based line of the declaration.
    pub line: usize,
    pub locator: Option<JavaLocator>,
}

/// Element fields in declaration order.
pub fn element_fields(class: &JavaClassRecord) -> Vec<ElementField> {
    let source = class.raw_content();
    let method_lines: Vec<(usize, usize)> = class
        .extracted()
        .methods()
        .map(|m| (m.body_line, m.body_line + m.body.lines().count()))
        .collect();
    let in_method = |line: usize| {
        method_lines
            .iter()
            .any(|&(start, end)| line >= start && line < end)
    };

    let mut fields: Vec<ElementField> = Vec::new();

    for caps in WEB_ELEMENT_FIELD.captures_iter(source) {
        let Some(name) = caps.get(1) else { continue };
        let line = line_of(source, name.start());
        if in_method(line) || fields.iter().any(|f| f.name == name.as_str()) {
            continue;
        }
        fields.push(ElementField {
            name: name.as_str().to_string(),
            line,
            locator: annotated_locator(source, name.as_str())
                .or_else(|| assigned_locator(source, name.as_str())),
        });
    }

    for caps in BY_FIELD.captures_iter(source) {
        let Some(name) = caps.get(1) else { continue };
        let line = line_of(source, name.start());
        if in_method(line) || fields.iter().any(|f| f.name == name.as_str()) {
            continue;
        }
        fields.push(ElementField {
            name: name.as_str().to_string(),
            line,
            locator: Some(JavaLocator {
                kind: caps[2].to_string(),
                raw_value: caps[3].to_string(),
            }),
        });
    }

    fields.sort_by_key(|f| f.line);
    fields
}

fn annotated_locator(source: &str, field: &str) -> Option<JavaLocator> {
    if let Some(caps) = FIND_BY.captures_iter(source).find(|c| &c[3] == field) {
        return Some(JavaLocator {
            kind: caps[1].to_string(),
            raw_value: caps[2].to_string(),
        });
    }
    FIND_BY_HOW
        .captures_iter(source)
        .find(|c| &c[3] == field)
        .map(|caps| JavaLocator {
            kind: how_to_selenium(&caps[1]),
            raw_value: caps[2].to_string(),
        })
}

/// `field = driver.findElement(By.kind("value"))` anywhere in the class.
fn assigned_locator(source: &str, field: &str) -> Option<JavaLocator> {
    let pattern = format!(
        r#"\b{}\s*=\s*[^;]*?\.findElement\(\s*By\.(\w+)\(\s*"((?:[^"\\]|\\.)*)"\s*\)\s*\)"#,
        regex::escape(field)
    );
    let assignment = Regex::new(&pattern).ok()?;
    let caps = assignment.captures(source)?;
    Some(JavaLocator {
        kind: caps[1].to_string(),
        raw_value: caps[2].to_string(),
    })
}

fn how_to_selenium(how: &str) -> String {
    match how {
        "ID" => "id",
        "NAME" => "name",
        "XPATH" => "xpath",
        "CSS" => "cssSelector",
        "CLASS_NAME" => "className",
        "TAG_NAME" => "tagName",
        "LINK_TEXT" => "linkText",
        "PARTIAL_LINK_TEXT" => "partialLinkText",
        other => other,
    }
    .to_string()
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

/// Public instance methods, in source order.
fn page_methods(class: &JavaClassRecord) -> impl Iterator<Item = &MethodInfo> {
    class
        .extracted()
        .methods()
        .filter(|m| m.is_public() && !m.is_static() && m.method_name != class.class_name)
}

pub fn convert_page_object(class: &JavaClassRecord) -> Result<ConversionResult, ConvertError> {
    let fields = element_fields(class);
    debug!(
        "Page object {} has {} element fields",
        class.class_name,
        fields.len()
    );

    let mut comments = vec![ConversionComment::new(1, PAGE_OBJECT_NOTE, Severity::Info)];

    let mut initializers = Vec::with_capacity(fields.len());
    for field in &fields {
        let expression = match &field.locator {
            Some(locator) => {
                let converted = convert_locator_on("page", &locator.kind, &locator.raw_value);
                if let Some(warning) = converted.warning {
                    comments.push(ConversionComment::new(field.line, warning, Severity::Warning));
                }
                converted.expression
            }
            None => {
                comments.push(ConversionComment::new(
                    field.line,
                    format!("No locator found for element field {}", field.name),
                    Severity::Warning,
                ));
                format!("page.locator('/* TODO: Add locator for {} */')", field.name)
            }
        };
        initializers.push((field.name.as_str(), expression));
    }

    let ctx = RewriteContext::for_page_object(fields.iter().map(|f| f.name.clone()));
    let mut rewriter = LineRewriter::new(&ctx);
    let mut methods = Vec::new();
    for method in page_methods(class) {
        if !method.complete {
            return Err(ConvertError::UnterminatedMethod {
                class: class.class_name.clone(),
                method: method.method_name.clone(),
                line: method.body_line,
            });
        }
        let params = render_parameters(&parse_parameters(&method.parameters));
        let mut block = format!(
            "  async {}({params}): Promise<{}> {{\n",
            method.method_name,
            ts_return_type(&method.return_type)
        );
        for (line, statement) in method_statements(method) {
            block.push_str("    ");
            block.push_str(&rewriter.rewrite(statement, line));
            block.push('\n');
        }
        block.push_str("  }\n");
        methods.push(block);
    }
    comments.extend(rewriter.into_comments());
    comments.sort_by_key(|c| c.line);

    let mut code = String::new();
    let uses_expect = methods.iter().any(|m| m.contains("expect("));
    if uses_expect {
        code.push_str("import { Page, Locator, expect } from '@playwright/test';\n\n");
    } else {
        code.push_str("import { Page, Locator } from '@playwright/test';\n\n");
    }
    code.push_str(&format!(
        "/**\n * Page object for {}\n */\nexport class {} {{\n",
        class.class_name, class.class_name
    ));
    code.push_str("  readonly page: Page;\n");
    for (name, _) in &initializers {
        code.push_str(&format!("  readonly {name}: Locator;\n"));
    }
    code.push_str("\n  constructor(page: Page) {\n    this.page = page;\n");
    for (name, expression) in &initializers {
        code.push_str(&format!("    this.{name} = {expression};\n"));
    }
    code.push_str("  }\n");
    for method in &methods {
        code.push('\n');
        code.push_str(method);
    }
    code.push_str("}\n");

    Ok(ConversionResult { code, comments })
}
