//! Utility classes rendered as modules of exported async functions.

use crate::signature::{parse_parameters, render_parameters, ts_return_type};
use crate::ConvertError;
use log::debug;
use project_analy::JavaClassRecord;
use single_converter::converter::method_statements;
use single_converter::{ConversionComment, ConversionResult, LineRewriter, RewriteContext, Severity};

pub const UTILITY_NOTE: &str = "Converted from Java utility class to TypeScript utility";

/// Each `public static` method becomes an exported function. A driver
/// parameter turns into the `page` handle the rewritten statements use.
pub fn convert_utility(class: &JavaClassRecord) -> Result<ConversionResult, ConvertError> {
    let ctx = RewriteContext::default();
    let mut rewriter = LineRewriter::new(&ctx);
    let mut functions = Vec::new();

    for method in class
        .extracted()
        .methods()
        .filter(|m| m.is_public() && m.is_static())
    {
        if !method.complete {
            return Err(ConvertError::UnterminatedMethod {
                class: class.class_name.clone(),
                method: method.method_name.clone(),
                line: method.body_line,
            });
        }
        let params = render_parameters(&parse_parameters(&method.parameters));
        let mut block = format!(
            "/**\n * {} function\n */\nexport async function {}({params}): Promise<{}> {{\n",
            method.method_name,
            method.method_name,
            ts_return_type(&method.return_type)
        );
        for (line, statement) in method_statements(method) {
            block.push_str("  ");
            block.push_str(&rewriter.rewrite(statement, line));
            block.push('\n');
        }
        block.push_str("}\n");
        functions.push(block);
    }
    debug!(
        "Utility {} exports {} functions",
        class.class_name,
        functions.len()
    );

    let mut comments = vec![ConversionComment::new(1, UTILITY_NOTE, Severity::Info)];
    comments.extend(rewriter.into_comments());
    comments.sort_by_key(|c| c.line);

    let mut imports = vec!["Page"];
    if functions.iter().any(|f| f.contains("Locator")) {
        imports.push("Locator");
    }
    imports.push("expect");

    let mut code = format!(
        "/**\n * Utility functions converted from {}\n */\n\nimport {{ {} }} from '@playwright/test';\n",
        class.class_name,
        imports.join(", ")
    );
    for function in &functions {
        code.push('\n');
        code.push_str(function);
    }

    Ok(ConversionResult { code, comments })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use project_analy::analyze_project;

    #[test]
    fn test_static_methods_become_functions() {
        let source = r#"package com.acme.util;

public class TestUtils {
    public static void waitForPageLoad(WebDriver driver, int millis) {
        Thread.sleep(millis);
    }

    public static boolean isShown(WebElement element) {
        return element.isDisplayed();
    }

    private static void hidden() {
        helper();
    }
}
"#;
        let structure = analyze_project([("src/test/java/com/acme/util/TestUtils.java", source)]);
        let result = convert_utility(&structure.classes[0]).unwrap();
        let expected = r#"/**
 * Utility functions converted from TestUtils
 */

import { Page, Locator, expect } from '@playwright/test';

/**
 * waitForPageLoad function
 */
export async function waitForPageLoad(page: Page, millis: number): Promise<void> {
  await page.waitForTimeout(millis);
}

/**
 * isShown function
 */
export async function isShown(element: Locator): Promise<boolean> {
  return await element.isVisible();
}
"#;
        assert_eq!(result.code, expected);
        assert_eq!(result.comments[0].text, UTILITY_NOTE);
        assert!(result
            .comments
            .iter()
            .any(|c| c.line == 5 && c.severity == Severity::Info));
    }

    #[test]
    fn test_one_line_method_keeps_its_body() {
        let source = "public class Waits {\n    public static void pause(WebDriver driver, long millis) { Thread.sleep(millis); }\n}\n";
        let structure = analyze_project([("src/test/java/Waits.java", source)]);
        let result = convert_utility(&structure.classes[0]).unwrap();
        assert!(result.code.contains(
            "export async function pause(page: Page, millis: number): Promise<void> {\n  await page.waitForTimeout(millis);\n}\n"
        ));
    }

    #[test]
    fn test_empty_utility_still_renders() {
        let structure = analyze_project([(
            "src/main/java/Helpers.java",
            "public class Helpers {\n}\n",
        )]);
        let result = convert_utility(&structure.classes[0]).unwrap();
        assert_eq!(
            result.code,
            "/**\n * Utility functions converted from Helpers\n */\n\nimport { Page, expect } from '@playwright/test';\n"
        );
        assert_eq!(result.comments.len(), 1);
    }
}
