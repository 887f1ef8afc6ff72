//! Pattern-based extraction over one Java source file.
//!
//! Each category is found by its own scan over the full text. The scans always
//! run in the same order (imports, class, methods, locators, assertions, waits,
//! actions) so overlapping matches come out identically on every run.

use crate::braces::block_end;
use crate::fragment::{
    ActionType, FragmentAttributes, FragmentKind, LocatorKind, MethodInfo, ParsedFragment,
};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*import\s+(static\s+)?([^;]+);").expect("Invalid import regex")
});

static PACKAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*package\s+([^;]+);").expect("Invalid package regex"));

static CLASS_SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"public\s+(?:(?:abstract|final)\s+)?class\s+(\w+)(?:\s*<[^>{]*>)?(?:\s+extends\s+([\w.]+)(?:\s*<[^>{]*>)?)?(?:\s+implements\s+([\w.,\s]+?))?\s*\{",
    )
    .expect("Invalid class regex")
});

static METHOD_SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*((?:@\w+(?:\([^)]*\))?\s+)*)((?:(?:public|private|protected|static|final|synchronized|abstract|default)\s+)*)([\w.]+(?:<[^>]*>)?(?:\[\])*)\s+(\w+)\s*\(([^)]*)\)\s*(?:throws\s+[\w.,\s]+?)?\s*(?:(\{).*|//.*)?$",
    )
    .expect("Invalid method regex")
});

static ANNOTATION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*@(\w+)(?:\(.*\))?\s*$").expect("Invalid annotation regex"));

static LEADING_ANNOTATIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:@\w+(?:\([^)]*\))?\s*)*").expect("Invalid leading annotation regex")
});

static ANNOTATION_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(\w+)").expect("Invalid annotation name regex"));

static ELEMENT_LOCATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\b(?:driver|webDriver|wd)\.findElement\(\s*By\.(id|name|xpath|cssSelector|className|tagName|linkText|partialLinkText)\s*\(\s*"([^"]+)"\s*\)\s*\)"#,
    )
    .expect("Invalid locator regex")
});

static ASSERTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(Assert|assertEquals|assertNotEquals|assertTrue|assertFalse|assertNotNull|assertNull|assertThat)\s*\(([^;]+)\)",
    )
    .expect("Invalid assertion regex")
});

static WAIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\w*[Ww]ait\w*)\b[^;\n]*?\.until\(([^;]+)\)").expect("Invalid wait regex")
});

static ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\.click\(\)|\.sendKeys\([^)]+\)|\.clear\(\)|\.submit\(\)|\.selectByVisibleText\([^)]+\)|\.selectByValue\([^)]+\)|\.selectByIndex\([^)]+\)|\.moveToElement\([^)]+\)|\.dragAndDrop\([^)]+\)|\.perform\(\)",
    )
    .expect("Invalid action regex")
});

/// Words that can look like a return type or method name to the signature
/// pattern but never start a method declaration.
const NOT_A_RETURN_TYPE: &[&str] = &[
    "return",
    "new",
    "else",
    "throw",
    "case",
    "package",
    "import",
    "class",
    "interface",
    "enum",
    "extends",
    "implements",
    "public",
    "private",
    "protected",
    "static",
    "final",
    "abstract",
    "synchronized",
    "default",
];

const NOT_A_METHOD_NAME: &[&str] = &[
    "if",
    "for",
    "while",
    "switch",
    "catch",
    "synchronized",
    "return",
    "try",
];

/// Extract every fragment category from `source`.
pub fn extract(source: &str) -> ExtractedFile {
    JavaExtractor::new(source).extract()
}

/// The `package a.b.c;` declaration, if any.
/// `line` without the annotations it starts with, trimmed. Empty for a
/// line holding only annotations.
pub fn strip_annotations(line: &str) -> &str {
    let start = LEADING_ANNOTATIONS.find(line).map_or(0, |m| m.end());
    line[start..].trim()
}

pub fn package_name(source: &str) -> Option<String> {
    PACKAGE
        .captures(source)
        .map(|caps| caps[1].trim().to_string())
}

/// Source text together with the fragments extracted from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    source: String,
    fragments: Vec<ParsedFragment>,
}

impl ExtractedFile {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// All fragments, grouped by category in extraction order.
    pub fn fragments(&self) -> &[ParsedFragment] {
        &self.fragments
    }

    pub fn of_kind(&self, kind: FragmentKind) -> impl Iterator<Item = &ParsedFragment> {
        self.fragments.iter().filter(move |f| f.kind() == kind)
    }

    pub fn imports(&self) -> impl Iterator<Item = &ParsedFragment> {
        self.of_kind(FragmentKind::Import)
    }

    pub fn import_paths(&self) -> Vec<String> {
        self.imports()
            .filter_map(|f| match &f.attributes {
                FragmentAttributes::Import { import_path, .. } => Some(import_path.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn class_signature(&self) -> Option<&ParsedFragment> {
        self.of_kind(FragmentKind::Class).next()
    }

    pub fn class_name(&self) -> Option<&str> {
        match &self.class_signature()?.attributes {
            FragmentAttributes::Class { class_name, .. } => Some(class_name),
            _ => None,
        }
    }

    pub fn parent_class(&self) -> Option<&str> {
        match &self.class_signature()?.attributes {
            FragmentAttributes::Class { parent_class, .. } => parent_class.as_deref(),
            _ => None,
        }
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodInfo> {
        self.fragments.iter().filter_map(ParsedFragment::as_method)
    }

    pub fn mentions(&self, needle: &str) -> bool {
        self.source.contains(needle)
    }
}

/// Single-pass extractor over one file. Keeps a line-start index so offsets
/// map to 1-based line numbers without rescanning.
pub struct JavaExtractor<'a> {
    content: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> JavaExtractor<'a> {
    pub fn new(content: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                content
                    .bytes()
                    .enumerate()
                    .filter(|(_, b)| *b == b'\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();
        Self {
            content,
            line_starts,
        }
    }

    pub fn extract(&self) -> ExtractedFile {
        let mut fragments = Vec::new();
        fragments.extend(self.find_imports());
        fragments.extend(self.find_class_signature());
        fragments.extend(self.find_methods());
        fragments.extend(self.find_locators());
        fragments.extend(self.find_assertions());
        fragments.extend(self.find_waits());
        fragments.extend(self.find_actions());

        debug!("Extracted {} fragments", fragments.len());

        ExtractedFile {
            source: self.content.to_string(),
            fragments,
        }
    }

    /// 1-based line containing byte `offset`.
    fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }

    fn find_imports(&self) -> Vec<ParsedFragment> {
        IMPORT
            .captures_iter(self.content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let import_path = caps[2].trim().to_string();
                let is_selenium_related = is_selenium_import(&import_path);
                Some(ParsedFragment {
                    raw_text: whole.as_str().trim().to_string(),
                    attributes: FragmentAttributes::Import {
                        is_static: caps.get(1).is_some(),
                        is_selenium_related,
                        import_path,
                    },
                    source_line: self.line_of(whole.start() + leading_ws(whole.as_str())),
                })
            })
            .collect()
    }

    fn find_class_signature(&self) -> Option<ParsedFragment> {
        let caps = CLASS_SIGNATURE.captures(self.content)?;
        let whole = caps.get(0)?;
        let interface_list = caps
            .get(3)
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(ParsedFragment {
            raw_text: whole.as_str().to_string(),
            attributes: FragmentAttributes::Class {
                class_name: caps[1].to_string(),
                parent_class: caps.get(2).map(|m| m.as_str().to_string()),
                interface_list,
            },
            source_line: self.line_of(whole.start()),
        })
    }

    /// Method-like signatures, one per line, with bodies found by brace
    /// counting. A body is never searched for nested methods: scanning resumes
    /// after its closing brace.
    fn find_methods(&self) -> Vec<ParsedFragment> {
        let lines: Vec<&str> = self.content.split('\n').collect();
        let mut methods = Vec::new();
        let mut idx = 0;

        while idx < lines.len() {
            let Some(caps) = METHOD_SIGNATURE.captures(lines[idx]) else {
                idx += 1;
                continue;
            };

            let return_type = caps[3].to_string();
            let method_name = caps[4].to_string();
            if NOT_A_RETURN_TYPE.contains(&return_type.as_str())
                || NOT_A_METHOD_NAME.contains(&method_name.as_str())
            {
                idx += 1;
                continue;
            }

            // Opening brace on this line or alone on the next non-blank one
            let brace_on_line = caps.get(6).is_some();
            if !brace_on_line && !next_code_line_opens_block(&lines, idx) {
                idx += 1;
                continue;
            }

            let mut annotations: Vec<String> = ANNOTATION_NAME
                .captures_iter(&caps[1])
                .map(|c| c[1].to_string())
                .collect();
            let mut first_line = idx;
            while first_line > 0 {
                match ANNOTATION_LINE.captures(lines[first_line - 1]) {
                    Some(ann) => {
                        annotations.insert(0, ann[1].to_string());
                        first_line -= 1;
                    }
                    None => break,
                }
            }

            let modifiers: Vec<String> = caps[2].split_whitespace().map(str::to_string).collect();
            let start = self.line_starts[first_line] + leading_ws(lines[first_line]);
            let signature_end = self.line_starts[idx] + lines[idx].len();
            let raw_text = self.content[start..signature_end].to_string();

            let (body, complete, end_line_idx) = match block_end(self.content, self.line_starts[idx])
            {
                Ok(end) => (
                    self.content[start..end].to_string(),
                    true,
                    self.line_of(end.saturating_sub(1)) - 1,
                ),
                Err(err) => {
                    debug!("Method {} has no closing brace: {}", method_name, err);
                    (self.content[start..].to_string(), false, lines.len())
                }
            };

            let is_test_method = annotations.iter().any(|a| a == "Test");
            let is_setup_method = annotations.iter().any(|a| a.starts_with("Before"));
            let is_teardown_method = annotations.iter().any(|a| a.starts_with("After"));

            methods.push(ParsedFragment {
                raw_text,
                attributes: FragmentAttributes::Method(MethodInfo {
                    method_name,
                    annotations,
                    modifiers,
                    return_type,
                    parameters: caps[5].trim().to_string(),
                    is_test_method,
                    is_setup_method,
                    is_teardown_method,
                    body,
                    body_line: first_line + 1,
                    complete,
                }),
                source_line: first_line + 1,
            });

            idx = end_line_idx.max(idx) + 1;
        }

        methods
    }

    fn find_locators(&self) -> Vec<ParsedFragment> {
        ELEMENT_LOCATOR
            .captures_iter(self.content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let locator_kind = LocatorKind::from_selenium(&caps[1])?;
                Some(ParsedFragment {
                    raw_text: whole.as_str().to_string(),
                    attributes: FragmentAttributes::Locator {
                        locator_kind,
                        locator_value: caps[2].to_string(),
                    },
                    source_line: self.line_of(whole.start()),
                })
            })
            .collect()
    }

    fn find_assertions(&self) -> Vec<ParsedFragment> {
        ASSERTION
            .captures_iter(self.content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(ParsedFragment {
                    raw_text: whole.as_str().to_string(),
                    attributes: FragmentAttributes::Assertion {
                        assertion_name: caps[1].to_string(),
                        argument_text: caps[2].to_string(),
                    },
                    source_line: self.line_of(whole.start()),
                })
            })
            .collect()
    }

    fn find_waits(&self) -> Vec<ParsedFragment> {
        WAIT.captures_iter(self.content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(ParsedFragment {
                    raw_text: whole.as_str().to_string(),
                    attributes: FragmentAttributes::Wait {
                        wait_target: caps[1].to_string(),
                        condition: caps[2].to_string(),
                    },
                    source_line: self.line_of(whole.start()),
                })
            })
            .collect()
    }

    /// Action calls, each paired with its enclosing statement: from the start of
    /// the line to the next `;`.
    fn find_actions(&self) -> Vec<ParsedFragment> {
        ACTION
            .find_iter(self.content)
            .filter_map(|m| {
                let action_type = ActionType::from_call(m.as_str())?;
                let statement_start = self.content[..m.start()]
                    .rfind('\n')
                    .map(|p| p + 1)
                    .unwrap_or(0);
                let statement_end = self.content[m.start()..]
                    .find(';')
                    .map(|p| m.start() + p + 1)
                    .unwrap_or(self.content.len());
                let statement = self.content[statement_start..statement_end]
                    .trim()
                    .to_string();

                Some(ParsedFragment {
                    raw_text: statement.clone(),
                    attributes: FragmentAttributes::Action {
                        action_type,
                        action_call: m.as_str().to_string(),
                        statement,
                    },
                    source_line: self.line_of(m.start()),
                })
            })
            .collect()
    }
}

fn is_selenium_import(path: &str) -> bool {
    path.contains("org.openqa.selenium") || path.contains("junit") || path.contains("testng")
}

fn leading_ws(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

fn next_code_line_opens_block(lines: &[&str], idx: usize) -> bool {
    lines
        .iter()
        .skip(idx + 1)
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .is_some_and(|l| l.starts_with('{'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LOGIN_TEST: &str = r#"package com.example.tests;

import org.junit.Before;
import org.junit.Test;
import org.openqa.selenium.By;
import static org.junit.Assert.*;
import com.example.pages.LoginPage;

public class LoginTest extends BaseTest implements Retryable, Loggable {
    private WebDriver driver;

    @Before
    public void setUp() {
        driver = new ChromeDriver();
    }

    @Test
    public void testLogin() throws Exception {
        driver.get("https://example.com/login");
        driver.findElement(By.id("username")).sendKeys("testuser");
        driver.findElement(By.xpath("//button[@type='submit']")).click();
        wait.until(ExpectedConditions.visibilityOfElementLocated(By.id("dashboard")));
        Assert.assertEquals(driver.getTitle(), "Home");
        log("{ not a block }");
    }

    private String helper(int n)
    {
        if (n > 0) {
            return "x";
        }
        return "";
    }
}
"#;

    #[test]
    fn test_imports() {
        let file = extract(LOGIN_TEST);
        let imports: Vec<_> = file.imports().collect();
        assert_eq!(imports.len(), 5);
        assert_eq!(imports[0].source_line, 3);
        match &imports[3].attributes {
            FragmentAttributes::Import {
                import_path,
                is_static,
                is_selenium_related,
            } => {
                assert_eq!(import_path, "org.junit.Assert.*");
                assert!(*is_static);
                assert!(*is_selenium_related);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &imports[4].attributes {
            FragmentAttributes::Import {
                is_selenium_related,
                ..
            } => assert!(!is_selenium_related),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_class_signature() {
        let file = extract(LOGIN_TEST);
        let class = file.class_signature().unwrap();
        assert_eq!(class.source_line, 9);
        assert_eq!(
            class.attributes,
            FragmentAttributes::Class {
                class_name: "LoginTest".to_string(),
                parent_class: Some("BaseTest".to_string()),
                interface_list: vec!["Retryable".to_string(), "Loggable".to_string()],
            }
        );
        assert_eq!(file.class_name(), Some("LoginTest"));
        assert_eq!(file.parent_class(), Some("BaseTest"));
    }

    #[test]
    fn test_methods_and_flags() {
        let file = extract(LOGIN_TEST);
        let methods: Vec<_> = file.methods().collect();
        let names: Vec<_> = methods.iter().map(|m| m.method_name.as_str()).collect();
        assert_eq!(names, vec!["setUp", "testLogin", "helper"]);

        assert!(methods[0].is_setup_method);
        assert!(!methods[0].is_test_method);
        assert_eq!(methods[0].body_line, 12);

        assert!(methods[1].is_test_method);
        assert!(methods[1].complete);
        assert!(methods[1].body.starts_with("@Test"));
        assert!(methods[1].body.ends_with('}'));
        assert!(methods[1].body.contains("{ not a block }"));

        // Brace on its own line, nested if is not a separate method
        assert_eq!(methods[2].return_type, "String");
        assert_eq!(methods[2].parameters, "int n");
        assert_eq!(methods[2].modifiers, vec!["private".to_string()]);
        assert!(methods[2].body.trim_end().ends_with("return \"\";\n    }"));
    }

    #[test]
    fn test_locators() {
        let file = extract(LOGIN_TEST);
        let locators: Vec<_> = file
            .of_kind(FragmentKind::Locator)
            .map(|f| (f.attributes.clone(), f.source_line))
            .collect();
        assert_eq!(
            locators,
            vec![
                (
                    FragmentAttributes::Locator {
                        locator_kind: LocatorKind::Id,
                        locator_value: "username".to_string()
                    },
                    20
                ),
                (
                    FragmentAttributes::Locator {
                        locator_kind: LocatorKind::Xpath,
                        locator_value: "//button[@type='submit']".to_string()
                    },
                    21
                ),
            ]
        );
    }

    #[test]
    fn test_assertions_and_waits() {
        let file = extract(LOGIN_TEST);
        let assertion = file.of_kind(FragmentKind::Assertion).next().unwrap();
        assert_eq!(
            assertion.attributes,
            FragmentAttributes::Assertion {
                assertion_name: "assertEquals".to_string(),
                argument_text: "driver.getTitle(), \"Home\"".to_string(),
            }
        );
        assert_eq!(assertion.source_line, 23);

        let wait = file.of_kind(FragmentKind::Wait).next().unwrap();
        assert_eq!(
            wait.attributes,
            FragmentAttributes::Wait {
                wait_target: "wait".to_string(),
                condition: "ExpectedConditions.visibilityOfElementLocated(By.id(\"dashboard\"))"
                    .to_string(),
            }
        );
    }

    #[test]
    fn test_actions_recover_statement() {
        let file = extract(LOGIN_TEST);
        let actions: Vec<_> = file.of_kind(FragmentKind::Action).collect();
        assert_eq!(actions.len(), 2);
        assert_eq!(
            actions[0].raw_text,
            "driver.findElement(By.id(\"username\")).sendKeys(\"testuser\");"
        );
        match &actions[1].attributes {
            FragmentAttributes::Action { action_type, .. } => {
                assert_eq!(*action_type, ActionType::Click)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let first = extract(LOGIN_TEST);
        let second = extract(LOGIN_TEST);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unterminated_method_is_marked_incomplete() {
        let src = "public class Broken {\n    public void run() {\n        go();\n";
        let file = extract(src);
        let method = file.methods().next().unwrap();
        assert_eq!(method.method_name, "run");
        assert!(!method.complete);
        assert!(method.body.ends_with("go();\n"));
    }

    #[test]
    fn test_constructor_and_control_flow_are_not_methods() {
        let src = "public class Page {\n    public Page(WebDriver d) {\n        this.d = d;\n    }\n    void m() {\n        else if (x) {\n        }\n    }\n}\n";
        let names: Vec<_> = extract(src)
            .methods()
            .map(|m| m.method_name.clone())
            .collect();
        assert_eq!(names, vec!["m".to_string()]);
    }

    #[test]
    fn test_same_line_annotation_and_one_line_body() {
        let src = "public class A {\n    @Test public void opens() {\n        go();\n    }\n\n    @Test public void quick() { driver.get(\"https://a.b\"); }\n\n    @After public void done() {}\n}\n";
        let file = extract(src);
        let methods: Vec<_> = file.methods().collect();
        let names: Vec<_> = methods.iter().map(|m| m.method_name.as_str()).collect();
        assert_eq!(names, vec!["opens", "quick", "done"]);
        assert!(methods[0].is_test_method);
        assert_eq!(methods[0].body_line, 2);
        assert!(methods[1].is_test_method);
        assert!(methods[1].complete);
        assert_eq!(methods[1].body_line, 6);
        assert!(methods[1].body.ends_with("\"); }"));
        assert!(methods[2].is_teardown_method);
    }

    #[test]
    fn test_strip_annotations() {
        assert_eq!(strip_annotations("@Test"), "");
        assert_eq!(strip_annotations("  @Test(timeout = 5) @Override"), "");
        assert_eq!(
            strip_annotations("@Test public void t() {"),
            "public void t() {"
        );
        assert_eq!(strip_annotations("    return x;"), "return x;");
    }

    #[test]
    fn test_package_name() {
        assert_eq!(
            package_name(LOGIN_TEST),
            Some("com.example.tests".to_string())
        );
        assert_eq!(package_name("class A {}"), None);
    }

    #[test]
    fn test_empty_input() {
        let file = extract("");
        assert!(file.fragments().is_empty());
        assert_eq!(file.class_name(), None);
    }
}
