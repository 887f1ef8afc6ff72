//! Inter-class dependency mapping.
//!
//! A class depends on another in-project class when it imports it by its
//! fully-qualified name or mentions its simple name as a whole word anywhere
//! in the text. Mentions inside string literals and comments count too.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z_$][\w$]*\b").expect("Invalid identifier regex"));

/// The minimal view of a class the mapper needs.
pub struct ClassRef<'a> {
    pub fqn: &'a str,
    pub simple_name: &'a str,
    pub imports: &'a [String],
    pub content: &'a str,
}

/// Dependencies per class FQN. Imports come first, in import order, then
/// mentions in FQN order; no entry repeats and no class depends on itself.
pub fn map_dependencies(classes: &[ClassRef<'_>]) -> BTreeMap<String, Vec<String>> {
    let known: BTreeSet<&str> = classes.iter().map(|c| c.fqn).collect();
    let mut by_simple_name: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for class in classes {
        by_simple_name
            .entry(class.simple_name)
            .or_default()
            .push(class.fqn);
    }

    classes
        .iter()
        .map(|class| {
            let mut deps: Vec<String> = Vec::new();
            let mut seen: BTreeSet<&str> = BTreeSet::new();
            seen.insert(class.fqn);

            for import in class.imports {
                if known.contains(import.as_str()) && seen.insert(import.as_str()) {
                    deps.push(import.clone());
                }
            }

            let words: BTreeSet<&str> = IDENTIFIER
                .find_iter(class.content)
                .map(|m| m.as_str())
                .collect();
            let mut mentioned: Vec<&str> = words
                .iter()
                .filter_map(|word| by_simple_name.get(word))
                .flatten()
                .copied()
                .collect();
            mentioned.sort_unstable();
            for fqn in mentioned {
                if seen.insert(fqn) {
                    deps.push(fqn.to_string());
                }
            }

            (class.fqn.to_string(), deps)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_imports_and_mentions() {
        let login_imports = vec![
            "com.shop.pages.LoginPage".to_string(),
            "org.openqa.selenium.WebDriver".to_string(),
        ];
        let classes = [
            ClassRef {
                fqn: "com.shop.tests.LoginTest",
                simple_name: "LoginTest",
                imports: &login_imports,
                content: "LoginPage page; String s = TestUtils.randomEmail(); // LoginTest",
            },
            ClassRef {
                fqn: "com.shop.pages.LoginPage",
                simple_name: "LoginPage",
                imports: &[],
                content: "class LoginPage { LoginPageHelper h; }",
            },
            ClassRef {
                fqn: "com.shop.utils.TestUtils",
                simple_name: "TestUtils",
                imports: &[],
                content: "class TestUtils {}",
            },
        ];

        let graph = map_dependencies(&classes);
        assert_eq!(
            graph["com.shop.tests.LoginTest"],
            vec!["com.shop.pages.LoginPage", "com.shop.utils.TestUtils"]
        );
        // whole words only, and never itself
        assert!(graph["com.shop.pages.LoginPage"].is_empty());
        assert!(graph["com.shop.utils.TestUtils"].is_empty());
    }

    #[test]
    fn test_mentions_in_strings_count() {
        let classes = [
            ClassRef {
                fqn: "a.A",
                simple_name: "A",
                imports: &[],
                content: "log(\"uses B\");",
            },
            ClassRef {
                fqn: "b.B",
                simple_name: "B",
                imports: &[],
                content: "",
            },
        ];
        assert_eq!(map_dependencies(&classes)["a.A"], vec!["b.B"]);
    }
}
