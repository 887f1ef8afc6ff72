//! Selenium `By` strategy to Playwright locator mapping, and back.

use crate::expression::{ts_string, unescape_java, unescape_ts};
use java_parser::LocatorKind;
use once_cell::sync::Lazy;
use regex::Regex;

/// A rendered locator expression. `warning` is set when the strategy was not
/// recognized and the raw value was used as a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorConversion {
    pub expression: String,
    pub warning: Option<String>,
}

static LOCATOR_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.]+\.locator\('((?:[^'\\]|\\.)*)'\)$").expect("Invalid locator call regex")
});

static TEXT_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.]+\.getByText\('((?:[^'\\]|\\.)*)', \{ exact: (true|false) \}\)$")
        .expect("Invalid text call regex")
});

static NAME_ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\[name="(.*)"\]$"#).expect("Invalid name attribute regex"));

static BARE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]*$").expect("Invalid tag regex"));

/// Convert against the default `page` handle.
pub fn convert_locator(kind: &str, value: &str) -> LocatorConversion {
    convert_locator_on("page", kind, value)
}

/// Convert a `By.<kind>("<value>")` pair into a Playwright locator on `page`.
/// `value` is the raw text between the Java quotes, escapes included.
pub fn convert_locator_on(page: &str, kind: &str, value: &str) -> LocatorConversion {
    let value = unescape_java(value);
    match LocatorKind::from_selenium(kind) {
        Some(kind) => LocatorConversion {
            expression: render(page, kind, &value),
            warning: None,
        },
        None => LocatorConversion {
            expression: format!("{page}.locator({})", ts_string(&value)),
            warning: Some(format!("Unknown locator type: {kind}")),
        },
    }
}

/// Render an already-unescaped value.
pub fn render(page: &str, kind: LocatorKind, value: &str) -> String {
    match kind {
        LocatorKind::Id => format!("{page}.locator({})", ts_string(&format!("#{value}"))),
        LocatorKind::Name => format!(
            "{page}.locator({})",
            ts_string(&format!("[name=\"{value}\"]"))
        ),
        LocatorKind::Xpath => format!("{page}.locator({})", ts_string(&format!("xpath={value}"))),
        LocatorKind::CssSelector | LocatorKind::TagName => {
            format!("{page}.locator({})", ts_string(value))
        }
        LocatorKind::ClassName => format!("{page}.locator({})", ts_string(&format!(".{value}"))),
        LocatorKind::LinkText => format!("{page}.getByText({}, {{ exact: true }})", ts_string(value)),
        LocatorKind::PartialLinkText => {
            format!("{page}.getByText({}, {{ exact: false }})", ts_string(value))
        }
    }
}

/// Recover the strategy and value from a rendered locator expression.
///
/// Tag names and CSS selectors render identically, so a bare identifier maps
/// back to `TagName` and anything else unprefixed to `CssSelector`.
pub fn reverse_locator(expression: &str) -> Option<(LocatorKind, String)> {
    let expression = expression.trim();
    if let Some(caps) = TEXT_CALL.captures(expression) {
        let kind = if &caps[2] == "true" {
            LocatorKind::LinkText
        } else {
            LocatorKind::PartialLinkText
        };
        return Some((kind, unescape_ts(&caps[1])));
    }

    let selector = unescape_ts(&LOCATOR_CALL.captures(expression)?[1]);
    if let Some(xpath) = selector.strip_prefix("xpath=") {
        return Some((LocatorKind::Xpath, xpath.to_string()));
    }
    if let Some(id) = selector.strip_prefix('#') {
        return Some((LocatorKind::Id, id.to_string()));
    }
    if let Some(caps) = NAME_ATTRIBUTE.captures(&selector) {
        return Some((LocatorKind::Name, caps[1].to_string()));
    }
    if let Some(class) = selector.strip_prefix('.') {
        return Some((LocatorKind::ClassName, class.to_string()));
    }
    if BARE_TAG.is_match(&selector) {
        return Some((LocatorKind::TagName, selector));
    }
    Some((LocatorKind::CssSelector, selector))
}
