//! Scanners and rewrites over Java expression text.

use crate::locator::convert_locator_on;
use crate::rewriter::RewriteContext;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static FIND_WITH_GETTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\b\w*[dD]river\.findElements?\(\s*By\.(\w+)\(\s*"((?:[^"\\]|\\.)*)"\s*\)\s*\)\.(?:(getText|isDisplayed|isEnabled|isSelected|size)\(\)|getAttribute\(([^()]*)\))"#,
    )
    .expect("Invalid find-with-getter regex")
});

static FIND_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b\w*[dD]river\.findElements?\(\s*By\.(\w+)\(\s*"((?:[^"\\]|\\.)*)"\s*\)\s*\)"#)
        .expect("Invalid find-element regex")
});

static DRIVER_QUERY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\w*[dD]river\.(getTitle|getCurrentUrl|getPageSource)\(\)")
        .expect("Invalid driver query regex")
});

static ELEMENT_GETTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b((?:this\.)?\w+)\.(?:(getText|isDisplayed|isEnabled|isSelected)\(\)|getAttribute\(([^()]*)\))",
    )
    .expect("Invalid element getter regex")
});

static NEW_WITH_DRIVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bnew\s+([A-Z]\w*)\(\s*(?:this\.)?\w*[dD]river\s*\)")
        .expect("Invalid constructor regex")
});

static JAVA_LENGTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.length\(\)").expect("Invalid length regex"));

static BINDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:final\s+)?(?:([\w.]+(?:<[\w<>, ]*>)?(?:\[\])*)\s+)?(\w+)\s*=$")
        .expect("Invalid binding regex")
});

/// Where the value of a rewritten call goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Bare statement, the value is dropped.
    Statement,
    /// `Type name = ...`
    Declare(String),
    /// `name = ...`
    Assign(String),
    /// `return ...`
    Return,
}

impl Target {
    /// Parse the text in front of a call. `None` when it is something other
    /// than a declaration, an assignment or a `return`.
    pub fn parse(prefix: &str) -> Option<Self> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Some(Self::Statement);
        }
        if prefix == "return" {
            return Some(Self::Return);
        }
        let caps = BINDING.captures(prefix)?;
        let name = caps[2].to_string();
        Some(if caps.get(1).is_some() {
            Self::Declare(name)
        } else {
            Self::Assign(name)
        })
    }

    pub fn lead(&self) -> String {
        match self {
            Self::Statement => String::new(),
            Self::Declare(name) => format!("const {name} = "),
            Self::Assign(name) => format!("{name} = "),
            Self::Return => "return ".to_string(),
        }
    }
}

/// Byte offset of the `)` matching the `(` at `open`. Parentheses inside
/// string or char literals are ignored.
pub fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (idx, &b) in bytes.iter().enumerate().skip(open) {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn top_level_commas(args: &str) -> Vec<usize> {
    let mut commas = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (idx, &b) in args.as_bytes().iter().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b',' if depth == 0 => commas.push(idx),
            _ => {}
        }
    }
    commas
}

/// Split call arguments at top-level commas, trimming each piece.
pub fn split_args(args: &str) -> Vec<&str> {
    if args.trim().is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut start = 0;
    for comma in top_level_commas(args) {
        parts.push(args[start..comma].trim());
        start = comma + 1;
    }
    parts.push(args[start..].trim());
    parts
}

/// Split at the first top-level comma only. The right side keeps any later
/// commas, so a three-argument call splits as `a` and `b, c`.
pub fn split_first_comma(args: &str) -> Option<(&str, &str)> {
    let comma = *top_level_commas(args).first()?;
    Some((args[..comma].trim(), args[comma + 1..].trim()))
}

/// The raw content of a complete Java string literal, escapes untouched.
pub fn java_string_content(expr: &str) -> Option<&str> {
    let inner = expr.trim().strip_prefix('"')?.strip_suffix('"')?;
    let mut escaped = false;
    for c in inner.chars() {
        match (escaped, c) {
            (true, _) => escaped = false,
            (false, '\\') => escaped = true,
            (false, '"') => return None,
            _ => {}
        }
    }
    Some(inner)
}

/// Resolve the escapes of a Java string literal's content.
pub fn unescape_java(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Inverse of [`ts_string`] for the escapes it produces.
pub fn unescape_ts(raw: &str) -> String {
    unescape_java(raw)
}

/// Quote `value` as a single-quoted TypeScript string.
pub fn ts_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn playwright_getter(getter: Option<&str>, attribute: Option<&str>) -> String {
    match (getter, attribute) {
        (Some("getText"), _) => "textContent()".to_string(),
        (Some("isDisplayed"), _) => "isVisible()".to_string(),
        (Some("isEnabled"), _) => "isEnabled()".to_string(),
        (Some("isSelected"), _) => "isChecked()".to_string(),
        (Some("size"), _) => "count()".to_string(),
        (_, Some(attribute)) => format!("getAttribute({})", literal_or_expr(attribute)),
        _ => "textContent()".to_string(),
    }
}

/// A Java string literal becomes a TS single-quoted string, anything else is
/// passed through trimmed.
pub fn literal_or_expr(expr: &str) -> String {
    match java_string_content(expr) {
        Some(raw) => ts_string(&unescape_java(raw)),
        None => expr.trim().to_string(),
    }
}

/// `await call`, parenthesized when a member access follows it in `haystack`
/// so the access applies to the awaited value rather than the promise.
fn awaited(call: String, haystack: &str, end: usize) -> String {
    if haystack[end..].trim_start().starts_with('.') {
        format!("(await {call})")
    } else {
        format!("await {call}")
    }
}

/// Rewrite the Selenium calls inside a Java expression into their Playwright
/// equivalents. Unknown constructs pass through.
pub fn rewrite_expression(expr: &str, ctx: &RewriteContext) -> String {
    let page = ctx.page();

    let source = expr.trim();
    let text = FIND_WITH_GETTER.replace_all(source, |caps: &Captures| {
        let locator = convert_locator_on(page, &caps[1], &caps[2]).expression;
        let getter = playwright_getter(
            caps.get(3).map(|m| m.as_str()),
            caps.get(4).map(|m| m.as_str()),
        );
        let end = caps.get(0).map_or(0, |m| m.end());
        awaited(format!("{locator}.{getter}"), source, end)
    });

    let text = FIND_ELEMENT.replace_all(&text, |caps: &Captures| {
        convert_locator_on(page, &caps[1], &caps[2]).expression
    });

    let source: &str = &text;
    let text = DRIVER_QUERY.replace_all(source, |caps: &Captures| {
        let end = caps.get(0).map_or(0, |m| m.end());
        match &caps[1] {
            "getTitle" => awaited(format!("{page}.title()"), source, end),
            "getCurrentUrl" => format!("{page}.url()"),
            _ => awaited(format!("{page}.content()"), source, end),
        }
    });

    let source: &str = &text;
    let text = ELEMENT_GETTER.replace_all(source, |caps: &Captures| {
        let receiver = &caps[1];
        let element = match receiver.strip_prefix("this.") {
            Some(field) => format!("this.{field}"),
            None => ctx.element(receiver),
        };
        let getter = playwright_getter(
            caps.get(2).map(|m| m.as_str()),
            caps.get(3).map(|m| m.as_str()),
        );
        let end = caps.get(0).map_or(0, |m| m.end());
        awaited(format!("{element}.{getter}"), source, end)
    });

    let text = NEW_WITH_DRIVER.replace_all(&text, |caps: &Captures| {
        format!("new {}({page})", &caps[1])
    });

    JAVA_LENGTH
        .replace_all(&text, ".length")
        .replace(".contains(", ".includes(")
}
