//! Java method signatures rendered as TypeScript.

use once_cell::sync::Lazy;
use regex::Regex;

static ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@\w+(?:\([^)]*\))?\s*").expect("Invalid parameter annotation regex")
});

/// TypeScript type for a Java parameter or field type.
pub fn ts_type(java_type: &str) -> &'static str {
    match java_type.trim() {
        "String" | "char" | "Character" | "CharSequence" => "string",
        "int" | "long" | "short" | "byte" | "float" | "double" | "Integer" | "Long" | "Short"
        | "Byte" | "Float" | "Double" => "number",
        "boolean" | "Boolean" => "boolean",
        "WebElement" => "Locator",
        other if is_driver_type(other) => "Page",
        _ => "any",
    }
}

/// Type inside `Promise<...>` for a Java return type.
pub fn ts_return_type(java_type: &str) -> &'static str {
    match java_type.trim() {
        "void" => "void",
        other => ts_type(other),
    }
}

fn is_driver_type(java_type: &str) -> bool {
    java_type == "WebDriver" || java_type.ends_with("Driver")
}

/// One converted parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ts_type: String,
    pub rest: bool,
}

impl Parameter {
    fn render(&self) -> String {
        if self.rest {
            format!("...{}: {}[]", self.name, self.ts_type)
        } else {
            format!("{}: {}", self.name, self.ts_type)
        }
    }
}

/// Parse a Java parameter list. A driver parameter becomes `page: Page`.
/// Pieces that are not `Type name` pairs are dropped.
pub fn parse_parameters(params: &str) -> Vec<Parameter> {
    split_parameters(params)
        .into_iter()
        .filter_map(|param| {
            let param = ANNOTATION.replace_all(param, "");
            let param = param.trim();
            let param = param.strip_prefix("final ").unwrap_or(param).trim();
            let (java_type, name) = param.rsplit_once(char::is_whitespace)?;
            let java_type = java_type.trim();
            let (java_type, rest) = match java_type.strip_suffix("...") {
                Some(element) => (element.trim(), true),
                None => (java_type, false),
            };
            let ts = ts_type(java_type);
            let name = if ts == "Page" { "page" } else { name };
            Some(Parameter {
                name: name.to_string(),
                ts_type: ts.to_string(),
                rest,
            })
        })
        .collect()
}

pub fn render_parameters(params: &[Parameter]) -> String {
    params
        .iter()
        .map(Parameter::render)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Splits on commas outside `<...>` so generic types stay whole.
fn split_parameters(params: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, c) in params.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(&params[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    pieces.push(&params[start..]);
    pieces.retain(|piece| !piece.trim().is_empty());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(params: &str) -> String {
        render_parameters(&parse_parameters(params))
    }

    #[test]
    fn test_type_mapping() {
        assert_eq!(ts_type("String"), "string");
        assert_eq!(ts_type("double"), "number");
        assert_eq!(ts_type("Integer"), "number");
        assert_eq!(ts_type("boolean"), "boolean");
        assert_eq!(ts_type("WebElement"), "Locator");
        assert_eq!(ts_type("WebDriver"), "Page");
        assert_eq!(ts_type("ChromeDriver"), "Page");
        assert_eq!(ts_type("Map<String, String>"), "any");
        assert_eq!(ts_return_type("void"), "void");
        assert_eq!(ts_return_type("DashboardPage"), "any");
    }

    #[test]
    fn test_parameters() {
        assert_eq!(render(""), "");
        assert_eq!(
            render("String username, String password"),
            "username: string, password: string"
        );
        assert_eq!(
            render("WebDriver driver, int timeoutSeconds"),
            "page: Page, timeoutSeconds: number"
        );
        assert_eq!(
            render("final Map<String, Integer> counts, @Nullable WebElement row"),
            "counts: any, row: Locator"
        );
        assert_eq!(render("String... names"), "...names: string[]");
    }
}
