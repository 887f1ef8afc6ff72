//! Line-by-line rewriting of Selenium statements.
//!
//! Every trimmed line is offered to an ordered rule table. The first rule
//! whose trigger matches owns the line: if it cannot finish the rewrite, the
//! line becomes a manual-conversion marker instead of trying later rules.

use crate::expression::{
    java_string_content, literal_or_expr, matching_paren, rewrite_expression, split_args,
    split_first_comma, ts_string, unescape_java, Target,
};
use crate::locator::convert_locator_on;
use crate::{ConversionComment, Severity};
use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Prefix of every line the rewriter could not convert.
pub const MANUAL_MARKER: &str = "// MANUAL CONVERSION NEEDED:";

static NAVIGATE_GET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w*[dD]river\.get\((.+)\)\s*;?$").expect("Invalid navigation regex")
});

static NAVIGATE_TO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w*[dD]river\.navigate\(\)\.to\((.+)\)\s*;?$").expect("Invalid navigate-to regex")
});

static NAVIGATE_HISTORY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w*[dD]river\.navigate\(\)\.(back|forward|refresh)\(\)\s*;?$")
        .expect("Invalid history regex")
});

static FIND_ELEMENT_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w+\.findElement\(").expect("Invalid findElement regex"));

static BY_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*By\.(\w+)\(\s*"((?:[^"\\]|\\.)*)"\s*\)\s*$"#).expect("Invalid By regex")
});

static CHAINED_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\.(\w+)\(").expect("Invalid chained call regex"));

static NAVIGATION_TRIGGER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\w*[dD]river\.(?:get\(|navigate\(\)\.)").expect("Invalid navigation trigger regex")
});

static SELECT_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\)\.selectBy(VisibleText|Value|Index)\((.+)\)$").expect("Invalid select regex")
});

static ASSERT_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(assertEquals|assertNotEquals|assertTrue|assertFalse|assertNotNull|assertNull)\s*\(")
        .expect("Invalid assert regex")
});

static SLEEP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Thread\.sleep\(\s*(\d+|[A-Za-z_]\w*)[lL]?\s*\)").expect("Invalid sleep regex"));

static WAIT_CONDITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:ExpectedConditions\.)?(\w+)\((.*)\)$").expect("Invalid wait condition regex")
});

static SCRIPT_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.executeScript\(").expect("Invalid script regex"));

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:final\s+)?(WebElement|String|int|long|double|float|boolean|List<WebElement>)\s+(\w+)\s*(?:=\s*(.+?))?\s*;$",
    )
    .expect("Invalid declaration regex")
});

static DECLARATION_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:final\s+)?(?:WebElement|String|int|long|double|float|boolean|List<WebElement>)\s+\w+")
        .expect("Invalid declaration start regex")
});

static RETURN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^return(?:\s+(.+?))?\s*;$").expect("Invalid return regex"));

static ELEMENT_VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^((?:this\.)?[a-z]\w*)(\.(?:click|sendKeys|clear|submit|getText|getAttribute|isDisplayed|isEnabled|isSelected)\(.*\))\s*;$",
    )
    .expect("Invalid element variable regex")
});

static LIFECYCLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"new\s+\w*Driver\s*\(|\b\w*[dD]river\.(?:quit|close)\(\)|\.manage\(\)")
        .expect("Invalid lifecycle regex")
});

/// What a rewrite is working against: the page handle and, inside a page
/// object, the element fields that live on `this`.
#[derive(Debug, Clone)]
pub struct RewriteContext {
    page: String,
    fields: BTreeSet<String>,
}

impl Default for RewriteContext {
    fn default() -> Self {
        Self {
            page: "page".to_string(),
            fields: BTreeSet::new(),
        }
    }
}

impl RewriteContext {
    pub fn for_page_object(fields: impl IntoIterator<Item = String>) -> Self {
        Self {
            page: "this.page".to_string(),
            fields: fields.into_iter().collect(),
        }
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    /// Reference to an element variable, qualified with `this.` when it is a
    /// page-object field.
    pub fn element(&self, name: &str) -> String {
        if self.fields.contains(name) {
            format!("this.{name}")
        } else {
            name.to_string()
        }
    }
}

/// Statement categories, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCategory {
    Navigation,
    ElementAction,
    Assertion,
    Wait,
    Script,
    Declaration,
    Return,
    ElementVariable,
    Lifecycle,
}

impl RuleCategory {
    fn label(self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::ElementAction => "element action",
            Self::Assertion => "assertion",
            Self::Wait => "wait",
            Self::Script => "script execution",
            Self::Declaration => "declaration",
            Self::Return => "return statement",
            Self::ElementVariable => "element action",
            Self::Lifecycle => "browser lifecycle call",
        }
    }
}

struct Rule {
    category: RuleCategory,
    matches: fn(&str) -> bool,
}

static RULES: [Rule; 9] = [
    Rule {
        category: RuleCategory::Navigation,
        matches: |line| NAVIGATION_TRIGGER.is_match(line),
    },
    Rule {
        category: RuleCategory::ElementAction,
        matches: |line| line.contains(".findElement("),
    },
    Rule {
        category: RuleCategory::Assertion,
        matches: |line| line.contains("assert") || line.contains("Assert"),
    },
    Rule {
        category: RuleCategory::Wait,
        matches: |line| {
            line.contains(".until(")
                || line.contains("Thread.sleep(")
                || line.contains("new WebDriverWait(")
        },
    },
    Rule {
        category: RuleCategory::Script,
        matches: |line| SCRIPT_CALL.is_match(line),
    },
    Rule {
        category: RuleCategory::Declaration,
        matches: |line| DECLARATION_START.is_match(line),
    },
    Rule {
        category: RuleCategory::Return,
        matches: |line| line == "return;" || line.starts_with("return "),
    },
    Rule {
        category: RuleCategory::ElementVariable,
        matches: |line| ELEMENT_VARIABLE.is_match(line),
    },
    Rule {
        category: RuleCategory::Lifecycle,
        matches: |line| LIFECYCLE.is_match(line),
    },
];

/// Output of [`rewrite_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenLine {
    pub code: String,
    pub comments: Vec<ConversionComment>,
}

/// Rewrite one statement in a plain test context, with no source line known.
pub fn rewrite_line(line: &str) -> RewrittenLine {
    let ctx = RewriteContext::default();
    let mut rewriter = LineRewriter::new(&ctx);
    let code = rewriter.rewrite(line, 0);
    RewrittenLine {
        code,
        comments: rewriter.into_comments(),
    }
}

/// Applies the rule table line by line, collecting review comments.
pub struct LineRewriter<'c> {
    ctx: &'c RewriteContext,
    comments: Vec<ConversionComment>,
    line: usize,
}

impl<'c> LineRewriter<'c> {
    pub fn new(ctx: &'c RewriteContext) -> Self {
        Self {
            ctx,
            comments: Vec::new(),
            line: 0,
        }
    }

    pub fn comments(&self) -> &[ConversionComment] {
        &self.comments
    }

    pub fn into_comments(self) -> Vec<ConversionComment> {
        self.comments
    }

    /// Rewrite `line`, attributing any comment to `source_line` (0 if unknown).
    pub fn rewrite(&mut self, line: &str, source_line: usize) -> String {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return "//".to_string();
        }
        if trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*') {
            return trimmed.to_string();
        }

        self.line = source_line;
        match RULES.iter().find(|rule| (rule.matches)(trimmed)) {
            Some(rule) => {
                trace!("{:?} rule owns line {}: {}", rule.category, source_line, trimmed);
                match self.apply(rule.category, trimmed) {
                    Some(code) => code,
                    None => self.manual(trimmed, Some(rule.category)),
                }
            }
            None => self.manual(trimmed, None),
        }
    }

    fn apply(&mut self, category: RuleCategory, line: &str) -> Option<String> {
        match category {
            RuleCategory::Navigation => self.navigation(line),
            RuleCategory::ElementAction => self.element_action(line),
            RuleCategory::Assertion => self.assertion(line),
            RuleCategory::Wait => self.wait(line),
            RuleCategory::Script => self.script(line),
            RuleCategory::Declaration => self.declaration(line),
            RuleCategory::Return => self.return_statement(line),
            RuleCategory::ElementVariable => self.element_variable(line),
            RuleCategory::Lifecycle => self.lifecycle(line),
        }
    }

    fn note(&mut self, severity: Severity, text: impl Into<String>) {
        self.comments
            .push(ConversionComment::new(self.line, text, severity));
    }

    fn manual(&mut self, line: &str, category: Option<RuleCategory>) -> String {
        let text = match category {
            Some(category) => format!("Could not convert {}: {}", category.label(), line),
            None => format!("Could not convert: {line}"),
        };
        self.note(Severity::Warning, text);
        format!("{MANUAL_MARKER} {line}")
    }

    fn locator(&mut self, kind: &str, raw_value: &str) -> String {
        let converted = convert_locator_on(self.ctx.page(), kind, raw_value);
        if let Some(warning) = converted.warning {
            self.note(Severity::Warning, warning);
        }
        converted.expression
    }

    fn navigation(&mut self, line: &str) -> Option<String> {
        let page = self.ctx.page().to_string();
        if let Some(caps) = NAVIGATE_HISTORY.captures(line) {
            let call = match &caps[1] {
                "back" => "goBack",
                "forward" => "goForward",
                _ => "reload",
            };
            return Some(format!("await {page}.{call}();"));
        }
        let caps = NAVIGATE_GET
            .captures(line)
            .or_else(|| NAVIGATE_TO.captures(line))?;
        let target = caps[1].trim();
        if split_args(target).len() != 1 {
            return None;
        }
        Some(format!("await {page}.goto({});", literal_or_expr(target)))
    }

    fn element_action(&mut self, line: &str) -> Option<String> {
        let body = line.strip_suffix(';').unwrap_or(line).trim_end();

        if body.starts_with("new Select(") {
            return self.select(body);
        }

        let found = FIND_ELEMENT_CALL.find(body)?;
        let target = Target::parse(&body[..found.start()])?;
        let open = found.end() - 1;
        let close = matching_paren(body, open)?;
        let inner = body[open + 1..close].trim();
        let locator = match BY_CALL.captures(inner) {
            Some(by) => self.locator(&by[1], &by[2]),
            None if self.ctx.has_field(inner) => self.ctx.element(inner),
            None => return None,
        };
        let rest = body[close + 1..].trim();

        if rest.is_empty() {
            return Some(match target {
                Target::Statement => {
                    format!("await {locator}.waitFor({{ state: 'attached' }});")
                }
                target => format!("{}{locator};", target.lead()),
            });
        }

        let (method, args) = single_call(rest)?;
        self.element_call(&locator, method, args, &target)
    }

    /// `<element>.<method>(<args>)` on an already-rendered element reference.
    fn element_call(
        &mut self,
        element: &str,
        method: &str,
        args: &str,
        target: &Target,
    ) -> Option<String> {
        let lead = target.lead();
        let code = match method {
            "click" => format!("await {element}.click();"),
            "clear" => format!("await {element}.clear();"),
            "submit" => format!("{element}.evaluate((el) => (el as HTMLInputElement).form?.submit());"),
            "sendKeys" => return self.send_keys(element, args),
            "getText" => format!("{lead}await {element}.textContent();"),
            "isDisplayed" => format!("{lead}await {element}.isVisible();"),
            "isEnabled" => format!("{lead}await {element}.isEnabled();"),
            "isSelected" => format!("{lead}await {element}.isChecked();"),
            "getAttribute" => format!(
                "{lead}await {element}.getAttribute({});",
                literal_or_expr(args)
            ),
            _ => return None,
        };
        Some(code)
    }

    fn send_keys(&mut self, element: &str, args: &str) -> Option<String> {
        let args = split_args(args);
        let [value] = args.as_slice() else {
            return None;
        };
        if let Some(key) = value.strip_prefix("Keys.") {
            return Some(format!("await {element}.press({});", ts_string(keyboard_key(key)?)));
        }
        let value = match java_string_content(value) {
            Some(raw) => ts_string(&unescape_java(raw)),
            None => rewrite_expression(value, self.ctx),
        };
        Some(format!("await {element}.fill({value});"))
    }

    fn select(&mut self, body: &str) -> Option<String> {
        let open = "new Select".len();
        let close = matching_paren(body, open)?;
        let inner = body[open + 1..close].trim();

        let element = match FIND_ELEMENT_CALL.find(inner) {
            Some(found) if found.start() == 0 || inner[..found.start()].trim().is_empty() => {
                let call_open = found.end() - 1;
                let call_close = matching_paren(inner, call_open)?;
                let by = BY_CALL.captures(&inner[call_open + 1..call_close])?;
                self.locator(&by[1], &by[2])
            }
            Some(_) => return None,
            None if inner.chars().all(|c| c.is_alphanumeric() || c == '_') => {
                self.ctx.element(inner)
            }
            None => return None,
        };

        let caps = SELECT_CALL.captures(&body[close..])?;
        let value = literal_or_expr(&caps[2]);
        let option = match &caps[1] {
            "VisibleText" => format!("{{ label: {value} }}"),
            "Index" => format!("{{ index: {value} }}"),
            _ => value,
        };
        Some(format!("await {element}.selectOption({option});"))
    }

    fn assertion(&mut self, line: &str) -> Option<String> {
        let found = ASSERT_CALL.captures(line)?;
        let name = found.get(1)?;
        let open = found.get(0)?.end() - 1;
        let close = matching_paren(line, open)?;
        let args = &line[open + 1..close];

        let code = match name.as_str() {
            "assertEquals" | "assertNotEquals" => {
                let (actual, expected) = split_first_comma(args)?;
                let matcher = if name.as_str() == "assertEquals" {
                    "toBe"
                } else {
                    "not.toBe"
                };
                format!(
                    "expect({}).{matcher}({});",
                    rewrite_expression(actual, self.ctx),
                    rewrite_expression(expected, self.ctx)
                )
            }
            unary => {
                let matcher = match unary {
                    "assertTrue" => "toBe(true)",
                    "assertFalse" => "toBe(false)",
                    "assertNotNull" => "not.toBeNull()",
                    _ => "toBeNull()",
                };
                match split_args(args).as_slice() {
                    [condition] => {
                        format!("expect({}).{matcher};", rewrite_expression(condition, self.ctx))
                    }
                    [message, condition] => format!(
                        "expect({}, {}).{matcher};",
                        rewrite_expression(condition, self.ctx),
                        literal_or_expr(message)
                    ),
                    _ => return None,
                }
            }
        };
        Some(code)
    }

    fn wait(&mut self, line: &str) -> Option<String> {
        let page = self.ctx.page().to_string();

        if line.contains("Thread.sleep(") {
            let caps = SLEEP.captures(line)?;
            self.note(
                Severity::Info,
                "Thread.sleep kept as a fixed waitForTimeout; prefer web-first assertions",
            );
            return Some(format!("await {page}.waitForTimeout({});", &caps[1]));
        }

        let Some(until) = line.find(".until(") else {
            self.note(
                Severity::Info,
                "WebDriverWait removed: Playwright locators wait automatically",
            );
            return Some(format!("// WebDriverWait removed: {line}"));
        };

        let open = until + ".until".len();
        let close = matching_paren(line, open)?;
        let condition = line[open + 1..close].trim();
        let caps = WAIT_CONDITION.captures(condition)?;
        let arg = caps[2].trim();

        let state = match &caps[1] {
            "visibilityOfElementLocated" | "visibilityOf" => "visible",
            "presenceOfElementLocated" | "elementToBeClickable" => "attached",
            "invisibilityOfElementLocated" | "invisibilityOf" => "hidden",
            "urlContains" => {
                return Some(format!(
                    "await {page}.waitForURL((url) => url.toString().includes({}));",
                    literal_or_expr(arg)
                ));
            }
            "titleIs" => {
                return Some(format!(
                    "await expect({page}).toHaveTitle({});",
                    literal_or_expr(arg)
                ));
            }
            _ => return None,
        };

        let element = match BY_CALL.captures(arg) {
            Some(by) => self.locator(&by[1], &by[2]),
            None if !arg.is_empty() && arg.chars().all(|c| c.is_alphanumeric() || c == '_') => {
                self.ctx.element(arg)
            }
            None => return None,
        };
        Some(format!("await {element}.waitFor({{ state: '{state}' }});"))
    }

    fn script(&mut self, line: &str) -> Option<String> {
        let found = SCRIPT_CALL.find(line)?;
        let open = found.end() - 1;
        let close = matching_paren(line, open)?;
        let args = split_args(&line[open + 1..close]);
        let script = unescape_java(java_string_content(args.first()?)?);
        let script = script.trim().trim_end_matches(';');

        let prefix = &line[..found.start()];
        let target = match prefix.split_once('=') {
            Some((lhs, _)) => Target::parse(&format!("{}=", lhs.trim()))?,
            None if prefix.trim_start().starts_with("return ") => Target::Return,
            None => Target::Statement,
        };
        let lead = target.lead();

        match args.as_slice() {
            [_] => Some(format!(
                "{lead}await {}.evaluate(() => {{ {script}; }});",
                self.ctx.page()
            )),
            [_, element] if element.chars().all(|c| c.is_alphanumeric() || c == '_') => {
                let script = script.replace("arguments[0]", "el");
                Some(format!(
                    "{lead}await {}.evaluate((el) => {{ {script}; }});",
                    self.ctx.element(element)
                ))
            }
            _ => None,
        }
    }

    fn declaration(&mut self, line: &str) -> Option<String> {
        let caps = DECLARATION.captures(line)?;
        let name = &caps[2];
        match caps.get(3) {
            Some(value) => Some(format!(
                "const {name} = {};",
                rewrite_expression(value.as_str(), self.ctx)
            )),
            None => Some(format!("let {name}: {};", ts_type(&caps[1]))),
        }
    }

    fn return_statement(&mut self, line: &str) -> Option<String> {
        let caps = RETURN.captures(line)?;
        Some(match caps.get(1) {
            Some(value) if self.ctx.has_field(value.as_str()) => {
                format!("return {};", self.ctx.element(value.as_str()))
            }
            Some(value) => format!("return {};", rewrite_expression(value.as_str(), self.ctx)),
            None => "return;".to_string(),
        })
    }

    fn element_variable(&mut self, line: &str) -> Option<String> {
        let caps = ELEMENT_VARIABLE.captures(line)?;
        let receiver = &caps[1];
        let (method, args) = single_call(caps.get(2)?.as_str())?;
        let element = match receiver.strip_prefix("this.") {
            Some(field) => format!("this.{field}"),
            None => self.ctx.element(receiver),
        };
        self.element_call(&element, method, args, &Target::Statement)
    }

    fn lifecycle(&mut self, line: &str) -> Option<String> {
        if line.contains(".deleteAllCookies()") {
            return Some(format!("await {}.context().clearCookies();", self.ctx.page()));
        }
        self.note(
            Severity::Info,
            "Browser lifecycle is handled by the Playwright page fixture",
        );
        Some(format!("// Handled by Playwright: {line}"))
    }
}

/// Split `.method(args)` into its name and arguments. `None` unless the
/// call's own closing paren ends the text, so `.getText().trim()` is refused.
fn single_call(text: &str) -> Option<(&str, &str)> {
    let caps = CHAINED_CALL.captures(text)?;
    let open = caps.get(0)?.end() - 1;
    let close = matching_paren(text, open)?;
    if close + 1 != text.len() {
        return None;
    }
    Some((caps.get(1)?.as_str(), &text[open + 1..close]))
}

fn ts_type(java: &str) -> &'static str {
    match java {
        "String" => "string",
        "int" | "long" | "double" | "float" => "number",
        "boolean" => "boolean",
        _ => "Locator",
    }
}

fn keyboard_key(selenium: &str) -> Option<&'static str> {
    let key = match selenium {
        "ENTER" | "RETURN" => "Enter",
        "TAB" => "Tab",
        "ESCAPE" => "Escape",
        "BACK_SPACE" => "Backspace",
        "DELETE" => "Delete",
        "SPACE" => "Space",
        "ARROW_UP" | "UP" => "ArrowUp",
        "ARROW_DOWN" | "DOWN" => "ArrowDown",
        "ARROW_LEFT" | "LEFT" => "ArrowLeft",
        "ARROW_RIGHT" | "RIGHT" => "ArrowRight",
        "HOME" => "Home",
        "END" => "End",
        "PAGE_UP" => "PageUp",
        "PAGE_DOWN" => "PageDown",
        _ => return None,
    };
    Some(key)
}
