//! Fragment types produced by the extractor.

use serde::{Deserialize, Serialize};

/// The seven fragment categories, in extraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Import,
    Class,
    Method,
    Locator,
    Assertion,
    Wait,
    Action,
}

/// Selenium `By` strategies the extractor recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocatorKind {
    Id,
    Name,
    Xpath,
    CssSelector,
    ClassName,
    TagName,
    LinkText,
    PartialLinkText,
}

impl LocatorKind {
    pub const ALL: [LocatorKind; 8] = [
        LocatorKind::Id,
        LocatorKind::Name,
        LocatorKind::Xpath,
        LocatorKind::CssSelector,
        LocatorKind::ClassName,
        LocatorKind::TagName,
        LocatorKind::LinkText,
        LocatorKind::PartialLinkText,
    ];

    /// Parse the method name used after `By.` (or the `@FindBy` attribute name).
    pub fn from_selenium(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "xpath" => Some(Self::Xpath),
            "cssSelector" | "css" => Some(Self::CssSelector),
            "className" => Some(Self::ClassName),
            "tagName" => Some(Self::TagName),
            "linkText" => Some(Self::LinkText),
            "partialLinkText" => Some(Self::PartialLinkText),
            _ => None,
        }
    }

    pub fn selenium_name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Xpath => "xpath",
            Self::CssSelector => "cssSelector",
            Self::ClassName => "className",
            Self::TagName => "tagName",
            Self::LinkText => "linkText",
            Self::PartialLinkText => "partialLinkText",
        }
    }
}

/// What an action call does, derived from the method name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    Click,
    Input,
    Clear,
    Submit,
    Select,
    Hover,
    DragAndDrop,
    Perform,
}

impl ActionType {
    pub fn from_call(call: &str) -> Option<Self> {
        if call.starts_with(".click(") {
            Some(Self::Click)
        } else if call.starts_with(".sendKeys(") {
            Some(Self::Input)
        } else if call.starts_with(".clear(") {
            Some(Self::Clear)
        } else if call.starts_with(".submit(") {
            Some(Self::Submit)
        } else if call.starts_with(".selectBy") {
            Some(Self::Select)
        } else if call.starts_with(".moveToElement(") {
            Some(Self::Hover)
        } else if call.starts_with(".dragAndDrop(") {
            Some(Self::DragAndDrop)
        } else if call.starts_with(".perform(") {
            Some(Self::Perform)
        } else {
            None
        }
    }
}

/// A method-like block: signature details plus its brace-balanced text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodInfo {
    pub method_name: String,
    pub annotations: Vec<String>,
    pub modifiers: Vec<String>,
    pub return_type: String,
    pub parameters: String,
    pub is_test_method: bool,
    pub is_setup_method: bool,
    pub is_teardown_method: bool,
    /// From the first annotation through the closing brace.
    pub body: String,
    /// 1-based line of the first line of `body`.
    pub body_line: usize,
    /// False when the closing brace was never found; `body` then runs to EOF.
    pub complete: bool,
}

impl MethodInfo {
    pub fn is_public(&self) -> bool {
        self.modifiers.iter().any(|m| m == "public")
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.iter().any(|m| m == "static")
    }
}

/// Kind-specific fields of a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum FragmentAttributes {
    Import {
        import_path: String,
        is_static: bool,
        is_selenium_related: bool,
    },
    Class {
        class_name: String,
        parent_class: Option<String>,
        interface_list: Vec<String>,
    },
    Method(MethodInfo),
    Locator {
        locator_kind: LocatorKind,
        locator_value: String,
    },
    Assertion {
        assertion_name: String,
        argument_text: String,
    },
    Wait {
        wait_target: String,
        condition: String,
    },
    Action {
        action_type: ActionType,
        action_call: String,
        statement: String,
    },
}

/// One recognized syntactic unit of a Java source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFragment {
    /// The matched source text, for tracing a fragment back to its origin.
    pub raw_text: String,
    pub attributes: FragmentAttributes,
    /// 1-based; 0 means the fragment has no single source line.
    pub source_line: usize,
}

impl ParsedFragment {
    pub fn kind(&self) -> FragmentKind {
        match self.attributes {
            FragmentAttributes::Import { .. } => FragmentKind::Import,
            FragmentAttributes::Class { .. } => FragmentKind::Class,
            FragmentAttributes::Method(_) => FragmentKind::Method,
            FragmentAttributes::Locator { .. } => FragmentKind::Locator,
            FragmentAttributes::Assertion { .. } => FragmentKind::Assertion,
            FragmentAttributes::Wait { .. } => FragmentKind::Wait,
            FragmentAttributes::Action { .. } => FragmentKind::Action,
        }
    }

    pub fn as_method(&self) -> Option<&MethodInfo> {
        match &self.attributes {
            FragmentAttributes::Method(info) => Some(info),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_kind_names_roundtrip() {
        for kind in LocatorKind::ALL {
            assert_eq!(LocatorKind::from_selenium(kind.selenium_name()), Some(kind));
        }
        assert_eq!(LocatorKind::from_selenium("shadowRoot"), None);
    }

    #[test]
    fn test_action_type_from_call() {
        assert_eq!(ActionType::from_call(".click()"), Some(ActionType::Click));
        assert_eq!(
            ActionType::from_call(".selectByValue(\"x\")"),
            Some(ActionType::Select)
        );
        assert_eq!(ActionType::from_call(".getText()"), None);
    }

    #[test]
    fn test_fragment_serializes_with_kind_tag() {
        let fragment = ParsedFragment {
            raw_text: "import org.junit.Test;".to_string(),
            attributes: FragmentAttributes::Import {
                import_path: "org.junit.Test".to_string(),
                is_static: false,
                is_selenium_related: true,
            },
            source_line: 3,
        };
        let json = serde_json::to_value(&fragment).unwrap();
        assert_eq!(json["attributes"]["kind"], "import");
        assert_eq!(json["attributes"]["isSeleniumRelated"], true);
        assert_eq!(json["sourceLine"], 3);
    }
}
