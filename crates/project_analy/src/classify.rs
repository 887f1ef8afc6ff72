//! Per-class role heuristics. Each predicate is evaluated on its own, so a
//! class can come out as both a test and a page object.

use crate::ClassRoles;
use once_cell::sync::Lazy;
use regex::Regex;

static PUBLIC_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bpublic\s+(?:(?:static|final|synchronized)\s+)*[\w.]+(?:<[^>()]*>)?(?:\[\])*\s+\w+\s*\(")
        .expect("Invalid public method regex")
});

static PUBLIC_STATIC_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bpublic\s+(?:final\s+)?static\s+(?:(?:final|synchronized)\s+)*[\w.]+(?:<[^>()]*>)?(?:\[\])*\s+\w+\s*\(")
        .expect("Invalid public static method regex")
});

/// Share of static public methods above which a class counts as a utility.
pub const UTILITY_STATIC_RATIO: f64 = 0.7;

pub fn is_test_class(content: &str, class_name: &str, path: &str) -> bool {
    if content.contains("@Test") || content.contains("extends TestCase") {
        return true;
    }
    if ["Test", "Tests", "TestCase"]
        .iter()
        .any(|suffix| class_name.ends_with(suffix))
    {
        return true;
    }
    let path = format!("/{}", path.replace('\\', "/"));
    path.contains("/test/") || path.contains("/tests/")
}

/// Static share of the public method signatures, `None` when there are none.
pub fn static_method_ratio(content: &str) -> Option<f64> {
    let total = PUBLIC_METHOD.find_iter(content).count();
    if total == 0 {
        return None;
    }
    let statics = PUBLIC_STATIC_METHOD.find_iter(content).count();
    Some(statics as f64 / total as f64)
}

pub fn is_utility_class(content: &str, class_name: &str) -> bool {
    if ["Util", "Utils", "Helper", "Helpers"]
        .iter()
        .any(|suffix| class_name.ends_with(suffix))
    {
        return true;
    }
    static_method_ratio(content).is_some_and(|ratio| ratio > UTILITY_STATIC_RATIO)
}

pub fn is_page_object_class(content: &str, class_name: &str) -> bool {
    class_name.ends_with("Page")
        || class_name.ends_with("PageObject")
        || (content.contains("WebElement") && content.contains("findElement"))
        || content.contains("PageFactory.initElements")
}

/// Every role the class satisfies on its own content. `BASE` is never set
/// here; it depends on the other classes.
pub fn classify(content: &str, class_name: &str, path: &str) -> ClassRoles {
    let mut roles = ClassRoles::empty();
    roles.set(ClassRoles::TEST, is_test_class(content, class_name, path));
    roles.set(ClassRoles::UTILITY, is_utility_class(content, class_name));
    roles.set(
        ClassRoles::PAGE_OBJECT,
        is_page_object_class(content, class_name),
    );
    roles
}
