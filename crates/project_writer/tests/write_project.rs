use batch_processor::{BatchConfig, BatchConverter};
use project_analy::analyze_project;
use project_writer::{ProjectWriter, REPORT_FILE};
use std::fs;
use tempfile::TempDir;

const SEARCH_TEST: &str = r#"package com.acme;

import org.junit.Test;

public class SearchTest {
    @Test
    public void searchesProducts() {
        driver.get("https://shop.example.com");
        driver.findElement(By.name("q")).sendKeys("lamp");
        driver.switchTo().frame("results");
    }
}
"#;

const CART_PAGE: &str = r#"package com.acme.pages;

public class CartPage {
    @FindBy(id = "checkout")
    private WebElement checkoutButton;

    public void checkout() {
        checkoutButton.click();
    }
}
"#;

#[test]
fn test_writes_outputs_scaffolding_and_report() {
    let structure = analyze_project([
        ("src/test/java/com/acme/SearchTest.java", SEARCH_TEST),
        ("src/main/java/com/acme/pages/CartPage.java", CART_PAGE),
        ("src/test/resources/search.properties", "term=lamp\n"),
    ]);
    let result = BatchConverter::new(&structure, BatchConfig::default()).convert();

    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("shop_playwright");
    let summary = structure.summary();
    let written = ProjectWriter::new(&out, false)
        .write(&result, Some(&summary))
        .unwrap();

    assert_eq!(written.files_written, 2 + 4 + 1);
    assert!(out.join("src/com/acme/SearchTest.spec.ts").is_file());
    assert!(out.join("src/com/acme/pages/CartPage.ts").is_file());
    assert!(out.join("playwright.config.ts").is_file());
    assert!(out.join("package.json").is_file());
    assert!(out.join("tsconfig.json").is_file());
    assert!(out.join("README.md").is_file());
    assert_eq!(
        fs::read_to_string(out.join("src/test/resources/search.properties")).unwrap(),
        "term=lamp\n"
    );

    let spec = fs::read_to_string(out.join("src/com/acme/SearchTest.spec.ts")).unwrap();
    assert!(spec.contains("await page.locator('[name=\"q\"]').fill('lamp');"));

    assert_eq!(written.report_path, out.join(REPORT_FILE));
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&written.report_path).unwrap()).unwrap();
    assert_eq!(report["summary"]["totalFiles"], 2);
    assert_eq!(report["summary"]["convertedFiles"], 2);
    assert!(report["generatedAt"].is_string());
    assert_eq!(report["analysis"]["totalClasses"], 2);

    let files = report["files"].as_array().unwrap();
    let search = files
        .iter()
        .find(|f| f["className"] == "SearchTest")
        .unwrap();
    let warnings: Vec<&serde_json::Value> = search["comments"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["type"] == "warning")
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["line"], 10);
}

#[test]
fn test_second_write_needs_overwrite() {
    let structure = analyze_project([("src/main/java/com/acme/pages/CartPage.java", CART_PAGE)]);
    let result = BatchConverter::new(&structure, BatchConfig::default()).convert();

    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");
    ProjectWriter::new(&out, false).write(&result, None).unwrap();
    assert!(ProjectWriter::new(&out, false).write(&result, None).is_err());

    let again = ProjectWriter::new(&out, true).write(&result, None).unwrap();
    assert_eq!(again.files_written, 5);
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&again.report_path).unwrap()).unwrap();
    assert!(report.get("analysis").is_none());
}
