use batch_processor::{BatchConfig, BatchConverter, Strategy};
use pretty_assertions::assert_eq;
use project_analy::{analyze_project, ProjectStructure};

const LOGIN_SUITE: &str = r#"package com.acme.tests;

import com.acme.pages.DashboardPage;
import com.acme.pages.LoginPage;
import com.acme.util.TestUtils;
import org.junit.Test;

public class LoginSuiteTest {
    private WebDriver driver;

    @Test
    public void testLogin() {
        driver.get("https://example.com/login");
        driver.findElement(By.id("username")).sendKeys("admin");
        driver.findElement(By.id("loginBtn")).click();
        assertTrue(driver.getCurrentUrl().contains("/dashboard"));
    }
}
"#;

const DASHBOARD_PAGE: &str = r#"package com.acme.pages;

public class DashboardPage {
    private WebDriver driver;
    private WebElement welcomeMessage;

    public DashboardPage(WebDriver driver) {
        this.driver = driver;
        welcomeMessage = driver.findElement(By.className("welcome"));
    }

    public String getWelcomeText() {
        return welcomeMessage.getText();
    }
}
"#;

const LOGIN_PAGE: &str = r#"package com.acme.pages;

public class LoginPage {
    private final WebDriver driver;
    private final By username = By.id("username");
    private final By password = By.id("password");

    public LoginPage(WebDriver driver) {
        this.driver = driver;
    }

    public DashboardPage loginAs(String user, String pass) {
        driver.findElement(username).sendKeys(user);
        driver.findElement(password).sendKeys(pass);
        driver.findElement(By.id("loginBtn")).click();
        return new DashboardPage(driver);
    }
}
"#;

const TEST_UTILS: &str = r#"package com.acme.util;

public class TestUtils {
    public static void pause(WebDriver driver, long millis) {
        Thread.sleep(millis);
    }
}
"#;

const BROKEN_PAGE: &str = r#"package com.acme.pages;

public class BrokenPage {
    private WebElement header;

    public void open() {
        header.click();
"#;

const APP_CONFIG: &str = r#"package com.acme;

public class AppConfig {
    public String baseUrl() {
        return "https://example.com";
    }
}
"#;

const BUILD_GRADLE: &str = r#"plugins {
    id 'java'
}

repositories {
    mavenCentral()
}

dependencies {
    testImplementation 'org.seleniumhq.selenium:selenium-java:4.15.0'
}
"#;

fn project() -> ProjectStructure {
    analyze_project([
        ("build.gradle", BUILD_GRADLE),
        ("src/main/java/com/acme/AppConfig.java", APP_CONFIG),
        ("src/main/java/com/acme/pages/BrokenPage.java", BROKEN_PAGE),
        ("src/main/java/com/acme/pages/DashboardPage.java", DASHBOARD_PAGE),
        ("src/main/java/com/acme/pages/LoginPage.java", LOGIN_PAGE),
        ("src/test/java/com/acme/tests/LoginSuiteTest.java", LOGIN_SUITE),
        ("src/test/java/com/acme/util/TestUtils.java", TEST_UTILS),
        ("src/test/resources/users.json", "[{\"user\": \"admin\"}]\n"),
    ])
}

#[test]
fn test_one_failure_does_not_stop_the_batch() {
    let structure = project();
    let result = BatchConverter::new(&structure, BatchConfig::default()).convert();

    assert_eq!(result.summary.total_files, 6);
    assert_eq!(result.summary.converted_files, 4);
    assert_eq!(result.summary.errors, 1);
    assert_eq!(result.summary.skipped_files, 1);
    assert!(result.summary.is_balanced());

    assert_eq!(result.failures.len(), 1);
    assert_eq!(
        result.failures[0].file_path,
        "src/main/java/com/acme/pages/BrokenPage.java"
    );
    assert!(result.failures[0].error.contains("never closed"));

    let paths: Vec<(&str, Strategy)> = result
        .outputs
        .iter()
        .map(|o| (o.file_path.as_str(), o.strategy))
        .collect();
    assert_eq!(
        paths,
        [
            ("src/com/acme/pages/DashboardPage.ts", Strategy::PageObject),
            ("src/com/acme/pages/LoginPage.ts", Strategy::PageObject),
            ("src/com/acme/tests/LoginSuiteTest.spec.ts", Strategy::Test),
            ("src/com/acme/util/TestUtils.ts", Strategy::Utility),
        ]
    );
}

#[test]
fn test_test_class_imports_its_collaborators() {
    let structure = project();
    let result = BatchConverter::new(&structure, BatchConfig::default()).convert();
    let suite = result
        .outputs
        .iter()
        .find(|o| o.class_name == "LoginSuiteTest")
        .unwrap();

    let head: Vec<&str> = suite.converted_code.lines().take(6).collect();
    assert_eq!(
        head,
        [
            "import { test, expect } from '@playwright/test';",
            "import { DashboardPage } from '../pages/DashboardPage';",
            "import { LoginPage } from '../pages/LoginPage';",
            "import * as TestUtils from '../util/TestUtils';",
            "",
            "test.describe('LoginSuiteTest', () => {",
        ]
    );
    assert!(suite
        .converted_code
        .contains("    await page.locator('#loginBtn').click();\n"));
    assert_eq!(suite.original_code, LOGIN_SUITE);
}

#[test]
fn test_page_objects_and_utilities() {
    let structure = project();
    let result = BatchConverter::new(&structure, BatchConfig::default()).convert();
    let by_name = |name: &str| {
        result
            .outputs
            .iter()
            .find(|o| o.class_name == name)
            .unwrap()
    };

    let dashboard = by_name("DashboardPage");
    assert_eq!(
        dashboard.converted_code,
        r#"import { Page, Locator } from '@playwright/test';

/**
 * Page object for DashboardPage
 */
export class DashboardPage {
  readonly page: Page;
  readonly welcomeMessage: Locator;

  constructor(page: Page) {
    this.page = page;
    this.welcomeMessage = page.locator('.welcome');
  }

  async getWelcomeText(): Promise<string> {
    return await this.welcomeMessage.textContent();
  }
}
"#
    );

    let login = by_name("LoginPage");
    assert!(login
        .converted_code
        .contains("  async loginAs(user: string, pass: string): Promise<any> {\n"));
    assert!(login
        .converted_code
        .contains("    await this.username.fill(user);\n"));
    assert!(login
        .converted_code
        .contains("    return new DashboardPage(this.page);\n"));
    let head: Vec<&str> = login.converted_code.lines().take(3).collect();
    assert_eq!(
        head,
        [
            "import { Page, Locator } from '@playwright/test';",
            "import { DashboardPage } from './DashboardPage';",
            "",
        ]
    );

    let utils = by_name("TestUtils");
    assert!(utils.converted_code.contains(
        "export async function pause(page: Page, millis: number): Promise<void> {\n  await page.waitForTimeout(millis);\n}\n"
    ));
}

#[test]
fn test_scaffolding_and_resources() {
    let structure = project();
    let result = BatchConverter::new(&structure, BatchConfig::default()).convert();

    let config_paths: Vec<&str> = result
        .config_files
        .iter()
        .map(|f| f.file_path.as_str())
        .collect();
    assert_eq!(
        config_paths,
        ["playwright.config.ts", "package.json", "tsconfig.json", "README.md"]
    );
    assert_eq!(result.resource_files.len(), 1);
    assert_eq!(
        result.resource_files[0].file_path,
        "src/test/resources/users.json"
    );

    let config = BatchConfig {
        include_resources: false,
        ..Default::default()
    };
    let without = BatchConverter::new(&structure, config).convert();
    assert!(without.resource_files.is_empty());
    assert_eq!(without.config_files.len(), 4);
}

#[test]
fn test_dedicated_pool_matches_default() {
    let structure = project();
    let default = BatchConverter::new(&structure, BatchConfig::default()).convert();
    let config = BatchConfig {
        worker_count: 2,
        ..Default::default()
    };
    let pooled = BatchConverter::new(&structure, config).convert();
    assert_eq!(default, pooled);
}

#[test]
fn test_result_serializes_camel_case() {
    let structure = project();
    let result = BatchConverter::new(&structure, BatchConfig::default()).convert();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["summary"]["convertedFiles"], 4);
    assert_eq!(json["summary"]["skippedFiles"], 1);
    assert_eq!(json["outputs"][0]["strategy"], "pageObject");
    assert_eq!(json["configFiles"][1]["filePath"], "package.json");
    assert_eq!(
        json["failures"][0]["filePath"],
        "src/main/java/com/acme/pages/BrokenPage.java"
    );
}

#[test]
fn test_empty_project() {
    let structure = analyze_project(Vec::<(String, String)>::new());
    let result = BatchConverter::new(&structure, BatchConfig::default()).convert();
    assert!(result.outputs.is_empty());
    assert_eq!(result.summary.total_files, 0);
    assert!(result.summary.is_balanced());
    assert_eq!(result.config_files.len(), 4);
}
