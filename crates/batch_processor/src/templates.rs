//! Scaffolding files emitted with every project conversion. The content is
//! fixed; nothing here depends on the converted project.

use crate::GeneratedFile;

pub const PLAYWRIGHT_CONFIG: &str = include_str!("../templates/playwright.config.ts");
pub const PACKAGE_JSON: &str = include_str!("../templates/package.json");
pub const TSCONFIG: &str = include_str!("../templates/tsconfig.json");
pub const README: &str = include_str!("../templates/README.md");

pub fn config_files() -> Vec<GeneratedFile> {
    [
        ("playwright.config.ts", PLAYWRIGHT_CONFIG),
        ("package.json", PACKAGE_JSON),
        ("tsconfig.json", TSCONFIG),
        ("README.md", README),
    ]
    .into_iter()
    .map(|(path, content)| GeneratedFile::new(path, content))
    .collect()
}
