//! Gradle build-file reader (Groovy and Kotlin DSL), pattern based.

use java_parser::block_body;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROJECT_NAME: &str = "selenium-project";
pub const DEFAULT_SOURCE_DIR: &str = "src/main/java";
pub const DEFAULT_TEST_DIR: &str = "src/test/java";

static PROJECT_NAME: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        r#"archivesBaseName\s*=\s*['"]([^'"]+)['"]"#,
        r#"rootProject\.name\s*=\s*['"]([^'"]+)['"]"#,
        r#"project\.name\s*=\s*['"]([^'"]+)['"]"#,
    ]
    .map(|pattern| Regex::new(pattern).expect("Invalid project name regex"))
});

static SOURCE_SETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bsourceSets\s*\{").expect("Invalid sourceSets regex"));

static MAIN_SET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bmain\s*\{").expect("Invalid main set regex"));

static TEST_SET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\btest\s*\{").expect("Invalid test set regex"));

static JAVA_SET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bjava\s*\{").expect("Invalid java set regex"));

static SRC_DIR_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)\bsrcDirs?\b(.*)$").expect("Invalid srcDir regex"));

static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).expect("Invalid quoted regex"));

static BUILDSCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bbuildscript\s*\{").expect("Invalid buildscript regex"));

static DEPENDENCIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bdependencies\s*\{").expect("Invalid dependencies regex"));

static COORDINATE_DEPENDENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*(\w+)\s*\(?\s*['"]([^:'"]+):([^:'"]+):([^'"]+)['"]"#)
        .expect("Invalid coordinate dependency regex")
});

static MAP_DEPENDENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^\s*(\w+)\s*\(?\s*group\s*[:=]\s*['"]([^'"]+)['"]\s*,\s*name\s*[:=]\s*['"]([^'"]+)['"]\s*,\s*version\s*[:=]\s*['"]([^'"]+)['"]"#,
    )
    .expect("Invalid map dependency regex")
});

static PLUGINS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bplugins\s*\{").expect("Invalid plugins regex"));

static PLUGIN_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bid\s*\(?\s*['"]([^'"]+)['"]"#).expect("Invalid plugin id regex"));

static APPLY_PLUGIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"apply\s+plugin\s*:\s*['"]([^'"]+)['"]"#).expect("Invalid apply plugin regex")
});

static REPOSITORIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\brepositories\s*\{").expect("Invalid repositories regex"));

static MAVEN_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"maven\s*\{\s*url\s*(?:=\s*)?(?:uri\s*\(\s*)?['"]([^'"]+)['"]"#)
        .expect("Invalid maven url regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradleDependency {
    pub group: String,
    pub name: String,
    pub version: String,
    pub configuration: String,
}

impl GradleDependency {
    pub fn coordinate(&self) -> String {
        format!("{}:{}:{}", self.group, self.name, self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradleProject {
    pub project_name: String,
    pub source_directories: Vec<String>,
    pub test_directories: Vec<String>,
    pub dependencies: Vec<GradleDependency>,
    pub plugins: Vec<String>,
    pub repositories: Vec<String>,
}

impl Default for GradleProject {
    fn default() -> Self {
        parse_gradle("")
    }
}

impl GradleProject {
    /// Every Java source root, main roots first.
    pub fn java_roots(&self) -> impl Iterator<Item = &str> {
        self.source_directories
            .iter()
            .chain(&self.test_directories)
            .map(String::as_str)
    }

    pub fn has_dependency(&self, group: &str) -> bool {
        self.dependencies.iter().any(|d| d.group == group)
    }
}

pub fn parse_gradle(content: &str) -> GradleProject {
    let (source_directories, test_directories) = source_directories(content);
    GradleProject {
        project_name: project_name(content).unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
        source_directories,
        test_directories,
        dependencies: dependencies(content),
        plugins: plugins(content),
        repositories: repositories(content),
    }
}

/// The first explicit project name, checked line by line.
pub fn project_name(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        PROJECT_NAME
            .iter()
            .find_map(|re| re.captures(line).map(|caps| caps[1].to_string()))
    })
}

/// Body of the first block opened by `opener` that is not nested in `skip`.
fn block<'a>(content: &'a str, opener: &Regex, skip: Option<(usize, usize)>) -> Option<&'a str> {
    opener
        .find_iter(content)
        .filter(|m| skip.map_or(true, |(start, end)| m.start() < start || m.start() >= end))
        .find_map(|m| block_body(content, m.start()).ok())
}

fn source_directories(content: &str) -> (Vec<String>, Vec<String>) {
    let sets = block(content, &SOURCE_SETS, None);
    let dirs = |set: &Regex, default: &str| {
        let found: Vec<String> = sets
            .and_then(|sets| block(sets, set, None))
            .and_then(|set| block(set, &JAVA_SET, None))
            .map(|java| {
                SRC_DIR_LINE
                    .captures_iter(java)
                    .flat_map(|line| {
                        QUOTED
                            .captures_iter(line.get(1).map_or("", |m| m.as_str()))
                            .map(|q| q[1].to_string())
                            .collect::<Vec<_>>()
                    })
                    .collect()
            })
            .unwrap_or_default();
        if found.is_empty() {
            vec![default.to_string()]
        } else {
            found
        }
    };
    (dirs(&MAIN_SET, DEFAULT_SOURCE_DIR), dirs(&TEST_SET, DEFAULT_TEST_DIR))
}

fn dependencies(content: &str) -> Vec<GradleDependency> {
    let buildscript = BUILDSCRIPT.find(content).and_then(|m| {
        java_parser::block_end(content, m.start())
            .ok()
            .map(|end| (m.start(), end))
    });
    let Some(body) = block(content, &DEPENDENCIES, buildscript) else {
        return Vec::new();
    };

    let mut found: Vec<(usize, GradleDependency)> = COORDINATE_DEPENDENCY
        .captures_iter(body)
        .chain(MAP_DEPENDENCY.captures_iter(body))
        .filter_map(|caps| {
            let at = caps.get(0)?.start();
            Some((
                at,
                GradleDependency {
                    configuration: caps[1].to_string(),
                    group: caps[2].to_string(),
                    name: caps[3].to_string(),
                    version: caps[4].to_string(),
                },
            ))
        })
        .collect();
    found.sort_by_key(|(at, _)| *at);
    found.into_iter().map(|(_, dep)| dep).collect()
}

fn plugins(content: &str) -> Vec<String> {
    let mut plugins: Vec<String> = block(content, &PLUGINS, None)
        .map(|body| {
            PLUGIN_ID
                .captures_iter(body)
                .map(|caps| caps[1].to_string())
                .collect()
        })
        .unwrap_or_default();
    plugins.extend(
        APPLY_PLUGIN
            .captures_iter(content)
            .map(|caps| caps[1].to_string()),
    );
    plugins
}

fn repositories(content: &str) -> Vec<String> {
    let Some(body) = block(content, &REPOSITORIES, None) else {
        return Vec::new();
    };
    let mut repositories: Vec<String> = ["mavenCentral", "jcenter", "google"]
        .into_iter()
        .filter(|name| body.contains(&format!("{name}()")))
        .map(str::to_string)
        .collect();
    repositories.extend(
        MAVEN_URL
            .captures_iter(body)
            .map(|caps| format!("maven:{}", &caps[1])),
    );
    repositories
}
