//! # Selenium project analysis
//!
//! Turns a set of project files (path plus text) into a [`ProjectStructure`]:
//! one record per Java class with its roles and in-project dependencies, the
//! build and resource files, and the package layout.
//!
//! ## Core Philosophy
//! - Two passes: pass 1 classifies each class from its own text, pass 2
//!   builds new records with roles inherited along `extends` chains
//! - Input order never matters: files are keyed and visited by path
//! - Dependencies only ever name classes of the same project

use bitflags::bitflags;
use java_parser::{extract, package_name, ExtractedFile};
use log::{debug, info, warn};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

pub mod classify;
pub mod dependencies;
pub mod gradle;
pub mod reader;

pub use gradle::{parse_gradle, GradleDependency, GradleProject};
pub use reader::{collect_project_files, read_sources, ReadError, SourceReadReport};

bitflags! {
    /// Roles a class can play. Any combination is allowed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassRoles: u8 {
        const TEST = 1;
        const PAGE_OBJECT = 1 << 1;
        const UTILITY = 1 << 2;
        /// Target of another class's `extends`.
        const BASE = 1 << 3;
    }
}

impl ClassRoles {
    /// Roles that pass from a parent class to its subclasses.
    pub const INHERITED: ClassRoles = ClassRoles::TEST.union(ClassRoles::PAGE_OBJECT);

    pub fn names(self) -> Vec<&'static str> {
        self.iter_names()
            .map(|(name, _)| match name {
                "TEST" => "test",
                "PAGE_OBJECT" => "pageObject",
                "UTILITY" => "utility",
                _ => "base",
            })
            .collect()
    }
}

fn serialize_roles<S: Serializer>(roles: &ClassRoles, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(roles.names())
}

/// A project file kept as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

/// One analyzed `.java` file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaClassRecord {
    pub class_name: String,
    pub package_name: String,
    pub file_path: String,
    pub import_list: Vec<String>,
    #[serde(serialize_with = "serialize_roles")]
    pub roles: ClassRoles,
    /// Simple name of the `extends` target, if any.
    pub parent_class: Option<String>,
    pub dependency_list: Vec<String>,
    #[serde(skip)]
    extracted: ExtractedFile,
}

impl JavaClassRecord {
    /// `package.Class`, or just `Class` for the default package.
    pub fn fqn(&self) -> String {
        qualify(&self.package_name, &self.class_name)
    }

    pub fn raw_content(&self) -> &str {
        self.extracted.source()
    }

    /// Fragments extracted during analysis, reused by converters.
    pub fn extracted(&self) -> &ExtractedFile {
        &self.extracted
    }

    pub fn is_test_class(&self) -> bool {
        self.roles.contains(ClassRoles::TEST)
    }

    pub fn is_page_object_class(&self) -> bool {
        self.roles.contains(ClassRoles::PAGE_OBJECT)
    }

    pub fn is_utility_class(&self) -> bool {
        self.roles.contains(ClassRoles::UTILITY)
    }

    pub fn is_base_class(&self) -> bool {
        self.roles.contains(ClassRoles::BASE)
    }
}

fn qualify(package: &str, class: &str) -> String {
    if package.is_empty() {
        class.to_string()
    } else {
        format!("{package}.{class}")
    }
}

/// Everything known about one project after analysis. Read-only.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStructure {
    /// Ordered by file path.
    pub classes: Vec<JavaClassRecord>,
    pub build_files: Vec<SourceFile>,
    pub resource_files: Vec<SourceFile>,
    pub package_structure: BTreeMap<String, Vec<String>>,
    pub dependency_graph: BTreeMap<String, Vec<String>>,
    /// Parsed from the project's main Gradle build file, if there is one.
    pub gradle: Option<GradleProject>,
}

impl ProjectStructure {
    pub fn test_classes(&self) -> impl Iterator<Item = &JavaClassRecord> {
        self.classes.iter().filter(|c| c.is_test_class())
    }

    pub fn page_objects(&self) -> impl Iterator<Item = &JavaClassRecord> {
        self.classes.iter().filter(|c| c.is_page_object_class())
    }

    pub fn utilities(&self) -> impl Iterator<Item = &JavaClassRecord> {
        self.classes.iter().filter(|c| c.is_utility_class())
    }

    pub fn base_classes(&self) -> impl Iterator<Item = &JavaClassRecord> {
        self.classes.iter().filter(|c| c.is_base_class())
    }

    pub fn class_by_fqn(&self, fqn: &str) -> Option<&JavaClassRecord> {
        self.classes.iter().find(|c| c.fqn() == fqn)
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            total_classes: self.classes.len(),
            test_classes: fqns(self.test_classes()),
            page_objects: fqns(self.page_objects()),
            utilities: fqns(self.utilities()),
            base_classes: fqns(self.base_classes()),
            build_files: self.build_files.iter().map(|f| f.path.clone()).collect(),
            resource_files: self.resource_files.iter().map(|f| f.path.clone()).collect(),
            package_structure: self.package_structure.clone(),
            dependency_graph: self.dependency_graph.clone(),
            gradle: self.gradle.clone(),
        }
    }
}

fn fqns<'a>(classes: impl Iterator<Item = &'a JavaClassRecord>) -> Vec<String> {
    classes.map(JavaClassRecord::fqn).collect()
}

/// Content-free view of a [`ProjectStructure`] for reports.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub total_classes: usize,
    pub test_classes: Vec<String>,
    pub page_objects: Vec<String>,
    pub utilities: Vec<String>,
    pub base_classes: Vec<String>,
    pub build_files: Vec<String>,
    pub resource_files: Vec<String>,
    pub package_structure: BTreeMap<String, Vec<String>>,
    pub dependency_graph: BTreeMap<String, Vec<String>>,
    pub gradle: Option<GradleProject>,
}

pub fn is_build_file(path: &str) -> bool {
    path.ends_with(".gradle") || path.ends_with(".gradle.kts")
}

/// Non-source collaterals copied along with a conversion.
pub fn is_resource_path(path: &str) -> bool {
    let resource = path.contains("/resources/")
        || path.starts_with("resources/")
        || [".properties", ".xml", ".json", ".yml", ".yaml", ".txt"]
            .iter()
            .any(|ext| path.ends_with(ext));
    resource && !path.ends_with(".java") && !is_build_file(path)
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.strip_suffix(".java").unwrap_or(name)
}

/// Pass-1 record before propagation.
struct Scanned {
    record: JavaClassRecord,
    fqn: String,
}

/// Analyzes one project's files.
pub struct ProjectAnalyzer {
    files: BTreeMap<String, String>,
}

impl ProjectAnalyzer {
    /// Paths are normalized to `/` separators; a later duplicate path wins.
    pub fn new<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let files = files
            .into_iter()
            .map(|(path, content)| (path.into().replace('\\', "/"), content.into()))
            .collect();
        Self { files }
    }

    pub fn analyze(&self) -> ProjectStructure {
        let scanned = self.scan_classes();
        let records = propagate_roles(scanned);

        let refs: Vec<dependencies::ClassRef<'_>> = records
            .iter()
            .map(|(fqn, record)| dependencies::ClassRef {
                fqn,
                simple_name: &record.class_name,
                imports: &record.import_list,
                content: record.raw_content(),
            })
            .collect();
        let dependency_graph = dependencies::map_dependencies(&refs);
        drop(refs);

        let classes: Vec<JavaClassRecord> = records
            .into_iter()
            .map(|(fqn, mut record)| {
                record.dependency_list = dependency_graph.get(&fqn).cloned().unwrap_or_default();
                record
            })
            .collect();

        let mut package_structure: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for class in &classes {
            package_structure
                .entry(class.package_name.clone())
                .or_default()
                .push(class.class_name.clone());
        }

        let build_files = self.files_where(is_build_file);
        let resource_files = self.files_where(is_resource_path);
        let gradle = main_gradle_project(&build_files);

        info!(
            "Analyzed {} classes, {} build files, {} resource files",
            classes.len(),
            build_files.len(),
            resource_files.len()
        );

        ProjectStructure {
            classes,
            build_files,
            resource_files,
            package_structure,
            dependency_graph,
            gradle,
        }
    }

    fn files_where(&self, keep: fn(&str) -> bool) -> Vec<SourceFile> {
        self.files
            .iter()
            .filter(|(path, _)| keep(path))
            .map(|(path, content)| SourceFile {
                path: path.clone(),
                content: content.clone(),
            })
            .collect()
    }

    /// Pass 1: extract and classify every Java file on its own.
    fn scan_classes(&self) -> Vec<Scanned> {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut scanned = Vec::new();

        for (path, content) in self.files.iter().filter(|(p, _)| p.ends_with(".java")) {
            let extracted = extract(content);
            let package = package_name(content).unwrap_or_default();
            let class_name = extracted
                .class_name()
                .map(str::to_string)
                .unwrap_or_else(|| file_stem(path).to_string());
            let fqn = qualify(&package, &class_name);

            if !seen.insert(fqn.clone()) {
                warn!("Duplicate class {fqn} in {path}, keeping the first definition");
                continue;
            }

            let roles = classify::classify(content, &class_name, path);
            debug!("{fqn}: {:?}", roles.names());

            let parent_class = extracted
                .parent_class()
                .map(|p| p.rsplit('.').next().unwrap_or(p).to_string());

            scanned.push(Scanned {
                record: JavaClassRecord {
                    class_name,
                    package_name: package,
                    file_path: path.clone(),
                    import_list: extracted.import_paths(),
                    roles,
                    parent_class,
                    dependency_list: Vec::new(),
                    extracted,
                },
                fqn,
            });
        }
        scanned
    }
}

/// Pass 2: new records whose roles include everything inherited along the
/// `extends` chain, plus `BASE` on every extended class. Pass-1 roles are
/// only read.
fn propagate_roles(scanned: Vec<Scanned>) -> Vec<(String, JavaClassRecord)> {
    let mut by_name: BTreeMap<&str, usize> = BTreeMap::new();
    for (idx, s) in scanned.iter().enumerate() {
        by_name.entry(s.record.class_name.as_str()).or_insert(idx);
    }

    let parent_of = |idx: usize| -> Option<usize> {
        scanned[idx]
            .record
            .parent_class
            .as_deref()
            .and_then(|p| by_name.get(p).copied())
    };

    let extended: BTreeSet<usize> = (0..scanned.len()).filter_map(parent_of).collect();

    let roles: Vec<ClassRoles> = (0..scanned.len())
        .map(|idx| {
            let mut roles = scanned[idx].record.roles;
            let mut visited = BTreeSet::from([idx]);
            let mut current = parent_of(idx);
            while let Some(parent) = current {
                if !visited.insert(parent) {
                    warn!("Inheritance cycle through {}", scanned[parent].fqn);
                    break;
                }
                roles |= scanned[parent].record.roles & ClassRoles::INHERITED;
                current = parent_of(parent);
            }
            if extended.contains(&idx) {
                roles |= ClassRoles::BASE;
            }
            roles
        })
        .collect();

    scanned
        .into_iter()
        .zip(roles)
        .map(|(s, roles)| {
            let mut record = s.record;
            record.roles = roles;
            (s.fqn, record)
        })
        .collect()
}

/// `build.gradle(.kts)` closest to the root wins; a `settings.gradle(.kts)`
/// supplies the project name when the build file has none.
fn main_gradle_project(build_files: &[SourceFile]) -> Option<GradleProject> {
    let depth = |f: &&SourceFile| f.path.matches('/').count();
    let build = build_files
        .iter()
        .filter(|f| {
            let name = file_stem(&f.path);
            name == "build.gradle" || name == "build.gradle.kts"
        })
        .min_by_key(depth)?;

    let mut project = parse_gradle(&build.content);
    if gradle::project_name(&build.content).is_none() {
        let settings_name = build_files
            .iter()
            .filter(|f| file_stem(&f.path).starts_with("settings.gradle"))
            .min_by_key(depth)
            .and_then(|f| gradle::project_name(&f.content));
        if let Some(name) = settings_name {
            project.project_name = name;
        }
    }
    Some(project)
}

/// Analyze in one call.
pub fn analyze_project<I, P, C>(files: I) -> ProjectStructure
where
    I: IntoIterator<Item = (P, C)>,
    P: Into<String>,
    C: Into<String>,
{
    ProjectAnalyzer::new(files).analyze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn project(files: &[(&str, &str)]) -> ProjectStructure {
        analyze_project(files.iter().map(|(p, c)| (p.to_string(), c.to_string())))
    }

    #[test]
    fn test_role_propagation_through_chain() {
        let files = [
            ("src/main/java/p/BasePage.java", "package p;\npublic abstract class BasePage {\n}\n"),
            ("src/main/java/p/Section.java", "package p;\npublic class Section extends BasePage {\n}\n"),
            ("src/main/java/p/Widget.java", "package p;\npublic class Widget extends Section {\n}\n"),
        ];
        let structure = project(&files);

        let widget = structure.class_by_fqn("p.Widget").unwrap();
        assert!(widget.is_page_object_class());
        assert!(!widget.is_base_class());
        assert!(structure.class_by_fqn("p.Section").unwrap().is_base_class());
        assert_eq!(
            structure.base_classes().map(|c| c.fqn()).collect::<Vec<_>>(),
            vec!["p.BasePage", "p.Section"]
        );
    }

    #[test]
    fn test_order_independent() {
        let a = ("x/ATest.java", "package x;\npublic class ATest extends Base {\n}\n");
        let b = ("x/Base.java", "package x;\npublic class Base {\n @Test public void t() {}\n}\n");
        let forward = project(&[a, b]);
        let backward = project(&[b, a]);
        assert_eq!(
            serde_json::to_value(&forward).unwrap(),
            serde_json::to_value(&backward).unwrap()
        );
    }

    #[test]
    fn test_inheritance_cycle_terminates() {
        let files = [
            ("A.java", "public class A extends B {\n}\n"),
            ("B.java", "public class B extends A {\n}\n"),
        ];
        let structure = project(&files);
        assert_eq!(structure.classes.len(), 2);
        assert!(structure.classes.iter().all(|c| c.is_base_class()));
    }

    #[test]
    fn test_default_package_and_file_stem_fallback() {
        let structure = project(&[("helpers/Misc.java", "class misc {}")]);
        let class = &structure.classes[0];
        assert_eq!(class.class_name, "Misc");
        assert_eq!(class.fqn(), "Misc");
        assert_eq!(structure.package_structure[""], vec!["Misc"]);
    }

    #[test]
    fn test_collaterals_and_gradle() {
        let files = [
            ("settings.gradle", "rootProject.name = 'storefront'"),
            ("build.gradle", "repositories { mavenCentral() }"),
            ("src/test/resources/users.csv", "a,b"),
            ("config/env.properties", "url=x"),
            ("README.md", "# hi"),
        ];
        let structure = project(&files);
        assert_eq!(structure.build_files.len(), 2);
        assert_eq!(
            structure
                .resource_files
                .iter()
                .map(|f| f.path.as_str())
                .collect::<Vec<_>>(),
            vec!["config/env.properties", "src/test/resources/users.csv"]
        );
        let gradle = structure.gradle.unwrap();
        assert_eq!(gradle.project_name, "storefront");
        assert_eq!(gradle.repositories, vec!["mavenCentral"]);
    }

    #[test]
    fn test_duplicate_fqn_keeps_first_path() {
        let files = [
            ("a/Dup.java", "package d;\npublic class Dup {\n}\n"),
            ("b/Dup.java", "package d;\npublic class Dup {\n}\n"),
        ];
        let structure = project(&files);
        assert_eq!(structure.classes.len(), 1);
        assert_eq!(structure.classes[0].file_path, "a/Dup.java");
    }

    #[test]
    fn test_record_serializes_roles_as_names() {
        let structure = project(&[(
            "LoginPageTest.java",
            "public class LoginPageTest {\n  WebElement e = driver.findElement(By.id(\"x\"));\n}\n",
        )]);
        let json = serde_json::to_value(&structure.classes[0]).unwrap();
        assert_eq!(json["roles"], serde_json::json!(["test", "pageObject"]));
        assert_eq!(json["className"], "LoginPageTest");
        assert!(json.get("extracted").is_none());
    }
}
