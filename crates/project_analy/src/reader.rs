//! Filesystem side of the analyzer: finding project files and reading them
//! concurrently.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use walkdir::{DirEntry, WalkDir};

/// Directories never descended into when collecting project files.
const SKIPPED_DIRS: &[&str] = &[".git", ".gradle", ".idea", "build", "target", "out", "node_modules"];

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", path.display())]
    NotUtf8 { path: PathBuf },

    #[error("Read task for {} did not complete: {reason}", path.display())]
    Aborted { path: PathBuf, reason: String },
}

impl ReadError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::NotUtf8 { path } | Self::Aborted { path, .. } => path,
        }
    }
}

/// Contents keyed by project-relative path (always `/`-separated), plus one
/// error per file that could not be read.
#[derive(Debug, Default)]
pub struct SourceReadReport {
    pub files: BTreeMap<String, String>,
    pub failures: Vec<ReadError>,
}

/// Whether the analyzer has any use for a file at this relative path.
pub fn is_project_file(path: &str) -> bool {
    path.ends_with(".java")
        || path.ends_with(".gradle")
        || path.ends_with(".gradle.kts")
        || crate::is_resource_path(path)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// Project-relative path with `/` separators.
pub fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Every Java, Gradle and resource file under `root`, sorted.
pub fn collect_project_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
    {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if entry.file_type().is_file() && is_project_file(&relative_key(root, entry.path())) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    debug!("Collected {} project files under {}", files.len(), root.display());
    Ok(files)
}

type ReadTasks = JoinSet<(PathBuf, Result<String, ReadError>)>;

/// Read `paths` with at most `concurrency` reads in flight. A failed read is
/// reported for its own path and does not affect the others.
pub async fn read_sources(root: &Path, paths: Vec<PathBuf>, concurrency: usize) -> SourceReadReport {
    let sem = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut pending = HashMap::new();

    for path in paths {
        let sem = sem.clone();
        let task_path = path.clone();
        let handle = tasks.spawn(async move {
            let outcome = match sem.acquire_owned().await {
                Ok(_permit) => read_one(&task_path).await,
                Err(e) => Err(ReadError::Aborted {
                    path: task_path.clone(),
                    reason: e.to_string(),
                }),
            };
            (task_path, outcome)
        });
        pending.insert(handle.id(), path);
    }

    collect_reads(root, tasks, pending).await
}

/// Drain `tasks`. A task that panicked or was cancelled is reported under
/// the path it was spawned for.
async fn collect_reads(
    root: &Path,
    mut tasks: ReadTasks,
    mut pending: HashMap<Id, PathBuf>,
) -> SourceReadReport {
    let mut report = SourceReadReport::default();
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, (path, outcome))) => {
                pending.remove(&id);
                match outcome {
                    Ok(content) => {
                        report.files.insert(relative_key(root, &path), content);
                    }
                    Err(err) => {
                        warn!("{err}");
                        report.failures.push(err);
                    }
                }
            }
            Err(join_err) => {
                let path = pending.remove(&join_err.id()).unwrap_or_default();
                warn!("Read task for {} failed: {join_err}", path.display());
                report.failures.push(ReadError::Aborted {
                    path,
                    reason: join_err.to_string(),
                });
            }
        }
    }
    report
        .failures
        .sort_by(|a, b| a.path().cmp(b.path()));
    report
}

async fn read_one(path: &Path) -> Result<String, ReadError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| ReadError::NotUtf8 {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(p: &Path, s: &str) {
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, s).unwrap();
    }

    #[test]
    fn test_collect_project_files_filters_and_skips() {
        let td = TempDir::new().unwrap();
        let root = td.path();
        write(&root.join("build.gradle"), "");
        write(&root.join("src/test/java/a/LoginTest.java"), "class LoginTest {}");
        write(&root.join("src/test/resources/users.csv"), "a,b");
        write(&root.join("src/main/java/a/Notes.md"), "# notes");
        write(&root.join("build/classes/Old.java"), "class Old {}");
        write(&root.join("config.yml"), "env: qa");

        let keys: Vec<String> = collect_project_files(root)
            .unwrap()
            .iter()
            .map(|p| relative_key(root, p))
            .collect();
        assert_eq!(
            keys,
            vec![
                "build.gradle",
                "config.yml",
                "src/test/java/a/LoginTest.java",
                "src/test/resources/users.csv",
            ]
        );
    }

    #[test]
    fn test_collect_rejects_missing_root() {
        let td = TempDir::new().unwrap();
        assert!(collect_project_files(&td.path().join("nope")).is_err());
    }

    #[tokio::test]
    async fn test_read_sources_reports_each_failure() {
        let td = TempDir::new().unwrap();
        let root = td.path();
        let good = root.join("A.java");
        let binary = root.join("B.java");
        let missing = root.join("C.java");
        write(&good, "public class A {}");
        fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();

        let report = read_sources(root, vec![good, binary, missing.clone()], 2).await;

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files["A.java"], "public class A {}");
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(report.failures[0], ReadError::NotUtf8 { .. }));
        assert!(matches!(report.failures[1], ReadError::Io { .. }));
        assert_eq!(report.failures[1].path(), missing.as_path());
    }

    async fn crashing_read() -> (PathBuf, Result<String, ReadError>) {
        panic!("reader crashed")
    }

    #[tokio::test]
    async fn test_failed_task_keeps_its_path() {
        let root = Path::new("/project");
        let mut tasks: ReadTasks = JoinSet::new();
        let mut pending = HashMap::new();

        let stuck = root.join("src/Stuck.java");
        let handle = tasks.spawn(std::future::pending());
        handle.abort();
        pending.insert(handle.id(), stuck.clone());

        let broken = root.join("src/Broken.java");
        let handle = tasks.spawn(crashing_read());
        pending.insert(handle.id(), broken.clone());

        let done = root.join("src/Done.java");
        let done_path = done.clone();
        let handle = tasks.spawn(async move { (done_path, Ok("class Done {}".to_string())) });
        pending.insert(handle.id(), done);

        let report = collect_reads(root, tasks, pending).await;

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files["src/Done.java"], "class Done {}");
        let paths: Vec<&Path> = report.failures.iter().map(ReadError::path).collect();
        assert_eq!(paths, vec![broken.as_path(), stuck.as_path()]);
        assert!(report
            .failures
            .iter()
            .all(|f| matches!(f, ReadError::Aborted { .. })));
    }
}
