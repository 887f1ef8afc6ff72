//! Mapping Java source paths onto the generated TypeScript tree.

/// Output path of a converted class: every Java source root (`src/main/java`,
/// `src/test/java`, or the directories a build file declares) collapses to
/// `src/`, and `.java` becomes `suffix`.
pub fn convert_file_path(java_path: &str, roots: &[String], suffix: &str) -> String {
    let path = match java_path.strip_suffix(".java") {
        Some(stem) => format!("{stem}{suffix}"),
        None => java_path.to_string(),
    };
    collapse_root(&path, roots)
}

/// Output path of a resource file: only the source root is collapsed.
pub fn convert_resource_path(path: &str, roots: &[String]) -> String {
    collapse_root(path, roots)
}

fn collapse_root(path: &str, roots: &[String]) -> String {
    let mut roots: Vec<&str> = roots
        .iter()
        .map(|root| root.trim_matches('/'))
        .filter(|root| !root.is_empty())
        .collect();
    roots.sort_by_key(|root| std::cmp::Reverse(root.len()));

    let mut best: Option<(usize, usize)> = None;
    for root in roots {
        let Some(start) = segment_position(path, root) else {
            continue;
        };
        if best.is_none_or(|(earliest, _)| start < earliest) {
            best = Some((start, root.len()));
        }
    }

    match best {
        Some((start, len)) => format!("{}src/{}", &path[..start], &path[start + len + 1..]),
        None => path.to_string(),
    }
}

/// Byte offset of `root/` in `path` when it starts at a segment boundary.
fn segment_position(path: &str, root: &str) -> Option<usize> {
    let needle = format!("{root}/");
    path.match_indices(&needle)
        .map(|(idx, _)| idx)
        .find(|&idx| idx == 0 || path.as_bytes()[idx - 1] == b'/')
}

/// Module specifier for importing `to` from `from`, both output paths.
///
/// Directories are compared segment by segment: one `../` per directory of
/// `from` below the common prefix, then down into `to`. A result not starting
/// with `.` or `/` gets a `./` prefix. The target's `.ts` extension is dropped.
pub fn relative_import_path(from: &str, to: &str) -> String {
    let mut from_parts: Vec<&str> = from.split('/').collect();
    let mut to_parts: Vec<&str> = to.split('/').collect();
    from_parts.pop();
    let to_file = to_parts.pop().unwrap_or_default();
    let to_file = to_file.strip_suffix(".ts").unwrap_or(to_file);

    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = "../".repeat(from_parts.len() - common);
    let down: Vec<&str> = to_parts[common..]
        .iter()
        .copied()
        .chain(std::iter::once(to_file))
        .collect();
    relative.push_str(&down.join("/"));

    if !relative.starts_with('.') && !relative.starts_with('/') {
        relative.insert_str(0, "./");
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_roots() -> Vec<String> {
        vec!["src/main/java".to_string(), "src/test/java".to_string()]
    }

    #[test]
    fn test_convert_file_path_collapses_roots() {
        let roots = default_roots();
        assert_eq!(
            convert_file_path("src/test/java/com/acme/LoginTest.java", &roots, ".spec.ts"),
            "src/com/acme/LoginTest.spec.ts"
        );
        assert_eq!(
            convert_file_path("src/main/java/com/acme/pages/LoginPage.java", &roots, ".ts"),
            "src/com/acme/pages/LoginPage.ts"
        );
        assert_eq!(
            convert_file_path("web/src/test/java/Smoke.java", &roots, ".ts"),
            "web/src/Smoke.ts"
        );
        assert_eq!(convert_file_path("Loose.java", &roots, ".ts"), "Loose.ts");
    }

    #[test]
    fn test_root_must_start_a_segment() {
        let roots = default_roots();
        assert_eq!(
            convert_file_path("mysrc/main/java/A.java", &roots, ".ts"),
            "mysrc/main/java/A.ts"
        );
    }

    #[test]
    fn test_custom_roots_from_build_file() {
        let roots = vec!["tests/java".to_string(), "tests".to_string()];
        assert_eq!(
            convert_file_path("tests/java/a/B.java", &roots, ".ts"),
            "src/a/B.ts"
        );
    }

    #[test]
    fn test_resource_path() {
        let roots = default_roots();
        assert_eq!(
            convert_resource_path("src/test/resources/users.json", &roots),
            "src/test/resources/users.json"
        );
        assert_eq!(
            convert_resource_path("src/test/java/data/users.json", &roots),
            "src/data/users.json"
        );
    }

    #[test]
    fn test_relative_import_paths() {
        assert_eq!(
            relative_import_path("src/tests/LoginTest.spec.ts", "src/pages/LoginPage.ts"),
            "../pages/LoginPage"
        );
        assert_eq!(
            relative_import_path("src/LoginTest.spec.ts", "src/LoginPage.ts"),
            "./LoginPage"
        );
        assert_eq!(
            relative_import_path("src/LoginTest.spec.ts", "src/pages/LoginPage.ts"),
            "./pages/LoginPage"
        );
        assert_eq!(
            relative_import_path("src/a/b/c/T.spec.ts", "src/a/U.ts"),
            "../../U"
        );
    }
}
