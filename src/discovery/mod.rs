pub mod files;
pub mod git;

pub use files::{find_test_files, TestFileEntry};
pub use git::{changed_files, detect, GitInfo};

use crate::config::ProjectDescriptor;
use std::path::{Component, Path, PathBuf};

/// Tool and build output directories: never searched for tests, never watched
pub const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "coverage",
    "test-results",
    "playwright-report",
    "__pycache__",
    ".pytest_cache",
];

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Keep a project's test files only if one of `changed` lies inside the
/// project directory. Project granularity: a touched project runs everything.
pub fn filter_by_changes(
    test_files: Vec<TestFileEntry>,
    project: &ProjectDescriptor,
    changed: &[PathBuf],
) -> Vec<TestFileEntry> {
    let project_dir = normalize(&project.working_dir);
    let touched = changed
        .iter()
        .any(|path| normalize(path).starts_with(&project_dir));

    if touched {
        test_files
    } else {
        tracing::debug!("Project {} untouched by changes, skipping", project.key);
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Registry;
    use std::time::Duration;

    fn entry(rel: &str) -> TestFileEntry {
        TestFileEntry {
            path: PathBuf::from("/repo/server").join(rel),
            relative: PathBuf::from(rel),
            test_type: "unit".to_string(),
            timeout: Duration::from_secs(30),
            parallel: true,
        }
    }

    fn backend() -> ProjectDescriptor {
        Registry::builtin().projects[0].clone()
    }

    #[test]
    fn test_touched_project_keeps_all_files() {
        let files = vec![entry("tests/unit/test_a.py"), entry("tests/unit/test_b.py")];
        let changed = vec![PathBuf::from("server/app/models.py")];
        let kept = filter_by_changes(files.clone(), &backend(), &changed);
        assert_eq!(kept, files);
    }

    #[test]
    fn test_untouched_project_dropped() {
        let files = vec![entry("tests/unit/test_a.py")];
        let changed = vec![PathBuf::from("apps/admin/src/App.tsx")];
        assert!(filter_by_changes(files, &backend(), &changed).is_empty());
    }

    #[test]
    fn test_prefix_is_component_wise() {
        let files = vec![entry("tests/unit/test_a.py")];
        let changed = vec![PathBuf::from("server-legacy/main.py")];
        assert!(filter_by_changes(files, &backend(), &changed).is_empty());
    }

    #[test]
    fn test_empty_change_set_selects_nothing() {
        let files = vec![entry("tests/unit/test_a.py")];
        assert!(filter_by_changes(files, &backend(), &[]).is_empty());
    }

    #[test]
    fn test_dot_prefixed_paths_normalized() {
        let mut project = backend();
        project.working_dir = PathBuf::from("./server");
        let files = vec![entry("tests/unit/test_a.py")];
        let changed = vec![PathBuf::from("server/app.py")];
        assert_eq!(filter_by_changes(files, &project, &changed).len(), 1);
    }
}
