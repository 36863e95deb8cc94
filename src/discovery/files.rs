use crate::config::{ProjectDescriptor, TestTypeDescriptor};
use crate::error::DiscoveryError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use super::SKIP_DIRS;

/// Directories never searched for tests

/// One discovered test file and the test type it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFileEntry {
    /// Absolute path
    pub path: PathBuf,
    /// Path relative to the project directory, as handed to the test command
    pub relative: PathBuf,
    pub test_type: String,
    pub timeout: Duration,
    pub parallel: bool,
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, DiscoveryError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| DiscoveryError::GlobPattern {
            pattern: pattern.clone(),
            source: e,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| DiscoveryError::GlobPattern {
        pattern: patterns.join(","),
        source: e,
    })
}

/// Walk the project directory and collect the files matching each test type.
///
/// A (project, type) pair without matches is logged and skipped; a project
/// whose directory does not exist yields nothing.
pub fn find_test_files(
    root: &Path,
    project: &ProjectDescriptor,
    test_types: &[TestTypeDescriptor],
) -> Result<Vec<TestFileEntry>, DiscoveryError> {
    let project_dir = root.join(&project.working_dir);
    if !project_dir.is_dir() {
        warn!(
            "Project {} directory {:?} does not exist, skipping",
            project.key, project_dir
        );
        return Ok(Vec::new());
    }

    let matchers = test_types
        .iter()
        .map(|t| build_globset(&t.patterns).map(|set| (t, set)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut candidates = Vec::new();
    let walker = WalkBuilder::new(&project_dir)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| !SKIP_DIRS.contains(&name))
                .unwrap_or(true)
        })
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable path under {:?}: {}", project_dir, e);
                continue;
            }
        };
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            candidates.push(entry.into_path());
        }
    }
    candidates.sort();

    let mut files = Vec::new();
    for (test_type, set) in &matchers {
        let before = files.len();
        for path in &candidates {
            let relative = path.strip_prefix(&project_dir).unwrap_or(path);
            if set.is_match(relative) {
                files.push(TestFileEntry {
                    path: path.clone(),
                    relative: relative.to_path_buf(),
                    test_type: test_type.key.clone(),
                    timeout: test_type.timeout(),
                    parallel: test_type.parallel,
                });
            }
        }

        let found = files.len() - before;
        if found == 0 {
            warn!("No {} tests found for project {}", test_type.key, project.key);
        } else {
            debug!(
                "Project {} has {} {} test files",
                project.key, found, test_type.key
            );
        }
    }

    Ok(files)
}
