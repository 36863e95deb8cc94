use crate::config::{ProjectDescriptor, TestTypeDescriptor};
use crate::discovery::TestFileEntry;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

use super::task::TestTask;

/// Flatten the (project x type) matrix into a dispatch queue.
///
/// Types are sorted by ascending priority and iterated outermost, so every
/// task of a cheaper type precedes every task of a more expensive one.
/// Pairs without test files produce no task.
pub fn build_queue(
    projects: &[(ProjectDescriptor, Vec<TestFileEntry>)],
    test_types: &[TestTypeDescriptor],
) -> VecDeque<TestTask> {
    let mut types: Vec<&TestTypeDescriptor> = test_types.iter().collect();
    types.sort_by_key(|t| t.priority);

    let mut queue = VecDeque::new();
    let mut seen = HashSet::new();

    for test_type in types {
        for (project, files) in projects {
            let files: Vec<TestFileEntry> = files
                .iter()
                .filter(|f| f.test_type == test_type.key)
                .cloned()
                .collect();
            if files.is_empty() {
                continue;
            }
            if !seen.insert((project.key.as_str(), test_type.key.as_str())) {
                continue;
            }

            debug!(
                "Queued {}:{} with {} files",
                project.key,
                test_type.key,
                files.len()
            );
            queue.push_back(TestTask {
                project: project.clone(),
                test_type: test_type.key.clone(),
                priority: test_type.priority,
                files,
                parallel: test_type.parallel,
                timeout: test_type.timeout(),
            });
        }
    }

    queue
}
