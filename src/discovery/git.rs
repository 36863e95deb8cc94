use crate::error::GitError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    pub branch: String,
    pub commit: String,
    pub author: String,
}

fn git(dir: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = Command::new("git").current_dir(dir).args(args).output()?;

    if !output.status.success() {
        return Err(GitError::Command {
            args: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Current branch, short commit and last author. `None` outside a repository
/// or when git is unavailable.
pub fn detect(dir: &Path) -> Option<GitInfo> {
    let info = (|| -> Result<GitInfo, GitError> {
        Ok(GitInfo {
            branch: git(dir, &["rev-parse", "--abbrev-ref", "HEAD"])?,
            commit: git(dir, &["rev-parse", "--short", "HEAD"])?,
            author: git(dir, &["log", "-1", "--pretty=format:%an"])?,
        })
    })();

    match info {
        Ok(info) => {
            debug!("Git context: {} @ {} by {}", info.branch, info.commit, info.author);
            Some(info)
        }
        Err(e) => {
            warn!("Git information unavailable: {}", e);
            None
        }
    }
}

/// Paths (relative to the repository root) that differ between the working tree and `base`
pub fn changed_files(dir: &Path, base: &str) -> Result<Vec<PathBuf>, GitError> {
    let stdout = git(dir, &["diff", "--name-only", base])?;
    Ok(stdout
        .lines()
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_detect_outside_repo_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(detect(dir.path()).is_none());
    }

    #[test]
    fn test_changed_files_outside_repo_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(changed_files(dir.path(), "main").is_err());
    }

    #[test]
    fn test_detect_and_diff_in_repo() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let run = |args: &[&str]| {
            let status = Command::new("git")
                .current_dir(root)
                .args(["-c", "user.name=Tester", "-c", "user.email=t@example.com"])
                .args(args)
                .output()
                .unwrap()
                .status;
            assert!(status.success(), "git {:?} failed", args);
        };

        run(&["init", "-q"]);
        run(&["symbolic-ref", "HEAD", "refs/heads/main"]);
        std::fs::create_dir_all(root.join("server")).unwrap();
        std::fs::write(root.join("server/app.py"), "x = 1\n").unwrap();
        run(&["add", "."]);
        run(&["commit", "-q", "-m", "init"]);

        let info = detect(root).unwrap();
        assert_eq!(info.branch, "main");
        assert_eq!(info.author, "Tester");
        assert!(!info.commit.is_empty());

        assert!(changed_files(root, "main").unwrap().is_empty());

        std::fs::write(root.join("server/app.py"), "x = 2\n").unwrap();
        let changed = changed_files(root, "main").unwrap();
        assert_eq!(changed, vec![PathBuf::from("server/app.py")]);
    }
}
