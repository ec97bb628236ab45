//! Git adapter for the migration-guard VCS provider.
//!
//! This crate is intentionally thin: it shells out to `git` and hands raw
//! output back to the kernel. Classification and validation policy live in
//! `migration-guard-kernel`.

use migration_guard_kernel::{DiffQuery, VcsError, VcsProvider};
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DEFAULT_REMOTE: &str = "origin";

/// Errors from interacting with a git repository.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("git executable is not available in PATH")]
    NotInstalled,

    #[error("git command failed: git {args} ({message})")]
    CommandFailed { args: String, message: String },

    #[error("unable to parse git output: {0}")]
    Parse(String),
}

impl GitError {
    fn into_vcs(self, operation: &str) -> VcsError {
        VcsError::new(operation, self.to_string())
    }
}

/// Thin client around the `git` CLI.
#[derive(Debug, Clone)]
pub struct GitClient {
    repo_root: PathBuf,
    remote: String,
}

impl GitClient {
    /// Returns true if `git` is available in PATH.
    pub fn is_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Discover a git worktree from `path` by resolving its top level.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let stdout = run_git(path.as_ref(), &["rev-parse", "--show-toplevel"])?;
        let root = first_nonempty_line(&stdout)
            .ok_or_else(|| GitError::Parse("git rev-parse returned empty output".to_string()))?;
        Ok(Self {
            repo_root: PathBuf::from(root),
            remote: DEFAULT_REMOTE.to_string(),
        })
    }

    /// Fetch from `remote` instead of `origin`.
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Name of the checked-out branch, `HEAD` when detached.
    pub fn branch(&self) -> Result<String, GitError> {
        let stdout = run_git(&self.repo_root, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        first_nonempty_line(&stdout)
            .map(ToOwned::to_owned)
            .ok_or_else(|| GitError::Parse("failed to parse current branch".to_string()))
    }

    fn run(&self, args: &[String]) -> Result<String, GitError> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_git(&self.repo_root, &args)
    }
}

impl VcsProvider for GitClient {
    fn fetch(&self, reference: &str) -> Result<(), VcsError> {
        let args = fetch_args(&self.remote, reference);
        self.run(&args).map(drop).map_err(|e| e.into_vcs("fetch"))
    }

    fn checkout(&self, reference: &str) -> Result<(), VcsError> {
        let args = vec!["checkout".to_string(), reference.to_string()];
        self.run(&args).map(drop).map_err(|e| e.into_vcs("checkout"))
    }

    fn diff(&self, query: &DiffQuery) -> Result<String, VcsError> {
        self.run(&diff_args(query)).map_err(|e| e.into_vcs("diff"))
    }

    fn list_tree(&self, reference: &str, path_scope: &str) -> Result<String, VcsError> {
        self.run(&list_tree_args(reference, path_scope))
            .map_err(|e| e.into_vcs("ls-tree"))
    }

    fn current_branch(&self) -> Result<String, VcsError> {
        self.branch().map_err(|e| e.into_vcs("current-branch"))
    }
}

fn fetch_args(remote: &str, reference: &str) -> Vec<String> {
    vec![
        "fetch".to_string(),
        "--no-tags".to_string(),
        remote.to_string(),
        reference.to_string(),
    ]
}

/// Arguments for `git diff` between head and feature, restricted to one path.
pub fn diff_args(query: &DiffQuery) -> Vec<String> {
    let listing = if query.name_only {
        "--name-only"
    } else {
        "--name-status"
    };
    vec![
        "-c".to_string(),
        "core.quotepath=off".to_string(),
        "diff".to_string(),
        listing.to_string(),
        format!("--diff-filter={}", query.filter.as_git_arg()),
        format!("--find-renames={}", query.find_renames_pct),
        query.head.clone(),
        query.feature.clone(),
        "--".to_string(),
        query.path_scope.clone(),
    ]
}

/// Arguments for a recursive name-only tree listing of `path_scope` at `reference`.
pub fn list_tree_args(reference: &str, path_scope: &str) -> Vec<String> {
    vec![
        "-c".to_string(),
        "core.quotepath=off".to_string(),
        "ls-tree".to_string(),
        "-r".to_string(),
        "--name-only".to_string(),
        reference.to_string(),
        "--".to_string(),
        path_scope.to_string(),
    ]
}

fn run_git(cwd: &Path, args: &[&str]) -> Result<String, GitError> {
    tracing::debug!(args = %args.join(" "), "running git");
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                GitError::NotInstalled
            } else {
                GitError::CommandFailed {
                    args: args.join(" "),
                    message: err.to_string(),
                }
            }
        })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("exit status {}", output.status.code().unwrap_or(1))
        } else {
            stderr
        };
        Err(GitError::CommandFailed {
            args: args.join(" "),
            message,
        })
    }
}

fn first_nonempty_line(input: &str) -> Option<&str> {
    input.lines().map(str::trim).find(|line| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration_guard_kernel::{ChangeType, DiffFilter, Similarity};

    fn query(name_only: bool) -> DiffQuery {
        DiffQuery {
            name_only,
            filter: "RAM".parse().unwrap(),
            find_renames_pct: "75".parse::<Similarity>().unwrap(),
            head: "main".to_string(),
            feature: "dev".to_string(),
            path_scope: "db/migration".to_string(),
        }
    }

    #[test]
    fn first_nonempty_line_finds_trimmed_line() {
        let s = "\n\n  /repo/root  \n";
        assert_eq!(first_nonempty_line(s), Some("/repo/root"));
    }

    #[test]
    fn first_nonempty_line_none_for_blank_input() {
        assert_eq!(first_nonempty_line(" \n\t\n"), None);
    }

    #[test]
    fn diff_args_scope_both_refs_to_the_path() {
        assert_eq!(
            diff_args(&query(false)).join(" "),
            "-c core.quotepath=off diff --name-status --diff-filter=AMR --find-renames=75% main dev -- db/migration"
        );
    }

    #[test]
    fn diff_args_name_only_and_rename_filter() {
        let mut q = query(true);
        q.filter = DiffFilter::only(ChangeType::Renamed);
        let args = diff_args(&q);
        assert!(args.contains(&"--name-only".to_string()));
        assert!(args.contains(&"--diff-filter=R".to_string()));
    }

    #[test]
    fn list_tree_args_are_recursive_and_name_only() {
        assert_eq!(
            list_tree_args("main", ".").join(" "),
            "-c core.quotepath=off ls-tree -r --name-only main -- ."
        );
    }

    #[test]
    fn fetch_args_name_remote_and_ref() {
        assert_eq!(
            fetch_args("upstream", "main"),
            vec!["fetch", "--no-tags", "upstream", "main"]
        );
    }

    #[test]
    fn command_failure_maps_to_vcs_error() {
        let err = GitError::CommandFailed {
            args: "diff".to_string(),
            message: "bad revision".to_string(),
        }
        .into_vcs("diff");
        assert_eq!(err.operation, "diff");
        assert!(err.message.contains("bad revision"));
    }
}
