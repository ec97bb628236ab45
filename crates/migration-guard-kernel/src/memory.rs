//! Scripted in-memory VCS provider.
//!
//! Holds canned diff output per diff filter and canned tree listings per
//! ref, and records every call in order. Used to drive the orchestrator in
//! tests without a repository on disk.
//!
//! Calls are recorded in a git-like shorthand:
//!
//! - `current-branch`
//! - `fetch <ref>` / `checkout <ref>`
//! - `diff [--name-only] --diff-filter=<letters> --find-renames=<n>% <head> <feature> -- <path>`
//! - `ls-tree <ref> -- <path>`

use crate::error::VcsError;
use crate::provider::{DiffQuery, VcsProvider};
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct InMemoryVcs {
    branch: String,
    diffs: HashMap<String, String>,
    trees: HashMap<String, String>,
    failures: HashMap<&'static str, String>,
    calls: RefCell<Vec<String>>,
}

impl InMemoryVcs {
    pub fn new(current_branch: impl Into<String>) -> Self {
        Self {
            branch: current_branch.into(),
            ..Self::default()
        }
    }

    /// Output for diffs whose filter renders as `filter` (canonical letter order).
    pub fn with_diff(mut self, filter: &str, output: impl Into<String>) -> Self {
        self.diffs.insert(filter.to_string(), output.into());
        self
    }

    pub fn with_tree(mut self, reference: &str, output: impl Into<String>) -> Self {
        self.trees.insert(reference.to_string(), output.into());
        self
    }

    /// Make `operation` (`fetch`, `checkout`, `diff`, `ls-tree`,
    /// `current-branch`) fail with `message`.
    pub fn failing(mut self, operation: &'static str, message: impl Into<String>) -> Self {
        self.failures.insert(operation, message.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, operation: &'static str, call: String) -> Result<(), VcsError> {
        self.calls.borrow_mut().push(call);
        match self.failures.get(operation) {
            Some(message) => Err(VcsError::new(operation, message.clone())),
            None => Ok(()),
        }
    }
}

impl VcsProvider for InMemoryVcs {
    fn fetch(&self, reference: &str) -> Result<(), VcsError> {
        self.record("fetch", format!("fetch {reference}"))
    }

    fn checkout(&self, reference: &str) -> Result<(), VcsError> {
        self.record("checkout", format!("checkout {reference}"))
    }

    fn diff(&self, query: &DiffQuery) -> Result<String, VcsError> {
        let filter = query.filter.as_git_arg();
        let name_only = if query.name_only { "--name-only " } else { "" };
        self.record(
            "diff",
            format!(
                "diff {name_only}--diff-filter={filter} --find-renames={} {} {} -- {}",
                query.find_renames_pct, query.head, query.feature, query.path_scope
            ),
        )?;
        Ok(self.diffs.get(&filter).cloned().unwrap_or_default())
    }

    fn list_tree(&self, reference: &str, path_scope: &str) -> Result<String, VcsError> {
        self.record("ls-tree", format!("ls-tree {reference} -- {path_scope}"))?;
        Ok(self.trees.get(reference).cloned().unwrap_or_default())
    }

    fn current_branch(&self) -> Result<String, VcsError> {
        self.record("current-branch", "current-branch".to_string())?;
        Ok(self.branch.clone())
    }
}
