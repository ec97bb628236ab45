//! The VCS provider seam.
//!
//! The kernel never shells out. Everything it knows about the two branches
//! arrives as raw text through this trait, which keeps classification and
//! validation testable against scripted output.

use crate::change::DiffFilter;
use crate::config::Similarity;
use crate::error::VcsError;

/// Parameters of one `diff` call between head and feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffQuery {
    /// Paths only (`--name-only`) instead of name-status lines.
    pub name_only: bool,
    pub filter: DiffFilter,
    pub find_renames_pct: Similarity,
    pub head: String,
    pub feature: String,
    pub path_scope: String,
}

/// Blocking access to the repository holding both branches.
///
/// Every call runs to completion. Failures carry a message and never a
/// partial result.
pub trait VcsProvider {
    fn fetch(&self, reference: &str) -> Result<(), VcsError>;

    fn checkout(&self, reference: &str) -> Result<(), VcsError>;

    /// Raw newline-delimited diff output for `query`.
    fn diff(&self, query: &DiffQuery) -> Result<String, VcsError>;

    /// Raw newline-delimited recursive listing of `path_scope` at `reference`.
    fn list_tree(&self, reference: &str, path_scope: &str) -> Result<String, VcsError>;

    fn current_branch(&self) -> Result<String, VcsError>;
}
