//! Rename detection.
//!
//! A migration that was already applied must never move. Detection asks the
//! provider for a rename-only diff at the configured similarity threshold,
//! and only when there is something to look at:
//!
//! ```text
//! Idle ──(filter has R ∧ changes in scope)──▶ Checking ──▶ Clean
//!                                                    └──▶ Violation
//! ```

use crate::change::{ChangeType, DiffFilter, DiffResult, classify};
use crate::config::GuardConfig;
use crate::error::VcsError;
use crate::provider::{DiffQuery, VcsProvider};
use serde::{Deserialize, Serialize};

/// A file moved between head and feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamedFile {
    pub from: Option<String>,
    pub to: String,
}

impl std::fmt::Display for RenamedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.from {
            Some(from) => write!(f, "{from} -> {}", self.to),
            None => f.write_str(&self.to),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenameOutcome {
    /// The configured filter does not include renames.
    NotRequested,
    /// No changed paths in scope, so no rename query was made.
    Skipped,
    Clean,
    Violation { renames: Vec<RenamedFile> },
}

impl RenameOutcome {
    pub fn is_violation(&self) -> bool {
        matches!(self, Self::Violation { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::NotRequested => "not_requested",
            Self::Skipped => "skipped",
            Self::Clean => "clean",
            Self::Violation { .. } => "violation",
        }
    }

    /// Destination paths of the offending renames.
    pub fn offending_paths(&self) -> Vec<String> {
        match self {
            Self::Violation { renames } => renames.iter().map(|r| r.to.clone()).collect(),
            _ => Vec::new(),
        }
    }
}

/// Run the rename check for `changes`, the result of the configured diff.
pub fn detect_renames(
    provider: &dyn VcsProvider,
    config: &GuardConfig,
    changes: &DiffResult,
) -> Result<RenameOutcome, VcsError> {
    if !config.diff_filter.contains(ChangeType::Renamed) {
        return Ok(RenameOutcome::NotRequested);
    }
    if changes.is_empty() {
        return Ok(RenameOutcome::Skipped);
    }

    let query = DiffQuery {
        name_only: false,
        filter: DiffFilter::only(ChangeType::Renamed),
        find_renames_pct: config.similarity,
        head: config.head.clone(),
        feature: config.feature.clone(),
        path_scope: config.path.clone(),
    };
    let raw = provider.diff(&query)?;
    let renames: Vec<RenamedFile> = classify(&raw)
        .of_type(ChangeType::Renamed)
        .map(|record| RenamedFile {
            from: record.previous_path.clone(),
            to: record.path.clone(),
        })
        .collect();

    tracing::debug!(
        similarity = config.similarity.percent(),
        renames = renames.len(),
        "rename query complete"
    );

    if renames.is_empty() {
        Ok(RenameOutcome::Clean)
    } else {
        Ok(RenameOutcome::Violation { renames })
    }
}
