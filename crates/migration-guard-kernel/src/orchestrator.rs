//! Validation orchestration.
//!
//! One run, strictly sequential. Each provider call completes before the
//! next starts because checkout mutates the single shared worktree:
//!
//! 1. confirm the feature branch is checked out
//! 2. fetch and check out both refs (automation only)
//! 3. diff with the configured filter and classify
//! 4. rename check
//! 5. ordering check
//! 6. assemble the verdict

use crate::change::{DiffResult, classify};
use crate::config::GuardConfig;
use crate::error::{GuardError, VcsError};
use crate::ordering::{NotApplicableReason, OrderingOutcome, newest_head_key, validate_ordering};
use crate::provider::{DiffQuery, VcsProvider};
use crate::rename::detect_renames;
use crate::verdict::Verdict;

/// Run the full validation for `config` against `provider`.
pub fn run_validation(
    provider: &dyn VcsProvider,
    config: &GuardConfig,
) -> Result<Verdict, GuardError> {
    tracing::info!(
        head = %config.head,
        feature = %config.feature,
        path = %config.path,
        diff_filter = %config.diff_filter,
        similarity = config.similarity.percent(),
        "comparing branches"
    );

    if config.verify_branch {
        ensure_feature_checkout(provider, &config.feature)?;
    }

    if config.fetch {
        sync_refs(provider, config)?;
    }

    let changes = collect_changes(provider, config)?;
    let rename = detect_renames(provider, config, &changes)?;
    let ordering = if config.check_file_name_dates {
        check_ordering(provider, config, &changes)?
    } else {
        OrderingOutcome::Disabled
    };

    let verdict = Verdict::new(config, changes, rename, ordering);
    tracing::info!(
        verdict_id = verdict.verdict_id(),
        result = verdict.result(),
        rename = verdict.rename().status(),
        ordering = verdict.ordering().status(),
        "validation complete"
    );
    Ok(verdict)
}

fn ensure_feature_checkout(provider: &dyn VcsProvider, feature: &str) -> Result<(), GuardError> {
    let actual = provider.current_branch()?;
    let actual = normalize_branch(&actual);
    let expected = normalize_branch(feature);
    if actual != expected {
        return Err(GuardError::WrongBranch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    tracing::debug!(branch = actual, "feature branch is checked out");
    Ok(())
}

fn normalize_branch(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix("refs/heads/").unwrap_or(name)
}

fn sync_refs(provider: &dyn VcsProvider, config: &GuardConfig) -> Result<(), VcsError> {
    provider.fetch(&config.head)?;
    provider.fetch(&config.feature)?;
    // Checking out head first leaves a local head branch to diff against and
    // the feature branch in the worktree.
    provider.checkout(&config.head)?;
    provider.checkout(&config.feature)?;
    tracing::debug!("fetched and checked out both refs");
    Ok(())
}

fn collect_changes(
    provider: &dyn VcsProvider,
    config: &GuardConfig,
) -> Result<DiffResult, VcsError> {
    let query = DiffQuery {
        name_only: false,
        filter: config.diff_filter.clone(),
        find_renames_pct: config.similarity,
        head: config.head.clone(),
        feature: config.feature.clone(),
        path_scope: config.path.clone(),
    };
    let raw = provider.diff(&query)?;
    let changes = classify(&raw);
    tracing::debug!(changed = changes.len(), "classified diff");
    for conflict in &changes.conflicts {
        tracing::warn!(
            path = %conflict.path,
            kept = %conflict.kept,
            discarded = %conflict.discarded,
            "path reported with conflicting change types"
        );
    }
    Ok(changes)
}

fn check_ordering(
    provider: &dyn VcsProvider,
    config: &GuardConfig,
    changes: &DiffResult,
) -> Result<OrderingOutcome, VcsError> {
    if changes.records.iter().all(|r| r.version_key.is_none()) {
        return Ok(OrderingOutcome::NotApplicable {
            reason: NotApplicableReason::NoFeatureVersions,
        });
    }
    let listing = provider.list_tree(&config.head, &config.path)?;
    let newest_head = newest_head_key(&listing);
    tracing::debug!(newest_head = ?newest_head, "scanned head listing");
    Ok(validate_ordering(&changes.records, newest_head))
}
