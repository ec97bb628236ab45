//! The verdict of one validation run.
//!
//! A [`Verdict`] is assembled once by the orchestrator and handed to the
//! host as-is. Fields are private; the host reads it through accessors and
//! serialization only.
//!
//! Each verdict carries a deterministic id:
//! `verdict_id = "v1_" || hex(SHA256(canonical evidence JSON))`.
//! Two runs over the same branch contents and configuration produce the
//! same id.

use crate::change::{ChangeRecord, ClassifierConflict, DiffFilter, DiffResult};
use crate::config::{GuardConfig, Similarity};
use crate::ordering::OrderingOutcome;
use crate::rename::RenameOutcome;
use crate::version::VersionKey;
use serde::Serialize;
use sha2::{Digest, Sha256};

pub const VERDICT_ID_PREFIX: &str = "v1_";

pub const FAILURE_RENAME: &str = "rename_violation";
pub const FAILURE_ORDERING: &str = "ordering_violation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    verdict_id: String,
    head: String,
    feature: String,
    path: String,
    diff_filter: DiffFilter,
    similarity: Similarity,
    changes: Vec<ChangeRecord>,
    conflicts: Vec<ClassifierConflict>,
    rename: RenameOutcome,
    ordering: OrderingOutcome,
}

/// Fields that feed the verdict id, in canonical order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Evidence<'a> {
    schema: u32,
    head: &'a str,
    feature: &'a str,
    path: &'a str,
    diff_filter: &'a DiffFilter,
    similarity: Similarity,
    changes: &'a [ChangeRecord],
    rename: &'a RenameOutcome,
    ordering: &'a OrderingOutcome,
}

impl Verdict {
    pub fn new(
        config: &GuardConfig,
        changes: DiffResult,
        rename: RenameOutcome,
        ordering: OrderingOutcome,
    ) -> Self {
        let evidence = Evidence {
            schema: 1,
            head: &config.head,
            feature: &config.feature,
            path: &config.path,
            diff_filter: &config.diff_filter,
            similarity: config.similarity,
            changes: &changes.records,
            rename: &rename,
            ordering: &ordering,
        };
        let verdict_id = compute_verdict_id(&evidence);

        Self {
            verdict_id,
            head: config.head.clone(),
            feature: config.feature.clone(),
            path: config.path.clone(),
            diff_filter: config.diff_filter.clone(),
            similarity: config.similarity,
            changes: changes.records,
            conflicts: changes.conflicts,
            rename,
            ordering,
        }
    }

    pub fn verdict_id(&self) -> &str {
        &self.verdict_id
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn changes(&self) -> &[ChangeRecord] {
        &self.changes
    }

    pub fn conflicts(&self) -> &[ClassifierConflict] {
        &self.conflicts
    }

    pub fn rename(&self) -> &RenameOutcome {
        &self.rename
    }

    pub fn ordering(&self) -> &OrderingOutcome {
        &self.ordering
    }

    pub fn rename_violation(&self) -> bool {
        self.rename.is_violation()
    }

    pub fn ordering_violation(&self) -> bool {
        self.ordering.is_violation()
    }

    pub fn accepted(&self) -> bool {
        !self.rename_violation() && !self.ordering_violation()
    }

    pub fn result(&self) -> &'static str {
        if self.accepted() {
            "accepted"
        } else {
            "rejected"
        }
    }

    pub fn failure_classes(&self) -> Vec<&'static str> {
        let mut classes = Vec::new();
        if self.rename_violation() {
            classes.push(FAILURE_RENAME);
        }
        if self.ordering_violation() {
            classes.push(FAILURE_ORDERING);
        }
        classes
    }

    pub fn newest_head(&self) -> Option<&VersionKey> {
        self.ordering.newest_head()
    }

    pub fn oldest_feature(&self) -> Option<&VersionKey> {
        self.ordering.oldest_feature()
    }

    /// Offending paths from both checks, renames first, without duplicates.
    pub fn offending_paths(&self) -> Vec<String> {
        let mut out = self.rename.offending_paths();
        for path in self.ordering.offending_paths() {
            if !out.contains(&path) {
                out.push(path);
            }
        }
        out
    }

    /// One-line human summary of the failures, empty when accepted.
    pub fn failure_message(&self) -> String {
        let mut parts = Vec::new();
        if let RenameOutcome::Violation { renames } = &self.rename {
            let listed: Vec<String> = renames.iter().map(ToString::to_string).collect();
            parts.push(format!(
                "renamed files found in `{}`: {}",
                self.path,
                listed.join(", ")
            ));
        }
        if let OrderingOutcome::Violation {
            newest_head,
            oldest_feature,
            offending,
        } = &self.ordering
        {
            let listed: Vec<&str> = offending.iter().map(|f| f.path.as_str()).collect();
            parts.push(format!(
                "feature version {oldest_feature} is older than newest head version {newest_head}: {}",
                listed.join(", ")
            ));
        }
        parts.join("; ")
    }
}

fn compute_verdict_id(evidence: &Evidence<'_>) -> String {
    let bytes = serde_json::to_vec(evidence).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    let mut out = String::with_capacity(VERDICT_ID_PREFIX.len() + digest.len() * 2);
    out.push_str(VERDICT_ID_PREFIX);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::classify;
    use crate::config::RawConfig;
    use crate::ordering::{newest_head_key, validate_ordering};
    use crate::rename::RenamedFile;

    fn config() -> GuardConfig {
        GuardConfig::resolve(RawConfig {
            head: Some("main".to_string()),
            feature: Some("dev".to_string()),
            diff_filter: Some("RAM".to_string()),
            ..RawConfig::default()
        })
        .unwrap()
    }

    fn both_violations() -> Verdict {
        let changes = classify("R100\tV2022.01.01.0001__a.sql\tV2022.01.01.0001__b.sql\n");
        let ordering = validate_ordering(
            &changes.records,
            newest_head_key("V2022.02.02.0001__z.sql\n"),
        );
        let rename = RenameOutcome::Violation {
            renames: vec![RenamedFile {
                from: Some("V2022.01.01.0001__a.sql".to_string()),
                to: "V2022.01.01.0001__b.sql".to_string(),
            }],
        };
        Verdict::new(&config(), changes, rename, ordering)
    }

    #[test]
    fn both_violations_are_reported() {
        let verdict = both_violations();
        assert!(!verdict.accepted());
        assert_eq!(verdict.result(), "rejected");
        assert_eq!(
            verdict.failure_classes(),
            vec![FAILURE_RENAME, FAILURE_ORDERING]
        );
        assert_eq!(verdict.offending_paths(), vec!["V2022.01.01.0001__b.sql"]);
        let message = verdict.failure_message();
        assert!(message.contains("renamed files found"));
        assert!(message.contains("V2022.01.01.0001 is older than newest head version V2022.02.02.0001"));
    }

    #[test]
    fn empty_run_is_accepted_with_not_applicable_ordering() {
        let verdict = Verdict::new(
            &config(),
            classify("\n"),
            RenameOutcome::Skipped,
            validate_ordering(&[], None),
        );
        assert!(verdict.accepted());
        assert!(verdict.failure_classes().is_empty());
        assert_eq!(verdict.ordering().status(), "not_applicable");
        assert_eq!(verdict.failure_message(), "");
    }

    #[test]
    fn verdict_id_is_deterministic_and_content_sensitive() {
        let a = both_violations();
        let b = both_violations();
        assert_eq!(a.verdict_id(), b.verdict_id());
        assert!(a.verdict_id().starts_with(VERDICT_ID_PREFIX));
        assert_eq!(a.verdict_id().len(), VERDICT_ID_PREFIX.len() + 64);

        let clean = Verdict::new(
            &config(),
            DiffResult::default(),
            RenameOutcome::Skipped,
            OrderingOutcome::Disabled,
        );
        assert_ne!(a.verdict_id(), clean.verdict_id());
    }
}
