//! Monotonic ordering of migration version keys.
//!
//! Every versioned file the feature branch touches must be at least as new
//! as the newest versioned file already on head. Equal keys pass: an edit
//! in place of the newest migration is allowed.

use crate::change::ChangeRecord;
use crate::version::{VersionKey, newest_key};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotApplicableReason {
    /// No changed feature file carries a version key.
    NoFeatureVersions,
    /// No file on head carries a version key.
    NoHeadVersions,
}

impl std::fmt::Display for NotApplicableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoFeatureVersions => f.write_str("no versioned files changed on feature"),
            Self::NoHeadVersions => f.write_str("no versioned files present on head"),
        }
    }
}

/// A feature file older than the newest head file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutOfOrderFile {
    pub path: String,
    pub version_key: VersionKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderingOutcome {
    /// Filename date checking is switched off.
    Disabled,
    /// Checked nothing: one side has no version keys. Neither pass nor fail.
    NotApplicable { reason: NotApplicableReason },
    #[serde(rename_all = "camelCase")]
    Clean {
        newest_head: VersionKey,
        oldest_feature: VersionKey,
    },
    #[serde(rename_all = "camelCase")]
    Violation {
        newest_head: VersionKey,
        oldest_feature: VersionKey,
        offending: Vec<OutOfOrderFile>,
    },
}

impl OrderingOutcome {
    pub fn is_violation(&self) -> bool {
        matches!(self, Self::Violation { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::NotApplicable { .. } => "not_applicable",
            Self::Clean { .. } => "clean",
            Self::Violation { .. } => "violation",
        }
    }

    pub fn newest_head(&self) -> Option<&VersionKey> {
        match self {
            Self::Clean { newest_head, .. } | Self::Violation { newest_head, .. } => {
                Some(newest_head)
            }
            _ => None,
        }
    }

    pub fn oldest_feature(&self) -> Option<&VersionKey> {
        match self {
            Self::Clean { oldest_feature, .. } | Self::Violation { oldest_feature, .. } => {
                Some(oldest_feature)
            }
            _ => None,
        }
    }

    pub fn offending_paths(&self) -> Vec<String> {
        match self {
            Self::Violation { offending, .. } => {
                offending.iter().map(|file| file.path.clone()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Oldest version key among the feature's changed records.
pub fn oldest_feature_key(records: &[ChangeRecord]) -> Option<&VersionKey> {
    records
        .iter()
        .filter_map(|record| record.version_key.as_ref())
        .min()
}

/// Newest version key in a raw recursive head listing.
pub fn newest_head_key(listing: &str) -> Option<VersionKey> {
    newest_key(listing.lines().map(str::trim).filter(|line| !line.is_empty()))
}

/// Compare the feature's changed records against the newest head key.
pub fn validate_ordering(
    records: &[ChangeRecord],
    newest_head: Option<VersionKey>,
) -> OrderingOutcome {
    let Some(oldest_feature) = oldest_feature_key(records).cloned() else {
        return OrderingOutcome::NotApplicable {
            reason: NotApplicableReason::NoFeatureVersions,
        };
    };
    let Some(newest_head) = newest_head else {
        return OrderingOutcome::NotApplicable {
            reason: NotApplicableReason::NoHeadVersions,
        };
    };

    if oldest_feature >= newest_head {
        return OrderingOutcome::Clean {
            newest_head,
            oldest_feature,
        };
    }

    let offending = records
        .iter()
        .filter_map(|record| {
            let key = record.version_key.as_ref()?;
            (key < &newest_head).then(|| OutOfOrderFile {
                path: record.path.clone(),
                version_key: key.clone(),
            })
        })
        .collect();

    OrderingOutcome::Violation {
        newest_head,
        oldest_feature,
        offending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::classify;

    fn check(head_listing: &str, feature_diff: &str) -> OrderingOutcome {
        let changes = classify(feature_diff);
        validate_ordering(&changes.records, newest_head_key(head_listing))
    }

    #[test]
    fn older_feature_date_is_a_violation() {
        let outcome = check("db/V2022.02.02.0001__a.sql\n", "A\tdb/V2022.02.01.0001__b.sql\n");
        assert!(outcome.is_violation());
        assert_eq!(
            outcome.newest_head().map(ToString::to_string).as_deref(),
            Some("V2022.02.02.0001")
        );
        assert_eq!(
            outcome.oldest_feature().map(ToString::to_string).as_deref(),
            Some("V2022.02.01.0001")
        );
        assert_eq!(outcome.offending_paths(), vec!["db/V2022.02.01.0001__b.sql"]);
    }

    #[test]
    fn lower_sequence_on_same_date_is_a_violation() {
        let outcome = check("V2022.02.02.0002__a.sql\n", "A\tV2022.02.02.0001__b.sql\n");
        assert!(outcome.is_violation());
    }

    #[test]
    fn equal_key_is_permitted() {
        let outcome = check("V2022.02.02.0002__a.sql\n", "M\tV2022.02.02.0002__a.sql\n");
        assert_eq!(outcome.status(), "clean");
        assert!(!outcome.is_violation());
    }

    #[test]
    fn non_ascii_digit_file_on_head_does_not_become_newest() {
        let outcome = check(
            "db/V٢٠٢٢.01.01__x.sql\ndb/V2022.01.01.0001__a.sql\n",
            "A\tdb/V2030.01.01.0001__new.sql\n",
        );
        assert_eq!(outcome.status(), "clean");
        assert_eq!(
            outcome.newest_head().map(ToString::to_string).as_deref(),
            Some("V2022.01.01.0001")
        );
    }

    #[test]
    fn newer_feature_is_clean() {
        let outcome = check(
            "V2022.02.01.0001__a.sql\nV2022.02.02.0001__b.sql\n",
            "A\tV2022.02.03__c.sql\n",
        );
        assert_eq!(outcome.status(), "clean");
    }

    #[test]
    fn only_older_files_are_offending() {
        let outcome = check(
            "V2022.02.02.0001__a.sql\n",
            "A\tV2022.03.01.0001__new.sql\nM\tV2022.01.01.0001__old.sql\nM\tREADME.md\n",
        );
        assert_eq!(outcome.offending_paths(), vec!["V2022.01.01.0001__old.sql"]);
    }

    #[test]
    fn unversioned_files_are_excluded() {
        let outcome = check("V2022.02.02.0001__a.sql\n", "R100\told.sql\tnew.sql\n");
        assert_eq!(
            outcome,
            OrderingOutcome::NotApplicable {
                reason: NotApplicableReason::NoFeatureVersions
            }
        );
    }

    #[test]
    fn empty_head_is_not_applicable_rather_than_clean() {
        let outcome = check("README.md\n\n", "A\tV2022.02.02.0001__a.sql\n");
        assert_eq!(
            outcome,
            OrderingOutcome::NotApplicable {
                reason: NotApplicableReason::NoHeadVersions
            }
        );
        assert_eq!(outcome.newest_head(), None);
    }

    #[test]
    fn empty_diff_is_not_applicable() {
        let outcome = check("V2022.02.02.0001__a.sql\n", "\n\n");
        assert_eq!(outcome.status(), "not_applicable");
    }
}
