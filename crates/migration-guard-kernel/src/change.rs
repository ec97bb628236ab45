//! Change classification over raw `git diff --name-status` output.
//!
//! The classifier turns newline-delimited provider output into typed
//! [`ChangeRecord`]s, one per path. Status letters follow git's
//! `--diff-filter` convention (A/C/D/M/R/T/U/X/B).

use crate::error::ConfigError;
use crate::version::VersionKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Git change type, keyed by its diff-filter letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Copied,
    Deleted,
    Modified,
    Renamed,
    TypeChanged,
    Unmerged,
    Unknown,
    PairingBroken,
}

impl ChangeType {
    pub const ALL: [Self; 9] = [
        Self::Added,
        Self::Copied,
        Self::Deleted,
        Self::Modified,
        Self::Renamed,
        Self::TypeChanged,
        Self::Unmerged,
        Self::Unknown,
        Self::PairingBroken,
    ];

    pub fn letter(self) -> char {
        match self {
            Self::Added => 'A',
            Self::Copied => 'C',
            Self::Deleted => 'D',
            Self::Modified => 'M',
            Self::Renamed => 'R',
            Self::TypeChanged => 'T',
            Self::Unmerged => 'U',
            Self::Unknown => 'X',
            Self::PairingBroken => 'B',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.letter() == letter)
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Added => "added",
            Self::Copied => "copied",
            Self::Deleted => "deleted",
            Self::Modified => "modified",
            Self::Renamed => "renamed",
            Self::TypeChanged => "type_changed",
            Self::Unmerged => "unmerged",
            Self::Unknown => "unknown",
            Self::PairingBroken => "pairing_broken",
        };
        f.write_str(name)
    }
}

/// A set of change types a diff query is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiffFilter(BTreeSet<ChangeType>);

impl DiffFilter {
    pub fn only(kind: ChangeType) -> Self {
        Self(BTreeSet::from([kind]))
    }

    pub fn contains(&self, kind: ChangeType) -> bool {
        self.0.contains(&kind)
    }

    /// Letters in canonical order, as passed to `git diff --diff-filter=`.
    pub fn as_git_arg(&self) -> String {
        self.0.iter().map(|kind| kind.letter()).collect()
    }
}

impl Default for DiffFilter {
    fn default() -> Self {
        Self::only(ChangeType::Renamed)
    }
}

impl std::fmt::Display for DiffFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_git_arg())
    }
}

impl std::str::FromStr for DiffFilter {
    type Err = ConfigError;

    /// Parse letters such as `"RAM"`. Lowercase letters are rejected: git
    /// reads them as exclusions, which this guard does not support.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut kinds = BTreeSet::new();
        for letter in s.trim().chars() {
            let kind = ChangeType::from_letter(letter).ok_or(ConfigError::FilterLetter(letter))?;
            kinds.insert(kind);
        }
        if kinds.is_empty() {
            return Err(ConfigError::EmptyFilter);
        }
        Ok(Self(kinds))
    }
}

impl Serialize for DiffFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_git_arg())
    }
}

/// One path touched between head and feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub path: String,
    pub change_type: ChangeType,
    /// Source path of a rename or copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_key: Option<VersionKey>,
}

impl ChangeRecord {
    pub fn new(path: impl Into<String>, change_type: ChangeType) -> Self {
        let path = path.into();
        let version_key = VersionKey::from_path(&path);
        Self {
            path,
            change_type,
            previous_path: None,
            version_key,
        }
    }

    pub fn with_previous_path(mut self, previous: impl Into<String>) -> Self {
        self.previous_path = Some(previous.into());
        self
    }
}

/// The same path was reported twice with different change types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierConflict {
    pub path: String,
    pub kept: ChangeType,
    pub discarded: ChangeType,
}

/// Deduplicated change records for one diff query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    pub records: Vec<ChangeRecord>,
    pub conflicts: Vec<ClassifierConflict>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn of_type(&self, kind: ChangeType) -> impl Iterator<Item = &ChangeRecord> {
        self.records
            .iter()
            .filter(move |record| record.change_type == kind)
    }
}

/// Classify raw name-status output.
///
/// Blank and whitespace-only lines are dropped. A line without a tab is a
/// bare path from name-only output and is classified as `Unknown`. The first
/// occurrence of a path wins; a later occurrence with a different change
/// type is recorded as a conflict.
pub fn classify(raw: &str) -> DiffResult {
    let mut result = DiffResult::default();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for line in raw.lines() {
        let Some(record) = parse_line(line) else {
            continue;
        };
        match seen.get(&record.path) {
            Some(&idx) => {
                let kept = result.records[idx].change_type;
                if kept != record.change_type {
                    result.conflicts.push(ClassifierConflict {
                        path: record.path,
                        kept,
                        discarded: record.change_type,
                    });
                }
            }
            None => {
                seen.insert(record.path.clone(), result.records.len());
                result.records.push(record);
            }
        }
    }
    result
}

fn parse_line(line: &str) -> Option<ChangeRecord> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return None;
    }

    // Path fields are kept verbatim: filenames may carry edge whitespace.
    if !line.contains('\t') {
        return Some(ChangeRecord::new(line, ChangeType::Unknown));
    }

    let mut fields = line.split('\t');
    let status = fields.next()?.trim();
    let rest: Vec<&str> = fields.filter(|field| !field.trim().is_empty()).collect();

    let kind = status
        .chars()
        .next()
        .and_then(ChangeType::from_letter)
        .unwrap_or(ChangeType::Unknown);

    // Renames and copies list the source path before the destination.
    match rest.as_slice() {
        [previous, path, ..] => Some(ChangeRecord::new(*path, kind).with_previous_path(*previous)),
        [path] => Some(ChangeRecord::new(*path, kind)),
        [] => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_filter_letters_in_canonical_order() {
        let filter: DiffFilter = "RAM".parse().unwrap();
        assert_eq!(filter.as_git_arg(), "AMR");
        assert!(filter.contains(ChangeType::Renamed));
        assert!(!filter.contains(ChangeType::Deleted));

        let all: DiffFilter = "RMACDTUXB".parse().unwrap();
        assert_eq!(all.as_git_arg(), "ACDMRTUXB");
    }

    #[test]
    fn rejects_bad_filters() {
        assert_eq!("".parse::<DiffFilter>(), Err(ConfigError::EmptyFilter));
        assert_eq!("  ".parse::<DiffFilter>(), Err(ConfigError::EmptyFilter));
        assert_eq!(
            "Rm".parse::<DiffFilter>(),
            Err(ConfigError::FilterLetter('m'))
        );
        assert_eq!(
            "RZ".parse::<DiffFilter>(),
            Err(ConfigError::FilterLetter('Z'))
        );
    }

    #[test]
    fn default_filter_is_rename_only() {
        assert_eq!(DiffFilter::default().as_git_arg(), "R");
    }

    #[test]
    fn classifies_name_status_lines() {
        let raw = "A\tdb/V2022.02.03.0001__add.sql\n\
                   M\tdb/notes.md\n\
                   R087\tdb/old.sql\tdb/new.sql\n\
                   C100\tdb/a.sql\tdb/b.sql\n\
                   D\tdb/gone.sql\n";
        let result = classify(raw);
        let kinds: Vec<(&str, ChangeType)> = result
            .records
            .iter()
            .map(|r| (r.path.as_str(), r.change_type))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("db/V2022.02.03.0001__add.sql", ChangeType::Added),
                ("db/notes.md", ChangeType::Modified),
                ("db/new.sql", ChangeType::Renamed),
                ("db/b.sql", ChangeType::Copied),
                ("db/gone.sql", ChangeType::Deleted),
            ]
        );
        assert_eq!(result.records[2].previous_path.as_deref(), Some("db/old.sql"));
        assert_eq!(
            result.records[0].version_key.as_ref().map(ToString::to_string),
            Some("V2022.02.03.0001".to_string())
        );
        assert!(result.records[1].version_key.is_none());
        assert!(result.conflicts.is_empty());
    }

    #[test]
    fn whitespace_lines_never_become_records() {
        let raw = "\nM\tdb/a.sql\n   \n\t\n\r\nA\tdb/b.sql\n\n\n";
        let result = classify(raw);
        assert_eq!(result.len(), 2);
        assert!(result.records.iter().all(|r| !r.path.trim().is_empty()));
        assert!(classify("").is_empty());
        assert!(classify("\n\n  \n").is_empty());
    }

    #[test]
    fn bare_paths_are_unknown_changes() {
        let result = classify("db/V2022.01.01.0001__a.sql\r\ndb/b.sql\n");
        assert_eq!(result.len(), 2);
        assert!(result.records.iter().all(|r| r.change_type == ChangeType::Unknown));
        assert_eq!(result.records[0].path, "db/V2022.01.01.0001__a.sql");
    }

    #[test]
    fn path_edge_whitespace_is_preserved() {
        let result = classify(
            "A\tdb/V2022.01.01.0001__a.sql \r\nR100\t db/old.sql\tdb/new.sql\n db/bare.sql\n",
        );
        let paths: Vec<&str> = result.records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["db/V2022.01.01.0001__a.sql ", "db/new.sql", " db/bare.sql"]
        );
        assert_eq!(result.records[1].previous_path.as_deref(), Some(" db/old.sql"));
    }

    #[test]
    fn duplicates_are_collapsed_and_conflicts_reported() {
        let raw = "M\tdb/a.sql\nM\tdb/a.sql\nT\tdb/a.sql\nA\tdb/b.sql\n";
        let result = classify(raw);
        assert_eq!(result.len(), 2);
        assert_eq!(result.records[0].change_type, ChangeType::Modified);
        assert_eq!(
            result.conflicts,
            vec![ClassifierConflict {
                path: "db/a.sql".to_string(),
                kept: ChangeType::Modified,
                discarded: ChangeType::TypeChanged,
            }]
        );
    }

    #[test]
    fn unrecognized_status_is_unknown() {
        let result = classify("Q\tdb/a.sql\n");
        assert_eq!(result.records[0].change_type, ChangeType::Unknown);
    }

    #[test]
    fn of_type_filters_records() {
        let result = classify("R100\ta.sql\tb.sql\nM\tc.sql\nR090\td.sql\te.sql\n");
        let renamed: Vec<&str> = result
            .of_type(ChangeType::Renamed)
            .map(|r| r.path.as_str())
            .collect();
        assert_eq!(renamed, vec!["b.sql", "e.sql"]);
    }
}
