//! Version keys embedded in migration filenames.
//!
//! A migration file carries its position in the migration sequence in its
//! name, e.g. `V2022.02.02.0001__add_users.sql`:
//!
//! - **date**: `2022.02.02`, three fixed-width dot-separated digit groups
//! - **sequence**: `0001`, an optional 4-digit counter that must be followed
//!   directly by the `__` separator
//!
//! Keys are opaque padded strings. `V2022.13.45` is a valid key: no calendar
//! validation is performed, only ordering.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A comparable `(date, sequence)` pair parsed from a migration filename.
///
/// Field order matters: the derived `Ord` compares `date` first and falls
/// back to `sequence` only on equal dates. `None < Some(_)`, so a key
/// without a sequence sorts before every sequenced key of the same date.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionKey {
    pub date: String,
    pub sequence: Option<String>,
}

impl VersionKey {
    pub fn new(date: impl Into<String>, sequence: Option<&str>) -> Self {
        Self {
            date: date.into(),
            sequence: sequence.map(ToOwned::to_owned),
        }
    }

    /// Parse the key from the final component of `path`.
    ///
    /// Returns `None` when the filename does not follow the grammar. A miss
    /// is never an error: the file simply takes no part in ordering.
    pub fn from_path(path: &str) -> Option<Self> {
        let captures = version_re().captures(file_name(path))?;
        let date = captures.get(1)?.as_str();
        let sequence = captures.get(2).map(|m| m.as_str());
        Some(Self::new(date, sequence))
    }
}

impl std::fmt::Display for VersionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.sequence {
            Some(sequence) => write!(f, "V{}.{}", self.date, sequence),
            None => write!(f, "V{}", self.date),
        }
    }
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"V([0-9]{4}\.[0-9]{2}\.[0-9]{2})(?:\.([0-9]{4})__)?")
            .expect("version key regex must compile")
    })
}

fn file_name(path: &str) -> &str {
    let trimmed = path.trim().trim_end_matches('/');
    trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed)
}

/// Newest key among `paths`, ignoring paths without a key.
pub fn newest_key<'a>(paths: impl IntoIterator<Item = &'a str>) -> Option<VersionKey> {
    paths.into_iter().filter_map(VersionKey::from_path).max()
}
