//! Run configuration.
//!
//! Input arrives in layers (built-in defaults, an optional TOML file, then
//! command-line flags and `INPUT_*` environment variables). Each layer is a
//! [`RawConfig`] of optional strings; [`GuardConfig::resolve`] validates the
//! merged result once. The resolved [`GuardConfig`] is never mutated
//! afterwards.

use crate::change::DiffFilter;
use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

pub const DEFAULT_PATH: &str = ".";
pub const DEFAULT_SIMILARITY: u8 = 50;

/// Rename similarity threshold in percent, `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Similarity(u8);

impl Similarity {
    pub fn new(pct: u8) -> Result<Self, ConfigError> {
        if pct > 100 {
            return Err(ConfigError::Similarity(pct.to_string()));
        }
        Ok(Self(pct))
    }

    pub fn percent(self) -> u8 {
        self.0
    }
}

impl Default for Similarity {
    fn default() -> Self {
        Self(DEFAULT_SIMILARITY)
    }
}

impl std::fmt::Display for Similarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl std::str::FromStr for Similarity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_end_matches('%').trim();
        let pct: u8 = digits
            .parse()
            .map_err(|_| ConfigError::Similarity(s.to_string()))?;
        Self::new(pct).map_err(|_| ConfigError::Similarity(s.to_string()))
    }
}

/// One unvalidated configuration layer.
///
/// Values are kept as text because host inputs are always strings. TOML
/// files may use native integers and booleans; they are read leniently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    #[serde(default, deserialize_with = "lenient")]
    pub head: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub feature: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub diff_filter: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub similarity: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub check_file_name_dates: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub debug: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub fetch: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub verify_branch: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LenientValue>::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        LenientValue::Bool(b) => b.to_string(),
        LenientValue::Int(i) => i.to_string(),
        LenientValue::Text(s) => s,
    }))
}

impl RawConfig {
    /// Parse a TOML layer. `origin` names the source in error messages.
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::File {
            path: origin.to_string(),
            message: err.message().to_string(),
        })
    }

    pub fn load_toml(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::File {
            path: origin.clone(),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&text, &origin)
    }

    /// Merge `upper` over `self`. Set, non-blank values in `upper` win.
    pub fn overlay(self, upper: RawConfig) -> RawConfig {
        fn pick(lower: Option<String>, upper: Option<String>) -> Option<String> {
            non_blank(upper).or_else(|| non_blank(lower))
        }
        RawConfig {
            head: pick(self.head, upper.head),
            feature: pick(self.feature, upper.feature),
            path: pick(self.path, upper.path),
            diff_filter: pick(self.diff_filter, upper.diff_filter),
            similarity: pick(self.similarity, upper.similarity),
            check_file_name_dates: pick(self.check_file_name_dates, upper.check_file_name_dates),
            debug: pick(self.debug, upper.debug),
            fetch: pick(self.fetch, upper.fetch),
            verify_branch: pick(self.verify_branch, upper.verify_branch),
        }
    }
}

// Unset host inputs arrive as empty strings.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardConfig {
    pub head: String,
    pub feature: String,
    pub path: String,
    pub diff_filter: DiffFilter,
    pub similarity: Similarity,
    pub check_file_name_dates: bool,
    pub debug: bool,
    /// Fetch and check out both refs before diffing.
    pub fetch: bool,
    /// Require the current checkout to be the feature branch.
    pub verify_branch: bool,
}

impl GuardConfig {
    pub fn resolve(raw: RawConfig) -> Result<Self, ConfigError> {
        let head = non_blank(raw.head).ok_or(ConfigError::Missing("head"))?;
        let feature = non_blank(raw.feature).ok_or(ConfigError::Missing("feature"))?;
        if head == feature {
            return Err(ConfigError::SameBranch(head));
        }

        let diff_filter = match non_blank(raw.diff_filter) {
            Some(letters) => letters.parse()?,
            None => DiffFilter::default(),
        };
        let similarity = match non_blank(raw.similarity) {
            Some(pct) => pct.parse()?,
            None => Similarity::default(),
        };

        Ok(Self {
            head,
            feature,
            path: non_blank(raw.path).unwrap_or_else(|| DEFAULT_PATH.to_string()),
            diff_filter,
            similarity,
            check_file_name_dates: parse_flag(
                "check_file_name_dates",
                raw.check_file_name_dates,
                false,
            )?,
            debug: parse_flag("debug", raw.debug, false)?,
            fetch: parse_flag("fetch", raw.fetch, false)?,
            verify_branch: parse_flag("verify_branch", raw.verify_branch, true)?,
        })
    }
}

fn parse_flag(
    key: &'static str,
    value: Option<String>,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(value) = non_blank(value) else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Boolean { key, value }),
    }
}
