//! Error types for migration-guard kernel operations.
//!
//! Only fatal conditions are errors. Rename and ordering violations are
//! outcomes carried by the [`Verdict`](crate::verdict::Verdict), and a
//! filename without a version key is an absence, not a failure.

/// Invalid or missing configuration input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required input `{0}`")]
    Missing(&'static str),

    #[error("head and feature must differ (both are `{0}`)")]
    SameBranch(String),

    #[error("diff filter must contain at least one change-type letter")]
    EmptyFilter,

    #[error(
        "unsupported diff filter letter `{0}`; expected uppercase letters from ACDMRTUXB"
    )]
    FilterLetter(char),

    #[error("similarity must be an integer between 0 and 100, got `{0}`")]
    Similarity(String),

    #[error("invalid boolean `{value}` for `{key}`")]
    Boolean { key: &'static str, value: String },

    #[error("config file {path}: {message}")]
    File { path: String, message: String },
}

/// A VCS provider call failed. No partial result is available.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("vcs {operation} failed: {message}")]
pub struct VcsError {
    pub operation: String,
    pub message: String,
}

impl VcsError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Fatal errors that abort a validation run before a verdict exists.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The checkout is not the branch under validation.
    #[error("wrong branch: expected `{expected}` to be checked out, found `{actual}`")]
    WrongBranch { expected: String, actual: String },

    #[error(transparent)]
    Vcs(#[from] VcsError),
}

impl GuardError {
    /// Stable machine-readable class for structured output.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Config(_) => "configuration_error",
            Self::WrongBranch { .. } => "wrong_branch",
            Self::Vcs(_) => "vcs_error",
        }
    }
}
