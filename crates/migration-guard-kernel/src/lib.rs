//! # migration-guard kernel
//!
//! Guards an ordered set of migration files against unsafe evolution
//! between a head (released) branch and a feature (in-progress) branch.
//! A change set is rejected when a tracked file was renamed, or when a
//! changed file's version key is older than the newest key already on head.
//!
//! This crate is **provider-agnostic**: it never runs git. Raw diff and tree
//! text arrives through [`VcsProvider`].
//!
//! ## Architecture
//!
//! ```text
//! VersionKey            ← (date, sequence) parsed from a filename
//!     │
//! ChangeRecord          ← one classified path from name-status output
//!     │
//! RenameOutcome         ← rename-only re-query at a similarity threshold
//! OrderingOutcome       ← oldest feature key vs newest head key
//!     │
//! Verdict               ← immutable result handed to the host
//! ```

pub mod change;
pub mod config;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod ordering;
pub mod provider;
pub mod rename;
pub mod verdict;
pub mod version;

pub use change::{ChangeRecord, ChangeType, ClassifierConflict, DiffFilter, DiffResult, classify};
pub use config::{GuardConfig, RawConfig, Similarity};
pub use error::{ConfigError, GuardError, VcsError};
pub use memory::InMemoryVcs;
pub use orchestrator::run_validation;
pub use ordering::{NotApplicableReason, OrderingOutcome, OutOfOrderFile, validate_ordering};
pub use provider::{DiffQuery, VcsProvider};
pub use rename::{RenameOutcome, RenamedFile, detect_renames};
pub use verdict::Verdict;
pub use version::VersionKey;
