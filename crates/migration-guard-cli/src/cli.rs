use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "migration-guard",
    about = "migration-guard: fail CI when migration files are renamed or land out of order",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare head and feature branches and reject unsafe migration changes
    ///
    /// Every input also reads from the matching GitHub Actions `INPUT_*`
    /// variable. Flags win over a config file, which wins over defaults.
    Check {
        /// Reference branch being protected (required)
        #[arg(long, env = "INPUT_HEAD")]
        head: Option<String>,

        /// Branch under validation (required)
        #[arg(long, env = "INPUT_FEATURE")]
        feature: Option<String>,

        /// Path the comparison is restricted to [default: .]
        #[arg(long, env = "INPUT_PATH")]
        path: Option<String>,

        /// Change-type letters to diff for, any of RMACDTUXB [default: R]
        #[arg(long, env = "INPUT_DIFFFILTER")]
        diff_filter: Option<String>,

        /// Rename similarity threshold in percent [default: 50]
        #[arg(long, env = "INPUT_SIMILARITY")]
        similarity: Option<String>,

        /// Reject changed files older than the newest migration on head
        #[arg(
            long,
            env = "INPUT_CHECKFILENAMEDATES",
            num_args = 0..=1,
            default_missing_value = "true"
        )]
        check_file_name_dates: Option<String>,

        /// Verbose logging
        #[arg(long, env = "INPUT_DEBUG", num_args = 0..=1, default_missing_value = "true")]
        debug: Option<String>,

        /// Fetch and check out both refs first [default: true under GitHub Actions]
        #[arg(long, env = "INPUT_FETCH", num_args = 0..=1, default_missing_value = "true")]
        fetch: Option<String>,

        /// Require the feature branch to be checked out [default: true]
        #[arg(
            long,
            env = "INPUT_VERIFYBRANCH",
            num_args = 0..=1,
            default_missing_value = "true"
        )]
        verify_branch: Option<String>,

        /// TOML config file [default: .migration-guard.toml in --repo, if present]
        #[arg(long, env = "INPUT_CONFIG")]
        config: Option<String>,

        /// Repository path
        #[arg(long, default_value = ".")]
        repo: String,

        /// Remote to fetch from
        #[arg(long, env = "INPUT_REMOTE", default_value = "origin")]
        remote: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List versioned migration files on a ref, oldest first
    Versions {
        /// Ref to list
        #[arg(long = "ref", default_value = "HEAD")]
        reference: String,

        /// Path to list under
        #[arg(long, default_value = ".")]
        path: String,

        /// Repository path
        #[arg(long, default_value = ".")]
        repo: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
