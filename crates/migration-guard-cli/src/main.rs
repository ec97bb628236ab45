//! migration-guard CLI: the `migration-guard` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            head,
            feature,
            path,
            diff_filter,
            similarity,
            check_file_name_dates,
            debug,
            fetch,
            verify_branch,
            config,
            repo,
            remote,
            json,
        } => commands::check::run(commands::check::Args {
            head,
            feature,
            path,
            diff_filter,
            similarity,
            check_file_name_dates,
            debug,
            fetch,
            verify_branch,
            config,
            repo,
            remote,
            json,
        }),

        Commands::Versions {
            reference,
            path,
            repo,
            json,
        } => commands::versions::run(reference, path, repo, json),
    }
}
