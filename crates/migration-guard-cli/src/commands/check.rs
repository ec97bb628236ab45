use crate::support::{
    EXIT_REJECTED, annotate_error, check_payload, config_file_path, fatal, in_github_actions,
    init_tracing, print_json_or_exit, resolve_config, write_github_outputs,
};
use migration_guard_git::GitClient;
use migration_guard_kernel::{OrderingOutcome, RawConfig, RenameOutcome, Verdict, run_validation};
use std::path::Path;

/// Inputs to `check`. Each is `None` when neither a flag nor its
/// `INPUT_*` variable was given.
pub struct Args {
    pub head: Option<String>,
    pub feature: Option<String>,
    pub path: Option<String>,
    pub diff_filter: Option<String>,
    pub similarity: Option<String>,
    pub check_file_name_dates: Option<String>,
    pub debug: Option<String>,
    pub fetch: Option<String>,
    pub verify_branch: Option<String>,
    pub config: Option<String>,
    pub repo: String,
    pub remote: String,
    pub json: bool,
}

impl Args {
    fn flags(&self) -> RawConfig {
        RawConfig {
            head: self.head.clone(),
            feature: self.feature.clone(),
            path: self.path.clone(),
            diff_filter: self.diff_filter.clone(),
            similarity: self.similarity.clone(),
            check_file_name_dates: self.check_file_name_dates.clone(),
            debug: self.debug.clone(),
            fetch: self.fetch.clone(),
            verify_branch: self.verify_branch.clone(),
        }
    }
}

pub fn run(args: Args) {
    let repo = Path::new(&args.repo);
    let config_file = config_file_path(args.config.as_deref(), repo);
    let config = resolve_config(in_github_actions(), config_file.as_deref(), args.flags())
        .unwrap_or_else(|err| {
            init_tracing(false);
            fatal("configuration_error", &err.to_string(), args.json)
        });
    init_tracing(config.debug);
    if let Some(path) = &config_file {
        tracing::debug!(path = %path.display(), "loaded config file");
    }

    let client = GitClient::discover(repo)
        .map(|client| client.with_remote(args.remote.clone()))
        .unwrap_or_else(|err| fatal("vcs_error", &err.to_string(), args.json));

    let verdict = run_validation(&client, &config)
        .unwrap_or_else(|err| fatal(err.class(), &err.to_string(), args.json));

    if let Err(err) = write_github_outputs(&verdict) {
        fatal("host_output_error", &err, args.json);
    }

    if args.json {
        print_json_or_exit(&check_payload(&verdict), "migration-guard check");
    } else {
        print_report(&verdict);
    }

    if !verdict.accepted() {
        annotate_error(&verdict.failure_message(), args.json);
        std::process::exit(EXIT_REJECTED);
    }
}

fn print_report(verdict: &Verdict) {
    let summary = format!(
        "head={}, feature={}, path={}, changed={}, renames={}, ordering={}",
        verdict.head(),
        verdict.feature(),
        verdict.path(),
        verdict.changes().len(),
        verdict.rename().status(),
        verdict.ordering().status(),
    );
    if verdict.accepted() {
        println!("[migration-guard] OK ({summary})");
    } else {
        println!("[migration-guard] FAIL ({summary})");
    }

    if let RenameOutcome::Violation { renames } = verdict.rename() {
        println!("  renamed files:");
        for rename in renames {
            println!("  - {rename}");
        }
    }
    match verdict.ordering() {
        OrderingOutcome::Violation {
            newest_head,
            oldest_feature,
            offending,
        } => {
            println!("  files older than {newest_head} (oldest on feature: {oldest_feature}):");
            for file in offending {
                println!("  - {} ({})", file.path, file.version_key);
            }
        }
        OrderingOutcome::NotApplicable { reason } => {
            println!("  ordering not applicable: {reason}");
        }
        _ => {}
    }
    for conflict in verdict.conflicts() {
        println!(
            "  warning: {} reported as both {} and {}",
            conflict.path, conflict.kept, conflict.discarded
        );
    }
    println!("  verdict: {}", verdict.verdict_id());
}
