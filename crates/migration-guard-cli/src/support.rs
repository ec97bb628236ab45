use migration_guard_kernel::{ConfigError, GuardConfig, RawConfig, Verdict};
use serde_json::{Value, json};
use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const CHECK_KIND: &str = "ci.migration_guard_check.v1";
pub const VERSIONS_KIND: &str = "ci.migration_guard_versions.v1";
pub const DEFAULT_CONFIG_FILE: &str = ".migration-guard.toml";
pub const LOG_JSON_ENV: &str = "MIGRATION_GUARD_LOG_JSON";

pub const EXIT_REJECTED: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

pub fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

/// Running as a GitHub Actions step.
pub fn in_github_actions() -> bool {
    env_bool("GITHUB_ACTIONS", false)
}

pub fn default_log_directive(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}

/// Install the global subscriber. Logs go to stderr so stdout stays
/// reserved for the report. `RUST_LOG` overrides the default level.
pub fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_directive(debug)));
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let installed = if env_bool(LOG_JSON_ENV, false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
    };
    if let Err(err) = installed {
        eprintln!("warning: tracing already initialized: {err}");
    }
}

/// Defaults that depend on the host rather than on user input.
pub fn host_defaults(github_actions: bool) -> RawConfig {
    RawConfig {
        fetch: Some(github_actions.to_string()),
        ..RawConfig::default()
    }
}

/// Config file to layer under flags: the explicit one, else the default
/// file in `repo` when it exists.
pub fn config_file_path(explicit: Option<&str>, repo: &Path) -> Option<PathBuf> {
    match explicit.map(str::trim).filter(|p| !p.is_empty()) {
        Some(path) => Some(PathBuf::from(path)),
        None => {
            let candidate = repo.join(DEFAULT_CONFIG_FILE);
            candidate.is_file().then_some(candidate)
        }
    }
}

/// Layer host defaults, then the config file, then flags and `INPUT_*`
/// variables, and validate the result.
pub fn resolve_config(
    github_actions: bool,
    config_file: Option<&Path>,
    flags: RawConfig,
) -> Result<GuardConfig, ConfigError> {
    let mut raw = host_defaults(github_actions);
    if let Some(path) = config_file {
        raw = raw.overlay(RawConfig::load_toml(path)?);
    }
    GuardConfig::resolve(raw.overlay(flags))
}

pub fn check_payload(verdict: &Verdict) -> Value {
    json!({
        "schema": 1,
        "checkKind": CHECK_KIND,
        "result": verdict.result(),
        "failureClasses": verdict.failure_classes(),
        "offendingPaths": verdict.offending_paths(),
        "verdict": verdict,
    })
}

pub fn error_payload(class: &str, message: &str) -> Value {
    json!({
        "schema": 1,
        "checkKind": CHECK_KIND,
        "result": "error",
        "failureClasses": [class],
        "message": message,
    })
}

pub fn print_json_or_exit(payload: &Value, what: &str) {
    let rendered = serde_json::to_string_pretty(payload).unwrap_or_else(|err| {
        eprintln!("error: failed to render {what} payload: {err}");
        std::process::exit(EXIT_FATAL);
    });
    println!("{rendered}");
}

/// Step outputs in `KEY=value` lines for `$GITHUB_OUTPUT`.
pub fn github_output_lines(verdict: &Verdict) -> Vec<String> {
    let offending = serde_json::to_string(&verdict.offending_paths()).unwrap_or_default();
    vec![
        format!("result={}", verdict.result()),
        format!("offending_paths={offending}"),
        format!("rename_status={}", verdict.rename().status()),
        format!("ordering_status={}", verdict.ordering().status()),
        format!("verdict_id={}", verdict.verdict_id()),
    ]
}

/// Append step outputs when `GITHUB_OUTPUT` names a file. No-op otherwise.
pub fn write_github_outputs(verdict: &Verdict) -> Result<(), String> {
    let Some(target) = env::var_os("GITHUB_OUTPUT").filter(|v| !v.is_empty()) else {
        return Ok(());
    };
    let target = PathBuf::from(target);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&target)
        .map_err(|err| format!("failed to open {}: {err}", target.display()))?;
    for line in github_output_lines(verdict) {
        writeln!(file, "{line}")
            .map_err(|err| format!("failed to write {}: {err}", target.display()))?;
    }
    tracing::debug!(path = %target.display(), "wrote step outputs");
    Ok(())
}

/// Workflow-command escaping for annotation messages.
pub fn escape_annotation(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Emit an `::error::` annotation under GitHub Actions. Suppressed in JSON
/// mode so stdout stays parseable.
pub fn annotate_error(message: &str, json_output: bool) {
    if in_github_actions() && !json_output {
        println!(
            "::error title=migration-guard::{}",
            escape_annotation(message)
        );
    }
}

/// Report a fatal error and exit with [`EXIT_FATAL`].
pub fn fatal(class: &str, message: &str, json_output: bool) -> ! {
    if json_output {
        print_json_or_exit(&error_payload(class, message), "migration-guard");
    } else {
        annotate_error(message, false);
    }
    eprintln!("error: {message}");
    std::process::exit(EXIT_FATAL);
}
