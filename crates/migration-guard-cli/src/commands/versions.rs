use crate::support::{EXIT_FATAL, VERSIONS_KIND, init_tracing, print_json_or_exit};
use migration_guard_git::GitClient;
use migration_guard_kernel::{VcsProvider, VersionKey};
use serde_json::json;

struct VersionedFile {
    path: String,
    key: VersionKey,
}

/// Split a tree listing into versioned files, oldest first, and the count
/// of files without a version key.
fn partition_listing(listing: &str) -> (Vec<VersionedFile>, usize) {
    let mut versioned = Vec::new();
    let mut unversioned = 0;
    for path in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match VersionKey::from_path(path) {
            Some(key) => versioned.push(VersionedFile {
                path: path.to_string(),
                key,
            }),
            None => unversioned += 1,
        }
    }
    versioned.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.path.cmp(&b.path)));
    (versioned, unversioned)
}

pub fn run(reference: String, path: String, repo: String, json_output: bool) {
    init_tracing(false);

    let listing = GitClient::discover(&repo)
        .map_err(|err| err.to_string())
        .and_then(|client| {
            client
                .list_tree(&reference, &path)
                .map_err(|err| err.to_string())
        })
        .unwrap_or_else(|err| {
            eprintln!("error: {err}");
            std::process::exit(EXIT_FATAL);
        });
    let (versioned, unversioned) = partition_listing(&listing);
    let newest = versioned.last().map(|file| file.key.clone());

    if json_output {
        let rows: Vec<_> = versioned
            .iter()
            .map(|file| json!({ "path": file.path, "versionKey": file.key }))
            .collect();
        let payload = json!({
            "schema": 1,
            "checkKind": VERSIONS_KIND,
            "ref": reference,
            "path": path,
            "versioned": rows,
            "newest": newest,
            "unversionedCount": unversioned,
        });
        print_json_or_exit(&payload, "migration-guard versions");
        return;
    }

    match &newest {
        Some(key) => println!(
            "[migration-guard] {reference}:{path} newest={key} (versioned={}, unversioned={unversioned})",
            versioned.len()
        ),
        None => println!(
            "[migration-guard] {reference}:{path} has no versioned files (unversioned={unversioned})"
        ),
    }
    for file in &versioned {
        println!("  {}  {}", file.key, file.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_is_sorted_by_version_key_not_by_path() {
        let listing = "\
db/b/V2022.02.01.0002__second.sql
db/a/V2022.02.02.0001__third.sql
db/README.md
db/c/V2022.02.01.0001__first.sql

";
        let (versioned, unversioned) = partition_listing(listing);
        let keys: Vec<String> = versioned.iter().map(|f| f.key.to_string()).collect();
        assert_eq!(
            keys,
            vec!["V2022.02.01.0001", "V2022.02.01.0002", "V2022.02.02.0001"]
        );
        assert_eq!(unversioned, 1);
    }

    #[test]
    fn equal_keys_fall_back_to_path_order() {
        let (versioned, _) =
            partition_listing("z/V2022.01.01.0001__a.sql\na/V2022.01.01.0001__b.sql\n");
        assert_eq!(versioned[0].path, "a/V2022.01.01.0001__b.sql");
    }
}
