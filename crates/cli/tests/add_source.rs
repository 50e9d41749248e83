use std::fs;

use curator_core::library::load_library_config;
use predicates::prelude::*;
use tempfile::tempdir;

const GAMES: &str = "https://archive.org/details/psion-games";
const UTILITIES: &str = "https://archive.org/details/Psion-Utilities";

/// add-source without an existing definition writes one with default
/// directories.
#[test]
fn add_source_creates_the_definition() {
    let dir = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("archive-curator")
        .current_dir(dir.path())
        .args(["add-source", GAMES])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Added source: {GAMES}")));

    let config = load_library_config(&dir.path().join("library.yaml")).unwrap();
    assert_eq!(config.sources, vec![GAMES]);
    assert_eq!(config.assets_directory, "assets");
    assert_eq!(config.output_directory, "site");
}

#[test]
fn add_source_keeps_sources_sorted_and_unique() {
    let dir = tempdir().expect("tempdir");
    let library = dir.path().join("curated.yaml");

    for url in [UTILITIES, GAMES] {
        assert_cmd::cargo::cargo_bin_cmd!("archive-curator")
            .arg("--library")
            .arg(&library)
            .args(["add-source", url])
            .assert()
            .success();
    }

    assert_cmd::cargo::cargo_bin_cmd!("archive-curator")
        .arg("--library")
        .arg(&library)
        .args(["add-source", GAMES])
        .assert()
        .success()
        .stdout(predicate::str::contains("Source already present"))
        .stdout(predicate::str::contains("Sources (2):"));

    let config = load_library_config(&library).unwrap();
    assert_eq!(config.sources, vec![GAMES, UTILITIES]);
}

/// Unsupported URLs fail without creating or touching the definition.
#[test]
fn add_source_rejects_unsupported_urls() {
    let dir = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("archive-curator")
        .current_dir(dir.path())
        .args(["add-source", "https://example.com/software.zip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported source URL"));

    assert!(!dir.path().join("library.yaml").exists());

    fs::write(dir.path().join("library.yaml"), "sources: []\nassets_directory: a\nintermediates_directory: b\nindex_directory: c\noutput_directory: d\n")
        .unwrap();
    assert_cmd::cargo::cargo_bin_cmd!("archive-curator")
        .current_dir(dir.path())
        .args(["add-source", "https://archive.org/search?query=psion"])
        .assert()
        .failure();
    let config = load_library_config(&dir.path().join("library.yaml")).unwrap();
    assert!(config.sources.is_empty());
}
