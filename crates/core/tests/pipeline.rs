mod common;

use std::fs;
use std::path::Path;

use common::{installer_with_files, resource, write_item_metadata, write_zip, StubDecoder};
use curator_core::library::LibraryContext;
use curator_core::model::{Release, ReleaseKind};
use curator_core::services::pipeline;
use curator_core::store::sha256_file;
use serde_json::Value;

const DEFINITION: &str = "\
sources:
  - https://archive.org/details/psion-games
overlays:
  - overlay
assets_directory: assets
intermediates_directory: build/intermediates
index_directory: build/index
output_directory: site
";

/// Library with one archive item holding an installer and a standalone app,
/// plus an overlay for the installer's uid.
fn library_fixture(root: &Path) -> std::path::PathBuf {
    let definition = root.join("library.yaml");
    fs::write(&definition, DEFINITION).unwrap();

    let item_dir = root.join("assets/psion-games");
    write_item_metadata(&item_dir, "psion-games", "Psion Games", "Games for the Series 5");

    let space = installer_with_files(
        0x1000_0001,
        "Space",
        "1.10",
        &[
            ("System/Apps/Space/Space.aif", resource(0x1000_0001, "Space", &[(32, 32, 4), (48, 48, 8)])),
            ("System/Apps/Space/Space.opo", r#"{"era": "er5", "type": "opo"}"#.to_string()),
        ],
    );
    let chess_resource = resource(0x1000_0002, "Chess", &[(24, 24, 2)]);
    write_zip(
        &item_dir.join("Games.zip"),
        &[
            ("space/Space.sis", space.as_bytes()),
            ("chess/Chess.app", b"chess executable".as_slice()),
            ("chess/CHESS.AIF", chess_resource.as_bytes()),
            ("readme.txt", b"not a release".as_slice()),
        ],
    );

    let overlay = root.join("overlay/0x10000001");
    fs::create_dir_all(&overlay).unwrap();
    fs::write(overlay.join("index.md"), "---\nsummary: Defend the planet.\n---\nArcade classic.\n")
        .unwrap();

    definition
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn build_publishes_programs_files_and_api() {
    let temp = tempfile::tempdir().unwrap();
    let definition = library_fixture(temp.path());
    let ctx = LibraryContext::from_path(&definition).unwrap();

    let summary = pipeline::build(&ctx, &StubDecoder, false).unwrap();
    assert_eq!(summary.installer_count, 2);
    assert_eq!(summary.uid_count, 2);
    assert_eq!(summary.version_count, 2);
    assert_eq!(pipeline::read_summary(&ctx).unwrap(), Some(summary));

    let layout = &ctx.layout;
    let releases: Vec<Release> =
        serde_json::from_str(&fs::read_to_string(&layout.releases_path).unwrap()).unwrap();
    assert_eq!(releases.len(), 2);
    let space = releases.iter().find(|r| r.kind == ReleaseKind::Installer).unwrap();
    assert_eq!(space.uid, "0x10000001");
    assert_eq!(space.version, "1.10");
    let names: Vec<&str> = space.reference.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, ["Psion Games", "Games.zip", "space/Space.sis"]);
    assert!(space.tags.contains("epoc32") && space.tags.contains("opl"));

    let chess = releases.iter().find(|r| r.kind == ReleaseKind::Standalone).unwrap();
    assert_eq!(chess.uid, "0x10000002");
    assert_eq!(chess.version, "Unknown");

    for release in &releases {
        let published = layout.output_files_dir.join(&release.sha256);
        assert_eq!(sha256_file(&published).unwrap(), release.sha256);
    }

    let programs = read_json(&layout.data_dir.join("programs.json"));
    let programs = programs.as_array().unwrap();
    assert_eq!(programs[0]["name"], "Chess");
    assert_eq!(programs[0]["screenshots"], serde_json::json!([]));
    assert_eq!(programs[1]["name"], "Space");
    assert_eq!(programs[1]["summary"], "Defend the planet.");
    assert_eq!(programs[1]["description"], "Arcade classic.");
    assert_eq!(programs[1]["icon"]["width"], 48);

    let icon_path = programs[1]["icon"]["path"].as_str().unwrap();
    assert!(layout.output_dir.join(icon_path).is_file());
    assert!(layout.api_dir.join(icon_path).is_file());

    for collection in ["programs", "sources", "summary", "groups"] {
        assert_eq!(
            fs::read(layout.api_index_path(collection)).unwrap(),
            fs::read(layout.data_dir.join(format!("{collection}.json"))).unwrap(),
            "{collection} mirrored into the API"
        );
    }

    let sources = read_json(&layout.sources_path);
    assert_eq!(sources[0]["name"], "Psion Games");
    assert_eq!(sources[0]["html_url"], "https://archive.org/details/psion-games");
}

#[test]
fn rebuilding_produces_identical_output() {
    let temp = tempfile::tempdir().unwrap();
    let definition = library_fixture(temp.path());
    let ctx = LibraryContext::from_path(&definition).unwrap();

    pipeline::build(&ctx, &StubDecoder, false).unwrap();
    let programs_path = ctx.layout.data_dir.join("programs.json");
    let first = fs::read(&programs_path).unwrap();
    let first_groups = fs::read(&ctx.layout.groups_path).unwrap();

    pipeline::build(&ctx, &StubDecoder, false).unwrap();
    assert_eq!(fs::read(&programs_path).unwrap(), first);
    assert_eq!(fs::read(&ctx.layout.groups_path).unwrap(), first_groups);
}

#[test]
fn decode_failures_are_reported_and_skipped() {
    let temp = tempfile::tempdir().unwrap();
    let definition = library_fixture(temp.path());
    let item_dir = temp.path().join("assets/psion-games");
    fs::write(item_dir.join("broken.sis"), b"not an installer").unwrap();
    let ctx = LibraryContext::from_path(&definition).unwrap();

    let releases = pipeline::index(&ctx, &StubDecoder).unwrap();
    assert_eq!(releases.len(), 2);

    let reports: Vec<_> = fs::read_dir(&ctx.layout.errors_dir).unwrap().flatten().collect();
    assert_eq!(reports.len(), 1);
}

#[test]
fn group_requires_an_index() {
    let temp = tempfile::tempdir().unwrap();
    let definition = library_fixture(temp.path());
    let ctx = LibraryContext::from_path(&definition).unwrap();

    let err = pipeline::group(&ctx).unwrap_err();
    assert!(format!("{err:#}").contains("releases.json"));
    assert_eq!(pipeline::read_summary(&ctx).unwrap(), None);
}
