use std::fs;
use std::path::Path;

use curator_core::services::overlay::{load_overlays, merge, OverlayDocument};
use serde_json::{json, Value};

fn write_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::new(width, height).save(path).expect("write png");
}

fn programs() -> Vec<Value> {
    vec![
        json!({"uid": "0x10000001", "name": "Space", "versions": [], "tags": [], "kinds": []}),
        json!({"uid": "0x10000002", "name": "Chess", "versions": [], "tags": [], "kinds": []}),
    ]
}

fn overlay_fixture(root: &Path) {
    let entry = root.join("0x10000001");
    fs::create_dir_all(&entry).unwrap();
    fs::write(
        entry.join("index.md"),
        "---\nname: Space Invaders\nsummary: Shoot the aliens.\n---\n\nA classic.\n",
    )
    .unwrap();
    write_png(&entry.join("b-title.png"), 4, 3);
    write_png(&entry.join("a-game.png"), 8, 6);
    fs::write(entry.join("notes.txt"), "ignored").unwrap();

    let hidden = root.join(".git");
    fs::create_dir_all(&hidden).unwrap();
    fs::write(hidden.join("config"), "").unwrap();
}

#[test]
fn front_matter_is_split_from_the_body() {
    let document =
        OverlayDocument::parse("---\ntitle: Hello\ntags: [a, b]\n---\nBody text.\n").unwrap();
    assert_eq!(document.metadata["title"], "Hello");
    assert_eq!(document.metadata["tags"], json!(["a", "b"]));
    assert_eq!(document.content, "Body text.");

    let plain = OverlayDocument::parse("Just a description.\n").unwrap();
    assert!(plain.metadata.is_empty());
    assert_eq!(plain.content, "Just a description.");

    assert!(OverlayDocument::parse("---\n- not\n- a mapping\n---\n").is_err());
}

#[test]
fn overlay_merges_metadata_and_screenshots() {
    let temp = tempfile::tempdir().unwrap();
    overlay_fixture(temp.path());

    let overlays = load_overlays(&[temp.path().to_path_buf()]).unwrap();
    assert_eq!(overlays.len(), 1);

    let mut merged = programs();
    let copies = merge(&mut merged, &overlays).unwrap();

    let space = &merged[0];
    assert_eq!(space["name"], "Space Invaders");
    assert_eq!(space["summary"], "Shoot the aliens.");
    assert_eq!(space["description"], "A classic.");
    assert_eq!(
        space["screenshots"],
        json!([
            {"width": 8, "height": 6, "path": "screenshots/0x10000001/a-game.png"},
            {"width": 4, "height": 3, "path": "screenshots/0x10000001/b-title.png"},
        ])
    );
    assert_eq!(merged[1]["screenshots"], json!([]));
    assert!(merged[1].get("description").is_none());

    assert_eq!(copies.len(), 2);
    assert_eq!(copies[0].relative_path, "screenshots/0x10000001/a-game.png");
}

#[test]
fn merging_twice_is_idempotent() {
    let temp = tempfile::tempdir().unwrap();
    overlay_fixture(temp.path());
    let overlays = load_overlays(&[temp.path().to_path_buf()]).unwrap();

    let mut once = programs();
    merge(&mut once, &overlays).unwrap();
    let first = serde_json::to_string(&once).unwrap();

    merge(&mut once, &overlays).unwrap();
    let second = serde_json::to_string(&once).unwrap();
    assert_eq!(first, second);

    let mut fresh = programs();
    merge(&mut fresh, &overlays).unwrap();
    assert_eq!(serde_json::to_string(&fresh).unwrap(), first);
}

#[test]
fn later_overlay_directories_win() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    for (root, name) in [(first.path(), "First"), (second.path(), "Second")] {
        let entry = root.join("0x10000002");
        fs::create_dir_all(&entry).unwrap();
        fs::write(entry.join("index.md"), format!("---\nname: {name}\n---\n")).unwrap();
    }

    let overlays =
        load_overlays(&[first.path().to_path_buf(), second.path().to_path_buf()]).unwrap();
    let mut merged = programs();
    merge(&mut merged, &overlays).unwrap();
    assert_eq!(merged[1]["name"], "Second");
    assert_eq!(merged[1]["description"], "");
}
