use archive_curator::canonicalize_or_current;
use archive_curator::commands::{open_library, print_dir_status};
use tempfile::tempdir;

#[test]
fn print_dir_status_handles_missing_and_existing_dirs() {
    let temp = tempdir().unwrap();
    // Should not panic either way.
    print_dir_status("Missing", &temp.path().join("missing_dir"));
    print_dir_status("Existing", temp.path());
}

#[test]
fn canonicalize_or_current_handles_missing_paths() {
    let temp = tempdir().unwrap();
    let existing = temp.path().join("library.yaml");
    std::fs::write(&existing, "").unwrap();
    assert_eq!(
        canonicalize_or_current(existing.to_str().unwrap()).unwrap(),
        existing.canonicalize().unwrap()
    );

    let missing = temp.path().join("nope.yaml");
    assert_eq!(canonicalize_or_current(missing.to_str().unwrap()).unwrap(), missing);

    let relative = canonicalize_or_current("relative.yaml").unwrap();
    assert!(relative.is_absolute());
    assert!(relative.ends_with("relative.yaml"));
}

#[test]
fn open_library_wraps_load_errors() {
    let temp = tempdir().unwrap();
    let missing = temp.path().join("library.yaml");
    let err = open_library(missing.to_str().unwrap()).err().expect("missing library");
    let message = format!("{err:#}");
    assert!(message.contains("Failed to open library"));
    assert!(message.contains("Failed to read library config"));
}
