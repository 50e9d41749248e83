use std::fs;

use curator_core::store::{sha256_bytes, sha256_file, ContentStore, ErrorChannel};

const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

#[test]
fn hashes_files_and_buffers_alike() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("abc.txt");
    fs::write(&path, b"abc").unwrap();

    assert_eq!(sha256_file(&path).unwrap(), ABC_SHA256);
    assert_eq!(sha256_bytes(b"abc"), ABC_SHA256);
}

#[test]
fn staged_files_are_written_once() {
    let temp = tempfile::tempdir().unwrap();
    let store = ContentStore::open(temp.path().join("files")).unwrap();
    let source = temp.path().join("abc.sis");
    fs::write(&source, b"abc").unwrap();

    let sha = store.stage_file(&source).unwrap();
    assert_eq!(sha, ABC_SHA256);
    assert!(store.contains(&sha));
    assert_eq!(fs::read(store.path_for(&sha)).unwrap(), b"abc");

    // An existing entry is left untouched.
    fs::write(store.path_for(&sha), b"sentinel").unwrap();
    assert_eq!(store.stage_file(&source).unwrap(), sha);
    assert_eq!(fs::read(store.path_for(&sha)).unwrap(), b"sentinel");

    // No staging leftovers.
    assert_eq!(fs::read_dir(store.root()).unwrap().count(), 1);
}

#[test]
fn put_keeps_first_writer() {
    let temp = tempfile::tempdir().unwrap();
    let store = ContentStore::open(temp.path()).unwrap();

    let first = store.put("icon.png", b"first").unwrap();
    let second = store.put("icon.png", b"second").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(first).unwrap(), b"first");
}

#[test]
fn error_channel_reports_each_hash_once() {
    let temp = tempfile::tempdir().unwrap();
    let errors = ErrorChannel::open(temp.path().join("errors")).unwrap();
    let a = temp.path().join("a.sis");
    let b = temp.path().join("copy-of-a.sis");
    fs::write(&a, b"abc").unwrap();
    fs::write(&b, b"abc").unwrap();

    assert!(errors.report(&a, &"bad header").unwrap());
    assert!(!errors.report(&b, &"bad header again").unwrap());

    assert_eq!(errors.reported().unwrap(), vec![ABC_SHA256.to_string()]);
    let entry = errors.root().join(ABC_SHA256);
    assert_eq!(fs::read(entry.join("a.sis")).unwrap(), b"abc");
    assert_eq!(fs::read_to_string(entry.join("error.txt")).unwrap(), "bad header");
    assert!(!entry.join("copy-of-a.sis").exists());
}
