use dockertimes::cache::{CacheEntry, CacheStore};
use dockertimes::driver::{run, RunOptions};
use dockertimes::reconcile::from_millis;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_corrupted_cache_treats_everything_as_new() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "a").unwrap();
    filetime::set_file_mtime(&file, from_millis(2_000)).unwrap();

    let cache = dir.path().join("cache.json");
    fs::write(&cache, b"\xff\xfe not { json").unwrap();

    let options = RunOptions::new(vec!["a.txt".to_string()])
        .with_cwd(dir.path())
        .with_cache_path(&cache);
    let summary = run(&options, None).unwrap();

    assert_eq!(summary.new_files, 1);
    assert!(summary.cache_persisted);

    // The corrupt file is replaced by a valid cache
    let store = CacheStore::load_or_default(&cache);
    assert_eq!(store.len(), 1);
    assert_eq!(
        store.get(&file.to_string_lossy()).map(|e| e.mtime),
        Some(2_000)
    );
}

#[test]
fn test_wrong_shape_cache_is_ignored() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "a").unwrap();

    let cache = dir.path().join("cache.json");
    // Valid JSON, but mtime is a string
    fs::write(
        &cache,
        format!(r#"{{"{}":{{"mtime":"yesterday"}}}}"#, file.display()),
    )
    .unwrap();

    let options = RunOptions::new(vec!["a.txt".to_string()])
        .with_cwd(dir.path())
        .with_cache_path(&cache);
    let summary = run(&options, None).unwrap();

    assert_eq!(summary.new_files, 1);
}

#[test]
fn test_cache_is_rewritten_even_when_nothing_changed() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "X").unwrap();
    filetime::set_file_mtime(&file, from_millis(1_000)).unwrap();

    let key = file.to_string_lossy().into_owned();
    let cache = dir.path().join("cache.json");
    // Pretty-printed, with an entry for a path that is no longer tracked
    fs::write(
        &cache,
        format!(
            "{{\n  {}: {{ \"mtime\": 1000, \"sha1\": \"c032adc1ff629c9b66f22749ad667e6beadf144b\" }},\n  \"gone.txt\": {{ \"mtime\": 5 }}\n}}\n",
            serde_json::to_string(&key).unwrap()
        ),
    )
    .unwrap();

    let options = RunOptions::new(vec!["a.txt".to_string()])
        .with_cwd(dir.path())
        .with_cache_path(&cache);
    let summary = run(&options, None).unwrap();
    assert_eq!(summary.unmodified, 1);

    let mut expected = CacheStore::new();
    expected.insert(
        key,
        CacheEntry::file(1000, "c032adc1ff629c9b66f22749ad667e6beadf144b"),
    );
    expected.insert("gone.txt", CacheEntry::path(5));
    assert_eq!(
        fs::read_to_string(&cache).unwrap(),
        expected.to_json().unwrap()
    );
}

#[test]
fn test_unchanged_cache_is_byte_stable() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("testfile.txt");
    fs::write(&file, "X").unwrap();
    filetime::set_file_mtime(&file, from_millis(99_000)).unwrap();

    let mut fixture = CacheStore::new();
    fixture.insert(
        file.to_string_lossy(),
        CacheEntry::file(1_417_469_686_000, "c032adc1ff629c9b66f22749ad667e6beadf144b"),
    );
    let cache = dir.path().join(".dockertimes.json");
    fixture.persist(&cache).unwrap();
    let before = fs::read(&cache).unwrap();

    let options = RunOptions::new(vec!["testfile.txt".to_string()])
        .with_cwd(dir.path())
        .with_cache_path(&cache);
    run(&options, None).unwrap();

    assert_eq!(fs::read(&cache).unwrap(), before);
}
