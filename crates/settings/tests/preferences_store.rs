use novelmerge_settings::{Preferences, PreferencesStore, DEFAULT_HISTORY_CAPACITY};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn load_missing_file_returns_defaults() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("preferences.json");

    let store = PreferencesStore::load(&path).expect("load defaults");
    assert_eq!(store.preferences().history_capacity, DEFAULT_HISTORY_CAPACITY);
    assert!(store.preferences().projects_dir.is_none());
    assert!(!store.preferences().prefix_added_chapters);
    assert!(!store.preferences().skip_identical_chapters);
    assert!(!path.exists());
}

#[test]
fn save_and_reload_roundtrip() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("preferences.json");

    let mut store = PreferencesStore::new(path.clone(), Preferences::default());
    store
        .update(|prefs| {
            prefs.history_capacity = 5;
            prefs.prefix_added_chapters = true;
            prefs.projects_dir = Some(PathBuf::from("/srv/novels"));
        })
        .expect("save");

    let reloaded = PreferencesStore::load(&path).expect("reload");
    assert_eq!(reloaded.preferences().history_capacity, 5);
    assert!(reloaded.preferences().prefix_added_chapters);
    assert_eq!(
        reloaded.preferences().projects_dir.as_deref(),
        Some(PathBuf::from("/srv/novels").as_path())
    );
}

#[test]
fn sanitize_repairs_out_of_range_values() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("preferences.json");

    let mut store = PreferencesStore::load(&path).expect("default");
    store
        .update(|prefs| {
            prefs.history_capacity = 0;
            prefs.projects_dir = Some(PathBuf::new());
        })
        .expect("update");

    assert_eq!(store.preferences().history_capacity, DEFAULT_HISTORY_CAPACITY);
    assert!(store.preferences().projects_dir.is_none());
}

#[test]
fn partial_file_fills_defaults() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("preferences.json");
    fs::write(&path, r#"{ "skip_identical_chapters": true }"#).expect("seed");

    let store = PreferencesStore::load(&path).expect("load");
    assert!(store.preferences().skip_identical_chapters);
    assert_eq!(store.preferences().version, 1);
    assert_eq!(store.preferences().history_capacity, DEFAULT_HISTORY_CAPACITY);
}

#[test]
fn invalid_json_is_reported_with_path() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("preferences.json");
    fs::write(&path, "{ not json").expect("seed");

    let err = PreferencesStore::load(&path).expect_err("parse failure");
    assert!(err.to_string().contains("preferences.json"));
}
